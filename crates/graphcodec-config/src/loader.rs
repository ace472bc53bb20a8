// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Values are applied in three tiers, later ones winning:
//! 1. TOML file (base values, defaults for anything missing)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{CodecConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for on disk
pub const CONFIG_FILE_NAME: &str = "graphcodec.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_VARIABLE: &str = "GRAPHCODEC_CONFIG_PATH";

/// Find the graphcodec configuration file
///
/// Search order:
/// 1. `GRAPHCODEC_CONFIG_PATH` environment variable
/// 2. Current working directory: `./graphcodec.toml`
/// 3. Each parent directory, up to 5 levels
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_VARIABLE) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_VARIABLE,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_VARIABLE
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML. Values are
/// not validated; call [`validate_config`](crate::validate_config) for that.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<CodecConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: CodecConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `GRAPHCODEC_FORMAT_VERSION` -> `format.version`
/// - `GRAPHCODEC_MAX_DEPTH` -> `limits.max_depth`
/// - `GRAPHCODEC_MAX_OBJECTS` -> `limits.max_objects`
/// - `GRAPHCODEC_MAX_STRING_LENGTH` -> `limits.max_string_length`
/// - `GRAPHCODEC_MAX_COLLECTION_LENGTH` -> `limits.max_collection_length`
/// - `GRAPHCODEC_LOG_LEVEL` -> `logging.level`
///
/// Numeric values that do not parse are ignored.
pub fn apply_environment_overrides(config: &mut CodecConfig) {
    if let Ok(value) = env::var("GRAPHCODEC_FORMAT_VERSION") {
        config.format.version = value;
    }
    if let Ok(value) = env::var("GRAPHCODEC_MAX_DEPTH") {
        if let Ok(depth) = value.parse::<usize>() {
            config.limits.max_depth = depth;
        }
    }
    if let Ok(value) = env::var("GRAPHCODEC_MAX_OBJECTS") {
        if let Ok(objects) = value.parse::<usize>() {
            config.limits.max_objects = objects;
        }
    }
    if let Ok(value) = env::var("GRAPHCODEC_MAX_STRING_LENGTH") {
        if let Ok(length) = value.parse::<usize>() {
            config.limits.max_string_length = length;
        }
    }
    if let Ok(value) = env::var("GRAPHCODEC_MAX_COLLECTION_LENGTH") {
        if let Ok(length) = value.parse::<usize>() {
            config.limits.max_collection_length = length;
        }
    }
    if let Ok(value) = env::var("GRAPHCODEC_LOG_LEVEL") {
        config.logging.level = value.to_lowercase();
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of CLI arguments (e.g., `{"max_depth": "64", "log_level": "debug"}`)
pub fn apply_cli_overrides(config: &mut CodecConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("version") {
        config.format.version = value.clone();
    }
    if let Some(value) = cli_args.get("max_depth") {
        if let Ok(depth) = value.parse::<usize>() {
            config.limits.max_depth = depth;
        }
    }
    if let Some(value) = cli_args.get("max_objects") {
        if let Ok(objects) = value.parse::<usize>() {
            config.limits.max_objects = objects;
        }
    }
    if let Some(value) = cli_args.get("max_string_length") {
        if let Ok(length) = value.parse::<usize>() {
            config.limits.max_string_length = length;
        }
    }
    if let Some(value) = cli_args.get("max_collection_length") {
        if let Ok(length) = value.parse::<usize>() {
            config.limits.max_collection_length = length;
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.to_lowercase();
    }
    if let Some(value) = cli_args.get("log_format") {
        config.logging.format = value.to_lowercase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARIABLES: [&str; 6] = [
        "GRAPHCODEC_FORMAT_VERSION",
        "GRAPHCODEC_MAX_DEPTH",
        "GRAPHCODEC_MAX_OBJECTS",
        "GRAPHCODEC_MAX_STRING_LENGTH",
        "GRAPHCODEC_MAX_COLLECTION_LENGTH",
        "GRAPHCODEC_LOG_LEVEL",
    ];

    fn clear_overrides() {
        for name in OVERRIDE_VARIABLES {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_VARIABLE, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_VARIABLE);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("absent.toml");

        env::set_var(CONFIG_PATH_VARIABLE, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_VARIABLE);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[format]").unwrap();
        writeln!(file, "version = \"2.1\"").unwrap();
        writeln!(file, "[limits]").unwrap();
        writeln!(file, "max_objects = 500").unwrap();

        let config = load_config(Some(config_path.as_path()), None).unwrap();

        assert_eq!(config.format.version, "2.1");
        assert_eq!(config.limits.max_objects, 500);
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_load_invalid_toml() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[limits\nmax_depth = ").unwrap();

        assert!(matches!(
            load_config(Some(config_path.as_path()), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = CodecConfig::default();

        env::set_var("GRAPHCODEC_MAX_DEPTH", "64");
        env::set_var("GRAPHCODEC_MAX_OBJECTS", "not a number");
        env::set_var("GRAPHCODEC_LOG_LEVEL", "DEBUG");

        apply_environment_overrides(&mut config);
        clear_overrides();

        assert_eq!(config.limits.max_depth, 64);
        assert_eq!(
            config.limits.max_objects,
            CodecConfig::default().limits.max_objects
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = CodecConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("version".to_string(), "3.0".to_string());
        cli_args.insert("max_string_length".to_string(), "128".to_string());
        cli_args.insert("max_collection_length".to_string(), "4096".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.format.version, "3.0");
        assert_eq!(config.limits.max_string_length, 128);
        assert_eq!(config.codec_limits().max_collection_length, 4096);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[limits]").unwrap();
        writeln!(file, "max_depth = 10").unwrap();
        writeln!(file, "max_objects = 10").unwrap();

        env::set_var("GRAPHCODEC_MAX_DEPTH", "20");
        env::set_var("GRAPHCODEC_MAX_OBJECTS", "20");

        let mut cli_args = HashMap::new();
        cli_args.insert("max_depth".to_string(), "30".to_string());

        let config = load_config(Some(config_path.as_path()), Some(&cli_args)).unwrap();
        clear_overrides();

        // CLI wins for depth, env wins for objects (no CLI override)
        assert_eq!(config.limits.max_depth, 30);
        assert_eq!(config.limits.max_objects, 20);
    }
}
