//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-graphcodec-serialization` to turn on debug output for a
//! single crate.

use std::collections::HashMap;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug
pub const DEBUG_VARIABLE: &str = "GRAPHCODEC_DEBUG";

/// Parse debug flags from command-line arguments
///
/// # Example
/// ```rust
/// use graphcodec_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-graphcodec-serialization".to_string()]);
/// assert!(flags.is_enabled("graphcodec-serialization"));
/// assert_eq!(flags.to_filter_string(), "graphcodec_serialization=debug,info");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: HashMap<String, bool>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`.
    /// Also supports `--debug-all` to enable all crates.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string(), true);
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains_key(crate_name)
    }

    /// Get all enabled crates, sorted
    pub fn enabled_crates(&self) -> Vec<&String> {
        let mut crates: Vec<&String> = self.enabled_crates.keys().collect();
        crates.sort();
        crates
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Get log level for a crate
    ///
    /// Returns `tracing::Level::DEBUG` if enabled, `tracing::Level::INFO` otherwise.
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Create a tracing filter from debug flags, with `info` for everything else
    pub fn to_filter_string(&self) -> String {
        self.to_filter_string_with_default("info")
    }

    /// Create a tracing filter from debug flags, with `default_level` for everything else.
    ///
    /// Event targets are module paths, so crate names are written with underscores.
    /// Format: "graphcodec_config=debug,warn", or just `default_level` if none enabled.
    pub fn to_filter_string_with_default(&self, default_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates()
            .into_iter()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        filters.push(default_level.to_string());
        filters.join(",")
    }
}

/// Parse debug flags from the process arguments and the environment
///
/// Environment variable format: comma-separated crate names, e.g.
/// `GRAPHCODEC_DEBUG=graphcodec-serialization,graphcodec-config`, or `all`.
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(env_var) = env::var(DEBUG_VARIABLE) {
        apply_debug_variable(&mut flags, &env_var);
    }
    flags
}

fn apply_debug_variable(flags: &mut CrateDebugFlags, value: &str) {
    if value == "all" {
        flags.enable_all();
        return;
    }
    for crate_name in value.split(',') {
        let crate_name = crate_name.trim();
        if !crate_name.is_empty() {
            flags.enable(crate_name);
        }
    }
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {var}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {var}=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        var = DEBUG_VARIABLE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-graphcodec-config".to_string()]);
        assert!(flags.is_enabled("graphcodec-config"));
        assert!(!flags.is_enabled("graphcodec-serialization"));
    }

    #[test]
    fn test_unrelated_arguments_are_ignored() {
        let flags = CrateDebugFlags::from_args(vec![
            "inspect_stream".to_string(),
            "scene.bin".to_string(),
            "--max_depth=8".to_string(),
        ]);
        assert!(!flags.any_enabled());
        assert_eq!(flags.to_filter_string(), "info");
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_is_sorted_and_uses_targets() {
        let flags = CrateDebugFlags::from_args(vec![
            "--debug-graphcodec-serialization".to_string(),
            "--debug-graphcodec-config".to_string(),
        ]);
        assert_eq!(
            flags.to_filter_string_with_default("warn"),
            "graphcodec_config=debug,graphcodec_serialization=debug,warn"
        );
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-graphcodec".to_string()]);
        assert_eq!(flags.log_level("graphcodec"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("graphcodec-config"), tracing::Level::INFO);
    }

    #[test]
    fn test_debug_variable() {
        let mut flags = CrateDebugFlags::default();
        apply_debug_variable(&mut flags, " graphcodec-config, ,graphcodec ");
        assert_eq!(flags.enabled_crates(), vec!["graphcodec", "graphcodec-config"]);

        let mut flags = CrateDebugFlags::default();
        apply_debug_variable(&mut flags, "all");
        assert_eq!(flags.enabled_crates().len(), KNOWN_CRATES.len());
    }
}
