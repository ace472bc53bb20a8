// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Stream Inspection Tool

Lists the records of an encoded graphcodec stream without building any entities, so it
works on streams whose classes are not known to this binary.

Usage:
  cargo run --bin inspect_stream -- <stream.bin> [--config <graphcodec.toml>] [--json]
      [--max_objects=N] [--version=V] [--log_level=debug] [--debug-all]

Example:
  cargo run --bin inspect_stream -- scene.bin --json --debug-graphcodec-serialization

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use graphcodec::config::{
    apply_cli_overrides, apply_environment_overrides, load_config, validate_config, CodecConfig,
    ConfigError,
};
use graphcodec::observability::{
    debug_flags_help, init_logging, parse_debug_flags, LogFormat, LoggingConfig,
};
use graphcodec::serialization::{inspect, StreamRecord, StreamSummary};
use serde_json::json;
use tracing::{debug, info, warn};

struct Arguments {
    stream_path: PathBuf,
    config_path: Option<PathBuf>,
    json: bool,
    overrides: HashMap<String, String>,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let arguments = match parse_arguments(&args) {
        Some(arguments) => arguments,
        None => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(arguments) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <stream.bin> [--config <graphcodec.toml>] [--json] [--key=value ...]",
        program
    );
    eprintln!("\nOverrides:");
    eprintln!("  --version=V --max_depth=N --max_objects=N --max_string_length=N");
    eprintln!("  --max_collection_length=N");
    eprintln!("  --log_level=L --log_format=text|json");
    eprintln!("\n{}", debug_flags_help());
}

fn parse_arguments(args: &[String]) -> Option<Arguments> {
    let mut stream_path = None;
    let mut config_path = None;
    let mut json = false;
    let mut overrides = HashMap::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            config_path = Some(PathBuf::from(iter.next()?));
        } else if arg == "--json" {
            json = true;
        } else if arg.starts_with("--debug-") {
            // handled by parse_debug_flags
        } else if let Some(pair) = arg.strip_prefix("--") {
            let (key, value) = pair.split_once('=')?;
            overrides.insert(key.to_string(), value.to_string());
        } else if stream_path.is_none() {
            stream_path = Some(PathBuf::from(arg));
        } else {
            return None;
        }
    }

    Some(Arguments {
        stream_path: stream_path?,
        config_path,
        json,
        overrides,
    })
}

/// Explicit file, then the searched file, then defaults; overrides apply in every case
fn resolve_config(arguments: &Arguments) -> Result<CodecConfig> {
    let config = match load_config(arguments.config_path.as_deref(), Some(&arguments.overrides)) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(_)) if arguments.config_path.is_none() => {
            let mut config = CodecConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &arguments.overrides);
            config
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };
    validate_config(&config).context("Invalid configuration")?;
    Ok(config)
}

fn logging_config(config: &CodecConfig) -> Result<LoggingConfig> {
    Ok(LoggingConfig {
        level: config.logging.level.clone(),
        format: config
            .logging
            .format
            .parse::<LogFormat>()
            .map_err(anyhow::Error::msg)?,
        log_dir: config.logging.log_dir.clone(),
        ..LoggingConfig::default()
    })
}

fn run(arguments: Arguments) -> Result<()> {
    let config = resolve_config(&arguments)?;
    let _guard = init_logging(&parse_debug_flags(), &logging_config(&config)?)?;

    let summary = inspect_file(&arguments.stream_path)?;
    check_against_config(&summary, &config);

    if arguments.json {
        println!("{}", serde_json::to_string_pretty(&summary_to_json(&summary))?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

fn inspect_file(path: &Path) -> Result<StreamSummary> {
    if !path.exists() {
        anyhow::bail!("Input file '{}' not found", path.display());
    }
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read stream: {}", path.display()))?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());

    let summary =
        inspect(&bytes).with_context(|| format!("Malformed stream: {}", path.display()))?;
    info!(
        "Inspected {}: {} objects, {} links, {} roots",
        path.display(),
        summary.object_count(),
        summary.link_count(),
        summary.roots().len()
    );
    Ok(summary)
}

/// Warn when the stream falls outside what the configuration describes
fn check_against_config(summary: &StreamSummary, config: &CodecConfig) {
    if summary.version != config.format.version {
        warn!(
            "Stream version '{}' differs from configured version '{}'",
            summary.version, config.format.version
        );
    }
    if summary.object_count() > config.limits.max_objects {
        warn!(
            "Stream holds {} objects, above the configured limit of {}",
            summary.object_count(),
            config.limits.max_objects
        );
    }
}

fn summary_to_json(summary: &StreamSummary) -> serde_json::Value {
    let records: Vec<serde_json::Value> = summary
        .records
        .iter()
        .map(|record| match record {
            StreamRecord::Object {
                identity,
                class_name,
                payload_size,
            } => json!({
                "kind": "object",
                "identity": identity,
                "class_name": class_name,
                "payload_size": payload_size,
            }),
            StreamRecord::Link { owner, key, target } => json!({
                "kind": "link",
                "owner": owner,
                "key": key,
                "target": target,
            }),
            StreamRecord::Root { identity } => json!({
                "kind": "root",
                "identity": identity,
            }),
        })
        .collect();

    json!({
        "version": summary.version,
        "byte_count": summary.byte_count,
        "object_count": summary.object_count(),
        "link_count": summary.link_count(),
        "roots": summary.roots(),
        "records": records,
    })
}
