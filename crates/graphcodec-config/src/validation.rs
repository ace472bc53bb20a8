// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that values are within range and consistent with each other before any codec
//! pass uses them.

use crate::{CodecConfig, ConfigError, ConfigResult};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - A non-empty format version that fits within the string limit
/// - Object and string limits of at least 1
/// - Known log levels and formats
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &CodecConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_format(config, &mut errors);
    validate_limits(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_format(config: &CodecConfig, errors: &mut Vec<ConfigValidationError>) {
    let version = &config.format.version;
    if version.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "format.version".to_string(),
        });
    } else if version.len() > config.limits.max_string_length {
        errors.push(ConfigValidationError::InvalidValue {
            field: "format.version".to_string(),
            reason: format!(
                "{} bytes is longer than limits.max_string_length ({})",
                version.len(),
                config.limits.max_string_length
            ),
        });
    }
}

fn validate_limits(config: &CodecConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.limits.max_objects == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "limits.max_objects".to_string(),
            reason: "must allow at least one object".to_string(),
        });
    }
    if config.limits.max_string_length == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "limits.max_string_length".to_string(),
            reason: "class and field names cannot be empty".to_string(),
        });
    }
}

fn validate_logging(config: &CodecConfig, errors: &mut Vec<ConfigValidationError>) {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }
}
