// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `graphcodec.toml`. Every field has a default, so a
//! file only needs the values it changes.

use graphcodec_structures::{CodecLimits, DEFAULT_FORMAT_VERSION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecConfig {
    pub format: FormatConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingSection,
}

impl CodecConfig {
    /// Limits to hand to an encoder or decoder
    pub fn codec_limits(&self) -> CodecLimits {
        CodecLimits::from(&self.limits)
    }
}

/// Stream header settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Version string written by encoders
    pub version: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_FORMAT_VERSION.to_string(),
        }
    }
}

/// Bounds on a single encode or decode pass
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_depth: usize,
    pub max_objects: usize,
    pub max_string_length: usize,
    pub max_collection_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = CodecLimits::default();
        Self {
            max_depth: limits.max_depth,
            max_objects: limits.max_objects,
            max_string_length: limits.max_string_length,
            max_collection_length: limits.max_collection_length,
        }
    }
}

impl From<&LimitsConfig> for CodecLimits {
    fn from(config: &LimitsConfig) -> Self {
        CodecLimits::default()
            .with_max_depth(config.max_depth)
            .with_max_objects(config.max_objects)
            .with_max_string_length(config.max_string_length)
            .with_max_collection_length(config.max_collection_length)
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSection {
    /// One of trace, debug, info, warn, error
    pub level: String,
    /// text or json
    pub format: String,
    /// Directory for log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            log_dir: None,
        }
    }
}
