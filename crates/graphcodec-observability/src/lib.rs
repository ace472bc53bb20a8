// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # graphcodec-observability
//!
//! Logging setup for applications built on graphcodec.
//!
//! The codec crates only emit `tracing` events; this crate installs the subscriber that
//! turns them into output, with per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known graphcodec crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "graphcodec",
    "graphcodec-structures",
    "graphcodec-serialization",
    "graphcodec-config",
    "graphcodec-observability",
];
