//! # graphcodec - Binary codec for shared, cyclic entity graphs
//!
//! graphcodec writes a graph of polymorphic entities into a compact binary stream and
//! rebuilds an equivalent graph from it. Shared children are written once, cycles are
//! followed safely, and every object is rebuilt from its registered class name.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! graphcodec = "0.1"  # Default: config + observability
//! ```
//!
//! ## Feature Flags
//!
//! - **`config`** (default): TOML configuration with environment and CLI overrides
//! - **`observability`** (default): Logging setup with per-crate debug flags
//! - **`file-logging`**: JSON log files in a timestamped run folder
//!
//! ## Usage Examples
//!
//! ### Codec only
//!
//! ```toml
//! [dependencies]
//! graphcodec = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust
//! use graphcodec::prelude::*;
//!
//! #[derive(Default)]
//! struct Joint {
//!     name: String,
//!     offset: Vec3,
//!     children: Vec<Option<EntityRef>>,
//! }
//!
//! impl Codable for Joint {
//!     fn class_name(&self) -> &str {
//!         "Joint"
//!     }
//!
//!     fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()> {
//!         encoder.encode("name", &self.name)?;
//!         encoder.encode("offset", &self.offset)?;
//!         encoder.encode("children", &self.children)?;
//!         Ok(())
//!     }
//!
//!     fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()> {
//!         decoder.decode("name", &mut self.name)?;
//!         decoder.decode("offset", &mut self.offset)?;
//!         decoder.decode("children", &mut self.children)?;
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_type::<Joint>();
//!
//! let hand = EntityRef::new(Joint { name: "hand".into(), offset: Vec3::ONE, children: vec![] });
//! let arm = EntityRef::new(Joint {
//!     name: "arm".into(),
//!     offset: Vec3::ZERO,
//!     children: vec![Some(hand.clone()), Some(hand)],
//! });
//!
//! let mut encoder = BinaryEncoder::new(&registry);
//! assert!(encoder.encode(&arm)?);
//! let bytes = encoder.get_bytes();
//!
//! let mut decoder = BinaryDecoder::new(&registry);
//! decoder.from_bytes(&bytes)?;
//! let arm = decoder.get_object_at::<Joint>(0).expect("root joint");
//! let arm = arm.borrow();
//! assert_eq!(arm.children.len(), 2);
//! # Ok::<(), graphcodec::structures::CodecError>(())
//! ```
//!
//! ### Limits from configuration
//!
//! ```rust,no_run
//! use graphcodec::config::{load_config, validate_config};
//! use graphcodec::serialization::{BinaryEncoder, TypeRegistry};
//!
//! let config = load_config(None, None)?;
//! validate_config(&config)?;
//!
//! let registry = TypeRegistry::new();
//! let _encoder = BinaryEncoder::new(&registry)
//!     .with_version(config.format.version.clone())
//!     .with_limits(config.codec_limits());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: graphcodec-structures                      │
//! │  (CodecError, CodecLimits, Vec3/Quat/Mat4)              │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Codec: graphcodec-serialization                        │
//! │  (Codable, TypeRegistry, BinaryEncoder/BinaryDecoder)   │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: graphcodec-config,                     │
//! │  graphcodec-observability                               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use graphcodec_structures as structures;

// Re-export codec
pub use graphcodec_serialization as serialization;

// Re-export infrastructure
#[cfg(feature = "config")]
pub use graphcodec_config as config;

#[cfg(feature = "observability")]
pub use graphcodec_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::structures::*;

    pub use crate::serialization::{
        BinaryDecoder, BinaryEncoder, ByteBlob, Codable, Decoder, Encoder, EntityRef, Reference,
        TypeRegistry,
    };

    #[cfg(feature = "config")]
    pub use crate::config::{load_config, validate_config, CodecConfig};

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, parse_debug_flags, LoggingConfig};
}
