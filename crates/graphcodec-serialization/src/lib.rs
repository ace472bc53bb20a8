//! # graphcodec Serialization
//!
//! Encodes graphs of shared, possibly cyclic, polymorphic entities into a compact binary
//! stream and rebuilds them from it. Entities describe their own fields through the
//! [`Codable`] trait; the codec never needs to know their concrete types. On the way back
//! in, every object is built from its class name through a [`TypeRegistry`].
//!
//! ## Core Components
//!
//! - **[`Codable`]** / **[`EntityRef`]** - The entity contract and the shared handle to an entity
//! - **[`TypeRegistry`]** - Class name to factory lookup used when decoding
//! - **[`Encoder`]** / **[`Decoder`]** / **[`Field`]** - The field-level protocol every wire format implements
//! - **[`ValueWrapper`]** - Leaf entity boxing a primitive value as bytes
//! - **[`BinaryEncoder`]** / **[`BinaryDecoder`]** - The binary wire format
//! - **[`inspect`]** - Record-level listing of an encoded stream
//!
//! ## Basic Usage
//!
//! ```rust
//! use graphcodec_serialization::{
//!     BinaryDecoder, BinaryEncoder, Codable, Decoder, Encoder, EntityRef, TypeRegistry,
//! };
//! use graphcodec_structures::CodecResult;
//!
//! #[derive(Default)]
//! struct Layer {
//!     name: String,
//!     next: Option<EntityRef>,
//! }
//!
//! impl Codable for Layer {
//!     fn class_name(&self) -> &str {
//!         "Layer"
//!     }
//!
//!     fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()> {
//!         encoder.encode("name", &self.name)?;
//!         encoder.encode("next", &self.next)?;
//!         Ok(())
//!     }
//!
//!     fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()> {
//!         decoder.decode("name", &mut self.name)?;
//!         decoder.decode("next", &mut self.next)?;
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_type::<Layer>();
//!
//! let top = EntityRef::new(Layer { name: "top".into(), next: None });
//! let mut encoder = BinaryEncoder::new(&registry);
//! encoder.encode(&top).unwrap();
//! let bytes = encoder.get_bytes();
//!
//! let mut decoder = BinaryDecoder::new(&registry);
//! decoder.from_bytes(&bytes).unwrap();
//! let layer = decoder.get_object_at::<Layer>(0).unwrap();
//! assert_eq!(layer.borrow().name, "top");
//! ```

mod binary_decoder;
mod binary_encoder;
mod entity;
mod protocol;
mod stream_inspector;
mod type_registry;
mod value_wrapper;
mod wire_format;

#[cfg(test)]
mod fixtures;

pub use binary_decoder::BinaryDecoder;
pub use binary_encoder::BinaryEncoder;
pub use entity::{Codable, EntityId, EntityRef};
pub use protocol::{array_element_key, array_size_key, Decoder, Encoder, Field, Reference};
pub use stream_inspector::{inspect, StreamRecord, StreamSummary};
pub use type_registry::{EntityFactory, TypeRegistry};
pub use value_wrapper::{ByteBlob, Primitive, ValueWrapper};
pub use wire_format::{Marker, ObjectIndex};
