use crate::entity::Codable;
use crate::protocol::{Decoder, Encoder};
use byteorder::{ByteOrder, LittleEndian};
use graphcodec_structures::{CodecError, CodecResult, Mat3, Mat4, Quat, Transform, Vec2, Vec3, Vec4};
use std::ops::{Deref, DerefMut};

//region Primitive

/// A value that can be boxed into a [`ValueWrapper`].
///
/// Every implementation writes an explicit little-endian representation, never a memory
/// image, so payloads are portable and a malformed payload can only produce an error.
pub trait Primitive: Sized {
    /// Name used in error messages
    const TYPE_NAME: &'static str;

    /// Exact payload length for fixed-width types, `None` for variable-length ones
    const PAYLOAD_SIZE: Option<usize>;

    fn write_payload(&self, output: &mut Vec<u8>);

    fn read_payload(payload: &[u8]) -> CodecResult<Self>;
}

fn check_payload_size<T: Primitive>(payload: &[u8]) -> CodecResult<()> {
    match T::PAYLOAD_SIZE {
        Some(expected) if payload.len() != expected => Err(CodecError::PayloadSize {
            type_name: T::TYPE_NAME,
            expected,
            found: payload.len(),
        }),
        _ => Ok(()),
    }
}

macro_rules! impl_primitive_for_integer {
    ($type:ty, $size:expr, $write:ident, $read:ident) => {
        impl Primitive for $type {
            const TYPE_NAME: &'static str = stringify!($type);
            const PAYLOAD_SIZE: Option<usize> = Some($size);

            fn write_payload(&self, output: &mut Vec<u8>) {
                let mut buffer = [0u8; $size];
                LittleEndian::$write(&mut buffer, *self);
                output.extend_from_slice(&buffer);
            }

            fn read_payload(payload: &[u8]) -> CodecResult<Self> {
                check_payload_size::<Self>(payload)?;
                Ok(LittleEndian::$read(payload))
            }
        }
    };
}

impl_primitive_for_integer!(i16, 2, write_i16, read_i16);
impl_primitive_for_integer!(i32, 4, write_i32, read_i32);
impl_primitive_for_integer!(i64, 8, write_i64, read_i64);
impl_primitive_for_integer!(u16, 2, write_u16, read_u16);
impl_primitive_for_integer!(u32, 4, write_u32, read_u32);
impl_primitive_for_integer!(u64, 8, write_u64, read_u64);
impl_primitive_for_integer!(f32, 4, write_f32, read_f32);
impl_primitive_for_integer!(f64, 8, write_f64, read_f64);

impl Primitive for u8 {
    const TYPE_NAME: &'static str = "u8";
    const PAYLOAD_SIZE: Option<usize> = Some(1);

    fn write_payload(&self, output: &mut Vec<u8>) {
        output.push(*self);
    }

    fn read_payload(payload: &[u8]) -> CodecResult<Self> {
        check_payload_size::<Self>(payload)?;
        Ok(payload[0])
    }
}

impl Primitive for i8 {
    const TYPE_NAME: &'static str = "i8";
    const PAYLOAD_SIZE: Option<usize> = Some(1);

    fn write_payload(&self, output: &mut Vec<u8>) {
        output.push(self.to_le_bytes()[0]);
    }

    fn read_payload(payload: &[u8]) -> CodecResult<Self> {
        check_payload_size::<Self>(payload)?;
        Ok(i8::from_le_bytes([payload[0]]))
    }
}

impl Primitive for bool {
    const TYPE_NAME: &'static str = "bool";
    const PAYLOAD_SIZE: Option<usize> = Some(1);

    fn write_payload(&self, output: &mut Vec<u8>) {
        output.push(u8::from(*self));
    }

    fn read_payload(payload: &[u8]) -> CodecResult<Self> {
        check_payload_size::<Self>(payload)?;
        match payload[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidPayload {
                type_name: Self::TYPE_NAME,
                reason: format!("{} is neither 0 nor 1", other),
            }),
        }
    }
}

impl Primitive for String {
    const TYPE_NAME: &'static str = "String";
    const PAYLOAD_SIZE: Option<usize> = None;

    fn write_payload(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(self.as_bytes());
    }

    fn read_payload(payload: &[u8]) -> CodecResult<Self> {
        String::from_utf8(payload.to_vec()).map_err(|err| CodecError::InvalidPayload {
            type_name: Self::TYPE_NAME,
            reason: err.to_string(),
        })
    }
}

impl<const N: usize> Primitive for [f32; N] {
    const TYPE_NAME: &'static str = "f32 array";
    const PAYLOAD_SIZE: Option<usize> = Some(N * 4);

    fn write_payload(&self, output: &mut Vec<u8>) {
        let start = output.len();
        output.resize(start + N * 4, 0);
        LittleEndian::write_f32_into(self, &mut output[start..]);
    }

    fn read_payload(payload: &[u8]) -> CodecResult<Self> {
        check_payload_size::<Self>(payload)?;
        let mut values = [0.0f32; N];
        LittleEndian::read_f32_into(payload, &mut values);
        Ok(values)
    }
}

macro_rules! impl_primitive_for_aggregate {
    ($type:ty, $components:expr) => {
        impl Primitive for $type {
            const TYPE_NAME: &'static str = stringify!($type);
            const PAYLOAD_SIZE: Option<usize> = Some($components * 4);

            fn write_payload(&self, output: &mut Vec<u8>) {
                self.to_array().write_payload(output);
            }

            fn read_payload(payload: &[u8]) -> CodecResult<Self> {
                check_payload_size::<Self>(payload)?;
                Ok(<$type>::from_array(<[f32; $components]>::read_payload(payload)?))
            }
        }
    };
}

impl_primitive_for_aggregate!(Vec2, 2);
impl_primitive_for_aggregate!(Vec3, 3);
impl_primitive_for_aggregate!(Vec4, 4);
impl_primitive_for_aggregate!(Quat, 4);
impl_primitive_for_aggregate!(Mat3, 9);
impl_primitive_for_aggregate!(Mat4, 16);
impl_primitive_for_aggregate!(Transform, 10);

/// An opaque byte blob stored as a single field
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteBlob(pub Vec<u8>);

impl From<Vec<u8>> for ByteBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Deref for ByteBlob {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ByteBlob {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Primitive for ByteBlob {
    const TYPE_NAME: &'static str = "ByteBlob";
    const PAYLOAD_SIZE: Option<usize> = None;

    fn write_payload(&self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.0);
    }

    fn read_payload(payload: &[u8]) -> CodecResult<Self> {
        Ok(Self(payload.to_vec()))
    }
}

//endregion

//region Value Wrapper

/// Leaf entity boxing a single primitive or aggregate value as bytes.
///
/// The wrapper does not record what type it holds; whoever reads it back must ask for the
/// type that was stored. Fixed-width types are checked against the payload length.
///
/// # Example
/// ```
/// use graphcodec_serialization::ValueWrapper;
/// use graphcodec_structures::Vec3;
///
/// let wrapper = ValueWrapper::new(&Vec3::new(1.0, 2.0, 3.0));
/// assert_eq!(wrapper.len(), 12);
/// assert_eq!(wrapper.get_value::<Vec3>().unwrap(), Vec3::new(1.0, 2.0, 3.0));
/// assert!(wrapper.get_value::<u64>().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueWrapper {
    payload: Vec<u8>,
}

impl ValueWrapper {
    pub const CLASS_NAME: &'static str = "ValueWrapper";

    pub fn new<T: Primitive>(value: &T) -> Self {
        let mut payload = Vec::with_capacity(T::PAYLOAD_SIZE.unwrap_or(0));
        value.write_payload(&mut payload);
        Self { payload }
    }

    pub fn from_payload(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    pub fn get_value<T: Primitive>(&self) -> CodecResult<T> {
        T::read_payload(&self.payload)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

// The payload travels inside the object record, so there are no named fields to walk.
impl Codable for ValueWrapper {
    fn class_name(&self) -> &str {
        Self::CLASS_NAME
    }

    fn encode(&self, _encoder: &mut dyn Encoder) -> CodecResult<()> {
        Ok(())
    }

    fn decode(&mut self, _decoder: &mut dyn Decoder) -> CodecResult<()> {
        Ok(())
    }
}

//endregion
