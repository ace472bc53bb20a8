//! The abstract encoder/decoder protocol shared by every wire format.
//!
//! An [`Encoder`] or [`Decoder`] only knows how to link entities to entities. Primitive
//! values reach it already boxed in a [`ValueWrapper`], and collections reach it as a
//! `key_size` count plus one `key_i` field per element. Both conversions live in the
//! [`Field`] implementations below, so a wire format implements a handful of methods and
//! every field type works with it.

use crate::entity::{borrow_typed, EntityRef};
use crate::value_wrapper::{ByteBlob, Primitive, ValueWrapper};
use graphcodec_structures::{
    CodecError, CodecResult, Mat3, Mat4, Quat, Transform, Vec2, Vec3, Vec4,
};

//region Encoder / Decoder

/// Receives the fields an entity describes while it is being encoded.
pub trait Encoder {
    /// Encodes `entity` as the field `key` of the entity currently being described. Called
    /// with no entity being described, `entity` becomes a root.
    ///
    /// Returns `Ok(false)` when the entity cannot be encoded (its class is not
    /// registered); the field is then simply absent from the output.
    fn encode_entity(&mut self, key: &str, entity: &EntityRef) -> CodecResult<bool>;

    /// Records `key` as a non-owning reference to `entity`. The target is not walked; the
    /// reference survives only if the target is written through some owning field or as a
    /// root.
    fn encode_reference(&mut self, key: &str, entity: &EntityRef) -> CodecResult<bool>;

    /// Called before the elements of a collection are encoded.
    fn begin_array(&mut self, _key: &str, _len: usize) -> CodecResult<()> {
        Ok(())
    }

    /// Called after the last element of a collection is encoded.
    fn end_array(&mut self, _key: &str) -> CodecResult<()> {
        Ok(())
    }
}

/// Supplies the fields an entity requests while it is being decoded.
pub trait Decoder {
    /// Resolves the entity linked as field `key` of the entity currently being decoded.
    /// Returns `Ok(None)` when no such link exists.
    fn decode_entity(&mut self, key: &str) -> CodecResult<Option<EntityRef>>;

    /// Largest collection length this decoder will allocate for. A declared length above
    /// it fails with [`CodecError::CollectionLimitExceeded`] before anything is allocated.
    fn collection_limit(&self) -> usize {
        usize::MAX
    }

    /// Called after a collection's length is known and before its elements are decoded.
    fn begin_array(&mut self, _key: &str, _len: usize) -> CodecResult<()> {
        Ok(())
    }

    /// Called after the last element of a collection is decoded.
    fn end_array(&mut self, _key: &str) -> CodecResult<()> {
        Ok(())
    }
}

impl<'a> dyn Encoder + 'a {
    /// Encodes any [`Field`] under `key`.
    pub fn encode<T: Field + ?Sized>(&mut self, key: &str, value: &T) -> CodecResult<bool> {
        value.encode_field(key, self)
    }
}

impl<'a> dyn Decoder + 'a {
    /// Decodes any [`Field`] under `key` into `value`. An absent field leaves `value`
    /// untouched and returns `Ok(false)`.
    pub fn decode<T: Field + ?Sized>(&mut self, key: &str, value: &mut T) -> CodecResult<bool> {
        value.decode_field(key, self)
    }
}

//endregion

//region Field

/// A value that can appear as a named field of an entity.
pub trait Field {
    fn encode_field(&self, key: &str, encoder: &mut dyn Encoder) -> CodecResult<bool>;

    fn decode_field(&mut self, key: &str, decoder: &mut dyn Decoder) -> CodecResult<bool>;
}

/// Key under which a collection stores its length
pub fn array_size_key(key: &str) -> String {
    format!("{}_size", key)
}

/// Key under which a collection stores the element at `index`
pub fn array_element_key(key: &str, index: usize) -> String {
    format!("{}_{}", key, index)
}

fn encode_primitive<T: Primitive>(
    value: &T,
    key: &str,
    encoder: &mut dyn Encoder,
) -> CodecResult<bool> {
    encoder.encode_entity(key, &EntityRef::new(ValueWrapper::new(value)))
}

fn decode_primitive<T: Primitive>(
    value: &mut T,
    key: &str,
    decoder: &mut dyn Decoder,
) -> CodecResult<bool> {
    let Some(entity) = decoder.decode_entity(key)? else {
        return Ok(false);
    };
    let wrapper = entity
        .downcast::<ValueWrapper>()
        .ok_or_else(|| CodecError::NotAValue {
            key: key.to_string(),
            class_name: entity.class_name().to_string(),
        })?;
    let wrapper = borrow_typed(&wrapper, entity.class_name())?;
    *value = wrapper.get_value::<T>()?;
    Ok(true)
}

macro_rules! impl_field_for_primitive {
    ($($type:ty),* $(,)?) => {
        $(
            impl Field for $type {
                fn encode_field(&self, key: &str, encoder: &mut dyn Encoder) -> CodecResult<bool> {
                    encode_primitive(self, key, encoder)
                }

                fn decode_field(&mut self, key: &str, decoder: &mut dyn Decoder) -> CodecResult<bool> {
                    decode_primitive(self, key, decoder)
                }
            }
        )*
    };
}

impl_field_for_primitive!(
    i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool, String, ByteBlob, Vec2, Vec3, Vec4,
    Quat, Mat3, Mat4, Transform,
);

/// An owning link to another entity. `None` encodes nothing.
impl Field for Option<EntityRef> {
    fn encode_field(&self, key: &str, encoder: &mut dyn Encoder) -> CodecResult<bool> {
        match self {
            Some(entity) => encoder.encode_entity(key, entity),
            None => Ok(false),
        }
    }

    fn decode_field(&mut self, key: &str, decoder: &mut dyn Decoder) -> CodecResult<bool> {
        match decoder.decode_entity(key)? {
            Some(entity) => {
                *self = Some(entity);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Homogeneous ordered collection. The length goes under `key_size` and each element
/// under `key_i`, so any element type gains collection support for free. Elements that
/// fail to encode leave a default value at their index after decoding.
impl<T: Field + Default> Field for Vec<T> {
    fn encode_field(&self, key: &str, encoder: &mut dyn Encoder) -> CodecResult<bool> {
        encoder.begin_array(key, self.len())?;
        let size = self.len() as u64;
        if !size.encode_field(&array_size_key(key), encoder)? {
            return Ok(false);
        }
        for (index, element) in self.iter().enumerate() {
            element.encode_field(&array_element_key(key, index), encoder)?;
        }
        encoder.end_array(key)?;
        Ok(true)
    }

    fn decode_field(&mut self, key: &str, decoder: &mut dyn Decoder) -> CodecResult<bool> {
        let mut size = 0u64;
        if !size.decode_field(&array_size_key(key), decoder)? {
            return Ok(false);
        }
        let limit = decoder.collection_limit();
        let len = usize::try_from(size)
            .ok()
            .filter(|len| *len <= limit)
            .ok_or_else(|| CodecError::CollectionLimitExceeded {
                key: key.to_string(),
                declared: size,
                limit,
            })?;

        decoder.begin_array(key, len)?;
        self.clear();
        self.resize_with(len, T::default);
        for (index, element) in self.iter_mut().enumerate() {
            element.decode_field(&array_element_key(key, index), decoder)?;
        }
        decoder.end_array(key)?;
        Ok(true)
    }
}

//endregion

//region Reference

/// A non-owning link to another entity, such as a child's pointer back to its parent.
///
/// Encoding a reference never pulls its target into the stream. After decoding, the
/// reference is set only if the target was written through an owning field or as a root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference(Option<EntityRef>);

impl Reference {
    pub fn new(target: EntityRef) -> Self {
        Self(Some(target))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<&EntityRef> {
        self.0.as_ref()
    }

    pub fn set(&mut self, target: Option<EntityRef>) {
        self.0 = target;
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl From<EntityRef> for Reference {
    fn from(target: EntityRef) -> Self {
        Self::new(target)
    }
}

impl Field for Reference {
    fn encode_field(&self, key: &str, encoder: &mut dyn Encoder) -> CodecResult<bool> {
        match &self.0 {
            Some(entity) => encoder.encode_reference(key, entity),
            None => Ok(false),
        }
    }

    fn decode_field(&mut self, key: &str, decoder: &mut dyn Decoder) -> CodecResult<bool> {
        self.0.decode_field(key, decoder)
    }
}

//endregion
