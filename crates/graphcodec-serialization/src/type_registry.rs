use crate::entity::{Codable, EntityRef};
use crate::value_wrapper::ValueWrapper;
use ahash::AHashMap;
use std::fmt::{Debug, Formatter};

/// Produces a blank instance of one entity type
pub type EntityFactory = Box<dyn Fn() -> EntityRef>;

/// Maps class names to factories producing blank instances of that class.
///
/// This is the only place a decoder learns which concrete type to build for a record, so
/// the encoding and decoding sides must register the same classes for a round trip to
/// succeed. A new registry always knows [`ValueWrapper`].
///
/// # Example
/// ```
/// use graphcodec_serialization::{TypeRegistry, ValueWrapper};
///
/// let mut registry = TypeRegistry::new();
/// assert!(registry.has_factory(ValueWrapper::CLASS_NAME));
/// assert!(registry.build("Missing").is_none());
///
/// registry.register("Blob", || graphcodec_serialization::EntityRef::new(ValueWrapper::default()));
/// assert!(registry.has_factory("Blob"));
/// assert!(registry.unregister("Blob"));
/// ```
pub struct TypeRegistry {
    factories: AHashMap<String, EntityFactory>,
}

impl TypeRegistry {
    /// Creates a registry that only knows the value wrapper class.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_type::<ValueWrapper>();
        registry
    }

    /// Creates a registry with no classes at all.
    pub fn empty() -> Self {
        Self {
            factories: AHashMap::new(),
        }
    }

    /// Registers `factory` under `class_name`. Returns true if it replaced an existing factory.
    pub fn register<F>(&mut self, class_name: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> EntityRef + 'static,
    {
        self.factories
            .insert(class_name.into(), Box::new(factory))
            .is_some()
    }

    /// Registers `T` under the class name reported by `T::default()`.
    pub fn register_type<T: Codable + Default>(&mut self) -> bool {
        let class_name = T::default().class_name().to_string();
        self.register(class_name, || EntityRef::new(T::default()))
    }

    /// Removes the factory for `class_name`. Returns true if one was registered.
    pub fn unregister(&mut self, class_name: &str) -> bool {
        self.factories.remove(class_name).is_some()
    }

    pub fn has_factory(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    /// Builds a blank instance of `class_name`, or `None` if the class is unknown.
    pub fn build(&self, class_name: &str) -> Option<EntityRef> {
        let factory = self.factories.get(class_name)?;
        let entity = factory();
        if entity.class_name() != class_name {
            tracing::debug!(
                requested = class_name,
                built = entity.class_name(),
                "Factory built an entity reporting a different class name"
            );
        }
        Some(entity)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// All registered class names, sorted.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for TypeRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("class_names", &self.class_names())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protocol::{Decoder, Encoder};
    use graphcodec_structures::CodecResult;

    #[derive(Default)]
    pub(crate) struct Blank;

    impl Codable for Blank {
        fn class_name(&self) -> &str {
            "Blank"
        }

        fn encode(&self, _encoder: &mut dyn Encoder) -> CodecResult<()> {
            Ok(())
        }

        fn decode(&mut self, _decoder: &mut dyn Decoder) -> CodecResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_build() {
        let mut registry = TypeRegistry::new();
        assert!(!registry.has_factory("Blank"));
        assert!(!registry.register_type::<Blank>());
        assert!(registry.has_factory("Blank"));
        assert_eq!(registry.len(), 2);

        let built = registry.build("Blank").unwrap();
        assert!(built.is::<Blank>());
        let second = registry.build("Blank").unwrap();
        assert!(!built.ptr_eq(&second));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = TypeRegistry::empty();
        assert!(registry.is_empty());
        assert!(!registry.register("Blank", || EntityRef::new(Blank)));
        assert!(registry.register("Blank", || EntityRef::new(Blank)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let mut registry = TypeRegistry::new();
        registry.register_type::<Blank>();
        assert!(registry.unregister("Blank"));
        assert!(!registry.unregister("Blank"));
        assert!(registry.build("Blank").is_none());
        assert_eq!(registry.class_names(), vec![ValueWrapper::CLASS_NAME]);
    }
}
