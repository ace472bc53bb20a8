use crate::protocol::{Decoder, Encoder};
use graphcodec_structures::{CodecError, CodecResult};
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// The capability every serializable object implements.
///
/// `encode` must forward every field it wants persisted, by name and in a stable order.
/// `decode` must request the same names, in any order. Neither call may have side effects
/// beyond reading or writing fields, since a codec may visit an entity more than once.
///
/// # Example
/// ```
/// use graphcodec_serialization::{Codable, Decoder, Encoder};
/// use graphcodec_structures::CodecResult;
///
/// #[derive(Default)]
/// struct Marker {
///     label: String,
/// }
///
/// impl Codable for Marker {
///     fn class_name(&self) -> &str {
///         "Marker"
///     }
///
///     fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()> {
///         encoder.encode("label", &self.label)?;
///         Ok(())
///     }
///
///     fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()> {
///         decoder.decode("label", &mut self.label)?;
///         Ok(())
///     }
/// }
/// ```
pub trait Codable: Any {
    /// Stable textual type tag used to look the type up in a [`TypeRegistry`](crate::TypeRegistry).
    fn class_name(&self) -> &str;

    /// Describes every persisted field to the encoder.
    fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()>;

    /// Requests every persisted field back from the decoder.
    fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()>;
}

/// Process-local identity of an entity. Unique for the lifetime of the process and never
/// written to a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared handle to an entity in a graph.
///
/// Cloning the handle shares the entity, which is how a graph expresses "two fields point
/// at the same object". The identity and class name are fixed when the handle is created.
#[derive(Clone)]
pub struct EntityRef {
    identity: EntityId,
    class_name: Rc<str>,
    cell: Rc<RefCell<dyn Codable>>,
    /// Same allocation as `cell`, kept for checked downcasts
    any: Rc<dyn Any>,
}

impl EntityRef {
    /// Moves `value` onto the heap and gives it a fresh identity.
    pub fn new<T: Codable>(value: T) -> Self {
        let class_name: Rc<str> = Rc::from(value.class_name());
        let shared = Rc::new(RefCell::new(value));
        let any: Rc<dyn Any> = shared.clone();
        let cell: Rc<RefCell<dyn Codable>> = shared;
        Self {
            identity: EntityId::next(),
            class_name,
            cell,
            any,
        }
    }

    pub fn identity(&self) -> EntityId {
        self.identity
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// True if both handles refer to the same entity.
    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        self.identity == other.identity
    }

    /// True if the entity is of concrete type `T`.
    pub fn is<T: Codable>(&self) -> bool {
        self.any.is::<RefCell<T>>()
    }

    /// Returns the entity as its concrete type, or `None` if it is of a different type.
    pub fn downcast<T: Codable>(&self) -> Option<Rc<RefCell<T>>> {
        Rc::clone(&self.any).downcast::<RefCell<T>>().ok()
    }

    /// Borrows the entity for reading.
    pub fn try_borrow(&self) -> CodecResult<Ref<'_, dyn Codable>> {
        self.cell
            .try_borrow()
            .map_err(|_| CodecError::EntityBusy(self.class_name.to_string()))
    }

    /// Borrows the entity for writing.
    pub fn try_borrow_mut(&self) -> CodecResult<RefMut<'_, dyn Codable>> {
        self.cell
            .try_borrow_mut()
            .map_err(|_| CodecError::EntityBusy(self.class_name.to_string()))
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for EntityRef {}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl Debug for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRef")
            .field("identity", &self.identity)
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}

/// Borrows a downcast entity for reading, mapping a conflicting borrow to [`CodecError::EntityBusy`].
pub(crate) fn borrow_typed<'a, T: Codable>(
    cell: &'a RefCell<T>,
    class_name: &str,
) -> CodecResult<Ref<'a, T>> {
    cell.try_borrow()
        .map_err(|_| CodecError::EntityBusy(class_name.to_string()))
}

/// Mutable counterpart of [`borrow_typed`].
pub(crate) fn borrow_typed_mut<'a, T: Codable>(
    cell: &'a RefCell<T>,
    class_name: &str,
) -> CodecResult<RefMut<'a, T>> {
    cell.try_borrow_mut()
        .map_err(|_| CodecError::EntityBusy(class_name.to_string()))
}
