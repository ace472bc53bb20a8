use crate::entity::{borrow_typed, EntityId, EntityRef};
use crate::protocol::Encoder;
use crate::type_registry::TypeRegistry;
use crate::value_wrapper::ValueWrapper;
use crate::wire_format::{ByteWriter, Marker, ObjectIndex};
use ahash::AHashMap;
use graphcodec_structures::{CodecError, CodecLimits, CodecResult, DEFAULT_FORMAT_VERSION};
use std::fmt::{Debug, Formatter};

/// An entity that has entered the discovery stack
struct DiscoveredObject {
    index: ObjectIndex,
    entity: EntityRef,
    /// Value wrapper payload, copied when the wrapper was discovered
    payload: Option<Vec<u8>>,
    /// Larger is closer to the top of the discovery stack
    last_touch: u64,
}

struct LinkRecord {
    owner: EntityId,
    key: String,
    target: EntityId,
}

/// Walks entity graphs and serializes them into the binary wire format.
///
/// Every entity handed to [`encode`](BinaryEncoder::encode) becomes a root, and everything
/// reachable from it through owning fields is written once, no matter how many fields
/// point at it. Cycles are fine: the walk uses a work-list and never visits an entity
/// twice. Entities whose class is not registered are left out along with the fields that
/// pointed at them.
///
/// # Example
/// ```
/// use graphcodec_serialization::{BinaryEncoder, EntityRef, TypeRegistry, ValueWrapper};
///
/// let registry = TypeRegistry::new();
/// let mut encoder = BinaryEncoder::new(&registry);
/// assert!(encoder.encode(&EntityRef::new(ValueWrapper::new(&42u32))).unwrap());
/// assert_eq!(encoder.root_count(), 1);
///
/// let bytes = encoder.get_bytes();
/// assert_eq!(bytes.first(), Some(&0xA0));
/// assert_eq!(bytes.last(), Some(&0xA1));
/// ```
pub struct BinaryEncoder<'r> {
    registry: &'r TypeRegistry,
    version: String,
    limits: CodecLimits,
    discovered: AHashMap<EntityId, DiscoveredObject>,
    links: Vec<LinkRecord>,
    link_slots: AHashMap<(EntityId, String), usize>,
    roots: Vec<EntityId>,
    /// Entity currently describing its fields, with its depth below the root
    current_parent: Option<(EntityId, usize)>,
    pending: Vec<(EntityRef, usize)>,
    next_index: ObjectIndex,
    touch_counter: u64,
}

impl<'r> BinaryEncoder<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            version: DEFAULT_FORMAT_VERSION.to_string(),
            limits: CodecLimits::default(),
            discovered: AHashMap::new(),
            links: Vec::new(),
            link_slots: AHashMap::new(),
            roots: Vec::new(),
            current_parent: None,
            pending: Vec::new(),
            next_index: 0,
            touch_counter: 0,
        }
    }

    /// Sets the version string written into the stream header.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_limits(mut self, limits: CodecLimits) -> Self {
        self.limits = limits;
        self
    }

    //region Encoding

    /// Adds `entity` and everything it owns to the stream, with `entity` as a root.
    ///
    /// Returns `Ok(false)` and changes nothing if the entity's class is not registered.
    /// Encoding an entity that was already discovered only moves it to the top of the
    /// discovery stack. A hard error (limits, a busy entity) resets the encoder.
    pub fn encode(&mut self, entity: &EntityRef) -> CodecResult<bool> {
        let result = self.encode_root(entity);
        if let Err(err) = &result {
            tracing::warn!(error = %err, class_name = entity.class_name(), "Encoding aborted");
            self.clear();
        }
        result
    }

    fn encode_root(&mut self, entity: &EntityRef) -> CodecResult<bool> {
        let previous = self.current_parent.take();
        let result = self
            .touch(entity, 0)
            .and_then(|touched| if touched { self.drain().map(|_| true) } else { Ok(false) });
        self.current_parent = previous;
        result
    }

    /// Brings `entity` into the discovery stack, or bumps it to the top if already there.
    fn touch(&mut self, entity: &EntityRef, depth: usize) -> CodecResult<bool> {
        if !self.registry.has_factory(entity.class_name()) {
            tracing::warn!(
                class_name = entity.class_name(),
                identity = %entity.identity(),
                "Skipping entity of unregistered class"
            );
            return Ok(false);
        }

        self.touch_counter += 1;
        if let Some(object) = self.discovered.get_mut(&entity.identity()) {
            object.last_touch = self.touch_counter;
            return Ok(true);
        }

        let payload = snapshot_payload(entity)?;
        if payload.is_none() && depth > self.limits.max_depth {
            return Err(CodecError::DepthLimitExceeded(self.limits.max_depth));
        }
        if self.discovered.len() >= self.limits.max_objects {
            return Err(CodecError::ObjectLimitExceeded(self.limits.max_objects));
        }

        let walk = payload.is_none();
        self.discovered.insert(
            entity.identity(),
            DiscoveredObject {
                index: self.next_index,
                entity: entity.clone(),
                payload,
                last_touch: self.touch_counter,
            },
        );
        self.next_index += 1;

        if self.current_parent.is_none() {
            self.roots.push(entity.identity());
        }
        if walk {
            self.pending.push((entity.clone(), depth));
        }
        Ok(true)
    }

    /// Lets every queued entity describe its fields.
    fn drain(&mut self) -> CodecResult<()> {
        while let Some((entity, depth)) = self.pending.pop() {
            tracing::debug!(class_name = entity.class_name(), depth, "Encoding entity");
            let previous = self.current_parent.replace((entity.identity(), depth));
            let result = match entity.try_borrow() {
                Ok(described) => described.encode(self),
                Err(err) => Err(err),
            };
            self.current_parent = previous;
            result?;
        }
        Ok(())
    }

    fn record_link(&mut self, owner: EntityId, key: &str, target: EntityId) {
        let slot_key = (owner, key.to_string());
        match self.link_slots.get(&slot_key) {
            Some(&slot) => self.links[slot].target = target,
            None => {
                self.link_slots.insert(slot_key, self.links.len());
                self.links.push(LinkRecord {
                    owner,
                    key: key.to_string(),
                    target,
                });
            }
        }
    }

    //endregion

    //region Output

    /// Serializes everything encoded so far.
    ///
    /// Objects are written from the top of the discovery stack down. Links whose target
    /// never entered the stream (non-owning references to outside entities) are left out.
    pub fn get_bytes(&self) -> Vec<u8> {
        let mut ordered: Vec<&DiscoveredObject> = self.discovered.values().collect();
        ordered.sort_unstable_by(|a, b| b.last_touch.cmp(&a.last_touch));

        let mut writer = ByteWriter::with_capacity(64 * ordered.len() + 32);
        writer.write_marker(Marker::Start);
        writer.write_marker(Marker::Version);
        writer.write_string(&self.version);

        for object in &ordered {
            writer.write_marker(Marker::ObjectBegin);
            writer.write_identity(object.index);
            writer.write_string(object.entity.class_name());
            if let Some(payload) = &object.payload {
                writer.write_payload(payload);
            }
            writer.write_marker(Marker::ObjectEnd);
        }

        let mut omitted_links = 0usize;
        for link in &self.links {
            match (self.index_of(link.owner), self.index_of(link.target)) {
                (Some(owner), Some(target)) => {
                    writer.write_marker(Marker::LinkBegin);
                    writer.write_identity(owner);
                    writer.write_string(&link.key);
                    writer.write_identity(target);
                    writer.write_marker(Marker::LinkEnd);
                }
                _ => omitted_links += 1,
            }
        }

        for root in &self.roots {
            if let Some(index) = self.index_of(*root) {
                writer.write_marker(Marker::RootBegin);
                writer.write_identity(index);
                writer.write_marker(Marker::RootEnd);
            }
        }
        writer.write_marker(Marker::End);

        tracing::debug!(
            objects = ordered.len(),
            links = self.links.len() - omitted_links,
            omitted_links,
            roots = self.roots.len(),
            "Serialized graph"
        );
        writer.into_bytes()
    }

    fn index_of(&self, identity: EntityId) -> Option<ObjectIndex> {
        self.discovered.get(&identity).map(|object| object.index)
    }

    //endregion

    /// Forgets every discovered entity, link, and root.
    pub fn clear(&mut self) {
        self.discovered.clear();
        self.links.clear();
        self.link_slots.clear();
        self.roots.clear();
        self.current_parent = None;
        self.pending.clear();
        self.next_index = 0;
        self.touch_counter = 0;
    }

    pub fn object_count(&self) -> usize {
        self.discovered.len()
    }

    /// Number of recorded links, including references that may be omitted from the output
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn limits(&self) -> &CodecLimits {
        &self.limits
    }
}

impl Encoder for BinaryEncoder<'_> {
    fn encode_entity(&mut self, key: &str, entity: &EntityRef) -> CodecResult<bool> {
        let Some((parent, depth)) = self.current_parent else {
            return self.encode(entity);
        };
        if !self.touch(entity, depth + 1)? {
            return Ok(false);
        }
        self.record_link(parent, key, entity.identity());
        Ok(true)
    }

    fn encode_reference(&mut self, key: &str, entity: &EntityRef) -> CodecResult<bool> {
        let Some((parent, _)) = self.current_parent else {
            return Ok(false);
        };
        if !self.registry.has_factory(entity.class_name()) {
            return Ok(false);
        }
        self.record_link(parent, key, entity.identity());
        Ok(true)
    }
}

impl Debug for BinaryEncoder<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryEncoder")
            .field("version", &self.version)
            .field("objects", &self.discovered.len())
            .field("links", &self.links.len())
            .field("roots", &self.roots.len())
            .finish()
    }
}

fn snapshot_payload(entity: &EntityRef) -> CodecResult<Option<Vec<u8>>> {
    let Some(wrapper) = entity.downcast::<ValueWrapper>() else {
        return Ok(None);
    };
    let wrapper = borrow_typed(&wrapper, entity.class_name())?;
    Ok(Some(wrapper.payload().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{node, registry, with_node, Stranger};
    use crate::protocol::Reference;

    #[test]
    fn test_stream_is_framed() {
        let registry = registry();
        let mut encoder = BinaryEncoder::new(&registry).with_version("2.5");
        encoder.encode(&node("root")).unwrap();
        let bytes = encoder.get_bytes();

        assert_eq!(bytes[0], Marker::Start as u8);
        assert_eq!(bytes[1], Marker::Version as u8);
        assert_eq!(&bytes[2..10], &4u64.to_le_bytes());
        assert_eq!(&bytes[10..14], b"2.5\0");
        assert_eq!(bytes[14], Marker::ObjectBegin as u8);
        assert_eq!(*bytes.last().unwrap(), Marker::End as u8);
    }

    #[test]
    fn test_unregistered_root_has_no_effect() {
        let registry = registry();
        let mut encoder = BinaryEncoder::new(&registry);
        assert!(!encoder.encode(&EntityRef::new(Stranger)).unwrap());
        assert_eq!(encoder.object_count(), 0);
        assert_eq!(encoder.root_count(), 0);
    }

    #[test]
    fn test_shared_child_is_discovered_once() {
        let registry = registry();
        let parent = node("parent");
        let child = node("child");
        with_node(&parent, |p| {
            p.child = Some(child.clone());
            p.children = vec![Some(child.clone())];
        });

        let mut encoder = BinaryEncoder::new(&registry);
        assert!(encoder.encode(&parent).unwrap());
        // two nodes, each with name, weight and children_size wrappers
        assert_eq!(encoder.object_count(), 8);
        // parent: name, weight, child, children_size, children_0; child: name, weight, children_size
        assert_eq!(encoder.link_count(), 8);
        assert_eq!(encoder.root_count(), 1);
    }

    #[test]
    fn test_cycle_terminates() {
        let registry = registry();
        let a = node("a");
        let b = node("b");
        with_node(&a, |n| n.child = Some(b.clone()));
        with_node(&b, |n| n.child = Some(a.clone()));

        let mut encoder = BinaryEncoder::new(&registry);
        assert!(encoder.encode(&a).unwrap());
        assert_eq!(encoder.object_count(), 8);
        assert_eq!(encoder.root_count(), 1);
    }

    #[test]
    fn test_encoding_a_root_twice_only_bumps_it() {
        let registry = registry();
        let root = node("root");
        let mut encoder = BinaryEncoder::new(&registry);
        encoder.encode(&root).unwrap();
        let objects = encoder.object_count();
        assert!(encoder.encode(&root).unwrap());
        assert_eq!(encoder.object_count(), objects);
        assert_eq!(encoder.root_count(), 1);
    }

    #[test]
    fn test_unregistered_child_is_left_out() {
        let registry = registry();
        let parent = node("parent");
        with_node(&parent, |p| {
            p.child = Some(EntityRef::new(Stranger));
            p.children = vec![Some(node("kept")), Some(EntityRef::new(Stranger))];
        });

        let mut encoder = BinaryEncoder::new(&registry);
        assert!(encoder.encode(&parent).unwrap());
        // parent + kept, each with three wrappers
        assert_eq!(encoder.object_count(), 8);
        // parent: name, weight, children_size, children_0; kept: name, weight, children_size
        assert_eq!(encoder.link_count(), 7);
    }

    #[test]
    fn test_reference_to_outside_entity_is_omitted() {
        let registry = registry();
        let root = node("root");
        let outside = node("outside");
        with_node(&root, |n| n.parent = Reference::new(outside.clone()));

        let mut encoder = BinaryEncoder::new(&registry);
        encoder.encode(&root).unwrap();
        assert_eq!(encoder.object_count(), 4);
        assert_eq!(encoder.link_count(), 4);

        let with_reference = encoder.get_bytes();
        encoder.encode(&outside).unwrap();
        assert_eq!(encoder.root_count(), 2);
        assert!(encoder.get_bytes().len() > with_reference.len());
    }

    #[test]
    fn test_depth_limit() {
        let registry = registry();
        let a = node("a");
        let b = node("b");
        let c = node("c");
        with_node(&a, |n| n.child = Some(b.clone()));
        with_node(&b, |n| n.child = Some(c.clone()));

        let limits = CodecLimits::default().with_max_depth(1);
        let mut encoder = BinaryEncoder::new(&registry).with_limits(limits);
        assert!(matches!(
            encoder.encode(&a),
            Err(CodecError::DepthLimitExceeded(1))
        ));
        assert_eq!(encoder.object_count(), 0);

        let limits = CodecLimits::default().with_max_depth(2);
        let mut encoder = BinaryEncoder::new(&registry).with_limits(limits);
        assert!(encoder.encode(&a).unwrap());
    }

    #[test]
    fn test_object_limit() {
        let registry = registry();
        let limits = CodecLimits::default().with_max_objects(3);
        let mut encoder = BinaryEncoder::new(&registry).with_limits(limits);
        assert!(matches!(
            encoder.encode(&node("root")),
            Err(CodecError::ObjectLimitExceeded(3))
        ));
        assert_eq!(encoder.root_count(), 0);
    }

    #[test]
    fn test_busy_entity_aborts_the_pass() {
        let registry = registry();
        let root = node("root");
        let node_cell = root.downcast::<crate::fixtures::Node>().unwrap();
        let _guard = node_cell.borrow_mut();

        let mut encoder = BinaryEncoder::new(&registry);
        assert!(matches!(
            encoder.encode(&root),
            Err(CodecError::EntityBusy(_))
        ));
        assert_eq!(encoder.object_count(), 0);
    }

    #[test]
    fn test_clear() {
        let registry = registry();
        let mut encoder = BinaryEncoder::new(&registry);
        encoder.encode(&node("root")).unwrap();
        encoder.clear();
        assert_eq!(encoder.object_count(), 0);
        assert_eq!(encoder.link_count(), 0);
        assert_eq!(encoder.root_count(), 0);
    }
}
