use crate::entity::{borrow_typed_mut, Codable, EntityRef};
use crate::protocol::Decoder;
use crate::type_registry::TypeRegistry;
use crate::value_wrapper::ValueWrapper;
use crate::wire_format::{ByteReader, Marker, ObjectIndex};
use ahash::AHashMap;
use graphcodec_structures::{CodecError, CodecLimits, CodecResult};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Rebuilds entity graphs from the binary wire format.
///
/// The whole stream is parsed into object, link and root tables first, building every
/// object through the [`TypeRegistry`]. Then every root is asked to decode itself; a
/// field resolves to the entity its link points at, which is in turn decoded once. Any
/// failure leaves the decoder empty.
///
/// Entities returned through a field are shared handles. An entity handed back to a
/// parent may not have decoded its own fields yet; they are filled in before
/// [`from_bytes`](BinaryDecoder::from_bytes) returns.
///
/// # Example
/// ```
/// use graphcodec_serialization::{BinaryDecoder, BinaryEncoder, EntityRef, TypeRegistry, ValueWrapper};
///
/// let registry = TypeRegistry::new();
/// let mut encoder = BinaryEncoder::new(&registry);
/// encoder.encode(&EntityRef::new(ValueWrapper::new(&7u16))).unwrap();
///
/// let mut decoder = BinaryDecoder::new(&registry);
/// decoder.from_bytes(&encoder.get_bytes()).unwrap();
/// assert_eq!(decoder.get_object_count(), 1);
/// let wrapper = decoder.get_object_at::<ValueWrapper>(0).unwrap();
/// assert_eq!(wrapper.borrow().get_value::<u16>().unwrap(), 7);
/// ```
pub struct BinaryDecoder<'r> {
    registry: &'r TypeRegistry,
    limits: CodecLimits,
    version: Option<String>,
    /// Every constructed object, in stream order
    objects: Vec<EntityRef>,
    object_table: AHashMap<ObjectIndex, usize>,
    /// Owner slot -> field name -> target slot
    links: AHashMap<usize, AHashMap<String, usize>>,
    /// Distinct `(owner, field)` links in the stream
    link_count: usize,
    roots: Vec<usize>,
    scheduled: Vec<bool>,
    /// Slot of the entity currently decoding its fields, with its depth below the root
    current: Option<(usize, usize)>,
    pending: Vec<(usize, usize)>,
}

impl<'r> BinaryDecoder<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            limits: CodecLimits::default(),
            version: None,
            objects: Vec::new(),
            object_table: AHashMap::new(),
            links: AHashMap::new(),
            link_count: 0,
            roots: Vec::new(),
            scheduled: Vec::new(),
            current: None,
            pending: Vec::new(),
        }
    }

    pub fn with_limits(mut self, limits: CodecLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replaces the decoder's contents with the graph encoded in `bytes`.
    pub fn from_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.clear();
        let result = self.parse(bytes).and_then(|_| self.decode_roots());
        match &result {
            Ok(()) => tracing::debug!(
                objects = self.objects.len(),
                roots = self.roots.len(),
                version = self.version.as_deref().unwrap_or_default(),
                "Decoded graph"
            ),
            Err(err) => {
                tracing::warn!(error = %err, "Discarding partially decoded graph");
                self.clear();
            }
        }
        result
    }

    //region Parsing

    fn parse(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let mut reader = ByteReader::new(bytes);
        reader.expect_marker(Marker::Start)?;
        reader.expect_marker(Marker::Version)?;
        self.version = Some(reader.read_string(self.limits.max_string_length)?);

        loop {
            let position = reader.position();
            match reader.read_marker()? {
                Marker::ObjectBegin => self.read_object(&mut reader)?,
                Marker::LinkBegin => self.read_link(&mut reader)?,
                Marker::RootBegin => self.read_root(&mut reader)?,
                Marker::End => break,
                other => {
                    return Err(CodecError::UnexpectedMarker {
                        expected: "OBJECT_BEGIN, LINK_BEGIN, ROOT_BEGIN or END",
                        found: other as u8,
                        position,
                    })
                }
            }
        }

        if reader.remaining() > 0 {
            return Err(CodecError::TrailingBytes(reader.remaining()));
        }
        Ok(())
    }

    fn read_object(&mut self, reader: &mut ByteReader<'_>) -> CodecResult<()> {
        if self.objects.len() >= self.limits.max_objects {
            return Err(CodecError::ObjectLimitExceeded(self.limits.max_objects));
        }
        let identity = reader.read_identity()?;
        if self.object_table.contains_key(&identity) {
            return Err(CodecError::DuplicateObject(identity));
        }
        let class_name = reader.read_string(self.limits.max_string_length)?;
        let entity = self
            .registry
            .build(&class_name)
            .ok_or_else(|| CodecError::UnknownType(class_name.clone()))?;

        if let Some(wrapper) = entity.downcast::<ValueWrapper>() {
            let payload = reader.read_payload()?;
            borrow_typed_mut(&wrapper, &class_name)?.set_payload(payload.to_vec());
        }
        reader.expect_marker(Marker::ObjectEnd)?;

        self.object_table.insert(identity, self.objects.len());
        self.objects.push(entity);
        self.scheduled.push(false);
        Ok(())
    }

    fn read_link(&mut self, reader: &mut ByteReader<'_>) -> CodecResult<()> {
        let owner = reader.read_identity()?;
        let key = reader.read_string(self.limits.max_string_length)?;
        let target = reader.read_identity()?;
        reader.expect_marker(Marker::LinkEnd)?;

        let owner = self.resolve("link owner", owner)?;
        let target = self.resolve("link target", target)?;
        if self
            .links
            .entry(owner)
            .or_default()
            .insert(key, target)
            .is_none()
        {
            self.link_count += 1;
        }
        Ok(())
    }

    fn read_root(&mut self, reader: &mut ByteReader<'_>) -> CodecResult<()> {
        let identity = reader.read_identity()?;
        reader.expect_marker(Marker::RootEnd)?;
        let slot = self.resolve("root", identity)?;
        self.roots.push(slot);
        Ok(())
    }

    fn resolve(&self, kind: &'static str, identity: ObjectIndex) -> CodecResult<usize> {
        self.object_table
            .get(&identity)
            .copied()
            .ok_or(CodecError::DanglingReference { kind, identity })
    }

    //endregion

    //region Decoding

    fn decode_roots(&mut self) -> CodecResult<()> {
        for index in 0..self.roots.len() {
            self.schedule(self.roots[index], 0)?;
            self.drain()?;
        }
        Ok(())
    }

    /// Queues `slot` for decoding unless it was queued before. Value wrappers are filled
    /// while parsing and never queued.
    fn schedule(&mut self, slot: usize, depth: usize) -> CodecResult<()> {
        if self.scheduled[slot] {
            return Ok(());
        }
        self.scheduled[slot] = true;
        if self.objects[slot].is::<ValueWrapper>() {
            return Ok(());
        }
        if depth > self.limits.max_depth {
            return Err(CodecError::DepthLimitExceeded(self.limits.max_depth));
        }
        self.pending.push((slot, depth));
        Ok(())
    }

    fn drain(&mut self) -> CodecResult<()> {
        while let Some((slot, depth)) = self.pending.pop() {
            let entity = self.objects[slot].clone();
            tracing::debug!(class_name = entity.class_name(), depth, "Decoding entity");
            let previous = self.current.replace((slot, depth));
            let result = match entity.try_borrow_mut() {
                Ok(mut decoded) => decoded.decode(self),
                Err(err) => Err(err),
            };
            self.current = previous;
            result?;
        }
        Ok(())
    }

    //endregion

    //region Results

    /// Number of roots in the decoded graph
    pub fn get_object_count(&self) -> usize {
        self.roots.len()
    }

    /// The root at `index` as its concrete type. `None` if out of range or of another type.
    pub fn get_object_at<T: Codable>(&self, index: usize) -> Option<Rc<RefCell<T>>> {
        self.get_entity_at(index)?.downcast::<T>()
    }

    /// The root at `index` as a shared handle
    pub fn get_entity_at(&self, index: usize) -> Option<EntityRef> {
        let slot = *self.roots.get(index)?;
        self.objects.get(slot).cloned()
    }

    pub fn roots(&self) -> impl Iterator<Item = &EntityRef> + '_ {
        self.roots.iter().map(move |slot| &self.objects[*slot])
    }

    /// Hands the roots over to the caller, consuming the decoder.
    pub fn into_roots(self) -> Vec<EntityRef> {
        let Self { objects, roots, .. } = self;
        roots.into_iter().map(|slot| objects[slot].clone()).collect()
    }

    /// Version string from the stream header, once a stream has been decoded
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Number of objects constructed, roots and value wrappers included
    pub fn total_object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    pub fn clear(&mut self) {
        self.version = None;
        self.objects.clear();
        self.object_table.clear();
        self.links.clear();
        self.link_count = 0;
        self.roots.clear();
        self.scheduled.clear();
        self.current = None;
        self.pending.clear();
    }

    //endregion
}

impl Decoder for BinaryDecoder<'_> {
    fn decode_entity(&mut self, key: &str) -> CodecResult<Option<EntityRef>> {
        let Some((owner, depth)) = self.current else {
            return Ok(None);
        };
        let Some(target) = self
            .links
            .get(&owner)
            .and_then(|fields| fields.get(key))
            .copied()
        else {
            return Ok(None);
        };
        self.schedule(target, depth + 1)?;
        Ok(Some(self.objects[target].clone()))
    }

    /// Every element present in a collection costs the stream one link, so a declared
    /// length is also bounded by the number of links actually read.
    fn collection_limit(&self) -> usize {
        self.limits.max_collection_length.min(self.link_count)
    }
}

impl Debug for BinaryDecoder<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryDecoder")
            .field("version", &self.version)
            .field("objects", &self.objects.len())
            .field("roots", &self.roots.len())
            .finish()
    }
}
