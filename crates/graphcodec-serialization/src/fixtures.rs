//! Small entity types shared by the unit tests of this crate.

use crate::entity::{Codable, EntityRef};
use crate::protocol::{Decoder, Encoder, Reference};
use crate::type_registry::TypeRegistry;
use graphcodec_structures::CodecResult;

#[derive(Default)]
pub(crate) struct Node {
    pub name: String,
    pub weight: f32,
    pub child: Option<EntityRef>,
    pub children: Vec<Option<EntityRef>>,
    pub parent: Reference,
}

impl Codable for Node {
    fn class_name(&self) -> &str {
        "Node"
    }

    fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()> {
        encoder.encode("name", &self.name)?;
        encoder.encode("weight", &self.weight)?;
        encoder.encode("child", &self.child)?;
        encoder.encode("children", &self.children)?;
        encoder.encode("parent", &self.parent)?;
        Ok(())
    }

    fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()> {
        decoder.decode("name", &mut self.name)?;
        decoder.decode("weight", &mut self.weight)?;
        decoder.decode("child", &mut self.child)?;
        decoder.decode("children", &mut self.children)?;
        decoder.decode("parent", &mut self.parent)?;
        Ok(())
    }
}

/// Never registered anywhere
#[derive(Default)]
pub(crate) struct Stranger;

impl Codable for Stranger {
    fn class_name(&self) -> &str {
        "Stranger"
    }

    fn encode(&self, _encoder: &mut dyn Encoder) -> CodecResult<()> {
        Ok(())
    }

    fn decode(&mut self, _decoder: &mut dyn Decoder) -> CodecResult<()> {
        Ok(())
    }
}

pub(crate) fn node(name: &str) -> EntityRef {
    EntityRef::new(Node {
        name: name.to_string(),
        ..Node::default()
    })
}

pub(crate) fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_type::<Node>();
    registry
}

pub(crate) fn with_node<R>(entity: &EntityRef, f: impl FnOnce(&mut Node) -> R) -> R {
    let node = entity.downcast::<Node>().expect("entity is not a Node");
    let mut node = node.borrow_mut();
    f(&mut node)
}
