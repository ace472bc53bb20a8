use crate::value_wrapper::ValueWrapper;
use crate::wire_format::{ByteReader, Marker, ObjectIndex};
use graphcodec_structures::{CodecError, CodecResult};
use std::fmt::{Display, Formatter};

/// One record of an encoded stream, as found on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRecord {
    Object {
        identity: ObjectIndex,
        class_name: String,
        /// Payload length, for value wrappers only
        payload_size: Option<usize>,
    },
    Link {
        owner: ObjectIndex,
        key: String,
        target: ObjectIndex,
    },
    Root {
        identity: ObjectIndex,
    },
}

impl Display for StreamRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamRecord::Object {
                identity,
                class_name,
                payload_size: Some(size),
            } => write!(f, "object {} {} ({} byte payload)", identity, class_name, size),
            StreamRecord::Object {
                identity,
                class_name,
                payload_size: None,
            } => write!(f, "object {} {}", identity, class_name),
            StreamRecord::Link { owner, key, target } => {
                write!(f, "link   {}.{} -> {}", owner, key, target)
            }
            StreamRecord::Root { identity } => write!(f, "root   {}", identity),
        }
    }
}

/// Record-level listing of an encoded stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamSummary {
    pub version: String,
    pub records: Vec<StreamRecord>,
    pub byte_count: usize,
}

impl StreamSummary {
    pub fn object_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| matches!(record, StreamRecord::Object { .. }))
            .count()
    }

    pub fn link_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| matches!(record, StreamRecord::Link { .. }))
            .count()
    }

    pub fn roots(&self) -> Vec<ObjectIndex> {
        self.records
            .iter()
            .filter_map(|record| match record {
                StreamRecord::Root { identity } => Some(*identity),
                _ => None,
            })
            .collect()
    }
}

impl Display for StreamSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "version {} | {} bytes | {} objects, {} links, {} roots",
            self.version,
            self.byte_count,
            self.object_count(),
            self.link_count(),
            self.roots().len()
        )?;
        for record in &self.records {
            writeln!(f, "  {}", record)?;
        }
        Ok(())
    }
}

/// Parses the record structure of `bytes` without building any entity.
///
/// No registry is involved, so whether an object record carries a payload is decided by
/// its class name being [`ValueWrapper::CLASS_NAME`]. References are not resolved either;
/// a stream that lists cleanly may still fail to decode.
///
/// # Example
/// ```
/// use graphcodec_serialization::{inspect, BinaryEncoder, EntityRef, TypeRegistry, ValueWrapper};
///
/// let registry = TypeRegistry::new();
/// let mut encoder = BinaryEncoder::new(&registry);
/// encoder.encode(&EntityRef::new(ValueWrapper::new(&1.5f64))).unwrap();
///
/// let summary = inspect(&encoder.get_bytes()).unwrap();
/// assert_eq!(summary.version, "1.0");
/// assert_eq!(summary.object_count(), 1);
/// assert_eq!(summary.roots(), vec![0]);
/// ```
pub fn inspect(bytes: &[u8]) -> CodecResult<StreamSummary> {
    let mut reader = ByteReader::new(bytes);
    reader.expect_marker(Marker::Start)?;
    reader.expect_marker(Marker::Version)?;
    let version = reader.read_string(usize::MAX)?;

    let mut records = Vec::new();
    loop {
        let position = reader.position();
        let record = match reader.read_marker()? {
            Marker::ObjectBegin => {
                let identity = reader.read_identity()?;
                let class_name = reader.read_string(usize::MAX)?;
                let payload_size = if class_name == ValueWrapper::CLASS_NAME {
                    Some(reader.read_payload()?.len())
                } else {
                    None
                };
                reader.expect_marker(Marker::ObjectEnd)?;
                StreamRecord::Object {
                    identity,
                    class_name,
                    payload_size,
                }
            }
            Marker::LinkBegin => {
                let owner = reader.read_identity()?;
                let key = reader.read_string(usize::MAX)?;
                let target = reader.read_identity()?;
                reader.expect_marker(Marker::LinkEnd)?;
                StreamRecord::Link { owner, key, target }
            }
            Marker::RootBegin => {
                let identity = reader.read_identity()?;
                reader.expect_marker(Marker::RootEnd)?;
                StreamRecord::Root { identity }
            }
            Marker::End => break,
            other => {
                return Err(CodecError::UnexpectedMarker {
                    expected: "OBJECT_BEGIN, LINK_BEGIN, ROOT_BEGIN or END",
                    found: other as u8,
                    position,
                })
            }
        };
        records.push(record);
    }

    if reader.remaining() > 0 {
        return Err(CodecError::TrailingBytes(reader.remaining()));
    }
    Ok(StreamSummary {
        version,
        records,
        byte_count: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary_encoder::BinaryEncoder;
    use crate::fixtures::{node, registry, with_node};

    #[test]
    fn test_listing_matches_encoder_tables() {
        let registry = registry();
        let root = node("root");
        with_node(&root, |n| n.child = Some(node("leaf")));

        let mut encoder = BinaryEncoder::new(&registry);
        encoder.encode(&root).unwrap();
        let summary = inspect(&encoder.get_bytes()).unwrap();

        assert_eq!(summary.object_count(), encoder.object_count());
        assert_eq!(summary.link_count(), encoder.link_count());
        assert_eq!(summary.roots().len(), 1);

        let wrappers = summary
            .records
            .iter()
            .filter(|record| {
                matches!(record, StreamRecord::Object { payload_size: Some(_), .. })
            })
            .count();
        assert_eq!(wrappers, 6);
    }

    #[test]
    fn test_display() {
        let summary = StreamSummary {
            version: "1.0".into(),
            records: vec![
                StreamRecord::Object {
                    identity: 0,
                    class_name: "Node".into(),
                    payload_size: None,
                },
                StreamRecord::Object {
                    identity: 1,
                    class_name: "ValueWrapper".into(),
                    payload_size: Some(4),
                },
                StreamRecord::Link {
                    owner: 0,
                    key: "weight".into(),
                    target: 1,
                },
                StreamRecord::Root { identity: 0 },
            ],
            byte_count: 99,
        };
        let text = summary.to_string();
        assert!(text.starts_with("version 1.0 | 99 bytes | 2 objects, 1 links, 1 roots\n"));
        assert!(text.contains("  object 1 ValueWrapper (4 byte payload)\n"));
        assert!(text.contains("  link   0.weight -> 1\n"));
        assert!(text.ends_with("  root   0\n"));
    }

    #[test]
    fn test_truncated_stream() {
        let registry = registry();
        let mut encoder = BinaryEncoder::new(&registry);
        encoder.encode(&node("root")).unwrap();
        let bytes = encoder.get_bytes();
        assert!(inspect(&bytes[..bytes.len() / 2]).is_err());
    }
}
