//! Codec passes driven by a loaded configuration file

use std::fs;

use graphcodec::config::{load_config, validate_config, CodecConfig};
use graphcodec::observability::{build_filter, CrateDebugFlags, LogFormat, LoggingConfig};
use graphcodec::prelude::*;
use graphcodec::serialization::inspect;

#[derive(Default)]
struct Chain {
    label: String,
    next: Option<EntityRef>,
}

impl Codable for Chain {
    fn class_name(&self) -> &str {
        "Chain"
    }

    fn encode(&self, encoder: &mut dyn Encoder) -> CodecResult<()> {
        encoder.encode("label", &self.label)?;
        encoder.encode("next", &self.next)?;
        Ok(())
    }

    fn decode(&mut self, decoder: &mut dyn Decoder) -> CodecResult<()> {
        decoder.decode("label", &mut self.label)?;
        decoder.decode("next", &mut self.next)?;
        Ok(())
    }
}

fn chain_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_type::<Chain>();
    registry
}

/// head -> ... -> tail, `length` links long
fn chain(length: usize) -> EntityRef {
    let mut next = None;
    for index in (0..length).rev() {
        next = Some(EntityRef::new(Chain {
            label: format!("link-{}", index),
            next,
        }));
    }
    next.expect("chain length must be positive")
}

fn write_config(contents: &str) -> (tempfile::TempDir, CodecConfig) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graphcodec.toml");
    fs::write(&path, contents).unwrap();
    let config = load_config(Some(path.as_path()), None).unwrap();
    validate_config(&config).unwrap();
    (dir, config)
}

#[test]
fn test_configured_version_reaches_the_stream() {
    let (_dir, config) = write_config(
        r#"
[format]
version = "2.3"
"#,
    );
    let registry = chain_registry();

    let mut encoder = BinaryEncoder::new(&registry)
        .with_version(config.format.version.clone())
        .with_limits(config.codec_limits());
    assert!(encoder.encode(&chain(3)).unwrap());
    let bytes = encoder.get_bytes();

    let summary = inspect(&bytes).unwrap();
    assert_eq!(summary.version, "2.3");
    assert_eq!(summary.roots().len(), 1);

    let mut decoder = BinaryDecoder::new(&registry).with_limits(config.codec_limits());
    decoder.from_bytes(&bytes).unwrap();
    assert_eq!(decoder.version(), Some("2.3"));

    let head = decoder.get_object_at::<Chain>(0).unwrap();
    let mut labels = vec![head.borrow().label.clone()];
    let mut next = head.borrow().next.clone();
    while let Some(entity) = next {
        let link = entity.downcast::<Chain>().unwrap();
        labels.push(link.borrow().label.clone());
        next = link.borrow().next.clone();
    }
    assert_eq!(labels, vec!["link-0", "link-1", "link-2"]);
}

#[test]
fn test_configured_depth_limit_bounds_both_directions() {
    let (_dir, config) = write_config(
        r#"
[limits]
max_depth = 1
"#,
    );
    let registry = chain_registry();

    let mut encoder = BinaryEncoder::new(&registry).with_limits(config.codec_limits());
    assert!(matches!(
        encoder.encode(&chain(3)),
        Err(CodecError::DepthLimitExceeded(1))
    ));
    assert_eq!(encoder.object_count(), 0);
    assert!(encoder.encode(&chain(2)).unwrap());

    // a stream written without that bound is refused when read back under it
    let mut unbounded = BinaryEncoder::new(&registry);
    unbounded.encode(&chain(3)).unwrap();
    let bytes = unbounded.get_bytes();

    let mut decoder = BinaryDecoder::new(&registry).with_limits(config.codec_limits());
    assert!(decoder.from_bytes(&bytes).is_err());
    assert_eq!(decoder.get_object_count(), 0);
}

#[test]
fn test_configured_object_limit_rejects_large_streams() {
    let registry = chain_registry();
    let mut encoder = BinaryEncoder::new(&registry);
    encoder.encode(&chain(4)).unwrap();
    let bytes = encoder.get_bytes();
    // every link carries its label in a value wrapper
    assert_eq!(inspect(&bytes).unwrap().object_count(), 8);

    let (_dir, config) = write_config(
        r#"
[limits]
max_objects = 5
"#,
    );
    let mut decoder = BinaryDecoder::new(&registry).with_limits(config.codec_limits());
    assert!(matches!(
        decoder.from_bytes(&bytes),
        Err(CodecError::ObjectLimitExceeded(5))
    ));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graphcodec.toml");
    fs::write(
        &path,
        r#"
[limits]
max_objects = 0

[logging]
format = "xml"
"#,
    )
    .unwrap();

    let config = load_config(Some(path.as_path()), None).unwrap();
    let message = validate_config(&config).unwrap_err().to_string();
    assert!(message.contains("max_objects"));
    assert!(message.contains("format"));
}

#[test]
fn test_logging_settings_from_config() {
    let (_dir, config) = write_config(
        r#"
[logging]
level = "warn"
format = "json"
"#,
    );
    let logging = LoggingConfig {
        level: config.logging.level.clone(),
        format: config.logging.format.parse::<LogFormat>().unwrap(),
        ..LoggingConfig::default()
    };
    assert_eq!(logging.format, LogFormat::Json);

    let flags = CrateDebugFlags::from_args(vec!["--debug-graphcodec-serialization".to_string()]);
    assert_eq!(
        build_filter(&flags, &logging),
        "graphcodec_serialization=debug,warn"
    );
}
