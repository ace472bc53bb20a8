use thiserror::Error;

/// Common error type for graph encoding and decoding.
///
/// Encoding failures that only affect a single field (an unregistered class, a missing
/// entity) are not errors; they are reported as `Ok(false)` by the field-level calls. The
/// variants here abort a whole pass.
///
/// # Examples
/// ```
/// use graphcodec_structures::{CodecError, CodecResult};
///
/// fn require_class(known: bool, class_name: &str) -> CodecResult<()> {
///     if !known {
///         return Err(CodecError::UnknownType(class_name.into()));
///     }
///     Ok(())
/// }
///
/// assert!(require_class(false, "SceneNode").is_err());
/// assert!(require_class(true, "SceneNode").is_ok());
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// A stream names a class that has no factory in the type registry
    #[error("Unknown class '{0}': no factory is registered under this name")]
    UnknownType(String),

    /// A valid marker appeared where a different one was required
    #[error("Expected {expected} marker at byte {position}, found 0x{found:02X}")]
    UnexpectedMarker {
        expected: &'static str,
        found: u8,
        position: usize,
    },

    /// A byte at a marker position is not any known marker
    #[error("Byte 0x{found:02X} at position {position} is not a record marker")]
    InvalidMarker { found: u8, position: usize },

    /// The buffer ended in the middle of a record
    #[error("Stream truncated: needed {needed} bytes at position {position} but only {available} remain")]
    Truncated {
        needed: usize,
        position: usize,
        available: usize,
    },

    /// A length-prefixed string is malformed
    #[error("Malformed string at position {position}: {reason}")]
    MalformedString { position: usize, reason: String },

    /// Bytes remain after the end-of-stream marker
    #[error("{0} unexpected bytes follow the end marker")]
    TrailingBytes(usize),

    /// A link or root record names an identity missing from the object table
    #[error("{kind} record references identity {identity} which is not in the object table")]
    DanglingReference { kind: &'static str, identity: u64 },

    /// The same identity was used by two object records
    #[error("Object identity {0} appears more than once in the object section")]
    DuplicateObject(u64),

    /// A value payload does not have the size its type requires
    #[error("Payload for {type_name} must be {expected} bytes, found {found}")]
    PayloadSize {
        type_name: &'static str,
        expected: usize,
        found: usize,
    },

    /// A value payload has the right size but invalid contents
    #[error("Invalid payload for {type_name}: {reason}")]
    InvalidPayload {
        type_name: &'static str,
        reason: String,
    },

    /// A primitive field was linked to an entity that is not a value wrapper
    #[error("Field '{key}' must resolve to a value wrapper, found an entity of class '{class_name}'")]
    NotAValue { key: String, class_name: String },

    /// An entity could not be borrowed because it is already borrowed elsewhere
    #[error("Entity of class '{0}' is already borrowed and cannot be visited")]
    EntityBusy(String),

    /// The graph is deeper than the configured limit
    #[error("Graph depth exceeds the configured limit of {0}")]
    DepthLimitExceeded(usize),

    /// The graph holds more objects than the configured limit
    #[error("Object count exceeds the configured limit of {0}")]
    ObjectLimitExceeded(usize),

    /// A collection declares more elements than the decoder will allocate
    #[error("Collection '{key}' declares {declared} elements, above the limit of {limit}")]
    CollectionLimitExceeded {
        key: String,
        declared: u64,
        limit: usize,
    },
}

impl CodecError {
    /// True for errors caused by the byte layout of a stream rather than by its contents.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            CodecError::UnexpectedMarker { .. }
                | CodecError::InvalidMarker { .. }
                | CodecError::Truncated { .. }
                | CodecError::MalformedString { .. }
                | CodecError::TrailingBytes(_)
        )
    }

    /// True for errors caused by a record pointing at an object that is not there.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            CodecError::DanglingReference { .. } | CodecError::DuplicateObject(_)
        )
    }
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let truncated = CodecError::Truncated {
            needed: 8,
            position: 3,
            available: 2,
        };
        assert!(truncated.is_format_error());
        assert!(!truncated.is_reference_error());

        let dangling = CodecError::DanglingReference {
            kind: "link",
            identity: 7,
        };
        assert!(dangling.is_reference_error());
        assert!(!dangling.is_format_error());

        assert!(!CodecError::UnknownType("Node".into()).is_format_error());
    }

    #[test]
    fn test_marker_message_uses_hex() {
        let error = CodecError::InvalidMarker {
            found: 0x7f,
            position: 12,
        };
        assert_eq!(
            error.to_string(),
            "Byte 0x7F at position 12 is not a record marker"
        );
    }
}
