use serde::{Deserialize, Serialize};

/// Version string written into the header of every stream unless overridden
pub const DEFAULT_FORMAT_VERSION: &str = "1.0";

/// Bounds applied to a single encode or decode pass.
///
/// Graph walks are iterative, so these limits exist to reject hostile or runaway input
/// rather than to protect the native stack.
///
/// # Example
/// ```
/// use graphcodec_structures::CodecLimits;
///
/// let limits = CodecLimits::default().with_max_depth(32);
/// assert_eq!(limits.max_depth, 32);
/// assert_eq!(limits.max_objects, CodecLimits::DEFAULT_MAX_OBJECTS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodecLimits {
    /// Deepest owning-link chain allowed below a root (roots are depth 0)
    pub max_depth: usize,
    /// Most objects a single pass may discover or construct
    pub max_objects: usize,
    /// Longest class name, field name, or version string accepted, in bytes
    pub max_string_length: usize,
    /// Longest collection a decoder will allocate for
    pub max_collection_length: usize,
}

impl CodecLimits {
    pub const DEFAULT_MAX_DEPTH: usize = 4096;

    pub const DEFAULT_MAX_OBJECTS: usize = 1 << 24;

    pub const DEFAULT_MAX_STRING_LENGTH: usize = 4096;

    pub const DEFAULT_MAX_COLLECTION_LENGTH: usize = 1 << 20;

    /// Limits that never trigger
    pub const fn unbounded() -> Self {
        Self {
            max_depth: usize::MAX,
            max_objects: usize::MAX,
            max_string_length: usize::MAX,
            max_collection_length: usize::MAX,
        }
    }

    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub const fn with_max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }

    pub const fn with_max_string_length(mut self, max_string_length: usize) -> Self {
        self.max_string_length = max_string_length;
        self
    }

    pub const fn with_max_collection_length(mut self, max_collection_length: usize) -> Self {
        self.max_collection_length = max_collection_length;
        self
    }
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_objects: Self::DEFAULT_MAX_OBJECTS,
            max_string_length: Self::DEFAULT_MAX_STRING_LENGTH,
            max_collection_length: Self::DEFAULT_MAX_COLLECTION_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_change_one_limit() {
        let limits = CodecLimits::default().with_max_collection_length(64);
        assert_eq!(limits.max_collection_length, 64);
        assert_eq!(limits.max_objects, CodecLimits::DEFAULT_MAX_OBJECTS);
        assert!(limits.max_collection_length < CodecLimits::unbounded().max_collection_length);
    }

    #[test]
    fn test_limits_serialize_by_field_name() {
        let limits = CodecLimits::default().with_max_depth(8);
        let json = serde_json::to_value(limits).unwrap();
        assert_eq!(json["max_depth"], 8);
        assert_eq!(
            json["max_collection_length"],
            CodecLimits::DEFAULT_MAX_COLLECTION_LENGTH
        );

        let restored: CodecLimits = serde_json::from_value(json).unwrap();
        assert_eq!(restored, limits);
    }
}
