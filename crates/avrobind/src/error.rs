//! Error types for decoding, encoding, schema construction and block codecs.

use thiserror::Error;

/// Error classes as laid out in the error taxonomy.
///
/// Every class is unrecoverable for the call that produced it; the class
/// tells the caller whether the input, the schema/destination pairing, or
/// the container block is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed varint, length, boolean, UTF-8, or a limit was exceeded.
    Primitive,
    /// A logical type transform failed.
    LogicalType,
    /// The destination cannot hold what the schema describes.
    Binding,
    /// A container block failed to decompress or verify.
    Codec,
}

impl ErrorClass {
    /// Returns a short lowercase label (e.g., "binding").
    pub fn label(&self) -> &'static str {
        match self {
            ErrorClass::Primitive => "primitive",
            ErrorClass::LogicalType => "logical-type",
            ErrorClass::Binding => "binding",
            ErrorClass::Codec => "codec",
        }
    }
}

/// Error during binary decoding or block decompression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === Primitive ===
    #[error("malformed varint while reading {context}")]
    MalformedVarint { context: &'static str },

    #[error("unexpected end of input while reading {context}")]
    TruncatedInput { context: &'static str },

    #[error("malformed length {len} for {context} ({remaining} bytes remaining)")]
    MalformedLength {
        context: &'static str,
        len: i64,
        remaining: usize,
    },

    #[error("invalid boolean byte {value:#04x} (expected 0x00 or 0x01)")]
    MalformedBoolean { value: u8 },

    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    #[error("{context} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        context: &'static str,
        len: usize,
        max: usize,
    },

    #[error("nesting depth exceeds maximum {max}")]
    DepthExceedsLimit { max: usize },

    // === Logical type ===
    #[error("logical type {tag:?} conversion failed: {reason}")]
    LogicalTypeConversion { tag: String, reason: String },

    // === Binding ===
    #[error("map destination with {key_kind} keys cannot hold record field names")]
    IncompatibleMapKey { key_kind: &'static str },

    #[error("type mismatch: destination expects {expected}, schema provides {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("polymorphic destination holds no concrete value to decode into")]
    UnresolvedPolymorphicTarget,

    // === Codec ===
    #[error("block checksum mismatch: expected {expected:#010x}, computed {actual:?}")]
    ChecksumMismatch { expected: u32, actual: Option<u32> },

    #[error("block of {len} bytes is too short to carry a checksum")]
    TruncatedBlock { len: usize },

    #[error("unknown codec {name:?}")]
    UnknownCodec { name: String },

    #[error("{codec} decompression failed: {reason}")]
    DecompressionFailed { codec: &'static str, reason: String },

    // === Context ===
    #[error("at {path}: {source}")]
    InField {
        path: String,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Returns the error class for this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            DecodeError::LogicalTypeConversion { .. } => ErrorClass::LogicalType,
            DecodeError::IncompatibleMapKey { .. }
            | DecodeError::TypeMismatch { .. }
            | DecodeError::UnresolvedPolymorphicTarget => ErrorClass::Binding,
            DecodeError::ChecksumMismatch { .. }
            | DecodeError::TruncatedBlock { .. }
            | DecodeError::UnknownCodec { .. }
            | DecodeError::DecompressionFailed { .. } => ErrorClass::Codec,
            DecodeError::InField { source, .. } => source.class(),
            _ => ErrorClass::Primitive,
        }
    }

    /// Returns the underlying error, stripping field-path context.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::InField { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns the field path the error occurred at, if known.
    pub fn path(&self) -> Option<&str> {
        match self {
            DecodeError::InField { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Error during binary encoding or block compression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("type mismatch at {path:?}: schema expects {expected}, value is {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("record {record:?} field {field:?} has no value")]
    MissingField { record: String, field: String },

    #[error("logical type {tag:?} cannot encode {found}")]
    LogicalTypeConversion { tag: String, found: &'static str },

    #[error("{codec} compression failed: {reason}")]
    CompressionFailed { codec: &'static str, reason: String },
}

/// Error while building a [`Schema`](crate::schema::Schema).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("reference to undeclared record {name:?}")]
    UnresolvedReference { name: String },

    #[error("record {name:?} is declared more than once")]
    DuplicateRecord { name: String },

    #[error("record {record:?} declares {name:?} more than once (as a field name or alias)")]
    DuplicateField { record: String, name: String },

    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },

    #[error("logical type {tag:?} must wrap a primitive or record, not a map")]
    InvalidLogicalBase { tag: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_follows_source() {
        let err = DecodeError::InField {
            path: "a.b".to_string(),
            source: Box::new(DecodeError::UnresolvedPolymorphicTarget),
        };
        assert_eq!(err.class(), ErrorClass::Binding);
        assert_eq!(err.path(), Some("a.b"));
        assert_eq!(err.root_cause(), &DecodeError::UnresolvedPolymorphicTarget);
    }

    #[test]
    fn test_classes() {
        assert_eq!(
            DecodeError::MalformedBoolean { value: 2 }.class(),
            ErrorClass::Primitive
        );
        assert_eq!(
            DecodeError::TruncatedBlock { len: 3 }.class(),
            ErrorClass::Codec
        );
        assert_eq!(
            DecodeError::LogicalTypeConversion {
                tag: "date".to_string(),
                reason: "overflow".to_string(),
            }
            .class(),
            ErrorClass::LogicalType
        );
        assert_eq!(ErrorClass::Codec.label(), "codec");
    }

    #[test]
    fn test_display_includes_path() {
        let err = DecodeError::InField {
            path: "parent.child".to_string(),
            source: Box::new(DecodeError::TypeMismatch {
                expected: "string",
                found: "long",
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("parent.child"));
        assert!(msg.contains("string"));
        assert!(msg.contains("long"));
    }
}
