use thiserror::Error;

/// Result type used by the reader, the writer, codecs and the engine.
pub type Result<T> = core::result::Result<T, CodecError>;

/// A malformed field declaration, found while compiling the schema of a compound type.
///
/// Schema errors are deterministic: compiling the same type again reports the same error, so
/// callers should treat them as permanent for that type.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("invalid schema for `{type_name}`, field `{field}`: {rule}")]
pub struct SchemaError {
    /// The compound type whose schema failed to compile.
    pub type_name: &'static str,
    /// The field that violates the rule.
    pub field: &'static str,
    /// The rule that was violated.
    pub rule: SchemaRule,
}

/// The schema rules checked when a schema is compiled.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum SchemaRule {
    /// A collection declares both a fixed entry count and a length prefix.
    #[error("collection declares both a fixed entry count and a length prefix")]
    ConflictingLength,
    /// A collection declares neither a fixed entry count nor a length prefix.
    #[error("collection declares neither a fixed entry count nor a length prefix")]
    MissingLength,
    /// A collection declares a fixed entry count of zero.
    #[error("fixed entry count must be greater than zero")]
    ZeroEntries,
    /// A scalar field declares an entry count or a length prefix.
    #[error("scalar field cannot declare an entry count or a length prefix")]
    LengthOnScalar,
    /// Two fields share the same name.
    #[error("field name is declared more than once")]
    DuplicateField,
}

/// Errors reported by `create`, `populate` and `write`.
///
/// Every error aborts the call that reported it. Nothing is retried internally.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CodecError {
    /// The schema of a compound type is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// No registered codec, nested schema or primitive codec exists for a type.
    #[error("no codec is registered or derivable for `{type_name}`")]
    CodecNotFound {
        /// The logical type that could not be resolved.
        type_name: &'static str,
    },

    /// A value could not be converted between its wire type and its logical type.
    #[error("cannot convert field `{field}` from `{from}` to `{to}`: {reason}")]
    Coercion {
        /// The field being converted.
        field: &'static str,
        /// Source type.
        from: &'static str,
        /// Destination type.
        to: &'static str,
        /// Why the conversion failed.
        reason: String,
    },

    /// A value cannot be represented in its declared wire form.
    #[error("cannot serialize field `{field}`: {reason}")]
    Serialization {
        /// The field being written.
        field: &'static str,
        /// What made the value unrepresentable.
        reason: SerializationFault,
    },

    /// The stream ended in the middle of a value.
    #[error("stream truncated at offset {position}: needed {needed} bytes, {remaining} remaining")]
    TruncatedStream {
        /// Offset of the read that failed.
        position: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes that were left.
        remaining: usize,
    },

    /// The stream contains bytes that do not decode to a valid value.
    #[error("malformed data at offset {position}: {reason}")]
    Malformed {
        /// Offset at which the bad value begins.
        position: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Reasons a value cannot be written.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SerializationFault {
    /// A fixed-count collection holds a different number of elements than declared.
    #[error("collection has {actual} entries, but exactly {declared} are declared")]
    EntriesMismatch {
        /// Declared entry count.
        declared: usize,
        /// Actual number of elements.
        actual: usize,
    },
    /// A length does not fit in its length prefix.
    #[error("length {len} does not fit in a {prefix} length prefix")]
    LengthOverflow {
        /// The length to be written.
        len: usize,
        /// Name of the prefix width.
        prefix: &'static str,
    },
    /// A null-terminated string contains the terminator.
    #[error("null-terminated string contains an embedded terminator at byte {offset}")]
    EmbeddedTerminator {
        /// Byte offset of the terminator within the encoded payload.
        offset: usize,
    },
    /// A string contains characters its declared encoding cannot represent.
    #[error("character {ch:?} cannot be encoded as {encoding}")]
    Unencodable {
        /// The offending character.
        ch: char,
        /// Name of the declared encoding.
        encoding: &'static str,
    },
}

impl CodecError {
    /// Builds a `Serialization` error for a field.
    pub fn serialization(field: &'static str, reason: SerializationFault) -> Self {
        Self::Serialization { field, reason }
    }

    /// Returns `true` if the stream ran out of data.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::TruncatedStream { .. })
    }

    /// Attaches a field name to a serialization error raised below the field layer.
    pub(crate) fn in_field(self, name: &'static str) -> Self {
        match self {
            Self::Serialization { field: "", reason } => Self::Serialization { field: name, reason },
            Self::Coercion {
                field: "",
                from,
                to,
                reason,
            } => Self::Coercion {
                field: name,
                from,
                to,
                reason,
            },
            other => other,
        }
    }
}
