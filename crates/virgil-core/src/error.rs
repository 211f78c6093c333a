//! Codec error types.
//!
//! Every validation failure in the codec maps to exactly one variant here,
//! and each variant carries enough context (field name, received type,
//! allowed set) to print a diagnostic without re-inspecting the payload.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while decoding, encoding, or validating Virgil values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// A required field is absent from the JSON object.
    #[error("missing required field `{field}`")]
    MissingField {
        /// Name of the absent field.
        field: String,
    },

    /// A field is present but holds the wrong JSON type.
    #[error("field `{field}` must be {expected}, got {found}")]
    WrongType {
        /// Name of the offending field.
        field: String,
        /// JSON type the schema demands.
        expected: &'static str,
        /// JSON type actually received.
        found: &'static str,
    },

    /// A numeric value violates its range or precision constraints.
    #[error("field `{field}` out of range: {detail}")]
    OutOfRange {
        /// Name of the offending field.
        field: String,
        /// Human-readable description of the violated constraint.
        detail: String,
    },

    /// The `messageType` tag is absent, non-string, or not a known variant.
    #[error(
        "unknown messageType {found:?} (supported: {supported:?}; payload keys: {keys:?})"
    )]
    UnknownMessageType {
        /// The tag value received, if any was present.
        found: Option<String>,
        /// Top-level keys of the rejected payload, for diagnostics.
        keys: Vec<String>,
        /// The closed set of supported tags.
        supported: &'static [&'static str],
    },

    /// A message identifier string is not 12 ASCII digits.
    #[error("malformed message identifier `{text}`: {detail}")]
    MalformedId {
        /// The rejected identifier text.
        text: String,
        /// What made it malformed.
        detail: &'static str,
    },

    /// An enum value is not among its candidate set, or the set is empty.
    #[error("invalid enum value `{value}` (candidates: {candidates:?})")]
    InvalidEnum {
        /// The rejected value.
        value: String,
        /// The candidate set it was checked against.
        candidates: Vec<String>,
    },

    /// A rule spanning multiple fields was violated.
    #[error("cross-field rule violated: {detail}")]
    CrossField {
        /// Which rule failed.
        detail: &'static str,
    },

    /// A string field that must be non-empty is empty.
    #[error("`{field}` must not be empty")]
    EmptyField {
        /// Name of the empty field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = CodecError::WrongType {
            field: "channelIndex".into(),
            expected: "an unsigned integer",
            found: "a string",
        };
        let text = err.to_string();
        assert!(text.contains("channelIndex"));
        assert!(text.contains("unsigned integer"));
        assert!(text.contains("a string"));
    }

    #[test]
    fn unknown_message_type_lists_keys_and_supported() {
        let err = CodecError::UnknownMessageType {
            found: Some("bogus".into()),
            keys: vec!["messageType".into(), "messageID".into()],
            supported: &["channelLink", "endResponse"],
        };
        let text = err.to_string();
        assert!(text.contains("bogus"));
        assert!(text.contains("messageID"));
        assert!(text.contains("channelLink"));
    }
}
