//! Error types for payload and record serialization.

use thiserror::Error;

/// Boxed error produced by a payload's own encoder or decoder.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when encoding or decoding event records.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The envelope could not be serialized.
    #[error("failed to encode envelope: {0}")]
    EnvelopeEncode(#[source] serde_json::Error),

    /// The stored bytes are not a valid envelope.
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The payload could not be serialized.
    #[error("failed to encode payload of type '{type_tag}': {source}")]
    PayloadEncode {
        type_tag: String,
        #[source]
        source: BoxError,
    },

    /// The payload bytes do not decode as the registered type.
    #[error("failed to decode payload of type '{type_tag}': {source}")]
    PayloadDecode {
        type_tag: String,
        #[source]
        source: BoxError,
    },

    /// No decoder is registered for the type tag.
    #[error("unregistered payload type: {0}")]
    UnregisteredType(String),

    /// A different type already owns the type tag.
    #[error("type tag '{type_tag}' is already registered to {existing}, cannot register {requested}")]
    TagConflict {
        type_tag: String,
        existing: &'static str,
        requested: &'static str,
    },

    /// The payload decoded to a different type than the caller asked for.
    #[error("expected payload type '{expected}', found '{actual}'")]
    TypeMismatch { expected: String, actual: String },
}

impl CodecError {
    /// Returns true if the failure is a missing registry entry.
    pub fn is_unregistered(&self) -> bool {
        matches!(self, CodecError::UnregisteredType(_))
    }
}
