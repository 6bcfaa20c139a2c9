//! Error types for ID parsing and generation.

use thiserror::Error;

/// Errors that can occur when parsing or generating IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The ID string is empty.
    #[error("ID cannot be empty")]
    Empty,

    /// The ULID text is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),

    /// The monotonic entropy for a single millisecond is exhausted.
    #[error("ID entropy exhausted within millisecond {timestamp_ms}")]
    Overflow { timestamp_ms: u64 },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }

    /// Returns true if this error came from ID generation rather than parsing.
    pub fn is_generation_error(&self) -> bool {
        matches!(self, IdError::Overflow { .. })
    }
}
