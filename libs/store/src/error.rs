//! Event store error types.

use evstore_events::CodecError;
use evstore_id::IdError;
use thiserror::Error;

/// Event store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open the storage engine.
    #[error("{operation} failed for {scope}: cannot open event store at {location}: {source}")]
    Open {
        operation: &'static str,
        scope: String,
        location: String,
        #[source]
        source: redb::Error,
    },

    /// The store was closed.
    #[error("{operation} failed for {scope}: event store is closed")]
    Closed {
        operation: &'static str,
        scope: String,
    },

    /// The aggregate name cannot be used as a key prefix.
    #[error("invalid aggregate name '{aggregate}': {reason}")]
    InvalidAggregate {
        aggregate: String,
        reason: &'static str,
    },

    /// A payload type could not be added to the registry.
    #[error("failed to register payload type: {0}")]
    Registration(#[source] CodecError),

    /// Append was called with a payload type that was never registered.
    #[error("cannot append to aggregate '{aggregate}': payload type '{type_tag}' is not registered")]
    UnregisteredType { aggregate: String, type_tag: String },

    /// No event ID could be generated.
    #[error("{operation} failed for aggregate '{aggregate}': cannot generate event id: {source}")]
    IdGeneration {
        operation: &'static str,
        aggregate: String,
        #[source]
        source: IdError,
    },

    /// A storage transaction failed.
    #[error("{operation} failed for {scope}: {source}")]
    Storage {
        operation: &'static str,
        scope: String,
        #[source]
        source: redb::Error,
    },

    /// A record could not be encoded or decoded.
    #[error("{operation} failed for aggregate '{aggregate}' at key '{key}': {source}")]
    Codec {
        operation: &'static str,
        aggregate: String,
        key: String,
        #[source]
        source: CodecError,
    },
}

impl StoreError {
    pub(crate) fn storage(operation: &'static str, scope: String, source: impl Into<redb::Error>) -> Self {
        StoreError::Storage {
            operation,
            scope,
            source: source.into(),
        }
    }

    /// Returns true if the failure is a payload type missing from the registry.
    pub fn is_unregistered(&self) -> bool {
        match self {
            StoreError::UnregisteredType { .. } => true,
            StoreError::Codec { source, .. } => source.is_unregistered(),
            _ => false,
        }
    }

    /// Returns true if the store was closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, StoreError::Closed { .. })
    }
}
