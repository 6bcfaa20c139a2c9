//! Event record envelope - the stored wrapper around every payload.

use chrono::{DateTime, Utc};
use evstore_id::EventId;
use serde::{Deserialize, Serialize};

use crate::{AnyEvent, CodecError, Payload};

/// The stored envelope: identity, time, type tag and opaque payload bytes.
///
/// Records are immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Identifier assigned at append time.
    pub id: EventId,

    /// When the event was appended.
    pub timestamp: DateTime<Utc>,

    /// Tag of the payload type, used to pick a decoder.
    #[serde(rename = "type")]
    pub type_tag: String,

    /// Encoded payload.
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

impl EventRecord {
    /// Builds a record by encoding `payload`.
    pub fn new<T: Payload>(
        id: EventId,
        timestamp: DateTime<Utc>,
        payload: &T,
    ) -> Result<Self, CodecError> {
        Ok(Self {
            id,
            timestamp,
            type_tag: T::type_tag().to_string(),
            content: payload.encode()?,
        })
    }
}

/// A decoded event: envelope metadata plus the reconstructed payload.
#[derive(Debug)]
pub struct StoredEvent {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub type_tag: String,
    pub payload: Box<dyn AnyEvent>,
}

impl StoredEvent {
    /// Borrows the payload as a `T`, if it is one.
    pub fn payload_as<T: Payload>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Takes the payload out of the event.
    pub fn into_payload(self) -> Box<dyn AnyEvent> {
        self.payload
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
