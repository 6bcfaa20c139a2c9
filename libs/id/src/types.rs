//! The event identifier type.
//!
//! IDs are ULID-based for sortability and uniqueness.

use chrono::{DateTime, Utc};

use crate::{IdError, Ulid};

/// Identifier assigned to an event when it is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(Ulid);

impl EventId {
    /// Length of the textual form in bytes.
    pub const TEXT_LEN: usize = 26;

    /// Creates an ID from a raw ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn ulid(&self) -> Ulid {
        self.0
    }

    /// Returns the timestamp portion of the ULID in milliseconds.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }

    /// Returns the instant encoded in the leading 48 bits.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.0.datetime())
    }

    /// Parses an ID from its 26-character Crockford base32 form.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let ulid = s
            .parse::<Ulid>()
            .map_err(|e| IdError::InvalidUlid(e.to_string()))?;

        Ok(Self(ulid))
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EventId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u128> for EventId {
    fn from(value: u128) -> Self {
        Self(Ulid::from(value))
    }
}

impl From<EventId> for u128 {
    fn from(id: EventId) -> Self {
        u128::from(id.0)
    }
}

impl serde::Serialize for EventId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for EventId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<Ulid> for EventId {
    fn as_ref(&self) -> &Ulid {
        &self.0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_event_id_roundtrip() {
        let id = EventId::from_ulid(Ulid::new());
        let s = id.to_string();
        assert_eq!(s.len(), EventId::TEXT_LEN);
        let parsed: EventId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_event_id_empty() {
        let result: Result<EventId, _> = "".parse();
        assert!(matches!(result.unwrap_err(), IdError::Empty));
    }

    #[test]
    fn test_event_id_invalid_ulid() {
        let result: Result<EventId, _> = "not-a-ulid".parse();
        assert!(matches!(result.unwrap_err(), IdError::InvalidUlid(_)));
    }

    #[test]
    fn test_event_id_json_roundtrip() {
        let id = EventId::from_ulid(Ulid::new());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_event_id_timestamp() {
        let id = EventId::from(u128::from(1_700_000_000_123u64) << 80);
        assert_eq!(id.timestamp_ms(), 1_700_000_000_123);
        assert_eq!(id.timestamp().timestamp_millis(), 1_700_000_000_123);
    }

    proptest! {
        #[test]
        fn prop_textual_order_matches_numeric(a: u128, b: u128) {
            let (left, right) = (EventId::from(a), EventId::from(b));
            prop_assert_eq!(a.cmp(&b), left.to_string().cmp(&right.to_string()));
            prop_assert_eq!(a.cmp(&b), left.cmp(&right));
        }
    }
}
