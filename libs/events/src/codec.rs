//! Record codec.
//!
//! Encoding writes the envelope as JSON. Decoding runs in two phases: the
//! envelope is parsed without knowing the payload type, then the type tag is
//! resolved through the [`TypeRegistry`] and the payload decoded into the
//! registered type.

use crate::{CodecError, EventRecord, Payload, StoredEvent, TypeRegistry};

/// Serializes a record envelope to bytes.
pub fn encode(record: &EventRecord) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(record).map_err(CodecError::EnvelopeEncode)
}

/// Parses the envelope only; the payload stays opaque.
pub fn decode_envelope(bytes: &[u8]) -> Result<EventRecord, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Envelope)
}

/// Decodes the envelope and reconstructs the payload via the registry.
pub fn decode(bytes: &[u8], registry: &TypeRegistry) -> Result<StoredEvent, CodecError> {
    let record = decode_envelope(bytes)?;
    let payload = registry.decode(&record.type_tag, &record.content)?;

    Ok(StoredEvent {
        id: record.id,
        timestamp: record.timestamp,
        type_tag: record.type_tag,
        payload,
    })
}

/// Decodes a record whose payload must be a `T`.
///
/// The tag still has to be registered; a record of any other registered
/// type fails with `CodecError::TypeMismatch`.
pub fn decode_as<T: Payload>(bytes: &[u8], registry: &TypeRegistry) -> Result<T, CodecError> {
    let event = decode(bytes, registry)?;
    let actual = event.type_tag;
    event
        .payload
        .downcast::<T>()
        .ok_or_else(|| CodecError::TypeMismatch {
            expected: T::type_tag().to_string(),
            actual,
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};
    use evstore_id::EventId;
    use rstest::rstest;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Test {
        value: i64,
    }

    impl Payload for Test {}

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Channel {
        Email { address: String },
        Sms(String),
        Disabled,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ProfileUpdated {
        name: String,
        tags: Vec<String>,
        channel: Channel,
        limits: BTreeMap<String, u32>,
        nickname: Option<String>,
        nested: Test,
    }

    impl Payload for ProfileUpdated {
        fn type_tag() -> &'static str {
            "profile.updated"
        }
    }

    fn record<T: Payload>(payload: &T) -> EventRecord {
        let timestamp = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let id = EventId::from(u128::from(1_700_000_000_000u64) << 80 | 42);
        EventRecord::new(id, timestamp, payload).unwrap()
    }

    #[test]
    fn test_roundtrip_simple_payload() {
        let registry = TypeRegistry::new();
        registry.register::<Test>().unwrap();

        let original = record(&Test { value: 1 });
        let bytes = encode(&original).unwrap();

        let event = decode(&bytes, &registry).unwrap();
        assert_eq!(event.id, original.id);
        assert_eq!(event.timestamp, original.timestamp);
        assert_eq!(event.type_tag, Test::type_tag());
        assert_eq!(event.payload_as::<Test>(), Some(&Test { value: 1 }));
    }

    #[test]
    fn test_roundtrip_composite_payload() {
        let registry = TypeRegistry::new();
        registry.register::<ProfileUpdated>().unwrap();

        let payload = ProfileUpdated {
            name: "Grace".into(),
            tags: vec!["admin".into(), "ops".into()],
            channel: Channel::Email {
                address: "grace@example.com".into(),
            },
            limits: BTreeMap::from([("daily".to_string(), 10), ("hourly".to_string(), 2)]),
            nickname: None,
            nested: Test { value: -5 },
        };
        let bytes = encode(&record(&payload)).unwrap();

        let decoded: ProfileUpdated = decode_as(&bytes, &registry).unwrap();
        assert_eq!(decoded, payload);

        for channel in [Channel::Sms("+15550100".into()), Channel::Disabled] {
            let payload = ProfileUpdated {
                channel,
                ..payload.clone()
            };
            let bytes = encode(&record(&payload)).unwrap();
            assert_eq!(decode_as::<ProfileUpdated>(&bytes, &registry).unwrap(), payload);
        }
    }

    #[test]
    fn test_envelope_shape() {
        let bytes = encode(&record(&Test { value: 1 })).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["id"], "01HF7YAT00000000000000001A");
        assert_eq!(json["type"], Test::type_tag());
        assert!(json["timestamp"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
        assert!(json["content"].is_string());
    }

    #[test]
    fn test_envelope_readable_without_registry() {
        let bytes = encode(&record(&Test { value: 3 })).unwrap();
        let envelope = decode_envelope(&bytes).unwrap();
        assert_eq!(envelope.type_tag, Test::type_tag());
        assert_eq!(Test::decode(&envelope.content).unwrap(), Test { value: 3 });
    }

    #[test]
    fn test_unknown_envelope_fields_are_ignored() {
        let bytes = encode(&record(&Test { value: 9 })).unwrap();
        let mut json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["schema"] = serde_json::json!(2);
        json["trace"] = serde_json::json!({ "span": "abc" });
        let bytes = serde_json::to_vec(&json).unwrap();

        let registry = TypeRegistry::new();
        registry.register::<Test>().unwrap();
        assert_eq!(decode_as::<Test>(&bytes, &registry).unwrap(), Test { value: 9 });
    }

    #[test]
    fn test_unregistered_tag_fails() {
        let bytes = encode(&record(&Test { value: 1 })).unwrap();
        let err = decode(&bytes, &TypeRegistry::new()).unwrap_err();
        assert!(err.is_unregistered());
    }

    #[test]
    fn test_type_mismatch() {
        let registry = TypeRegistry::new();
        registry.register::<Test>().unwrap();
        let bytes = encode(&record(&Test { value: 1 })).unwrap();

        let err = decode_as::<ProfileUpdated>(&bytes, &registry).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[rstest]
    #[case::empty(b"".as_slice())]
    #[case::not_json(b"\x00\x01garbage".as_slice())]
    #[case::missing_fields(br#"{"id":"01HF7YAT00000000000000001A"}"#.as_slice())]
    #[case::bad_id(br#"{"id":"nope","timestamp":"2023-11-14T22:13:20Z","type":"t","content":""}"#.as_slice())]
    #[case::bad_base64(br#"{"id":"01HF7YAT00000000000000001A","timestamp":"2023-11-14T22:13:20Z","type":"t","content":"!!"}"#.as_slice())]
    fn test_malformed_envelope(#[case] bytes: &[u8]) {
        let registry = TypeRegistry::new();
        let err = decode(bytes, &registry).unwrap_err();
        assert!(matches!(err, CodecError::Envelope(_)), "unexpected error: {err}");
    }

    #[test]
    fn test_corrupt_payload_fails() {
        let registry = TypeRegistry::new();
        registry.register::<Test>().unwrap();

        let mut original = record(&Test { value: 1 });
        original.content = vec![0xc1];
        let bytes = encode(&original).unwrap();

        let err = decode(&bytes, &registry).unwrap_err();
        assert!(matches!(err, CodecError::PayloadDecode { .. }));
    }
}
