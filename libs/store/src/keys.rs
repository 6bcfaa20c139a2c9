//! Storage key encoding.
//!
//! Keys are `<aggregate>:<event id>`. Aggregate names may not contain the
//! separator, and event ids have a fixed-width textual form that sorts like
//! the ids themselves, so:
//!
//! - all keys of one aggregate are contiguous and start with `<aggregate>:`
//! - no aggregate's prefix matches another aggregate's keys (`order` vs `order-2`)
//! - within an aggregate, key order is id order, which is append order

use evstore_id::EventId;

use crate::StoreError;

/// Byte separating the aggregate name from the event id.
pub const SEPARATOR: u8 = b':';

/// Checks that `aggregate` can be used as a key prefix.
pub fn validate_aggregate(aggregate: &str) -> Result<(), StoreError> {
    let reason = if aggregate.is_empty() {
        "name cannot be empty"
    } else if aggregate.as_bytes().contains(&SEPARATOR) {
        "name cannot contain ':'"
    } else {
        return Ok(());
    };

    Err(StoreError::InvalidAggregate {
        aggregate: aggregate.to_string(),
        reason,
    })
}

/// The scan prefix shared by every key of `aggregate`.
pub fn aggregate_prefix(aggregate: &str) -> Result<Vec<u8>, StoreError> {
    validate_aggregate(aggregate)?;

    let mut prefix = Vec::with_capacity(aggregate.len() + 1);
    prefix.extend_from_slice(aggregate.as_bytes());
    prefix.push(SEPARATOR);
    Ok(prefix)
}

/// Builds the storage key for event `id` of `aggregate`.
pub fn encode_key(aggregate: &str, id: EventId) -> Result<Vec<u8>, StoreError> {
    Ok(key_with_prefix(&aggregate_prefix(aggregate)?, id))
}

/// Builds a key from a prefix already returned by [`aggregate_prefix`].
pub fn key_with_prefix(prefix: &[u8], id: EventId) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + EventId::TEXT_LEN);
    key.extend_from_slice(prefix);
    key.extend_from_slice(id.to_string().as_bytes());
    key
}

/// Returns true if `key` belongs to `aggregate`.
pub fn has_prefix(key: &[u8], aggregate: &str) -> bool {
    key.strip_prefix(aggregate.as_bytes())
        .is_some_and(|rest| rest.first() == Some(&SEPARATOR))
}

/// Splits a storage key into its aggregate and event id.
pub fn decode_key(key: &[u8]) -> Option<(&str, EventId)> {
    let text = std::str::from_utf8(key).ok()?;
    let (aggregate, id) = text.split_once(SEPARATOR as char)?;
    if aggregate.is_empty() {
        return None;
    }
    let id = EventId::parse(id).ok()?;
    Some((aggregate, id))
}
