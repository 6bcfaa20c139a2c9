//! Event store for append-only event log operations.
//!
//! The event store provides:
//! - Append a typed event to an aggregate
//! - Read an aggregate's events in append order
//! - List stored keys, globally or per aggregate
//!
//! ## Engine lifecycle
//!
//! The engine is opened on first use (or eagerly via [`EventStore::open`]).
//! Opening happens under a mutex, so concurrent first callers share one
//! handle. A failed open leaves the store unopened and the next call retries.
//!
//! [`EventStore::close`] is idempotent. Once closed, every other operation
//! fails with [`StoreError::Closed`]; the store never reopens itself.
//! Operations already in flight hold their own reference to the engine and
//! complete normally; the engine is released when the last of them returns.
//!
//! ## Append ordering
//!
//! The event id is drawn inside the write transaction. The engine admits one
//! writer at a time, so ids are assigned in commit order and a reader never
//! sees a later snapshot insert an event before one it has already seen.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use evstore_events::{codec, AnyEvent, CodecError, EventRecord, Payload, StoredEvent, TypeRegistry};
use evstore_id::{EventId, IdError, IdGenerator};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::{keys, StoreConfig, StoreError};

enum EngineState {
    Unopened,
    Open(Arc<Engine>),
    Closed,
}

/// What an operation was acting on, for error context.
#[derive(Clone, Copy)]
enum Scope<'a> {
    Store,
    AllKeys,
    Aggregate(&'a str),
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Store => write!(f, "event store"),
            Scope::AllKeys => write!(f, "all keys"),
            Scope::Aggregate(aggregate) => write!(f, "aggregate '{aggregate}'"),
        }
    }
}

/// Failure inside a transaction, before operation context is attached.
enum TxnError {
    Engine(redb::Error),
    Id(IdError),
    Codec { key: String, source: CodecError },
}

impl From<redb::Error> for TxnError {
    fn from(err: redb::Error) -> Self {
        TxnError::Engine(err)
    }
}

impl TxnError {
    fn into_store_error(self, operation: &'static str, aggregate: &str) -> StoreError {
        match self {
            TxnError::Engine(source) => {
                StoreError::storage(operation, Scope::Aggregate(aggregate).to_string(), source)
            }
            TxnError::Id(source) => StoreError::IdGeneration {
                operation,
                aggregate: aggregate.to_string(),
                source,
            },
            TxnError::Codec { key, source } => StoreError::Codec {
                operation,
                aggregate: aggregate.to_string(),
                key,
                source,
            },
        }
    }
}

/// Event store for managing the append-only event log.
pub struct EventStore {
    config: StoreConfig,
    registry: TypeRegistry,
    ids: IdGenerator,
    state: Mutex<EngineState>,
}

impl EventStore {
    /// Create a new event store; the engine is opened on first use.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            registry: TypeRegistry::new(),
            ids: IdGenerator::new(),
            state: Mutex::new(EngineState::Unopened),
        }
    }

    /// Create an event store and open its engine immediately.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let store = Self::new(config);
        store.engine("open", Scope::Store)?;
        Ok(store)
    }

    /// A memory-only store.
    pub fn in_memory() -> Self {
        Self::new(StoreConfig::in_memory())
    }

    /// A store persisted in the database file at `path`.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::new(StoreConfig::file(path))
    }

    /// The configuration this store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The payload types this store can decode.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register a payload type for appending and reading.
    pub fn register<T: Payload>(&self) -> Result<(), StoreError> {
        self.registry.register::<T>().map_err(StoreError::Registration)
    }

    /// Append an event to the aggregate's stream.
    ///
    /// Returns the assigned event id. The record's timestamp is the instant
    /// encoded in that id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnregisteredType` if `T` was never registered,
    /// and `StoreError::Storage` if the write transaction fails. Nothing is
    /// written on failure and nothing is retried.
    pub fn append<T: Payload>(&self, aggregate: &str, content: &T) -> Result<EventId, StoreError> {
        let prefix = keys::aggregate_prefix(aggregate)?;
        if !self.registry.is_registered::<T>() {
            return Err(StoreError::UnregisteredType {
                aggregate: aggregate.to_string(),
                type_tag: T::type_tag().to_string(),
            });
        }

        let engine = self.engine("append", Scope::Aggregate(aggregate))?;
        let (id, key) = engine
            .update(|table| -> Result<_, TxnError> {
                let id = self.ids.next_now().map_err(TxnError::Id)?;
                let key = keys::key_with_prefix(&prefix, id);
                let value = EventRecord::new(id, id.timestamp(), content)
                    .and_then(|record| codec::encode(&record))
                    .map_err(|source| TxnError::Codec {
                        key: key_text(&key),
                        source,
                    })?;

                table
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(redb::Error::from)?;
                Ok((id, key))
            })
            .map_err(|err| err.into_store_error("append", aggregate))?;

        debug!(
            aggregate,
            event_id = %id,
            key = %key_text(&key),
            type_tag = T::type_tag(),
            "Appended event"
        );
        Ok(id)
    }

    /// Read the events of an aggregate from the beginning.
    ///
    /// Returns payloads in append order; an aggregate with no events yields
    /// an empty list. Any record that fails to decode aborts the whole read.
    pub fn read(&self, aggregate: &str) -> Result<Vec<Box<dyn AnyEvent>>, StoreError> {
        Ok(self
            .read_events(aggregate)?
            .into_iter()
            .map(StoredEvent::into_payload)
            .collect())
    }

    /// Like [`read`](Self::read), keeping each record's id, timestamp and tag.
    pub fn read_events(&self, aggregate: &str) -> Result<Vec<StoredEvent>, StoreError> {
        self.scan_aggregate(aggregate, |bytes| codec::decode(bytes, &self.registry))
    }

    /// Like [`read`](Self::read), for aggregates holding only `T` payloads.
    ///
    /// A record of any other type fails the read with
    /// `CodecError::TypeMismatch`.
    pub fn read_as<T: Payload>(&self, aggregate: &str) -> Result<Vec<T>, StoreError> {
        self.scan_aggregate(aggregate, |bytes| codec::decode_as::<T>(bytes, &self.registry))
    }

    /// List every key in the store.
    pub fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        self.collect_keys(&[], Scope::AllKeys)
    }

    /// List the keys of one aggregate, in append order.
    pub fn list_keys_for_aggregate(&self, aggregate: &str) -> Result<Vec<String>, StoreError> {
        let prefix = keys::aggregate_prefix(aggregate)?;
        self.collect_keys(&prefix, Scope::Aggregate(aggregate))
    }

    /// Close the event store.
    ///
    /// Calling this on an already closed store is a no-op.
    pub fn close(&self) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut *self.state.lock(), EngineState::Closed);
        if let EngineState::Open(engine) = previous {
            let in_flight = Arc::strong_count(&engine) - 1;
            drop(engine);
            info!(in_flight, "Event store closed");
        }
        Ok(())
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        matches!(*self.state.lock(), EngineState::Closed)
    }

    fn engine(&self, operation: &'static str, scope: Scope<'_>) -> Result<Arc<Engine>, StoreError> {
        let mut state = self.state.lock();
        match &*state {
            EngineState::Open(engine) => return Ok(Arc::clone(engine)),
            EngineState::Closed => {
                return Err(StoreError::Closed {
                    operation,
                    scope: scope.to_string(),
                })
            }
            EngineState::Unopened => {}
        }

        let engine = Engine::open(&self.config).map_err(|source| {
            warn!(operation, location = %self.config.storage, error = %source, "Failed to open event store");
            StoreError::Open {
                operation,
                scope: scope.to_string(),
                location: self.config.storage.to_string(),
                source,
            }
        })?;
        let engine = Arc::new(engine);
        *state = EngineState::Open(Arc::clone(&engine));
        info!(location = %self.config.storage, "Event store opened");
        Ok(engine)
    }

    fn collect_keys(&self, prefix: &[u8], scope: Scope<'_>) -> Result<Vec<String>, StoreError> {
        let engine = self.engine("list keys", scope)?;
        engine
            .view(|snapshot| -> Result<_, redb::Error> {
                let mut keys = Vec::new();
                snapshot.scan_keys(prefix, |key: &[u8]| -> Result<(), redb::Error> {
                    keys.push(key_text(key));
                    Ok(())
                })?;
                Ok(keys)
            })
            .map_err(|source| StoreError::storage("list keys", scope.to_string(), source))
    }

    fn scan_aggregate<T, F>(&self, aggregate: &str, decode: F) -> Result<Vec<T>, StoreError>
    where
        F: Fn(&[u8]) -> Result<T, CodecError>,
    {
        let prefix = keys::aggregate_prefix(aggregate)?;
        let engine = self.engine("read", Scope::Aggregate(aggregate))?;

        let events = engine
            .view(|snapshot| -> Result<Vec<T>, TxnError> {
                let mut events = Vec::new();
                snapshot.scan_prefix(&prefix, |key: &[u8], value: &[u8]| -> Result<(), TxnError> {
                    let event = decode(value).map_err(|source| TxnError::Codec {
                        key: key_text(key),
                        source,
                    })?;
                    events.push(event);
                    Ok(())
                })?;
                Ok(events)
            })
            .map_err(|err| err.into_store_error("read", aggregate))?;

        debug!(aggregate, count = events.len(), "Read aggregate");
        Ok(events)
    }
}

impl fmt::Debug for EventStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.state.lock() {
            EngineState::Unopened => "unopened",
            EngineState::Open(_) => "open",
            EngineState::Closed => "closed",
        };
        f.debug_struct("EventStore")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("state", &state)
            .finish()
    }
}

fn key_text(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Test {
        value: i64,
    }

    impl Payload for Test {}

    fn count_keys(engine: &Engine) -> usize {
        engine
            .view(|snapshot| -> Result<_, redb::Error> {
                let mut count = 0;
                snapshot.scan_keys(&[], |_key: &[u8]| -> Result<(), redb::Error> {
                    count += 1;
                    Ok(())
                })?;
                Ok(count)
            })
            .unwrap()
    }

    #[test]
    fn test_engine_opens_lazily() {
        let store = EventStore::in_memory();
        assert!(matches!(*store.state.lock(), EngineState::Unopened));

        store.list_keys().unwrap();
        assert!(matches!(*store.state.lock(), EngineState::Open(_)));
    }

    #[test]
    fn test_open_is_eager() {
        let store = EventStore::open(StoreConfig::in_memory()).unwrap();
        assert!(matches!(*store.state.lock(), EngineState::Open(_)));
    }

    #[test]
    fn test_failed_open_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = EventStore::file(blocker.join("events.redb"));
        assert!(matches!(store.list_keys().unwrap_err(), StoreError::Open { .. }));
        assert!(matches!(*store.state.lock(), EngineState::Unopened));
        assert!(matches!(store.list_keys().unwrap_err(), StoreError::Open { .. }));
    }

    #[test]
    fn test_close_keeps_in_flight_engine_alive() {
        let store = EventStore::in_memory();
        store.register::<Test>().unwrap();
        store.append("test.1", &Test { value: 1 }).unwrap();

        let in_flight = store.engine("read", Scope::Aggregate("test.1")).unwrap();
        store.close().unwrap();
        assert!(store.is_closed());

        assert_eq!(count_keys(&in_flight), 1);
    }

    #[test]
    fn test_record_timestamp_follows_id_after_clock_step_back() {
        let store = EventStore::in_memory();
        store.register::<Test>().unwrap();

        // Pretend an earlier id came from a clock running an hour ahead.
        let ahead = store.ids.next_id(Utc::now() + Duration::hours(1)).unwrap();
        let id = store.append("test.1", &Test { value: 1 }).unwrap();
        assert!(id > ahead);
        assert_eq!(id.timestamp_ms(), ahead.timestamp_ms());

        let events = store.read_events("test.1").unwrap();
        assert_eq!(events[0].id, id);
        assert_eq!(events[0].timestamp, id.timestamp());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Store.to_string(), "event store");
        assert_eq!(Scope::AllKeys.to_string(), "all keys");
        assert_eq!(Scope::Aggregate("orders.7").to_string(), "aggregate 'orders.7'");
    }

    #[test]
    fn test_debug_reports_state() {
        let store = EventStore::in_memory();
        assert!(format!("{store:?}").contains("unopened"));
        store.close().unwrap();
        assert!(format!("{store:?}").contains("closed"));
    }
}
