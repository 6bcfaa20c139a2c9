//! # evstore
//!
//! An append-only log of typed events grouped by aggregate, stored in an
//! embedded ordered key-value engine ([redb]).
//!
//! ## Storage Layout
//!
//! Every event is one key/value pair:
//!
//! ```text
//! key:   <aggregate>:<event id>     e.g. orders.42:01HV4Z2WQXKJNM8GPQY6VBKC3D
//! value: JSON envelope {id, timestamp, type, content}
//! ```
//!
//! Event ids sort in creation order and aggregate names cannot contain `:`,
//! so a prefix scan over `<aggregate>:` yields exactly that aggregate's
//! events in append order.
//!
//! ## Usage
//!
//! ```ignore
//! let store = EventStore::in_memory();
//! store.register::<Deposited>()?;
//! store.append("account.1", &Deposited { amount: 10 })?;
//! let events = store.read("account.1")?;
//! ```
//!
//! [redb]: https://docs.rs/redb

mod config;
mod engine;
mod error;
pub mod keys;
mod store;

pub use config::{StorageMode, StoreConfig};
pub use error::StoreError;
pub use store::EventStore;

pub use evstore_events::{AnyEvent, CodecError, EventRecord, Payload, StoredEvent, TypeRegistry};
pub use evstore_id::{EventId, IdError};
