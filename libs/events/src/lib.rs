//! # evstore-events
//!
//! Payload typing and record serialization for the evstore event log.
//!
//! ## Design Principles
//!
//! - Heterogeneous payload types share one keyspace
//! - Every stored record names its payload type with a stable type tag
//! - Decoding never guesses: a tag must be registered before it can be read
//! - The registry is owned state, not a process global
//!
//! ## Record Layout
//!
//! A stored value is a JSON envelope:
//!
//! ```text
//! {"id":"01HV4Z2WQXKJNM8GPQY6VBKC3D","timestamp":"2024-04-12T09:30:00.123Z",
//!  "type":"orders::OrderPlaced","content":"gqV2YWx1ZQE="}
//! ```
//!
//! `content` is the base64 text of the MessagePack-encoded payload. The
//! envelope can be read without knowing the payload type; the type tag then
//! selects the registered decoder for `content`.

pub mod codec;
mod envelope;
mod error;
mod payload;
mod registry;

pub use envelope::{EventRecord, StoredEvent};
pub use error::CodecError;
pub use payload::{AnyEvent, Payload};
pub use registry::{DecodeFn, TypeRegistry};
