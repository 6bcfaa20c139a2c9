//! # evstore-id
//!
//! Event identifiers for the evstore event log.
//!
//! ## Design Principles
//!
//! - Every appended event gets exactly one identifier, assigned at append time
//! - Identifiers are never reused for the lifetime of a store
//! - The textual form sorts exactly like the numeric form, so identifiers can
//!   be embedded in storage keys and still yield append order on a prefix scan
//!
//! ## ID Format
//!
//! An [`EventId`] is a 128-bit ULID: a 48-bit millisecond timestamp followed by
//! 80 bits of entropy, rendered as 26 characters of Crockford base32.
//!
//! Example: `01HV4Z2WQXKJNM8GPQY6VBKC3D`
//!
//! Identifiers are produced by an [`IdGenerator`], which keeps one monotonic
//! entropy source for its whole lifetime. Two identifiers drawn from the same
//! generator are strictly increasing, even when they share a millisecond.

mod error;
mod generator;
mod types;

pub use error::IdError;
pub use generator::IdGenerator;
pub use types::EventId;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
