//! Monotonic event ID generation.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::{EventId, IdError, Ulid};

/// Produces strictly increasing [`EventId`]s.
///
/// When the requested timestamp falls in the same millisecond as the
/// previous ID (or earlier, if the clock stepped back) the previous ID's
/// entropy is incremented instead of drawing fresh randomness, so IDs never
/// collide and never go backwards for the lifetime of the generator.
pub struct IdGenerator {
    last: Mutex<Option<Ulid>>,
}

impl IdGenerator {
    /// Creates a generator with no previous ID.
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    /// Generates the next ID for the given instant.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Overflow` if the 80-bit entropy of the millisecond
    /// being extended is exhausted. The reported millisecond is the previous
    /// ID's, which is later than `at` after a clock step back.
    pub fn next_id(&self, at: DateTime<Utc>) -> Result<EventId, IdError> {
        let mut last = self.last.lock();
        let fresh = Ulid::from_datetime(SystemTime::from(at));

        let next = match *last {
            Some(previous) if fresh.timestamp_ms() <= previous.timestamp_ms() => {
                previous.increment().ok_or(IdError::Overflow {
                    timestamp_ms: previous.timestamp_ms(),
                })?
            }
            _ => fresh,
        };

        *last = Some(next);
        Ok(EventId::from_ulid(next))
    }

    /// Generates the next ID for the current wall-clock time.
    pub fn next_now(&self) -> Result<EventId, IdError> {
        self.next_id(Utc::now())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator")
            .field("last", &*self.last.lock())
            .finish()
    }
}
