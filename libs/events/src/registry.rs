//! Type registry mapping stored type tags to payload decoders.

use std::any::TypeId;
use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{AnyEvent, CodecError, Payload};

/// Decoder that rebuilds a registered payload type from its encoded bytes.
pub type DecodeFn = fn(&[u8]) -> Result<Box<dyn AnyEvent>, CodecError>;

#[derive(Clone, Copy)]
struct Registration {
    type_id: TypeId,
    type_name: &'static str,
    decode: DecodeFn,
}

/// Registry of payload types that may be decoded.
///
/// Registration is additive: there is no removal, and registering the same
/// type twice is a no-op. A record can only be decoded while its tag is
/// registered, regardless of what was registered when it was written.
#[derive(Default)]
pub struct TypeRegistry {
    entries: RwLock<HashMap<&'static str, Registration>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under its type tag.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::TagConflict` if a different type already owns
    /// the tag.
    pub fn register<T: Payload>(&self) -> Result<(), CodecError> {
        let type_tag = T::type_tag();
        let registration = Registration {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            decode: decode_boxed::<T>,
        };

        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(type_tag) {
            if existing.type_id == registration.type_id {
                return Ok(());
            }
            warn!(
                type_tag,
                existing = existing.type_name,
                requested = registration.type_name,
                "Type tag already registered to a different type"
            );
            return Err(CodecError::TagConflict {
                type_tag: type_tag.to_string(),
                existing: existing.type_name,
                requested: registration.type_name,
            });
        }

        entries.insert(type_tag, registration);
        debug!(type_tag, "Registered payload type");
        Ok(())
    }

    /// Returns true if any type is registered under `type_tag`.
    pub fn contains(&self, type_tag: &str) -> bool {
        self.entries.read().contains_key(type_tag)
    }

    /// Returns true if `T` itself owns its type tag.
    pub fn is_registered<T: Payload>(&self) -> bool {
        self.entries
            .read()
            .get(T::type_tag())
            .is_some_and(|entry| entry.type_id == TypeId::of::<T>())
    }

    /// Looks up the decoder for `type_tag`.
    pub fn resolve(&self, type_tag: &str) -> Option<DecodeFn> {
        self.entries.read().get(type_tag).map(|entry| entry.decode)
    }

    /// Decodes `bytes` as the type registered under `type_tag`.
    pub fn decode(&self, type_tag: &str, bytes: &[u8]) -> Result<Box<dyn AnyEvent>, CodecError> {
        let decode = self
            .resolve(type_tag)
            .ok_or_else(|| CodecError::UnregisteredType(type_tag.to_string()))?;
        decode(bytes)
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All registered tags in sorted order.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.entries.read().keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

fn decode_boxed<T: Payload>(bytes: &[u8]) -> Result<Box<dyn AnyEvent>, CodecError> {
    Ok(Box::new(T::decode(bytes)?))
}
