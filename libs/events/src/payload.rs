//! Payload capability traits.

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::CodecError;

/// A type that can be appended to and read back from the event log.
///
/// Implementations usually only need an empty `impl Payload for T {}`.
/// The type tag defaults to the fully qualified type name; override
/// [`Payload::type_tag`] with a literal when records must survive a type
/// being renamed or moved.
pub trait Payload: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Stable tag stored alongside every record of this type.
    fn type_tag() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Encodes the payload as MessagePack with named fields.
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        rmp_serde::to_vec_named(self).map_err(|e| CodecError::PayloadEncode {
            type_tag: Self::type_tag().to_string(),
            source: Box::new(e),
        })
    }

    /// Decodes a payload previously produced by [`Payload::encode`].
    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        rmp_serde::from_slice(bytes).map_err(|e| CodecError::PayloadDecode {
            type_tag: Self::type_tag().to_string(),
            source: Box::new(e),
        })
    }
}

/// Type-erased view of a decoded payload.
///
/// Reads return payloads of whatever types the aggregate holds; callers
/// recover the concrete type with [`downcast_ref`](trait.AnyEvent.html#method.downcast_ref)
/// or [`downcast`](trait.AnyEvent.html#method.downcast).
pub trait AnyEvent: Any + Send + Sync + fmt::Debug {
    /// The type tag of the concrete payload.
    fn payload_type(&self) -> &'static str;

    /// Convert the payload to `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert the boxed payload to a boxed `Any` for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Payload> AnyEvent for T {
    fn payload_type(&self) -> &'static str {
        T::type_tag()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn AnyEvent {
    /// Returns true if the payload is a `T`.
    pub fn is<T: Payload>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrows the payload as a `T`, if it is one.
    pub fn downcast_ref<T: Payload>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Takes the payload as a `T`, if it is one.
    pub fn downcast<T: Payload>(self: Box<Self>) -> Option<T> {
        self.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }
}
