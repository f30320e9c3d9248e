//! Body for arbitrary objects without a hand-written wire format.
//!
//! Objects that implement [`Streamable`] are written with their own encoder.
//! Everything else goes through `bincode` using the standard configuration.
//! The encoded form is computed at most once and kept until the object is
//! replaced with [`SerializableBody::set_object`].

use std::{
    any::Any,
    fmt::Debug,
    sync::{Arc, OnceLock},
};

use bincode::{BorrowDecode, Encode, borrow_decode_from_slice, config, encode_to_vec};
use bytes::Bytes;

use super::object::read_streamable;
use crate::{
    error::{DecodeError, EncodeError, wire_length},
    registry::Registry,
    streamable::Streamable,
    wire::{BYTE_SIZE, INT_SIZE, SHORT_SIZE, WireSink, WireSource},
};

/// An object the serializable body encodes with `bincode`.
///
/// Implemented for every `bincode::Encode` type that is also `Debug`,
/// `Send` and `Sync`.
pub trait OpaqueObject: Any + Debug + Send + Sync {
    /// Encode the object with the standard `bincode` configuration.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the object's `Encode` implementation.
    fn to_opaque_bytes(&self) -> Result<Vec<u8>, bincode::error::EncodeError>;
}

impl<T> OpaqueObject for T
where
    T: Encode + Any + Debug + Send + Sync,
{
    fn to_opaque_bytes(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        encode_to_vec(self, config::standard())
    }
}

/// Object held by a [`SerializableBody`].
#[derive(Clone, Debug)]
pub enum SerializableObject {
    /// Written with its own [`Streamable`] encoder.
    Streamable(Arc<dyn Streamable>),
    /// Written as opaque `bincode` bytes.
    Opaque(Arc<dyn OpaqueObject>),
    /// Opaque bytes received from the wire, decoded on demand with
    /// [`SerializableBody::decode_object`].
    Encoded(Bytes),
}

/// Body carrying an object in either self-describing or opaque form.
#[derive(Clone, Debug, Default)]
pub struct SerializableBody {
    object: Option<SerializableObject>,
    opaque: OnceLock<Bytes>,
}

impl SerializableBody {
    /// Body holding a `bincode`-encodable value.
    #[must_use]
    pub fn opaque<T: OpaqueObject>(value: T) -> Self {
        Self::from_object(SerializableObject::Opaque(Arc::new(value)))
    }

    /// Body holding a streamable value.
    #[must_use]
    pub fn streamable(value: Arc<dyn Streamable>) -> Self {
        Self::from_object(SerializableObject::Streamable(value))
    }

    fn from_object(object: SerializableObject) -> Self {
        let mut body = Self::default();
        body.set_object(Some(object));
        body
    }

    #[must_use]
    pub fn object(&self) -> Option<&SerializableObject> { self.object.as_ref() }

    /// Replace the object and drop any cached encoding.
    pub fn set_object(&mut self, object: Option<SerializableObject>) {
        self.opaque = OnceLock::new();
        self.object = object;
    }

    /// Borrow a live object as a concrete type.
    ///
    /// Returns `None` for bodies decoded from opaque bytes; use
    /// [`decode_object`](Self::decode_object) for those.
    #[must_use]
    pub fn object_as<T: Any>(&self) -> Option<&T> {
        let object: &dyn Any = match self.object.as_ref()? {
            SerializableObject::Streamable(object) => &**object,
            SerializableObject::Opaque(object) => &**object,
            SerializableObject::Encoded(_) => return None,
        };
        object.downcast_ref::<T>()
    }

    /// Decode the opaque form into `T`.
    ///
    /// Works for objects received from the wire and for locally attached
    /// opaque objects alike.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Invalid`] if the body holds no opaque object,
    /// or [`DecodeError::Object`] if the bytes do not decode as `T`.
    pub fn decode_object<T>(&self) -> Result<T, DecodeError>
    where
        for<'de> T: BorrowDecode<'de, ()>,
    {
        let bytes = self
            .opaque_bytes()
            .map_err(|err| DecodeError::Invalid {
                what: "serializable object",
                reason: err.to_string(),
            })?
            .ok_or_else(|| DecodeError::Invalid {
                what: "serializable object",
                reason: "body holds no opaque object".to_owned(),
            })?;
        let (value, _) = borrow_decode_from_slice(bytes, config::standard())?;
        Ok(value)
    }

    /// Encoded size of the object alone.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Object`] if an opaque object fails to encode.
    pub fn length(&self) -> Result<usize, EncodeError> {
        Ok(match &self.object {
            None => 0,
            Some(SerializableObject::Streamable(object)) => object.serialized_size(),
            Some(_) => self.opaque_bytes()?.map_or(0, <[u8]>::len),
        })
    }

    pub(crate) fn serialized_size(&self) -> Result<usize, EncodeError> {
        Ok(BYTE_SIZE
            + match &self.object {
                Some(SerializableObject::Streamable(object)) => {
                    SHORT_SIZE + object.serialized_size()
                }
                _ => INT_SIZE + self.opaque_bytes()?.map_or(0, <[u8]>::len),
            })
    }

    pub(crate) fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        if let Some(SerializableObject::Streamable(object)) = &self.object {
            out.write_bool(true);
            out.write_u16(object.kind());
            object.write_to(out);
            return Ok(());
        }
        out.write_bool(false);
        match self.opaque_bytes()? {
            Some(bytes) => {
                out.write_i32(wire_length(bytes.len())?);
                out.write_slice(bytes);
            }
            None => out.write_i32(-1),
        }
        Ok(())
    }

    pub(crate) fn read_from(
        &mut self,
        input: &mut dyn WireSource,
        registry: &Registry,
    ) -> Result<(), DecodeError> {
        let object = if input.read_bool()? {
            Some(SerializableObject::Streamable(read_streamable(input, registry)?))
        } else {
            input
                .read_optional_length()?
                .map(|length| input.read_bytes(length))
                .transpose()?
                .map(SerializableObject::Encoded)
        };
        self.set_object(object);
        Ok(())
    }

    pub(crate) fn copy(&self, copy_payload: bool) -> Self {
        if copy_payload {
            self.clone()
        } else {
            Self::default()
        }
    }

    // Memoised opaque form; `None` when there is no opaque object.
    fn opaque_bytes(&self) -> Result<Option<&[u8]>, EncodeError> {
        let object = match &self.object {
            Some(SerializableObject::Opaque(object)) => object,
            Some(SerializableObject::Encoded(bytes)) => return Ok(Some(bytes.as_ref())),
            _ => return Ok(None),
        };
        if let Some(bytes) = self.opaque.get() {
            return Ok(Some(bytes.as_ref()));
        }
        let encoded = Bytes::from(object.to_opaque_bytes()?);
        Ok(Some(self.opaque.get_or_init(|| encoded).as_ref()))
    }
}
