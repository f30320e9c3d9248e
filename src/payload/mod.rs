//! Self-describing payloads decoupled from the message envelope.
//!
//! A [`Payload`] is a standalone unit of application data that knows its own
//! kind and can serialise itself without a surrounding message. The format
//! is `[kind:u8][payload]`, where the payload layout depends on the kind:
//!
//! ```text
//! byte array: [len:i32][bytes]
//! composite:  [count:u16] ( [kind:u8][payload] )*
//! ```
//!
//! Custom kinds above [`RESERVED_KIND_THRESHOLD`](crate::RESERVED_KIND_THRESHOLD)
//! are registered on a [`PayloadRegistry`].

mod composite;
mod registry;

use std::{any::Any, fmt::Debug};

use bytes::{Bytes, BytesMut};
pub use composite::CompositePayload;
pub use registry::PayloadRegistry;

use crate::{
    error::{DecodeError, EncodeError, UnsupportedOperation},
    fragment::ByteChain,
    view::ByteView,
    wire::{BYTE_SIZE, WireSink, WireSource},
};

/// Kind of a [`Payload::ByteArray`].
pub const BYTE_ARRAY: u8 = 1;
/// Kind of a [`Payload::Composite`].
pub const COMPOSITE: u8 = 2;

/// Application-defined payload kind.
///
/// Register a constructor with [`PayloadRegistry::register`] so receivers
/// can rebuild the payload from its kind byte.
pub trait CustomPayload: Any + Debug + Send + Sync {
    /// Discriminator written ahead of the payload; must match the registration.
    fn kind(&self) -> u8;

    /// Number of data bytes.
    fn size(&self) -> usize;

    /// Exact number of bytes [`write_to`](Self::write_to) emits.
    fn serialized_size(&self) -> usize;

    /// Backing byte window, for payloads that have one.
    fn array(&self) -> Option<&ByteView> { None }

    /// The data bytes, as exposed by [`Payload::reader`].
    fn data(&self) -> Bytes;

    /// Write the payload without its kind byte.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the payload cannot be represented on the wire.
    fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError>;

    /// Populate a freshly constructed payload from `input`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the source is truncated or malformed.
    fn read_from(
        &mut self,
        input: &mut dyn WireSource,
        registry: &PayloadRegistry,
    ) -> Result<(), DecodeError>;

    fn copy_payload(&self) -> Box<dyn CustomPayload>;
}

/// A self-describing unit of data.
///
/// # Examples
///
/// ```
/// use groupwire::payload::{Payload, PayloadRegistry};
/// let payload = Payload::bytes(b"hello".to_vec());
/// let wire = payload.serialize().expect("encode payload");
/// assert_eq!(wire[0], groupwire::payload::BYTE_ARRAY);
///
/// let decoded = Payload::deserialize(wire, &PayloadRegistry::new()).expect("decode payload");
/// assert_eq!(decoded.array().expect("byte array").as_slice(), b"hello");
/// ```
#[derive(Debug)]
pub enum Payload {
    /// A window over a shared byte buffer.
    ByteArray(ByteView),
    /// An ordered list of child payloads.
    Composite(CompositePayload),
    /// A registered application kind.
    Custom(Box<dyn CustomPayload>),
}

impl Payload {
    /// Wrap `buffer` as a byte-array payload.
    #[must_use]
    pub fn bytes(buffer: impl Into<ByteView>) -> Self { Self::ByteArray(buffer.into()) }

    /// Build a composite from `children`, in order.
    #[must_use]
    pub fn composite(children: impl IntoIterator<Item = Self>) -> Self {
        Self::Composite(children.into_iter().collect())
    }

    #[must_use]
    pub fn kind(&self) -> u8 {
        match self {
            Self::ByteArray(_) => BYTE_ARRAY,
            Self::Composite(_) => COMPOSITE,
            Self::Custom(custom) => custom.kind(),
        }
    }

    /// Number of data bytes; a composite sums its children.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::ByteArray(view) => view.size(),
            Self::Composite(composite) => composite.size(),
            Self::Custom(custom) => custom.size(),
        }
    }

    /// Encoded size without the leading kind byte.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        match self {
            Self::ByteArray(view) => view.serialized_size(),
            Self::Composite(composite) => composite.serialized_size(),
            Self::Custom(custom) => custom.serialized_size(),
        }
    }

    #[must_use]
    pub fn has_array(&self) -> bool { self.array().is_ok() }

    /// Backing byte window.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedOperation`] for composites and for custom
    /// payloads without a backing window.
    pub fn array(&self) -> Result<&ByteView, UnsupportedOperation> {
        let found = match self {
            Self::ByteArray(view) => Some(view),
            Self::Composite(_) => None,
            Self::Custom(custom) => custom.array(),
        };
        found.ok_or(UnsupportedOperation {
            operation: "array",
            body: self.name(),
        })
    }

    /// Offset of the data inside [`array`](Self::array)'s buffer.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedOperation`] when there is no backing window.
    pub fn array_offset(&self) -> Result<usize, UnsupportedOperation> {
        self.array().map(ByteView::offset)
    }

    /// Copy the payload.
    ///
    /// Byte arrays follow [`ByteView::copy`]; composites copy every child.
    #[must_use]
    pub fn copy(&self) -> Self {
        match self {
            Self::ByteArray(view) => Self::ByteArray(view.copy()),
            Self::Composite(composite) => Self::Composite(composite.copy()),
            Self::Custom(custom) => Self::Custom(custom.copy_payload()),
        }
    }

    /// The data bytes as one readable [`bytes::Buf`].
    ///
    /// Composite children are chained in order without copying.
    #[must_use]
    pub fn reader(&self) -> ByteChain {
        let mut chain = ByteChain::new();
        self.collect_data(&mut chain);
        chain
    }

    fn collect_data(&self, chain: &mut ByteChain) {
        match self {
            Self::ByteArray(view) => chain.push(view.to_bytes()),
            Self::Composite(composite) => {
                for child in composite {
                    child.collect_data(chain);
                }
            }
            Self::Custom(custom) => chain.push(custom.data()),
        }
    }

    /// Write the payload without its kind byte.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] when a length or child count overflows its
    /// prefix.
    pub fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        match self {
            Self::ByteArray(view) => view.write_to(out),
            Self::Composite(composite) => composite.write_to(out),
            Self::Custom(custom) => custom.write_to(out),
        }
    }

    /// Encode as `[kind:u8][payload]`.
    ///
    /// # Errors
    ///
    /// See [`write_to`](Self::write_to).
    pub fn serialize(&self) -> Result<Bytes, EncodeError> {
        let mut out = BytesMut::with_capacity(BYTE_SIZE + self.serialized_size());
        self.write_payload(&mut out)?;
        Ok(out.freeze())
    }

    pub(crate) fn write_payload(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        out.write_u8(self.kind());
        self.write_to(out)
    }

    /// Decode a payload produced by [`serialize`](Self::serialize).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownPayloadKind`] for unregistered kinds,
    /// [`DecodeError::TrailingBytes`] when bytes remain,
    /// [`DecodeError::Invalid`] when composites nest deeper than
    /// [`MAX_NESTING`](crate::wire::MAX_NESTING), or any read error.
    pub fn deserialize(buffer: impl Into<Bytes>, registry: &PayloadRegistry) -> Result<Self, DecodeError> {
        let mut input: Bytes = buffer.into();
        let payload = Self::read_payload(&mut input, registry, 0)?;
        let remaining = input.available();
        if remaining > 0 {
            return Err(DecodeError::TrailingBytes { remaining });
        }
        Ok(payload)
    }

    pub(crate) fn read_payload(
        input: &mut dyn WireSource,
        registry: &PayloadRegistry,
        depth: usize,
    ) -> Result<Self, DecodeError> {
        let kind = input.read_u8()?;
        let mut payload = registry.create(kind)?;
        payload.read_from(input, registry, depth)?;
        Ok(payload)
    }

    fn read_from(
        &mut self,
        input: &mut dyn WireSource,
        registry: &PayloadRegistry,
        depth: usize,
    ) -> Result<(), DecodeError> {
        match self {
            Self::ByteArray(view) => *view = ByteView::read_from(input)?,
            Self::Composite(composite) => composite.read_from(input, registry, depth)?,
            Self::Custom(custom) => custom.read_from(input, registry)?,
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self {
            Self::ByteArray(_) => "byte array",
            Self::Composite(_) => "composite",
            Self::Custom(_) => "custom",
        }
    }

    /// Downcast a custom payload to its concrete type.
    #[must_use]
    pub fn custom_as<T: CustomPayload>(&self) -> Option<&T> {
        match self {
            Self::Custom(custom) => {
                let any: &dyn Any = &**custom;
                any.downcast_ref()
            }
            _ => None,
        }
    }
}
