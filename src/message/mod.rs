//! The message envelope and its payload variants.
//!
//! Every message shares one envelope (addresses, flags, headers) and carries
//! a [`Body`] whose variant decides the payload encoding. The full wire form
//! of a message is
//!
//! ```text
//! [kind:u8]
//! [flags:u16][transient_flags:u8]
//! [dest present:u8][dest:16]? [src present:u8][src:16]?
//! [header count:u32] ([id:u16][kind:u16][header bytes])*
//! [payload]
//! ```
//!
//! with all integers big-endian. [`Message::write_to`] emits everything but
//! the leading kind byte; [`Message::write_message`] and
//! [`Message::encode`] include it.

mod body;
mod composite;
mod custom;
mod flags;
mod fragment;
mod nio;
mod object;
mod serializable;

use std::sync::Arc;

pub use body::Body;
use bytes::{Bytes, BytesMut};
pub use composite::CompositeBody;
pub use custom::CustomBody;
pub use flags::{Flag, Flags, TransientFlag, TransientFlags};
pub use fragment::FragmentBody;
pub use nio::{NioBody, NioDirectBody};
pub use object::ObjectBody;
pub use serializable::{OpaqueObject, SerializableBody, SerializableObject};

use crate::{
    address::{self, Address},
    error::{DecodeError, EncodeError, UnsupportedOperation},
    header::{Header, HeaderId, HeaderMap},
    registry::Registry,
    streamable::Streamable,
    view::ByteView,
    wire::{BYTE_SIZE, SHORT_SIZE, WireSink, WireSource},
};

/// Discriminators of the built-in message kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Bytes = 0,
    Nio = 1,
    Empty = 2,
    Object = 3,
    Composite = 4,
    Fragment = 5,
    NioDirect = 6,
    Serializable = 7,
}

impl MessageKind {
    /// Every built-in kind in discriminator order.
    pub const ALL: [Self; 8] = [
        Self::Bytes,
        Self::Nio,
        Self::Empty,
        Self::Object,
        Self::Composite,
        Self::Fragment,
        Self::NioDirect,
        Self::Serializable,
    ];

    #[must_use]
    pub const fn as_u8(self) -> u8 { self as u8 }

    /// Map a discriminator to a built-in kind.
    #[must_use]
    pub fn from_u8(kind: u8) -> Option<Self> { Self::ALL.get(usize::from(kind)).copied() }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bytes => "bytes",
            Self::Nio => "nio",
            Self::Empty => "empty",
            Self::Object => "object",
            Self::Composite => "composite",
            Self::Fragment => "fragment",
            Self::NioDirect => "nio-direct",
            Self::Serializable => "serializable",
        }
    }
}

/// A unit of group communication: envelope plus body.
///
/// Messages are built and decorated on one thread, then treated as read-only
/// once handed to the transport. Payload buffers and header values are
/// shared by reference, so re-encoding a message for retransmission yields
/// the same bytes.
///
/// # Examples
///
/// ```
/// use groupwire::{Address, Flag, Message, Registry};
///
/// let message = Message::bytes(b"hello".to_vec())
///     .with_dest(Address::new(1))
///     .with_flag(Flag::Oob);
/// let encoded = message.encode().expect("encode");
/// let decoded = Message::decode(encoded, &Registry::new()).expect("decode");
/// assert_eq!(decoded.dest(), Some(Address::new(1)));
/// assert_eq!(decoded.array().expect("bytes body").map(|v| v.as_slice()), Some(&b"hello"[..]));
/// ```
#[derive(Debug, Default)]
pub struct Message {
    dest: Option<Address>,
    src: Option<Address>,
    flags: Flags,
    transient_flags: TransientFlags,
    headers: HeaderMap,
    body: Body,
}

impl Message {
    /// Message with no addresses, flags or headers around `body`.
    #[must_use]
    pub fn new(body: Body) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    /// Message without a payload.
    #[must_use]
    pub fn empty() -> Self { Self::new(Body::Empty) }

    /// Message carrying `buffer` as its byte payload.
    #[must_use]
    pub fn bytes(buffer: impl Into<ByteView>) -> Self { Self::new(Body::Bytes(Some(buffer.into()))) }

    /// Message carrying a heap buffer.
    #[must_use]
    pub fn nio(buffer: impl Into<ByteView>) -> Self { Self::new(Body::Nio(NioBody::heap(buffer))) }

    /// Message carrying a direct buffer.
    #[must_use]
    pub fn nio_direct(buffer: impl Into<ByteView>) -> Self {
        Self::new(Body::NioDirect(NioDirectBody::new(buffer)))
    }

    /// Message bundling `children`.
    #[must_use]
    pub fn composite(children: impl IntoIterator<Item = Self>) -> Self {
        Self::new(Body::Composite(children.into_iter().collect()))
    }

    /// Message carrying a size-aware streamable object.
    #[must_use]
    pub fn object(object: Arc<dyn Streamable>) -> Self {
        Self::new(Body::Object(ObjectBody::new(object)))
    }

    /// Message carrying a value encoded with `bincode`.
    #[must_use]
    pub fn serializable<T: OpaqueObject>(value: T) -> Self {
        Self::new(Body::Serializable(SerializableBody::opaque(value)))
    }

    /// Message carrying a window of `original`'s encoding.
    ///
    /// The window is validated when the fragment is written.
    #[must_use]
    pub fn fragment(original: Arc<Self>, offset: usize, length: usize) -> Self {
        Self::new(Body::Fragment(FragmentBody::view(original, offset, length)))
    }

    /// Builder form of [`set_dest`](Self::set_dest).
    #[must_use]
    pub fn with_dest(mut self, dest: Address) -> Self {
        self.dest = Some(dest);
        self
    }

    /// Builder form of [`set_src`](Self::set_src).
    #[must_use]
    pub fn with_src(mut self, src: Address) -> Self {
        self.src = Some(src);
        self
    }

    /// Builder form of [`set_flag`](Self::set_flag).
    #[must_use]
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.set(flag);
        self
    }

    /// Builder form of [`put_header`](Self::put_header).
    #[must_use]
    pub fn with_header(mut self, id: HeaderId, header: Arc<dyn Header>) -> Self {
        self.headers.put(id, header);
        self
    }

    /// Destination, or `None` for the whole group.
    #[must_use]
    pub const fn dest(&self) -> Option<Address> { self.dest }

    pub fn set_dest(&mut self, dest: Option<Address>) { self.dest = dest; }

    #[must_use]
    pub const fn src(&self) -> Option<Address> { self.src }

    pub fn set_src(&mut self, src: Option<Address>) { self.src = src; }

    #[must_use]
    pub const fn flags(&self) -> Flags { self.flags }

    /// Replace the persistent flags wholesale.
    pub fn set_flags(&mut self, flags: Flags) { self.flags = flags; }

    pub fn set_flag(&mut self, flag: Flag) { self.flags.set(flag); }

    pub fn clear_flag(&mut self, flag: Flag) { self.flags.clear(flag); }

    #[must_use]
    pub const fn is_flag_set(&self, flag: Flag) -> bool { self.flags.contains(flag) }

    #[must_use]
    pub const fn transient_flags(&self) -> TransientFlags { self.transient_flags }

    pub fn set_transient_flag(&mut self, flag: TransientFlag) { self.transient_flags.set(flag); }

    pub fn clear_transient_flag(&mut self, flag: TransientFlag) {
        self.transient_flags.clear(flag);
    }

    #[must_use]
    pub const fn is_transient_flag_set(&self, flag: TransientFlag) -> bool {
        self.transient_flags.contains(flag)
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }

    /// Attach `header` under `id`, returning the header it replaced.
    pub fn put_header(&mut self, id: HeaderId, header: Arc<dyn Header>) -> Option<Arc<dyn Header>> {
        self.headers.put(id, header)
    }

    #[must_use]
    pub fn header(&self, id: HeaderId) -> Option<&Arc<dyn Header>> { self.headers.get(id) }

    /// Header under `id` as a concrete type.
    #[must_use]
    pub fn header_as<T: Header>(&self, id: HeaderId) -> Option<&T> { self.headers.get_as(id) }

    #[must_use]
    pub fn body(&self) -> &Body { &self.body }

    pub fn body_mut(&mut self) -> &mut Body { &mut self.body }

    /// Replace the body, keeping the envelope.
    pub fn set_body(&mut self, body: Body) { self.body = body; }

    #[must_use]
    pub fn into_body(self) -> Body { self.body }

    /// Discriminator of the body.
    #[must_use]
    pub fn kind(&self) -> u8 { self.body.kind() }

    /// Number of payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Object`] if an opaque object must be encoded to
    /// learn its size and encoding fails.
    pub fn length(&self) -> Result<usize, EncodeError> { self.body.length() }

    #[must_use]
    pub fn has_payload(&self) -> bool { self.body.has_payload() }

    #[must_use]
    pub fn has_array(&self) -> bool { self.body.has_array() }

    /// Borrow the backing byte array.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedOperation`] when the body kind owns no array.
    pub fn array(&self) -> Result<Option<&ByteView>, UnsupportedOperation> { self.body.array() }

    /// Attach a byte array to an array-backed body.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedOperation`] for kinds that cannot hold an array.
    pub fn set_array(&mut self, buffer: impl Into<ByteView>) -> Result<(), UnsupportedOperation> {
        let buffer = Some(buffer.into());
        match &mut self.body {
            Body::Bytes(view) => *view = buffer,
            Body::Nio(body) if !body.is_direct() => body.set_buffer(buffer),
            body => {
                return Err(UnsupportedOperation {
                    operation: "set_array",
                    body: body.name(),
                });
            }
        }
        Ok(())
    }

    /// Copy the message, keeping addresses and both flag sets.
    ///
    /// `copy_payload` aliases the payload (deep-copying composite children);
    /// `copy_headers` shallow-copies the header map so header values are
    /// shared with the original.
    #[must_use]
    pub fn copy(&self, copy_payload: bool, copy_headers: bool) -> Self {
        let headers = if copy_headers {
            self.headers.copy()
        } else {
            HeaderMap::new()
        };
        self.copy_with(copy_payload, headers)
    }

    /// Copy the message with only the headers whose id is at least
    /// `starting_id`.
    #[must_use]
    pub fn copy_with_headers_from(&self, copy_payload: bool, starting_id: HeaderId) -> Self {
        self.copy_with(copy_payload, self.headers.copy_from(starting_id))
    }

    fn copy_with(&self, copy_payload: bool, headers: HeaderMap) -> Self {
        Self {
            dest: self.dest,
            src: self.src,
            flags: self.flags,
            transient_flags: self.transient_flags,
            headers,
            body: self.body.copy(copy_payload),
        }
    }

    /// Encoded size of the envelope and payload, excluding the kind byte.
    ///
    /// # Errors
    ///
    /// See [`length`](Self::length).
    pub fn serialized_size(&self) -> Result<usize, EncodeError> {
        Ok(self.envelope_size(self.dest.as_ref(), self.src.as_ref(), &[])
            + self.body.serialized_size()?)
    }

    /// Encoded size of [`write_to_no_addrs`](Self::write_to_no_addrs) output.
    ///
    /// # Errors
    ///
    /// See [`length`](Self::length).
    pub fn serialized_size_no_addrs(
        &self,
        src: Option<&Address>,
        excluded: &[HeaderId],
    ) -> Result<usize, EncodeError> {
        let (dest, own_src) = self.addresses_for(src);
        Ok(self.envelope_size(dest, own_src, excluded) + self.body.serialized_size()?)
    }

    /// Write envelope and payload, without the leading kind byte.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if any part of the message cannot be encoded.
    pub fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        self.write_envelope(self.dest.as_ref(), self.src.as_ref(), out, &[])?;
        self.body.write_to(out)
    }

    /// Write the message for a transport that already knows the sender.
    ///
    /// Addresses are written only when `src` is `None` or differs from the
    /// message's own source; otherwise both are marked absent. Headers whose
    /// id appears in `excluded` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if any part of the message cannot be encoded.
    pub fn write_to_no_addrs(
        &self,
        src: Option<&Address>,
        out: &mut dyn WireSink,
        excluded: &[HeaderId],
    ) -> Result<(), EncodeError> {
        let (dest, own_src) = self.addresses_for(src);
        self.write_envelope(dest, own_src, out, excluded)?;
        self.body.write_to(out)
    }

    /// Write `[kind:u8]` followed by [`write_to`](Self::write_to).
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if any part of the message cannot be encoded.
    pub fn write_message(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        out.write_u8(self.kind());
        self.write_to(out)
    }

    /// Encode the whole message, kind byte included, into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if any part of the message cannot be encoded.
    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        let mut out = BytesMut::with_capacity(BYTE_SIZE + self.serialized_size()?);
        self.write_message(&mut out)?;
        Ok(out.freeze())
    }

    /// Read the envelope and payload of a message whose kind byte has
    /// already been consumed.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] for unknown kinds, truncated input or
    /// malformed fields, and [`DecodeError::Invalid`] when composites nest
    /// deeper than [`MAX_NESTING`](crate::wire::MAX_NESTING). Nothing is
    /// returned unless decoding completes.
    pub fn read_from(
        kind: u8,
        input: &mut dyn WireSource,
        registry: &Registry,
    ) -> Result<Self, DecodeError> {
        Self::read_nested(kind, input, registry, 0)
    }

    fn read_nested(
        kind: u8,
        input: &mut dyn WireSource,
        registry: &Registry,
        depth: usize,
    ) -> Result<Self, DecodeError> {
        let mut body = registry.create_body(kind)?;
        let flags = Flags::from_bits(input.read_u16()?);
        let transient_flags = TransientFlags::from_bits(input.read_u8()?);
        let dest = address::read_optional(input)?;
        let src = address::read_optional(input)?;
        let headers = HeaderMap::read_from(input, registry)?;
        body.read_nested(input, registry, depth)?;
        Ok(Self {
            dest,
            src,
            flags,
            transient_flags,
            headers,
            body,
        })
    }

    /// Read `[kind:u8]` and then the message it announces.
    ///
    /// # Errors
    ///
    /// See [`read_from`](Self::read_from).
    pub fn read_message(
        input: &mut dyn WireSource,
        registry: &Registry,
    ) -> Result<Self, DecodeError> {
        Self::read_message_nested(input, registry, 0)
    }

    /// Read a message that sits `depth` composites below the outermost one.
    pub(crate) fn read_message_nested(
        input: &mut dyn WireSource,
        registry: &Registry,
        depth: usize,
    ) -> Result<Self, DecodeError> {
        let kind = input.read_u8()?;
        Self::read_nested(kind, input, registry, depth)
    }

    /// Decode a buffer holding exactly one message produced by
    /// [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TrailingBytes`] if bytes remain after the
    /// message, or any error from [`read_message`](Self::read_message).
    pub fn decode(buffer: impl Into<Bytes>, registry: &Registry) -> Result<Self, DecodeError> {
        let mut input: Bytes = buffer.into();
        read_exactly_one(&mut input, registry)
    }

    fn addresses_for(&self, src: Option<&Address>) -> (Option<&Address>, Option<&Address>) {
        let write_addresses = src.is_none() || self.src.is_some_and(|own| Some(&own) != src);
        if write_addresses {
            (self.dest.as_ref(), self.src.as_ref())
        } else {
            (None, None)
        }
    }

    fn envelope_size(
        &self,
        dest: Option<&Address>,
        src: Option<&Address>,
        excluded: &[HeaderId],
    ) -> usize {
        SHORT_SIZE
            + BYTE_SIZE
            + address::optional_size(dest)
            + address::optional_size(src)
            + self.headers.serialized_size(excluded)
    }

    fn write_envelope(
        &self,
        dest: Option<&Address>,
        src: Option<&Address>,
        out: &mut dyn WireSink,
        excluded: &[HeaderId],
    ) -> Result<(), EncodeError> {
        out.write_u16(self.flags.bits());
        out.write_u8(self.transient_flags.bits());
        address::write_optional(dest, out);
        address::write_optional(src, out);
        self.headers.write_to(out, excluded)
    }
}

/// Decode one message and reject anything left in `input`.
pub(crate) fn read_exactly_one(
    input: &mut dyn WireSource,
    registry: &Registry,
) -> Result<Message, DecodeError> {
    let message = Message::read_message(input, registry)?;
    match input.available() {
        0 => Ok(message),
        remaining => Err(DecodeError::TrailingBytes { remaining }),
    }
}

#[cfg(test)]
mod tests;
