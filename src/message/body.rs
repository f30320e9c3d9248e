use super::{
    CompositeBody,
    CustomBody,
    FragmentBody,
    MessageKind,
    NioBody,
    NioDirectBody,
    ObjectBody,
    SerializableBody,
};
use crate::{
    error::{DecodeError, EncodeError, UnsupportedOperation},
    registry::Registry,
    view::ByteView,
    wire::{INT_SIZE, WireSink, WireSource},
};

/// Payload of a [`Message`](super::Message), one variant per message kind.
///
/// Built-in kinds are matched exhaustively; [`Body::Custom`] dispatches to
/// a registered [`CustomBody`].
#[derive(Debug)]
pub enum Body {
    /// No payload at all.
    Empty,
    /// A byte view, or `None` for "no buffer" (distinct from an empty one).
    Bytes(Option<ByteView>),
    /// Heap or direct buffer.
    Nio(NioBody),
    /// Direct buffer with an allocation hint.
    NioDirect(NioDirectBody),
    /// Child messages.
    Composite(CompositeBody),
    /// Size-aware streamable object.
    Object(ObjectBody),
    /// Streamable or `bincode` object.
    Serializable(SerializableBody),
    /// Window of another message's encoding.
    Fragment(FragmentBody),
    /// Application-registered kind.
    Custom(Box<dyn CustomBody>),
}

impl Body {
    /// Payload-less body of a built-in kind, ready to be decoded into.
    #[must_use]
    pub fn blank(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Bytes => Self::Bytes(None),
            MessageKind::Nio => Self::Nio(NioBody::default()),
            MessageKind::Empty => Self::Empty,
            MessageKind::Object => Self::Object(ObjectBody::default()),
            MessageKind::Composite => Self::Composite(CompositeBody::default()),
            MessageKind::Fragment => Self::Fragment(FragmentBody::default()),
            MessageKind::NioDirect => Self::NioDirect(NioDirectBody::default()),
            MessageKind::Serializable => Self::Serializable(SerializableBody::default()),
        }
    }

    /// Discriminator written ahead of the message.
    #[must_use]
    pub fn kind(&self) -> u8 { self.resolve().map_or_else(|custom| custom.kind(), MessageKind::as_u8) }

    /// Built-in kind of the body, or `None` for custom bodies.
    #[must_use]
    pub fn builtin_kind(&self) -> Option<MessageKind> { self.resolve().ok() }

    /// Variant name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str { self.builtin_kind().map_or("custom", MessageKind::name) }

    fn resolve(&self) -> Result<MessageKind, &dyn CustomBody> {
        Ok(match self {
            Self::Empty => MessageKind::Empty,
            Self::Bytes(_) => MessageKind::Bytes,
            Self::Nio(_) => MessageKind::Nio,
            Self::NioDirect(_) => MessageKind::NioDirect,
            Self::Composite(_) => MessageKind::Composite,
            Self::Object(_) => MessageKind::Object,
            Self::Serializable(_) => MessageKind::Serializable,
            Self::Fragment(_) => MessageKind::Fragment,
            Self::Custom(body) => return Err(&**body),
        })
    }

    /// Number of payload bytes, excluding length prefixes and markers.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Object`] if an opaque object must be encoded
    /// to learn its size and encoding fails.
    pub fn length(&self) -> Result<usize, EncodeError> {
        Ok(match self {
            Self::Empty => 0,
            Self::Bytes(view) => view.as_ref().map_or(0, ByteView::len),
            Self::Nio(body) => body.length(),
            Self::NioDirect(body) => body.length(),
            Self::Composite(body) => body.length()?,
            Self::Object(body) => body.length(),
            Self::Serializable(body) => body.length()?,
            Self::Fragment(body) => body.length(),
            Self::Custom(body) => body.length(),
        })
    }

    /// Whether the body carries any payload.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Bytes(view) => view.is_some(),
            Self::Nio(body) => body.buffer().is_some(),
            Self::NioDirect(body) => body.buffer().is_some(),
            Self::Composite(body) => !body.is_empty(),
            Self::Object(body) => body.object().is_some(),
            Self::Serializable(body) => body.object().is_some(),
            Self::Fragment(_) => true,
            Self::Custom(body) => body.has_payload(),
        }
    }

    /// Whether [`array`](Self::array) would return a buffer.
    #[must_use]
    pub fn has_array(&self) -> bool { matches!(self.array(), Ok(Some(_))) }

    /// Borrow the backing byte array.
    ///
    /// Array-backed kinds (bytes, heap buffers, received fragments) return
    /// `Ok(None)` when no buffer is attached.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedOperation`] for kinds that never own an array.
    pub fn array(&self) -> Result<Option<&ByteView>, UnsupportedOperation> {
        match self {
            Self::Bytes(view) => Ok(view.as_ref()),
            Self::Nio(body) if !body.is_direct() => Ok(body.buffer()),
            Self::Fragment(FragmentBody::Received(view)) => Ok(Some(view)),
            _ => Err(UnsupportedOperation {
                operation: "array",
                body: self.name(),
            }),
        }
    }

    /// Exact encoded size of the payload.
    ///
    /// # Errors
    ///
    /// See [`length`](Self::length).
    pub fn serialized_size(&self) -> Result<usize, EncodeError> {
        Ok(match self {
            Self::Empty => 0,
            Self::Bytes(view) => INT_SIZE + view.as_ref().map_or(0, ByteView::len),
            Self::Nio(body) => body.serialized_size(),
            Self::NioDirect(body) => body.serialized_size(),
            Self::Composite(body) => body.serialized_size()?,
            Self::Object(body) => body.serialized_size(),
            Self::Serializable(body) => body.serialized_size()?,
            Self::Fragment(body) => body.serialized_size(),
            Self::Custom(body) => body.serialized_size(),
        })
    }

    /// Write the payload.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if a length overflows its prefix, an opaque
    /// object fails to encode, or a fragment window lies outside its
    /// original.
    pub fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        match self {
            Self::Empty => Ok(()),
            Self::Bytes(Some(view)) => view.write_to(out),
            Self::Bytes(None) => {
                out.write_i32(-1);
                Ok(())
            }
            Self::Nio(body) => body.write_to(out),
            Self::NioDirect(body) => body.write_to(out),
            Self::Composite(body) => body.write_to(out),
            Self::Object(body) => {
                body.write_to(out);
                Ok(())
            }
            Self::Serializable(body) => body.write_to(out),
            Self::Fragment(body) => body.write_to(out),
            Self::Custom(body) => body.write_to(out),
        }
    }

    /// Read a payload into this freshly constructed body.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the source is truncated, a length is
    /// invalid, a nested kind is not registered, or composites nest deeper
    /// than [`MAX_NESTING`](crate::wire::MAX_NESTING).
    pub fn read_from(
        &mut self,
        input: &mut dyn WireSource,
        registry: &Registry,
    ) -> Result<(), DecodeError> {
        self.read_nested(input, registry, 0)
    }

    pub(crate) fn read_nested(
        &mut self,
        input: &mut dyn WireSource,
        registry: &Registry,
        depth: usize,
    ) -> Result<(), DecodeError> {
        match self {
            Self::Empty => Ok(()),
            Self::Bytes(view) => {
                *view = input
                    .read_optional_length()?
                    .map(|length| input.read_bytes(length).map(ByteView::new))
                    .transpose()?;
                Ok(())
            }
            Self::Nio(body) => body.read_from(input),
            Self::NioDirect(body) => body.read_from(input),
            Self::Composite(body) => body.read_from(input, registry, depth),
            Self::Object(body) => body.read_from(input, registry),
            Self::Serializable(body) => body.read_from(input, registry),
            Self::Fragment(body) => body.read_from(input),
            Self::Custom(body) => body.read_from(input, registry),
        }
    }

    /// Copy the body, aliasing or deep-copying the payload per kind, or
    /// dropping it when `copy_payload` is false.
    #[must_use]
    pub fn copy(&self, copy_payload: bool) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Bytes(view) => Self::Bytes(view.clone().filter(|_| copy_payload)),
            Self::Nio(body) => Self::Nio(body.copy(copy_payload)),
            Self::NioDirect(body) => Self::NioDirect(body.copy(copy_payload)),
            Self::Composite(body) => Self::Composite(body.copy(copy_payload)),
            Self::Object(body) => Self::Object(body.copy(copy_payload)),
            Self::Serializable(body) => Self::Serializable(body.copy(copy_payload)),
            Self::Fragment(body) => Self::Fragment(body.copy(copy_payload)),
            Self::Custom(body) => Self::Custom(body.copy_body(copy_payload)),
        }
    }
}

impl Default for Body {
    fn default() -> Self { Self::Empty }
}
