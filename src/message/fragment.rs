use std::sync::Arc;

use super::Message;
use crate::{
    error::{DecodeError, EncodeError, wire_length},
    fragment::PartialRangeFilter,
    view::ByteView,
    wire::{INT_SIZE, WireSink, WireSource},
};

/// One window of another message's encoding.
///
/// On the sending side the body is a view over the original message and
/// owns no bytes: writing it re-encodes the original through a
/// [`PartialRangeFilter`] so only `[offset, offset + length)` reaches the
/// sink. Once decoded it is an opaque chunk of received bytes.
///
/// Both forms share the wire layout `[length:i32][bytes]`. As with byte
/// bodies, a received length of `-1` is accepted and decodes as an empty
/// window.
#[derive(Clone, Debug)]
pub enum FragmentBody {
    /// Sender-side view into the encoding of `original`.
    View {
        /// Message whose `[kind][envelope][payload]` encoding is windowed.
        original: Arc<Message>,
        /// Window start within that encoding.
        offset: usize,
        /// Window length.
        length: usize,
    },
    /// Bytes received from the wire.
    Received(ByteView),
}

impl FragmentBody {
    /// View `length` bytes of `original`'s encoding starting at `offset`.
    #[must_use]
    pub fn view(original: Arc<Message>, offset: usize, length: usize) -> Self {
        Self::View {
            original,
            offset,
            length,
        }
    }

    /// Number of bytes in the window.
    #[must_use]
    pub fn length(&self) -> usize {
        match self {
            Self::View { length, .. } => *length,
            Self::Received(view) => view.len(),
        }
    }

    /// Received bytes, or `None` for a sender-side view.
    #[must_use]
    pub fn received(&self) -> Option<&ByteView> {
        match self {
            Self::View { .. } => None,
            Self::Received(view) => Some(view),
        }
    }

    pub(crate) fn serialized_size(&self) -> usize { INT_SIZE + self.length() }

    pub(crate) fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        match self {
            Self::Received(view) => view.write_to(out),
            Self::View {
                original,
                offset,
                length,
            } => {
                out.write_i32(wire_length(*length)?);
                let mut filter = PartialRangeFilter::new(out, *offset, *length);
                original.write_message(&mut filter)?;
                let forwarded = filter.forwarded();
                if forwarded != *length {
                    return Err(EncodeError::WindowOutOfRange {
                        offset: *offset,
                        length: *length,
                        forwarded,
                    });
                }
                Ok(())
            }
        }
    }

    /// Read `[length:i32][bytes]`; a length of `-1` yields an empty window.
    pub(crate) fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError> {
        let view = match input.read_optional_length()? {
            Some(length) => ByteView::new(input.read_bytes(length)?),
            None => ByteView::default(),
        };
        *self = Self::Received(view);
        Ok(())
    }

    pub(crate) fn copy(&self, copy_payload: bool) -> Self {
        if copy_payload {
            self.clone()
        } else {
            Self::default()
        }
    }
}

impl Default for FragmentBody {
    fn default() -> Self { Self::Received(ByteView::default()) }
}
