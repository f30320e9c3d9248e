//! Buffer-backed bodies modelled on NIO byte buffers.
//!
//! Both variants write `[length:i32]` (`-1` when no buffer is attached)
//! followed, when present, by a one-byte allocation hint and the bytes. The
//! hint tells the receiver how the sender wants the buffer allocated; the
//! bytes themselves are identical either way.

use crate::{
    error::{DecodeError, EncodeError, wire_length},
    view::ByteView,
    wire::{BYTE_SIZE, INT_SIZE, WireSink, WireSource},
};

const MIN_TRANSFER_CHUNK: usize = 128;

/// Buffer body whose storage may be heap or direct memory.
///
/// A heap buffer exposes its bytes as an array; a direct buffer does not
/// and is streamed to the sink through a bounded transfer chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NioBody {
    buffer: Option<ByteView>,
    direct: bool,
}

impl NioBody {
    /// Heap buffer body.
    #[must_use]
    pub fn heap(buffer: impl Into<ByteView>) -> Self {
        Self {
            buffer: Some(buffer.into()),
            direct: false,
        }
    }

    /// Direct buffer body.
    #[must_use]
    pub fn direct(buffer: impl Into<ByteView>) -> Self {
        Self {
            buffer: Some(buffer.into()),
            direct: true,
        }
    }

    #[must_use]
    pub fn buffer(&self) -> Option<&ByteView> { self.buffer.as_ref() }

    #[must_use]
    pub const fn is_direct(&self) -> bool { self.direct }

    /// Attach or detach the buffer, keeping the storage kind.
    pub fn set_buffer(&mut self, buffer: Option<ByteView>) { self.buffer = buffer; }

    #[must_use]
    pub fn length(&self) -> usize { self.buffer.as_ref().map_or(0, ByteView::len) }

    pub(crate) fn serialized_size(&self) -> usize { payload_size(self.buffer.as_ref()) }

    pub(crate) fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        write_payload(self.buffer.as_ref(), self.direct, self.direct, out)
    }

    pub(crate) fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError> {
        if let Some((direct, buffer)) = read_payload(input)? {
            self.direct = direct;
            self.buffer = Some(buffer);
        }
        Ok(())
    }

    pub(crate) fn copy(&self, copy_payload: bool) -> Self {
        Self {
            buffer: self.buffer.clone().filter(|_| copy_payload),
            direct: self.direct,
        }
    }
}

/// Direct buffer body with an allocation hint for the receiver.
///
/// The buffer is never exposed as an array. `use_heap_memory` asks the
/// receiving side to place the decoded bytes on the heap instead of in
/// direct memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NioDirectBody {
    buffer: Option<ByteView>,
    use_heap_memory: bool,
}

impl NioDirectBody {
    #[must_use]
    pub fn new(buffer: impl Into<ByteView>) -> Self {
        Self {
            buffer: Some(buffer.into()),
            use_heap_memory: false,
        }
    }

    /// Ask receivers to allocate the decoded buffer on the heap.
    #[must_use]
    pub const fn with_heap_memory(mut self, use_heap_memory: bool) -> Self {
        self.use_heap_memory = use_heap_memory;
        self
    }

    #[must_use]
    pub fn buffer(&self) -> Option<&ByteView> { self.buffer.as_ref() }

    #[must_use]
    pub const fn use_heap_memory(&self) -> bool { self.use_heap_memory }

    pub fn set_buffer(&mut self, buffer: Option<ByteView>) { self.buffer = buffer; }

    #[must_use]
    pub fn length(&self) -> usize { self.buffer.as_ref().map_or(0, ByteView::len) }

    pub(crate) fn serialized_size(&self) -> usize { payload_size(self.buffer.as_ref()) }

    pub(crate) fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        write_payload(self.buffer.as_ref(), self.use_heap_memory, true, out)
    }

    pub(crate) fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError> {
        if let Some((use_heap_memory, buffer)) = read_payload(input)? {
            self.use_heap_memory = use_heap_memory;
            self.buffer = Some(buffer);
        }
        Ok(())
    }

    pub(crate) fn copy(&self, copy_payload: bool) -> Self {
        Self {
            buffer: self.buffer.clone().filter(|_| copy_payload),
            use_heap_memory: self.use_heap_memory,
        }
    }
}

/// Size of one transfer chunk for a buffer of `length` bytes.
pub(crate) fn transfer_chunk(length: usize) -> usize { (length / 10).max(MIN_TRANSFER_CHUNK) }

fn payload_size(buffer: Option<&ByteView>) -> usize {
    INT_SIZE + buffer.map_or(0, |buffer| BYTE_SIZE + buffer.len())
}

fn write_payload(
    buffer: Option<&ByteView>,
    hint: bool,
    chunked: bool,
    out: &mut dyn WireSink,
) -> Result<(), EncodeError> {
    let Some(buffer) = buffer else {
        out.write_i32(-1);
        return Ok(());
    };
    out.write_i32(wire_length(buffer.len())?);
    out.write_bool(hint);
    if chunked {
        for chunk in buffer.as_slice().chunks(transfer_chunk(buffer.len())) {
            out.write_slice(chunk);
        }
    } else {
        out.write_slice(buffer.as_slice());
    }
    Ok(())
}

fn read_payload(input: &mut dyn WireSource) -> Result<Option<(bool, ByteView)>, DecodeError> {
    let Some(length) = input.read_optional_length()? else {
        return Ok(None);
    };
    let hint = input.read_bool()?;
    Ok(Some((hint, ByteView::new(input.read_bytes(length)?))))
}
