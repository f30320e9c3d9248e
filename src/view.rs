//! Zero-copy views over immutable byte buffers.
//!
//! A [`ByteView`] references a window of a shared [`Bytes`] block. Because
//! `Bytes` cannot be mutated through any handle, a message that captured a
//! view can be re-serialised later (for retransmission) and is guaranteed to
//! emit the same bytes.

use bytes::Bytes;

use crate::{
    error::{DecodeError, EncodeError, RangeError, wire_length},
    wire::{INT_SIZE, WireSink, WireSource},
};

/// Window `[offset, offset + length)` of a shared buffer.
///
/// # Examples
///
/// ```
/// use groupwire::ByteView;
/// let view = ByteView::slice(b"hello world".to_vec(), 6, 5).expect("in bounds");
/// assert_eq!(view.as_slice(), b"world");
/// assert_eq!(view.serialized_size(), 4 + 5);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ByteView {
    buffer: Bytes,
    offset: usize,
    length: usize,
}

impl ByteView {
    /// View the whole of `buffer`.
    #[must_use]
    pub fn new(buffer: impl Into<Bytes>) -> Self {
        let buffer = buffer.into();
        let length = buffer.len();
        Self {
            buffer,
            offset: 0,
            length,
        }
    }

    /// View `length` bytes of `buffer` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError`] when the window does not fit inside the buffer.
    pub fn slice(
        buffer: impl Into<Bytes>,
        offset: usize,
        length: usize,
    ) -> Result<Self, RangeError> {
        let buffer = buffer.into();
        let capacity = buffer.len();
        match offset.checked_add(length) {
            Some(end) if end <= capacity => Ok(Self {
                buffer,
                offset,
                length,
            }),
            _ => Err(RangeError {
                offset,
                length,
                capacity,
            }),
        }
    }

    /// Start of the window inside [`buffer`](Self::buffer).
    #[must_use]
    pub const fn offset(&self) -> usize { self.offset }

    /// Number of bytes in the window.
    #[must_use]
    pub const fn len(&self) -> usize { self.length }

    /// Whether the window is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.length == 0 }

    /// The entire underlying buffer, not just the window.
    #[must_use]
    pub fn buffer(&self) -> &Bytes { &self.buffer }

    /// Borrow the bytes inside the window.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] { &self.buffer[self.offset..self.offset + self.length] }

    /// The window as its own `Bytes` handle, sharing storage with the buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes { self.buffer.slice(self.offset..self.offset + self.length) }

    /// Copy the view.
    ///
    /// A view that covers its whole buffer is aliased; a strict sub-range is
    /// copied into a fresh buffer holding exactly the window. Callers must not
    /// rely on which of the two happened.
    #[must_use]
    pub fn copy(&self) -> Self {
        if self.offset == 0 && self.length == self.buffer.len() {
            return self.clone();
        }
        Self::new(Bytes::copy_from_slice(self.as_slice()))
    }

    /// Payload size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize { self.length }

    /// Encoded size: a 4-byte length prefix plus the window.
    #[must_use]
    pub const fn serialized_size(&self) -> usize { INT_SIZE + self.length }

    /// Write `[length:i32][bytes]`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::LengthOverflow`] if the window exceeds `i32::MAX`.
    pub fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        out.write_i32(wire_length(self.length)?);
        out.write_slice(self.as_slice());
        Ok(())
    }

    /// Read a view written by [`write_to`](Self::write_to).
    ///
    /// The result owns a fresh buffer starting at offset zero.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the prefix is negative or the source is
    /// shorter than the prefix claims.
    pub fn read_from(input: &mut dyn WireSource) -> Result<Self, DecodeError> {
        let length = input.read_length()?;
        Ok(Self::new(input.read_bytes(length)?))
    }
}

impl From<Bytes> for ByteView {
    fn from(buffer: Bytes) -> Self { Self::new(buffer) }
}

impl From<Vec<u8>> for ByteView {
    fn from(buffer: Vec<u8>) -> Self { Self::new(buffer) }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 11)]
    #[case(6, 5)]
    #[case(11, 0)]
    fn accepts_windows_inside_the_buffer(#[case] offset: usize, #[case] length: usize) {
        let view = ByteView::slice(b"hello world".to_vec(), offset, length).expect("in bounds");
        assert_eq!(view.offset(), offset);
        assert_eq!(view.len(), length);
    }

    #[rstest]
    #[case(0, 12)]
    #[case(12, 0)]
    #[case(6, 6)]
    #[case(usize::MAX, 2)]
    fn rejects_windows_past_the_end(#[case] offset: usize, #[case] length: usize) {
        let err = ByteView::slice(b"hello world".to_vec(), offset, length)
            .expect_err("window must be rejected");
        assert_eq!(err.capacity, 11);
        assert_eq!(err.offset, offset);
    }

    #[test]
    fn copy_of_full_view_aliases_the_buffer() {
        let view = ByteView::new(vec![1_u8, 2, 3]);
        let copy = view.copy();
        assert_eq!(copy.buffer().as_ptr(), view.buffer().as_ptr());
    }

    #[test]
    fn copy_of_sub_range_holds_only_the_window() {
        let view = ByteView::slice(vec![0_u8, 1, 2, 3, 4, 5], 2, 3).expect("in bounds");
        let copy = view.copy();
        assert_eq!(copy.buffer().as_ref(), &[2, 3, 4]);
        assert_eq!(copy.offset(), 0);
        assert_eq!(copy.len(), 3);
    }

    #[test]
    fn wire_form_writes_only_the_window() {
        let view = ByteView::slice(vec![9_u8, 8, 7, 6], 1, 2).expect("in bounds");
        let mut out = Vec::<u8>::new();
        view.write_to(&mut out).expect("encode view");
        assert_eq!(out, [0, 0, 0, 2, 8, 7]);
        assert_eq!(out.len(), view.serialized_size());

        let decoded = ByteView::read_from(&mut Bytes::from(out)).expect("decode view");
        assert_eq!(decoded.as_slice(), &[8, 7]);
        assert_eq!(decoded.offset(), 0);
    }

    proptest! {
        #[test]
        fn sub_range_copy_matches_source(
            data in proptest::collection::vec(any::<u8>(), 1..64),
            start in 0usize..64,
            len in 0usize..64,
        ) {
            let start = start % data.len();
            let len = len % (data.len() - start + 1);
            let view = ByteView::slice(data.clone(), start, len).expect("in bounds");
            prop_assert_eq!(view.offset(), start);
            prop_assert_eq!(view.len(), len);
            let copy = view.copy();
            prop_assert_eq!(copy.as_slice(), &data[start..start + len]);
        }
    }
}
