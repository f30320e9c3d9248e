//! Streaming window over a sequence of writes.
//!
//! [`PartialRangeFilter`] sits between an encoder and a real sink. It keeps
//! a virtual cursor that advances by the full size of every write and
//! forwards only the bytes that land inside its window, so one window of an
//! encoding can be produced without building the whole encoding in memory.

use crate::wire::WireSink;

/// Forwards the bytes of a write sequence that fall in `[offset, offset + length)`.
///
/// Writes straddling either edge of the window are clipped, so callers need
/// not align their writes to the window.
///
/// # Examples
///
/// ```
/// use groupwire::{WireSink, fragment::PartialRangeFilter};
///
/// let mut out = Vec::<u8>::new();
/// let mut filter = PartialRangeFilter::new(&mut out, 3, 4);
/// filter.write_slice(b"abcde");
/// filter.write_slice(b"fghij");
/// assert_eq!(filter.forwarded(), 4);
/// assert_eq!(filter.position(), 10);
/// assert_eq!(out, b"defg");
/// ```
pub struct PartialRangeFilter<'a> {
    sink: &'a mut dyn WireSink,
    offset: usize,
    end: usize,
    position: usize,
    forwarded: usize,
}

impl<'a> PartialRangeFilter<'a> {
    /// Wrap `sink`, forwarding only `length` bytes starting at `offset`.
    #[must_use]
    pub fn new(sink: &'a mut dyn WireSink, offset: usize, length: usize) -> Self {
        Self {
            sink,
            offset,
            end: offset.saturating_add(length),
            position: 0,
            forwarded: 0,
        }
    }

    /// Total bytes written so far, forwarded or not.
    #[must_use]
    pub const fn position(&self) -> usize { self.position }

    /// Bytes passed through to the wrapped sink.
    #[must_use]
    pub const fn forwarded(&self) -> usize { self.forwarded }
}

impl WireSink for PartialRangeFilter<'_> {
    fn write_u8(&mut self, byte: u8) {
        if (self.offset..self.end).contains(&self.position) {
            self.sink.write_u8(byte);
            self.forwarded += 1;
        }
        self.position = self.position.saturating_add(1);
    }

    fn write_slice(&mut self, src: &[u8]) {
        let start = self.position;
        self.position = start.saturating_add(src.len());
        if start >= self.end {
            return;
        }
        let skip = self.offset.saturating_sub(start);
        if skip >= src.len() {
            return;
        }
        let take = (src.len() - skip).min(self.end - (start + skip));
        if take == 0 {
            return;
        }
        self.sink.write_slice(&src[skip..skip + take]);
        self.forwarded += take;
    }
}
