//! Sequential byte sink and source used by every encoder and decoder.
//!
//! The message layer never touches sockets. It writes into a [`WireSink`] and
//! reads from a [`WireSource`]; transports, fragment filters and test buffers
//! plug in behind these two traits. Both traits are object safe so encoders
//! can take `&mut dyn WireSink` and stack decorators such as
//! [`PartialRangeFilter`](crate::fragment::PartialRangeFilter) without
//! generic recursion.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    byte_order::{
        read_network_i32,
        read_network_u16,
        read_network_u32,
        read_network_u64,
        read_network_u128,
        write_network_i32,
        write_network_u16,
        write_network_u32,
        write_network_u64,
        write_network_u128,
    },
    error::DecodeError,
};

/// Encoded width of a boolean or single byte.
pub const BYTE_SIZE: usize = 1;
/// Encoded width of a 16-bit integer.
pub const SHORT_SIZE: usize = 2;
/// Encoded width of a 32-bit integer.
pub const INT_SIZE: usize = 4;
/// Encoded width of a 64-bit integer.
pub const LONG_SIZE: usize = 8;

/// Deepest composite nesting a decoder accepts.
///
/// Applies to composite messages and composite payloads alike; the
/// outermost composite sits at depth 0.
pub const MAX_NESTING: usize = 64;

/// Fail with [`DecodeError::Invalid`] once `depth` composites are open.
pub(crate) fn check_nesting(depth: usize) -> Result<(), DecodeError> {
    if depth >= MAX_NESTING {
        return Err(DecodeError::Invalid {
            what: "composite",
            reason: format!("nested deeper than {MAX_NESTING} levels"),
        });
    }
    Ok(())
}

/// Ordered byte sink.
///
/// Implementors provide the two raw operations; integer and boolean writers
/// are derived from them in network byte order.
pub trait WireSink {
    /// Append a single byte.
    fn write_u8(&mut self, byte: u8);

    /// Append a run of bytes.
    fn write_slice(&mut self, src: &[u8]);

    /// Append a boolean as one byte (`1` or `0`).
    fn write_bool(&mut self, value: bool) { self.write_u8(u8::from(value)); }

    /// Append a big-endian `u16`.
    fn write_u16(&mut self, value: u16) { self.write_slice(&write_network_u16(value)); }

    /// Append a big-endian `i32`.
    fn write_i32(&mut self, value: i32) { self.write_slice(&write_network_i32(value)); }

    /// Append a big-endian `u32`.
    fn write_u32(&mut self, value: u32) { self.write_slice(&write_network_u32(value)); }

    /// Append a big-endian `u64`.
    fn write_u64(&mut self, value: u64) { self.write_slice(&write_network_u64(value)); }

    /// Append a big-endian `u128`.
    fn write_u128(&mut self, value: u128) { self.write_slice(&write_network_u128(value)); }
}

impl WireSink for Vec<u8> {
    fn write_u8(&mut self, byte: u8) { self.push(byte); }

    fn write_slice(&mut self, src: &[u8]) { self.extend_from_slice(src); }
}

impl WireSink for BytesMut {
    fn write_u8(&mut self, byte: u8) { BufMut::put_u8(self, byte); }

    fn write_slice(&mut self, src: &[u8]) { self.extend_from_slice(src); }
}

impl<S: WireSink + ?Sized> WireSink for &mut S {
    fn write_u8(&mut self, byte: u8) { (**self).write_u8(byte); }

    fn write_slice(&mut self, src: &[u8]) { (**self).write_slice(src); }
}

/// Ordered byte source with checked reads.
///
/// Every read fails with [`DecodeError::Truncated`] instead of panicking
/// when the source runs dry. The trait is implemented for every
/// [`bytes::Buf`], so `Bytes`, `&[u8]` and chained fragment windows all work.
pub trait WireSource {
    /// Bytes left to read.
    fn available(&self) -> usize;

    /// Fill `dst` completely or fail without consuming anything.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than `dst.len()` bytes remain.
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), DecodeError>;

    /// Take the next `len` bytes as an owned buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than `len` bytes remain.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes, DecodeError>;

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] on an empty source.
    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    /// Read a boolean; any non-zero byte is `true`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] on an empty source.
    fn read_bool(&mut self) -> Result<bool, DecodeError> { Ok(self.read_u8()? != 0) }

    /// Read a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than two bytes remain.
    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let mut raw = [0u8; 2];
        self.read_exact(&mut raw)?;
        Ok(read_network_u16(raw))
    }

    /// Read a big-endian `i32`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than four bytes remain.
    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let mut raw = [0u8; 4];
        self.read_exact(&mut raw)?;
        Ok(read_network_i32(raw))
    }

    /// Read a big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than four bytes remain.
    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let mut raw = [0u8; 4];
        self.read_exact(&mut raw)?;
        Ok(read_network_u32(raw))
    }

    /// Read a big-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than eight bytes remain.
    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let mut raw = [0u8; 8];
        self.read_exact(&mut raw)?;
        Ok(read_network_u64(raw))
    }

    /// Read a big-endian `u128`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] when fewer than sixteen bytes remain.
    fn read_u128(&mut self) -> Result<u128, DecodeError> {
        let mut raw = [0u8; 16];
        self.read_exact(&mut raw)?;
        Ok(read_network_u128(raw))
    }

    /// Read a signed 32-bit length prefix where `-1` means "absent".
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidLength`] for values below `-1`, or
    /// [`DecodeError::Truncated`] when the prefix is cut short.
    fn read_optional_length(&mut self) -> Result<Option<usize>, DecodeError> {
        match self.read_i32()? {
            -1 => Ok(None),
            len => usize::try_from(len)
                .map(Some)
                .map_err(|_| DecodeError::InvalidLength { length: i64::from(len) }),
        }
    }

    /// Read a signed 32-bit length prefix that must not be negative.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidLength`] for negative values, or
    /// [`DecodeError::Truncated`] when the prefix is cut short.
    fn read_length(&mut self) -> Result<usize, DecodeError> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| DecodeError::InvalidLength { length: i64::from(len) })
    }
}

impl<B: Buf> WireSource for B {
    fn available(&self) -> usize { Buf::remaining(self) }

    fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), DecodeError> {
        ensure_remaining(Buf::remaining(self), dst.len())?;
        self.copy_to_slice(dst);
        Ok(())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, DecodeError> {
        ensure_remaining(Buf::remaining(self), len)?;
        Ok(self.copy_to_bytes(len))
    }
}

fn ensure_remaining(remaining: usize, needed: usize) -> Result<(), DecodeError> {
    if remaining < needed {
        return Err(DecodeError::Truncated { needed, remaining });
    }
    Ok(())
}
