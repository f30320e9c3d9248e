//! Opaque member identity carried in message envelopes.

use std::fmt;

use derive_more::{From, Into};

use crate::{
    error::DecodeError,
    wire::{BYTE_SIZE, WireSink, WireSource},
};

/// Identity of a cluster member.
///
/// The message layer only compares, hashes and serialises addresses; how
/// they are allocated belongs to the membership service.
///
/// # Examples
///
/// ```
/// use groupwire::Address;
/// let a = Address::new(0x2a);
/// assert_eq!(a.get(), 0x2a);
/// assert_eq!(a.to_string(), "0000000000000000000000000000002a");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into)]
pub struct Address(u128);

impl Address {
    /// Encoded width of an address without its presence byte.
    pub const SERIALIZED_SIZE: usize = 16;

    /// Wrap a raw identity value.
    #[must_use]
    pub const fn new(value: u128) -> Self { Self(value) }

    /// Return the raw identity value.
    #[must_use]
    pub const fn get(self) -> u128 { self.0 }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:032x}", self.0) }
}

/// Encoded size of an optional address including its presence byte.
#[must_use]
pub fn optional_size(address: Option<&Address>) -> usize {
    BYTE_SIZE + address.map_or(0, |_| Address::SERIALIZED_SIZE)
}

/// Write a presence byte followed by the address when present.
pub fn write_optional(address: Option<&Address>, out: &mut dyn WireSink) {
    out.write_bool(address.is_some());
    if let Some(address) = address {
        out.write_u128(address.get());
    }
}

/// Read an address written by [`write_optional`].
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if the source ends early.
pub fn read_optional(input: &mut dyn WireSource) -> Result<Option<Address>, DecodeError> {
    if !input.read_bool()? {
        return Ok(None);
    }
    Ok(Some(Address::new(input.read_u128()?)))
}
