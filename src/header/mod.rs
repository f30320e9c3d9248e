//! Per-layer metadata attached to messages.
//!
//! Each protocol layer owns a [`HeaderId`] and stores at most one [`Header`]
//! under it. Headers travel in the message envelope as
//! `(id, kind, header bytes)` triples; the kind selects the decoder.

mod map;

use derive_more::{Display, From, Into};
pub use map::HeaderMap;

use crate::streamable::Streamable;

/// Identifier of the protocol layer that owns a header.
///
/// # Examples
///
/// ```
/// use groupwire::HeaderId;
/// let id = HeaderId::new(36);
/// assert_eq!(id.get(), 36);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct HeaderId(u16);

impl HeaderId {
    /// Wrap a raw layer identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the raw layer identifier.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }
}

/// Metadata record stored in a [`HeaderMap`].
///
/// Header values are shared between copies of a message, so an
/// implementation should never be mutated after it is inserted; replace it
/// with a fresh value instead.
pub trait Header: Streamable {}
