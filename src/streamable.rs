//! Self-describing values with their own binary encoding.
//!
//! Headers and size-aware message objects implement [`Streamable`]. The
//! [`kind`](Streamable::kind) tag is written ahead of the value so the
//! receiver can look up a zero-argument constructor in the
//! [`Registry`](crate::Registry) and let the fresh instance read itself.

use std::{any::Any, fmt::Debug};

use crate::{
    error::DecodeError,
    wire::{WireSink, WireSource},
};

/// A value that knows its exact encoded size and how to read and write itself.
///
/// Implementations must keep `serialized_size` equal to the number of bytes
/// `write_to` produces; fragment planning and length prefixes rely on it.
///
/// # Examples
///
/// ```
/// use groupwire::{DecodeError, Streamable, WireSink, WireSource};
///
/// #[derive(Debug, Default)]
/// struct Counter(u32);
///
/// impl Streamable for Counter {
///     fn kind(&self) -> u16 { 1000 }
///
///     fn serialized_size(&self) -> usize { 4 }
///
///     fn write_to(&self, out: &mut dyn WireSink) { out.write_u32(self.0); }
///
///     fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError> {
///         self.0 = input.read_u32()?;
///         Ok(())
///     }
/// }
/// ```
pub trait Streamable: Any + Debug + Send + Sync {
    /// Stable tag selecting the decoder on the receiving side.
    fn kind(&self) -> u16;

    /// Exact number of bytes [`write_to`](Self::write_to) emits.
    fn serialized_size(&self) -> usize;

    /// Write the value's fields.
    fn write_to(&self, out: &mut dyn WireSink);

    /// Populate a freshly constructed instance from `input`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the source is truncated or malformed.
    fn read_from(&mut self, input: &mut dyn WireSource) -> Result<(), DecodeError>;
}
