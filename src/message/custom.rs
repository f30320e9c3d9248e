use std::{any::Any, fmt::Debug};

use crate::{
    error::{DecodeError, EncodeError},
    registry::Registry,
    wire::{WireSink, WireSource},
};

/// Payload of an application-defined message kind.
///
/// Register a constructor with
/// [`Registry::register_message`](crate::Registry::register_message) so the
/// receiver can rebuild the body from its discriminator.
pub trait CustomBody: Any + Debug + Send + Sync {
    /// Discriminator written ahead of the message; must match the registration.
    fn kind(&self) -> u8;

    /// Number of payload bytes the body carries.
    fn length(&self) -> usize;

    /// Whether the body carries any payload.
    fn has_payload(&self) -> bool { self.length() > 0 }

    /// Exact number of bytes [`write_to`](Self::write_to) emits.
    fn serialized_size(&self) -> usize;

    /// Write the payload.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the payload cannot be represented on the wire.
    fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError>;

    /// Populate a freshly constructed body from `input`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the source is truncated or malformed.
    fn read_from(
        &mut self,
        input: &mut dyn WireSource,
        registry: &Registry,
    ) -> Result<(), DecodeError>;

    /// Copy the body, dropping the payload unless `copy_payload` is set.
    fn copy_body(&self, copy_payload: bool) -> Box<dyn CustomBody>;
}
