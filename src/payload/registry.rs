use std::{fmt, sync::Arc};

use dashmap::DashMap;

use super::{BYTE_ARRAY, COMPOSITE, CompositePayload, CustomPayload, Payload};
use crate::{
    error::{DecodeError, RegistryError},
    registry::{RESERVED_KIND_THRESHOLD, insert_vacant, lookup},
    view::ByteView,
};

type PayloadConstructor = Arc<dyn Fn() -> Payload + Send + Sync>;

/// Constructor table for payload kinds.
///
/// Byte-array and composite payloads are always present; custom kinds must
/// be greater than [`RESERVED_KIND_THRESHOLD`] and unique.
pub struct PayloadRegistry {
    payloads: DashMap<u8, PayloadConstructor>,
}

impl PayloadRegistry {
    #[must_use]
    pub fn new() -> Self {
        let payloads: DashMap<u8, PayloadConstructor> = DashMap::new();
        payloads.insert(BYTE_ARRAY, Arc::new(|| Payload::ByteArray(ByteView::default())));
        payloads.insert(COMPOSITE, Arc::new(|| Payload::Composite(CompositePayload::new())));
        Self { payloads }
    }

    /// Register a custom payload kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Reserved`] when `kind` is not greater than
    /// [`RESERVED_KIND_THRESHOLD`], or [`RegistryError::Taken`] when another
    /// constructor already owns it.
    pub fn register<F, P>(&self, kind: u8, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: CustomPayload,
    {
        if kind <= RESERVED_KIND_THRESHOLD {
            return Err(RegistryError::Reserved {
                table: "payload",
                kind: u16::from(kind),
                threshold: u16::from(RESERVED_KIND_THRESHOLD),
            });
        }
        let constructor: PayloadConstructor =
            Arc::new(move || Payload::Custom(Box::new(constructor())));
        insert_vacant(&self.payloads, "payload", kind, u16::from(kind), constructor)
    }

    #[must_use]
    pub fn contains(&self, kind: u8) -> bool { self.payloads.contains_key(&kind) }

    /// Construct an empty payload for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownPayloadKind`] when nothing is registered.
    pub fn create(&self, kind: u8) -> Result<Payload, DecodeError> {
        let constructor =
            lookup(&self.payloads, kind).ok_or(DecodeError::UnknownPayloadKind { kind })?;
        Ok(constructor())
    }
}

impl Default for PayloadRegistry {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for PayloadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadRegistry")
            .field("payloads", &self.payloads.len())
            .finish()
    }
}
