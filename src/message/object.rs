use std::{any::Any, sync::Arc};

use crate::{
    error::DecodeError,
    registry::Registry,
    streamable::Streamable,
    wire::{BYTE_SIZE, SHORT_SIZE, WireSink, WireSource},
};

/// Body carrying a size-aware [`Streamable`] object.
///
/// Wire form: `[present:u8]` then `[kind:u16][object bytes]`. The receiver
/// needs a constructor for `kind` in its [`Registry`]. The object is shared
/// between copies and must not be mutated after it is attached.
#[derive(Clone, Debug, Default)]
pub struct ObjectBody {
    object: Option<Arc<dyn Streamable>>,
}

impl ObjectBody {
    #[must_use]
    pub fn new(object: Arc<dyn Streamable>) -> Self { Self { object: Some(object) } }

    #[must_use]
    pub fn object(&self) -> Option<&Arc<dyn Streamable>> { self.object.as_ref() }

    /// Borrow the object as a concrete type.
    #[must_use]
    pub fn object_as<T: Streamable>(&self) -> Option<&T> {
        let object: &dyn Any = self.object.as_deref()?;
        object.downcast_ref::<T>()
    }

    pub fn set_object(&mut self, object: Option<Arc<dyn Streamable>>) { self.object = object; }

    /// Encoded size of the object alone.
    #[must_use]
    pub fn length(&self) -> usize { self.object.as_ref().map_or(0, |object| object.serialized_size()) }

    pub(crate) fn serialized_size(&self) -> usize {
        BYTE_SIZE + self.object.as_ref().map_or(0, |object| SHORT_SIZE + object.serialized_size())
    }

    pub(crate) fn write_to(&self, out: &mut dyn WireSink) {
        out.write_bool(self.object.is_some());
        if let Some(object) = &self.object {
            out.write_u16(object.kind());
            object.write_to(out);
        }
    }

    pub(crate) fn read_from(
        &mut self,
        input: &mut dyn WireSource,
        registry: &Registry,
    ) -> Result<(), DecodeError> {
        if input.read_bool()? {
            self.object = Some(read_streamable(input, registry)?);
        }
        Ok(())
    }

    pub(crate) fn copy(&self, copy_payload: bool) -> Self {
        Self {
            object: self.object.clone().filter(|_| copy_payload),
        }
    }
}

/// Read `[kind:u16][object bytes]` into a freshly constructed object.
pub(crate) fn read_streamable(
    input: &mut dyn WireSource,
    registry: &Registry,
) -> Result<Arc<dyn Streamable>, DecodeError> {
    let mut object = registry.create_object(input.read_u16()?)?;
    object.read_from(input)?;
    Ok(Arc::from(object))
}
