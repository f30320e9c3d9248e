use std::{any::Any, sync::Arc};

use super::{Header, HeaderId};
use crate::{
    error::{DecodeError, EncodeError},
    registry::Registry,
    wire::{INT_SIZE, SHORT_SIZE, WireSink, WireSource},
};

/// Insertion-ordered map from [`HeaderId`] to shared header values.
///
/// The map is a short vector: messages carry a handful of headers and
/// a linear scan beats hashing at that size. Cloning (or [`copy`](Self::copy))
/// duplicates the entries but shares the header values.
#[derive(Clone, Debug, Default)]
pub struct HeaderMap {
    entries: Vec<(HeaderId, Arc<dyn Header>)>,
}

impl HeaderMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Insert `header` under `id`, returning the value it replaced.
    ///
    /// A replaced entry keeps its position; new ids are appended.
    pub fn put(&mut self, id: HeaderId, header: Arc<dyn Header>) -> Option<Arc<dyn Header>> {
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| *key == id) {
            return Some(std::mem::replace(&mut slot.1, header));
        }
        self.entries.push((id, header));
        None
    }

    /// Borrow the header stored under `id`.
    #[must_use]
    pub fn get(&self, id: HeaderId) -> Option<&Arc<dyn Header>> {
        self.entries
            .iter()
            .find_map(|(key, header)| (*key == id).then_some(header))
    }

    /// Borrow the header under `id` as a concrete type.
    #[must_use]
    pub fn get_as<T: Header>(&self, id: HeaderId) -> Option<&T> {
        let header: &dyn Any = &**self.get(id)?;
        header.downcast_ref::<T>()
    }

    /// Remove and return the header under `id`.
    pub fn remove(&mut self, id: HeaderId) -> Option<Arc<dyn Header>> {
        let position = self.entries.iter().position(|(key, _)| *key == id)?;
        Some(self.entries.remove(position).1)
    }

    /// Whether a header is stored under `id`.
    #[must_use]
    pub fn contains(&self, id: HeaderId) -> bool { self.get(id).is_some() }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether the map holds no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Header ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = HeaderId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (HeaderId, &Arc<dyn Header>)> + '_ {
        self.entries.iter().map(|(id, header)| (*id, header))
    }

    /// Shallow copy: a new map whose values alias this map's headers.
    #[must_use]
    pub fn copy(&self) -> Self { self.clone() }

    /// Shallow copy of only the headers whose id is at least `starting_id`.
    #[must_use]
    pub fn copy_from(&self, starting_id: HeaderId) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(id, _)| *id >= starting_id)
                .cloned()
                .collect(),
        }
    }

    /// Encoded size of the header block, leaving out `excluded` ids.
    #[must_use]
    pub fn serialized_size(&self, excluded: &[HeaderId]) -> usize {
        INT_SIZE
            + self
                .retained(excluded)
                .map(|(_, header)| SHORT_SIZE + SHORT_SIZE + header.serialized_size())
                .sum::<usize>()
    }

    /// Write `[count:u32]` then `(id:u16, kind:u16, header bytes)` per header,
    /// leaving out `excluded` ids.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::LengthOverflow`] if the header count does not
    /// fit the prefix.
    pub fn write_to(
        &self,
        out: &mut dyn WireSink,
        excluded: &[HeaderId],
    ) -> Result<(), EncodeError> {
        let count = self.retained(excluded).count();
        let count = u32::try_from(count).map_err(|_| EncodeError::LengthOverflow { length: count })?;
        out.write_u32(count);
        for (id, header) in self.retained(excluded) {
            out.write_u16(id.get());
            out.write_u16(header.kind());
            header.write_to(out);
        }
        Ok(())
    }

    /// Read a header block written by [`write_to`](Self::write_to).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownHeaderKind`] if any header kind is not
    /// registered, or any error raised by a header's own decoder.
    pub fn read_from(input: &mut dyn WireSource, registry: &Registry) -> Result<Self, DecodeError> {
        let count = input.read_u32()?;
        let mut map = Self::new();
        for _ in 0..count {
            let id = HeaderId::new(input.read_u16()?);
            let mut header = registry.create_header(input.read_u16()?)?;
            header.read_from(input)?;
            map.put(id, Arc::from(header));
        }
        Ok(map)
    }

    fn retained<'a>(
        &'a self,
        excluded: &'a [HeaderId],
    ) -> impl Iterator<Item = &'a (HeaderId, Arc<dyn Header>)> + 'a {
        self.entries.iter().filter(move |(id, _)| !excluded.contains(id))
    }
}
