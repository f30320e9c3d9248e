use std::collections::VecDeque;

use super::{Payload, PayloadRegistry};
use crate::{
    error::{DecodeError, EncodeError},
    wire::{BYTE_SIZE, SHORT_SIZE, WireSink, WireSource, check_nesting},
};

/// Ordered list of child payloads.
///
/// Wire form: `[count:u16]` followed by `[kind:u8][payload]` per child.
#[derive(Debug, Default)]
pub struct CompositePayload {
    children: VecDeque<Payload>,
}

impl CompositePayload {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append `child` at the tail.
    pub fn add(&mut self, child: Payload) -> &mut Self {
        self.children.push_back(child);
        self
    }

    /// Insert `child` at the head.
    pub fn add_at_head(&mut self, child: Payload) -> &mut Self {
        self.children.push_front(child);
        self
    }

    /// Remove and return the tail child.
    pub fn remove(&mut self) -> Option<Payload> { self.children.pop_back() }

    /// Remove and return the head child.
    pub fn remove_at_head(&mut self) -> Option<Payload> { self.children.pop_front() }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Payload> { self.children.get(index) }

    #[must_use]
    pub fn len(&self) -> usize { self.children.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.children.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Payload> { self.children.iter() }

    /// Sum of the children's data sizes.
    #[must_use]
    pub fn size(&self) -> usize { self.children.iter().map(Payload::size).sum() }

    #[must_use]
    pub fn serialized_size(&self) -> usize {
        SHORT_SIZE
            + self
                .children
                .iter()
                .map(|child| BYTE_SIZE + child.serialized_size())
                .sum::<usize>()
    }

    pub(crate) fn copy(&self) -> Self { self.children.iter().map(Payload::copy).collect() }

    pub(crate) fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        let count = u16::try_from(self.children.len()).map_err(|_| EncodeError::CountOverflow {
            count: self.children.len(),
        })?;
        out.write_u16(count);
        for child in &self.children {
            child.write_payload(out)?;
        }
        Ok(())
    }

    pub(crate) fn read_from(
        &mut self,
        input: &mut dyn WireSource,
        registry: &PayloadRegistry,
        depth: usize,
    ) -> Result<(), DecodeError> {
        check_nesting(depth)?;
        let count = input.read_u16()?;
        let mut children = VecDeque::new();
        for _ in 0..count {
            children.push_back(Payload::read_payload(input, registry, depth + 1)?);
        }
        self.children = children;
        Ok(())
    }
}

impl FromIterator<Payload> for CompositePayload {
    fn from_iter<I: IntoIterator<Item = Payload>>(iter: I) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CompositePayload {
    type Item = &'a Payload;
    type IntoIter = std::collections::vec_deque::Iter<'a, Payload>;

    fn into_iter(self) -> Self::IntoIter { self.children.iter() }
}

impl IntoIterator for CompositePayload {
    type Item = Payload;
    type IntoIter = std::collections::vec_deque::IntoIter<Payload>;

    fn into_iter(self) -> Self::IntoIter { self.children.into_iter() }
}
