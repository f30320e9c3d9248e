use std::collections::VecDeque;

use super::Message;
use crate::{
    error::{DecodeError, EncodeError, wire_length},
    registry::Registry,
    wire::{BYTE_SIZE, INT_SIZE, WireSink, WireSource, check_nesting},
};

/// Ordered sequence of child messages sent as one unit.
///
/// Wire form: `[count:i32]` then `[kind:u8][envelope][payload]` per child.
#[derive(Debug, Default)]
pub struct CompositeBody {
    children: VecDeque<Message>,
}

impl CompositeBody {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append `message` at the tail.
    pub fn add(&mut self, message: Message) -> &mut Self {
        self.children.push_back(message);
        self
    }

    /// Insert `message` at the head.
    pub fn add_at_head(&mut self, message: Message) -> &mut Self {
        self.children.push_front(message);
        self
    }

    /// Remove the tail message.
    pub fn remove(&mut self) -> Option<Message> { self.children.pop_back() }

    /// Remove the head message.
    pub fn remove_at_head(&mut self) -> Option<Message> { self.children.pop_front() }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Message> { self.children.get(index) }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Message> { self.children.get_mut(index) }

    /// Number of child messages.
    #[must_use]
    pub fn len(&self) -> usize { self.children.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.children.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Message> + '_ { self.children.iter() }

    /// Sum of the children's payload lengths.
    ///
    /// # Errors
    ///
    /// Propagates the first child's length error.
    pub fn length(&self) -> Result<usize, EncodeError> {
        self.children.iter().map(Message::length).sum()
    }

    pub(crate) fn serialized_size(&self) -> Result<usize, EncodeError> {
        self.children.iter().try_fold(INT_SIZE, |size, child| {
            Ok(size + BYTE_SIZE + child.serialized_size()?)
        })
    }

    pub(crate) fn write_to(&self, out: &mut dyn WireSink) -> Result<(), EncodeError> {
        out.write_i32(wire_length(self.children.len())?);
        self.children
            .iter()
            .try_for_each(|child| child.write_message(out))
    }

    pub(crate) fn read_from(
        &mut self,
        input: &mut dyn WireSource,
        registry: &Registry,
        depth: usize,
    ) -> Result<(), DecodeError> {
        check_nesting(depth)?;
        let count = input.read_length()?;
        let mut children = VecDeque::new();
        for _ in 0..count {
            children.push_back(Message::read_message_nested(input, registry, depth + 1)?);
        }
        self.children = children;
        Ok(())
    }

    /// Deep copy: every child is copied with its payload and headers.
    pub(crate) fn copy(&self, copy_payload: bool) -> Self {
        if !copy_payload {
            return Self::default();
        }
        self.children
            .iter()
            .map(|child| child.copy(true, true))
            .collect()
    }
}

impl FromIterator<Message> for CompositeBody {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CompositeBody {
    type Item = Message;
    type IntoIter = std::collections::vec_deque::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter { self.children.into_iter() }
}

impl<'a> IntoIterator for &'a CompositeBody {
    type Item = &'a Message;
    type IntoIter = std::collections::vec_deque::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter { self.children.iter() }
}
