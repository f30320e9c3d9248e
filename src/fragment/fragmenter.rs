//! Outbound helper that splits messages into fragment views.
//!
//! [`Fragmenter`] plans windows over the original's encoding and wraps each
//! in a fragment message tagged with a [`FragHeader`]. The fragments share
//! the original through an `Arc` and copy nothing until they are written.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tracing::debug;

use super::{
    FragHeader,
    FragmentIndex,
    FragmentationConfig,
    FragmentationError,
    MessageId,
    compute_windows,
};
use crate::{message::Message, wire::BYTE_SIZE};

/// Splits oversized messages into fragment messages.
#[derive(Debug)]
pub struct Fragmenter {
    config: FragmentationConfig,
    next_message_id: AtomicU64,
}

impl Fragmenter {
    #[must_use]
    pub const fn new(config: FragmentationConfig) -> Self {
        Self::with_starting_id(config, MessageId::new(0))
    }

    /// Create a fragmenter whose first batch uses `start_at`.
    #[must_use]
    pub const fn with_starting_id(config: FragmentationConfig, start_at: MessageId) -> Self {
        Self {
            config,
            next_message_id: AtomicU64::new(start_at.get()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &FragmentationConfig { &self.config }

    /// Allocate the next [`MessageId`]. Identifiers wrap after `u64::MAX`.
    #[must_use]
    pub fn next_message_id(&self) -> MessageId {
        MessageId::new(self.next_message_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Whether the full encoding of `message` exceeds one window.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::Encode`] if the message cannot be sized.
    pub fn needs_fragmentation(&self, message: &Message) -> Result<bool, FragmentationError> {
        Ok(encoded_length(message)? > self.config.frag_size.get())
    }

    /// Split `original` into fragment messages under a fresh [`MessageId`].
    ///
    /// Every fragment carries the original's addresses and flags plus a
    /// [`FragHeader`] under the configured header id. A message that fits
    /// one window still yields a single-fragment batch.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::Encode`] if the original cannot be
    /// sized, or [`FragmentationError::TooManyFragments`] if the fragment
    /// count does not fit the header.
    pub fn fragment_message(
        &self,
        original: Arc<Message>,
    ) -> Result<FragmentBatch, FragmentationError> {
        let total = encoded_length(&original)?;
        let windows = compute_windows(0, total, self.config.frag_size);
        let num_frags = u32::try_from(windows.len())
            .map_err(|_| FragmentationError::TooManyFragments { count: windows.len() })?;
        let message_id = self.next_message_id();

        let mut fragments = Vec::with_capacity(windows.len());
        let mut frag_id = FragmentIndex::zero();
        for window in &windows {
            let header = FragHeader::new(message_id, frag_id, num_frags, true);
            let mut fragment =
                Message::fragment(Arc::clone(&original), window.offset(), window.len())
                    .with_header(self.config.header_id, Arc::new(header));
            fragment.set_dest(original.dest());
            fragment.set_src(original.src());
            fragment.set_flags(original.flags());
            fragments.push(fragment);
            frag_id = frag_id
                .checked_increment()
                .ok_or(FragmentationError::TooManyFragments { count: windows.len() })?;
        }

        debug!(
            message_id = message_id.get(),
            total,
            fragments = num_frags,
            "fragmented message"
        );
        Ok(FragmentBatch::new(message_id, fragments))
    }
}

impl Default for Fragmenter {
    fn default() -> Self { Self::new(FragmentationConfig::default()) }
}

/// Length of the kind byte plus envelope and payload.
fn encoded_length(message: &Message) -> Result<usize, FragmentationError> {
    Ok(BYTE_SIZE + message.serialized_size()?)
}

/// Fragments produced for one original message.
#[derive(Debug)]
pub struct FragmentBatch {
    message_id: MessageId,
    fragments: Vec<Message>,
}

impl FragmentBatch {
    fn new(message_id: MessageId, fragments: Vec<Message>) -> Self {
        debug_assert!(!fragments.is_empty(), "fragment batches must not be empty");
        Self {
            message_id,
            fragments,
        }
    }

    /// Identifier shared by all fragments.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    #[must_use]
    pub fn fragments(&self) -> &[Message] { self.fragments.as_slice() }

    /// Number of fragments in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "every encoding has at least its kind byte, so batches are never empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.fragments.len() }

    /// Whether the original needed more than one fragment.
    #[must_use]
    pub fn is_fragmented(&self) -> bool { self.len() > 1 }

    #[must_use]
    pub fn into_fragments(self) -> Vec<Message> { self.fragments }
}

impl IntoIterator for FragmentBatch {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter { self.fragments.into_iter() }
}
