//! Rebuild a message from its ordered fragment windows.

use bytes::Bytes;
use tracing::{debug, warn};

use super::ByteChain;
use crate::{
    error::DecodeError,
    message::{Body, FragmentBody, Message, read_exactly_one},
    registry::Registry,
};

/// Decodes a complete, ordered set of fragment windows as one message.
///
/// Collecting the windows (buffering, ordering, timeouts and retransmission
/// requests) is the caller's job. The assembler only concatenates what it is
/// given and decodes once; any failure aborts the whole message.
#[derive(Clone, Copy, Debug)]
pub struct Assembler<'r> {
    registry: &'r Registry,
}

impl<'r> Assembler<'r> {
    #[must_use]
    pub const fn new(registry: &'r Registry) -> Self { Self { registry } }

    /// Decode the concatenation of `windows`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the bytes do not hold exactly one
    /// well-formed message.
    pub fn assemble<I>(&self, windows: I) -> Result<Message, DecodeError>
    where
        I: IntoIterator<Item = Bytes>,
    {
        let mut chain: ByteChain = windows.into_iter().collect();
        let fragments = chain.chunk_count();
        let total = bytes::Buf::remaining(&chain);
        match read_exactly_one(&mut chain, self.registry) {
            Ok(message) => {
                debug!(fragments, total, kind = message.kind(), "reassembled message");
                Ok(message)
            }
            Err(error) => {
                warn!(fragments, total, %error, "reassembly aborted");
                Err(error)
            }
        }
    }

    /// Decode the payloads of received fragment messages, in order.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Invalid`] if any message is not a received
    /// fragment, or any error from [`assemble`](Self::assemble).
    pub fn assemble_fragments<'m, I>(&self, fragments: I) -> Result<Message, DecodeError>
    where
        I: IntoIterator<Item = &'m Message>,
    {
        let windows = fragments
            .into_iter()
            .map(|fragment| match fragment.body() {
                Body::Fragment(FragmentBody::Received(view)) => Ok(view.to_bytes()),
                other => Err(DecodeError::Invalid {
                    what: "fragment",
                    reason: format!("expected a received fragment, found a {} body", other.name()),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.assemble(windows)
    }
}
