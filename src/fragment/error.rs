//! Errors raised while splitting messages.

use thiserror::Error;

use crate::error::EncodeError;

/// Errors produced while fragmenting outbound messages.
#[derive(Debug, Error)]
pub enum FragmentationError {
    /// The original message could not be sized or encoded.
    #[error("failed to encode message: {0}")]
    Encode(#[from] EncodeError),
    /// The message needs more fragments than a `u32` can count.
    #[error("message needs {count} fragments, more than a fragment header can count")]
    TooManyFragments {
        /// Number of windows the planner produced.
        count: usize,
    },
}
