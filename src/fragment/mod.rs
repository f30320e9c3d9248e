//! Streaming fragmentation and reassembly of encoded messages.
//!
//! A sender plans byte windows over the full encoding of a message with
//! [`compute_windows`] and wraps each window in a fragment message. Writing
//! a fragment replays the original's encoder through a
//! [`PartialRangeFilter`], so the full encoding never exists in memory. The
//! receiver hands the ordered windows to an [`Assembler`], which decodes
//! them as one message.

mod assembler;
mod chain;
pub mod config;
pub mod error;
mod fragmenter;
mod header;
mod id;
mod index;
mod partial;
mod planner;

pub use assembler::Assembler;
pub use chain::ByteChain;
pub use config::{DEFAULT_FRAG_HEADER_ID, DEFAULT_FRAG_SIZE, FRAGMENT_OVERHEAD, FragmentationConfig};
pub use error::FragmentationError;
pub use fragmenter::{FragmentBatch, Fragmenter};
pub use header::{FRAG_HEADER_KIND, FragHeader};
pub use id::MessageId;
pub use index::FragmentIndex;
pub use partial::PartialRangeFilter;
pub use planner::{FragmentWindow, compute_windows};
