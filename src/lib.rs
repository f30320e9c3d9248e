#![doc(html_root_url = "https://docs.rs/groupwire/latest")]
//! Public API for the `groupwire` library.
//!
//! This crate provides the message model of a group-communication stack:
//! the envelope members exchange, its payload variants and their binary
//! encoding, per-layer headers, constructor registries for decoding, and
//! streaming fragmentation of oversized messages.
//!
//! # Examples
//!
//! ```
//! use groupwire::{Address, Flag, Message, Registry};
//!
//! let message = Message::bytes(b"hello".to_vec())
//!     .with_dest(Address::new(2))
//!     .with_flag(Flag::Oob);
//! let wire = message.encode().expect("encode message");
//!
//! let decoded = Message::decode(wire, Registry::global()).expect("decode message");
//! assert_eq!(decoded.dest(), Some(Address::new(2)));
//! assert!(decoded.is_flag_set(Flag::Oob));
//! ```

pub mod address;
pub mod byte_order;
pub mod error;
pub mod fragment;
pub mod header;
pub mod message;
pub mod payload;
pub mod registry;
pub mod streamable;
pub mod view;
pub mod wire;

#[cfg(test)]
mod test_helpers;

pub use address::Address;
pub use error::{
    DecodeError,
    EncodeError,
    MessageError,
    RangeError,
    RegistryError,
    Result,
    UnsupportedOperation,
};
pub use fragment::{
    Assembler,
    FragHeader,
    FragmentBatch,
    FragmentationConfig,
    FragmentationError,
    Fragmenter,
    PartialRangeFilter,
    compute_windows,
};
pub use header::{Header, HeaderId, HeaderMap};
pub use message::{Body, CustomBody, Flag, Flags, Message, MessageKind, TransientFlag, TransientFlags};
pub use payload::{CompositePayload, CustomPayload, Payload, PayloadRegistry};
pub use registry::{RESERVED_KIND_THRESHOLD, Registry};
pub use streamable::Streamable;
pub use view::ByteView;
pub use wire::{MAX_NESTING, WireSink, WireSource};
