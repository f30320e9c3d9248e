//! Canonical error and result types for the crate.
//!
//! Errors are grouped by when they happen:
//!
//! - construction: [`RangeError`] and [`RegistryError`], raised immediately for bad input;
//! - encoding: [`EncodeError`], raised while writing a message to a sink;
//! - decoding: [`DecodeError`], raised for malformed or incompatible wire data;
//! - programmer errors: [`UnsupportedOperation`], raised by accessors a body cannot serve.
//!
//! [`MessageError`] wraps all of them for callers that do not care which one
//! they got.

use thiserror::Error;

/// A byte range that does not fit inside its buffer.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("range [{offset}, {offset}+{length}) exceeds buffer of {capacity} bytes")]
pub struct RangeError {
    /// Requested start of the range.
    pub offset: usize,
    /// Requested number of bytes.
    pub length: usize,
    /// Size of the buffer the range was checked against.
    pub capacity: usize,
}

/// Failure to register a constructor in a kind table.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The discriminator lies in the range reserved for built-in kinds.
    #[error("{table} kind {kind} must be greater than {threshold}")]
    Reserved {
        /// Table the registration targeted.
        table: &'static str,
        /// Rejected discriminator.
        kind: u16,
        /// Highest reserved discriminator.
        threshold: u16,
    },
    /// Another constructor already owns the discriminator.
    #[error("{table} kind {kind} is already taken")]
    Taken {
        /// Table the registration targeted.
        table: &'static str,
        /// Rejected discriminator.
        kind: u16,
    },
}

/// Errors raised while writing a message or payload.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A length does not fit the signed 32-bit length prefix.
    #[error("length {length} does not fit a 32-bit length prefix")]
    LengthOverflow {
        /// Offending length.
        length: usize,
    },
    /// A composite payload holds more children than its count prefix allows.
    #[error("{count} children do not fit a 16-bit count prefix")]
    CountOverflow {
        /// Number of children.
        count: usize,
    },
    /// A fragment view asked for bytes its original message does not have.
    #[error(
        "fragment window [{offset}, {offset}+{length}) produced only {forwarded} bytes"
    )]
    WindowOutOfRange {
        /// Window start inside the original encoding.
        offset: usize,
        /// Window length.
        length: usize,
        /// Bytes the original actually contributed to the window.
        forwarded: usize,
    },
    /// The opaque form of a serializable object could not be produced.
    #[error("failed to serialize object: {0}")]
    Object(#[from] bincode::error::EncodeError),
}

/// Errors raised while reading a message, header or payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The source ran out of bytes.
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the source.
        remaining: usize,
    },
    /// No constructor is registered for a message discriminator.
    #[error("unknown message kind {kind}")]
    UnknownMessageKind {
        /// Discriminator read from the wire.
        kind: u8,
    },
    /// No constructor is registered for a header kind.
    #[error("unknown header kind {kind}")]
    UnknownHeaderKind {
        /// Kind tag read from the wire.
        kind: u16,
    },
    /// No constructor is registered for a streamable object kind.
    #[error("unknown object kind {kind}")]
    UnknownObjectKind {
        /// Kind tag read from the wire.
        kind: u16,
    },
    /// No constructor is registered for a payload discriminator.
    #[error("unknown payload kind {kind}")]
    UnknownPayloadKind {
        /// Discriminator read from the wire.
        kind: u8,
    },
    /// A length or count prefix is negative where no sentinel is allowed.
    #[error("invalid length prefix {length}")]
    InvalidLength {
        /// Value read from the wire.
        length: i64,
    },
    /// Bytes were left over after a complete message was decoded.
    #[error("{remaining} trailing bytes after a complete message")]
    TrailingBytes {
        /// Unconsumed byte count.
        remaining: usize,
    },
    /// A registered type rejected its own encoding.
    #[error("invalid {what}: {reason}")]
    Invalid {
        /// What was being decoded.
        what: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// The opaque form of a serializable object could not be decoded.
    #[error("failed to deserialize object: {0}")]
    Object(#[from] bincode::error::DecodeError),
}

/// An accessor was called on a body that does not own what it asks for.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("{operation} is not supported by {body} bodies")]
pub struct UnsupportedOperation {
    /// Name of the rejected accessor.
    pub operation: &'static str,
    /// Name of the body variant.
    pub body: &'static str,
}

/// Union of every error the message layer can raise.
#[derive(Debug, Error)]
pub enum MessageError {
    /// See [`RangeError`].
    #[error(transparent)]
    Range(#[from] RangeError),
    /// See [`RegistryError`].
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// See [`EncodeError`].
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// See [`DecodeError`].
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// See [`UnsupportedOperation`].
    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperation),
    /// See [`FragmentationError`](crate::fragment::FragmentationError).
    #[error(transparent)]
    Fragmentation(#[from] crate::fragment::FragmentationError),
}

/// Result alias for APIs that may raise any [`MessageError`].
pub type Result<T> = std::result::Result<T, MessageError>;

/// Convert an in-memory length to the wire's signed 32-bit prefix.
pub(crate) fn wire_length(length: usize) -> std::result::Result<i32, EncodeError> {
    i32::try_from(length).map_err(|_| EncodeError::LengthOverflow { length })
}
