use derive_more::{Display, From, Into};

/// Identifier shared by every fragment of one original message.
///
/// # Examples
///
/// ```
/// use groupwire::fragment::MessageId;
/// let id = MessageId::new(42);
/// assert_eq!(id.get(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct MessageId(u64);

impl MessageId {
    #[must_use]
    pub const fn new(value: u64) -> Self { Self(value) }

    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}
