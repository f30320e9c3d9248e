//! Zero-based fragment positions.

use derive_more::{Display, From, Into};

/// Position of a fragment within its original message, starting at zero.
///
/// # Examples
///
/// ```
/// use groupwire::fragment::FragmentIndex;
/// let index = FragmentIndex::new(3);
/// assert_eq!(index.get(), 3);
/// assert_eq!(index.checked_increment(), Some(FragmentIndex::new(4)));
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into,
)]
#[display("{_0}")]
pub struct FragmentIndex(u32);

impl FragmentIndex {
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Index of the first fragment.
    #[must_use]
    pub const fn zero() -> Self { Self(0) }

    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// The next index, or `None` on overflow.
    #[must_use]
    pub fn checked_increment(self) -> Option<Self> { self.0.checked_add(1).map(Self) }
}
