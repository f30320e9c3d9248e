//! Settings for splitting oversized messages.

use std::num::NonZeroUsize;

use super::FragHeader;
use crate::{
    address::Address,
    header::HeaderId,
    wire::{BYTE_SIZE, INT_SIZE, SHORT_SIZE},
};

/// Default largest fragment window, in bytes.
pub const DEFAULT_FRAG_SIZE: usize = 60_000;

/// Default header id under which fragment headers are stored.
pub const DEFAULT_FRAG_HEADER_ID: HeaderId = HeaderId::new(36);

/// Bytes a fragment message adds around its window: kind byte, envelope
/// with both addresses, one fragment header and the window's length prefix.
pub const FRAGMENT_OVERHEAD: usize = BYTE_SIZE
    + SHORT_SIZE
    + BYTE_SIZE
    + 2 * (BYTE_SIZE + Address::SERIALIZED_SIZE)
    + INT_SIZE
    + SHORT_SIZE
    + SHORT_SIZE
    + FragHeader::SERIALIZED_SIZE
    + INT_SIZE;

/// Room left for headers that other layers attach to each fragment.
const ENVELOPE_GUARD_BYTES: usize = 32;

/// Controls the size of fragment windows and where their header lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentationConfig {
    /// Largest window of the original encoding carried by one fragment.
    pub frag_size: NonZeroUsize,
    /// Header id under which each fragment's [`FragHeader`] is stored.
    pub header_id: HeaderId,
}

impl FragmentationConfig {
    #[must_use]
    pub const fn new(frag_size: NonZeroUsize, header_id: HeaderId) -> Self {
        Self {
            frag_size,
            header_id,
        }
    }

    /// Derive a configuration whose encoded fragments fit `frame_budget`.
    ///
    /// The fixed [`FRAGMENT_OVERHEAD`] and a guard for foreign headers are
    /// subtracted from the budget. Returns `None` when nothing is left for
    /// the window itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use groupwire::{HeaderId, fragment::{FRAGMENT_OVERHEAD, FragmentationConfig}};
    /// let config = FragmentationConfig::for_frame_budget(1500, HeaderId::new(36))
    ///     .expect("budget is large enough");
    /// assert!(config.encoded_fragment_ceiling() <= 1500);
    /// assert!(FragmentationConfig::for_frame_budget(FRAGMENT_OVERHEAD, HeaderId::new(36)).is_none());
    /// ```
    #[must_use]
    pub fn for_frame_budget(frame_budget: usize, header_id: HeaderId) -> Option<Self> {
        let available = frame_budget.checked_sub(FRAGMENT_OVERHEAD + ENVELOPE_GUARD_BYTES)?;
        Some(Self::new(NonZeroUsize::new(available)?, header_id))
    }

    /// Largest encoded fragment this configuration produces, excluding
    /// headers added by other layers.
    #[must_use]
    pub const fn encoded_fragment_ceiling(&self) -> usize {
        self.frag_size.get() + FRAGMENT_OVERHEAD
    }
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        Self {
            frag_size: NonZeroUsize::new(DEFAULT_FRAG_SIZE).unwrap_or(NonZeroUsize::MIN),
            header_id: DEFAULT_FRAG_HEADER_ID,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let config = FragmentationConfig::default();
        assert_eq!(config.frag_size.get(), 60_000);
        assert_eq!(config.header_id, HeaderId::new(36));
    }

    #[test]
    fn overhead_counts_every_fixed_field() {
        assert_eq!(FRAGMENT_OVERHEAD, 67);
    }

    #[rstest]
    #[case(0)]
    #[case(FRAGMENT_OVERHEAD)]
    #[case(FRAGMENT_OVERHEAD + ENVELOPE_GUARD_BYTES)]
    fn tiny_budgets_are_rejected(#[case] budget: usize) {
        assert!(FragmentationConfig::for_frame_budget(budget, HeaderId::new(1)).is_none());
    }

    #[test]
    fn budget_reserves_overhead_and_guard() {
        let config = FragmentationConfig::for_frame_budget(1_000, HeaderId::new(9))
            .expect("budget fits");
        assert_eq!(config.frag_size.get(), 1_000 - FRAGMENT_OVERHEAD - ENVELOPE_GUARD_BYTES);
        assert_eq!(config.header_id, HeaderId::new(9));
    }
}
