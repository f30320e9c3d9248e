//! Byte windows that tile a message's encoding.

use std::num::NonZeroUsize;

/// Contiguous byte range `[offset, offset + length)` of an encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FragmentWindow {
    offset: usize,
    length: usize,
}

impl FragmentWindow {
    #[must_use]
    pub const fn new(offset: usize, length: usize) -> Self { Self { offset, length } }

    #[must_use]
    pub const fn offset(&self) -> usize { self.offset }

    #[must_use]
    pub const fn len(&self) -> usize { self.length }

    #[must_use]
    pub const fn is_empty(&self) -> bool { self.length == 0 }

    /// First position past the window.
    #[must_use]
    pub const fn end(&self) -> usize { self.offset + self.length }
}

/// Split `[base, base + total_length)` into windows of at most `max_window`
/// bytes.
///
/// Windows are contiguous, in order, and all but the last are exactly
/// `max_window` long. A zero `total_length` yields no windows.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use groupwire::fragment::{FragmentWindow, compute_windows};
///
/// let windows = compute_windows(3, 10, NonZeroUsize::new(4).expect("non-zero"));
/// assert_eq!(
///     windows,
///     [FragmentWindow::new(3, 4), FragmentWindow::new(7, 4), FragmentWindow::new(11, 2)]
/// );
/// ```
#[must_use]
pub fn compute_windows(
    base: usize,
    total_length: usize,
    max_window: NonZeroUsize,
) -> Vec<FragmentWindow> {
    let max = max_window.get();
    let mut windows = Vec::with_capacity(total_length.div_ceil(max));
    let mut position = base;
    let mut remaining = total_length;
    while remaining > 0 {
        let length = remaining.min(max);
        windows.push(FragmentWindow::new(position, length));
        position += length;
        remaining -= length;
    }
    windows
}
