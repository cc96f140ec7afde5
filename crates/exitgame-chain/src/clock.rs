//! Ledger height source.
//!
//! The exit game never waits: dispute windows are height comparisons
//! against a [`Clock`] the host advances.

/// Monotonically non-decreasing ledger height.
pub trait Clock {
    fn current_height(&self) -> u64;
}

/// A clock advanced by hand. Never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualClock {
    height: u64,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at(height: u64) -> Self {
        Self { height }
    }

    /// Move forward by `by` heights.
    pub fn advance(&mut self, by: u64) {
        self.height = self.height.saturating_add(by);
    }

    /// Jump to `height`. Ignored if it would move the clock backwards.
    pub fn set(&mut self, height: u64) {
        if height < self.height {
            tracing::warn!(current = self.height, requested = height, "Clock rewind ignored");
            return;
        }
        self.height = height;
    }
}

impl Clock for ManualClock {
    fn current_height(&self) -> u64 {
        self.height
    }
}
