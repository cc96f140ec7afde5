//! Deposit accounting and exitable-interval bookkeeping.
//!
//! Deposited supply is laid out on a number line: each deposit of `amount`
//! claims `[total_deposited, total_deposited + amount)`. The set of ranges
//! that may still be exited is kept as a map from each range's exclusive
//! upper bound to its inclusive lower bound.
//!
//! Invariants:
//! ```text
//! ∀ (upper, lower) ∈ exitable: lower < upper
//! exitable ranges are pairwise disjoint
//! Σ (upper - lower) == units deposited - units finalized
//! ```

use std::collections::BTreeMap;

use exitgame_types::{ExitGameError, Result, SnapshotIndex, State, StateUpdate};
use serde::{Deserialize, Serialize};

/// How finalizing `[start, end)` reshapes the exitable range it sits in.
///
/// Produced by [`RangeLedger::plan_finalize`] without touching any state,
/// then applied with [`RangeLedger::apply_split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSplit {
    /// Key of the exitable range being cut.
    pub range_key: u64,
    /// Leftover `[lower, start)`, stored under key `start`.
    pub keep_below: Option<(u64, u64)>,
    /// Leftover `[end, range_key)`, stored under key `range_key`.
    pub keep_above: Option<(u64, u64)>,
}

/// Deposits plus the currently exitable intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeLedger {
    total_deposited: u64,
    /// upper bound (exclusive) → lower bound (inclusive)
    exitable_ranges: BTreeMap<u64, u64>,
    /// Deposits keyed by their end boundary.
    deposits: BTreeMap<u64, StateUpdate>,
}

impl RangeLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that a deposit of `amount` can be recorded.
    ///
    /// # Errors
    /// Returns [`ExitGameError::InvalidAmount`] for a zero amount or one
    /// that would overflow the range space.
    pub fn check_deposit(&self, amount: u64) -> Result<()> {
        if amount == 0 || self.total_deposited.checked_add(amount).is_none() {
            return Err(ExitGameError::InvalidAmount(amount));
        }
        Ok(())
    }

    /// Allocate the next range for a deposit and make it exitable.
    ///
    /// `preceding` is the latest commitment block at deposit time.
    pub fn record_deposit(
        &mut self,
        state: State,
        amount: u64,
        preceding: SnapshotIndex,
    ) -> Result<StateUpdate> {
        self.check_deposit(amount)?;
        let start = self.total_deposited;
        let end = start + amount;
        let deposit = StateUpdate::new(state, start, end, preceding)?;

        self.deposits.insert(end, deposit.clone());
        // TODO: extend an exitable range that already ends at `start` instead of adding a new entry.
        self.exitable_ranges.insert(end, start);
        self.total_deposited = end;
        Ok(deposit)
    }

    /// The deposit whose range ends at `end`.
    #[must_use]
    pub fn deposit(&self, end: u64) -> Option<&StateUpdate> {
        self.deposits.get(&end)
    }

    /// Work out how finalizing `[start, end)` would cut the range keyed by
    /// `range_key`.
    ///
    /// # Errors
    /// Returns [`ExitGameError::RangeNotExitable`] if `range_key` is absent
    /// or `[start, end)` is not inside it.
    pub fn plan_finalize(&self, range_key: u64, start: u64, end: u64) -> Result<RangeSplit> {
        let not_exitable = ExitGameError::RangeNotExitable {
            range_key,
            start,
            end,
        };
        let Some(&lower) = self.exitable_ranges.get(&range_key) else {
            return Err(not_exitable);
        };
        if start < lower || end > range_key || start >= end {
            return Err(not_exitable);
        }
        Ok(RangeSplit {
            range_key,
            keep_below: (start != lower).then_some((start, lower)),
            keep_above: (end != range_key).then_some((range_key, end)),
        })
    }

    /// Apply a split produced by [`Self::plan_finalize`] on this ledger.
    pub fn apply_split(&mut self, split: &RangeSplit) {
        self.exitable_ranges.remove(&split.range_key);
        if let Some((key, lower)) = split.keep_below {
            self.exitable_ranges.insert(key, lower);
        }
        if let Some((key, lower)) = split.keep_above {
            self.exitable_ranges.insert(key, lower);
        }
        tracing::debug!(
            range_key = split.range_key,
            below = ?split.keep_below,
            above = ?split.keep_above,
            "Exitable range split"
        );
    }

    /// Remove `[start, end)` from the exitable range keyed by `range_key`.
    pub fn finalize_range(&mut self, range_key: u64, start: u64, end: u64) -> Result<RangeSplit> {
        let split = self.plan_finalize(range_key, start, end)?;
        self.apply_split(&split);
        Ok(split)
    }

    /// Key of the exitable range that fully contains `[start, end)`, if any.
    #[must_use]
    pub fn find_exitable_range(&self, start: u64, end: u64) -> Option<u64> {
        self.exitable_ranges
            .range(end..)
            .next()
            .filter(|&(_, &lower)| lower <= start)
            .map(|(&key, _)| key)
    }

    #[must_use]
    pub fn exitable_ranges(&self) -> &BTreeMap<u64, u64> {
        &self.exitable_ranges
    }

    /// Total width of all exitable ranges.
    #[must_use]
    pub fn exitable_total(&self) -> u64 {
        self.exitable_ranges
            .iter()
            .map(|(upper, lower)| upper - lower)
            .sum()
    }

    #[must_use]
    pub fn total_deposited(&self) -> u64 {
        self.total_deposited
    }

    /// Number of deposits recorded.
    #[must_use]
    pub fn deposit_count(&self) -> usize {
        self.deposits.len()
    }
}
