//! # Exits and challenges
//!
//! An [`Exit`] is a pending claim to withdraw the value of a range once its
//! dispute window has passed. A [`Challenge`] records that an exit anchored
//! to an earlier snapshot must be resolved before a later one can finalize.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  finalize   ┌───────────┐
//!   │ PENDING ├────────────▶│ FINALIZED │
//!   └────┬────┘             └───────────┘
//!        │ revoke (deprecation proof)
//!        ▼
//!   ┌─────────┐
//!   │ REVOKED │ ◀── revoke again: no-op
//!   └─────────┘
//! ```
//!
//! A pending exit may carry `challenge_count > 0`; that blocks finalization
//! without changing its status.

use serde::{Deserialize, Serialize};

use crate::{ChallengeId, ExitGameError, ExitId, Result, StateUpdate};

/// Lifecycle status of an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitStatus {
    /// Waiting out its dispute window; may be challenged or revoked.
    Pending,
    /// Proven stale by a newer commitment. Terminal.
    Revoked,
    /// Funds were disbursed. Terminal.
    Finalized,
}

impl ExitStatus {
    /// Can an exit in this status move to `target`?
    ///
    /// `Revoked -> Revoked` is allowed so that a repeated revocation is a
    /// harmless no-op.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Revoked | Self::Finalized) | (Self::Revoked, Self::Revoked)
        )
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Revoked => write!(f, "REVOKED"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// An in-flight claim to withdraw a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub id: ExitId,
    /// The claim being exited.
    pub state_update: StateUpdate,
    /// Ledger height at or after which the exit may be finalized.
    pub redeemable_at: u64,
    pub status: ExitStatus,
    /// Number of unresolved challenges naming this exit as the later one.
    pub challenge_count: u64,
}

impl Exit {
    /// A fresh pending exit with no challenges.
    #[must_use]
    pub fn pending(id: ExitId, state_update: StateUpdate, redeemable_at: u64) -> Self {
        Self {
            id,
            state_update,
            redeemable_at,
            status: ExitStatus::Pending,
            challenge_count: 0,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ExitStatus::Pending
    }

    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.status == ExitStatus::Revoked
    }

    /// Whether the dispute window has elapsed at `current_height`.
    #[must_use]
    pub fn is_redeemable(&self, current_height: u64) -> bool {
        self.redeemable_at <= current_height
    }

    /// Fail unless the exit is still pending.
    ///
    /// # Errors
    /// [`ExitGameError::ExitRevoked`] or [`ExitGameError::ExitAlreadyFinalized`].
    pub fn ensure_pending(&self) -> Result<()> {
        match self.status {
            ExitStatus::Pending => Ok(()),
            ExitStatus::Revoked => Err(ExitGameError::ExitRevoked(self.id)),
            ExitStatus::Finalized => Err(ExitGameError::ExitAlreadyFinalized(self.id)),
        }
    }

    /// Move to `target`, enforcing the lifecycle.
    ///
    /// # Errors
    /// Returns the error matching the current terminal status if the move is
    /// not allowed.
    pub fn transition_to(&mut self, target: ExitStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(match self.status {
                ExitStatus::Finalized => ExitGameError::ExitAlreadyFinalized(self.id),
                _ => ExitGameError::ExitRevoked(self.id),
            });
        }
        self.status = target;
        Ok(())
    }
}

/// A priority dispute: `later_exit_id` cannot finalize while this stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub earlier_exit_id: ExitId,
    pub later_exit_id: ExitId,
}
