//! Journal of accepted exit game transitions.
//!
//! Every call that changes the stores appends one [`ExitGameEvent`] wrapped
//! in an [`EventRecord`]. Rejected calls append nothing.
//!
//! Records carry the ledger height only, so replaying the same calls
//! against the same clock yields the same journal.

use serde::{Deserialize, Serialize};

use crate::{Address, ChallengeId, ExitId};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitGameEvent {
    /// A deposit created a fresh exitable range.
    DepositRecorded {
        depositor: Address,
        start: u64,
        end: u64,
    },
    /// An exit was opened against a deposit or a committed update.
    ExitStarted {
        exit_id: ExitId,
        start: u64,
        end: u64,
        redeemable_at: u64,
    },
    /// An exit was proven stale.
    ExitRevoked { exit_id: ExitId },
    /// An earlier exit challenged a later one.
    ChallengeOpened {
        challenge_id: ChallengeId,
        earlier_exit_id: ExitId,
        later_exit_id: ExitId,
    },
    /// A challenge was dismissed after its earlier exit was revoked.
    ChallengeRemoved {
        challenge_id: ChallengeId,
        later_exit_id: ExitId,
    },
    /// An exit paid out.
    ExitFinalized {
        exit_id: ExitId,
        recipient: Address,
        amount: u64,
    },
}

impl ExitGameEvent {
    /// Stable upper-case tag, used as a log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DepositRecorded { .. } => "DEPOSIT_RECORDED",
            Self::ExitStarted { .. } => "EXIT_STARTED",
            Self::ExitRevoked { .. } => "EXIT_REVOKED",
            Self::ChallengeOpened { .. } => "CHALLENGE_OPENED",
            Self::ChallengeRemoved { .. } => "CHALLENGE_REMOVED",
            Self::ExitFinalized { .. } => "EXIT_FINALIZED",
        }
    }
}

impl std::fmt::Display for ExitGameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

/// An event plus the ledger height it was recorded at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub height: u64,
    pub event: ExitGameEvent,
}

impl EventRecord {
    #[must_use]
    pub fn new(height: u64, event: ExitGameEvent) -> Self {
        Self { height, event }
    }
}
