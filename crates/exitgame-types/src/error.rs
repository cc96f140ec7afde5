//! Error types for the exit game.
//!
//! All errors use the `EG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Deposit / range errors
//! - 2xx: Exit initiation errors
//! - 3xx: Revocation errors
//! - 4xx: Challenge errors
//! - 5xx: Finalization errors
//! - 6xx: Ledger / commitment log errors
//! - 9xx: General / internal errors
//!
//! Every variant is a precondition failure on a single call. The call that
//! returns it has left all stores unchanged.

use thiserror::Error;

use crate::{Address, ChallengeId, ExitId};

/// Central error enum for all exit game operations.
#[derive(Debug, Error)]
pub enum ExitGameError {
    // =================================================================
    // Deposit / Range Errors (1xx)
    // =================================================================
    /// Deposit amount must be strictly positive.
    #[error("EG_ERR_100: Invalid deposit amount: {0}")]
    InvalidAmount(u64),

    /// A range must satisfy `start < end`.
    #[error("EG_ERR_101: Invalid range [{start}, {end})")]
    InvalidRange { start: u64, end: u64 },

    /// No deposit was recorded with this end boundary.
    #[error("EG_ERR_102: Deposit not found for range end {0}")]
    DepositNotFound(u64),

    /// The exited range is not contained in the named exitable range.
    #[error("EG_ERR_103: Range [{start}, {end}) is not exitable under key {range_key}")]
    RangeNotExitable { range_key: u64, start: u64, end: u64 },

    // =================================================================
    // Exit Initiation Errors (2xx)
    // =================================================================
    /// The state update is not included in the commitment log.
    #[error("EG_ERR_200: Inclusion proof invalid")]
    InclusionProofInvalid,

    /// The predicate refused to let this caller start the exit.
    #[error("EG_ERR_201: Exit not authorized by predicate")]
    ExitNotAuthorized,

    /// The state names a predicate the engine does not know.
    #[error("EG_ERR_202: Predicate not registered: {0}")]
    PredicateNotRegistered(Address),

    /// No exit exists with this identifier.
    #[error("EG_ERR_203: Exit not found: {0}")]
    ExitNotFound(ExitId),

    // =================================================================
    // Revocation Errors (3xx)
    // =================================================================
    /// The deprecation witness does not prove a newer superseding update.
    #[error("EG_ERR_300: Deprecation proof invalid for {0}")]
    DeprecationProofInvalid(ExitId),

    /// The exit was revoked and can no longer be challenged or finalized.
    #[error("EG_ERR_301: Exit revoked: {0}")]
    ExitRevoked(ExitId),

    // =================================================================
    // Challenge Errors (4xx)
    // =================================================================
    /// The two exits do not cover any common position.
    #[error("EG_ERR_400: Ranges do not overlap: {earlier} vs {later}")]
    RangesDoNotOverlap { earlier: ExitId, later: ExitId },

    /// The "earlier" exit is not anchored to a strictly lower snapshot.
    #[error("EG_ERR_401: Priority violation: {earlier} is not earlier than {later}")]
    PriorityViolation { earlier: ExitId, later: ExitId },

    /// The later exit has already passed its redeemable height.
    #[error("EG_ERR_402: Later exit already redeemable: {0}")]
    LaterExitAlreadyRedeemable(ExitId),

    /// The earlier exit of the challenge has not been revoked.
    #[error("EG_ERR_403: Earlier exit not revoked for {0}")]
    EarlierExitNotRevoked(ChallengeId),

    /// No challenge exists with this identifier.
    #[error("EG_ERR_404: Challenge not found: {0}")]
    ChallengeNotFound(ChallengeId),

    // =================================================================
    // Finalization Errors (5xx)
    // =================================================================
    /// The exit's dispute window has not elapsed.
    #[error("EG_ERR_500: Exit not yet redeemable: redeemable at {redeemable_at}, current height {current_height}")]
    NotYetRedeemable {
        redeemable_at: u64,
        current_height: u64,
    },

    /// The exit still has unresolved challenges.
    #[error("EG_ERR_501: Exit has {0} open challenge(s)")]
    HasOpenChallenges(u64),

    /// The exit was already finalized.
    #[error("EG_ERR_502: Exit already finalized: {0}")]
    ExitAlreadyFinalized(ExitId),

    /// The finalization witness does not satisfy the predicate.
    #[error("EG_ERR_503: Finalization witness invalid: {reason}")]
    FinalizationWitnessInvalid { reason: String },

    // =================================================================
    // Ledger / Commitment Log Errors (6xx)
    // =================================================================
    /// The caller is not allowed to perform this action.
    #[error("EG_ERR_600: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Not enough balance on the ledger.
    #[error("EG_ERR_601: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// Custody balance disagrees with the exitable range total.
    #[error("EG_ERR_602: Custody invariant violation: {reason}")]
    CustodyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("EG_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("EG_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("EG_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ExitGameError>;

impl From<std::io::Error> for ExitGameError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ExitGameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
