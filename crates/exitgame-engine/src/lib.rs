//! # exitgame-engine
//!
//! The **exit game**: lets holders of a committed range withdraw it from
//! custody, and lets anyone block or revoke an exit that a newer or older
//! commitment contradicts.
//!
//! ## Components
//!
//! - [`range_ledger`]: deposits and the set of still-exitable ranges
//! - [`registry`]: exits and challenges, addressed by stable ids
//! - [`predicate`]: per-state authorization ([`OwnershipPredicate`],
//!   [`MultiSigPredicate`])
//! - [`engine`]: [`ExitGame`], which drives every operation against a
//!   [`exitgame_chain::Ledger`], a [`exitgame_chain::CommitmentLog`] and a
//!   [`exitgame_chain::Clock`]
//!
//! ## Custody invariant
//!
//! ```text
//! balance(plasma) == Σ width(exitable range)
//! ```
//!
//! Checked by [`ExitGame::verify_custody`].

pub mod engine;
pub mod predicate;
pub mod range_ledger;
pub mod registry;

pub use engine::{ExitGame, ExitGameStore};
pub use predicate::{
    DisbursementContext, MultiSigPredicate, OwnershipPredicate, Predicate, PredicateContext,
};
pub use range_ledger::{RangeLedger, RangeSplit};
pub use registry::{ChallengeRegistry, ExitRegistry};
