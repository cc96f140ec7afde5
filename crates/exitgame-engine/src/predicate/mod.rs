//! Predicate capability: the asset-specific rules an exit is judged by.
//!
//! The engine never inspects [`exitgame_types::Parameters`] itself. It looks
//! up the predicate named by a state and asks it:
//!
//! - may this caller start an exit? ([`Predicate::can_initiate_exit`])
//! - does this witness prove the exit stale? ([`Predicate::verify_deprecation`])
//! - who gets paid, and pay them ([`Predicate::finalize_exit`])
//! - how much extra lockup does this state need? ([`Predicate::additional_lockup`])
//!
//! Predicates reach the base ledger and the commitment log only through
//! the borrowed contexts handed to them per call.

pub mod multisig;
pub mod ownership;

pub use multisig::MultiSigPredicate;
pub use ownership::OwnershipPredicate;

use exitgame_chain::{CommitmentLog, Ledger};
use exitgame_types::{
    constants, Address, DeprecationWitness, Exit, FinalizationWitness, InclusionWitness, Result,
    Signature, State, StateUpdate,
};

/// Read-only view handed to predicates while verifying proofs.
pub struct PredicateContext<'a> {
    /// The exit game contract; updates are committed under this subject.
    pub plasma_address: Address,
    pub commitment_log: &'a dyn CommitmentLog,
}

impl PredicateContext<'_> {
    /// Whether `update` is committed under this exit game's address.
    #[must_use]
    pub fn is_committed(&self, update: &StateUpdate, witness: &InclusionWitness) -> bool {
        self.commitment_log
            .verify_inclusion(update, self.plasma_address, witness)
    }
}

/// Ledger access handed to a predicate while it pays out an exit.
///
/// The engine has approved `predicate_address` to spend the exit's width
/// from custody before calling in.
pub struct DisbursementContext<'a> {
    pub plasma_address: Address,
    pub predicate_address: Address,
    pub ledger: &'a mut dyn Ledger,
}

impl DisbursementContext<'_> {
    /// Pay `amount` out of custody to `to`, spending the approval.
    pub fn pay(&mut self, to: Address, amount: u64) -> Result<()> {
        self.ledger
            .transfer_from(self.predicate_address, self.plasma_address, to, amount)
    }
}

/// Authorization policy for one family of states.
pub trait Predicate: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// May the holder of `witness` start an exit of `state_update`?
    fn can_initiate_exit(&self, state_update: &StateUpdate, witness: &Signature) -> bool;

    /// Does `witness` prove that position `state_id` of `state_update` was
    /// spent by a newer committed update?
    fn verify_deprecation(
        &self,
        ctx: &PredicateContext<'_>,
        state_id: u64,
        state_update: &StateUpdate,
        witness: &DeprecationWitness,
    ) -> bool;

    /// Pay out `exit` and return the recipient.
    ///
    /// Must validate `witness` before moving any funds, so that an error
    /// leaves the ledger untouched.
    fn finalize_exit(
        &self,
        ctx: &mut DisbursementContext<'_>,
        exit: &Exit,
        witness: &FinalizationWitness,
    ) -> Result<Address>;

    /// Extra heights added to the dispute window for exits of `state`.
    fn additional_lockup(&self, _state: &State) -> u64 {
        constants::DEFAULT_ADDITIONAL_LOCKUP
    }
}

/// Checks shared by every predicate's deprecation proof:
///
/// 1. `state_id` lies in the exited update's range
/// 2. `state_id` lies in the superseding update's range
/// 3. the superseding update is committed under this exit game
/// 4. the superseding update is strictly newer
///
/// Signature checks are left to the predicate.
#[must_use]
pub fn is_superseded(
    ctx: &PredicateContext<'_>,
    state_id: u64,
    state_update: &StateUpdate,
    witness: &DeprecationWitness,
) -> bool {
    let next = &witness.next_state_update;
    state_update.contains(state_id)
        && next.contains(state_id)
        && ctx.is_committed(next, &witness.inclusion_witness)
        && state_update.snapshot_index < next.snapshot_index
}
