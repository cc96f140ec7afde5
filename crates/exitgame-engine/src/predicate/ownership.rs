//! Single-owner predicate.
//!
//! Only the owner may start an exit, only the owner's signature can spend
//! the range, and finalization pays the owner.

use exitgame_types::{
    signed_by_all, Address, DeprecationWitness, Exit, ExitGameError, FinalizationWitness, Result,
    Signature, State, StateUpdate,
};

use super::{is_superseded, DisbursementContext, Predicate, PredicateContext};

/// Predicate for states with `Parameters::Ownership`.
#[derive(Debug, Clone, Default)]
pub struct OwnershipPredicate {
    additional_lockup: u64,
}

impl OwnershipPredicate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require exits of owned states to wait `heights` beyond the dispute
    /// window.
    #[must_use]
    pub fn with_additional_lockup(mut self, heights: u64) -> Self {
        self.additional_lockup = heights;
        self
    }
}

impl Predicate for OwnershipPredicate {
    fn name(&self) -> &'static str {
        "ownership"
    }

    fn can_initiate_exit(&self, state_update: &StateUpdate, witness: &Signature) -> bool {
        state_update.state.owner() == Some(witness.signer)
    }

    fn verify_deprecation(
        &self,
        ctx: &PredicateContext<'_>,
        state_id: u64,
        state_update: &StateUpdate,
        witness: &DeprecationWitness,
    ) -> bool {
        let Some(owner) = state_update.state.owner() else {
            return false;
        };
        is_superseded(ctx, state_id, state_update, witness)
            && signed_by_all(&witness.signatures, &[owner])
    }

    fn finalize_exit(
        &self,
        ctx: &mut DisbursementContext<'_>,
        exit: &Exit,
        witness: &FinalizationWitness,
    ) -> Result<Address> {
        if *witness != FinalizationWitness::None {
            return Err(ExitGameError::FinalizationWitnessInvalid {
                reason: "ownership exits take no finalization witness".into(),
            });
        }
        let owner = exit.state_update.state.owner().ok_or_else(|| {
            ExitGameError::FinalizationWitnessInvalid {
                reason: format!("{} is not an ownership state", exit.id),
            }
        })?;
        ctx.pay(owner, exit.state_update.width())?;
        Ok(owner)
    }

    fn additional_lockup(&self, _state: &State) -> u64 {
        self.additional_lockup
    }
}
