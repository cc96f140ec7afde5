//! Multi-party predicate: every recipient must sign.
//!
//! Exit initiation is currently open to any caller. Spends and payouts need
//! signatures from the full recipient set, and the payout goes to whatever
//! destination the recipients signed for.

use exitgame_types::{
    signed_by_all, Address, DeprecationWitness, Exit, ExitGameError, FinalizationWitness, Result,
    Signature, State, StateUpdate,
};

use super::{is_superseded, DisbursementContext, Predicate, PredicateContext};

/// Predicate for states with `Parameters::MultiSig`.
#[derive(Debug, Clone, Default)]
pub struct MultiSigPredicate {
    additional_lockup: u64,
}

impl MultiSigPredicate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_additional_lockup(mut self, heights: u64) -> Self {
        self.additional_lockup = heights;
        self
    }
}

impl Predicate for MultiSigPredicate {
    fn name(&self) -> &'static str {
        "multisig"
    }

    // Anyone may start an exit. Restricting this to the recipients is an
    // open policy decision; callers rely on the permissive behavior today.
    fn can_initiate_exit(&self, _state_update: &StateUpdate, _witness: &Signature) -> bool {
        true
    }

    fn verify_deprecation(
        &self,
        ctx: &PredicateContext<'_>,
        state_id: u64,
        state_update: &StateUpdate,
        witness: &DeprecationWitness,
    ) -> bool {
        let Some(recipients) = state_update.state.recipients() else {
            return false;
        };
        is_superseded(ctx, state_id, state_update, witness)
            && signed_by_all(&witness.signatures, recipients)
    }

    fn finalize_exit(
        &self,
        ctx: &mut DisbursementContext<'_>,
        exit: &Exit,
        witness: &FinalizationWitness,
    ) -> Result<Address> {
        let FinalizationWitness::MultiSig {
            signatures,
            destination,
        } = witness
        else {
            return Err(ExitGameError::FinalizationWitnessInvalid {
                reason: "multisig exits need signatures and a destination".into(),
            });
        };
        let recipients = exit.state_update.state.recipients().ok_or_else(|| {
            ExitGameError::FinalizationWitnessInvalid {
                reason: format!("{} is not a multisig state", exit.id),
            }
        })?;
        if !signed_by_all(signatures, recipients) {
            return Err(ExitGameError::FinalizationWitnessInvalid {
                reason: format!(
                    "{} of {} recipient signatures present",
                    signatures.len(),
                    recipients.len()
                ),
            });
        }
        ctx.pay(*destination, exit.state_update.width())?;
        Ok(*destination)
    }

    fn additional_lockup(&self, _state: &State) -> u64 {
        self.additional_lockup
    }
}
