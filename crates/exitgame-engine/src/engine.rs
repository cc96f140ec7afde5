//! The exit game engine.
//!
//! Orchestrates deposits, exits, challenges, revocations and finalization
//! over one [`ExitGameStore`]. Every public operation checks all of its
//! preconditions before it mutates anything, so a rejected call leaves the
//! store, the ledger and the event journal exactly as they were.
//!
//! ## Exit lifecycle
//!
//! ```text
//! deposit ─▶ exit_deposit ───────┐
//!                                ├─▶ PENDING ─┬─ finalize_exit ─▶ FINALIZED
//! commit ──▶ exit_state_update ──┘            └─ revoke_exit ───▶ REVOKED
//! ```
//!
//! `challenge_exit` adds to a pending exit's challenge count and may push
//! back its redeemable height; `remove_challenge` takes one away once the
//! challenger's own exit is revoked.
//!
//! The engine is not reentrant: the host must serialize calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use exitgame_chain::{Clock, CommitmentLog, Ledger};
use exitgame_types::{
    constants, Address, Challenge, ChallengeId, DeprecationWitness, EventRecord, Exit,
    ExitGameConfig, ExitGameError, ExitGameEvent, ExitId, ExitStatus, FinalizationWitness,
    InclusionWitness, Parameters, Result, Signature, State, StateUpdate,
};
use serde::{Deserialize, Serialize};

use crate::predicate::{DisbursementContext, Predicate, PredicateContext};
use crate::range_ledger::RangeLedger;
use crate::registry::{ChallengeRegistry, ExitRegistry};

/// Everything the exit game must persist between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitGameStore {
    pub ranges: RangeLedger,
    pub exits: ExitRegistry,
    pub challenges: ChallengeRegistry,
}

/// Exit game over a ledger `L`, a commitment log `G` and a clock `C`.
pub struct ExitGame<L, G, C> {
    config: ExitGameConfig,
    ledger: L,
    commitment_log: G,
    clock: C,
    predicates: BTreeMap<Address, Arc<dyn Predicate>>,
    store: ExitGameStore,
    events: Vec<EventRecord>,
}

impl<L: Ledger, G: CommitmentLog, C: Clock> ExitGame<L, G, C> {
    /// Create an exit game with an empty store.
    ///
    /// # Errors
    /// Returns [`ExitGameError::Configuration`] if `config` is invalid.
    pub fn new(config: ExitGameConfig, ledger: L, commitment_log: G, clock: C) -> Result<Self> {
        Self::with_store(config, ledger, commitment_log, clock, ExitGameStore::default())
    }

    /// Resume an exit game from a previously persisted store.
    pub fn with_store(
        config: ExitGameConfig,
        ledger: L,
        commitment_log: G,
        clock: C,
        store: ExitGameStore,
    ) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            version = constants::VERSION,
            plasma = %config.plasma_address,
            operator = %config.operator,
            dispute_period = config.dispute_period,
            exits = store.exits.len(),
            "Exit game initialized"
        );
        Ok(Self {
            config,
            ledger,
            commitment_log,
            clock,
            predicates: BTreeMap::new(),
            store,
            events: Vec::new(),
        })
    }

    /// Make `predicate` available to states naming `address`.
    pub fn register_predicate(&mut self, address: Address, predicate: Arc<dyn Predicate>) {
        tracing::info!(predicate = %address, name = predicate.name(), "Predicate registered");
        self.predicates.insert(address, predicate);
    }

    // -----------------------------------------------------------------
    // Deposits
    // -----------------------------------------------------------------

    /// Take `amount` into custody and open a fresh exitable range for it.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is zero or overflows the range space
    /// - `PredicateNotRegistered` if `predicate` is unknown
    /// - `InsufficientFunds` if the depositor cannot cover `amount`
    pub fn deposit(
        &mut self,
        depositor: Address,
        amount: u64,
        predicate: Address,
        parameters: Parameters,
    ) -> Result<StateUpdate> {
        self.store.ranges.check_deposit(amount)?;
        self.predicate(predicate)?;
        self.ledger
            .transfer(depositor, self.config.plasma_address, amount)?;

        let preceding = self.commitment_log.latest_index();
        let deposit = self.store.ranges.record_deposit(
            State::new(predicate, parameters),
            amount,
            preceding,
        )?;

        tracing::info!(
            depositor = %depositor.short(),
            start = deposit.start,
            end = deposit.end,
            preceding = %preceding,
            "Deposit recorded"
        );
        self.record(ExitGameEvent::DepositRecorded {
            depositor,
            start: deposit.start,
            end: deposit.end,
        });
        Ok(deposit)
    }

    // -----------------------------------------------------------------
    // Exit initiation
    // -----------------------------------------------------------------

    /// Start an exit of the deposit whose range ends at `deposit_end`.
    ///
    /// The deposit record is the proof of ownership, so no witness is needed.
    pub fn exit_deposit(&mut self, deposit_end: u64) -> Result<ExitId> {
        let deposit = self
            .store
            .ranges
            .deposit(deposit_end)
            .cloned()
            .ok_or(ExitGameError::DepositNotFound(deposit_end))?;
        self.open_exit(deposit)
    }

    /// Start an exit of a committed state update.
    ///
    /// # Errors
    /// - `InclusionProofInvalid` if the update is not in the commitment log
    /// - `PredicateNotRegistered` if its predicate is unknown
    /// - `ExitNotAuthorized` if the predicate refuses `exitability_witness`
    pub fn exit_state_update(
        &mut self,
        state_update: StateUpdate,
        inclusion_witness: &InclusionWitness,
        exitability_witness: &Signature,
    ) -> Result<ExitId> {
        if !self.commitment_log.verify_inclusion(
            &state_update,
            self.config.plasma_address,
            inclusion_witness,
        ) {
            tracing::warn!(
                start = state_update.start,
                end = state_update.end,
                snapshot = %state_update.snapshot_index,
                "Exit rejected: state update not committed"
            );
            return Err(ExitGameError::InclusionProofInvalid);
        }
        let predicate = self.predicate(state_update.state.predicate)?;
        if !predicate.can_initiate_exit(&state_update, exitability_witness) {
            tracing::warn!(
                caller = %exitability_witness.signer.short(),
                predicate = predicate.name(),
                "Exit rejected: predicate refused initiation"
            );
            return Err(ExitGameError::ExitNotAuthorized);
        }
        self.open_exit(state_update)
    }

    fn open_exit(&mut self, state_update: StateUpdate) -> Result<ExitId> {
        let predicate = self.predicate(state_update.state.predicate)?;
        let redeemable_at = self
            .height()
            .saturating_add(self.config.dispute_period)
            .saturating_add(predicate.additional_lockup(&state_update.state));
        let (start, end) = (state_update.start, state_update.end);
        let exit_id = self.store.exits.open(state_update, redeemable_at);

        tracing::info!(exit = %exit_id, start, end, redeemable_at, "Exit started");
        self.record(ExitGameEvent::ExitStarted {
            exit_id,
            start,
            end,
            redeemable_at,
        });
        Ok(exit_id)
    }

    // -----------------------------------------------------------------
    // Revocation
    // -----------------------------------------------------------------

    /// Revoke an exit whose state update was spent by a newer commitment.
    ///
    /// Revoking an already revoked exit with a valid proof succeeds and
    /// changes nothing.
    ///
    /// # Errors
    /// - `ExitAlreadyFinalized` if the exit already paid out
    /// - `DeprecationProofInvalid` if the predicate rejects the witness
    pub fn revoke_exit(
        &mut self,
        state_id: u64,
        exit_id: ExitId,
        witness: &DeprecationWitness,
    ) -> Result<()> {
        let exit = self.store.exits.get(exit_id)?;
        if exit.status == ExitStatus::Finalized {
            return Err(ExitGameError::ExitAlreadyFinalized(exit_id));
        }
        let predicate = self.predicate(exit.state_update.state.predicate)?;
        let ctx = PredicateContext {
            plasma_address: self.config.plasma_address,
            commitment_log: &self.commitment_log,
        };
        if !predicate.verify_deprecation(&ctx, state_id, &exit.state_update, witness) {
            tracing::warn!(exit = %exit_id, state_id, "Revocation rejected: deprecation proof invalid");
            return Err(ExitGameError::DeprecationProofInvalid(exit_id));
        }

        let exit = self.store.exits.get_mut(exit_id)?;
        let newly_revoked = exit.is_pending();
        exit.transition_to(ExitStatus::Revoked)?;
        if newly_revoked {
            tracing::info!(exit = %exit_id, state_id, "Exit revoked");
            self.record(ExitGameEvent::ExitRevoked { exit_id });
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Challenges
    // -----------------------------------------------------------------

    /// Block `later_exit_id` until `earlier_exit_id` is resolved.
    ///
    /// On success the later exit's redeemable height is pushed back to the
    /// earlier exit's if that is further out.
    ///
    /// # Errors
    /// - `ExitRevoked` / `ExitAlreadyFinalized` if either exit is not pending
    /// - `RangesDoNotOverlap` if the exits share no position
    /// - `PriorityViolation` unless the earlier exit has the lower snapshot
    /// - `LaterExitAlreadyRedeemable` if the later exit's window has passed
    pub fn challenge_exit(
        &mut self,
        earlier_exit_id: ExitId,
        later_exit_id: ExitId,
    ) -> Result<ChallengeId> {
        let earlier = self.store.exits.get(earlier_exit_id)?;
        let later = self.store.exits.get(later_exit_id)?;
        earlier.ensure_pending()?;
        later.ensure_pending()?;

        if !earlier.state_update.overlaps(&later.state_update) {
            return Err(ExitGameError::RangesDoNotOverlap {
                earlier: earlier_exit_id,
                later: later_exit_id,
            });
        }
        if earlier.state_update.snapshot_index >= later.state_update.snapshot_index {
            return Err(ExitGameError::PriorityViolation {
                earlier: earlier_exit_id,
                later: later_exit_id,
            });
        }
        if later.is_redeemable(self.height()) {
            return Err(ExitGameError::LaterExitAlreadyRedeemable(later_exit_id));
        }
        let earlier_redeemable_at = earlier.redeemable_at;

        let challenge_id = self.store.challenges.open(earlier_exit_id, later_exit_id);
        let later = self.store.exits.get_mut(later_exit_id)?;
        later.challenge_count += 1;
        if later.redeemable_at < earlier_redeemable_at {
            later.redeemable_at = earlier_redeemable_at;
        }

        tracing::info!(
            challenge = %challenge_id,
            earlier = %earlier_exit_id,
            later = %later_exit_id,
            later_challenges = later.challenge_count,
            later_redeemable_at = later.redeemable_at,
            "Challenge opened"
        );
        self.record(ExitGameEvent::ChallengeOpened {
            challenge_id,
            earlier_exit_id,
            later_exit_id,
        });
        Ok(challenge_id)
    }

    /// Dismiss a challenge whose earlier exit has been revoked.
    ///
    /// # Errors
    /// - `ChallengeNotFound` for an unknown or already removed challenge
    /// - `EarlierExitNotRevoked` if the challenger's exit still stands
    pub fn remove_challenge(&mut self, challenge_id: ChallengeId) -> Result<()> {
        let challenge = *self.store.challenges.get(challenge_id)?;
        if !self.store.exits.get(challenge.earlier_exit_id)?.is_revoked() {
            return Err(ExitGameError::EarlierExitNotRevoked(challenge_id));
        }
        // Validate the later exit exists before mutating anything.
        self.store.exits.get(challenge.later_exit_id)?;

        self.store.challenges.remove(challenge_id)?;
        let later = self.store.exits.get_mut(challenge.later_exit_id)?;
        later.challenge_count = later.challenge_count.saturating_sub(1);

        tracing::info!(
            challenge = %challenge_id,
            later = %challenge.later_exit_id,
            later_challenges = later.challenge_count,
            "Challenge removed"
        );
        self.record(ExitGameEvent::ChallengeRemoved {
            challenge_id,
            later_exit_id: challenge.later_exit_id,
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Finalization
    // -----------------------------------------------------------------

    /// Finalize an exit whose predicate needs no call data.
    pub fn finalize_exit(&mut self, exit_id: ExitId, exitable_range_key: u64) -> Result<()> {
        self.finalize_exit_with(exit_id, exitable_range_key, &FinalizationWitness::None)
    }

    /// Pay out an unchallenged exit whose window has passed and remove its
    /// range from the exitable set.
    ///
    /// # Errors
    /// - `ExitRevoked` / `ExitAlreadyFinalized` if the exit is not pending
    /// - `NotYetRedeemable` before `redeemable_at`
    /// - `HasOpenChallenges` while any challenge names this exit
    /// - `RangeNotExitable` if the range is not inside `exitable_range_key`
    /// - any disbursement error from the predicate or ledger
    pub fn finalize_exit_with(
        &mut self,
        exit_id: ExitId,
        exitable_range_key: u64,
        witness: &FinalizationWitness,
    ) -> Result<()> {
        let exit = self.store.exits.get(exit_id)?.clone();
        exit.ensure_pending()?;
        let current_height = self.height();
        if !exit.is_redeemable(current_height) {
            return Err(ExitGameError::NotYetRedeemable {
                redeemable_at: exit.redeemable_at,
                current_height,
            });
        }
        if exit.challenge_count > 0 {
            return Err(ExitGameError::HasOpenChallenges(exit.challenge_count));
        }
        let split = self.store.ranges.plan_finalize(
            exitable_range_key,
            exit.state_update.start,
            exit.state_update.end,
        )?;
        let predicate_address = exit.state_update.state.predicate;
        let predicate = self.predicate(predicate_address)?;

        let custody = self.config.plasma_address;
        let amount = exit.state_update.width();
        let prior_allowance = self.ledger.allowance(custody, predicate_address);
        self.ledger.approve(custody, predicate_address, amount);
        let mut ctx = DisbursementContext {
            plasma_address: custody,
            predicate_address,
            ledger: &mut self.ledger,
        };
        let outcome = predicate.finalize_exit(&mut ctx, &exit, witness);
        // The approval is scoped to this one payout.
        self.ledger
            .approve(custody, predicate_address, prior_allowance);
        let recipient = match outcome {
            Ok(recipient) => recipient,
            Err(err) => {
                tracing::warn!(exit = %exit_id, error = %err, "Finalization rejected by predicate");
                return Err(err);
            }
        };

        self.store.ranges.apply_split(&split);
        self.store
            .exits
            .get_mut(exit_id)?
            .transition_to(ExitStatus::Finalized)?;

        tracing::info!(
            exit = %exit_id,
            recipient = %recipient.short(),
            amount,
            range_key = exitable_range_key,
            "Exit finalized"
        );
        self.record(ExitGameEvent::ExitFinalized {
            exit_id,
            recipient,
            amount,
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Invariants
    // -----------------------------------------------------------------

    /// Check that custody holds exactly the value of the exitable ranges.
    ///
    /// ```text
    /// ledger.balance_of(plasma) == Σ (upper - lower) over exitable ranges
    /// ```
    pub fn verify_custody(&self) -> Result<()> {
        let held = self.ledger.balance_of(self.config.plasma_address);
        let exitable = self.store.ranges.exitable_total();
        if held != exitable {
            return Err(ExitGameError::CustodyInvariantViolation {
                reason: format!(
                    "custody holds {held} but exitable ranges total {exitable} \
                     (deposited={})",
                    self.store.ranges.total_deposited()
                ),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn exit(&self, exit_id: ExitId) -> Result<&Exit> {
        self.store.exits.get(exit_id)
    }

    pub fn challenge(&self, challenge_id: ChallengeId) -> Result<&Challenge> {
        self.store.challenges.get(challenge_id)
    }

    /// Open challenges naming `exit_id` as the later exit.
    pub fn open_challenges_against(&self, exit_id: ExitId) -> impl Iterator<Item = &Challenge> {
        self.store.challenges.against(exit_id)
    }

    #[must_use]
    pub fn deposit_record(&self, deposit_end: u64) -> Option<&StateUpdate> {
        self.store.ranges.deposit(deposit_end)
    }

    #[must_use]
    pub fn exitable_ranges(&self) -> &BTreeMap<u64, u64> {
        self.store.ranges.exitable_ranges()
    }

    /// Key of the exitable range containing `[start, end)`, for building
    /// `finalize_exit` calls.
    #[must_use]
    pub fn find_exitable_range(&self, start: u64, end: u64) -> Option<u64> {
        self.store.ranges.find_exitable_range(start, end)
    }

    #[must_use]
    pub fn total_deposited(&self) -> u64 {
        self.store.ranges.total_deposited()
    }

    #[must_use]
    pub fn store(&self) -> &ExitGameStore {
        &self.store
    }

    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    #[must_use]
    pub fn config(&self) -> &ExitGameConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    #[must_use]
    pub fn commitment_log(&self) -> &G {
        &self.commitment_log
    }

    pub fn commitment_log_mut(&mut self) -> &mut G {
        &mut self.commitment_log
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn height(&self) -> u64 {
        self.clock.current_height()
    }

    fn predicate(&self, address: Address) -> Result<Arc<dyn Predicate>> {
        self.predicates
            .get(&address)
            .cloned()
            .ok_or(ExitGameError::PredicateNotRegistered(address))
    }

    fn record(&mut self, event: ExitGameEvent) {
        let height = self.height();
        tracing::debug!(height, kind = event.kind(), "Event recorded");
        self.events.push(EventRecord::new(height, event));
    }
}
