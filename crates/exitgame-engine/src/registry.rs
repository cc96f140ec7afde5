//! Exit and challenge registries.
//!
//! Exits are never deleted: a revoked or finalized exit keeps its slot so
//! challenges can keep referring to it by id. Challenges are deleted when
//! dismissed, but their ids come from a counter and are never reused.

use std::collections::BTreeMap;

use exitgame_types::{Challenge, ChallengeId, Exit, ExitGameError, ExitId, Result, StateUpdate};
use serde::{Deserialize, Serialize};

/// Ordered list of every exit ever opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRegistry {
    exits: Vec<Exit>,
}

impl ExitRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pending exit and return its id.
    pub fn open(&mut self, state_update: StateUpdate, redeemable_at: u64) -> ExitId {
        let id = ExitId(u64::try_from(self.exits.len()).unwrap_or(u64::MAX));
        self.exits.push(Exit::pending(id, state_update, redeemable_at));
        id
    }

    /// # Errors
    /// Returns [`ExitGameError::ExitNotFound`] for an unknown id.
    pub fn get(&self, id: ExitId) -> Result<&Exit> {
        usize::try_from(id.0)
            .ok()
            .and_then(|idx| self.exits.get(idx))
            .ok_or(ExitGameError::ExitNotFound(id))
    }

    /// # Errors
    /// Returns [`ExitGameError::ExitNotFound`] for an unknown id.
    pub fn get_mut(&mut self, id: ExitId) -> Result<&mut Exit> {
        usize::try_from(id.0)
            .ok()
            .and_then(|idx| self.exits.get_mut(idx))
            .ok_or(ExitGameError::ExitNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exit> {
        self.exits.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.exits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exits.is_empty()
    }

    /// Number of exits still pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.exits.iter().filter(|e| e.is_pending()).count()
    }
}

/// Open challenges keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRegistry {
    challenges: BTreeMap<ChallengeId, Challenge>,
    next_id: ChallengeId,
}

impl ChallengeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a challenge of `later` by `earlier`.
    pub fn open(&mut self, earlier_exit_id: ExitId, later_exit_id: ExitId) -> ChallengeId {
        let id = self.next_id;
        self.next_id = id.next();
        self.challenges.insert(
            id,
            Challenge {
                id,
                earlier_exit_id,
                later_exit_id,
            },
        );
        id
    }

    /// # Errors
    /// Returns [`ExitGameError::ChallengeNotFound`] for an unknown or
    /// already removed id.
    pub fn get(&self, id: ChallengeId) -> Result<&Challenge> {
        self.challenges
            .get(&id)
            .ok_or(ExitGameError::ChallengeNotFound(id))
    }

    /// Delete a challenge.
    ///
    /// # Errors
    /// Returns [`ExitGameError::ChallengeNotFound`] for an unknown id.
    pub fn remove(&mut self, id: ChallengeId) -> Result<Challenge> {
        self.challenges
            .remove(&id)
            .ok_or(ExitGameError::ChallengeNotFound(id))
    }

    /// Challenges naming `exit_id` as the later exit.
    pub fn against(&self, exit_id: ExitId) -> impl Iterator<Item = &Challenge> {
        self.challenges
            .values()
            .filter(move |c| c.later_exit_id == exit_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}
