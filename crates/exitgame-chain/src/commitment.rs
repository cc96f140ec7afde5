//! Append-only commitment log of operator blocks.
//!
//! A [`Block`] maps a subject address (the exit game contract the updates
//! belong to) to the ordered state updates committed for it. Blocks are
//! numbered from 1 in commit order; the number is the [`SnapshotIndex`]
//! that state updates in that block refer to.
//!
//! [`CommitmentChain`] keeps whole blocks and answers inclusion queries by
//! scanning the subject's updates. The inclusion witness is accepted but
//! not inspected.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use exitgame_types::{
    Address, ExitGameError, InclusionWitness, Parameters, Result, SnapshotIndex, StateUpdate,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Read side of the commitment log, as seen by the exit game.
pub trait CommitmentLog {
    /// Index of the most recently committed block, or
    /// [`SnapshotIndex::GENESIS`] if none has been committed.
    fn latest_index(&self) -> SnapshotIndex;

    /// Whether `state_update` was committed under `subject` in the block at
    /// `state_update.snapshot_index`.
    fn verify_inclusion(
        &self,
        state_update: &StateUpdate,
        subject: Address,
        witness: &InclusionWitness,
    ) -> bool;
}

/// One block's worth of state updates, grouped by subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub updates: BTreeMap<Address, Vec<StateUpdate>>,
}

impl Block {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `update` to `subject`'s list.
    #[must_use]
    pub fn with_update(mut self, subject: Address, update: StateUpdate) -> Self {
        self.updates.entry(subject).or_default().push(update);
        self
    }

    #[must_use]
    pub fn contains(&self, subject: Address, update: &StateUpdate) -> bool {
        self.updates
            .get(&subject)
            .is_some_and(|list| list.contains(update))
    }

    /// Total number of updates across all subjects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content digest for audit logs.
    ///
    /// `SHA-256(domain_sep || num_subjects || for each subject: addr || num_updates || updates)`
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"exitgame:block:v1:");
        hasher.update(len_bytes(self.updates.len()));
        for (subject, list) in &self.updates {
            hasher.update(subject.as_bytes());
            hasher.update(len_bytes(list.len()));
            for su in list {
                hasher.update(su.state.predicate.as_bytes());
                match &su.state.parameters {
                    Parameters::Ownership { owner } => {
                        hasher.update([0u8]);
                        hasher.update(owner.as_bytes());
                    }
                    Parameters::MultiSig { recipients } => {
                        hasher.update([1u8]);
                        hasher.update(len_bytes(recipients.len()));
                        for r in recipients {
                            hasher.update(r.as_bytes());
                        }
                    }
                }
                hasher.update(su.start.to_le_bytes());
                hasher.update(su.end.to_le_bytes());
                hasher.update(su.snapshot_index.0.to_le_bytes());
            }
        }
        hasher.finalize().into()
    }
}

fn len_bytes(len: usize) -> [u8; 8] {
    u64::try_from(len).unwrap_or(u64::MAX).to_le_bytes()
}

/// A block after it was accepted into the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedBlock {
    pub index: SnapshotIndex,
    pub block: Block,
    pub digest: [u8; 32],
    pub committed_at: DateTime<Utc>,
}

/// Operator-controlled commitment log that stores full blocks.
#[derive(Debug)]
pub struct CommitmentChain {
    operator: Address,
    blocks: Vec<CommittedBlock>,
}

impl CommitmentChain {
    #[must_use]
    pub fn new(operator: Address) -> Self {
        Self {
            operator,
            blocks: Vec::new(),
        }
    }

    #[must_use]
    pub fn operator(&self) -> Address {
        self.operator
    }

    /// The index the next committed block will receive.
    #[must_use]
    pub fn next_index(&self) -> SnapshotIndex {
        self.latest_index().next()
    }

    /// Append `block` to the log.
    ///
    /// # Errors
    /// Returns [`ExitGameError::Unauthorized`] unless `committer` is the
    /// operator.
    pub fn commit_block(&mut self, committer: Address, block: Block) -> Result<SnapshotIndex> {
        if committer != self.operator {
            tracing::warn!(committer = %committer, "Block commit rejected: not the operator");
            return Err(ExitGameError::Unauthorized {
                reason: format!("{committer} is not the commitment operator"),
            });
        }
        let index = self.next_index();
        let digest = block.digest();
        tracing::info!(
            block = index.0,
            updates = block.len(),
            digest = hex::encode(digest),
            "Block committed"
        );
        self.blocks.push(CommittedBlock {
            index,
            block,
            digest,
            committed_at: Utc::now(),
        });
        Ok(index)
    }

    /// Look up a committed block.
    #[must_use]
    pub fn block(&self, index: SnapshotIndex) -> Option<&CommittedBlock> {
        let pos = usize::try_from(index.0.checked_sub(1)?).ok()?;
        self.blocks.get(pos)
    }

    /// Number of committed blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl CommitmentLog for CommitmentChain {
    fn latest_index(&self) -> SnapshotIndex {
        SnapshotIndex(u64::try_from(self.blocks.len()).unwrap_or(u64::MAX))
    }

    fn verify_inclusion(
        &self,
        state_update: &StateUpdate,
        subject: Address,
        _witness: &InclusionWitness,
    ) -> bool {
        self.block(state_update.snapshot_index)
            .is_some_and(|committed| committed.block.contains(subject, state_update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator() -> Address {
        Address::derive("operator")
    }

    fn plasma() -> Address {
        Address::derive("plasma")
    }

    fn update(owner: &str, start: u64, end: u64, block: u64) -> StateUpdate {
        StateUpdate::dummy_owned(
            Address::derive("ownership"),
            Address::derive(owner),
            start,
            end,
            block,
        )
    }

    #[test]
    fn only_operator_commits() {
        let mut chain = CommitmentChain::new(operator());
        let err = chain
            .commit_block(Address::derive("mallory"), Block::new())
            .unwrap_err();
        assert!(matches!(err, ExitGameError::Unauthorized { .. }));
        assert!(chain.is_empty());
        assert_eq!(chain.latest_index(), SnapshotIndex::GENESIS);
    }

    #[test]
    fn blocks_numbered_from_one() {
        let mut chain = CommitmentChain::new(operator());
        assert_eq!(chain.next_index(), SnapshotIndex(1));
        let first = chain.commit_block(operator(), Block::new()).unwrap();
        let second = chain.commit_block(operator(), Block::new()).unwrap();
        assert_eq!(first, SnapshotIndex(1));
        assert_eq!(second, SnapshotIndex(2));
        assert_eq!(chain.latest_index(), SnapshotIndex(2));
        assert!(chain.block(SnapshotIndex::GENESIS).is_none());
        assert!(chain.block(SnapshotIndex(3)).is_none());
        assert_eq!(chain.block(SnapshotIndex(2)).unwrap().index, SnapshotIndex(2));
    }

    #[test]
    fn inclusion_found_for_committed_update() {
        let mut chain = CommitmentChain::new(operator());
        let su = update("bob", 0, 50, 1);
        chain
            .commit_block(operator(), Block::new().with_update(plasma(), su.clone()))
            .unwrap();
        assert!(chain.verify_inclusion(&su, plasma(), &InclusionWitness::empty()));
    }

    #[test]
    fn inclusion_fails_for_wrong_subject_or_block() {
        let mut chain = CommitmentChain::new(operator());
        let su = update("bob", 0, 50, 1);
        chain
            .commit_block(operator(), Block::new().with_update(plasma(), su.clone()))
            .unwrap();
        let w = InclusionWitness::empty();
        assert!(!chain.verify_inclusion(&su, Address::derive("other"), &w));

        // Same update claimed for a block that does not exist.
        let mut unknown = su.clone();
        unknown.snapshot_index = SnapshotIndex(9);
        assert!(!chain.verify_inclusion(&unknown, plasma(), &w));

        // Different range in the right block.
        assert!(!chain.verify_inclusion(&update("bob", 0, 51, 1), plasma(), &w));
    }

    #[test]
    fn genesis_index_never_included() {
        let chain = CommitmentChain::new(operator());
        let su = update("alice", 0, 10, 0);
        assert!(!chain.verify_inclusion(&su, plasma(), &InclusionWitness::empty()));
    }

    #[test]
    fn committed_block_survives_json() {
        let mut chain = CommitmentChain::new(operator());
        let block = Block::new()
            .with_update(plasma(), update("alice", 0, 10, 1))
            .with_update(plasma(), update("bob", 10, 20, 1))
            .with_update(Address::derive("other"), update("carol", 0, 5, 1));
        let index = chain.commit_block(operator(), block.clone()).unwrap();

        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
        assert_eq!(back.digest(), block.digest());

        let committed = chain.block(index).unwrap();
        let json = serde_json::to_string(committed).unwrap();
        let back: CommittedBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index, index);
        assert_eq!(back.block, block);
        assert_eq!(back.digest, committed.digest);
    }

    #[test]
    fn digest_depends_on_contents() {
        let a = Block::new().with_update(plasma(), update("alice", 0, 10, 1));
        let b = Block::new().with_update(plasma(), update("bob", 0, 10, 1));
        assert_eq!(a.digest(), a.clone().digest());
        assert_ne!(a.digest(), b.digest());
        assert_ne!(a.digest(), Block::new().digest());
    }
}
