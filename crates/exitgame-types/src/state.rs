//! State model: who governs a range, and claims about that as of a snapshot.
//!
//! A [`State`] names the predicate that governs a range plus the
//! predicate-specific [`Parameters`]. A [`StateUpdate`] claims that the
//! half-open range `[start, end)` was governed by that state as of a given
//! [`SnapshotIndex`]. Both are immutable once built.

use serde::{Deserialize, Serialize};

use crate::{Address, ExitGameError, Result, SnapshotIndex};

/// Predicate-specific authorization parameters carried by a [`State`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Parameters {
    /// A single owner controls the range.
    Ownership { owner: Address },
    /// Every listed recipient must sign off on spends and disbursement.
    MultiSig { recipients: Vec<Address> },
}

/// The governing state of a range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    /// Address of the predicate that interprets `parameters`.
    pub predicate: Address,
    pub parameters: Parameters,
}

impl State {
    #[must_use]
    pub fn new(predicate: Address, parameters: Parameters) -> Self {
        Self {
            predicate,
            parameters,
        }
    }

    /// A state owned outright by `owner`.
    #[must_use]
    pub fn ownership(predicate: Address, owner: Address) -> Self {
        Self::new(predicate, Parameters::Ownership { owner })
    }

    /// A state that needs every one of `recipients` to sign.
    #[must_use]
    pub fn multisig(predicate: Address, recipients: Vec<Address>) -> Self {
        Self::new(predicate, Parameters::MultiSig { recipients })
    }

    /// The owner, if this is an ownership state.
    #[must_use]
    pub fn owner(&self) -> Option<Address> {
        match &self.parameters {
            Parameters::Ownership { owner } => Some(*owner),
            Parameters::MultiSig { .. } => None,
        }
    }

    /// The recipient set, if this is a multisig state.
    #[must_use]
    pub fn recipients(&self) -> Option<&[Address]> {
        match &self.parameters {
            Parameters::MultiSig { recipients } => Some(recipients),
            Parameters::Ownership { .. } => None,
        }
    }
}

/// A claim that `[start, end)` was governed by `state` as of `snapshot_index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateUpdate {
    pub state: State,
    pub start: u64,
    pub end: u64,
    pub snapshot_index: SnapshotIndex,
}

impl StateUpdate {
    /// Build a state update, rejecting empty or inverted ranges.
    ///
    /// # Errors
    /// Returns [`ExitGameError::InvalidRange`] if `start >= end`.
    pub fn new(state: State, start: u64, end: u64, snapshot_index: SnapshotIndex) -> Result<Self> {
        if start >= end {
            return Err(ExitGameError::InvalidRange { start, end });
        }
        Ok(Self {
            state,
            start,
            end,
            snapshot_index,
        })
    }

    /// Number of units covered by the range.
    #[must_use]
    pub fn width(&self) -> u64 {
        self.end - self.start
    }

    /// Whether `position` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position < self.end
    }

    /// Whether the two half-open ranges share at least one position.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Opaque authorization value. The host authenticates `signer`; the exit
/// game only compares signers for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub signer: Address,
}

impl Signature {
    #[must_use]
    pub fn by(signer: Address) -> Self {
        Self { signer }
    }
}

/// Opaque inclusion proof bytes, interpreted only by the commitment log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InclusionWitness(pub Vec<u8>);

impl InclusionWitness {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Proof that a state update was superseded by a newer committed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationWitness {
    /// The newer update that spends the exited range.
    pub next_state_update: StateUpdate,
    /// Signatures of the parties that authorized the spend.
    pub signatures: Vec<Signature>,
    /// Proof that `next_state_update` is in the commitment log.
    pub inclusion_witness: InclusionWitness,
}

/// Call data supplied when an exit is finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizationWitness {
    /// No extra data: the predicate knows the recipient from the state.
    #[default]
    None,
    /// All multisig recipients agree to pay out to `destination`.
    MultiSig {
        signatures: Vec<Signature>,
        destination: Address,
    },
}

/// Whether `signatures` were produced by exactly the parties in `required`,
/// in the same order.
#[must_use]
pub fn signed_by_all(signatures: &[Signature], required: &[Address]) -> bool {
    signatures.len() == required.len()
        && signatures
            .iter()
            .zip(required)
            .all(|(sig, party)| sig.signer == *party)
}

#[cfg(any(test, feature = "test-helpers"))]
impl StateUpdate {
    /// An ownership update for tests. Panics on an invalid range.
    #[must_use]
    pub fn dummy_owned(
        predicate: Address,
        owner: Address,
        start: u64,
        end: u64,
        snapshot_index: u64,
    ) -> Self {
        Self::new(
            State::ownership(predicate, owner),
            start,
            end,
            SnapshotIndex(snapshot_index),
        )
        .expect("dummy range must be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(start: u64, end: u64) -> StateUpdate {
        StateUpdate::dummy_owned(
            Address::derive("ownership"),
            Address::derive("alice"),
            start,
            end,
            1,
        )
    }

    #[test]
    fn empty_range_rejected() {
        let state = State::ownership(Address::derive("p"), Address::derive("a"));
        let err = StateUpdate::new(state.clone(), 5, 5, SnapshotIndex(0)).unwrap_err();
        assert!(matches!(err, ExitGameError::InvalidRange { start: 5, end: 5 }));
        assert!(StateUpdate::new(state, 6, 5, SnapshotIndex(0)).is_err());
    }

    #[test]
    fn width_and_contains() {
        let su = owned(10, 20);
        assert_eq!(su.width(), 10);
        assert!(su.contains(10));
        assert!(su.contains(19));
        assert!(!su.contains(20));
        assert!(!su.contains(9));
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = owned(0, 10);
        let b = owned(10, 20);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn nested_and_partial_ranges_overlap() {
        let outer = owned(0, 100);
        let inner = owned(40, 60);
        let tail = owned(90, 120);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(outer.overlaps(&tail));
        assert!(!inner.overlaps(&tail));
    }

    #[test]
    fn state_accessors() {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let own = State::ownership(Address::derive("p"), alice);
        assert_eq!(own.owner(), Some(alice));
        assert!(own.recipients().is_none());

        let ms = State::multisig(Address::derive("m"), vec![alice, bob]);
        assert!(ms.owner().is_none());
        assert_eq!(ms.recipients(), Some(&[alice, bob][..]));
    }

    #[test]
    fn signed_by_all_requires_exact_set() {
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        let both = [Signature::by(alice), Signature::by(bob)];
        assert!(signed_by_all(&both, &[alice, bob]));
        assert!(!signed_by_all(&both[..1], &[alice, bob]));
        assert!(!signed_by_all(&[Signature::by(bob), Signature::by(alice)], &[alice, bob]));
    }

    #[test]
    fn parameters_serialize_with_kind_tag() {
        let params = Parameters::Ownership {
            owner: Address::ZERO,
        };
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"kind\":\"ownership\""), "Got: {json}");
    }
}
