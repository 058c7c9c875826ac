//! Proposal records and the proposal store.
//!
//! Proposals live in an arena keyed by sequential integer identifiers, never
//! deleted, never reused. Only the action hash is persisted for the action
//! list; the full list travels in the creation event and must be replayed
//! verbatim at execution.

use crate::codec::{sha256, to_cbor, CodecError};
use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sequential proposal identifier, allocated from 1.
pub type ProposalId = u64;

/// One external action in a proposal's action list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Call target.
    pub target: Address,
    /// Value attached to the dispatched call, in base units.
    pub value: u64,
    /// Textual function signature. Empty means the payload is dispatched
    /// verbatim; otherwise a 4-byte selector is derived and prepended.
    pub signature: String,
    /// Opaque call payload.
    pub payload: Vec<u8>,
}

/// Content hash of a proposal's action list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionHash([u8; 32]);

impl ActionHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ActionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Hash the canonical encoding of an action list.
///
/// Order-sensitive: reordering otherwise identical actions changes the hash.
pub fn action_hash(actions: &[Action]) -> Result<ActionHash, CodecError> {
    Ok(ActionHash(sha256(&to_cbor(&actions)?)))
}

/// A stored proposal.
///
/// The phase is derived by `status::resolve`, never stored; the four flags
/// and two counters below are the only persisted mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// Creator, fixed at creation.
    pub proposer: Address,
    /// Content hash of the voted-on action list, fixed at creation.
    pub action_hash: ActionHash,
    /// Creation timestamp, fixed at creation.
    pub created_at: u64,
    /// Count of recorded votes. Equals `votes.len()`.
    pub total_votes: u64,
    /// Count of affirmative votes. Never exceeds `total_votes`.
    pub yay_votes: u64,
    /// One-way cancellation flag, proposer-only, cancel window only.
    pub canceled: bool,
    /// Transient guard, true only inside a running execution.
    pub executing: bool,
    /// One-way terminal flag.
    pub execution_completed: bool,
    /// Recorded votes by member. Presence is the "has voted" flag; a
    /// present record is immutable.
    pub votes: HashMap<Address, bool>,
}

impl Proposal {
    fn new(proposer: Address, action_hash: ActionHash, created_at: u64) -> Self {
        Self {
            proposer,
            action_hash,
            created_at,
            total_votes: 0,
            yay_votes: 0,
            canceled: false,
            executing: false,
            execution_completed: false,
            votes: HashMap::new(),
        }
    }
}

/// Arena of proposals keyed by sequential identifiers.
#[derive(Debug, Clone)]
pub struct ProposalStore {
    proposals: HashMap<ProposalId, Proposal>,
    next_id: ProposalId,
}

impl Default for ProposalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProposalStore {
    pub fn new() -> Self {
        Self {
            proposals: HashMap::new(),
            next_id: 1,
        }
    }

    /// Allocate the next identifier and store a fresh proposal under it.
    pub fn insert(
        &mut self,
        proposer: Address,
        action_hash: ActionHash,
        created_at: u64,
    ) -> ProposalId {
        let id = self.next_id;
        self.next_id += 1;
        self.proposals
            .insert(id, Proposal::new(proposer, action_hash, created_at));
        id
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    pub fn get_mut(&mut self, id: ProposalId) -> Option<&mut Proposal> {
        self.proposals.get_mut(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    fn dummy_hash() -> ActionHash {
        action_hash(&[Action {
            target: addr(9),
            value: 0,
            signature: String::new(),
            payload: vec![],
        }])
        .unwrap()
    }

    #[test]
    fn identifiers_are_sequential_from_one() {
        let mut store = ProposalStore::new();
        assert_eq!(store.insert(addr(1), dummy_hash(), 0), 1);
        assert_eq!(store.insert(addr(1), dummy_hash(), 0), 2);
        assert_eq!(store.insert(addr(2), dummy_hash(), 0), 3);
        assert!(store.get(0).is_none());
        assert!(store.get(4).is_none());
    }

    #[test]
    fn action_hash_is_order_sensitive() {
        let a = Action {
            target: addr(1),
            value: 1,
            signature: "f()".to_string(),
            payload: vec![1],
        };
        let b = Action {
            target: addr(2),
            value: 2,
            signature: "g()".to_string(),
            payload: vec![2],
        };
        let forward = action_hash(&[a.clone(), b.clone()]).unwrap();
        let reversed = action_hash(&[b, a]).unwrap();
        assert_ne!(forward, reversed);
    }

    #[test]
    fn action_hash_is_content_sensitive() {
        let mut action = Action {
            target: addr(1),
            value: 1,
            signature: "f()".to_string(),
            payload: vec![1],
        };
        let original = action_hash(std::slice::from_ref(&action)).unwrap();
        action.payload = vec![2];
        let modified = action_hash(std::slice::from_ref(&action)).unwrap();
        assert_ne!(original, modified);
    }
}
