//! Vote application: direct, signed, and batched paths.
//!
//! All three paths funnel into one recording function so the validation
//! order and the emitted notification are identical regardless of entry.
//! Replay safety for signed votes is provided entirely by the already-voted
//! check; there is no per-signature nonce.

use super::status::{self, ProposalStatus};
use super::{Dao, DaoError, Event, ProposalId};
use crate::crypto::{recover_voter, VoteSignature};
use crate::env::Env;
use crate::identity::Address;
use tracing::{debug, info};

impl Dao {
    /// Record a vote for `voter`. Shared by every entry path.
    ///
    /// Validation order: proposal exists, voter is a member, phase is
    /// exactly `Voting`, voter has no existing record. Any failure aborts
    /// with no partial state change.
    pub(super) fn record_vote<E: Env>(
        &mut self,
        env: &E,
        voter: Address,
        id: ProposalId,
        support: bool,
    ) -> Result<(), DaoError> {
        let member_count = self.member_count();
        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or(DaoError::InvalidProposal(id))?;

        if !self.members.contains(&voter) {
            return Err(DaoError::NotMember(voter));
        }
        if status::resolve(proposal, member_count, &self.config, env.now())
            != ProposalStatus::Voting
        {
            return Err(DaoError::NotVoting(id));
        }
        if proposal.votes.contains_key(&voter) {
            return Err(DaoError::AlreadyVoted { id, member: voter });
        }

        proposal.votes.insert(voter, support);
        proposal.total_votes += 1;
        if support {
            proposal.yay_votes += 1;
        }
        self.events.push(Event::VoteCast { id, voter, support });
        info!(id, voter = %voter, support, "vote recorded");
        Ok(())
    }

    /// Caller-authenticated direct vote.
    pub fn vote<E: Env>(
        &mut self,
        env: &E,
        caller: Address,
        id: ProposalId,
        support: bool,
    ) -> Result<(), DaoError> {
        self.record_vote(env, caller, id, support)
    }

    /// Signed vote: the acting identity is recovered from the signature.
    ///
    /// A malformed signature recovers to the zero sentinel, which is never
    /// a member, so it fails hard here with `NotMember`.
    pub fn vote_by_signature<E: Env>(
        &mut self,
        env: &E,
        id: ProposalId,
        support: bool,
        signature: &VoteSignature,
    ) -> Result<(), DaoError> {
        let voter = recover_voter(&self.domain, id, support, signature);
        self.record_vote(env, voter, id, support)
    }

    /// Apply a batch of signed votes, one entry at a time, in order.
    ///
    /// The three parallel lists must be of equal length or the whole batch
    /// aborts before any entry is processed. Per-entry validation failures
    /// are silently skipped so one bad entry cannot void a relayed batch.
    /// Returns the number of votes actually applied.
    pub fn batch_vote_by_signature<E: Env>(
        &mut self,
        env: &E,
        ids: &[ProposalId],
        supports: &[bool],
        signatures: &[VoteSignature],
    ) -> Result<usize, DaoError> {
        if ids.len() != supports.len() || ids.len() != signatures.len() {
            return Err(DaoError::InvalidArity);
        }

        let mut applied = 0;
        for ((&id, &support), signature) in ids.iter().zip(supports).zip(signatures) {
            let voter = recover_voter(&self.domain, id, support, signature);
            match self.record_vote(env, voter, id, support) {
                Ok(()) => applied += 1,
                Err(reason) => {
                    debug!(id, voter = %voter, %reason, "batch entry skipped");
                }
            }
        }
        Ok(applied)
    }
}
