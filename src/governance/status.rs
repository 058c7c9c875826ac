//! Proposal phase resolution.
//!
//! The phase is a pure function of the stored flags, the counters, the
//! membership count, and the ambient clock. It is recomputed on every use
//! and never cached.

use super::proposal::Proposal;
use super::DaoConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived proposal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Identifier was never allocated.
    NotCreated,
    /// Inside the voting window.
    Voting,
    /// Execution window, quorum and majority both hold.
    ReadyForExecute,
    /// An execution is in flight.
    Executing,
    /// Terminal: canceled, executed, or the window passed without quorum,
    /// majority, or execution. Nothing resurrects a closed proposal.
    Closed,
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalStatus::NotCreated => "not-created",
            ProposalStatus::Voting => "voting",
            ProposalStatus::ReadyForExecute => "ready-for-execute",
            ProposalStatus::Executing => "executing",
            ProposalStatus::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// Quorum: recorded votes must strictly exceed the floor-division threshold
/// `member_count * quorum_percent / 100`.
///
/// Integer floor semantics are deliberate: below four members (at 25%) the
/// threshold is 0, so any single vote satisfies quorum.
pub fn quorum_met(total_votes: u64, member_count: u64, quorum_percent: u64) -> bool {
    total_votes > member_count * quorum_percent / 100
}

/// Strict majority: affirmative votes must exceed negative votes. Ties fail.
pub fn majority_met(yay_votes: u64, total_votes: u64) -> bool {
    yay_votes > total_votes - yay_votes
}

/// Resolve the phase of a stored proposal. First match wins.
pub fn resolve(
    proposal: &Proposal,
    member_count: u64,
    config: &DaoConfig,
    now: u64,
) -> ProposalStatus {
    if proposal.canceled || proposal.execution_completed {
        return ProposalStatus::Closed;
    }

    let voting_ends = proposal.created_at + config.voting_period_secs;
    if now < voting_ends {
        return ProposalStatus::Voting;
    }

    if now < voting_ends + config.execution_window_secs {
        if proposal.executing {
            return ProposalStatus::Executing;
        }
        if quorum_met(proposal.total_votes, member_count, config.quorum_percent)
            && majority_met(proposal.yay_votes, proposal.total_votes)
        {
            return ProposalStatus::ReadyForExecute;
        }
    }

    ProposalStatus::Closed
}
