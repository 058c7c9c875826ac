//! Collective decision-making core.
//!
//! A fixed pool of members jointly authorizes opaque external actions via
//! timed, quorum-gated proposals. The [`Dao`] aggregate owns the membership
//! set, the proposal store, and the event journal; every state-changing
//! operation runs to completion (success or total rollback) through
//! `&mut Dao`, so effects never interleave.

pub mod execution;
pub mod proposal;
pub mod status;
pub mod voting;

pub use proposal::{Action, ActionHash, Proposal, ProposalId};
pub use status::ProposalStatus;

use crate::codec::CodecError;
use crate::crypto::DomainSeparator;
use crate::env::{CallError, Env};
use crate::identity::Address;
use crate::market::asset_received_ack;
use proposal::ProposalStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Cooperative configuration.
///
/// Defaults mirror the deployed reference: two days of voting, one day to
/// execute, a ten-minute cancel window, 25% quorum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaoConfig {
    /// Chain identifier mixed into the signature domain separator.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Length of the voting window in seconds.
    #[serde(default = "default_voting_period_secs")]
    pub voting_period_secs: u64,

    /// Length of the execution window in seconds, after voting ends.
    #[serde(default = "default_execution_window_secs")]
    pub execution_window_secs: u64,

    /// Length of the proposer-only cancel window in seconds.
    #[serde(default = "default_cancel_window_secs")]
    pub cancel_window_secs: u64,

    /// Quorum percentage. Recorded votes must strictly exceed
    /// `member_count * quorum_percent / 100` (integer floor division).
    #[serde(default = "default_quorum_percent")]
    pub quorum_percent: u64,

    /// Exact admission fee in base units.
    #[serde(default = "default_join_fee")]
    pub join_fee: u64,
}

fn default_chain_id() -> u64 {
    1
}

fn default_voting_period_secs() -> u64 {
    172_800 // 48 hours
}

fn default_execution_window_secs() -> u64 {
    86_400 // 24 hours
}

fn default_cancel_window_secs() -> u64 {
    600 // 10 minutes
}

fn default_quorum_percent() -> u64 {
    25
}

fn default_join_fee() -> u64 {
    1_000_000
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            voting_period_secs: default_voting_period_secs(),
            execution_window_secs: default_execution_window_secs(),
            cancel_window_secs: default_cancel_window_secs(),
            quorum_percent: default_quorum_percent(),
            join_fee: default_join_fee(),
        }
    }
}

/// Notifications emitted by state-changing operations.
///
/// The journal is ordered and observable via [`Dao::events`]; a failed
/// execution rolls its emissions back along with everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    MemberJoined {
        member: Address,
    },
    /// Carries the full action list; only its hash is persisted.
    ProposalCreated {
        id: ProposalId,
        proposer: Address,
        actions: Vec<Action>,
    },
    ProposalCanceled {
        id: ProposalId,
    },
    VoteCast {
        id: ProposalId,
        voter: Address,
        support: bool,
    },
    ProposalExecuted {
        id: ProposalId,
    },
    AssetReceived {
        operator: Address,
        from: Address,
        item_id: u64,
        data: Vec<u8>,
    },
    PurchaseCompleted {
        collection: Address,
        item_id: u64,
        budget: u64,
        price_paid: u64,
    },
}

/// Failures surfaced by cooperative operations.
#[derive(Debug, thiserror::Error)]
pub enum DaoError {
    #[error("wrong admission fee: paid {paid}, required {required}")]
    WrongFee { paid: u64, required: u64 },

    #[error("already a member: {0}")]
    AlreadyMember(Address),

    #[error("not a member: {0}")]
    NotMember(Address),

    #[error("unknown proposal {0}")]
    InvalidProposal(ProposalId),

    #[error("proposal {0} is not accepting votes")]
    NotVoting(ProposalId),

    #[error("member {member} already voted on proposal {id}")]
    AlreadyVoted { id: ProposalId, member: Address },

    #[error("action lists are empty or of mismatched lengths")]
    InvalidArity,

    #[error("only the proposer can cancel")]
    NotProposer,

    #[error("cancel window for proposal {0} has elapsed")]
    CannotCancel(ProposalId),

    #[error("proposal {0} is not in an executable state")]
    CannotExecute(ProposalId),

    #[error("supplied actions do not match the voted-on action hash for proposal {0}")]
    InvalidExecution(ProposalId),

    #[error("action {index} failed: {source}")]
    ActionFailed { index: usize, source: CallError },

    #[error("marketplace call failed: {0}")]
    MarketplaceCall(CallError),

    #[error("purchase price {price} exceeds authorized budget {budget}")]
    InsufficientBudget { price: u64, budget: u64 },

    #[error("re-entrant invocation of the purchase helper")]
    ReentrantCall,

    #[error("privileged helper is only callable by the cooperative itself")]
    NotSelf,

    #[error("unsupported self-call selector")]
    UnsupportedCall,

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// The cooperative: membership, proposals, votes, and execution.
pub struct Dao {
    /// Identity of this deployed instance; self-targeted actions route to
    /// the privileged purchase helper.
    address: Address,
    config: DaoConfig,
    domain: DomainSeparator,
    /// Admitted members. Append-only; the count is the cardinality.
    members: HashSet<Address>,
    proposals: ProposalStore,
    events: Vec<Event>,
    /// Test-and-set barrier around the purchase helper.
    purchase_lock: Arc<AtomicBool>,
}

impl Dao {
    /// Create a cooperative instance. The domain separator is fixed here
    /// and immutable thereafter.
    pub fn new(address: Address, config: DaoConfig) -> Self {
        let domain = DomainSeparator::new(config.chain_id, address);
        Self {
            address,
            config,
            domain,
            members: HashSet::new(),
            proposals: ProposalStore::new(),
            events: Vec::new(),
            purchase_lock: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    /// Signature domain separator of this instance.
    pub fn domain(&self) -> &DomainSeparator {
        &self.domain
    }

    pub fn is_member(&self, account: Address) -> bool {
        self.members.contains(&account)
    }

    pub fn member_count(&self) -> u64 {
        self.members.len() as u64
    }

    /// Ordered notification journal.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Admit `caller` against an exact admission fee.
    pub fn join(&mut self, caller: Address, fee_paid: u64) -> Result<(), DaoError> {
        if fee_paid != self.config.join_fee {
            return Err(DaoError::WrongFee {
                paid: fee_paid,
                required: self.config.join_fee,
            });
        }
        if self.members.contains(&caller) {
            return Err(DaoError::AlreadyMember(caller));
        }
        self.members.insert(caller);
        self.events.push(Event::MemberJoined { member: caller });
        info!(member = %caller, count = self.members.len(), "member admitted");
        Ok(())
    }

    /// Admit `caller` and immediately cast a direct vote.
    ///
    /// Vote validation failures are hard errors even on this convenience
    /// path, and they leave the caller unadmitted: the vote's preconditions
    /// are checked before admission.
    pub fn join_with_vote<E: Env>(
        &mut self,
        env: &E,
        caller: Address,
        fee_paid: u64,
        proposal_id: ProposalId,
        support: bool,
    ) -> Result<(), DaoError> {
        if fee_paid != self.config.join_fee {
            return Err(DaoError::WrongFee {
                paid: fee_paid,
                required: self.config.join_fee,
            });
        }
        if self.members.contains(&caller) {
            return Err(DaoError::AlreadyMember(caller));
        }

        // A brand-new member cannot have an existing vote record, so the
        // remaining vote preconditions are existence and phase.
        let proposal = self
            .proposals
            .get(proposal_id)
            .ok_or(DaoError::InvalidProposal(proposal_id))?;
        if status::resolve(proposal, self.member_count() + 1, &self.config, env.now())
            != ProposalStatus::Voting
        {
            return Err(DaoError::NotVoting(proposal_id));
        }

        self.members.insert(caller);
        self.events.push(Event::MemberJoined { member: caller });
        info!(member = %caller, count = self.members.len(), "member admitted");

        self.record_vote(env, caller, proposal_id, support)
    }

    /// Create a proposal from four parallel lists.
    ///
    /// The lists must be non-empty and of equal length. Only the content
    /// hash of the zipped action list is persisted; the creation event
    /// carries the full list for off-chain observers.
    pub fn propose<E: Env>(
        &mut self,
        env: &E,
        caller: Address,
        targets: Vec<Address>,
        values: Vec<u64>,
        signatures: Vec<String>,
        payloads: Vec<Vec<u8>>,
    ) -> Result<ProposalId, DaoError> {
        if !self.members.contains(&caller) {
            return Err(DaoError::NotMember(caller));
        }
        if targets.is_empty()
            || targets.len() != values.len()
            || targets.len() != signatures.len()
            || targets.len() != payloads.len()
        {
            return Err(DaoError::InvalidArity);
        }

        let actions: Vec<Action> = targets
            .into_iter()
            .zip(values)
            .zip(signatures)
            .zip(payloads)
            .map(|(((target, value), signature), payload)| Action {
                target,
                value,
                signature,
                payload,
            })
            .collect();

        let hash = proposal::action_hash(&actions)?;
        let id = self.proposals.insert(caller, hash, env.now());
        info!(id, proposer = %caller, actions = actions.len(), hash = %hash, "proposal created");
        self.events.push(Event::ProposalCreated {
            id,
            proposer: caller,
            actions,
        });
        Ok(id)
    }

    /// Cancel a proposal. Proposer-only, and only inside the cancel window.
    pub fn cancel<E: Env>(
        &mut self,
        env: &E,
        caller: Address,
        id: ProposalId,
    ) -> Result<(), DaoError> {
        let cancel_window = self.config.cancel_window_secs;
        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or(DaoError::InvalidProposal(id))?;
        if proposal.proposer != caller {
            return Err(DaoError::NotProposer);
        }
        if env.now() >= proposal.created_at + cancel_window {
            return Err(DaoError::CannotCancel(id));
        }
        proposal.canceled = true;
        self.events.push(Event::ProposalCanceled { id });
        info!(id, "proposal canceled");
        Ok(())
    }

    /// Resolve the current phase of a proposal.
    pub fn proposal_status<E: Env>(&self, env: &E, id: ProposalId) -> ProposalStatus {
        match self.proposals.get(id) {
            None => ProposalStatus::NotCreated,
            Some(p) => status::resolve(p, self.member_count(), &self.config, env.now()),
        }
    }

    /// A member's recorded choice on a proposal, if any.
    pub fn member_vote(&self, id: ProposalId, member: Address) -> Option<bool> {
        self.proposals
            .get(id)?
            .votes
            .get(&member)
            .copied()
    }

    /// Inbound asset-receipt callback.
    ///
    /// Pure notification: emits the event and returns the fixed
    /// acknowledgement token the sender's safe-transfer logic expects.
    pub fn on_asset_received(
        &mut self,
        operator: Address,
        from: Address,
        item_id: u64,
        data: Vec<u8>,
    ) -> [u8; 4] {
        info!(%operator, %from, item_id, "asset received");
        self.events.push(Event::AssetReceived {
            operator,
            from,
            item_id,
            data,
        });
        asset_received_ack()
    }
}
