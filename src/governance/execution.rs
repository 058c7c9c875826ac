//! Proposal execution: hash-gated, atomic, re-entrancy guarded.
//!
//! Execution replays the exact action list that was voted on, verified by
//! content hash. The whole list, together with the flag transitions and any
//! events emitted along the way, is one all-or-nothing unit: a restore
//! point over the environment, the proposal record, and the event journal
//! is taken up front and rolled back on any failure.

use super::status::{self, ProposalStatus};
use super::{Dao, DaoError, Event, ProposalId};
use crate::codec::{encode_call, from_cbor, selector, split_call};
use crate::env::Env;
use crate::governance::proposal::{action_hash, Action};
use crate::identity::Address;
use crate::market::{BuyOrder, PriceQuery, PurchaseRequest, BUY_SIG, GET_PRICE_SIG, PURCHASE_SIG};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Held while the purchase helper runs; released on every exit path.
struct ReentrancyGuard {
    lock: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    fn acquire(lock: &Arc<AtomicBool>) -> Result<Self, DaoError> {
        if lock
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DaoError::ReentrantCall);
        }
        Ok(Self { lock: Arc::clone(lock) })
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.lock.store(false, Ordering::Release);
    }
}

impl Dao {
    /// Execute a passed proposal by replaying its exact action list.
    ///
    /// Caller must be a member, the phase must resolve to exactly
    /// `ReadyForExecute`, and the hash of `actions` must equal the hash
    /// committed at proposal time.
    pub fn execute<E: Env>(
        &mut self,
        env: &mut E,
        caller: Address,
        id: ProposalId,
        actions: &[Action],
    ) -> Result<(), DaoError> {
        if !self.members.contains(&caller) {
            return Err(DaoError::NotMember(caller));
        }

        let member_count = self.member_count();
        let proposal = self
            .proposals
            .get(id)
            .ok_or(DaoError::CannotExecute(id))?;
        if status::resolve(proposal, member_count, &self.config, env.now())
            != ProposalStatus::ReadyForExecute
        {
            return Err(DaoError::CannotExecute(id));
        }
        if action_hash(actions)? != proposal.action_hash {
            return Err(DaoError::InvalidExecution(id));
        }

        // Restore point: environment, proposal record, event journal.
        let env_restore = env.snapshot();
        let proposal_restore = proposal.clone();
        let events_len = self.events.len();

        // Guards a concurrent status check from mistaking the proposal for
        // resurrectable while its actions run.
        self.proposals
            .get_mut(id)
            .expect("proposal presence checked above")
            .executing = true;
        info!(id, actions = actions.len(), "execution started");

        match self.run_actions(env, actions) {
            Ok(()) => {
                let proposal = self
                    .proposals
                    .get_mut(id)
                    .expect("proposal presence checked above");
                proposal.executing = false;
                proposal.execution_completed = true;
                self.events.push(Event::ProposalExecuted { id });
                info!(id, "execution completed");
                Ok(())
            }
            Err(error) => {
                env.restore(env_restore);
                self.events.truncate(events_len);
                *self
                    .proposals
                    .get_mut(id)
                    .expect("proposal presence checked above") = proposal_restore;
                warn!(id, %error, "execution rolled back");
                Err(error)
            }
        }
    }

    fn run_actions<E: Env>(&mut self, env: &mut E, actions: &[Action]) -> Result<(), DaoError> {
        for (index, action) in actions.iter().enumerate() {
            let data = if action.signature.is_empty() {
                action.payload.clone()
            } else {
                let mut data = selector(&action.signature).to_vec();
                data.extend_from_slice(&action.payload);
                data
            };

            if action.target == self.address {
                self.dispatch_self(env, &data)?;
            } else {
                env.call(self.address, action.target, action.value, &data)
                    .map_err(|source| DaoError::ActionFailed { index, source })?;
            }
        }
        Ok(())
    }

    /// Route a self-targeted action. Only the privileged purchase helper is
    /// reachable this way.
    fn dispatch_self<E: Env>(&mut self, env: &mut E, data: &[u8]) -> Result<(), DaoError> {
        let Some((sel, payload)) = split_call(data) else {
            return Err(DaoError::UnsupportedCall);
        };
        if sel != selector(PURCHASE_SIG) {
            return Err(DaoError::UnsupportedCall);
        }
        let request: PurchaseRequest = from_cbor(payload)?;
        self.purchase(env, self.address, request)
    }

    /// Privileged marketplace purchase.
    ///
    /// Callable only by the cooperative acting as itself, i.e. via the
    /// dispatch path inside `execute`. Wrapped in a re-entrancy barrier
    /// because the marketplace could attempt to call back in.
    pub fn purchase<E: Env>(
        &mut self,
        env: &mut E,
        caller: Address,
        request: PurchaseRequest,
    ) -> Result<(), DaoError> {
        if caller != self.address {
            return Err(DaoError::NotSelf);
        }
        let _guard = ReentrancyGuard::acquire(&self.purchase_lock)?;

        let query = encode_call(
            GET_PRICE_SIG,
            &PriceQuery {
                collection: request.collection,
                item_id: request.item_id,
            },
        )?;
        let response = env
            .call(self.address, request.marketplace, 0, &query)
            .map_err(DaoError::MarketplaceCall)?;
        let price: u64 = from_cbor(&response)?;

        if price > request.budget {
            return Err(DaoError::InsufficientBudget {
                price,
                budget: request.budget,
            });
        }

        let order = encode_call(
            BUY_SIG,
            &BuyOrder {
                collection: request.collection,
                item_id: request.item_id,
            },
        )?;
        // The buy must be paid at least the queried price; its failure
        // propagates as a hard execution failure.
        env.call(self.address, request.marketplace, price, &order)
            .map_err(DaoError::MarketplaceCall)?;

        info!(
            collection = %request.collection,
            item_id = request.item_id,
            price,
            budget = request.budget,
            "purchase completed"
        );
        self.events.push(Event::PurchaseCompleted {
            collection: request.collection,
            item_id: request.item_id,
            budget: request.budget,
            price_paid: price,
        });
        Ok(())
    }
}
