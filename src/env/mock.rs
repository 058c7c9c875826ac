//! In-memory environment for tests and the demo.

use super::{CallError, CallResult, Env};
use crate::identity::Address;
use crate::market::MockMarketplace;
use std::collections::{HashMap, HashSet};

/// A dispatched raw call recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub target: Address,
    pub value: u64,
    pub data: Vec<u8>,
}

/// In-memory [`Env`] with a manual clock, account balances, an optional
/// mock marketplace, and targets that can be forced to revert.
///
/// Snapshots are full clones; adequate for an in-memory mock and keeps the
/// trait surface small.
#[derive(Debug, Clone)]
pub struct InMemoryEnv {
    now: u64,
    balances: HashMap<Address, u64>,
    marketplace: Option<MockMarketplace>,
    failing: HashSet<Address>,
    dispatched: Vec<RecordedCall>,
}

impl InMemoryEnv {
    pub fn new() -> Self {
        Self {
            now: 0,
            balances: HashMap::new(),
            marketplace: None,
            failing: HashSet::new(),
            dispatched: Vec::new(),
        }
    }

    /// Set the ambient clock.
    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }

    /// Advance the ambient clock.
    pub fn advance(&mut self, secs: u64) {
        self.now += secs;
    }

    /// Credit an account (test setup).
    pub fn credit(&mut self, account: Address, amount: u64) {
        *self.balances.entry(account).or_insert(0) += amount;
    }

    pub fn balance(&self, account: Address) -> u64 {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Install the mock marketplace as a callable target.
    pub fn install_marketplace(&mut self, marketplace: MockMarketplace) {
        self.marketplace = Some(marketplace);
    }

    pub fn marketplace(&self) -> Option<&MockMarketplace> {
        self.marketplace.as_ref()
    }

    /// Force every call to `target` to revert.
    pub fn fail_target(&mut self, target: Address) {
        self.failing.insert(target);
    }

    /// Raw calls dispatched to plain (non-marketplace) targets.
    pub fn dispatched(&self) -> &[RecordedCall] {
        &self.dispatched
    }

    fn transfer(&mut self, from: Address, to: Address, value: u64) -> Result<(), CallError> {
        if value == 0 {
            return Ok(());
        }
        let available = self.balance(from);
        if available < value {
            return Err(CallError::InsufficientBalance {
                needed: value,
                available,
            });
        }
        *self.balances.entry(from).or_insert(0) -= value;
        *self.balances.entry(to).or_insert(0) += value;
        Ok(())
    }
}

impl Default for InMemoryEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Env for InMemoryEnv {
    type Snapshot = InMemoryEnv;

    fn now(&self) -> u64 {
        self.now
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        *self = snapshot;
    }

    fn call(&mut self, origin: Address, target: Address, value: u64, data: &[u8]) -> CallResult {
        if self.failing.contains(&target) {
            return Err(CallError::Reverted(format!("target {} is failing", target)));
        }

        self.transfer(origin, target, value)?;

        let is_marketplace = self
            .marketplace
            .as_ref()
            .is_some_and(|m| m.address() == target);
        if is_marketplace {
            let result = self
                .marketplace
                .as_mut()
                .expect("marketplace presence checked above")
                .handle(value, data);
            if result.is_err() {
                // A reverting call must not keep the payment.
                self.transfer(target, origin, value)
                    .expect("refund of a just-made transfer cannot fail");
            }
            return result;
        }

        // Plain target: accept and record the dispatch.
        self.dispatched.push(RecordedCall {
            target,
            value,
            data: data.to_vec(),
        });
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn call_moves_value_and_records() {
        let mut env = InMemoryEnv::new();
        env.credit(addr(1), 100);

        env.call(addr(1), addr(2), 40, b"payload").unwrap();
        assert_eq!(env.balance(addr(1)), 60);
        assert_eq!(env.balance(addr(2)), 40);
        assert_eq!(env.dispatched().len(), 1);
        assert_eq!(env.dispatched()[0].data, b"payload");
    }

    #[test]
    fn call_rejects_uncovered_value() {
        let mut env = InMemoryEnv::new();
        env.credit(addr(1), 10);
        let err = env.call(addr(1), addr(2), 40, &[]).unwrap_err();
        assert!(matches!(err, CallError::InsufficientBalance { .. }));
        assert_eq!(env.balance(addr(1)), 10);
    }

    #[test]
    fn failing_target_reverts() {
        let mut env = InMemoryEnv::new();
        env.fail_target(addr(2));
        assert!(env.call(addr(1), addr(2), 0, &[]).is_err());
    }

    #[test]
    fn snapshot_restore_undoes_effects() {
        let mut env = InMemoryEnv::new();
        env.credit(addr(1), 100);

        let snap = env.snapshot();
        env.call(addr(1), addr(2), 40, &[]).unwrap();
        env.advance(10);
        env.restore(snap);

        assert_eq!(env.balance(addr(1)), 100);
        assert_eq!(env.now(), 0);
        assert!(env.dispatched().is_empty());
    }
}
