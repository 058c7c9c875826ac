//! Execution environment abstraction.
//!
//! The cooperative trusts one ambient, monotonically non-decreasing clock
//! and dispatches opaque, value-carrying calls to external targets. Both
//! live behind the [`Env`] trait so tests drive time and external effects
//! through [`mock::InMemoryEnv`].
//!
//! Execution atomicity is explicit: [`Env::snapshot`] / [`Env::restore`]
//! give the execution engine an all-or-nothing unit over external effects,
//! since nothing transactional is provided by the host.

pub mod mock;

use crate::identity::Address;
use thiserror::Error;

/// Errors surfaced by external call dispatch.
#[derive(Debug, Error)]
pub enum CallError {
    /// No handler is installed for the target.
    #[error("unknown call target {0}")]
    UnknownTarget(Address),

    /// The target rejected the call.
    #[error("call reverted: {0}")]
    Reverted(String),

    /// The origin cannot cover the attached value.
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },
}

/// Result type for environment operations.
pub type CallResult = Result<Vec<u8>, CallError>;

/// The execution environment seam.
pub trait Env {
    /// Opaque restore point covering every externally observable effect.
    type Snapshot;

    /// Current time in seconds. Shared by all window checks.
    fn now(&self) -> u64;

    /// Capture a restore point.
    fn snapshot(&self) -> Self::Snapshot;

    /// Roll the environment back to a previously captured restore point.
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Dispatch a call to `target`, moving `value` from `origin` and
    /// carrying `data` verbatim.
    fn call(&mut self, origin: Address, target: Address, value: u64, data: &[u8]) -> CallResult;
}
