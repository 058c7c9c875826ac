//! Artel - Member-Run Purchasing Cooperative
//!
//! A fixed pool of members jointly authorizes opaque external actions
//! (canonically, collectible purchases from a marketplace) via timed,
//! quorum-gated proposals.
//!
//! Key principles:
//! - Derived proposal phase (pure function of flags, tallies, and the clock)
//! - One non-transferable vote per member per proposal, immutable once cast
//! - Domain-separated ballot signatures; invalid input recovers to a sentinel
//! - Hash-gated, all-or-nothing execution behind a re-entrancy barrier

pub mod codec;
pub mod crypto;
pub mod env;
pub mod governance;
pub mod identity;
pub mod market;
