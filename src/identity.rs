//! Account identities.
//!
//! Every participant (members, proposal targets, the cooperative instance
//! itself, the marketplace) is identified by a 160-bit account identity.
//! Identities are derived from secp256k1 public keys in `crypto`; the
//! all-zero identity is the sentinel produced when signature recovery fails
//! and is never a valid account.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 160-bit account identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Sentinel identity recovered from structurally invalid signatures.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Creates an Address from a 20-byte array.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of the identity.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the sentinel "no account" identity.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_sentinel() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_bytes([1u8; 20]).is_zero());
    }

    #[test]
    fn display_is_hex() {
        let addr = Address::from_bytes([0xab; 20]);
        assert_eq!(addr.to_string(), "ab".repeat(20));
    }
}
