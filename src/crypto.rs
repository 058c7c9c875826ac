//! Ballot signatures: domain separation, digests, and recoverable ECDSA.
//!
//! A ballot signature binds one `(proposal, support)` pair to one deployed
//! cooperative instance on one chain. The domain separator is computed once
//! at construction and never changes; recovery of a structurally invalid
//! signature yields [`Address::ZERO`] rather than an error so the batch
//! voting path can treat it as a skippable non-member.

use crate::codec::{sha256, to_cbor};
use crate::identity::Address;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Serialize};

/// Schema tag mixed into the domain separator.
const BALLOT_SCHEMA: &str = "artel-ballot-v1";

/// Type tag mixed into every ballot digest.
const BALLOT_TYPE: &str = "Ballot(proposal u64,support bool)";

/// Digest binding signatures to one chain and one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainSeparator([u8; 32]);

impl DomainSeparator {
    /// Compute the separator for one deployed instance.
    pub fn new(chain_id: u64, instance: Address) -> Self {
        let encoded = to_cbor(&(BALLOT_SCHEMA, chain_id, instance))
            .expect("CBOR encoding of fixed-size tuple cannot fail");
        Self(sha256(&encoded))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// A recoverable secp256k1 signature triple over a ballot digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSignature {
    /// Recovery id (0 or 1).
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

/// The digest a voter signs for one `(proposal, support)` pair.
pub fn ballot_digest(domain: &DomainSeparator, proposal_id: u64, support: bool) -> [u8; 32] {
    let ballot = to_cbor(&(BALLOT_TYPE, proposal_id, support))
        .expect("CBOR encoding of fixed-size tuple cannot fail");
    let ballot_hash = sha256(&ballot);

    let mut preimage = Vec::with_capacity(64);
    preimage.extend_from_slice(domain.as_bytes());
    preimage.extend_from_slice(&ballot_hash);
    sha256(&preimage)
}

/// Derive the 160-bit account identity of a public key.
///
/// Last 20 bytes of the SHA-256 of the uncompressed curve point (tag byte
/// excluded).
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let digest = sha256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from_bytes(bytes)
}

/// Sign a ballot with a secp256k1 key.
pub fn sign_ballot(
    key: &SigningKey,
    domain: &DomainSeparator,
    proposal_id: u64,
    support: bool,
) -> VoteSignature {
    let digest = ballot_digest(domain, proposal_id, support);
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(&digest)
        .expect("signing a 32-byte prehash cannot fail");

    let (r_bytes, s_bytes) = signature.split_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(r_bytes.as_slice());
    s.copy_from_slice(s_bytes.as_slice());
    VoteSignature {
        v: recovery_id.to_byte(),
        r,
        s,
    }
}

/// Recover the signer identity of a ballot signature.
///
/// Any structurally invalid input recovers to [`Address::ZERO`]. Callers
/// treat the sentinel as a non-member; this function never fails.
pub fn recover_voter(
    domain: &DomainSeparator,
    proposal_id: u64,
    support: bool,
    signature: &VoteSignature,
) -> Address {
    let digest = ballot_digest(domain, proposal_id, support);

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);

    let Ok(sig) = Signature::from_slice(&sig_bytes) else {
        return Address::ZERO;
    };
    let Some(recovery_id) = RecoveryId::from_byte(signature.v) else {
        return Address::ZERO;
    };
    match VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id) {
        Ok(key) => address_of(&key),
        Err(_) => Address::ZERO,
    }
}
