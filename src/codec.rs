//! Canonical encoding, content digests, and call selectors.
//!
//! CBOR via `ciborium` is the single canonical encoding: action hashes, the
//! signature domain separator, ballot digests, and marketplace call payloads
//! all hash or carry CBOR bytes. Determinism matters here because content
//! hashes gate execution.

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// CBOR encoding failed.
    #[error("CBOR encoding failed: {0}")]
    Encode(String),

    /// CBOR decoding failed.
    #[error("CBOR decoding failed: {0}")]
    Decode(String),
}

/// Serialize to canonical CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| CodecError::Encode(format!("{:?}", e)))?;
    Ok(bytes)
}

/// Deserialize from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::Decode(format!("{:?}", e)))
}

/// SHA-256 digest of raw bytes.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Derive a 4-byte call selector from a textual function signature.
///
/// Dispatch prepends this to the call payload; an empty signature string
/// means the payload is sent verbatim instead.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = sha256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Encode a selector-dispatched call: `selector(signature) ++ CBOR(args)`.
pub fn encode_call<T: Serialize>(signature: &str, args: &T) -> Result<Vec<u8>, CodecError> {
    let mut data = selector(signature).to_vec();
    data.extend(to_cbor(args)?);
    Ok(data)
}

/// Split call data into selector and payload.
///
/// Returns `None` when the data is too short to carry a selector.
pub fn split_call(data: &[u8]) -> Option<([u8; 4], &[u8])> {
    if data.len() < 4 {
        return None;
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&data[..4]);
    Some((sel, &data[4..]))
}
