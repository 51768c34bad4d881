//! Solana address encoding.
//!
//! An address is the Base58 encoding of a raw 32-byte Ed25519 public key,
//! with no hashing step in between.

use crate::error::SolError;

/// Encode a 32-byte public key as a Base58 address.
pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a Base58 address to its 32-byte representation.
///
/// Surrounding whitespace is ignored, since addresses are usually pasted in
/// by an operator.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    let arr: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })?;

    Ok(arr)
}

/// Encode a 64-byte Ed25519 signature the way the cluster reports
/// transaction ids.
pub fn signature_to_string(signature: &[u8; 64]) -> String {
    bs58::encode(signature).into_string()
}
