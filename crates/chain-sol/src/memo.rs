//! SPL Memo program instructions.
//!
//! A memo instruction carries arbitrary UTF-8 bytes and moves no value. The
//! memo program checks that every listed account signed the transaction.

use crate::transaction::{SolAccountMeta, SolInstruction};

/// Memo Program v2: `MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr`
pub const MEMO_PROGRAM_ID: [u8; 32] = [
    0x05, 0x4a, 0x53, 0x5a, 0x99, 0x29, 0x21, 0x06, 0x4d, 0x24, 0xe8, 0x71, 0x60, 0xda, 0x38,
    0x7c, 0x7c, 0x35, 0xb5, 0xdd, 0xbc, 0x92, 0xbb, 0x81, 0xe4, 0x1f, 0xa8, 0x40, 0x41, 0x05,
    0x44, 0x8d,
];

/// Build a memo instruction signed (read-only) by `signer`.
pub fn memo_instruction(signer: &[u8; 32], payload: &[u8]) -> SolInstruction {
    SolInstruction {
        program_id: MEMO_PROGRAM_ID,
        accounts: vec![SolAccountMeta {
            pubkey: *signer,
            is_signer: true,
            is_writable: false,
        }],
        data: payload.to_vec(),
    }
}

/// Deterministic filler payload: `"memo-{index}: "` followed by `size` bytes
/// of `'X'`.
pub fn filler_payload(index: usize, size: usize) -> Vec<u8> {
    let prefix = format!("memo-{index}: ");
    let mut payload = Vec::with_capacity(prefix.len() + size);
    payload.extend_from_slice(prefix.as_bytes());
    payload.resize(prefix.len() + size, b'X');
    payload
}
