//! Solana transaction building for the wallet probe.
//!
//! The compact wire format is implemented by hand, without `solana-sdk`:
//! `ed25519-dalek` signs, `bs58` encodes addresses. On top of the wire format
//! sit the draft model (transfers plus memo annotations) and the size padder
//! that grows a draft until its signed envelope reaches a byte target.

pub mod address;
pub mod draft;
pub mod error;
pub mod memo;
pub mod padding;
pub mod transaction;

pub use address::{address_to_bytes, bytes_to_address, signature_to_string};
pub use draft::{FreshnessToken, Operation, TransactionDraft};
pub use error::SolError;
pub use memo::{filler_payload, memo_instruction, MEMO_PROGRAM_ID};
pub use padding::{estimate_padding, PaddingParams, PaddingPlan};
pub use transaction::{
    assemble_wire, compile_message, encode_compact_u16, serialize_message, sign_transaction,
    signature_overhead, system_transfer_instruction, CompiledInstruction, MessageVersion,
    SolAccountMeta, SolInstruction, SolTransaction, SIGNATURE_LENGTH, SYSTEM_PROGRAM_ID,
};
