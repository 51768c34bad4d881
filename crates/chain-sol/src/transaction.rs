//! Solana message compilation, wire format and signing.
//!
//! Both message formats are built by hand:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     [0x80]                only for v0 messages
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!     [num_lookups]         only for v0 messages, always compact-u16(0) here
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```

use ed25519_dalek::Signer;
use zeroize::Zeroize;

use crate::error::SolError;

/// The Solana System Program public key: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// System Program `Transfer` instruction index (little-endian u32).
const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

/// Ed25519 signature length on the wire.
pub const SIGNATURE_LENGTH: usize = 64;

/// High bit set on the first message byte marks a versioned message.
const VERSION_PREFIX: u8 = 0x80;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in Solana's compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Encode a collection length as compact-u16, rejecting lengths that do not fit.
fn encode_len(len: usize, what: &str) -> Result<Vec<u8>, SolError> {
    let value = u16::try_from(len).map_err(|_| {
        SolError::SerializationError(format!("{what} length {len} exceeds compact-u16"))
    })?;
    Ok(encode_compact_u16(value))
}

/// Bytes taken by the signature section of a transaction carrying
/// `num_signatures` signatures.
pub fn signature_overhead(num_signatures: u16) -> usize {
    encode_compact_u16(num_signatures).len() + SIGNATURE_LENGTH * num_signatures as usize
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in a Solana instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

/// A Solana instruction (before it is compiled into a transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// Message encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageVersion {
    Legacy,
    /// Versioned message without address lookup tables.
    V0,
}

/// A compiled Solana message, ready to be serialized and signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolTransaction {
    pub version: MessageVersion,

    /// All account keys referenced by this transaction, in canonical order:
    ///   1. writable signers (fee payer first)
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<[u8; 32]>,

    /// Number of required signatures (first N accounts are signers).
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned: u8,

    pub recent_blockhash: [u8; 32],

    pub compiled_instructions: Vec<CompiledInstruction>,
}

/// An instruction whose account references are u8 indices into
/// `account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

impl SolTransaction {
    /// The fee payer, always at index 0.
    pub fn fee_payer(&self) -> &[u8; 32] {
        &self.account_keys[0]
    }

    /// Serialized size of the signed envelope, without signing.
    pub fn envelope_size(&self) -> Result<usize, SolError> {
        let message = serialize_message(self)?;
        Ok(signature_overhead(self.num_required_signatures as u16) + message.len())
    }
}

// ---------------------------------------------------------------------------
// Transaction building
// ---------------------------------------------------------------------------

/// Build a System Program `Transfer` instruction moving `lamports` from
/// `from` to `to`.
pub fn system_transfer_instruction(from: &[u8; 32], to: &[u8; 32], lamports: u64) -> SolInstruction {
    // u32 LE instruction index (2 = Transfer) + u64 LE lamports.
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    SolInstruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta {
                pubkey: *from,
                is_signer: true,
                is_writable: true,
            },
            SolAccountMeta {
                pubkey: *to,
                is_signer: false,
                is_writable: true,
            },
        ],
        data,
    }
}

/// Compile instructions into a message with a single fee payer.
///
/// The fee payer is always a writable signer placed at index 0 in the
/// account keys.
pub fn compile_message(
    instructions: &[SolInstruction],
    fee_payer: &[u8; 32],
    recent_blockhash: &[u8; 32],
    version: MessageVersion,
) -> Result<SolTransaction, SolError> {
    struct AccountEntry {
        pubkey: [u8; 32],
        is_signer: bool,
        is_writable: bool,
    }

    // Account lists are tiny; a linear scan beats hashing here.
    let mut entries: Vec<AccountEntry> = Vec::new();

    let mut upsert = |pubkey: [u8; 32], signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                pubkey,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    upsert(*fee_payer, true, true);

    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        // Program IDs are non-signer, read-only accounts.
        upsert(ix.program_id, false, false);
    }

    // Stable sort: insertion order survives within each category.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    if entries.len() > u8::MAX as usize {
        return Err(SolError::TransactionBuildError(format!(
            "{} accounts exceed the u8 index space",
            entries.len()
        )));
    }

    let num_signers = entries.iter().filter(|e| e.is_signer).count() as u8;
    let num_readonly_signed = entries
        .iter()
        .filter(|e| e.is_signer && !e.is_writable)
        .count() as u8;
    let num_readonly_unsigned = entries
        .iter()
        .filter(|e| !e.is_signer && !e.is_writable)
        .count() as u8;

    let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.pubkey).collect();

    let index_of = |key: &[u8; 32], what: &str| {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|i| i as u8)
            .ok_or_else(|| SolError::TransactionBuildError(format!("{what} not in account keys")))
    };

    let mut compiled = Vec::with_capacity(instructions.len());
    for ix in instructions {
        let program_id_index = index_of(&ix.program_id, "program_id")?;
        let account_indices = ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.pubkey, "account"))
            .collect::<Result<Vec<u8>, SolError>>()?;

        compiled.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data: ix.data.clone(),
        });
    }

    Ok(SolTransaction {
        version,
        account_keys,
        num_required_signatures: num_signers,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        compiled_instructions: compiled,
    })
}

/// Serialize the transaction message (the bytes that get signed).
pub fn serialize_message(tx: &SolTransaction) -> Result<Vec<u8>, SolError> {
    let mut buf = Vec::with_capacity(256);

    if tx.version == MessageVersion::V0 {
        buf.push(VERSION_PREFIX);
    }

    buf.push(tx.num_required_signatures);
    buf.push(tx.num_readonly_signed);
    buf.push(tx.num_readonly_unsigned);

    buf.extend_from_slice(&encode_len(tx.account_keys.len(), "account keys")?);
    for key in &tx.account_keys {
        buf.extend_from_slice(key);
    }

    buf.extend_from_slice(&tx.recent_blockhash);

    buf.extend_from_slice(&encode_len(tx.compiled_instructions.len(), "instructions")?);
    for ix in &tx.compiled_instructions {
        buf.push(ix.program_id_index);

        buf.extend_from_slice(&encode_len(ix.account_indices.len(), "instruction accounts")?);
        buf.extend_from_slice(&ix.account_indices);

        buf.extend_from_slice(&encode_len(ix.data.len(), "instruction data")?);
        buf.extend_from_slice(&ix.data);
    }

    if tx.version == MessageVersion::V0 {
        // No address lookup tables.
        buf.extend_from_slice(&encode_compact_u16(0));
    }

    Ok(buf)
}

/// Assemble the wire envelope from signatures and serialized message bytes.
pub fn assemble_wire(signatures: &[[u8; 64]], message_bytes: &[u8]) -> Result<Vec<u8>, SolError> {
    let count = encode_len(signatures.len(), "signatures")?;
    let mut wire =
        Vec::with_capacity(count.len() + SIGNATURE_LENGTH * signatures.len() + message_bytes.len());
    wire.extend_from_slice(&count);
    for sig in signatures {
        wire.extend_from_slice(sig);
    }
    wire.extend_from_slice(message_bytes);
    Ok(wire)
}

/// Sign a single-signer transaction and serialize it into wire format.
///
/// Returns the signature and the wire bytes. The private key is the 32-byte
/// Ed25519 seed; it must belong to the fee payer.
pub fn sign_transaction(
    tx: &SolTransaction,
    private_key: &[u8; 32],
) -> Result<([u8; 64], Vec<u8>), SolError> {
    if tx.num_required_signatures != 1 {
        return Err(SolError::SigningError(format!(
            "expected exactly one required signature, message needs {}",
            tx.num_required_signatures
        )));
    }

    let message_bytes = serialize_message(tx)?;

    let mut seed = *private_key;
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
    seed.zeroize();

    if signing_key.verifying_key().to_bytes() != *tx.fee_payer() {
        return Err(SolError::SigningError(
            "signing key does not match the fee payer".into(),
        ));
    }

    let signature = signing_key.sign(&message_bytes).to_bytes();
    let wire = assemble_wire(&[signature], &message_bytes)?;

    Ok((signature, wire))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_tx(from: &[u8; 32], to: &[u8; 32], version: MessageVersion) -> SolTransaction {
        let ix = system_transfer_instruction(from, to, 1_000);
        compile_message(&[ix], from, &[0xAA; 32], version).unwrap()
    }

    // -- compact-u16 encoding -----------------------------------------------

    #[test]
    fn compact_u16_boundaries() {
        assert_eq!(encode_compact_u16(0), vec![0x00]);
        assert_eq!(encode_compact_u16(0x7f), vec![0x7f]);
        assert_eq!(encode_compact_u16(128), vec![0x80, 0x01]);
        assert_eq!(encode_compact_u16(16383), vec![0xff, 0x7f]);
        assert_eq!(encode_compact_u16(16384), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode_compact_u16(u16::MAX), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn encode_len_rejects_oversized() {
        assert!(encode_len(70_000, "data").is_err());
        assert_eq!(encode_len(3, "data").unwrap(), vec![3]);
    }

    #[test]
    fn signature_overhead_single_signer() {
        assert_eq!(signature_overhead(1), 65);
        assert_eq!(signature_overhead(2), 129);
    }

    // -- Transfer instruction -------------------------------------------------

    #[test]
    fn transfer_instruction_layout() {
        let ix = system_transfer_instruction(&[1u8; 32], &[2u8; 32], 1_000_000);
        assert_eq!(ix.program_id, SYSTEM_PROGRAM_ID);
        assert_eq!(ix.data.len(), 12);
        assert_eq!(&ix.data[..4], &[2, 0, 0, 0]);
        assert_eq!(&ix.data[4..], &1_000_000u64.to_le_bytes());

        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert!(!ix.accounts[1].is_signer && ix.accounts[1].is_writable);
    }

    // -- Compilation ------------------------------------------------------------

    #[test]
    fn compiled_account_order() {
        let from = [1u8; 32];
        let to = [2u8; 32];
        let tx = transfer_tx(&from, &to, MessageVersion::Legacy);

        assert_eq!(tx.account_keys, vec![from, to, SYSTEM_PROGRAM_ID]);
        assert_eq!(tx.num_required_signatures, 1);
        assert_eq!(tx.num_readonly_signed, 0);
        assert_eq!(tx.num_readonly_unsigned, 1);
        assert_eq!(tx.compiled_instructions[0].program_id_index, 2);
        assert_eq!(tx.compiled_instructions[0].account_indices, vec![0, 1]);
    }

    #[test]
    fn self_transfer_deduplicates_accounts() {
        let key = [0xAAu8; 32];
        let tx = transfer_tx(&key, &key, MessageVersion::V0);
        assert_eq!(tx.account_keys, vec![key, SYSTEM_PROGRAM_ID]);
        assert_eq!(tx.compiled_instructions[0].account_indices, vec![0, 0]);
    }

    #[test]
    fn readonly_signer_sorts_after_writable_signers() {
        let payer = [1u8; 32];
        let cosigner = [9u8; 32];
        let program = [5u8; 32];
        let ix = SolInstruction {
            program_id: program,
            accounts: vec![SolAccountMeta {
                pubkey: cosigner,
                is_signer: true,
                is_writable: false,
            }],
            data: vec![],
        };
        let tx = compile_message(&[ix], &payer, &[0; 32], MessageVersion::V0).unwrap();
        assert_eq!(tx.account_keys, vec![payer, cosigner, program]);
        assert_eq!(tx.num_required_signatures, 2);
        assert_eq!(tx.num_readonly_signed, 1);
    }

    // -- Serialization ----------------------------------------------------------

    #[test]
    fn legacy_message_starts_with_header() {
        let tx = transfer_tx(&[1u8; 32], &[2u8; 32], MessageVersion::Legacy);
        let msg = serialize_message(&tx).unwrap();
        assert_eq!(&msg[..3], &[1, 0, 1]);
        // header 3 + len 1 + keys 96 + blockhash 32 + ix count 1 + transfer 17
        assert_eq!(msg.len(), 150);
    }

    #[test]
    fn v0_message_prefix_and_lookup_trailer() {
        let tx = transfer_tx(&[1u8; 32], &[2u8; 32], MessageVersion::V0);
        let msg = serialize_message(&tx).unwrap();
        assert_eq!(msg[0], 0x80);
        assert_eq!(&msg[1..4], &[1, 0, 1]);
        assert_eq!(*msg.last().unwrap(), 0);
        assert_eq!(msg.len(), 152);
    }

    #[test]
    fn message_contains_blockhash() {
        let tx = transfer_tx(&[1u8; 32], &[2u8; 32], MessageVersion::V0);
        let msg = serialize_message(&tx).unwrap();
        // prefix 1 + header 3 + compact(3) 1 + 3 keys
        let offset = 1 + 3 + 1 + 32 * 3;
        assert_eq!(&msg[offset..offset + 32], &[0xAA; 32]);
    }

    #[test]
    fn envelope_size_matches_signed_wire() {
        let private_key = [0x42u8; 32];
        let from = ed25519_dalek::SigningKey::from_bytes(&private_key)
            .verifying_key()
            .to_bytes();
        let tx = transfer_tx(&from, &[0xBB; 32], MessageVersion::V0);
        let (_, wire) = sign_transaction(&tx, &private_key).unwrap();
        assert_eq!(tx.envelope_size().unwrap(), wire.len());
    }

    // -- Signing --------------------------------------------------------------

    #[test]
    fn sign_transaction_produces_valid_wire_bytes() {
        use ed25519_dalek::{Signature, VerifyingKey};

        let private_key = [0x42u8; 32];
        let from = ed25519_dalek::SigningKey::from_bytes(&private_key)
            .verifying_key()
            .to_bytes();
        let tx = transfer_tx(&from, &[0xBB; 32], MessageVersion::V0);
        let (sig, wire) = sign_transaction(&tx, &private_key).unwrap();

        assert_eq!(wire[0], 0x01);
        assert_eq!(&wire[1..65], &sig);

        let signature = Signature::from_bytes(&sig);
        let vk = VerifyingKey::from_bytes(&from).unwrap();
        assert!(vk.verify_strict(&wire[65..], &signature).is_ok());
    }

    #[test]
    fn sign_transaction_is_deterministic() {
        let private_key = [0x55u8; 32];
        let from = ed25519_dalek::SigningKey::from_bytes(&private_key)
            .verifying_key()
            .to_bytes();
        let tx = transfer_tx(&from, &[0x77; 32], MessageVersion::Legacy);
        let a = sign_transaction(&tx, &private_key).unwrap();
        let b = sign_transaction(&tx, &private_key).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sign_with_foreign_key_fails() {
        let tx = transfer_tx(&[0x11; 32], &[0xBB; 32], MessageVersion::V0);
        let err = sign_transaction(&tx, &[0x22u8; 32]).unwrap_err();
        assert!(err.to_string().contains("fee payer"));
    }

    #[test]
    fn assemble_wire_layout() {
        let wire = assemble_wire(&[[1u8; 64], [2u8; 64]], &[9, 9]).unwrap();
        assert_eq!(wire.len(), 1 + 128 + 2);
        assert_eq!(wire[0], 2);
        assert_eq!(wire[65], 2);
        assert_eq!(&wire[129..], &[9, 9]);
    }
}
