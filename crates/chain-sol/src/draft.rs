//! Transaction drafts: an ordered list of operations, a payer and a
//! freshness token, compiled to a v0 message on demand.

use crate::error::SolError;
use crate::memo::memo_instruction;
use crate::transaction::{
    compile_message, system_transfer_instruction, MessageVersion, SolInstruction, SolTransaction,
};

/// A recent blockhash together with the last block height at which a
/// transaction referencing it is still accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessToken {
    pub blockhash: [u8; 32],
    pub last_valid_block_height: u64,
}

/// One step of a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// System Program lamport transfer.
    Transfer {
        from: [u8; 32],
        to: [u8; 32],
        lamports: u64,
    },
    /// Memo that moves no value; only adds bytes.
    Annotation { payer: [u8; 32], payload: Vec<u8> },
}

impl Operation {
    pub fn to_instruction(&self) -> SolInstruction {
        match self {
            Operation::Transfer { from, to, lamports } => {
                system_transfer_instruction(from, to, *lamports)
            }
            Operation::Annotation { payer, payload } => memo_instruction(payer, payload),
        }
    }

    pub fn is_annotation(&self) -> bool {
        matches!(self, Operation::Annotation { .. })
    }
}

/// An unsigned transaction under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub payer: [u8; 32],
    pub operations: Vec<Operation>,
    pub token: FreshnessToken,
}

impl TransactionDraft {
    pub fn new(payer: [u8; 32], token: FreshnessToken) -> Self {
        Self {
            payer,
            operations: Vec::new(),
            token,
        }
    }

    pub fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    /// Same operations, different freshness token.
    pub fn with_token(&self, token: FreshnessToken) -> Self {
        Self {
            payer: self.payer,
            operations: self.operations.clone(),
            token,
        }
    }

    pub fn annotation_count(&self) -> usize {
        self.operations.iter().filter(|op| op.is_annotation()).count()
    }

    /// Compile into a v0 message.
    pub fn compile(&self) -> Result<SolTransaction, SolError> {
        let instructions: Vec<SolInstruction> =
            self.operations.iter().map(Operation::to_instruction).collect();
        compile_message(
            &instructions,
            &self.payer,
            &self.token.blockhash,
            MessageVersion::V0,
        )
    }

    /// Serialized size of the signed envelope for this draft.
    pub fn estimated_size(&self) -> Result<usize, SolError> {
        self.compile()?.envelope_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::MEMO_PROGRAM_ID;
    use crate::transaction::SYSTEM_PROGRAM_ID;

    fn token(byte: u8) -> FreshnessToken {
        FreshnessToken {
            blockhash: [byte; 32],
            last_valid_block_height: 1_000,
        }
    }

    fn sample_draft() -> TransactionDraft {
        let payer = [1u8; 32];
        let mut draft = TransactionDraft::new(payer, token(0xAA));
        draft.push(Operation::Annotation {
            payer,
            payload: b"memo-0: XX".to_vec(),
        });
        draft.push(Operation::Transfer {
            from: payer,
            to: payer,
            lamports: 100_000,
        });
        draft
    }

    #[test]
    fn compile_preserves_operation_order() {
        let tx = sample_draft().compile().unwrap();
        assert_eq!(tx.account_keys, vec![[1u8; 32], MEMO_PROGRAM_ID, SYSTEM_PROGRAM_ID]);
        assert_eq!(tx.compiled_instructions[0].program_id_index, 1);
        assert_eq!(tx.compiled_instructions[1].program_id_index, 2);
        assert_eq!(tx.version, MessageVersion::V0);
    }

    #[test]
    fn annotation_count_ignores_transfers() {
        assert_eq!(sample_draft().annotation_count(), 1);
    }

    #[test]
    fn with_token_keeps_operations() {
        let draft = sample_draft();
        let refreshed = draft.with_token(token(0xBB));
        assert_eq!(refreshed.operations, draft.operations);
        assert_eq!(refreshed.token.blockhash, [0xBB; 32]);
        assert_eq!(
            refreshed.estimated_size().unwrap(),
            draft.estimated_size().unwrap()
        );
    }

    #[test]
    fn estimated_size_of_sample() {
        // 65 signature bytes + 152-byte base message + memo ix (1+1+1+1+10)
        assert_eq!(sample_draft().estimated_size().unwrap(), 65 + 152 + 14);
    }
}
