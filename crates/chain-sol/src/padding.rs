//! Size padding: grow a transfer with memo fillers until the signed
//! envelope reaches a target size.

use crate::draft::{FreshnessToken, Operation, TransactionDraft};
use crate::error::SolError;
use crate::memo::filler_payload;

/// Knobs for [`estimate_padding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddingParams {
    /// Envelope size (bytes) to reach.
    pub target_bytes: usize,
    /// Upper bound on the number of filler memos.
    pub max_fillers: usize,
    /// `'X'` bytes per filler, on top of the `memo-{i}: ` tag.
    pub filler_payload_size: usize,
}

impl PaddingParams {
    pub fn validate(&self) -> Result<(), SolError> {
        if self.target_bytes == 0 {
            return Err(SolError::InvalidPadding("target_bytes must be > 0".into()));
        }
        if self.filler_payload_size == 0 {
            return Err(SolError::InvalidPadding(
                "filler_payload_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Result of the estimation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingPlan {
    /// Fillers followed by the terminal transfer, bound to the estimation token.
    pub draft: TransactionDraft,
    pub filler_count: usize,
    pub estimated_size: usize,
    /// `false` when `max_fillers` ran out first.
    pub reached_target: bool,
}

/// Append fillers one at a time, re-measuring the envelope after each, and
/// stop at the first size `>= target_bytes` or when `max_fillers` is spent.
///
/// Every measurement uses the same `token`, so the decision depends only on
/// the operations.
pub fn estimate_padding(
    payer: &[u8; 32],
    recipient: &[u8; 32],
    lamports: u64,
    token: &FreshnessToken,
    params: &PaddingParams,
) -> Result<PaddingPlan, SolError> {
    params.validate()?;

    let transfer = Operation::Transfer {
        from: *payer,
        to: *recipient,
        lamports,
    };

    let mut fillers: Vec<Operation> = Vec::new();
    let mut draft = assemble(payer, &fillers, &transfer, token);
    let mut estimated_size = draft.estimated_size()?;

    for index in 0..params.max_fillers {
        fillers.push(Operation::Annotation {
            payer: *payer,
            payload: filler_payload(index, params.filler_payload_size),
        });
        draft = assemble(payer, &fillers, &transfer, token);
        estimated_size = draft.estimated_size()?;

        tracing::debug!(
            fillers = fillers.len(),
            estimated_size,
            target = params.target_bytes,
            "padding step"
        );

        if estimated_size >= params.target_bytes {
            break;
        }
    }

    Ok(PaddingPlan {
        draft,
        filler_count: fillers.len(),
        estimated_size,
        reached_target: estimated_size >= params.target_bytes,
    })
}

fn assemble(
    payer: &[u8; 32],
    fillers: &[Operation],
    transfer: &Operation,
    token: &FreshnessToken,
) -> TransactionDraft {
    let mut draft = TransactionDraft::new(*payer, *token);
    for op in fillers {
        draft.push(op.clone());
    }
    draft.push(transfer.clone());
    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    const TOKEN: FreshnessToken = FreshnessToken {
        blockhash: [0xAB; 32],
        last_valid_block_height: 500,
    };

    fn params(target_bytes: usize) -> PaddingParams {
        PaddingParams {
            target_bytes,
            max_fillers: 40,
            filler_payload_size: 96,
        }
    }

    fn random_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        key
    }

    #[test]
    fn regression_target_1000() {
        let payer = [0x42u8; 32];
        let plan = estimate_padding(&payer, &payer, 100_000, &TOKEN, &params(1000)).unwrap();

        // 65 + 152 + 108 per filler: 7 fillers give 973, 8 give 1081.
        assert_eq!(plan.filler_count, 8);
        assert_eq!(plan.estimated_size, 1081);
        assert!(plan.reached_target);
        assert!(plan.filler_count < 40);
    }

    #[test]
    fn terminates_early_for_any_payer() {
        for _ in 0..16 {
            let payer = random_key();
            let plan =
                estimate_padding(&payer, &payer, 100_000, &TOKEN, &params(1000)).unwrap();
            assert!(plan.filler_count < 40);
            assert!(plan.estimated_size >= 1000);
        }
    }

    #[test]
    fn transfer_is_last_operation() {
        let payer = [1u8; 32];
        let recipient = [2u8; 32];
        let plan = estimate_padding(&payer, &recipient, 5, &TOKEN, &params(600)).unwrap();
        let last = plan.draft.operations.last().unwrap();
        assert_eq!(
            *last,
            Operation::Transfer {
                from: payer,
                to: recipient,
                lamports: 5
            }
        );
        assert_eq!(plan.draft.annotation_count(), plan.filler_count);
    }

    #[test]
    fn zero_target_is_invalid() {
        let payer = [1u8; 32];
        let err = estimate_padding(&payer, &payer, 1, &TOKEN, &params(0)).unwrap_err();
        assert!(matches!(err, SolError::InvalidPadding(_)));
    }

    #[test]
    fn zero_payload_is_invalid() {
        let payer = [1u8; 32];
        let mut p = params(1000);
        p.filler_payload_size = 0;
        assert!(estimate_padding(&payer, &payer, 1, &TOKEN, &p).is_err());
    }

    #[test]
    fn shortfall_returns_best_effort_plan() {
        let payer = [1u8; 32];
        let p = PaddingParams {
            target_bytes: 1200,
            max_fillers: 3,
            filler_payload_size: 96,
        };
        let plan = estimate_padding(&payer, &payer, 1, &TOKEN, &p).unwrap();
        assert_eq!(plan.filler_count, 3);
        assert!(!plan.reached_target);
        assert!(plan.estimated_size < 1200);
    }

    #[test]
    fn zero_max_fillers_yields_bare_transfer() {
        let payer = [1u8; 32];
        let p = PaddingParams {
            target_bytes: 1000,
            max_fillers: 0,
            filler_payload_size: 96,
        };
        let plan = estimate_padding(&payer, &payer, 1, &TOKEN, &p).unwrap();
        assert_eq!(plan.filler_count, 0);
        assert_eq!(plan.draft.operations.len(), 1);
        // payer and system program only; the memo program joins with the first filler
        assert_eq!(plan.estimated_size, 185);
        assert!(!plan.reached_target);
    }

    #[test]
    fn small_target_still_gets_one_filler() {
        let payer = [1u8; 32];
        let plan = estimate_padding(&payer, &payer, 1, &TOKEN, &params(1)).unwrap();
        assert_eq!(plan.filler_count, 1);
    }

    #[test]
    fn filler_count_is_monotonic_in_target() {
        let payer = [9u8; 32];
        let mut previous = 0;
        for target in (100..=5000).step_by(97) {
            let plan = estimate_padding(&payer, &payer, 1, &TOKEN, &params(target)).unwrap();
            assert!(plan.filler_count >= previous, "target {target}");
            assert!(plan.reached_target || plan.filler_count == 40);
            previous = plan.filler_count;
        }
    }

    #[test]
    fn estimation_is_idempotent() {
        let payer = [3u8; 32];
        let a = estimate_padding(&payer, &payer, 1, &TOKEN, &params(1000)).unwrap();
        let b = estimate_padding(&payer, &payer, 1, &TOKEN, &params(1000)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn padding_decision_is_token_independent() {
        let payer = [3u8; 32];
        let other = FreshnessToken {
            blockhash: [0x01; 32],
            last_valid_block_height: 9,
        };
        let a = estimate_padding(&payer, &payer, 1, &TOKEN, &params(1000)).unwrap();
        let b = estimate_padding(&payer, &payer, 1, &other, &params(1000)).unwrap();
        assert_eq!(a.filler_count, b.filler_count);
        assert_eq!(a.estimated_size, b.estimated_size);
        assert_eq!(a.draft.operations, b.draft.operations);
    }
}
