//! Padded draft construction against a live cluster.

use chain_sol::{estimate_padding, PaddingParams, TransactionDraft};

use crate::error::ProbeError;
use crate::rpc::ClusterRpc;

/// A padded draft bound to a fresh token, ready to compile and sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedDraft {
    pub draft: TransactionDraft,
    pub filler_count: usize,
    /// Envelope size measured with the estimation token.
    pub estimated_size: usize,
    pub reached_target: bool,
}

/// Pad a `payer -> recipient` transfer with memo fillers until the envelope
/// reaches `params.target_bytes`.
///
/// Parameters are validated before any network call. Estimation runs against
/// one blockhash; the finished draft is then rebuilt on a second, freshly
/// fetched blockhash so the estimation round-trips cannot leave it stale.
/// Running out of `max_fillers` is not an error: the draft comes back with
/// `reached_target == false`.
pub async fn build_padded_draft<R: ClusterRpc + ?Sized>(
    rpc: &R,
    payer: &[u8; 32],
    recipient: &[u8; 32],
    lamports: u64,
    params: &PaddingParams,
) -> Result<PaddedDraft, ProbeError> {
    params.validate()?;

    let estimation_token = rpc.latest_blockhash().await?;
    let plan = estimate_padding(payer, recipient, lamports, &estimation_token, params)?;

    if !plan.reached_target {
        tracing::warn!(
            fillers = plan.filler_count,
            estimated_size = plan.estimated_size,
            target = params.target_bytes,
            "filler limit reached before target size"
        );
    }

    let fresh_token = rpc.latest_blockhash().await?;
    let draft = plan.draft.with_token(fresh_token);

    tracing::debug!(
        fillers = plan.filler_count,
        estimated_size = plan.estimated_size,
        "padded draft rebuilt on fresh blockhash"
    );

    Ok(PaddedDraft {
        draft,
        filler_count: plan.filler_count,
        estimated_size: plan.estimated_size,
        reached_target: plan.reached_target,
    })
}
