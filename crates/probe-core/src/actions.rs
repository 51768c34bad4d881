//! The operator-triggered actions and the boundary that turns their results
//! into status lines.
//!
//! Each action is one async call that runs to completion or failure; nothing
//! is retried. [`report`] is the only place errors are caught.

use std::fmt::Write as _;
use std::future::Future;

use chain_sol::{FreshnessToken, Operation, PaddingParams, TransactionDraft};

use crate::error::ProbeError;
use crate::padder::build_padded_draft;
use crate::rpc::ClusterRpc;
use crate::wallet::{require_connected, SignedTransaction, Wallet};

/// Which action produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SignMessage,
    Transfer,
    LongTransaction,
    Estimate,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::SignMessage => "message signing",
            Action::Transfer => "transfer",
            Action::LongTransaction => "long transaction",
            Action::Estimate => "estimate",
        }
    }
}

/// Serialized size fell short of the padding target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub serialized_size: usize,
    pub target_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    MessageSigned {
        signature: [u8; 64],
    },
    Confirmed {
        signature: String,
        serialized_size: usize,
        shortfall: Option<Shortfall>,
    },
    Estimated {
        filler_count: usize,
        estimated_size: usize,
        target_bytes: usize,
        reached_target: bool,
    },
}

fn require_signing<W: Wallet + ?Sized>(wallet: &W) -> Result<(), ProbeError> {
    if wallet.capabilities().sign_transaction {
        Ok(())
    } else {
        Err(ProbeError::WalletCapabilityMissing("signTransaction"))
    }
}

/// Send a signed envelope. The node's reference id should be the fee payer
/// signature; a mismatch is logged and the node's id is kept for confirmation.
async fn broadcast<R: ClusterRpc + ?Sized>(
    rpc: &R,
    signed: &SignedTransaction,
) -> Result<String, ProbeError> {
    let local = signed.signature_string();
    tracing::debug!(signature = %local, bytes = signed.wire.len(), "broadcasting");
    let signature = rpc.send_transaction(&signed.wire).await?;
    if signature != local {
        tracing::warn!(%signature, expected = %local, "node returned an unexpected signature");
    }
    Ok(signature)
}

/// Sign `message` with the wallet.
pub async fn sign_message<W: Wallet + ?Sized>(
    wallet: &W,
    message: &[u8],
) -> Result<ActionOutcome, ProbeError> {
    if !wallet.capabilities().sign_message {
        return Err(ProbeError::WalletCapabilityMissing("signMessage"));
    }
    require_connected(wallet)?;

    let signature = wallet.sign_message(message).await?;
    Ok(ActionOutcome::MessageSigned { signature })
}

/// Sign and send a self-transfer of `lamports`, then wait for confirmation.
pub async fn send_transfer<W, R>(
    wallet: &W,
    rpc: &R,
    lamports: u64,
) -> Result<ActionOutcome, ProbeError>
where
    W: Wallet + ?Sized,
    R: ClusterRpc + ?Sized,
{
    let payer = require_connected(wallet)?;
    require_signing(wallet)?;

    let token = rpc.latest_blockhash().await?;
    let mut draft = TransactionDraft::new(payer, token);
    draft.push(Operation::Transfer {
        from: payer,
        to: payer,
        lamports,
    });

    let tx = draft.compile()?;
    let signed = wallet.sign_transaction(&tx).await?;
    let serialized_size = signed.wire.len();

    let signature = broadcast(rpc, &signed).await?;
    tracing::info!(%signature, serialized_size, "transfer sent");
    rpc.confirm_transaction(&signature, &token).await?;

    Ok(ActionOutcome::Confirmed {
        signature,
        serialized_size,
        shortfall: None,
    })
}

/// Pad a self-transfer with memo fillers up to `params.target_bytes`, sign,
/// simulate with signature verification, send and confirm.
///
/// A failed simulation stops the action before broadcast. A shortfall only
/// produces a warning; the transaction is still sent.
pub async fn send_long_transaction<W, R>(
    wallet: &W,
    rpc: &R,
    params: &PaddingParams,
    lamports: u64,
) -> Result<ActionOutcome, ProbeError>
where
    W: Wallet + ?Sized,
    R: ClusterRpc + ?Sized,
{
    let payer = require_connected(wallet)?;
    require_signing(wallet)?;

    let padded = build_padded_draft(rpc, &payer, &payer, lamports, params).await?;
    let token: FreshnessToken = padded.draft.token;

    let tx = padded.draft.compile()?;
    let signed = wallet.sign_transaction(&tx).await?;
    let serialized_size = signed.wire.len();

    let simulation = rpc.simulate_transaction(&signed.wire, true).await?;
    if let Some(err) = simulation.err {
        return Err(ProbeError::SimulationRejected {
            err: err.to_string(),
            logs: simulation.logs,
            serialized_size,
            target_bytes: params.target_bytes,
        });
    }

    let shortfall = (serialized_size < params.target_bytes).then(|| {
        tracing::warn!(
            serialized_size,
            target = params.target_bytes,
            "serialized size below target, sending anyway"
        );
        Shortfall {
            serialized_size,
            target_bytes: params.target_bytes,
        }
    });

    let signature = broadcast(rpc, &signed).await?;
    tracing::info!(
        %signature,
        serialized_size,
        fillers = padded.filler_count,
        "long transaction sent"
    );
    rpc.confirm_transaction(&signature, &token).await?;

    Ok(ActionOutcome::Confirmed {
        signature,
        serialized_size,
        shortfall,
    })
}

/// Run only the padder and report its decision. Needs a connected wallet but
/// no signing capability.
pub async fn estimate_long_transaction<W, R>(
    wallet: &W,
    rpc: &R,
    params: &PaddingParams,
    lamports: u64,
) -> Result<ActionOutcome, ProbeError>
where
    W: Wallet + ?Sized,
    R: ClusterRpc + ?Sized,
{
    let payer = require_connected(wallet)?;
    let padded = build_padded_draft(rpc, &payer, &payer, lamports, params).await?;
    Ok(ActionOutcome::Estimated {
        filler_count: padded.filler_count,
        estimated_size: padded.estimated_size,
        target_bytes: params.target_bytes,
        reached_target: padded.reached_target,
    })
}

// ---------------------------------------------------------------------------
// Action boundary
// ---------------------------------------------------------------------------

/// Human-readable result of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub action: Action,
    pub ok: bool,
    pub status: String,
}

/// Await an action and convert its result into a report.
pub async fn run_action<F>(action: Action, fut: F) -> ActionReport
where
    F: Future<Output = Result<ActionOutcome, ProbeError>>,
{
    report(action, fut.await)
}

/// Convert an action result into a status line and log it.
pub fn report(action: Action, result: Result<ActionOutcome, ProbeError>) -> ActionReport {
    match result {
        Ok(outcome) => {
            let status = describe_outcome(action, &outcome);
            tracing::info!(action = action.label(), "{status}");
            ActionReport {
                action,
                ok: true,
                status,
            }
        }
        Err(err) => {
            let status = describe_error(action, &err);
            tracing::error!(action = action.label(), error = %err, "action failed");
            ActionReport {
                action,
                ok: false,
                status,
            }
        }
    }
}

fn describe_outcome(action: Action, outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::MessageSigned { signature } => {
            let hex_sig = hex::encode(signature);
            format!("message signed: {}...", &hex_sig[..32])
        }
        ActionOutcome::Confirmed {
            signature,
            serialized_size,
            shortfall,
        } => {
            let mut status = String::new();
            if let Some(s) = shortfall {
                let _ = writeln!(
                    status,
                    "warning: serialized size {}B is below target {}B, sent anyway",
                    s.serialized_size, s.target_bytes
                );
            }
            match action {
                Action::LongTransaction => {
                    let _ = write!(
                        status,
                        "long transaction confirmed: {signature} (serialized {serialized_size}B)"
                    );
                }
                _ => {
                    let _ = write!(status, "transaction confirmed: {signature}");
                }
            }
            status
        }
        ActionOutcome::Estimated {
            filler_count,
            estimated_size,
            target_bytes,
            reached_target,
        } => {
            let mut status = format!(
                "estimate: {filler_count} memo fillers, {estimated_size}B envelope (target {target_bytes}B)"
            );
            if !reached_target {
                status.push_str(", target not reached");
            }
            status
        }
    }
}

fn describe_error(action: Action, err: &ProbeError) -> String {
    let mut status = match err {
        ProbeError::SimulationRejected { err: reason, .. } => {
            format!("simulation failed: {reason}")
        }
        other => format!("{} failed: {other}", action.label()),
    };

    let logs = err.logs();
    if !logs.is_empty() {
        status.push_str("\nlogs:");
        for line in logs {
            status.push('\n');
            status.push_str(line);
        }
    }

    if let ProbeError::SimulationRejected {
        serialized_size,
        target_bytes,
        ..
    } = err
    {
        let _ = write!(
            status,
            "\nserialized size: {serialized_size}B (target {target_bytes}B)"
        );
    }

    status
}
