//! The cluster collaborator seen by the actions.

use async_trait::async_trait;

use chain_sol::FreshnessToken;
use sol_rpc::{RpcClient, RpcError, SimulationResult};

use crate::error::ProbeError;

/// What the actions need from the network.
#[async_trait]
pub trait ClusterRpc: Send + Sync {
    async fn latest_blockhash(&self) -> Result<FreshnessToken, ProbeError>;

    /// Broadcast signed wire bytes; returns the transaction signature.
    async fn send_transaction(&self, wire: &[u8]) -> Result<String, ProbeError>;

    async fn simulate_transaction(
        &self,
        wire: &[u8],
        sig_verify: bool,
    ) -> Result<SimulationResult, ProbeError>;

    /// Wait until `signature` is confirmed or `token` expires.
    async fn confirm_transaction(
        &self,
        signature: &str,
        token: &FreshnessToken,
    ) -> Result<(), ProbeError>;
}

#[async_trait]
impl ClusterRpc for RpcClient {
    async fn latest_blockhash(&self) -> Result<FreshnessToken, ProbeError> {
        RpcClient::latest_blockhash(self)
            .await
            .map_err(|e| ProbeError::Rpc(e.to_string()))
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String, ProbeError> {
        RpcClient::send_transaction(self, wire)
            .await
            .map_err(|e| match e {
                RpcError::Node { message, logs, .. } => ProbeError::BroadcastFailed { message, logs },
                other => ProbeError::BroadcastFailed {
                    message: other.to_string(),
                    logs: Vec::new(),
                },
            })
    }

    async fn simulate_transaction(
        &self,
        wire: &[u8],
        sig_verify: bool,
    ) -> Result<SimulationResult, ProbeError> {
        RpcClient::simulate_transaction(self, wire, sig_verify)
            .await
            .map_err(|e| ProbeError::Rpc(e.to_string()))
    }

    async fn confirm_transaction(
        &self,
        signature: &str,
        token: &FreshnessToken,
    ) -> Result<(), ProbeError> {
        match RpcClient::confirm_transaction(self, signature, token).await {
            Ok(_) => Ok(()),
            Err(e @ RpcError::BlockhashExpired { .. }) => {
                Err(ProbeError::ConfirmationTimeout(e.to_string()))
            }
            Err(RpcError::TransactionFailed { err, .. }) => Err(ProbeError::TransactionFailed(err)),
            Err(other) => Err(ProbeError::Rpc(other.to_string())),
        }
    }
}
