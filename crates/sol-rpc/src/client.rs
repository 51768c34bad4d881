//! JSON-RPC 2.0 client over HTTP.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use chain_sol::{address_to_bytes, FreshnessToken};

use crate::error::RpcError;
use crate::types::{
    Commitment, LatestBlockhash, RpcErrorObject, RpcResponse, SignatureStatus, SimulationResult,
    WithContext,
};

/// Per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between signature status polls while confirming.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

fn node_error(error: RpcErrorObject) -> RpcError {
    let logs = error.logs();
    RpcError::Node {
        code: error.code,
        message: error.message,
        logs,
    }
}

/// Cluster RPC client.
#[derive(Debug, Clone)]
pub struct RpcClient {
    endpoint: String,
    http: reqwest::Client,
    commitment: Commitment,
    poll_interval: Duration,
}

impl RpcClient {
    /// Client with `confirmed` commitment and default timeouts.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
            commitment: Commitment::Confirmed,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, endpoint = %self.endpoint, "rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            // Some providers wrap JSON-RPC errors in a non-2xx response.
            if let Ok(RpcResponse::<Value> {
                error: Some(error), ..
            }) = serde_json::from_str(&body)
            {
                return Err(node_error(error));
            }
            return Err(RpcError::Http(format!(
                "{method}: HTTP {status}: {}",
                body.trim()
            )));
        }

        let parsed: RpcResponse<T> = serde_json::from_str(&body)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(node_error(error));
        }

        parsed
            .result
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: missing result")))
    }

    /// `getLatestBlockhash`.
    pub async fn latest_blockhash(&self) -> Result<FreshnessToken, RpcError> {
        let latest: WithContext<LatestBlockhash> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment }]),
            )
            .await?;

        Ok(FreshnessToken {
            blockhash: address_to_bytes(&latest.value.blockhash)?,
            last_valid_block_height: latest.value.last_valid_block_height,
        })
    }

    /// `sendTransaction` with preflight enabled. Returns the signature string.
    pub async fn send_transaction(&self, wire: &[u8]) -> Result<String, RpcError> {
        self.call(
            "sendTransaction",
            json!([
                STANDARD.encode(wire),
                {
                    "encoding": "base64",
                    "skipPreflight": false,
                    "preflightCommitment": self.commitment,
                }
            ]),
        )
        .await
    }

    /// `simulateTransaction`.
    pub async fn simulate_transaction(
        &self,
        wire: &[u8],
        sig_verify: bool,
    ) -> Result<SimulationResult, RpcError> {
        let result: WithContext<SimulationResult> = self
            .call(
                "simulateTransaction",
                json!([
                    STANDARD.encode(wire),
                    {
                        "encoding": "base64",
                        "sigVerify": sig_verify,
                        "commitment": self.commitment,
                    }
                ]),
            )
            .await?;
        Ok(result.value)
    }

    /// `getSignatureStatuses` for one signature; `None` if the node has not
    /// seen it yet.
    pub async fn signature_status(
        &self,
        signature: &str,
    ) -> Result<Option<SignatureStatus>, RpcError> {
        let result: WithContext<Vec<Option<SignatureStatus>>> = self
            .call("getSignatureStatuses", json!([[signature]]))
            .await?;
        Ok(result.value.into_iter().next().flatten())
    }

    /// `getBlockHeight`.
    pub async fn block_height(&self) -> Result<u64, RpcError> {
        self.call("getBlockHeight", json!([{ "commitment": self.commitment }]))
            .await
    }

    /// Poll until `signature` reaches the client's commitment, fails, or the
    /// token's blockhash expires.
    pub async fn confirm_transaction(
        &self,
        signature: &str,
        token: &FreshnessToken,
    ) -> Result<SignatureStatus, RpcError> {
        loop {
            if let Some(status) = self.signature_status(signature).await? {
                if let Some(err) = &status.err {
                    return Err(RpcError::TransactionFailed {
                        signature: signature.to_owned(),
                        err: err.to_string(),
                    });
                }
                if status.satisfies(self.commitment) {
                    tracing::debug!(signature, slot = status.slot, "signature confirmed");
                    return Ok(status);
                }
            }

            let height = self.block_height().await?;
            if height > token.last_valid_block_height {
                return Err(RpcError::BlockhashExpired {
                    signature: signature.to_owned(),
                    commitment: self.commitment.to_string(),
                    height,
                    last_valid: token.last_valid_block_height,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
