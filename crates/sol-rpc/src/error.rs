use thiserror::Error;

/// Cluster RPC errors.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("http error: {0}")]
    Http(String),

    /// JSON-RPC error object returned by the node. Preflight failures carry
    /// the simulation logs in `data.logs`.
    #[error("rpc error {code}: {message}")]
    Node {
        code: i64,
        message: String,
        logs: Vec<String>,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("transaction {signature} failed: {err}")]
    TransactionFailed { signature: String, err: String },

    #[error("blockhash expired before {signature} reached {commitment} (block height {height} > {last_valid})")]
    BlockhashExpired {
        signature: String,
        commitment: String,
        height: u64,
        last_valid: u64,
    },
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        RpcError::Http(e.to_string())
    }
}

impl From<chain_sol::SolError> for RpcError {
    fn from(e: chain_sol::SolError) -> Self {
        RpcError::InvalidResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_node_error() {
        let err = RpcError::Node {
            code: -32002,
            message: "Transaction simulation failed".into(),
            logs: vec!["Program log: boom".into()],
        };
        assert_eq!(
            err.to_string(),
            "rpc error -32002: Transaction simulation failed"
        );
    }

    #[test]
    fn display_blockhash_expired() {
        let err = RpcError::BlockhashExpired {
            signature: "sig".into(),
            commitment: "confirmed".into(),
            height: 12,
            last_valid: 10,
        };
        assert!(err.to_string().contains("block height 12 > 10"));
    }

    #[test]
    fn sol_error_maps_to_invalid_response() {
        let err: RpcError = chain_sol::SolError::InvalidAddress("bad".into()).into();
        assert!(matches!(err, RpcError::InvalidResponse(_)));
    }
}
