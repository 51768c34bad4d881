use thiserror::Error;

use chain_sol::SolError;

/// Errors surfaced by probe actions. None of them escape the action
/// boundary; see [`crate::actions::report`].
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("wallet not connected")]
    WalletNotConnected,

    #[error("wallet does not support {0}")]
    WalletCapabilityMissing(&'static str),

    #[error("simulation rejected: {err}")]
    SimulationRejected {
        err: String,
        logs: Vec<String>,
        serialized_size: usize,
        target_bytes: usize,
    },

    #[error("broadcast failed: {message}")]
    BroadcastFailed { message: String, logs: Vec<String> },

    #[error("confirmation timeout: {0}")]
    ConfirmationTimeout(String),

    #[error("transaction failed on chain: {0}")]
    TransactionFailed(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("transaction build failed: {0}")]
    BuildFailed(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("config error: {0}")]
    Config(String),
}

impl ProbeError {
    /// Program logs attached to the error, if the node supplied any.
    pub fn logs(&self) -> &[String] {
        match self {
            ProbeError::SimulationRejected { logs, .. } | ProbeError::BroadcastFailed { logs, .. } => {
                logs
            }
            _ => &[],
        }
    }
}

impl From<SolError> for ProbeError {
    fn from(e: SolError) -> Self {
        match e {
            SolError::InvalidPadding(msg) => ProbeError::InvalidInput(msg),
            SolError::InvalidAddress(msg) => ProbeError::InvalidInput(msg),
            SolError::SigningError(msg) => ProbeError::SigningFailed(msg),
            other => ProbeError::BuildFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_capability_missing() {
        let err = ProbeError::WalletCapabilityMissing("signMessage");
        assert_eq!(err.to_string(), "wallet does not support signMessage");
    }

    #[test]
    fn invalid_padding_maps_to_invalid_input() {
        let err: ProbeError = SolError::InvalidPadding("target_bytes must be > 0".into()).into();
        assert!(matches!(err, ProbeError::InvalidInput(_)));
    }

    #[test]
    fn serialization_maps_to_build_failed() {
        let err: ProbeError = SolError::SerializationError("too long".into()).into();
        assert_eq!(
            err.to_string(),
            "transaction build failed: serialization error: too long"
        );
    }

    #[test]
    fn logs_only_for_node_errors() {
        let err = ProbeError::BroadcastFailed {
            message: "rejected".into(),
            logs: vec!["l1".into()],
        };
        assert_eq!(err.logs(), ["l1".to_string()]);
        assert!(ProbeError::WalletNotConnected.logs().is_empty());
    }
}
