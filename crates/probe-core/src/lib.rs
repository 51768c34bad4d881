//! # probe-core
//!
//! Wallet QA actions for a Solana cluster: sign a message, send a
//! self-transfer, and send a memo-padded "long" transaction of a target
//! size. The wallet and the cluster are collaborators behind the
//! [`wallet::Wallet`] and [`rpc::ClusterRpc`] traits; the actions only
//! orchestrate them and report results.

pub mod actions;
pub mod config;
pub mod error;
pub mod padder;
pub mod rpc;
pub mod wallet;

pub use actions::{
    estimate_long_transaction, report, run_action, send_long_transaction, send_transfer,
    sign_message, Action, ActionOutcome, ActionReport, Shortfall,
};
pub use config::{resolve_endpoint, Cluster, EndpointSource, ResolvedEndpoint, Settings};
pub use error::ProbeError;
pub use padder::{build_padded_draft, PaddedDraft};
pub use rpc::ClusterRpc;
pub use wallet::{
    require_connected, wallet_address, Capabilities, Disconnected, KeypairWallet,
    SignedTransaction, Wallet, WatchOnlyWallet,
};

pub use chain_sol::{FreshnessToken, PaddingParams};
pub use sol_rpc::SimulationResult;
