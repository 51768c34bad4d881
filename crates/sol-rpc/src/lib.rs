//! Minimal Solana cluster JSON-RPC client.
//!
//! Covers exactly what the probe needs: fetching a blockhash, simulating,
//! broadcasting and confirming transactions. Wire bytes travel base64-encoded.

pub mod client;
pub mod error;
pub mod types;

pub use client::{RpcClient, DEFAULT_HTTP_TIMEOUT, DEFAULT_POLL_INTERVAL};
pub use error::RpcError;
pub use types::{Commitment, SignatureStatus, SimulationResult};
