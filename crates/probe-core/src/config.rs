//! Defaults and endpoint configuration.
//!
//! The RPC endpoint is resolved from, in order: an explicit override (the
//! `--rpc` flag), the persisted settings file, an environment default, and
//! finally the mainnet-beta public endpoint.

use std::path::Path;

use serde::{Deserialize, Serialize};

use chain_sol::PaddingParams;

use crate::error::ProbeError;

/// Message signed by the sign-message action.
pub const DEFAULT_MESSAGE: &str = "Hello from dapp-for-test";

/// 0.0001 SOL.
pub const SOL_TRANSFER_LAMPORTS: u64 = 100_000;

pub const LONG_TX_TARGET_SERIALIZED_BYTES: usize = 1000;
pub const LONG_TX_MAX_MEMOS: usize = 40;
pub const LONG_TX_MEMO_SIZE: usize = 96;

/// Environment variable holding the operator's default endpoint.
pub const RPC_ENV_VAR: &str = "SOLANA_RPC";

pub const fn default_padding() -> PaddingParams {
    PaddingParams {
        target_bytes: LONG_TX_TARGET_SERIALIZED_BYTES,
        max_fillers: LONG_TX_MAX_MEMOS,
        filler_payload_size: LONG_TX_MEMO_SIZE,
    }
}

/// Public clusters, addressable by moniker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    MainnetBeta,
    Devnet,
    Testnet,
    Localnet,
}

impl Cluster {
    pub fn api_url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    pub fn from_moniker(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet-beta" | "mainnet" => Some(Cluster::MainnetBeta),
            "devnet" => Some(Cluster::Devnet),
            "testnet" => Some(Cluster::Testnet),
            "localnet" | "localhost" => Some(Cluster::Localnet),
            _ => None,
        }
    }
}

/// Trim an endpoint and expand cluster monikers. Blank input yields `None`.
pub fn normalize_endpoint(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(match Cluster::from_moniker(trimmed) {
        Some(cluster) => cluster.api_url().to_string(),
        None => trimmed.to_string(),
    })
}

/// Where the effective endpoint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Override,
    Settings,
    Environment,
    Default,
}

impl std::fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EndpointSource::Override => "override",
            EndpointSource::Settings => "settings",
            EndpointSource::Environment => "environment",
            EndpointSource::Default => "default",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub url: String,
    pub source: EndpointSource,
}

/// Apply the precedence chain: override > settings > environment > default.
pub fn resolve_endpoint(
    override_url: Option<&str>,
    settings: &Settings,
    env_default: Option<&str>,
) -> ResolvedEndpoint {
    let candidates = [
        (override_url, EndpointSource::Override),
        (settings.rpc_endpoint.as_deref(), EndpointSource::Settings),
        (env_default, EndpointSource::Environment),
    ];

    candidates
        .into_iter()
        .find_map(|(raw, source)| {
            raw.and_then(normalize_endpoint)
                .map(|url| ResolvedEndpoint { url, source })
        })
        .unwrap_or_else(|| ResolvedEndpoint {
            url: Cluster::MainnetBeta.api_url().to_string(),
            source: EndpointSource::Default,
        })
}

/// Locally persisted operator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_endpoint: Option<String>,
}

impl Settings {
    /// Read settings; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                ProbeError::Config(format!("malformed settings {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ProbeError::Config(format!(
                "cannot read settings {}: {e}",
                path.display()
            ))),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ProbeError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProbeError::Config(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ProbeError::Config(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| ProbeError::Config(format!("cannot write {}: {e}", path.display())))
    }

    /// Persist a new endpoint. Blank input clears the stored value.
    pub fn set_endpoint(&mut self, raw: &str) {
        self.rpc_endpoint = normalize_endpoint(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(endpoint: Option<&str>) -> Settings {
        Settings {
            rpc_endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn override_wins() {
        let r = resolve_endpoint(
            Some("https://a.example"),
            &settings(Some("https://b.example")),
            Some("https://c.example"),
        );
        assert_eq!(r.url, "https://a.example");
        assert_eq!(r.source, EndpointSource::Override);
    }

    #[test]
    fn settings_beat_environment() {
        let r = resolve_endpoint(None, &settings(Some("https://b.example")), Some("https://c.example"));
        assert_eq!(r.source, EndpointSource::Settings);
    }

    #[test]
    fn environment_beats_default() {
        let r = resolve_endpoint(None, &settings(None), Some("devnet"));
        assert_eq!(r.url, "https://api.devnet.solana.com");
        assert_eq!(r.source, EndpointSource::Environment);
    }

    #[test]
    fn blank_values_fall_through() {
        let r = resolve_endpoint(Some("  "), &settings(Some("")), None);
        assert_eq!(r.url, "https://api.mainnet-beta.solana.com");
        assert_eq!(r.source, EndpointSource::Default);
    }

    #[test]
    fn monikers_expand() {
        assert_eq!(
            normalize_endpoint(" Testnet ").as_deref(),
            Some("https://api.testnet.solana.com")
        );
        assert_eq!(
            normalize_endpoint("http://10.0.0.1:8899").as_deref(),
            Some("http://10.0.0.1:8899")
        );
    }

    #[test]
    fn settings_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        assert_eq!(Settings::load(&path).unwrap(), Settings::default());

        let mut s = Settings::default();
        s.set_endpoint("  https://rpc.example  ");
        s.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.rpc_endpoint.as_deref(), Some("https://rpc.example"));
    }

    #[test]
    fn malformed_settings_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(ProbeError::Config(_))));
    }

    #[test]
    fn default_padding_matches_constants() {
        let p = default_padding();
        assert_eq!(p.target_bytes, 1000);
        assert_eq!(p.max_fillers, 40);
        assert_eq!(p.filler_payload_size, 96);
    }
}
