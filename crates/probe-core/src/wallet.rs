//! Wallet collaborator.
//!
//! Browser wallets differ in what they expose: some can sign arbitrary
//! messages, some only transactions, and a wallet may be disconnected
//! altogether. [`Wallet`] models that as a capability set queried before
//! use; unsupported operations fall back to the default methods, which
//! return [`ProbeError::WalletCapabilityMissing`].

use std::path::Path;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand::RngCore;
use rand_core::OsRng;
use secrecy::{ExposeSecret, SecretBox};
use zeroize::Zeroize;

use chain_sol::{bytes_to_address, signature_to_string, SolTransaction};

use crate::error::ProbeError;

/// Operations a wallet supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub sign_message: bool,
    pub sign_transaction: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        sign_message: true,
        sign_transaction: true,
    };
    pub const NONE: Capabilities = Capabilities {
        sign_message: false,
        sign_transaction: false,
    };
}

/// A signed envelope ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Fee payer signature; doubles as the transaction id.
    pub signature: [u8; 64],
    pub wire: Vec<u8>,
}

impl SignedTransaction {
    pub fn signature_string(&self) -> String {
        signature_to_string(&self.signature)
    }
}

#[async_trait]
pub trait Wallet: Send + Sync {
    fn name(&self) -> &str;

    /// `Some` while connected.
    fn public_key(&self) -> Option<[u8; 32]>;

    fn capabilities(&self) -> Capabilities;

    fn is_connected(&self) -> bool {
        self.public_key().is_some()
    }

    async fn sign_message(&self, _message: &[u8]) -> Result<[u8; 64], ProbeError> {
        Err(ProbeError::WalletCapabilityMissing("signMessage"))
    }

    async fn sign_transaction(&self, _tx: &SolTransaction) -> Result<SignedTransaction, ProbeError> {
        Err(ProbeError::WalletCapabilityMissing("signTransaction"))
    }
}

/// Public key of a connected wallet.
pub fn require_connected<W: Wallet + ?Sized>(wallet: &W) -> Result<[u8; 32], ProbeError> {
    wallet.public_key().ok_or(ProbeError::WalletNotConnected)
}

/// Address of a connected wallet, for display.
pub fn wallet_address<W: Wallet + ?Sized>(wallet: &W) -> Option<String> {
    wallet.public_key().map(|pk| bytes_to_address(&pk))
}

// ---------------------------------------------------------------------------
// Local keypair
// ---------------------------------------------------------------------------

/// Ed25519 test keypair held in memory; supports every capability.
pub struct KeypairWallet {
    seed: SecretBox<[u8; 32]>,
    public_key: [u8; 32],
}

impl KeypairWallet {
    pub fn from_seed(mut seed: [u8; 32]) -> Self {
        let public_key = SigningKey::from_bytes(&seed).verifying_key().to_bytes();
        let wallet = Self {
            seed: SecretBox::new(Box::new(seed)),
            public_key,
        };
        seed.zeroize();
        wallet
    }

    /// Fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// 32-byte seed as hex.
    pub fn from_hex_seed(hex_seed: &str) -> Result<Self, ProbeError> {
        let mut bytes = hex::decode(hex_seed.trim().trim_start_matches("0x"))
            .map_err(|e| ProbeError::InvalidInput(format!("seed hex: {e}")))?;
        let seed: Result<[u8; 32], _> = bytes.as_slice().try_into();
        let len = bytes.len();
        bytes.zeroize();
        let seed = seed
            .map_err(|_| ProbeError::InvalidInput(format!("seed must be 32 bytes, got {len}")))?;
        Ok(Self::from_seed(seed))
    }

    /// Keypair file format used by the Solana CLI: a JSON array of 64 bytes,
    /// seed followed by public key.
    pub fn from_keypair_json(json: &str) -> Result<Self, ProbeError> {
        let mut bytes: Vec<u8> = serde_json::from_str(json)
            .map_err(|e| ProbeError::InvalidInput(format!("keypair json: {e}")))?;

        if bytes.len() != 64 {
            let len = bytes.len();
            bytes.zeroize();
            return Err(ProbeError::InvalidInput(format!(
                "keypair must be 64 bytes, got {len}"
            )));
        }

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        let mut expected = [0u8; 32];
        expected.copy_from_slice(&bytes[32..]);
        bytes.zeroize();

        let wallet = Self::from_seed(seed);
        if wallet.public_key != expected {
            return Err(ProbeError::InvalidInput(
                "keypair public key does not match its seed".into(),
            ));
        }
        Ok(wallet)
    }

    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::Config(format!("cannot read keypair {}: {e}", path.display()))
        })?;
        Self::from_keypair_json(&json)
    }

    /// Serialize in the Solana CLI keypair format.
    pub fn to_keypair_json(&self) -> String {
        let mut bytes = Vec::with_capacity(64);
        bytes.extend_from_slice(self.seed.expose_secret());
        bytes.extend_from_slice(&self.public_key);
        let json = serde_json::to_string(&bytes).unwrap_or_default();
        bytes.zeroize();
        json
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(self.seed.expose_secret())
    }
}

#[async_trait]
impl Wallet for KeypairWallet {
    fn name(&self) -> &str {
        "keypair"
    }

    fn public_key(&self) -> Option<[u8; 32]> {
        Some(self.public_key)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    async fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], ProbeError> {
        Ok(self.signing_key().sign(message).to_bytes())
    }

    async fn sign_transaction(&self, tx: &SolTransaction) -> Result<SignedTransaction, ProbeError> {
        let (signature, wire) = chain_sol::sign_transaction(tx, self.seed.expose_secret())?;
        Ok(SignedTransaction { signature, wire })
    }
}

// ---------------------------------------------------------------------------
// Capability-less wallets
// ---------------------------------------------------------------------------

/// Connected by address only; cannot sign anything.
pub struct WatchOnlyWallet {
    public_key: [u8; 32],
}

impl WatchOnlyWallet {
    pub fn new(public_key: [u8; 32]) -> Self {
        Self { public_key }
    }

    pub fn from_address(address: &str) -> Result<Self, ProbeError> {
        Ok(Self::new(chain_sol::address_to_bytes(address)?))
    }
}

#[async_trait]
impl Wallet for WatchOnlyWallet {
    fn name(&self) -> &str {
        "watch-only"
    }

    fn public_key(&self) -> Option<[u8; 32]> {
        Some(self.public_key)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }
}

/// No wallet connected.
pub struct Disconnected;

#[async_trait]
impl Wallet for Disconnected {
    fn name(&self) -> &str {
        "disconnected"
    }

    fn public_key(&self) -> Option<[u8; 32]> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }
}
