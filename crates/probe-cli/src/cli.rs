//! Command-line definition for `dapp-probe`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use probe_core::config::{
    DEFAULT_MESSAGE, LONG_TX_MAX_MEMOS, LONG_TX_MEMO_SIZE, LONG_TX_TARGET_SERIALIZED_BYTES,
    SOL_TRANSFER_LAMPORTS,
};
use probe_core::PaddingParams;

/// Drive wallet flows against a Solana cluster: message signing, a small
/// self-transfer, and a memo-padded transaction of a chosen size.
#[derive(Parser, Debug)]
#[command(name = "dapp-probe", version, propagate_version = true)]
pub struct ProbeCli {
    /// RPC endpoint or cluster moniker (mainnet-beta, devnet, testnet,
    /// localnet). Takes precedence over the saved endpoint and `SOLANA_RPC`.
    #[arg(long, global = true)]
    pub rpc: Option<String>,

    /// Settings file holding the saved endpoint.
    #[arg(
        long,
        global = true,
        env = "DAPP_PROBE_SETTINGS",
        default_value = ".dapp-probe.json"
    )]
    pub settings: PathBuf,

    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "DAPP_PROBE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    #[command(flatten)]
    pub wallet: WalletArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which wallet to connect. With neither flag the wallet is disconnected.
#[derive(Args, Debug, Clone)]
pub struct WalletArgs {
    /// Solana CLI keypair file (JSON array of 64 bytes).
    #[arg(long, global = true, env = "DAPP_PROBE_KEYPAIR", conflicts_with = "pubkey")]
    pub keypair: Option<PathBuf>,

    /// Connect by address only. Signing actions will report the missing
    /// capability.
    #[arg(long, global = true)]
    pub pubkey: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the connected wallet address.
    Address,
    /// Generate a fresh test keypair.
    Keygen(KeygenArgs),
    /// Sign a text message with the wallet.
    SignMessage(SignMessageArgs),
    /// Send lamports from the wallet to itself.
    Transfer(TransferArgs),
    /// Send a self-transfer padded with memo fillers up to a target size.
    LongTx(PaddingArgs),
    /// Run the padder only and print its decision.
    Estimate(PaddingArgs),
    /// Show or change the saved RPC endpoint.
    #[command(subcommand)]
    Endpoint(EndpointCommand),
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the keypair.
    #[arg(long, short = 'o')]
    pub out: PathBuf,

    /// Replace an existing file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct SignMessageArgs {
    #[arg(long, short = 'm', default_value = DEFAULT_MESSAGE)]
    pub message: String,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    #[arg(long, default_value_t = SOL_TRANSFER_LAMPORTS)]
    pub lamports: u64,
}

#[derive(Args, Debug)]
pub struct PaddingArgs {
    /// Serialized envelope size to reach, in bytes.
    #[arg(long, default_value_t = LONG_TX_TARGET_SERIALIZED_BYTES)]
    pub target_bytes: usize,

    /// Upper bound on memo fillers.
    #[arg(long, default_value_t = LONG_TX_MAX_MEMOS)]
    pub max_memos: usize,

    /// Repeated filler bytes per memo, after the `memo-<i>: ` prefix.
    #[arg(long, default_value_t = LONG_TX_MEMO_SIZE)]
    pub memo_size: usize,

    #[arg(long, default_value_t = SOL_TRANSFER_LAMPORTS)]
    pub lamports: u64,
}

impl PaddingArgs {
    pub fn params(&self) -> PaddingParams {
        PaddingParams {
            target_bytes: self.target_bytes,
            max_fillers: self.max_memos,
            filler_payload_size: self.memo_size,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum EndpointCommand {
    /// Print the effective endpoint and where it came from.
    Show,
    /// Save an endpoint URL or cluster moniker.
    Set { url: String },
    /// Forget the saved endpoint.
    Clear,
}
