//! # dapp-probe
//!
//! Entry point for the wallet QA harness. Parses arguments, initializes
//! logging, connects the wallet and the cluster client, and runs one action.
//!
//! Action status lines go to stdout; logs go to stderr. The process exits
//! non-zero when the action fails.

mod cli;
mod logging;

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use probe_core::config::RPC_ENV_VAR;
use probe_core::{
    estimate_long_transaction, resolve_endpoint, run_action, send_long_transaction,
    send_transfer, sign_message, wallet_address, Action, ActionReport, Disconnected,
    KeypairWallet, ResolvedEndpoint, Settings, Wallet, WatchOnlyWallet,
};
use sol_rpc::RpcClient;

use cli::{Commands, EndpointCommand, KeygenArgs, ProbeCli, WalletArgs};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = ProbeCli::parse();
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&cli.log_format),
    );

    let rpc_override = cli.rpc.as_deref();

    match cli.command {
        Commands::Address => {
            let wallet = connect_wallet(&cli.wallet)?;
            match wallet_address(&*wallet) {
                Some(address) => println!("{address}"),
                None => println!("not connected"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Keygen(args) => keygen(&args),
        Commands::Endpoint(cmd) => endpoint(&cli.settings, rpc_override, cmd),
        Commands::SignMessage(args) => {
            let wallet = connect_wallet(&cli.wallet)?;
            let report = run_action(
                Action::SignMessage,
                sign_message(&*wallet, args.message.as_bytes()),
            )
            .await;
            Ok(finish(report))
        }
        Commands::Transfer(args) => {
            let wallet = connect_wallet(&cli.wallet)?;
            let rpc = connect_rpc(&cli.settings, rpc_override)?;
            let report = run_action(
                Action::Transfer,
                send_transfer(&*wallet, &rpc, args.lamports),
            )
            .await;
            Ok(finish(report))
        }
        Commands::LongTx(args) => {
            let wallet = connect_wallet(&cli.wallet)?;
            let rpc = connect_rpc(&cli.settings, rpc_override)?;
            let report = run_action(
                Action::LongTransaction,
                send_long_transaction(&*wallet, &rpc, &args.params(), args.lamports),
            )
            .await;
            Ok(finish(report))
        }
        Commands::Estimate(args) => {
            let wallet = connect_wallet(&cli.wallet)?;
            let rpc = connect_rpc(&cli.settings, rpc_override)?;
            let report = run_action(
                Action::Estimate,
                estimate_long_transaction(&*wallet, &rpc, &args.params(), args.lamports),
            )
            .await;
            Ok(finish(report))
        }
    }
}

fn finish(report: ActionReport) -> ExitCode {
    println!("{}", report.status);
    if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn connect_wallet(args: &WalletArgs) -> Result<Box<dyn Wallet>> {
    let wallet: Box<dyn Wallet> = if let Some(path) = &args.keypair {
        Box::new(
            KeypairWallet::load(path)
                .with_context(|| format!("failed to load keypair {}", path.display()))?,
        )
    } else if let Some(address) = &args.pubkey {
        Box::new(
            WatchOnlyWallet::from_address(address)
                .with_context(|| format!("invalid address {address}"))?,
        )
    } else {
        Box::new(Disconnected)
    };

    tracing::info!(
        wallet = wallet.name(),
        address = ?wallet_address(&*wallet),
        "wallet selected"
    );
    Ok(wallet)
}

/// Unreadable or malformed settings are ignored with a warning so a broken
/// file never blocks an action.
fn load_settings(path: &Path) -> Settings {
    Settings::load(path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring settings file");
        Settings::default()
    })
}

fn effective_endpoint(settings_path: &Path, rpc_override: Option<&str>) -> ResolvedEndpoint {
    let env_default = std::env::var(RPC_ENV_VAR).ok();
    resolve_endpoint(
        rpc_override,
        &load_settings(settings_path),
        env_default.as_deref(),
    )
}

fn connect_rpc(settings_path: &Path, rpc_override: Option<&str>) -> Result<RpcClient> {
    let endpoint = effective_endpoint(settings_path, rpc_override);
    let client = RpcClient::new(endpoint.url).context("failed to build rpc client")?;
    tracing::info!(
        url = client.endpoint(),
        source = %endpoint.source,
        commitment = %client.commitment(),
        "using rpc endpoint"
    );
    Ok(client)
}

fn endpoint(
    settings_path: &Path,
    rpc_override: Option<&str>,
    cmd: EndpointCommand,
) -> Result<ExitCode> {
    match cmd {
        EndpointCommand::Show => {
            let endpoint = effective_endpoint(settings_path, rpc_override);
            println!("{} ({})", endpoint.url, endpoint.source);
        }
        EndpointCommand::Set { url } => {
            let mut settings = load_settings(settings_path);
            settings.set_endpoint(&url);
            settings.save(settings_path)?;
            match &settings.rpc_endpoint {
                Some(saved) => println!("saved endpoint: {saved}"),
                None => println!("saved endpoint cleared"),
            }
        }
        EndpointCommand::Clear => {
            let mut settings = load_settings(settings_path);
            settings.rpc_endpoint = None;
            settings.save(settings_path)?;
            println!("saved endpoint cleared");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn keygen(args: &KeygenArgs) -> Result<ExitCode> {
    let wallet = KeypairWallet::generate();
    let mut options = OpenOptions::new();
    options.write(true);
    if args.force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options
        .open(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    file.write_all(wallet.to_keypair_json().as_bytes())
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    if let Some(address) = wallet_address(&wallet) {
        println!("{address}");
    }
    tracing::info!(path = %args.out.display(), "keypair written");
    Ok(ExitCode::SUCCESS)
}
