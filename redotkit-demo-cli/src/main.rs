//! Redotkit Demo CLI
//!
//! Command-line interface for signing, encrypting and sending payment
//! gateway requests with Redotkit.

use anyhow::Result;
use clap::{Parser, Subcommand};
use redotkit_lib::Language;
use std::path::{Path, PathBuf};

mod commands;
mod store;
mod ui;

#[derive(Parser)]
#[command(name = "redotkit-demo")]
#[command(
    about = "Redotkit Demo CLI - Sign, encrypt and send payment gateway requests",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Custom storage directory for session values
    #[arg(long, global = true, env = "REDOTKIT_DEMO_DIR")]
    storage_dir: Option<PathBuf>,

    /// Gateway configuration file (JSON); defaults to REDOT_* environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a payload with an RSA private key (PKCS#1 v1.5 / SHA-256)
    Sign {
        /// PKCS#8 private key PEM file
        #[arg(short, long)]
        key: PathBuf,

        /// Payload: JSON text, plain text, or @file
        payload: String,
    },

    /// Verify a payload signature with an RSA public key
    Verify {
        /// SPKI public key PEM file
        #[arg(short, long)]
        key: PathBuf,

        /// Base64 signature
        #[arg(short, long)]
        signature: String,

        /// Payload: JSON text, plain text, or @file
        payload: String,
    },

    /// Encrypt a payload for a gateway public key
    Encrypt {
        /// Gateway SPKI public key PEM file
        #[arg(short, long)]
        key: PathBuf,

        /// Payload: JSON text, plain text, or @file
        payload: String,
    },

    /// Decrypt an envelope with a raw AES key
    Decrypt {
        /// Base64 AES-128 key
        #[arg(short, long)]
        aes_key: String,

        /// Envelope JSON (encryptedData, iv, tag) or @file
        envelope: String,
    },

    /// Show what kind of RSA key a PEM file holds
    InspectKey {
        /// PEM file
        path: PathBuf,
    },

    /// Send a signed, encrypted request to a gateway route
    Call {
        /// Route, relative to the base URL
        route: String,

        /// Payload: JSON text, plain text, or @file
        payload: String,
    },

    /// Fetch pre-order details
    PreOrder {
        /// Pre-order serial number (defaults to REDOT_PREORDER_ID)
        pre_sn: Option<String>,
    },

    /// Fetch a payment order status
    OrderStatus {
        /// Order serial number
        sn: String,
    },

    /// Check whether an order's QR code was scanned
    QrcodeStatus {
        /// Order serial number
        sn: String,

        /// QR code id
        qrcode_id: String,
    },

    /// Bind an on-chain transaction hash to an order
    BindTx {
        /// Order serial number
        sn: String,

        /// Transaction hash
        tx_hash: String,
    },

    /// Show or set the language sent with requests
    Lang {
        /// en or zh
        language: Option<Language>,
    },

    /// Store a new bearer token
    Token {
        /// JWT
        token: String,
    },

    /// Clear the stored bearer token and signature
    Logout,

    /// Show stored session values
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("redotkit_demo_cli=debug,redotkit_lib=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("redotkit_demo_cli=info,redotkit_lib=warn")
            .with_writer(std::io::stderr)
            .init();
    }

    // Setup storage directory
    let storage_dir = cli.storage_dir.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("redotkit-demo")
    });

    if let Err(err) = run(cli.command, &storage_dir, cli.config.as_deref(), cli.verbose).await {
        ui::error(&format!("{:#}", err));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    command: Commands,
    storage_dir: &Path,
    config: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Sign { key, payload } => commands::crypto::sign_payload(&key, &payload, verbose),
        Commands::Verify {
            key,
            signature,
            payload,
        } => commands::crypto::verify_payload(&key, &signature, &payload),
        Commands::Encrypt { key, payload } => {
            commands::crypto::encrypt_payload(&key, &payload, verbose)
        }
        Commands::Decrypt { aes_key, envelope } => {
            commands::crypto::decrypt_envelope(&aes_key, &envelope)
        }
        Commands::InspectKey { path } => commands::crypto::inspect_key(&path),
        Commands::Lang { language } => {
            let store = store::FileSessionStore::new(storage_dir);
            commands::session::language(&store, language).await
        }
        Commands::Token { token } => {
            let store = store::FileSessionStore::new(storage_dir);
            commands::session::set_token(&store, &token).await
        }
        Commands::Logout => {
            let store = store::FileSessionStore::new(storage_dir);
            commands::session::logout(&store).await
        }
        Commands::Status => {
            let store = store::FileSessionStore::new(storage_dir);
            commands::session::status(&store).await
        }
        gateway_command => run_gateway(gateway_command, storage_dir, config).await,
    }
}

/// Commands that need gateway configuration and keys.
async fn run_gateway(command: Commands, storage_dir: &Path, config: Option<&Path>) -> Result<()> {
    let config = commands::load_config(config)?;
    tracing::debug!(?config, "loaded configuration");
    let mut client = commands::build_client(storage_dir, config)?;

    match command {
        Commands::Call { route, payload } => {
            commands::gateway::call(&mut client, &route, &payload).await
        }
        Commands::PreOrder { pre_sn } => commands::gateway::pre_order(&mut client, pre_sn).await,
        Commands::OrderStatus { sn } => commands::gateway::order_status(&mut client, sn).await,
        Commands::QrcodeStatus { sn, qrcode_id } => {
            commands::gateway::qrcode_status(&mut client, sn, qrcode_id).await
        }
        Commands::BindTx { sn, tx_hash } => {
            commands::gateway::bind_tx(&mut client, sn, tx_hash).await
        }
        _ => anyhow::bail!("command does not talk to the gateway"),
    }
}
