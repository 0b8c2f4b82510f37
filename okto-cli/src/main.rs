//! Okto CLI
//!
//! Command-line interface for the Okto wallet API.
//!
//! # Usage
//!
//! ```bash
//! # Exchange a Google id token for a session
//! okto authenticate <id-token>
//!
//! # Show wallets and balances
//! okto wallets
//! okto portfolio
//!
//! # Send tokens and wait for the order to settle
//! okto transfer-tokens POLYGON 0.1 0xrecipient --wait
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use okto_core::{
    CredentialStore, ExecuteRawTransaction, NftOrderDetailsQuery, OktoClient, OrderQuery,
    RawTransactionStatusQuery, SessionTokens, TransferNft, TransferTokens, create_store,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod config;

use config::{LoadedConfig, Overrides, load_config};

#[derive(Parser)]
#[command(name = "okto")]
#[command(about = "Client for the Okto wallet API")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API key, overriding the configuration file
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Environment (production, staging, sandbox)
    #[arg(short, long, global = true)]
    environment: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

// Logout and Status only touch the local session store and need no API key.
#[derive(Subcommand)]
enum Commands {
    /// Forget the stored session
    Logout,

    /// Show whether a session is held
    Status,

    #[command(flatten)]
    Api(ApiCommand),
}

#[derive(Subcommand)]
enum ApiCommand {
    /// Exchange an identity token for a session
    Authenticate {
        /// Google id token
        id_token: String,
    },

    /// Mint a new session from the stored refresh token
    Refresh,

    /// Show token balances
    Portfolio,

    /// List supported networks
    Networks,

    /// List supported tokens
    Tokens,

    /// Show the signed-in user
    User,

    /// List wallets
    Wallets,

    /// Create wallets on every supported network
    CreateWallet,

    /// List orders
    Orders {
        #[arg(long, default_value_t = 0)]
        offset: u32,

        #[arg(long, default_value_t = 0)]
        limit: u32,

        /// Only this order
        #[arg(long)]
        order_id: Option<String>,

        /// Filter by state (e.g., pending, success, failed)
        #[arg(long)]
        state: Option<String>,
    },

    /// List NFT orders
    NftOrders {
        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value_t = 0)]
        size: u32,

        #[arg(long)]
        order_id: Option<String>,
    },

    /// Show the status of a raw transaction job
    RawStatus {
        /// Job id returned by execute-raw
        order_id: String,
    },

    /// Transfer tokens
    TransferTokens {
        /// Network name (e.g., POLYGON, SOLANA_DEVNET)
        network: String,

        /// Amount to send
        quantity: String,

        /// Recipient address
        recipient: String,

        /// Token contract address; empty for the native token
        #[arg(short, long, default_value = "")]
        token: String,

        /// Wait for the order to settle
        #[arg(short, long)]
        wait: bool,
    },

    /// Transfer an NFT
    TransferNft {
        network: String,

        collection_address: String,

        nft_address: String,

        recipient: String,

        #[arg(long, default_value = "")]
        collection_name: String,

        #[arg(long, default_value = "1")]
        quantity: String,

        #[arg(long, default_value = "NFT_TRANSFER")]
        operation_type: String,
    },

    /// Execute a raw transaction given as JSON
    ExecuteRaw {
        /// Network name
        network: String,

        /// Transaction payload as a JSON object
        transaction: String,

        /// Wait for the job to settle
        #[arg(short, long)]
        wait: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref())?;
    init_logging(cli.verbose, loaded.log_level());

    let overrides = Overrides {
        api_key: cli.api_key,
        environment: cli.environment,
    };

    let command = match cli.command {
        Commands::Logout => {
            let store = create_store(&loaded.file.store);
            clear_session(store.as_ref()).await?;
            println!("Logged out");
            return Ok(());
        }
        Commands::Status => return show_status(&loaded, &overrides).await,
        Commands::Api(command) => command,
    };

    let client_config = loaded.client_config(&overrides)?;
    info!(
        "Using {} environment (config {:?})",
        client_config.environment, loaded.config_path
    );

    let client = OktoClient::new(client_config)
        .await
        .context("Failed to initialize client")?;

    run(&client, command).await
}

/// Persist the logged-out state. The server is not notified.
async fn clear_session(store: &dyn CredentialStore) -> Result<()> {
    store
        .save(&SessionTokens::logged_out())
        .await
        .context("Failed to clear session")
}

async fn session_state(store: &dyn CredentialStore) -> Result<&'static str> {
    let tokens = store.load().await.context("Failed to read session")?;
    Ok(match tokens {
        Some(tokens) if tokens.is_authenticated() => "authenticated",
        _ => "logged out",
    })
}

async fn show_status(loaded: &LoadedConfig, overrides: &Overrides) -> Result<()> {
    let store = create_store(&loaded.file.store);
    println!("Session: {}", session_state(store.as_ref()).await?);
    println!("Endpoint: {}", loaded.endpoint(overrides));
    Ok(())
}

fn init_logging(verbose: bool, default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { default_level })
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(client: &OktoClient, command: ApiCommand) -> Result<()> {
    match command {
        ApiCommand::Authenticate { id_token } => {
            client
                .authenticate(&id_token)
                .await
                .context("Authentication failed")?;
            println!("Authenticated");
            Ok(())
        }
        ApiCommand::Refresh => {
            client.refresh().await.context("Refresh failed, authenticate again")?;
            println!("Session refreshed");
            Ok(())
        }
        ApiCommand::Portfolio => print_json(&client.portfolio().await?),
        ApiCommand::Networks => print_json(&client.supported_networks().await?),
        ApiCommand::Tokens => print_json(&client.supported_tokens().await?),
        ApiCommand::User => print_json(&client.user_details().await?),
        ApiCommand::Wallets => print_json(&client.wallets().await?),
        ApiCommand::CreateWallet => print_json(&client.create_wallet().await?),
        ApiCommand::Orders {
            offset,
            limit,
            order_id,
            state,
        } => {
            let query = OrderQuery {
                offset,
                limit,
                order_id: order_id.unwrap_or_default(),
                order_state: state.unwrap_or_default(),
            };
            print_json(&client.order_history(&query).await?)
        }
        ApiCommand::NftOrders {
            page,
            size,
            order_id,
        } => {
            let query = NftOrderDetailsQuery {
                page,
                size,
                order_id: order_id.unwrap_or_default(),
            };
            print_json(&client.nft_order_details(&query).await?)
        }
        ApiCommand::RawStatus { order_id } => {
            let query = RawTransactionStatusQuery { order_id };
            print_json(&client.raw_transaction_status(&query).await?)
        }
        ApiCommand::TransferTokens {
            network,
            quantity,
            recipient,
            token,
            wait,
        } => {
            let request = TransferTokens {
                network_name: network,
                token_address: token,
                quantity,
                recipient_address: recipient,
            };
            if wait {
                let order = client
                    .transfer_tokens_with_job_status(&request)
                    .await
                    .context("Transfer did not complete")?;
                print_json(&order)
            } else {
                print_json(&client.transfer_tokens(&request).await?)
            }
        }
        ApiCommand::TransferNft {
            network,
            collection_address,
            nft_address,
            recipient,
            collection_name,
            quantity,
            operation_type,
        } => {
            let request = TransferNft {
                operation_type,
                network_name: network,
                collection_address,
                collection_name,
                quantity,
                recipient_address: recipient,
                nft_address,
            };
            print_json(&client.transfer_nft(&request).await?)
        }
        ApiCommand::ExecuteRaw {
            network,
            transaction,
            wait,
        } => {
            let transaction: serde_json::Value = serde_json::from_str(&transaction)
                .context("Transaction must be a JSON object")?;
            let request = ExecuteRawTransaction::new(network, transaction);
            if wait {
                let status = client
                    .execute_raw_transaction_with_job_status(&request)
                    .await
                    .context("Raw transaction did not complete")?;
                print_json(&status)
            } else {
                print_json(&client.execute_raw_transaction(&request).await?)
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use okto_core::FileStore;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transfer_with_wait() {
        let cli = Cli::parse_from([
            "okto",
            "--environment",
            "staging",
            "transfer-tokens",
            "POLYGON",
            "0.5",
            "0xabc",
            "--wait",
        ]);

        assert_eq!(cli.environment.as_deref(), Some("staging"));
        match cli.command {
            Commands::Api(ApiCommand::TransferTokens {
                network,
                quantity,
                recipient,
                token,
                wait,
            }) => {
                assert_eq!(network, "POLYGON");
                assert_eq!(quantity, "0.5");
                assert_eq!(recipient, "0xabc");
                assert!(token.is_empty());
                assert!(wait);
            }
            _ => panic!("expected transfer-tokens"),
        }
    }

    #[test]
    fn test_parse_orders_defaults() {
        let cli = Cli::parse_from(["okto", "orders", "--state", "open"]);
        match cli.command {
            Commands::Api(ApiCommand::Orders {
                offset,
                limit,
                order_id,
                state,
            }) => {
                assert_eq!(offset, 0);
                assert_eq!(limit, 0);
                assert!(order_id.is_none());
                assert_eq!(state.as_deref(), Some("open"));
            }
            _ => panic!("expected orders"),
        }
    }

    #[test]
    fn test_parse_logout_and_status() {
        assert!(matches!(
            Cli::parse_from(["okto", "logout"]).command,
            Commands::Logout
        ));
        assert!(matches!(
            Cli::parse_from(["okto", "status"]).command,
            Commands::Status
        ));
        assert!(matches!(
            Cli::parse_from(["okto", "refresh"]).command,
            Commands::Api(ApiCommand::Refresh)
        ));
    }

    #[tokio::test]
    async fn test_logout_and_status_without_client() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("session.json"));

        assert_eq!(session_state(&store).await.unwrap(), "logged out");

        store
            .save(&SessionTokens::new("A1", "R1", "D1").unwrap())
            .await
            .unwrap();
        assert_eq!(session_state(&store).await.unwrap(), "authenticated");

        clear_session(&store).await.unwrap();

        assert_eq!(
            store.load().await.unwrap(),
            Some(SessionTokens::logged_out())
        );
        assert_eq!(session_state(&store).await.unwrap(), "logged out");
    }
}
