//! # Okto Core
//!
//! Client library for the Okto wallet API.
//!
//! This crate provides:
//! - Session lifecycle (authenticate, refresh, logout) with pluggable persistence
//! - An authenticated request executor that unwraps the `{status, data}` envelope
//! - A bounded job poller for operations the backend completes asynchronously
//! - Typed request and response models for every endpoint
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use okto_core::{ClientConfig, Environment, OktoClient};
//!
//! async fn show_wallets() -> Result<(), okto_core::OktoError> {
//!     let client = OktoClient::new(ClientConfig::new("api-key", Environment::Sandbox)).await?;
//!     if !client.session().is_authenticated() {
//!         client.authenticate("google-id-token").await?;
//!     }
//!     for wallet in client.wallets().await?.wallets {
//!         println!("{}: {}", wallet.network_name, wallet.address);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod poller;
pub mod query;
pub mod session;
pub mod session_manager;
pub mod store;
pub mod transport;

// Re-export commonly used types at crate root
pub use client::OktoClient;

pub use config::{ClientConfig, Environment, PollSettings};

pub use error::{OktoError, Result};

pub use executor::RequestExecutor;

pub use model::{
    AccountMeta,
    ApiEnvelope,
    EvmTransaction,
    ExecuteRawTransaction,
    ExecuteRawTransactionData,
    Instruction,
    NftOrderDetails,
    NftOrderDetailsData,
    NftOrderDetailsQuery,
    Order,
    OrderData,
    OrderQuery,
    Portfolio,
    PortfolioData,
    RawTransactionStatus,
    RawTransactionStatusData,
    RawTransactionStatusQuery,
    SolanaTransaction,
    Token,
    TokenNetwork,
    TokensData,
    TokensDataNetworks,
    TransferNft,
    TransferNftData,
    TransferTokens,
    TransferTokensData,
    User,
    Wallet,
    WalletData,
};

pub use poller::{
    JobPoller,
    JobRecord,
    JobStatus,
    PollConfig,
    PollState,
    PollStep,
    RetryPolicy,
};

pub use query::{QueryParams, QueryString};

pub use session::SessionTokens;

pub use session_manager::SessionManager;

pub use store::{
    CredentialStore,
    FileStore,
    MemoryStore,
    Secret,
    StoreBackend,
    StoreError,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use transport::Transport;
