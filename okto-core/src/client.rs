//! High-level client for the Okto wallet API.
//!
//! [`OktoClient`] wires the [`SessionManager`], [`RequestExecutor`] and
//! [`JobPoller`] together and exposes one method per endpoint. Operations the
//! backend completes asynchronously come in two forms: a plain submission
//! returning the job id, and a `*_with_job_status` variant that submits and
//! then polls until the job settles.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), okto_core::OktoError> {
//! use okto_core::{ClientConfig, Environment, OktoClient, TransferTokens};
//!
//! let client = OktoClient::new(ClientConfig::new("api-key", Environment::Sandbox)).await?;
//! client.authenticate("google-id-token").await?;
//!
//! let order = client
//!     .transfer_tokens_with_job_status(&TransferTokens {
//!         network_name: "POLYGON".to_string(),
//!         token_address: String::new(),
//!         quantity: "0.1".to_string(),
//!         recipient_address: "0xabc".to_string(),
//!     })
//!     .await?;
//! println!("order {} finished as {}", order.order_id, order.status);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::OktoError;
use crate::executor::{RequestExecutor, query_path};
use crate::model::{
    ExecuteRawTransaction, ExecuteRawTransactionData, NftOrderDetailsData, NftOrderDetailsQuery,
    Order, OrderData, OrderQuery, PortfolioData, RawTransactionStatus, RawTransactionStatusData,
    RawTransactionStatusQuery, TokensData, TokensDataNetworks, TransferNft, TransferNftData,
    TransferTokens, TransferTokensData, User, WalletData,
};
use crate::poller::{JobPoller, PollConfig};
use crate::query::QueryString;
use crate::session::SessionTokens;
use crate::session_manager::SessionManager;
use crate::store::{CredentialStore, create_store};
use crate::transport::Transport;

/// Client for one user session. Cloning is cheap and clones share the session.
#[derive(Debug, Clone)]
pub struct OktoClient {
    executor: RequestExecutor,
    session: Arc<SessionManager>,
    poller: JobPoller,
}

impl OktoClient {
    /// Build a client using the store backend named in the configuration.
    pub async fn new(config: ClientConfig) -> Result<Self, OktoError> {
        let store = create_store(&config.store);
        Self::with_store(config, store).await
    }

    /// Build a client persisting its session to `store`.
    pub async fn with_store(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, OktoError> {
        config.validate()?;

        let transport = Transport::new(&config)?;
        let session = Arc::new(SessionManager::load(transport.clone(), store).await?);
        let executor = RequestExecutor::new(transport, session.clone());

        tracing::debug!(
            "Client ready for {} ({})",
            config.environment,
            executor.base_url()
        );

        Ok(Self {
            executor,
            session,
            poller: JobPoller::new(config.poll_config()),
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Poll budget used by the `*_with_job_status` operations.
    pub fn poll_config(&self) -> &PollConfig {
        self.poller.config()
    }

    // -- session ------------------------------------------------------------

    pub async fn authenticate(&self, id_token: &str) -> Result<SessionTokens, OktoError> {
        self.session.authenticate(id_token).await
    }

    pub async fn refresh(&self) -> Result<SessionTokens, OktoError> {
        self.session.refresh().await
    }

    pub async fn logout(&self) -> Result<(), OktoError> {
        self.session.logout().await
    }

    // -- account data ---------------------------------------------------------

    pub async fn portfolio(&self) -> Result<PortfolioData, OktoError> {
        Ok(self.executor.get("/v1/portfolio").await?.into_data())
    }

    pub async fn supported_networks(&self) -> Result<TokensDataNetworks, OktoError> {
        Ok(self.executor.get("/v1/supported/networks").await?.into_data())
    }

    pub async fn supported_tokens(&self) -> Result<TokensData, OktoError> {
        Ok(self.executor.get("/v1/supported/tokens").await?.into_data())
    }

    pub async fn user_details(&self) -> Result<User, OktoError> {
        Ok(self.executor.get("/v1/user_from_token").await?.into_data())
    }

    pub async fn wallets(&self) -> Result<WalletData, OktoError> {
        Ok(self.executor.get("/v1/wallet").await?.into_data())
    }

    pub async fn create_wallet(&self) -> Result<WalletData, OktoError> {
        Ok(self.executor.post("/v1/wallet").await?.into_data())
    }

    // -- orders -----------------------------------------------------------------

    pub async fn order_history(&self, query: &OrderQuery) -> Result<OrderData, OktoError> {
        Ok(self
            .executor
            .get_with_query("/v1/orders", query)
            .await?
            .into_data())
    }

    pub async fn nft_order_details(
        &self,
        query: &NftOrderDetailsQuery,
    ) -> Result<NftOrderDetailsData, OktoError> {
        Ok(self
            .executor
            .get_with_query("/v1/nft/order_details", query)
            .await?
            .into_data())
    }

    pub async fn raw_transaction_status(
        &self,
        query: &RawTransactionStatusQuery,
    ) -> Result<RawTransactionStatusData, OktoError> {
        Ok(self
            .executor
            .get_with_query("/v1/rawtransaction/status", query)
            .await?
            .into_data())
    }

    // -- submissions --------------------------------------------------------------

    /// Submit a token transfer. Returns as soon as the order is accepted.
    pub async fn transfer_tokens(
        &self,
        request: &TransferTokens,
    ) -> Result<TransferTokensData, OktoError> {
        Ok(self
            .executor
            .post_json("/v1/transfer/tokens/execute", request)
            .await?
            .into_data())
    }

    /// Submit an NFT transfer.
    pub async fn transfer_nft(&self, request: &TransferNft) -> Result<TransferNftData, OktoError> {
        Ok(self
            .executor
            .post_json("/v1/nft/transfer", request)
            .await?
            .into_data())
    }

    /// Submit a raw transaction. Returns as soon as the job is accepted.
    pub async fn execute_raw_transaction(
        &self,
        request: &ExecuteRawTransaction,
    ) -> Result<ExecuteRawTransactionData, OktoError> {
        let mut query = QueryString::new();
        query.text("network_name", &request.network_name);
        let path = query_path("/v1/rawtransaction/execute", &query);

        Ok(self.executor.post_json(&path, request).await?.into_data())
    }

    // -- submit and wait ------------------------------------------------------------

    /// Transfer tokens and wait for the order to settle.
    ///
    /// A `failed` order is returned as `Ok`; inspect its status.
    pub async fn transfer_tokens_with_job_status(
        &self,
        request: &TransferTokens,
    ) -> Result<Order, OktoError> {
        self.transfer_tokens_with_poll_config(request, self.poller.config().clone())
            .await
    }

    pub async fn transfer_tokens_with_poll_config(
        &self,
        request: &TransferTokens,
        poll: PollConfig,
    ) -> Result<Order, OktoError> {
        let submitted = self.transfer_tokens(request).await?;
        let order_id = require_job_id(submitted.order_id, "orderId")?;
        tracing::info!("Token transfer submitted as order {}", order_id);

        JobPoller::new(poll)
            .poll(&order_id, |id| self.find_order(id))
            .await
    }

    /// Execute a raw transaction and wait for the job to settle.
    ///
    /// A `failed` job is returned as `Ok`; inspect its status.
    pub async fn execute_raw_transaction_with_job_status(
        &self,
        request: &ExecuteRawTransaction,
    ) -> Result<RawTransactionStatus, OktoError> {
        self.execute_raw_transaction_with_poll_config(request, self.poller.config().clone())
            .await
    }

    pub async fn execute_raw_transaction_with_poll_config(
        &self,
        request: &ExecuteRawTransaction,
        poll: PollConfig,
    ) -> Result<RawTransactionStatus, OktoError> {
        let submitted = self.execute_raw_transaction(request).await?;
        let job_id = require_job_id(submitted.job_id, "jobId")?;
        tracing::info!("Raw transaction submitted as job {}", job_id);

        JobPoller::new(poll)
            .poll(&job_id, |id| self.find_raw_transaction(id))
            .await
    }

    async fn find_order(&self, order_id: String) -> Result<Option<Order>, OktoError> {
        let data = self.order_history(&OrderQuery::for_order(&order_id)).await?;
        Ok(data.find(&order_id).cloned())
    }

    async fn find_raw_transaction(
        &self,
        order_id: String,
    ) -> Result<Option<RawTransactionStatus>, OktoError> {
        let query = RawTransactionStatusQuery {
            order_id: order_id.clone(),
        };
        let data = self.raw_transaction_status(&query).await?;
        Ok(data.find(&order_id).cloned())
    }
}

fn require_job_id(id: String, field: &str) -> Result<String, OktoError> {
    if id.is_empty() {
        return Err(OktoError::Decode {
            message: format!("submission response carried no {}", field),
            body: String::new(),
        });
    }
    Ok(id)
}
