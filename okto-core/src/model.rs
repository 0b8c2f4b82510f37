//! Wire types for the Okto wallet API.
//!
//! This module defines:
//! - [`ApiEnvelope`] - The `{status, data}` wrapper every response uses
//! - Request bodies ([`TransferTokens`], [`TransferNft`], [`ExecuteRawTransaction`])
//! - Query types ([`OrderQuery`], [`NftOrderDetailsQuery`], [`RawTransactionStatusQuery`])
//! - Response payloads (portfolio, wallets, orders, raw transaction status, ...)
//!
//! Response fields default when absent or `null` so that additive server
//! changes do not break decoding.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::OktoError;
use crate::poller::{JobRecord, JobStatus};
use crate::query::{QueryParams, QueryString};

/// Decode `null` as the type's default. Missing fields are covered by the
/// container-level `#[serde(default)]`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope status value marking a successful call.
pub const STATUS_SUCCESS: &str = "success";

/// The `{status, data}` wrapper returned by every endpoint.
///
/// HTTP success and envelope success are independent signals; a response is
/// only usable when both hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

// ---------------------------------------------------------------------------
// Orders and jobs
// ---------------------------------------------------------------------------

/// Filter for the order history endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    pub offset: u32,
    pub limit: u32,
    pub order_id: String,
    pub order_state: String,
}

impl OrderQuery {
    /// Query matching a single order.
    pub fn for_order(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            ..Self::default()
        }
    }
}

impl QueryParams for OrderQuery {
    fn write_query(&self, query: &mut QueryString) {
        query
            .count("offset", self.offset)
            .count("limit", self.limit)
            .text("order_id", &self.order_id)
            .text("order_state", &self.order_state);
    }
}

/// One entry of the order history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    #[serde(deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub transaction_hash: Option<String>,
}

impl JobRecord for Order {
    fn order_id(&self) -> &str {
        &self.order_id
    }

    fn job_status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderData {
    #[serde(deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub jobs: Vec<Order>,
}

impl OrderData {
    pub fn find(&self, order_id: &str) -> Option<&Order> {
        find_job(&self.jobs, order_id)
    }
}

/// Filter for the raw transaction status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransactionStatusQuery {
    pub order_id: String,
}

impl QueryParams for RawTransactionStatusQuery {
    fn write_query(&self, query: &mut QueryString) {
        query.text("order_id", &self.order_id);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTransactionStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub transaction_hash: Option<String>,
}

impl JobRecord for RawTransactionStatus {
    fn order_id(&self) -> &str {
        &self.order_id
    }

    fn job_status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTransactionStatusData {
    #[serde(deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub jobs: Vec<RawTransactionStatus>,
}

impl RawTransactionStatusData {
    pub fn find(&self, order_id: &str) -> Option<&RawTransactionStatus> {
        find_job(&self.jobs, order_id)
    }
}

/// First record in `jobs` belonging to `order_id`.
pub fn find_job<'a, T: JobRecord>(jobs: &'a [T], order_id: &str) -> Option<&'a T> {
    jobs.iter().find(|job| job.order_id() == order_id)
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTokens {
    pub network_name: String,
    pub token_address: String,
    pub quantity: String,
    pub recipient_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTokensData {
    #[serde(rename = "orderId")]
    pub order_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferNft {
    pub operation_type: String,
    pub network_name: String,
    pub collection_address: String,
    pub collection_name: String,
    pub quantity: String,
    pub recipient_address: String,
    pub nft_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferNftData {
    pub order_id: String,
}

/// Filter for the NFT order details endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftOrderDetailsQuery {
    pub page: u32,
    pub size: u32,
    pub order_id: String,
}

impl QueryParams for NftOrderDetailsQuery {
    fn write_query(&self, query: &mut QueryString) {
        query
            .count("page", self.page)
            .count("size", self.size)
            .text("order_id", &self.order_id);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftOrderDetails {
    #[serde(deserialize_with = "null_as_default")]
    pub explorer_smart_contract_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub collection_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub collection_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub nft_token_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token_uri: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub collection_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub collection_image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub nft_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftOrderDetailsData {
    #[serde(deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub nfts: Vec<NftOrderDetails>,
}

// ---------------------------------------------------------------------------
// Raw transactions
// ---------------------------------------------------------------------------

/// Submit an arbitrary chain transaction for signing and broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRawTransaction {
    pub network_name: String,

    /// Chain-specific transaction object, e.g. an [`EvmTransaction`] or a
    /// [`SolanaTransaction`] rendered to JSON.
    pub transaction: serde_json::Value,
}

impl ExecuteRawTransaction {
    pub fn new(network_name: impl Into<String>, transaction: serde_json::Value) -> Self {
        Self {
            network_name: network_name.into(),
            transaction,
        }
    }

    pub fn evm(network_name: impl Into<String>, tx: &EvmTransaction) -> Result<Self, OktoError> {
        Ok(Self::new(network_name, to_json(tx)?))
    }

    pub fn solana(
        network_name: impl Into<String>,
        tx: &SolanaTransaction,
    ) -> Result<Self, OktoError> {
        Ok(Self::new(network_name, to_json(tx)?))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, OktoError> {
    serde_json::to_value(value).map_err(|e| OktoError::Decode {
        message: format!("failed to encode transaction: {}", e),
        body: String::new(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRawTransactionData {
    #[serde(rename = "jobId")]
    pub job_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmTransaction {
    pub from: String,
    pub to: String,
    pub data: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolanaTransaction {
    pub instructions: Vec<Instruction>,
    pub signer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(rename = "programId")]
    pub program_id: String,

    /// Base64-encoded instruction data.
    pub data: String,

    pub keys: Vec<AccountMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub pubkey: String,
    #[serde(rename = "isSigner")]
    pub is_signer: bool,
    #[serde(rename = "isWritable")]
    pub is_writable: bool,
}

// ---------------------------------------------------------------------------
// Account data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioData {
    #[serde(deserialize_with = "null_as_default")]
    pub tokens: Vec<Portfolio>,
    #[serde(deserialize_with = "null_as_default")]
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    #[serde(deserialize_with = "null_as_default")]
    pub token_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token_image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub quantity: String,
    #[serde(deserialize_with = "null_as_default")]
    pub amount_in_inr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensDataNetworks {
    #[serde(deserialize_with = "null_as_default")]
    pub network: Vec<TokenNetwork>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenNetwork {
    #[serde(deserialize_with = "null_as_default")]
    pub network_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub chain_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub logo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensData {
    #[serde(deserialize_with = "null_as_default")]
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    #[serde(deserialize_with = "null_as_default")]
    pub token_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub network_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: String,
    /// Reported as either a flag or a string depending on the deployment.
    pub freezed: Option<serde_json::Value>,
    pub freeze_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wallet {
    #[serde(deserialize_with = "null_as_default")]
    pub network_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletData {
    #[serde(deserialize_with = "null_as_default")]
    pub wallets: Vec<Wallet>,
}
