//! Chain reads: the receipt boundary and a JSON-RPC implementation.
//!
//! [`ChainReader`] is the seam between the SDK and the chain: everything the
//! authorization finder needs is one receipt lookup. [`JsonRpcChainReader`]
//! is the concrete implementation speaking `eth_getTransactionReceipt`
//! against the identity's RPC endpoint; tests swap in static fakes.

use std::fmt;

use alloy_primitives::{Address, B256, Bytes, U64};
use serde::Deserialize;
use tracing::debug;

use config::Identity;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from chain reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The RPC call failed (transport error, HTTP failure, or an error
    /// object in the RPC envelope).
    Rpc(String),

    /// The RPC response could not be decoded.
    InvalidResponse,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc(reason) => write!(f, "RPC call failed: {reason}"),
            Self::InvalidResponse => write!(f, "invalid RPC response"),
        }
    }
}

impl std::error::Error for ChainError {}

// ---------------------------------------------------------------------------
// Receipt model
// ---------------------------------------------------------------------------

/// One log record of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Contract that emitted the log.
    pub address: Address,
    /// Indexed topics; `topics[0]` is the event signature hash.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed fields.
    pub data: Bytes,
}

/// A mined transaction's receipt, reduced to what authorization lookup
/// needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub block_hash: B256,
    pub block_number: u64,
    pub transaction_hash: B256,
    pub logs: Vec<LogRecord>,
}

// ---------------------------------------------------------------------------
// ChainReader
// ---------------------------------------------------------------------------

/// Read access to a chain's transaction receipts.
pub trait ChainReader: Send + Sync {
    /// Fetches the receipt of a transaction. `None` if the transaction is
    /// unknown or not yet mined.
    fn receipt(
        &self,
        tx_hash: B256,
    ) -> impl std::future::Future<Output = Result<Option<Receipt>, ChainError>> + Send;
}

// ---------------------------------------------------------------------------
// JSON-RPC implementation
// ---------------------------------------------------------------------------

/// [`ChainReader`] backed by an EVM JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpcChainReader {
    url: String,
    client: reqwest::Client,
}

impl JsonRpcChainReader {
    /// Creates a reader for the given JSON-RPC endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Creates a reader for an identity's suggested RPC endpoint.
    pub fn for_identity(identity: &Identity) -> Self {
        Self::new(identity.default_rpc_url())
    }
}

impl ChainReader for JsonRpcChainReader {
    async fn receipt(&self, tx_hash: B256) -> Result<Option<Receipt>, ChainError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getTransactionReceipt",
            "params": [format!("{tx_hash}")],
        });

        debug!(url = %self.url, tx = %tx_hash, "eth_getTransactionReceipt");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Rpc(format!("HTTP {status}")));
        }

        let envelope: RpcEnvelope<RpcReceipt> = response
            .json()
            .await
            .map_err(|_| ChainError::InvalidResponse)?;

        if let Some(error) = envelope.error {
            return Err(ChainError::Rpc(error.message));
        }
        Ok(envelope.result.map(Receipt::from))
    }
}

// ---------------------------------------------------------------------------
// RPC wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[allow(dead_code)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    block_hash: B256,
    block_number: U64,
    transaction_hash: B256,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

#[derive(Debug, Deserialize)]
struct RpcLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
}

impl From<RpcReceipt> for Receipt {
    fn from(r: RpcReceipt) -> Self {
        Self {
            block_hash: r.block_hash,
            block_number: r.block_number.to::<u64>(),
            transaction_hash: r.transaction_hash,
            logs: r
                .logs
                .into_iter()
                .map(|log| LogRecord {
                    address: log.address,
                    topics: log.topics,
                    data: log.data,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
