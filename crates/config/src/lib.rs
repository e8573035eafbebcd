//! Potato identity configuration.
//!
//! This crate provides static, per-deployment configuration for the Potato SDK:
//!
//! - [`IdentityConfig`] -- one on-chain Potato deployment (chain, contract,
//!   signer service, pricing)
//! - [`Identity`] -- a single signable Potato: a deployment plus a token id
//! - [`constants`] -- protocol-level parameters (poll intervals, gas limits)
//!
//! All deployment data is compile-time constant (`&'static str`,
//! `&'static IdentityConfig`). [`Identity`] is `Copy`. `config` depends only
//! on `alloy-primitives` for EVM scalar types -- no transport, crypto, or
//! runtime crates -- so it can be used freely as a leaf dependency.

pub mod constants;

use std::fmt;

use alloy_primitives::{Address, U256, address};

// ---------------------------------------------------------------------------
// IdentityConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every Potato minted from one contract deployment.
///
/// All fields are fixed at construction. One `IdentityConfig` models one
/// (chain, contract, signer service) triple; individual Potatoes are
/// [`Identity`] values referencing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityConfig {
    /// EVM chain id the Potato contract is deployed on.
    pub chain_id: u64,

    /// Address of the Potato NFT contract.
    pub contract_address: Address,

    /// Id of the remote signer service (canister) producing signatures.
    pub signer_service_id: &'static str,

    /// Suggested RPC endpoint for chain reads.
    pub default_rpc_url: &'static str,

    /// Cost of one signature authorization, in wei.
    pub signature_cost_wei: U256,
}

/// The original Hot Potato deployment on Arbitrum One.
pub const HOT_POTATO: IdentityConfig = IdentityConfig {
    chain_id: 42161,
    contract_address: address!("f349317Fc182e1d8755fBee72946616182fFeaBd"),
    signer_service_id: "n6va3-cyaaa-aaaao-qk6pq-cai",
    default_rpc_url: "https://arb1.arbitrum.io/rpc/",
    // 29k gwei.
    signature_cost_wei: U256::from_limbs([29_000_000_000_000, 0, 0, 0]),
};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// One signable Potato: a deployment plus a token id.
///
/// `Copy` -- a pointer to static data and one scalar. Immutable after
/// construction; one `Identity` value models exactly one signable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    config: &'static IdentityConfig,
    token_id: U256,
}

impl Identity {
    /// Creates an identity for `token_id` under the given deployment.
    pub const fn new(config: &'static IdentityConfig, token_id: U256) -> Self {
        Self { config, token_id }
    }

    /// Creates a Hot Potato identity (Arbitrum One deployment).
    pub fn hot_potato(token_id: u64) -> Self {
        Self::new(&HOT_POTATO, U256::from(token_id))
    }

    /// The NFT token id of this Potato.
    pub const fn token_id(&self) -> U256 {
        self.token_id
    }

    /// The deployment configuration backing this Potato.
    pub const fn config(&self) -> &'static IdentityConfig {
        self.config
    }

    /// EVM chain id the Potato contract is deployed on.
    pub const fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Address of the Potato NFT contract.
    pub const fn contract_address(&self) -> Address {
        self.config.contract_address
    }

    /// Id of the remote signer service producing signatures.
    pub const fn signer_service_id(&self) -> &'static str {
        self.config.signer_service_id
    }

    /// Suggested RPC endpoint for chain reads.
    pub const fn default_rpc_url(&self) -> &'static str {
        self.config.default_rpc_url
    }

    /// Cost of one signature authorization, in wei.
    pub const fn signature_cost_wei(&self) -> U256 {
        self.config.signature_cost_wei
    }
}

// ---------------------------------------------------------------------------
// Token id parsing
// ---------------------------------------------------------------------------

/// Error from [`parse_token_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenIdError {
    /// The input is empty or whitespace-only.
    Empty,
    /// The input is not a decimal unsigned integer.
    InvalidDigits,
}

impl fmt::Display for TokenIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "token id must be a non-empty string"),
            Self::InvalidDigits => write!(f, "token id must be a decimal integer"),
        }
    }
}

impl std::error::Error for TokenIdError {}

/// Parses a decimal token id from user input (e.g. a route parameter).
pub fn parse_token_id(value: &str) -> Result<U256, TokenIdError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TokenIdError::Empty);
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| TokenIdError::InvalidDigits)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
