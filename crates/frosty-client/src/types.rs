//! Mirror types for the Frosty signer service interface.
//!
//! These are local, read-only snapshots of state owned by the remote
//! service. Optional values in the service's IDL are zero-or-one-element
//! sequences; here they map to plain `Option`s.

use alloy_primitives::{Address, B256, Bytes};

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// An EVM chain the signer service can index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvmChain {
    ArbitrumOne,
    ArbitrumSepolia,
    Localhost,
}

impl EvmChain {
    /// The EVM chain id of this variant.
    pub const fn chain_id(self) -> u64 {
        match self {
            Self::ArbitrumOne => 42161,
            Self::ArbitrumSepolia => 421_614,
            Self::Localhost => 31_337,
        }
    }

    /// Resolves a chain id to a supported chain, if any.
    pub const fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            42161 => Some(Self::ArbitrumOne),
            421_614 => Some(Self::ArbitrumSepolia),
            31_337 => Some(Self::Localhost),
            _ => None,
        }
    }
}

/// A chain the signer service understands.
///
/// Closed tagged union: new chain families are added as variants, and EVM
/// is the only family deployed today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Evm(EvmChain),
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Lifecycle state of a signing job.
///
/// `Pending`, `Waiting` and `Executing` are non-terminal and must be
/// re-polled. Once a job reaches `Completed` or `Failed` its status never
/// changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Waiting,
    Executing,
    Completed,
    /// Terminal failure, with the service's reason string.
    Failed(String),
}

impl JobStatus {
    /// Whether this status will never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// The address that requested a signing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerAddress {
    Evm(Address),
}

/// The original request a job was created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Chain the authorization was observed on.
    pub chain: Chain,
    /// Requesting address.
    pub caller: CallerAddress,
    /// Call data forwarded to the signing function (token id ++ digest).
    pub data: Bytes,
    /// Hash of the deployed signing function.
    pub function_hash: B256,
    /// On-chain signature id, when the request came from an authorization
    /// event.
    pub on_chain_id: Option<u64>,
    /// Block the authorization was found in.
    pub block_number: Option<u64>,
    pub block_hash: Option<B256>,
    pub transaction_hash: Option<B256>,
    /// Gas payment attached to the request, in wei.
    pub gas_payment: u128,
}

/// One signing job, as last reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub status: JobStatus,
    pub request: JobRequest,
    /// Result-log identifiers, in execution order.
    pub commit_ids: Vec<u64>,
    pub base_fee: u128,
    pub execution_fees: u128,
    pub gas_fees: u128,
    /// Creation timestamp, in nanoseconds since the UNIX epoch.
    pub created_at: u64,
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Log severity of a commit log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Emitted by the service runtime.
    System,
    /// Emitted by the signing function itself.
    Default,
}

/// One log line of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// An immutable result record attached to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub title: String,
    /// Ordered log lines produced during this commit.
    pub logs: Vec<LogEntry>,
    /// Fees charged for this commit, in service cycles.
    pub fees: u128,
    /// Instructions executed.
    pub instructions: u64,
    /// Timestamp, in nanoseconds since the UNIX epoch.
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
