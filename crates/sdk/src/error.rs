//! SDK error types.
//!
//! [`SdkError`] is the unified error type for all SDK operations. Errors
//! from the collaborating crates fold into it via `From` impls so operation
//! code can use `?` throughout.

use std::fmt;

use frosty_client::FrostyError;
use potato_crypto::DeriveError;
use signer::SignerError;

use crate::chain::ChainError;

// ---------------------------------------------------------------------------
// SdkError
// ---------------------------------------------------------------------------

/// Errors from SDK operations.
///
/// None of these are retried automatically; retry policy is the caller's
/// decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    /// The SDK has been shut down (cancellation token fired).
    Cancelled,

    /// The authorization, job, or commit does not exist. Expected during
    /// normal operation (e.g. an unconfirmed transaction); surfaced to the
    /// caller as-is.
    NotFound,

    /// Submission found no job request for the authorization. The caller
    /// should re-verify the authorization or wait and retry.
    AuthorizationNotIndexed,

    /// The signing job reached its terminal `Failed` state. The service's
    /// reason is carried verbatim.
    SigningJobFailed(String),

    /// The signer service's output contract was violated (wrong commit
    /// count, malformed logs). Indicates a service-compatibility break.
    MalformedJobOutput,

    /// The recovered signer address never matched the identity's. Indicates
    /// corrupted signature data or a digest/identity mismatch.
    SignatureMismatch,

    /// The identity's chain is not supported by the signer service.
    UnsupportedChain(u64),

    /// A chain RPC call failed.
    ChainUnavailable(String),

    /// A signer service call failed.
    ServiceUnavailable(String),

    /// The identity's public key could not be derived.
    KeyDerivationFailed(String),
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::NotFound => write!(f, "not found"),
            Self::AuthorizationNotIndexed => {
                write!(f, "no job request found for the authorization")
            }
            Self::SigningJobFailed(reason) => write!(f, "signing job failed: {reason}"),
            Self::MalformedJobOutput => write!(f, "malformed signing job output"),
            Self::SignatureMismatch => {
                write!(f, "signature does not match digest and identity")
            }
            Self::UnsupportedChain(id) => write!(f, "unsupported chain id {id}"),
            Self::ChainUnavailable(reason) => write!(f, "chain RPC failed: {reason}"),
            Self::ServiceUnavailable(reason) => {
                write!(f, "signer service unavailable: {reason}")
            }
            Self::KeyDerivationFailed(reason) => {
                write!(f, "public key derivation failed: {reason}")
            }
        }
    }
}

impl std::error::Error for SdkError {}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<FrostyError> for SdkError {
    fn from(e: FrostyError) -> Self {
        match e {
            FrostyError::Service(reason) | FrostyError::IndexingFailed(reason) => {
                Self::ServiceUnavailable(reason)
            }
            FrostyError::CommitNotFound(_) => Self::NotFound,
        }
    }
}

impl From<SignerError> for SdkError {
    fn from(e: SignerError) -> Self {
        match e {
            SignerError::SignatureMismatch => Self::SignatureMismatch,
            SignerError::MalformedJobOutput => Self::MalformedJobOutput,
        }
    }
}

impl From<ChainError> for SdkError {
    fn from(e: ChainError) -> Self {
        Self::ChainUnavailable(e.to_string())
    }
}

impl From<DeriveError> for SdkError {
    fn from(e: DeriveError) -> Self {
        let DeriveError::Failed(reason) = e;
        Self::KeyDerivationFailed(reason)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
