//! Signature resolution for remotely produced Potato signatures.
//!
//! The signer service returns only the `(r, s)` scalars of an ECDSA
//! signature, embedded in a commit's log lines. This crate turns that raw
//! output into a full Ethereum signature:
//!
//! - [`commit_log`] module -- extracts `(r, s)` from a commit per the
//!   signing function's logging contract
//! - [`resolve_signature`] -- recovers the missing parity `v` by trial
//!   recovery against the identity's known address
//! - [`EthSignature`] -- the resolved 65-byte `r ‖ s ‖ v` signature
//!
//! # Design
//!
//! Resolution never guesses: a candidate parity is accepted only if the
//! address recovered from `(digest, r, s, v)` equals the expected address.
//! If neither parity matches, the input is corrupted or belongs to a
//! different digest/identity, and resolution fails loudly rather than
//! returning a signature that would not verify.

pub mod commit_log;
mod resolve;

pub use commit_log::signature_components;
pub use resolve::{EthSignature, resolve_signature};

use std::fmt;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from signature resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerError {
    /// Neither recovery parity yields the expected address. The `(r, s)`
    /// pair is corrupted, or digest/identity do not match the job.
    SignatureMismatch,

    /// The commit's logs violate the signing function's output contract.
    /// Indicates an incompatible service change, never tolerated silently.
    MalformedJobOutput,
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignatureMismatch => {
                write!(f, "signature does not match digest and expected address")
            }
            Self::MalformedJobOutput => {
                write!(f, "job output does not follow the signing function's log contract")
            }
        }
    }
}

impl std::error::Error for SignerError {}
