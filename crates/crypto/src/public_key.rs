//! Public-key derivation boundary and Ethereum address computation.
//!
//! The signer service's root public key is published, so anyone can derive
//! the public key of a Potato locally from the service id and the
//! [`DerivationPath`](crate::DerivationPath) -- without contacting the
//! service. The derivation algorithm itself (IC threshold-ECDSA subkey
//! derivation) lives behind the [`PublicKeyDeriver`] trait so callers can
//! plug in the platform implementation, and tests a fixture.

use std::fmt;

use alloy_primitives::{Address, keccak256};
use k256::PublicKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::DerivationPath;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors returned by public-key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeriveError {
    /// The deriver could not produce a key for the given service and path.
    Failed(String),
}

impl fmt::Display for DeriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "public key derivation failed: {reason}"),
        }
    }
}

impl std::error::Error for DeriveError {}

// ---------------------------------------------------------------------------
// PublicKeyDeriver
// ---------------------------------------------------------------------------

/// Derives the public key a signer service will sign with for a path.
///
/// Implementations are pure computations over the service's published root
/// key; no I/O is required or expected.
pub trait PublicKeyDeriver: Send + Sync {
    /// Derives the secp256k1 public key for `path` under `service_id`.
    fn derive_public_key(
        &self,
        service_id: &str,
        path: &DerivationPath,
    ) -> Result<PublicKey, DeriveError>;
}

// ---------------------------------------------------------------------------
// Ethereum address
// ---------------------------------------------------------------------------

/// Computes the Ethereum address of a secp256k1 public key.
///
/// Keccak-256 of the uncompressed SEC1 point without its `0x04` tag byte,
/// truncated to the final 20 bytes.
pub fn eth_address(public_key: &PublicKey) -> Address {
    let point = public_key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&digest[12..])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
