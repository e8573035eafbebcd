//! Recovery-parity resolution by trial recovery.

use std::fmt;

use alloy_primitives::{Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tracing::debug;

use crate::SignerError;
use potato_crypto::eth_address;

// ---------------------------------------------------------------------------
// EthSignature
// ---------------------------------------------------------------------------

/// A resolved Ethereum ECDSA signature: `r ‖ s ‖ v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthSignature {
    pub r: B256,
    pub s: B256,
    /// Recovery parity in Ethereum convention: 27 or 28.
    pub v: u8,
}

impl EthSignature {
    /// Serializes to the 65-byte wire form `r ‖ s ‖ v`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }
}

/// Hex form with `0x` prefix, as delivered to wallet-connection peers.
impl fmt::Display for EthSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", alloy_primitives::hex::encode(self.to_bytes()))
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolves the recovery parity of a remotely produced `(r, s)` pair.
///
/// Tries `v = 27` then `v = 28`, recovering the signing address from
/// `(hash_to_sign, r, s, v)` and comparing it to `expected_address` -- the
/// identity's derived address. Candidates that fail to recover at all (an
/// `r` that is not a valid curve x-coordinate, a zero scalar) count as
/// non-matches.
///
/// # Errors
///
/// [`SignerError::SignatureMismatch`] if neither parity recovers the
/// expected address. A wrong signature is never returned silently.
pub fn resolve_signature(
    expected_address: Address,
    hash_to_sign: B256,
    r: B256,
    s: B256,
) -> Result<EthSignature, SignerError> {
    for v in [27u8, 28] {
        let Some(recovered) = recover_address(hash_to_sign, r, s, v) else {
            continue;
        };
        if recovered == expected_address {
            return Ok(EthSignature { r, s, v });
        }
        debug!(%recovered, %expected_address, v, "recovered address does not match");
    }
    Err(SignerError::SignatureMismatch)
}

/// Recovers the signer's address from a signature candidate, or `None` if
/// the scalars do not form a recoverable signature for this parity.
fn recover_address(digest: B256, r: B256, s: B256, v: u8) -> Option<Address> {
    let signature = Signature::from_scalars(r.0, s.0).ok()?;
    let parity = RecoveryId::new(v == 28, false);
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, parity).ok()?;
    Some(eth_address(&key.into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
