//! Key derivation paths for Potato identities.
//!
//! The remote signer service derives one key per Potato from its root key
//! and a caller-scoped derivation path. This module builds that path:
//!
//! | Segment | Bytes | Content |
//! |---------|-------|---------|
//! | 1 | 13 | namespace tag `"❄️/caller"` (UTF-8) |
//! | 2 | 29 | chain-type tag (1) ++ big-endian chain id (8) ++ contract address (20) |
//! | 3 | 32 | big-endian token id |
//!
//! The construction is a cross-system contract: it must match the signer
//! service's own path building byte for byte, or the service will sign with
//! a different key than the one this SDK verifies against. Changing it
//! requires a coordinated redeployment of the signer service.
//!
//! Pure and deterministic -- no I/O, no heap allocation.

use alloy_primitives::Address;
use config::Identity;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Namespace tag prefixing every caller-scoped derivation path.
pub const NAMESPACE_TAG: &[u8] = "❄️/caller".as_bytes();

/// Chain-type tag for EVM chains (the only chain type deployed today).
const CHAIN_TYPE_EVM: u8 = 0;

// ---------------------------------------------------------------------------
// DerivationPath
// ---------------------------------------------------------------------------

/// The derivation path of one Potato's key.
///
/// Always 3 segments. Stored entirely on the stack -- no heap allocation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DerivationPath {
    caller: [u8; 29],
    token: [u8; 32],
}

impl DerivationPath {
    /// Builds the derivation path for one identity.
    pub fn for_identity(identity: &Identity) -> Self {
        Self::new(
            identity.chain_id(),
            identity.contract_address(),
            identity.token_id().to_be_bytes::<32>(),
        )
    }

    /// Builds a path from raw components.
    pub fn new(chain_id: u64, contract_address: Address, token_id_be: [u8; 32]) -> Self {
        let mut caller = [0u8; 29];
        caller[0] = CHAIN_TYPE_EVM;
        caller[1..9].copy_from_slice(&chain_id.to_be_bytes());
        caller[9..29].copy_from_slice(contract_address.as_slice());
        Self {
            caller,
            token: token_id_be,
        }
    }

    /// The path segments, in derivation order.
    pub fn segments(&self) -> [&[u8]; 3] {
        [NAMESPACE_TAG, &self.caller, &self.token]
    }
}

impl std::fmt::Debug for DerivationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.segments().iter().map(alloy_primitives::hex::encode))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn namespace_tag_bytes() {
        // U+2744 U+FE0F '/', 'c', 'a', 'l', 'l', 'e', 'r'
        assert_eq!(
            NAMESPACE_TAG,
            [
                0xe2, 0x9d, 0x84, 0xef, 0xb8, 0x8f, b'/', b'c', b'a', b'l', b'l', b'e', b'r'
            ]
        );
        assert_eq!(NAMESPACE_TAG.len(), 13);
    }

    #[test]
    fn hot_potato_path_exact_bytes() {
        let path = DerivationPath::for_identity(&Identity::hot_potato(1));
        let [tag, caller, token] = path.segments();

        assert_eq!(tag, NAMESPACE_TAG);

        // 1-byte EVM tag, 8-byte chain id (42161 = 0xa4b1), 20-byte contract.
        let mut expected_caller = vec![0u8; 9];
        expected_caller[7] = 0xa4;
        expected_caller[8] = 0xb1;
        expected_caller
            .extend_from_slice(address!("f349317Fc182e1d8755fBee72946616182fFeaBd").as_slice());
        assert_eq!(caller, &expected_caller[..]);

        // 32-byte big-endian token id.
        let mut expected_token = [0u8; 32];
        expected_token[31] = 1;
        assert_eq!(token, expected_token);
    }

    #[test]
    fn segment_lengths() {
        let path = DerivationPath::for_identity(&Identity::hot_potato(9));
        let [tag, caller, token] = path.segments();
        assert_eq!(tag.len(), 13);
        assert_eq!(caller.len(), 29);
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn deterministic() {
        let a = DerivationPath::for_identity(&Identity::hot_potato(5));
        let b = DerivationPath::for_identity(&Identity::hot_potato(5));
        assert_eq!(a, b);
    }

    #[test]
    fn token_id_changes_path() {
        let a = DerivationPath::for_identity(&Identity::hot_potato(1));
        let b = DerivationPath::for_identity(&Identity::hot_potato(2));
        assert_ne!(a, b);
        // Only the token segment differs.
        assert_eq!(a.segments()[1], b.segments()[1]);
        assert_ne!(a.segments()[2], b.segments()[2]);
    }

    #[test]
    fn chain_id_is_big_endian() {
        let path = DerivationPath::new(0x0102030405060708, Address::ZERO, [0u8; 32]);
        let caller = path.segments()[1];
        assert_eq!(caller[1..9], [1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
