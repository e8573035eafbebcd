//! On-chain signing authorizations: the `signHash` call and its event.
//!
//! Authorizing a signature is a contract call the identity's owner submits
//! (`signHash(tokenId, hash)` with the signature cost attached). The
//! contract emits a `SignHash(uint256 indexed tokenId, bytes32 hash,
//! uint64 jobId)` event, which the signer service indexes into a job
//! request. This module builds the call and finds the event.
//!
//! Authorizations are never persisted locally -- they are re-derived from
//! chain state on every lookup.

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use tracing::debug;

use config::Identity;
use config::constants::{AUTHORIZE_GAS_LIMIT, RECEIPT_POLL_INTERVAL};
use frosty_client::FrostyApi;
use potato_crypto::PublicKeyDeriver;

use crate::chain::{ChainReader, LogRecord, Receipt};
use crate::{Sdk, SdkError};

/// Solidity signature of the authorization function.
const SIGN_HASH_FN: &str = "signHash(uint256,bytes32)";

/// Solidity signature of the authorization event.
const SIGN_HASH_EVENT: &str = "SignHash(uint256,bytes32,uint64)";

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Proof that the identity's owner approved signing a specific digest.
///
/// Decoded from the `SignHash` event; immutable once created. Exactly one
/// authorization exists per (identity, digest, signature id) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub token_id: U256,
    /// The 32-byte digest the owner approved for signing.
    pub hash_to_sign: B256,
    /// The signer service's job id for this authorization.
    pub signature_id: u64,
    pub block_hash: B256,
    pub block_number: u64,
    pub transaction_hash: B256,
}

/// Reference to the transaction that carried the authorization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxRef {
    /// A transaction expected to be mined already; an unknown hash resolves
    /// to "no authorization".
    Hash(B256),
    /// A just-submitted transaction; the receipt is awaited (polled until
    /// the transaction is mined).
    Pending(B256),
}

// ---------------------------------------------------------------------------
// The signHash call
// ---------------------------------------------------------------------------

/// A prepared `signHash` transaction for the owner's signer to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeCall {
    pub to: Address,
    /// The identity's signature cost, attached as the call value.
    pub value: U256,
    pub gas_limit: u64,
    pub chain_id: u64,
    /// Selector plus ABI-encoded `(tokenId, hash)`.
    pub data: Bytes,
}

/// Builds the authorization call for `(identity, hash)`.
///
/// Submission and broadcast stay with the caller -- the owner's wallet
/// holds the key that pays for the authorization.
pub fn sign_hash_call(identity: &Identity, hash_to_sign: B256) -> AuthorizeCall {
    let selector = &keccak256(SIGN_HASH_FN.as_bytes())[..4];
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(selector);
    data.extend_from_slice(&identity.token_id().to_be_bytes::<32>());
    data.extend_from_slice(hash_to_sign.as_slice());

    AuthorizeCall {
        to: identity.contract_address(),
        value: identity.signature_cost_wei(),
        gas_limit: AUTHORIZE_GAS_LIMIT,
        chain_id: identity.chain_id(),
        data: data.into(),
    }
}

// ---------------------------------------------------------------------------
// Event lookup
// ---------------------------------------------------------------------------

impl<C, F, D> Sdk<C, F, D>
where
    C: ChainReader,
    F: FrostyApi,
    D: PublicKeyDeriver,
{
    /// Finds the authorization for `(identity, hash_to_sign)` in the given
    /// transaction.
    ///
    /// Returns `None` if the transaction is unknown, carries no matching
    /// `SignHash` event, or carries more than one -- an ambiguous
    /// authorization is treated as absent, not disambiguated.
    pub async fn find_authorization(
        &self,
        identity: &Identity,
        hash_to_sign: B256,
        tx: TxRef,
    ) -> Result<Option<Authorization>, SdkError> {
        self.check_cancelled()?;
        let receipt = match tx {
            TxRef::Hash(hash) => match self.chain().receipt(hash).await? {
                Some(receipt) => receipt,
                None => return Ok(None),
            },
            TxRef::Pending(hash) => self.await_receipt(hash).await?,
        };
        Ok(extract_authorization(identity, hash_to_sign, &receipt))
    }

    /// Polls for a pending transaction's receipt until it is mined.
    async fn await_receipt(&self, tx_hash: B256) -> Result<Receipt, SdkError> {
        let mut interval = tokio::time::interval(RECEIPT_POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.cancel().cancelled() => return Err(SdkError::Cancelled),
                _ = interval.tick() => {}
            }
            if let Some(receipt) = self.chain().receipt(tx_hash).await? {
                return Ok(receipt);
            }
            debug!(tx = %tx_hash, "transaction not mined yet");
        }
    }
}

/// Extracts the unique matching authorization from a receipt, if any.
fn extract_authorization(
    identity: &Identity,
    hash_to_sign: B256,
    receipt: &Receipt,
) -> Option<Authorization> {
    let topic = keccak256(SIGN_HASH_EVENT.as_bytes());
    let mut matches = receipt
        .logs
        .iter()
        .filter(|log| log.address == identity.contract_address())
        .filter(|log| log.topics.first() == Some(&topic))
        .filter_map(decode_sign_hash)
        .filter(|event| event.0 == identity.token_id() && event.1 == hash_to_sign);

    let (token_id, hash, signature_id) = matches.next()?;
    if matches.next().is_some() {
        // Duplicate authorizations in one transaction are filtered out, not
        // merged or disambiguated.
        debug!(tx = %receipt.transaction_hash, "ambiguous authorization, treating as absent");
        return None;
    }

    Some(Authorization {
        token_id,
        hash_to_sign: hash,
        signature_id,
        block_hash: receipt.block_hash,
        block_number: receipt.block_number,
        transaction_hash: receipt.transaction_hash,
    })
}

/// Decodes a `SignHash` log into `(tokenId, hash, jobId)`.
///
/// `tokenId` is the indexed topic; `hash` and `jobId` are the two data
/// words. Logs that do not fit the layout are skipped.
fn decode_sign_hash(log: &LogRecord) -> Option<(U256, B256, u64)> {
    if log.topics.len() != 2 || log.data.len() != 64 {
        return None;
    }
    let token_id = U256::from_be_bytes(log.topics[1].0);
    let hash = B256::from_slice(&log.data[..32]);
    // uint64 occupies the low 8 bytes of its ABI word.
    let job_word = U256::from_be_slice(&log.data[32..]);
    let signature_id = u64::try_from(job_word).ok()?;
    Some((token_id, hash, signature_id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    const DIGEST: B256 = b256!("a1de988600a42c4b4ab089b619297c17d53cffae5d5120d82d8a92d0bb3b78f2");

    fn sign_hash_log(contract: Address, token_id: u64, hash: B256, job_id: u64) -> LogRecord {
        let mut data = Vec::with_capacity(64);
        data.extend_from_slice(hash.as_slice());
        data.extend_from_slice(&U256::from(job_id).to_be_bytes::<32>());
        LogRecord {
            address: contract,
            topics: vec![
                keccak256(SIGN_HASH_EVENT.as_bytes()),
                B256::from(U256::from(token_id)),
            ],
            data: data.into(),
        }
    }

    fn receipt(logs: Vec<LogRecord>) -> Receipt {
        Receipt {
            block_hash: B256::repeat_byte(0x0b),
            block_number: 1234,
            transaction_hash: B256::repeat_byte(0x7a),
            logs,
        }
    }

    #[test]
    fn extracts_single_matching_event() {
        let identity = Identity::hot_potato(1);
        let log = sign_hash_log(identity.contract_address(), 1, DIGEST, 77);

        let authorization =
            extract_authorization(&identity, DIGEST, &receipt(vec![log])).expect("found");
        assert_eq!(authorization.token_id, U256::from(1u64));
        assert_eq!(authorization.hash_to_sign, DIGEST);
        assert_eq!(authorization.signature_id, 77);
        assert_eq!(authorization.block_number, 1234);
        assert_eq!(authorization.block_hash, B256::repeat_byte(0x0b));
        assert_eq!(authorization.transaction_hash, B256::repeat_byte(0x7a));
    }

    #[test]
    fn no_events_is_absent() {
        let identity = Identity::hot_potato(1);
        assert!(extract_authorization(&identity, DIGEST, &receipt(vec![])).is_none());
    }

    #[test]
    fn duplicate_events_are_ambiguous() {
        let identity = Identity::hot_potato(1);
        let log = sign_hash_log(identity.contract_address(), 1, DIGEST, 77);
        let dup = log.clone();

        assert!(extract_authorization(&identity, DIGEST, &receipt(vec![log, dup])).is_none());
    }

    #[test]
    fn foreign_contract_is_filtered() {
        let identity = Identity::hot_potato(1);
        let log = sign_hash_log(Address::repeat_byte(0x99), 1, DIGEST, 77);
        assert!(extract_authorization(&identity, DIGEST, &receipt(vec![log])).is_none());
    }

    #[test]
    fn other_token_is_filtered() {
        let identity = Identity::hot_potato(1);
        let log = sign_hash_log(identity.contract_address(), 2, DIGEST, 77);
        assert!(extract_authorization(&identity, DIGEST, &receipt(vec![log])).is_none());
    }

    #[test]
    fn other_digest_is_filtered() {
        let identity = Identity::hot_potato(1);
        let log = sign_hash_log(
            identity.contract_address(),
            1,
            B256::repeat_byte(0xee),
            77,
        );
        assert!(extract_authorization(&identity, DIGEST, &receipt(vec![log])).is_none());
    }

    #[test]
    fn one_match_among_noise_is_found() {
        let identity = Identity::hot_potato(1);
        let logs = vec![
            sign_hash_log(Address::repeat_byte(0x99), 1, DIGEST, 1),
            sign_hash_log(identity.contract_address(), 2, DIGEST, 2),
            sign_hash_log(identity.contract_address(), 1, DIGEST, 3),
            sign_hash_log(identity.contract_address(), 1, B256::repeat_byte(0xee), 4),
        ];

        let authorization =
            extract_authorization(&identity, DIGEST, &receipt(logs)).expect("found");
        assert_eq!(authorization.signature_id, 3);
    }

    #[test]
    fn malformed_log_is_skipped() {
        let identity = Identity::hot_potato(1);
        let mut log = sign_hash_log(identity.contract_address(), 1, DIGEST, 77);
        log.data = Bytes::from(vec![0u8; 12]); // truncated data
        assert!(extract_authorization(&identity, DIGEST, &receipt(vec![log])).is_none());
    }

    #[test]
    fn authorize_call_shape() {
        let identity = Identity::hot_potato(1);
        let call = sign_hash_call(&identity, DIGEST);

        assert_eq!(call.to, identity.contract_address());
        assert_eq!(call.value, identity.signature_cost_wei());
        assert_eq!(call.gas_limit, 70_000);
        assert_eq!(call.chain_id, 42161);
        assert_eq!(call.data.len(), 4 + 32 + 32);
        assert_eq!(&call.data[..4], &keccak256(SIGN_HASH_FN.as_bytes())[..4]);
        assert_eq!(&call.data[4..36], U256::from(1u64).to_be_bytes::<32>());
        assert_eq!(&call.data[36..68], DIGEST.as_slice());
    }
}
