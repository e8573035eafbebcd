//! Potato SDK: remote signing for on-chain-registered identities.
//!
//! The SDK orchestrates the authorization-and-delivery protocol by
//! combining:
//! - **Chain reads** ([`ChainReader`]) for authorization lookup
//! - **The signer service** ([`frosty_client::FrostyApi`]) for job state
//! - **Key derivation** ([`potato_crypto::PublicKeyDeriver`]) for the
//!   identity's expected address
//!
//! # Flow
//!
//! The owner authorizes a digest on-chain ([`sign_hash_call`], submitted by
//! the owner's wallet), the SDK locates the authorization event
//! ([`Sdk::find_authorization`]) and drives the remote signing job to
//! completion ([`Sdk::fetch_signature`]). Wallet-connection peers sit on
//! top via the `connect` crate; the UI observes its request queues and
//! calls into this SDK per request.
//!
//! # Usage
//!
//! ```no_run
//! use alloy_primitives::b256;
//! use config::Identity;
//! use sdk::{JsonRpcChainReader, Sdk, TxRef};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(
//! #     frosty: impl frosty_client::FrostyApi,
//! #     deriver: impl potato_crypto::PublicKeyDeriver,
//! # ) -> Result<(), sdk::SdkError> {
//! let potato = Identity::hot_potato(1);
//! let cancel = CancellationToken::new();
//! let sdk = Sdk::new(
//!     JsonRpcChainReader::for_identity(&potato),
//!     frosty,
//!     deriver,
//!     cancel.clone(),
//! );
//!
//! let digest = b256!("a1de988600a42c4b4ab089b619297c17d53cffae5d5120d82d8a92d0bb3b78f2");
//! let tx = TxRef::Hash(b256!("7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a7a"));
//!
//! let authorization = sdk
//!     .find_authorization(&potato, digest, tx)
//!     .await?
//!     .ok_or(sdk::SdkError::NotFound)?;
//! let signature = sdk.fetch_signature(&potato, &authorization).await?;
//! println!("{signature}");
//!
//! // SDK is Clone -- share across tasks; cancel() aborts in-flight waits.
//! cancel.cancel();
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod chain;
pub mod error;
pub mod signing;

pub use authorization::{Authorization, AuthorizeCall, TxRef, sign_hash_call};
pub use chain::{ChainError, ChainReader, JsonRpcChainReader, LogRecord, Receipt};
pub use error::SdkError;

use std::sync::Arc;

use alloy_primitives::Address;
use tokio_util::sync::CancellationToken;

use config::Identity;
use frosty_client::{FrostyApi, FrostyClient};
use potato_crypto::{DerivationPath, PublicKeyDeriver, eth_address};

// ---------------------------------------------------------------------------
// Sdk
// ---------------------------------------------------------------------------

/// Shared state across all SDK operations.
struct SdkInner<C, F, D> {
    chain: C,
    frosty: FrostyClient<F>,
    deriver: D,
    cancel: CancellationToken,
}

/// The Potato SDK entry point.
///
/// `Clone`-able (wraps an `Arc`). All collaborators are trait-typed so
/// tests can script them:
///
/// # Type Parameters
///
/// - `C`: chain receipt reads ([`ChainReader`])
/// - `F`: signer service wire transport ([`frosty_client::FrostyApi`])
/// - `D`: public-key derivation ([`potato_crypto::PublicKeyDeriver`])
pub struct Sdk<C, F, D> {
    inner: Arc<SdkInner<C, F, D>>,
}

// Manual Clone: we don't require C, F, D to be Clone.
impl<C, F, D> Clone for Sdk<C, F, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, F, D> std::fmt::Debug for Sdk<C, F, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdk")
            .field("cancelled", &self.inner.cancel.is_cancelled())
            .finish()
    }
}

impl<C, F, D> Sdk<C, F, D>
where
    C: ChainReader,
    F: FrostyApi,
    D: PublicKeyDeriver,
{
    /// Creates a new SDK instance.
    ///
    /// No network I/O happens during construction.
    pub fn new(chain: C, frosty_api: F, deriver: D, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::new(SdkInner {
                chain,
                frosty: FrostyClient::new(frosty_api),
                deriver,
                cancel,
            }),
        }
    }

    /// Returns the chain reader.
    pub fn chain(&self) -> &C {
        &self.inner.chain
    }

    /// Returns the signer service client.
    pub fn frosty(&self) -> &FrostyClient<F> {
        &self.inner.frosty
    }

    /// Returns the cancellation token.
    pub fn cancel(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    /// Checks whether the SDK has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Returns [`SdkError::Cancelled`] if the cancellation token has fired.
    pub(crate) fn check_cancelled(&self) -> Result<(), SdkError> {
        if self.inner.cancel.is_cancelled() {
            Err(SdkError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// The identity's Ethereum address, derived from the signer service's
    /// published root key.
    ///
    /// # Errors
    ///
    /// Returns [`SdkError::KeyDerivationFailed`] if the deriver cannot
    /// produce a key for the identity's path.
    pub fn address(&self, identity: &Identity) -> Result<Address, SdkError> {
        let path = DerivationPath::for_identity(identity);
        let public_key = self
            .inner
            .deriver
            .derive_public_key(identity.signer_service_id(), &path)?;
        Ok(eth_address(&public_key))
    }
}
