//! The signing flow: authorization in, Ethereum signature out.
//!
//! `fetch_signature` sequences the whole remote-signing protocol:
//!
//! 1. Look the job up by the authorization's signature id.
//! 2. If the service has never seen it, submit the authorization's block
//!    for indexing.
//! 3. Poll until the job reaches a terminal status.
//! 4. `Failed` jobs surface the service's reason verbatim.
//! 5. `Completed` jobs yield two commits; the second carries the `(r, s)`
//!    scalars, resolved into a full signature against the identity's
//!    derived address.
//!
//! Steps are strictly sequential within one invocation. There is no
//! cross-invocation deduplication: concurrent calls for the same signature
//! id may both submit or both poll, which is wasteful but safe -- the
//! service is idempotent by signature id.

use tracing::debug;

use config::Identity;
use frosty_client::{Chain, EvmChain, FrostyApi, Job, JobStatus};
use potato_crypto::PublicKeyDeriver;
use signer::{EthSignature, resolve_signature, signature_components};

use crate::authorization::Authorization;
use crate::chain::ChainReader;
use crate::{Sdk, SdkError};

/// A job that has reached a terminal status.
enum Terminal {
    Completed(Job),
    Failed(String),
}

impl Terminal {
    /// Classifies a snapshot; `None` for non-terminal statuses.
    fn classify(job: Job) -> Option<Self> {
        match job.status {
            JobStatus::Completed => Some(Self::Completed(job)),
            JobStatus::Failed(ref reason) => Some(Self::Failed(reason.clone())),
            JobStatus::Pending | JobStatus::Waiting | JobStatus::Executing => None,
        }
    }
}

impl<C, F, D> Sdk<C, F, D>
where
    C: ChainReader,
    F: FrostyApi,
    D: PublicKeyDeriver,
{
    /// Fetches the signature for an authorized digest from the signer
    /// service.
    ///
    /// No timeout is imposed here; cancellation is the SDK token's job and
    /// surfaces as [`SdkError::Cancelled`]. Calling again for an
    /// already-completed job returns the same signature without
    /// resubmitting.
    ///
    /// # Errors
    ///
    /// - [`SdkError::AuthorizationNotIndexed`] -- the service found no job
    ///   request for the authorization (e.g. not yet confirmed on its view
    ///   of the chain).
    /// - [`SdkError::SigningJobFailed`] -- the job terminated in `Failed`.
    /// - [`SdkError::MalformedJobOutput`] -- the job's commits or logs
    ///   violate the service's output contract.
    /// - [`SdkError::SignatureMismatch`] -- the resolved signature does not
    ///   recover to the identity's address.
    pub async fn fetch_signature(
        &self,
        identity: &Identity,
        authorization: &Authorization,
    ) -> Result<EthSignature, SdkError> {
        self.check_cancelled()?;
        let chain = service_chain(identity)?;
        let signature_id = authorization.signature_id;

        let job = self.frosty().get_job(chain, signature_id).await?;
        if job.is_none() {
            debug!(signature_id, "job unknown to the service, submitting");
            let request = self
                .frosty()
                .submit_job(chain, authorization.block_number, signature_id)
                .await?;
            if request.is_none() {
                return Err(SdkError::AuthorizationNotIndexed);
            }
        }

        let terminal = match job.and_then(Terminal::classify) {
            Some(terminal) => terminal,
            None => self.wait_terminal(chain, signature_id).await?,
        };

        let job = match terminal {
            Terminal::Failed(reason) => return Err(SdkError::SigningJobFailed(reason)),
            Terminal::Completed(job) => job,
        };

        // One diagnostic commit, one result commit.
        if job.commit_ids.len() != 2 {
            return Err(SdkError::MalformedJobOutput);
        }
        let commit = self.frosty().get_commit(job.commit_ids[1]).await?;
        let (r, s) = signature_components(&commit)?;

        let expected = self.address(identity)?;
        Ok(resolve_signature(
            expected,
            authorization.hash_to_sign,
            r,
            s,
        )?)
    }

    /// Consumes the job watcher until a terminal snapshot arrives.
    async fn wait_terminal(
        &self,
        chain: Chain,
        signature_id: u64,
    ) -> Result<Terminal, SdkError> {
        let mut watcher = self.frosty().watch(chain, signature_id);
        loop {
            let tick = tokio::select! {
                _ = self.cancel().cancelled() => return Err(SdkError::Cancelled),
                tick = watcher.next() => tick,
            };
            match tick {
                Some(Ok(Some(job))) => {
                    debug!(signature_id, status = ?job.status, "job snapshot");
                    if let Some(terminal) = Terminal::classify(job) {
                        return Ok(terminal);
                    }
                }
                // The service has no job for this id yet; keep polling.
                Some(Ok(None)) => {}
                Some(Err(e)) => return Err(e.into()),
                // The watcher only ends after a terminal snapshot, which
                // returns above.
                None => {
                    return Err(SdkError::ServiceUnavailable(
                        "job watch ended without a terminal snapshot".into(),
                    ));
                }
            }
        }
    }
}

/// Maps an identity's chain id to the signer service's chain tag.
fn service_chain(identity: &Identity) -> Result<Chain, SdkError> {
    EvmChain::from_chain_id(identity.chain_id())
        .map(Chain::Evm)
        .ok_or(SdkError::UnsupportedChain(identity.chain_id()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
