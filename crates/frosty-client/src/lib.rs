//! Client for the Frosty signing-job service.
//!
//! The service runs signing functions as jobs: an on-chain authorization is
//! indexed into a [`JobRequest`], executed as a [`Job`], and its output is
//! recorded in append-only [`Commit`]s. This crate provides:
//!
//! - [`FrostyApi`] -- the wire boundary. Implementations speak the service's
//!   request/response protocol; swap in a scripted fake for tests.
//! - [`FrostyClient`] -- protocol logic on top of the wire: job lookup,
//!   authorization submission, terminal-state watching, commit retrieval.
//!
//! All reads are side-effect-free snapshots; the service is the source of
//! truth and is idempotent by signature id, so duplicate polling is wasteful
//! but never unsafe.

pub mod types;
pub mod watch;

pub use types::{
    CallerAddress, Chain, Commit, EvmChain, Job, JobRequest, JobStatus, LogEntry, LogLevel,
};
pub use watch::JobWatcher;

use std::fmt;

use tracing::debug;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from the Frosty service client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrostyError {
    /// A service call failed (transport error or service-side rejection).
    Service(String),

    /// The service failed to index the requested block.
    IndexingFailed(String),

    /// The service reports no commit with the given id.
    CommitNotFound(u64),
}

impl fmt::Display for FrostyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(reason) => write!(f, "signer service call failed: {reason}"),
            Self::IndexingFailed(reason) => write!(f, "block indexing failed: {reason}"),
            Self::CommitNotFound(id) => write!(f, "commit {id} not found"),
        }
    }
}

impl std::error::Error for FrostyError {}

// ---------------------------------------------------------------------------
// FrostyApi
// ---------------------------------------------------------------------------

/// The Frosty service wire boundary.
///
/// One method per service endpoint this SDK uses. Implementations map their
/// transport failures to [`FrostyError::Service`] and the service's
/// indexing rejection to [`FrostyError::IndexingFailed`].
pub trait FrostyApi: Send + Sync {
    /// Fetches a job by its on-chain signature id. `None` if the service
    /// has no such job.
    fn get_job(
        &self,
        chain: Chain,
        signature_id: u64,
    ) -> impl std::future::Future<Output = Result<Option<Job>, FrostyError>> + Send;

    /// Asks the service to index `block_number` on `chain`, returning every
    /// job request found in that block.
    fn index_block(
        &self,
        chain: Chain,
        block_number: u64,
    ) -> impl std::future::Future<Output = Result<Vec<JobRequest>, FrostyError>> + Send;

    /// Fetches a commit by id. `None` if the service has no such record.
    fn get_commit(
        &self,
        commit_id: u64,
    ) -> impl std::future::Future<Output = Result<Option<Commit>, FrostyError>> + Send;
}

// ---------------------------------------------------------------------------
// FrostyClient
// ---------------------------------------------------------------------------

/// Protocol logic over a [`FrostyApi`] transport.
#[derive(Debug, Clone)]
pub struct FrostyClient<T> {
    api: T,
}

impl<T: FrostyApi> FrostyClient<T> {
    /// Wraps a wire transport.
    pub fn new(api: T) -> Self {
        Self { api }
    }

    /// Returns the underlying transport.
    pub fn api(&self) -> &T {
        &self.api
    }

    /// Fetches the job for `signature_id`. Direct read-through -- no cache.
    pub async fn get_job(
        &self,
        chain: Chain,
        signature_id: u64,
    ) -> Result<Option<Job>, FrostyError> {
        self.api.get_job(chain, signature_id).await
    }

    /// Submits an authorization for signing by asking the service to index
    /// the block containing it.
    ///
    /// Returns the matching [`JobRequest`], or `None` if indexing succeeded
    /// but found no request with this `signature_id` -- typically an
    /// authorization the service's view of the chain has not confirmed yet.
    ///
    /// # Errors
    ///
    /// [`FrostyError::IndexingFailed`] if the service rejects the indexing
    /// call outright.
    pub async fn submit_job(
        &self,
        chain: Chain,
        block_number: u64,
        signature_id: u64,
    ) -> Result<Option<JobRequest>, FrostyError> {
        let requests = self.api.index_block(chain, block_number).await?;
        debug!(
            block_number,
            signature_id,
            found = requests.len(),
            "indexed block for job requests"
        );
        // The same block may hold requests for other callers; keep only ours.
        Ok(requests
            .into_iter()
            .find(|request| request.on_chain_id == Some(signature_id)))
    }

    /// Watches the job for `signature_id` until it reaches a terminal
    /// status.
    ///
    /// Polling is pull-based: each [`JobWatcher::next`] call waits one poll
    /// interval and re-reads the job. Dropping the watcher stops the timer;
    /// nothing keeps polling for abandoned jobs.
    pub fn watch(&self, chain: Chain, signature_id: u64) -> JobWatcher<'_, T> {
        JobWatcher::new(self, chain, signature_id)
    }

    /// Fetches a commit by id.
    ///
    /// # Errors
    ///
    /// [`FrostyError::CommitNotFound`] if the service has no such record.
    pub async fn get_commit(&self, commit_id: u64) -> Result<Commit, FrostyError> {
        self.api
            .get_commit(commit_id)
            .await?
            .ok_or(FrostyError::CommitNotFound(commit_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, Bytes};

    /// A scripted in-memory service.
    struct FakeApi {
        requests: Vec<JobRequest>,
        commit: Option<Commit>,
    }

    impl FrostyApi for FakeApi {
        async fn get_job(&self, _: Chain, _: u64) -> Result<Option<Job>, FrostyError> {
            Ok(None)
        }

        async fn index_block(&self, _: Chain, _: u64) -> Result<Vec<JobRequest>, FrostyError> {
            Ok(self.requests.clone())
        }

        async fn get_commit(&self, _: u64) -> Result<Option<Commit>, FrostyError> {
            Ok(self.commit.clone())
        }
    }

    fn request_with_id(on_chain_id: Option<u64>) -> JobRequest {
        JobRequest {
            chain: Chain::Evm(EvmChain::ArbitrumOne),
            caller: CallerAddress::Evm(Address::ZERO),
            data: Bytes::new(),
            function_hash: B256::ZERO,
            on_chain_id,
            block_number: Some(100),
            block_hash: None,
            transaction_hash: None,
            gas_payment: 0,
        }
    }

    const CHAIN: Chain = Chain::Evm(EvmChain::ArbitrumOne);

    #[tokio::test]
    async fn submit_job_finds_matching_request() {
        let client = FrostyClient::new(FakeApi {
            requests: vec![
                request_with_id(Some(3)),
                request_with_id(Some(7)),
                request_with_id(None),
            ],
            commit: None,
        });

        let found = client.submit_job(CHAIN, 100, 7).await.expect("indexing ok");
        assert_eq!(found.expect("request present").on_chain_id, Some(7));
    }

    #[tokio::test]
    async fn submit_job_none_when_absent() {
        let client = FrostyClient::new(FakeApi {
            requests: vec![request_with_id(Some(3))],
            commit: None,
        });

        let found = client.submit_job(CHAIN, 100, 7).await.expect("indexing ok");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn indexing_failure_is_fatal() {
        struct FailingApi;
        impl FrostyApi for FailingApi {
            async fn get_job(&self, _: Chain, _: u64) -> Result<Option<Job>, FrostyError> {
                Ok(None)
            }
            async fn index_block(&self, _: Chain, _: u64) -> Result<Vec<JobRequest>, FrostyError> {
                Err(FrostyError::IndexingFailed("rpc outcall failed".into()))
            }
            async fn get_commit(&self, _: u64) -> Result<Option<Commit>, FrostyError> {
                Ok(None)
            }
        }

        let client = FrostyClient::new(FailingApi);
        let err = client.submit_job(CHAIN, 100, 7).await.unwrap_err();
        assert_eq!(err, FrostyError::IndexingFailed("rpc outcall failed".into()));
    }

    #[tokio::test]
    async fn get_commit_maps_absence_to_not_found() {
        let client = FrostyClient::new(FakeApi {
            requests: vec![],
            commit: None,
        });
        assert_eq!(
            client.get_commit(12).await.unwrap_err(),
            FrostyError::CommitNotFound(12)
        );
    }

    #[tokio::test]
    async fn get_commit_returns_record() {
        let commit = Commit {
            title: "Execution".into(),
            logs: vec![],
            fees: 1,
            instructions: 2,
            timestamp: 3,
        };
        let client = FrostyClient::new(FakeApi {
            requests: vec![],
            commit: Some(commit.clone()),
        });
        assert_eq!(client.get_commit(12).await.expect("present"), commit);
    }
}
