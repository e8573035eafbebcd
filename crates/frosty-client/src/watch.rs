//! Pull-based polling of a signing job until it terminates.

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior, interval};

use crate::types::{Chain, Job};
use crate::{FrostyApi, FrostyClient, FrostyError};

/// Interval between job polls.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A lazy sequence of job snapshots, one per poll interval.
///
/// Created by [`FrostyClient::watch`]. The consumer drives the sequence:
/// each [`next`](Self::next) call waits one interval and re-reads the job,
/// and no polling happens between calls. The timer lives inside the watcher,
/// so dropping it cancels polling outright -- an abandoned watch cannot
/// leak a background task.
///
/// Once a snapshot with a terminal status has been yielded the sequence
/// ends: every later `next` call returns `None`. The watcher is not
/// restartable.
pub struct JobWatcher<'a, T> {
    client: &'a FrostyClient<T>,
    chain: Chain,
    signature_id: u64,
    interval: Interval,
    finished: bool,
}

impl<'a, T: FrostyApi> JobWatcher<'a, T> {
    pub(crate) fn new(client: &'a FrostyClient<T>, chain: Chain, signature_id: u64) -> Self {
        let mut interval = interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            client,
            chain,
            signature_id,
            interval,
            finished: false,
        }
    }

    /// Waits for the next poll tick and yields the job snapshot.
    ///
    /// - `Some(Ok(Some(job)))` -- the service's current view of the job.
    /// - `Some(Ok(None))` -- the service has no job for this id yet.
    /// - `Some(Err(_))` -- the poll itself failed; the sequence continues
    ///   and the consumer decides whether to keep pulling.
    /// - `None` -- a terminal snapshot was already yielded; the sequence
    ///   has ended.
    pub async fn next(&mut self) -> Option<Result<Option<Job>, FrostyError>> {
        if self.finished {
            return None;
        }
        self.interval.tick().await;
        let result = self.client.get_job(self.chain, self.signature_id).await;
        if let Ok(Some(job)) = &result {
            if job.status.is_terminal() {
                self.finished = true;
            }
        }
        Some(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
