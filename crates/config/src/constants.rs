//! Potato protocol constants.
//!
//! Parameters of the authorization flow that are fixed across deployments.

use std::time::Duration;

/// Interval between receipt polls while awaiting a pending transaction.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Gas limit for the `signHash` authorization call.
///
/// The contract call is a flat event emission plus payment bookkeeping, so
/// the limit is deployment-independent.
pub const AUTHORIZE_GAS_LIMIT: u64 = 70_000;
