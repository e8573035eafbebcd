//! Extraction of signature components from a job's result commit.
//!
//! The signing function logs its output as two `Default`-level lines:
//!
//! ```text
//! Signature r: 36b57c21…
//! Signature s: 27fa0cfd…
//! ```
//!
//! This format is the service's output contract. Anything else -- a missing
//! line, an extra line, an unparsable value -- means the contract changed
//! incompatibly and is a fatal [`SignerError::MalformedJobOutput`].

use alloy_primitives::B256;
use frosty_client::{Commit, LogLevel};

use crate::SignerError;

/// Prefix of the r-component log line.
const R_PREFIX: &str = "Signature r: ";

/// Prefix of the s-component log line.
const S_PREFIX: &str = "Signature s: ";

/// Extracts the `(r, s)` scalars from a result commit's logs.
///
/// Keeps `Default`-level entries whose message starts with `"Signature"`,
/// requires exactly the r-line followed by the s-line, and parses the hex
/// value after each prefix.
///
/// # Errors
///
/// [`SignerError::MalformedJobOutput`] on any deviation from the contract.
pub fn signature_components(commit: &Commit) -> Result<(B256, B256), SignerError> {
    let lines: Vec<&str> = commit
        .logs
        .iter()
        .filter(|entry| entry.level == LogLevel::Default)
        .map(|entry| entry.message.as_str())
        .filter(|message| message.starts_with("Signature"))
        .collect();

    match lines.as_slice() {
        [r_line, s_line] => Ok((
            component(r_line, R_PREFIX)?,
            component(s_line, S_PREFIX)?,
        )),
        _ => Err(SignerError::MalformedJobOutput),
    }
}

/// Strips `prefix` and parses the remainder as a 32-byte hex scalar.
fn component(line: &str, prefix: &str) -> Result<B256, SignerError> {
    let value = line
        .strip_prefix(prefix)
        .ok_or(SignerError::MalformedJobOutput)?;
    value.parse().map_err(|_| SignerError::MalformedJobOutput)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
