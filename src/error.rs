//! Domain error type for outcomes the coordinator matches on directly.
//! Probe- and I/O-level failures are carried as `anyhow::Error` with
//! `.context(...)`, matching the rest of the crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("dictionary hash mismatch: refresh requested, job aborted")]
    DictionaryRefreshRequested,

    #[error("no discovery job supplied")]
    NoJob,

    #[error("spool I/O failure: {0}")]
    Spool(#[source] anyhow::Error),
}
