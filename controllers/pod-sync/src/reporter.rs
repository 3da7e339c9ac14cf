//! Failure reporting.
//!
//! Recoverable failures are never returned to the watch loop. They are
//! handed to a `FailureReporter`, which by default turns them into log
//! records; tests substitute a reporter that records them.

use pod_client::{ResolutionError, TransferError};
use std::path::PathBuf;
use tracing::{error, warn};

/// A recoverable failure, with the context needed to report it.
#[derive(Debug)]
pub enum SyncFailure {
    /// The filesystem notification stream reported a fault; watching continues
    Subscription { message: String },
    /// The pods for a changed file could not be listed; the cycle was dropped
    Resolution { path: PathBuf, error: ResolutionError },
    /// One pod did not receive the file; other pods are unaffected
    Transfer { path: PathBuf, error: TransferError },
}

/// Sink for recoverable failures.
pub trait FailureReporter: Send + Sync {
    /// Record one failure
    fn record(&self, failure: SyncFailure);
}

/// Reports failures as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn record(&self, failure: SyncFailure) {
        match failure {
            SyncFailure::Subscription { message } => {
                warn!("File watch error (still watching): {}", message);
            }
            SyncFailure::Resolution { path, error } => {
                error!("Error getting pods for {}: {}", path.display(), error);
            }
            SyncFailure::Transfer { path, error } => {
                error!("Error copying {} to pod {}: {}", path.display(), error.pod(), error);
            }
        }
    }
}
