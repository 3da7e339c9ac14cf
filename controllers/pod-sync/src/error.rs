//! Controller-specific error types.
//!
//! Only these errors end the process. Per-event failures (subscription
//! faults, resolution and transfer errors) never surface here; they are
//! handed to the `FailureReporter` instead.

use pod_client::ClientSetupError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can stop pod-sync.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The local directory could not be watched
    #[error("Cannot watch {}: {reason}", path.display())]
    WatchSetup { path: PathBuf, reason: String },

    /// The Kubernetes API resolver could not be built
    #[error("Resolver setup failed: {0}")]
    ResolverSetup(#[from] ClientSetupError),

    /// Failed to listen for the shutdown signal
    #[error("Signal handling failed: {0}")]
    Signal(#[source] std::io::Error),

    /// The log subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    /// The watch loop stopped
    #[error("Directory watch failed: {0}")]
    Watch(String),
}

impl ControllerError {
    pub(crate) fn watch_setup(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::WatchSetup {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
