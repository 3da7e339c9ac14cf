//! Resolver and transfer traits for mocking
//!
//! These traits abstract the cluster so the fan-out logic can be unit tested.
//! `KubectlClient` implements both, `KubeApiResolver` implements resolution
//! only, and tests use `MockPodClient`.

use crate::error::{ResolutionError, TransferError};
use crate::models::SyncTarget;
use std::path::Path;

/// Lists the pods currently backing a workload
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait EndpointResolver: Send + Sync {
    /// Returns the names of the pods labelled `app=<workload>`.
    ///
    /// An empty list is a valid answer. Order is whatever the cluster returns.
    async fn resolve(&self, workload: &str, namespace: Option<&str>) -> Result<Vec<String>, ResolutionError>;
}

/// Copies one local file into one pod
#[async_trait::async_trait]
pub trait FileTransfer: Send + Sync {
    /// Makes a single attempt to copy `local_path` to the target's
    /// destination directory, keeping the file's base name.
    async fn copy_file(&self, local_path: &Path, target: &SyncTarget) -> Result<(), TransferError>;
}
