//! Fan-out sync logic.
//!
//! One sync cycle per `ChangeEvent`: list the deployment's pods once, then
//! copy the file into every one of them. Copies run concurrently up to the
//! configured cap and each one succeeds or fails on its own. Failures go to
//! the `FailureReporter`; nothing is returned to the watch loop as an error
//! and nothing is retried.

use crate::config::SyncConfig;
use crate::reporter::{FailureReporter, SyncFailure};
use crate::watcher::ChangeEvent;
use futures::StreamExt;
use futures::stream;
use pod_client::{EndpointResolver, FileTransfer};
use std::sync::Arc;
use tracing::{info, instrument};

/// Summary of one sync cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Pods could not be listed; nothing was copied
    ResolutionFailed,
    /// The deployment has no pods right now
    NoTargets,
    /// Every resolved pod got one copy attempt
    Dispatched {
        succeeded: Vec<String>,
        failed: Vec<String>,
    },
}

/// Syncs changed files into a deployment's pods.
pub struct Reconciler {
    config: Arc<SyncConfig>,
    resolver: Arc<dyn EndpointResolver>,
    transfer: Arc<dyn FileTransfer>,
    reporter: Arc<dyn FailureReporter>,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        config: Arc<SyncConfig>,
        resolver: Arc<dyn EndpointResolver>,
        transfer: Arc<dyn FileTransfer>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        Self {
            config,
            resolver,
            transfer,
            reporter,
        }
    }

    /// Runs one sync cycle for `event`.
    #[instrument(skip_all, fields(file = %event.path.display()))]
    pub async fn sync(&self, event: &ChangeEvent) -> SyncOutcome {
        let deployment = &self.config.deployment;

        // Resolved fresh for every event; never reuse an earlier pod list
        let pods = match self
            .resolver
            .resolve(deployment, self.config.namespace.as_deref())
            .await
        {
            Ok(pods) => pods,
            Err(error) => {
                self.reporter.record(SyncFailure::Resolution {
                    path: event.path.clone(),
                    error,
                });
                return SyncOutcome::ResolutionFailed;
            }
        };

        if pods.is_empty() {
            info!("No pods found for deployment {}, nothing to sync", deployment);
            return SyncOutcome::NoTargets;
        }

        let config = &self.config;
        let transfer = &self.transfer;
        let path = &event.path;
        let results: Vec<_> = stream::iter(pods)
            .map(move |pod| {
                let target = config.target_for(&pod);
                async move {
                    let result = transfer.copy_file(path, &target).await;
                    (target, result)
                }
            })
            .buffer_unordered(self.config.max_concurrent_transfers.max(1))
            .collect()
            .await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (target, result) in results {
            match result {
                Ok(()) => {
                    info!(
                        "Copied {} to {}:{}",
                        event.path.display(),
                        target.pod,
                        target.destination_dir
                    );
                    succeeded.push(target.pod);
                }
                Err(error) => {
                    self.reporter.record(SyncFailure::Transfer {
                        path: event.path.clone(),
                        error,
                    });
                    failed.push(target.pod);
                }
            }
        }

        SyncOutcome::Dispatched { succeeded, failed }
    }
}
