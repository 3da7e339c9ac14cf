//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the pod clients,
//! the reconciler and the directory watcher together, and keeps the watch
//! loop running until it fails or the process is interrupted.

use crate::config::{ClusterConfig, ResolverKind, SyncConfig};
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::reporter::{FailureReporter, TracingReporter};
use crate::watcher::Watcher;
use pod_client::{EndpointResolver, FileTransfer, KubeApiResolver, KubectlClient};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for pod-sync.
///
/// Dropping the controller stops the watch loop.
pub struct Controller {
    watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    ///
    /// Copies always go through kubectl; pods are listed with kubectl or the
    /// Kubernetes API depending on `cluster.resolver`.
    pub async fn new(sync: SyncConfig, cluster: ClusterConfig) -> Result<Self, ControllerError> {
        info!("Initializing pod-sync controller");

        let kubectl = Arc::new(
            KubectlClient::new(cluster.kubectl).with_context(cluster.context.as_deref()),
        );
        let resolver: Arc<dyn EndpointResolver> = match cluster.resolver {
            ResolverKind::Kubectl => kubectl.clone(),
            ResolverKind::Api => {
                info!("Connecting to the Kubernetes API for pod listing");
                Arc::new(KubeApiResolver::connect(cluster.context.as_deref()).await?)
            }
        };

        Self::with_clients(sync, resolver, kubectl, Arc::new(TracingReporter))
    }

    /// Starts watching with the given clients and failure reporter.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_clients(
        sync: SyncConfig,
        resolver: Arc<dyn EndpointResolver>,
        transfer: Arc<dyn FileTransfer>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Result<Self, ControllerError> {
        let config = Arc::new(sync);
        let watcher = Watcher::start(&config.local_path, config.queue_capacity, reporter.clone())?;
        let reconciler = Arc::new(Reconciler::new(config, resolver, transfer, reporter));

        Ok(Self {
            watcher: tokio::spawn(watcher.run(reconciler)),
        })
    }

    /// Runs until the watch loop ends or Ctrl-C is received.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("pod-sync controller running");

        tokio::select! {
            result = &mut self.watcher => {
                result.map_err(|e| ControllerError::Watch(format!("watcher panicked: {}", e)))??;
                Err(ControllerError::Watch("notification stream closed".to_string()))
            }
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(ControllerError::Signal)?;
                info!("Interrupted, shutting down");
                Ok(())
            }
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
