//! Runtime configuration.
//!
//! `SyncConfig` describes what gets synced where; it is built once at startup,
//! validated, and shared read-only (`Arc`) with the watcher and reconciler.
//! `ClusterConfig` describes how the cluster is reached.

use crate::error::ControllerError;
use pod_client::SyncTarget;
use std::path::PathBuf;

/// Default cap on concurrent copies within one sync cycle
pub const DEFAULT_MAX_CONCURRENT_TRANSFERS: usize = 4;

/// Default capacity of the filesystem event queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// What to sync, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Local directory to watch (non-recursive)
    pub local_path: PathBuf,
    /// Workload whose pods receive the files (`app=<deployment>`)
    pub deployment: String,
    /// Container inside each pod
    pub container: String,
    /// Destination directory inside the container
    pub container_path: String,
    /// Namespace, `None` for the kubeconfig default
    pub namespace: Option<String>,
    /// Maximum concurrent copies per sync cycle
    pub max_concurrent_transfers: usize,
    /// Bound of the filesystem event queue
    pub queue_capacity: usize,
}

impl SyncConfig {
    /// Create a configuration with default tuning.
    ///
    /// An empty namespace is treated as "not set".
    pub fn new(
        local_path: impl Into<PathBuf>,
        deployment: impl Into<String>,
        container: impl Into<String>,
        container_path: impl Into<String>,
        namespace: Option<String>,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            deployment: deployment.into(),
            container: container.into(),
            container_path: container_path.into(),
            namespace: namespace.filter(|ns| !ns.is_empty()),
            max_concurrent_transfers: DEFAULT_MAX_CONCURRENT_TRANSFERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Checks the mandatory fields and tuning values.
    ///
    /// Whether `local_path` exists is checked when the watch starts.
    pub fn validate(self) -> Result<Self, ControllerError> {
        let required = [
            ("local-path", self.local_path.as_os_str().is_empty()),
            ("deployment", self.deployment.is_empty()),
            ("container", self.container.is_empty()),
            ("container-path", self.container_path.is_empty()),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, empty)| *empty)
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ControllerError::Configuration(format!(
                "required values are empty: {}",
                missing.join(", ")
            )));
        }

        if self.max_concurrent_transfers == 0 {
            return Err(ControllerError::Configuration(
                "max-concurrent-transfers must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ControllerError::Configuration(
                "queue-capacity must be at least 1".to_string(),
            ));
        }

        Ok(self)
    }

    /// The copy target for one resolved pod
    pub fn target_for(&self, pod: &str) -> SyncTarget {
        SyncTarget {
            pod: pod.to_string(),
            workload: self.deployment.clone(),
            container: self.container.clone(),
            destination_dir: self.container_path.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// Which backend lists a deployment's pods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ResolverKind {
    /// `kubectl get pods`
    #[default]
    Kubectl,
    /// The Kubernetes API, via the local kubeconfig
    Api,
}

/// How the cluster is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// kubectl binary
    pub kubectl: String,
    /// kubeconfig context, `None` for the current one
    pub context: Option<String>,
    /// Pod resolution backend
    pub resolver: ResolverKind,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kubectl: "kubectl".to_string(),
            context: None,
            resolver: ResolverKind::Kubectl,
        }
    }
}
