//! CLI argument definitions using clap.

use crate::config::{
    ClusterConfig, DEFAULT_MAX_CONCURRENT_TRANSFERS, DEFAULT_QUEUE_CAPACITY, ResolverKind, SyncConfig,
};
use crate::error::ControllerError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// pod-sync - copy local file changes into every pod of a deployment
#[derive(Parser, Debug)]
#[command(
    name = "pod-sync",
    author,
    version,
    about = "Sync changed files from a local directory into a deployment's pods",
    long_about = "Watches a local directory and, whenever a file in it is written or created,\n\
                  copies that file into the given container of every pod labelled\n\
                  app=<deployment>, using kubectl."
)]
pub struct Cli {
    /// Local directory to watch for file changes
    #[arg(long, env = "POD_SYNC_LOCAL_PATH")]
    pub local_path: PathBuf,

    /// Deployment whose pods receive the files (pods labelled app=<deployment>)
    #[arg(long, env = "POD_SYNC_DEPLOYMENT")]
    pub deployment: String,

    /// Container in each pod to copy files into
    #[arg(long, env = "POD_SYNC_CONTAINER")]
    pub container: String,

    /// Directory inside the container to copy files to
    #[arg(long, env = "POD_SYNC_CONTAINER_PATH")]
    pub container_path: String,

    /// Kubernetes namespace (defaults to the kubeconfig namespace)
    #[arg(short, long, env = "POD_SYNC_NAMESPACE")]
    pub namespace: Option<String>,

    /// kubeconfig context to use
    #[arg(long, env = "POD_SYNC_CONTEXT")]
    pub context: Option<String>,

    /// kubectl binary
    #[arg(long, default_value = "kubectl", env = "KUBECTL")]
    pub kubectl: String,

    /// How to list the deployment's pods
    #[arg(long, value_enum, default_value = "kubectl", env = "POD_SYNC_RESOLVER")]
    pub resolver: ResolverKind,

    /// Maximum concurrent copies per changed file
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_TRANSFERS, env = "POD_SYNC_MAX_CONCURRENT_TRANSFERS")]
    pub max_concurrent_transfers: usize,

    /// Capacity of the file change queue
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, env = "POD_SYNC_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact", env = "POD_SYNC_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// Single-line output
    Compact,
    /// JSON lines
    Json,
}

impl Cli {
    /// Builds the validated sync configuration
    pub fn sync_config(&self) -> Result<SyncConfig, ControllerError> {
        let mut config = SyncConfig::new(
            self.local_path.clone(),
            self.deployment.clone(),
            self.container.clone(),
            self.container_path.clone(),
            self.namespace.clone(),
        );
        config.max_concurrent_transfers = self.max_concurrent_transfers;
        config.queue_capacity = self.queue_capacity;
        config.validate()
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            kubectl: self.kubectl.clone(),
            context: self.context.clone().filter(|c| !c.is_empty()),
            resolver: self.resolver,
        }
    }
}
