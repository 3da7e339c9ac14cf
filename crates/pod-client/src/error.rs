//! Pod client errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while listing the pods behind a workload
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The query process could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The query ran but exited unsuccessfully
    #[error("pod query for workload '{workload}' failed ({status}): {stderr}")]
    CommandFailed {
        workload: String,
        status: String,
        stderr: String,
    },

    /// The query printed something that is not UTF-8
    #[error("pod query for workload '{workload}' returned invalid output: {source}")]
    InvalidOutput {
        workload: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),
}

/// Errors that can occur while copying a file into one pod
///
/// Every variant names the pod it concerns so that a caller fanning out to
/// many pods can report each failure on its own.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The transfer process could not be started
    #[error("copy to pod '{pod}' could not start {program}: {source}")]
    Spawn {
        pod: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The transfer ran but exited unsuccessfully
    #[error("copy to pod '{pod}' failed ({status}): {stderr}")]
    CommandFailed {
        pod: String,
        status: String,
        stderr: String,
    },

    /// The local path has no file name, or one that is not UTF-8
    #[error("copy to pod '{pod}' skipped: {} has no usable file name", path.display())]
    InvalidPath { pod: String, path: PathBuf },
}

impl TransferError {
    /// The pod this failure belongs to
    pub fn pod(&self) -> &str {
        match self {
            Self::Spawn { pod, .. } | Self::CommandFailed { pod, .. } | Self::InvalidPath { pod, .. } => pod,
        }
    }
}

/// Errors building a Kubernetes API client at startup
#[derive(Debug, Error)]
pub enum ClientSetupError {
    /// The requested kubeconfig context could not be loaded
    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// The client could not be created from the loaded configuration
    #[error("failed to create Kubernetes client: {0}")]
    Client(#[from] kube::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_names_pod() {
        let err = TransferError::CommandFailed {
            pod: "pod-a".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "container not found".to_string(),
        };
        assert_eq!(err.pod(), "pod-a");
        assert_eq!(
            err.to_string(),
            "copy to pod 'pod-a' failed (exit status: 1): container not found"
        );

        let err = TransferError::InvalidPath {
            pod: "pod-b".to_string(),
            path: PathBuf::from("/"),
        };
        assert_eq!(err.pod(), "pod-b");
        assert!(err.to_string().contains("has no usable file name"));
    }
}
