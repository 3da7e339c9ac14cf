//! kubectl-backed pod client
//!
//! Resolves pods with `kubectl get pods -l app=<workload>` and copies files
//! with `kubectl cp`. Each call spawns one kubectl process and waits for it;
//! nothing is retried.

use crate::error::{ResolutionError, TransferError};
use crate::models::{SyncTarget, workload_selector};
use crate::pod_trait::{EndpointResolver, FileTransfer};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// jsonpath that prints the pod names of a list, space separated
const POD_NAMES_JSONPATH: &str = "jsonpath={.items[*].metadata.name}";

/// Splits kubectl's pod name output on whitespace
pub fn parse_pod_names(output: &str) -> Vec<String> {
    output.split_whitespace().map(str::to_string).collect()
}

/// Pod client that shells out to kubectl
#[derive(Debug, Clone)]
pub struct KubectlClient {
    program: String,
    global_args: Vec<String>,
}

impl Default for KubectlClient {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl KubectlClient {
    /// Create a new kubectl client
    ///
    /// # Arguments
    /// * `program` - kubectl binary name or path (e.g., "kubectl")
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            global_args: Vec::new(),
        }
    }

    /// Pin every invocation to a kubeconfig context
    #[must_use]
    pub fn with_context(mut self, context: Option<&str>) -> Self {
        if let Some(context) = context {
            self.global_args.push("--context".to_string());
            self.global_args.push(context.to_string());
        }
        self
    }

    /// Add arguments placed before the kubectl subcommand
    #[must_use]
    pub fn with_global_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Get the kubectl program
    pub fn program(&self) -> &str {
        &self.program
    }

    pub(crate) fn resolve_args(&self, workload: &str, namespace: Option<&str>) -> Vec<String> {
        let mut args = self.global_args.clone();
        args.extend([
            "get".to_string(),
            "pods".to_string(),
            "-l".to_string(),
            workload_selector(workload),
            "-o".to_string(),
            POD_NAMES_JSONPATH.to_string(),
        ]);
        if let Some(ns) = namespace {
            args.push("-n".to_string());
            args.push(ns.to_string());
        }
        args
    }

    pub(crate) fn copy_args(&self, local_path: &Path, remote_spec: &str, target: &SyncTarget) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.global_args.iter().map(OsString::from).collect();
        args.push("cp".into());
        args.push(local_path.as_os_str().to_os_string());
        args.push(remote_spec.into());
        args.push("-c".into());
        args.push(target.container.as_str().into());
        if let Some(ns) = &target.namespace {
            args.push("-n".into());
            args.push(ns.as_str().into());
        }
        args
    }
}

fn stderr_text(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).trim().to_string()
}

#[async_trait::async_trait]
impl EndpointResolver for KubectlClient {
    async fn resolve(&self, workload: &str, namespace: Option<&str>) -> Result<Vec<String>, ResolutionError> {
        let args = self.resolve_args(workload, namespace);
        debug!("Querying pods: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ResolutionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ResolutionError::CommandFailed {
                workload: workload.to_string(),
                status: output.status.to_string(),
                stderr: stderr_text(&output.stderr),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|source| ResolutionError::InvalidOutput {
            workload: workload.to_string(),
            source,
        })?;

        let pods = parse_pod_names(&stdout);
        debug!("Workload {} resolved to {} pod(s)", workload, pods.len());
        Ok(pods)
    }
}

#[async_trait::async_trait]
impl FileTransfer for KubectlClient {
    async fn copy_file(&self, local_path: &Path, target: &SyncTarget) -> Result<(), TransferError> {
        let remote_spec = target.remote_spec(local_path).ok_or_else(|| TransferError::InvalidPath {
            pod: target.pod.clone(),
            path: local_path.to_path_buf(),
        })?;
        let args = self.copy_args(local_path, &remote_spec, target);
        debug!("Copying {} to {} (container {})", local_path.display(), remote_spec, target.container);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| TransferError::Spawn {
                pod: target.pod.clone(),
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TransferError::CommandFailed {
                pod: target.pod.clone(),
                status: output.status.to_string(),
                stderr: stderr_text(&output.stderr),
            });
        }

        Ok(())
    }
}
