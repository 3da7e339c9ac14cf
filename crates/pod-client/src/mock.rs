//! Mock pod client for unit testing
//!
//! This module provides an in-memory implementation of both `EndpointResolver`
//! and `FileTransfer` that records every call, so fan-out logic can be tested
//! without a cluster or a kubectl binary.

use crate::error::{ResolutionError, TransferError};
use crate::models::SyncTarget;
use crate::pod_trait::{EndpointResolver, FileTransfer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One recorded call against the mock, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `resolve(workload, namespace)`
    Resolve {
        workload: String,
        namespace: Option<String>,
    },
    /// `copy_file(local_path, target)`
    Copy { local_path: PathBuf, target: SyncTarget },
}

/// Mock pod client for testing
///
/// Configure the pods to return, a resolution failure, or per-pod transfer
/// failures, then inspect `calls()` afterwards.
#[derive(Clone, Default)]
pub struct MockPodClient {
    pods: Arc<Mutex<Vec<String>>>,
    resolution_failure: Arc<Mutex<Option<String>>>,
    failing_pods: Arc<Mutex<HashMap<String, String>>>,
    copy_delay: Arc<Mutex<Option<Duration>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockPodClient {
    /// Create a new mock client that resolves to no pods
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock client that resolves to `pods`
    pub fn with_pods<I, S>(pods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        mock.set_pods(pods);
        mock
    }

    /// Replace the pods returned by subsequent resolutions
    pub fn set_pods<I, S>(&self, pods: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *lock(&self.pods) = pods.into_iter().map(Into::into).collect();
    }

    /// Make subsequent resolutions fail with `message` as the stderr text
    pub fn fail_resolution(&self, message: impl Into<String>) {
        *lock(&self.resolution_failure) = Some(message.into());
    }

    /// Let resolutions succeed again
    pub fn clear_resolution_failure(&self) {
        *lock(&self.resolution_failure) = None;
    }

    /// Make copies to `pod` fail with `message` as the stderr text
    pub fn fail_copy_to(&self, pod: impl Into<String>, message: impl Into<String>) {
        lock(&self.failing_pods).insert(pod.into(), message.into());
    }

    /// Delay every copy by `delay` before it completes
    pub fn set_copy_delay(&self, delay: Duration) {
        *lock(&self.copy_delay) = Some(delay);
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    /// Recorded resolutions as `(workload, namespace)`
    pub fn resolve_calls(&self) -> Vec<(String, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Resolve { workload, namespace } => Some((workload, namespace)),
                MockCall::Copy { .. } => None,
            })
            .collect()
    }

    /// Recorded copies as `(local_path, target)`
    pub fn copy_calls(&self) -> Vec<(PathBuf, SyncTarget)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Copy { local_path, target } => Some((local_path, target)),
                MockCall::Resolve { .. } => None,
            })
            .collect()
    }

    /// Pods that received a copy attempt, in call order
    pub fn copied_pods(&self) -> Vec<String> {
        self.copy_calls().into_iter().map(|(_, target)| target.pod).collect()
    }
}

#[async_trait::async_trait]
impl EndpointResolver for MockPodClient {
    async fn resolve(&self, workload: &str, namespace: Option<&str>) -> Result<Vec<String>, ResolutionError> {
        lock(&self.calls).push(MockCall::Resolve {
            workload: workload.to_string(),
            namespace: namespace.map(str::to_string),
        });

        if let Some(message) = lock(&self.resolution_failure).clone() {
            return Err(ResolutionError::CommandFailed {
                workload: workload.to_string(),
                status: "exit status: 1".to_string(),
                stderr: message,
            });
        }

        Ok(lock(&self.pods).clone())
    }
}

#[async_trait::async_trait]
impl FileTransfer for MockPodClient {
    async fn copy_file(&self, local_path: &Path, target: &SyncTarget) -> Result<(), TransferError> {
        lock(&self.calls).push(MockCall::Copy {
            local_path: local_path.to_path_buf(),
            target: target.clone(),
        });

        let delay = *lock(&self.copy_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if target.remote_path(local_path).is_none() {
            return Err(TransferError::InvalidPath {
                pod: target.pod.clone(),
                path: local_path.to_path_buf(),
            });
        }

        let failure = lock(&self.failing_pods).get(&target.pod).cloned();
        match failure {
            Some(message) => Err(TransferError::CommandFailed {
                pod: target.pod.clone(),
                status: "exit status: 1".to_string(),
                stderr: message,
            }),
            None => Ok(()),
        }
    }
}
