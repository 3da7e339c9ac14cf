//! Test utilities for unit testing the watcher and reconciler
//!
//! This module provides a recording failure reporter and helpers for creating
//! test notifications.

use crate::reporter::{FailureReporter, SyncFailure};
use crate::watcher::{ChangeEvent, ChangeKind};
use notify::{Event, EventKind};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Failure reporter that keeps every failure for later assertions
#[derive(Default)]
pub struct RecordingReporter {
    failures: Mutex<Vec<SyncFailure>>,
}

impl FailureReporter for RecordingReporter {
    fn record(&self, failure: SyncFailure) {
        self.failures.lock().unwrap().push(failure);
    }
}

impl RecordingReporter {
    /// Debug renderings of every recorded failure, in order
    pub fn failures(&self) -> Vec<String> {
        self.failures
            .lock()
            .unwrap()
            .iter()
            .map(|failure| format!("{failure:?}"))
            .collect()
    }

    pub fn subscription_count(&self) -> usize {
        self.count(|f| matches!(f, SyncFailure::Subscription { .. }))
    }

    pub fn resolution_count(&self) -> usize {
        self.count(|f| matches!(f, SyncFailure::Resolution { .. }))
    }

    /// Pods named by recorded transfer failures, in order
    pub fn transfer_pods(&self) -> Vec<String> {
        self.failures
            .lock()
            .unwrap()
            .iter()
            .filter_map(|failure| match failure {
                SyncFailure::Transfer { error, .. } => Some(error.pod().to_string()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&SyncFailure) -> bool) -> usize {
        self.failures.lock().unwrap().iter().filter(|f| pred(f)).count()
    }
}

/// Helper to create a raw notification for one path
pub fn create_event(kind: EventKind, path: &str) -> Event {
    Event::new(kind).add_path(PathBuf::from(path))
}

/// Helper to create a qualifying write event
pub fn write_event(path: &str) -> ChangeEvent {
    ChangeEvent {
        path: PathBuf::from(path),
        kind: ChangeKind::Write,
    }
}

/// Polls `condition` until it holds, panicking after five seconds
pub async fn wait_until(condition: impl Fn() -> bool) {
    let poll = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), poll)
        .await
        .expect("condition not met within 5s");
}
