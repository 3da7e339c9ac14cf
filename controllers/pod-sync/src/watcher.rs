//! Local directory watcher.
//!
//! This module subscribes to filesystem notifications for one directory and
//! starts a sync cycle for every write or create it sees.
//!
//! The `notify` callback runs on notify's own thread and pushes raw
//! notifications into a bounded channel. The watch loop drains that channel,
//! filters it down to `ChangeEvent`s and spawns one task per event, so a slow
//! cycle never stops the channel from being drained.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::reporter::{FailureReporter, SyncFailure};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Raw notification as delivered by `notify`
pub type RawEvent = notify::Result<Event>;

/// Kind of change that triggers a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File contents were written
    Write,
    /// File was created (or renamed into the directory)
    Create,
}

impl ChangeKind {
    /// Maps a notification kind to a qualifying change, or `None` to ignore it.
    ///
    /// A rename *into* the directory counts as a create, which is how editors
    /// that save through a temporary file show up.
    pub fn classify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Create),
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => Some(Self::Write),
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(Self::Create),
            _ => None,
        }
    }
}

/// A qualifying change to one local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Path of the changed file
    pub path: PathBuf,
    /// What happened to it
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Splits a notification into one event per path; empty if it does not qualify.
    pub fn from_notify(event: Event) -> Vec<Self> {
        match ChangeKind::classify(&event.kind) {
            Some(kind) => event
                .paths
                .into_iter()
                .map(|path| Self { path, kind })
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Watches one local directory for changes.
pub struct Watcher {
    directory: PathBuf,
    // Dropping the notify watcher ends the subscription.
    _subscription: Option<RecommendedWatcher>,
    events: mpsc::Receiver<RawEvent>,
    pending: VecDeque<ChangeEvent>,
    reporter: Arc<dyn FailureReporter>,
}

impl Watcher {
    /// Subscribes to `directory` (non-recursively).
    ///
    /// Fails if the directory does not exist, is not a directory, or the OS
    /// refuses the subscription.
    pub fn start(
        directory: &Path,
        queue_capacity: usize,
        reporter: Arc<dyn FailureReporter>,
    ) -> Result<Self, ControllerError> {
        if !directory.is_dir() {
            return Err(ControllerError::watch_setup(directory, "not an existing directory"));
        }

        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let mut subscription = notify::recommended_watcher(move |res: RawEvent| {
            // Blocks notify's thread, not the runtime, when the queue is full.
            // Err only means the watch loop is gone.
            let _ = tx.blocking_send(res);
        })
        .map_err(|e| ControllerError::watch_setup(directory, e))?;

        subscription
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(|e| ControllerError::watch_setup(directory, e))?;

        let mut watcher = Self::from_receiver(directory, rx, reporter);
        watcher._subscription = Some(subscription);
        Ok(watcher)
    }

    /// Builds a watcher over an existing notification channel.
    pub(crate) fn from_receiver(
        directory: &Path,
        events: mpsc::Receiver<RawEvent>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        Self {
            directory: directory.to_path_buf(),
            _subscription: None,
            events,
            pending: VecDeque::new(),
            reporter,
        }
    }

    /// Next qualifying change, or `None` once the notification channel closes.
    ///
    /// Non-qualifying notifications are skipped; subscription errors and
    /// queue overflows are reported and skipped. Cancel safe.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }

            match self.events.recv().await? {
                Ok(raw) => {
                    debug!("Notification {:?} for {:?}", raw.kind, raw.paths);
                    // The OS queue overflowed; notify reports it as an event
                    if raw.need_rescan() {
                        self.reporter.record(SyncFailure::Subscription {
                            message: "notification queue overflowed; some changes were missed".to_string(),
                        });
                    }
                    self.pending.extend(ChangeEvent::from_notify(raw));
                }
                Err(e) => self.reporter.record(SyncFailure::Subscription {
                    message: e.to_string(),
                }),
            }
        }
    }

    /// Runs the watch loop until the notification channel closes.
    ///
    /// Each change gets its own sync cycle task; the loop only starts cycles
    /// and never waits for one. Cycles still running when the channel closes
    /// are awaited before returning.
    pub async fn run(mut self, reconciler: Arc<Reconciler>) -> Result<(), ControllerError> {
        info!("Monitoring {} for changes...", self.directory.display());

        let mut cycles = JoinSet::new();
        loop {
            tokio::select! {
                event = self.next_event() => {
                    let Some(event) = event else { break };
                    info!("File changed: {} ({:?})", event.path.display(), event.kind);
                    let reconciler = Arc::clone(&reconciler);
                    cycles.spawn(async move {
                        reconciler.sync(&event).await;
                    });
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    if let Err(e) = joined {
                        error!("Sync cycle aborted: {}", e);
                    }
                }
            }
        }

        while let Some(joined) = cycles.join_next().await {
            if let Err(e) = joined {
                error!("Sync cycle aborted: {}", e);
            }
        }

        info!("Stopped monitoring {}", self.directory.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::test_utils::{RecordingReporter, create_event, wait_until};
    use notify::event::{AccessKind, AccessMode, CreateKind, DataChange, Flag, MetadataKind, RemoveKind};
    use pod_client::MockPodClient;
    use std::time::Duration;

    fn reconciler(dir: &Path, mock: &MockPodClient, reporter: &Arc<RecordingReporter>) -> Arc<Reconciler> {
        let config = SyncConfig::new(dir, "api", "app", "/dest", None);
        Arc::new(Reconciler::new(
            Arc::new(config),
            Arc::new(mock.clone()),
            Arc::new(mock.clone()),
            reporter.clone(),
        ))
    }

    #[test]
    fn test_classify_qualifying_kinds() {
        assert_eq!(
            ChangeKind::classify(&EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Create)
        );
        assert_eq!(
            ChangeKind::classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(ChangeKind::Write)
        );
        assert_eq!(
            ChangeKind::classify(&EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Write)
        );
        assert_eq!(
            ChangeKind::classify(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(ChangeKind::Create)
        );
    }

    #[test]
    fn test_classify_ignored_kinds() {
        let ignored = [
            EventKind::Remove(RemoveKind::File),
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            EventKind::Any,
            EventKind::Other,
        ];
        for kind in ignored {
            assert_eq!(ChangeKind::classify(&kind), None, "{kind:?} should be ignored");
        }
    }

    #[test]
    fn test_one_event_per_path() {
        let raw = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/src/a.conf"))
            .add_path(PathBuf::from("/src/b.conf"));
        let events = ChangeEvent::from_notify(raw);
        assert_eq!(
            events,
            vec![
                ChangeEvent { path: PathBuf::from("/src/a.conf"), kind: ChangeKind::Create },
                ChangeEvent { path: PathBuf::from("/src/b.conf"), kind: ChangeKind::Create },
            ]
        );
    }

    #[test]
    fn test_start_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let result = Watcher::start(&missing, 16, Arc::new(RecordingReporter::default()));
        assert!(matches!(result, Err(ControllerError::WatchSetup { .. })));
    }

    #[test]
    fn test_start_on_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = Watcher::start(file.path(), 16, Arc::new(RecordingReporter::default()));
        assert!(matches!(result, Err(ControllerError::WatchSetup { .. })));
    }

    #[tokio::test]
    async fn test_non_qualifying_events_never_sync() {
        let mock = MockPodClient::with_pods(["pod-a"]);
        let reporter = Arc::new(RecordingReporter::default());
        let (tx, rx) = mpsc::channel(16);
        let dir = Path::new("/src");

        tx.send(Ok(create_event(EventKind::Remove(RemoveKind::File), "/src/app.conf"))).await.unwrap();
        tx.send(Ok(create_event(
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            "/src/app.conf",
        )))
        .await
        .unwrap();
        drop(tx);

        let watcher = Watcher::from_receiver(dir, rx, reporter.clone());
        watcher.run(reconciler(dir, &mock, &reporter)).await.unwrap();

        assert!(mock.calls().is_empty());
        assert!(reporter.failures().is_empty());
    }

    #[tokio::test]
    async fn test_keeps_running_after_errors() {
        let mock = MockPodClient::with_pods(["pod-a", "pod-b"]);
        mock.fail_resolution("orchestrator unreachable");
        let reporter = Arc::new(RecordingReporter::default());
        let (tx, rx) = mpsc::channel(16);
        let dir = Path::new("/src");

        let watcher = Watcher::from_receiver(dir, rx, reporter.clone());
        let handle = tokio::spawn(watcher.run(reconciler(dir, &mock, &reporter)));

        // Subscription fault, then a change whose resolution fails
        tx.send(Err(notify::Error::generic("event queue overflow"))).await.unwrap();
        tx.send(Ok(create_event(EventKind::Create(CreateKind::File), "/src/app.conf"))).await.unwrap();
        wait_until(|| mock.resolve_calls().len() == 1).await;

        // A transfer failure on the next change
        mock.clear_resolution_failure();
        mock.fail_copy_to("pod-a", "container not found");
        tx.send(Ok(create_event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "/src/app.conf",
        )))
        .await
        .unwrap();
        wait_until(|| mock.copy_calls().len() == 2).await;

        // And the stream still delivers after all of that
        tx.send(Ok(create_event(EventKind::Create(CreateKind::File), "/src/other.conf"))).await.unwrap();
        drop(tx);
        handle.await.unwrap().unwrap();

        assert_eq!(mock.resolve_calls().len(), 3);
        assert_eq!(mock.copy_calls().len(), 4);
        assert_eq!(reporter.subscription_count(), 1);
        assert_eq!(reporter.resolution_count(), 1);
        assert_eq!(reporter.transfer_pods(), vec!["pod-a", "pod-a"]);
    }

    #[tokio::test]
    async fn test_queue_overflow_is_reported() {
        let mock = MockPodClient::with_pods(["pod-a"]);
        let reporter = Arc::new(RecordingReporter::default());
        let (tx, rx) = mpsc::channel(16);
        let dir = Path::new("/src");

        tx.send(Ok(Event::new(EventKind::Other).set_flag(Flag::Rescan))).await.unwrap();
        tx.send(Ok(create_event(EventKind::Create(CreateKind::File), "/src/app.conf"))).await.unwrap();
        drop(tx);

        let watcher = Watcher::from_receiver(dir, rx, reporter.clone());
        watcher.run(reconciler(dir, &mock, &reporter)).await.unwrap();

        assert_eq!(reporter.subscription_count(), 1);
        assert!(reporter.failures()[0].contains("overflowed"));
        // The overflow itself starts no cycle; later changes still do
        assert_eq!(mock.resolve_calls().len(), 1);
        assert_eq!(mock.copied_pods(), vec!["pod-a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_changes_are_not_coalesced() {
        let mock = MockPodClient::with_pods(["pod-a", "pod-b"]);
        mock.set_copy_delay(Duration::from_millis(500));
        let reporter = Arc::new(RecordingReporter::default());
        let (tx, rx) = mpsc::channel(16);
        let dir = Path::new("/src");

        let watcher = Watcher::from_receiver(dir, rx, reporter.clone());
        let handle = tokio::spawn(watcher.run(reconciler(dir, &mock, &reporter)));

        let write = || create_event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "/src/app.conf");
        let started = tokio::time::Instant::now();
        tx.send(Ok(write())).await.unwrap();
        tx.send(Ok(write())).await.unwrap();

        // The second cycle starts while the first one's copies are still sleeping
        wait_until(|| mock.resolve_calls().len() == 2).await;
        assert!(started.elapsed() < Duration::from_millis(500));

        drop(tx);
        handle.await.unwrap().unwrap();

        let mut pods = mock.copied_pods();
        pods.sort();
        assert_eq!(pods, vec!["pod-a", "pod-a", "pod-b", "pod-b"]);
    }

    #[tokio::test]
    async fn test_real_directory_write_is_synced() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockPodClient::with_pods(["pod-a"]);
        let reporter = Arc::new(RecordingReporter::default());

        let watcher = Watcher::start(dir.path(), 16, reporter.clone()).unwrap();
        let handle = tokio::spawn(watcher.run(reconciler(dir.path(), &mock, &reporter)));

        let file = dir.path().join("app.conf");
        std::fs::write(&file, b"key = value\n").unwrap();

        wait_until(|| !mock.copy_calls().is_empty()).await;
        let (local_path, target) = mock.copy_calls().remove(0);
        assert_eq!(local_path.file_name(), file.file_name());
        assert_eq!(target.remote_spec(&local_path).as_deref(), Some("pod-a:/dest/app.conf"));

        handle.abort();
    }
}
