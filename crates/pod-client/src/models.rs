//! Pod client data types

use std::path::Path;

/// Builds the label selector used to find a workload's pods (`app=<workload>`)
pub fn workload_selector(workload: &str) -> String {
    format!("app={workload}")
}

/// One destination for a file copy: a container inside a resolved pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Pod name as returned by resolution
    pub pod: String,
    /// Workload the pod was resolved from
    pub workload: String,
    /// Container inside the pod
    pub container: String,
    /// Directory inside the container that receives the file
    pub destination_dir: String,
    /// Namespace, `None` for the orchestrator default
    pub namespace: Option<String>,
}

impl SyncTarget {
    /// Path inside the container for `local_path`.
    ///
    /// Only the base name of the local file is kept; its directories are
    /// dropped. Returns `None` when the path has no file name (e.g. `/` or
    /// `foo/..`) or the file name is not valid UTF-8.
    pub fn remote_path(&self, local_path: &Path) -> Option<String> {
        let file_name = local_path.file_name()?.to_str()?;
        let dir = self.destination_dir.trim_end_matches('/');
        Some(format!("{dir}/{file_name}"))
    }

    /// `<pod>:<remote path>` as understood by `kubectl cp`
    pub fn remote_spec(&self, local_path: &Path) -> Option<String> {
        self.remote_path(local_path)
            .map(|remote| format!("{}:{}", self.pod, remote))
    }
}
