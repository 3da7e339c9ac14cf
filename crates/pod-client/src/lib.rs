//! Pod Client
//!
//! Clients for the two cluster operations pod-sync depends on: listing the
//! pods behind a workload, and copying a local file into one pod's container.
//!
//! # Example
//!
//! ```no_run
//! use pod_client::{EndpointResolver, FileTransfer, KubectlClient, SyncTarget};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubectlClient::new("kubectl");
//!
//! // List the pods labelled app=api in the "dev" namespace
//! let pods = client.resolve("api", Some("dev")).await?;
//!
//! // Copy a file into the first one
//! if let Some(pod) = pods.first() {
//!     let target = SyncTarget {
//!         pod: pod.clone(),
//!         workload: "api".to_string(),
//!         container: "app".to_string(),
//!         destination_dir: "/srv/config".to_string(),
//!         namespace: Some("dev".to_string()),
//!     };
//!     client.copy_file(Path::new("./src/app.conf"), &target).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **kubectl backend**: resolution and transfer through the `kubectl` binary
//! - **API backend**: resolution through the Kubernetes API with `kube`
//! - **Mocking**: `MockPodClient` behind the `test-util` feature

pub mod api;
pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod pod_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use api::KubeApiResolver;
pub use client::{KubectlClient, parse_pod_names};
pub use error::{ClientSetupError, ResolutionError, TransferError};
pub use models::{SyncTarget, workload_selector};
pub use pod_trait::{EndpointResolver, FileTransfer};
#[cfg(feature = "test-util")]
pub use mock::{MockCall, MockPodClient};
