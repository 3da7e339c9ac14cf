//! Kubernetes API pod resolver
//!
//! Lists pods through the API server instead of kubectl. File transfer
//! still goes through kubectl.

use crate::error::{ClientSetupError, ResolutionError};
use crate::models::workload_selector;
use crate::pod_trait::EndpointResolver;
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::config::KubeConfigOptions;
use kube::{Api, Client, Config};
use tracing::debug;

/// Pod resolver backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeApiResolver {
    client: Client,
}

impl std::fmt::Debug for KubeApiResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApiResolver")
            .field("default_namespace", &self.client.default_namespace())
            .finish()
    }
}

impl KubeApiResolver {
    /// Create a resolver from an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the local kubeconfig (or in-cluster config)
    ///
    /// With a `context`, that kubeconfig context is used; otherwise the
    /// configuration is inferred the same way kubectl does.
    pub async fn connect(context: Option<&str>) -> Result<Self, ClientSetupError> {
        // kube's rustls backend needs a process-wide crypto provider. Err
        // only means one is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = match context {
            Some(context) => {
                let options = KubeConfigOptions {
                    context: Some(context.to_string()),
                    ..Default::default()
                };
                let config = Config::from_kubeconfig(&options).await?;
                Client::try_from(config)?
            }
            None => Client::try_default().await?,
        };

        debug!("Kubernetes client ready (default namespace {})", client.default_namespace());
        Ok(Self::new(client))
    }
}

#[async_trait::async_trait]
impl EndpointResolver for KubeApiResolver {
    async fn resolve(&self, workload: &str, namespace: Option<&str>) -> Result<Vec<String>, ResolutionError> {
        let pods: Api<Pod> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::default_namespaced(self.client.clone()),
        };

        let selector = workload_selector(workload);
        debug!("Listing pods with selector {}", selector);
        let list = pods.list(&ListParams::default().labels(&selector)).await?;

        Ok(list.items.into_iter().filter_map(|pod| pod.metadata.name).collect())
    }
}
