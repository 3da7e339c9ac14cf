//! pod-sync
//!
//! Watches a local directory and copies every written or created file into
//! the matching container of each pod that belongs to a deployment:
//! - Pods are listed fresh for every change (`app=<deployment>`)
//! - Each file is copied to all pods concurrently, one `kubectl cp` per pod
//! - A failed listing or copy is logged and the watch carries on
//!
//! Runs until interrupted.

mod cli;
mod config;
mod controller;
mod error;
mod reconciler;
mod reporter;
mod watcher;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use cli::{Cli, LogFormat};
use controller::Controller;
use crate::error::ControllerError;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "pod-sync stopped");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ControllerError> {
    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting pod-sync");

    let sync = cli.sync_config()?;
    let cluster = cli.cluster_config();

    info!("Configuration:");
    info!("  Local path: {}", sync.local_path.display());
    info!("  Deployment: {}", sync.deployment);
    info!("  Container: {}", sync.container);
    info!("  Container path: {}", sync.container_path);
    info!("  Namespace: {}", sync.namespace.as_deref().unwrap_or("kubeconfig default"));
    info!("  Context: {}", cluster.context.as_deref().unwrap_or("current"));
    info!("  Resolver: {:?}", cluster.resolver);

    let controller = Controller::new(sync, cluster).await?;
    controller.run().await
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<(), ControllerError> {
    use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = match cli.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ControllerError::Logging(e.to_string()))
}
