//! SLB Service Controller
//!
//! Converges Kubernetes `LoadBalancer` Services onto CDS VPC SLB instances:
//! - finds or creates one SLB per service, named after the service identity
//! - writes one listener per declared port, backed by every node's internal IP
//! - clears the listeners when the service goes away
//!
//! Every mutating SLB call returns a task, which is polled to completion before the
//! next step runs.

mod annotations;
mod backoff;
mod config;
mod controller;
mod error;
mod poller;
mod reconciler;
mod service;
mod watcher;
#[cfg(test)]
mod test_utils;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting SLB Service Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  SLB API URL: {}", config.api_url);
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!(
        "  Task polling: {} attempts, {:?}..{:?} between attempts",
        config.poll.max_attempts, config.poll.min_interval, config.poll.max_interval
    );

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
