//! Main controller implementation.
//!
//! This module contains the `Controller` struct that builds the Kubernetes and SLB
//! clients, starts the Service watcher and supervises it until shutdown.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use kube::Client;
use slb_client::SlbClient;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Main controller for SLB-backed LoadBalancer services.
#[derive(Debug)]
pub struct Controller {
    service_watcher: JoinHandle<Result<(), ControllerError>>,
    shutdown: CancellationToken,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing SLB Service Controller");

        // Create Kubernetes client
        let kube_client = Client::try_default().await?;

        // Create SLB client
        let slb_client = SlbClient::new(config.api_url.clone(), config.api_token.clone())
            .map_err(|e| {
                error!("Failed to build SLB client for {}: {}", config.api_url, e);
                ControllerError::Slb(e)
            })?;

        let reconciler = Arc::new(Reconciler::new(slb_client, config.poll));
        let shutdown = CancellationToken::new();

        let watcher = Watcher::new(
            reconciler,
            kube_client,
            config.namespace.as_deref(),
            shutdown.clone(),
        );
        let service_watcher = tokio::spawn(async move { watcher.watch_services().await });

        Ok(Self {
            service_watcher,
            shutdown,
        })
    }

    /// Runs the controller until the watcher exits or a shutdown signal arrives.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("SLB Service Controller running");

        tokio::select! {
            result = &mut self.service_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Service watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("Service watcher error: {}", e)))?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, cancelling in-flight reconciliations");
                self.shutdown.cancel();
                self.service_watcher
                    .await
                    .map_err(|e| ControllerError::Watch(format!("Service watcher panicked: {}", e)))??;
            }
        }

        Ok(())
    }
}
