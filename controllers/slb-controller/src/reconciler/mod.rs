//! Reconciliation logic for LoadBalancer services.
//!
//! The reconciler is stateless: every call re-derives the SLB name from the service
//! identity and looks the instance up remotely, so nothing is cached between calls.
//! Calls for the same service must not run concurrently; the watcher guarantees this
//! (one in-flight reconcile per object), the reconciler does not lock.
//!
//! - `resolver`: name derivation and lookup
//! - `placement`: zone selection for new instances
//! - `create`: instance creation
//! - `listener`: listener planning and writes
//! - `teardown`: listener removal

pub mod create;
pub mod listener;
pub mod placement;
pub mod resolver;
pub mod teardown;


use crate::annotations::{ListenRecord, SlbOptions};
use crate::error::ControllerError;
use crate::poller::{PollConfig, TaskPoller};
use crate::service::{BackendCandidate, ServiceIdentity, ServiceSpec, SessionAffinity};
use slb_client::{Slb, SlbClientTrait};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// External addresses of a service's SLB
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadBalancerStatus {
    pub ingress: Vec<String>,
}

impl LoadBalancerStatus {
    fn from_slb(slb: &Slb) -> Self {
        Self {
            ingress: slb
                .vip_list
                .iter()
                .filter(|v| !v.vip.is_empty())
                .map(|v| v.vip.clone())
                .collect(),
        }
    }
}

/// Reconciles LoadBalancer services onto SLB instances.
pub struct Reconciler {
    pub(crate) slb_client: Box<dyn SlbClientTrait + Send + Sync>,
    pub(crate) poller: TaskPoller,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(slb_client: impl SlbClientTrait + Send + Sync + 'static, poll_config: PollConfig) -> Self {
        Self {
            slb_client: Box::new(slb_client),
            poller: TaskPoller::new(poll_config),
        }
    }

    /// Wait for a task returned by a mutating call
    pub(crate) async fn await_task(&self, task_id: &str, cancel: &CancellationToken) -> Result<(), ControllerError> {
        self.poller.wait(self.slb_client.as_ref(), task_id, cancel).await
    }

    /// Current status of the service's SLB and whether it exists
    pub async fn get_load_balancer(
        &self,
        service: &ServiceSpec,
        cancel: &CancellationToken,
    ) -> Result<(LoadBalancerStatus, bool), ControllerError> {
        Ok(match self.resolve(&service.identity, cancel).await? {
            Some(slb) => (LoadBalancerStatus::from_slb(&slb), true),
            None => (LoadBalancerStatus::default(), false),
        })
    }

    /// Name of the service's SLB as reported by the API, if it exists
    pub async fn get_load_balancer_name(
        &self,
        service: &ServiceSpec,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, ControllerError> {
        Ok(self
            .resolve(&service.identity, cancel)
            .await?
            .map(|slb| slb.slb_name))
    }

    /// Create the SLB if needed, then converge its listeners.
    pub async fn ensure_load_balancer(
        &self,
        service: &ServiceSpec,
        candidates: &[BackendCandidate],
        cancel: &CancellationToken,
    ) -> Result<LoadBalancerStatus, ControllerError> {
        if service.session_affinity != SessionAffinity::None {
            return Err(ControllerError::Unsupported(format!(
                "session affinity {:?} on {}; only None is supported",
                service.session_affinity, service.identity
            )));
        }
        ListenRecord::from_annotations(&service.annotations)?;

        let slb = match self.resolve(&service.identity, cancel).await? {
            Some(slb) => slb,
            None => {
                // Creation annotations only matter for a new instance
                let options = SlbOptions::from_annotations(&service.annotations)?;
                let slb_id = self.create_slb(service, &options, candidates, cancel).await?;
                info!("Created SLB {} for service {}", slb_id, service.identity);
                // Re-read to pick up the VIPs assigned during creation
                self.resolve(&service.identity, cancel)
                    .await?
                    .ok_or_else(|| ControllerError::SlbNotFound(service.identity.slb_name()))?
            }
        };

        self.sync_listeners(service, &slb, candidates, cancel).await?;
        Ok(LoadBalancerStatus::from_slb(&slb))
    }

    /// Converge the listeners of an existing SLB
    pub async fn update_load_balancer(
        &self,
        service: &ServiceSpec,
        candidates: &[BackendCandidate],
        cancel: &CancellationToken,
    ) -> Result<(), ControllerError> {
        ListenRecord::from_annotations(&service.annotations)?;
        let slb = self
            .resolve(&service.identity, cancel)
            .await?
            .ok_or_else(|| ControllerError::SlbNotFound(service.identity.slb_name()))?;
        self.sync_listeners(service, &slb, candidates, cancel).await
    }

    /// Remove the service's listeners; succeeds when there is no SLB.
    ///
    /// Takes only the identity so a service whose ports no longer convert can still
    /// be cleaned up.
    pub async fn ensure_load_balancer_deleted(
        &self,
        identity: &ServiceIdentity,
        cancel: &CancellationToken,
    ) -> Result<(), ControllerError> {
        self.teardown(identity, cancel).await
    }
}
