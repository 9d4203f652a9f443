//! Kubernetes Service watcher.
//!
//! This module watches Services and drives the reconciler using
//! kube_runtime::Controller, which handles reconnection, per-object serialization
//! and requeueing.
//!
//! For every LoadBalancer service the watcher:
//! - adds a finalizer so deletion waits for listener teardown
//! - lists the cluster nodes as backend candidates
//! - runs `ensure_load_balancer` and publishes the VIPs in `status.loadBalancer`
//! - writes the listen record annotation back once the listeners are in place

use crate::annotations::{ListenRecord, ANNOTATION_LB_LISTEN};
use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use crate::reconciler::{LoadBalancerStatus, Reconciler};
use crate::service::{is_load_balancer, BackendCandidate, ServiceIdentity, ServiceSpec};
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Node, Service};
use kube::api::{ListParams, Patch, PatchParams};
use kube::{Api, Client};
use kube_runtime::{controller::{Action, Config as ControllerConfig}, watcher, Controller};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Finalizer guarding listener teardown
pub const FINALIZER: &str = "cds-slb-controller/cleanup";
/// Nodes carrying this label never receive load-balancer traffic
pub const LABEL_EXCLUDE_FROM_LB: &str = "node.kubernetes.io/exclude-from-external-load-balancers";

const FIELD_MANAGER: &str = "cds-slb-controller";
/// Periodic resync; also picks up node changes
const RESYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Shared state handed to every reconcile call
pub struct Context {
    reconciler: Arc<Reconciler>,
    client: Client,
    backoffs: RequeueBackoffs,
    shutdown: CancellationToken,
}

/// Error requeue backoff per `namespace/name`
#[derive(Debug, Default)]
struct RequeueBackoffs {
    inner: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl RequeueBackoffs {
    fn next(&self, key: &str) -> Duration {
        let mut backoffs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        backoffs
            .entry(key.to_string())
            .or_insert_with(FibonacciBackoff::for_requeue)
            .next_backoff()
    }

    /// Restart the sequence for `key` after a successful pass
    fn reset(&self, key: &str) {
        let mut backoffs = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(backoff) = backoffs.get_mut(key) {
            backoff.reset();
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

impl Context {
    fn next_backoff(&self, key: &str) -> Duration {
        self.backoffs.next(key)
    }

    fn reset_backoff(&self, key: &str) {
        self.backoffs.reset(key)
    }
}

/// Watches Services and reconciles LoadBalancer ones.
#[derive(Debug)]
pub struct Watcher {
    ctx: Arc<Context>,
    services: Api<Service>,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        reconciler: Arc<Reconciler>,
        client: Client,
        namespace: Option<&str>,
        shutdown: CancellationToken,
    ) -> Self {
        let services = match namespace {
            Some(ns) => Api::namespaced(client.clone(), ns),
            None => Api::all(client.clone()),
        };
        Self {
            ctx: Arc::new(Context {
                reconciler,
                client,
                backoffs: RequeueBackoffs::default(),
                shutdown,
            }),
            services,
        }
    }

    /// Run the Service controller until shutdown is requested
    pub async fn watch_services(&self) -> Result<(), ControllerError> {
        info!("Starting Service watcher");

        // Debounce batches bursts of events for the same object
        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(5))
            .concurrency(4);

        Controller::new(self.services.clone(), watcher::Config::default())
            .with_config(controller_config)
            .graceful_shutdown_on(self.ctx.shutdown.clone().cancelled_owned())
            .run(reconcile, error_policy, self.ctx.clone())
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => debug!("Reconciled Service {}", obj),
                    Err(e) => warn!("Service controller error: {}", e),
                }
            })
            .await;

        info!("Service watcher stopped");
        Ok(())
    }
}

fn service_key(service: &Service) -> String {
    format!(
        "{}/{}",
        service.metadata.namespace.as_deref().unwrap_or("default"),
        service.metadata.name.as_deref().unwrap_or_default()
    )
}

fn has_finalizer(service: &Service) -> bool {
    service
        .metadata
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|s| s == FINALIZER))
}

async fn reconcile(service: Arc<Service>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let identity = ServiceIdentity::from_service(&service)?;
    let api: Api<Service> = Api::namespaced(ctx.client.clone(), &identity.namespace);

    // Deleted, or no longer a LoadBalancer: clear listeners once, then let go
    if service.metadata.deletion_timestamp.is_some() || !is_load_balancer(&service) {
        if has_finalizer(&service) {
            info!("Cleaning up SLB listeners for Service {}", identity);
            ctx.reconciler
                .ensure_load_balancer_deleted(&identity, &ctx.shutdown)
                .await?;
            remove_finalizer(&api, &service, &identity).await?;
        }
        ctx.reset_backoff(&service_key(&service));
        return Ok(Action::await_change());
    }

    if !has_finalizer(&service) {
        add_finalizer(&api, &service, &identity).await?;
    }

    let spec = ServiceSpec::from_service(&service)?;
    let candidates = list_candidates(&ctx.client).await?;
    debug!("Service {} has {} backend candidates", identity, candidates.len());

    let status = ctx
        .reconciler
        .ensure_load_balancer(&spec, &candidates, &ctx.shutdown)
        .await?;

    publish_status(&api, &service, &identity, &status).await?;
    write_listen_record(&api, &service, &spec).await?;

    ctx.reset_backoff(&service_key(&service));
    Ok(Action::requeue(RESYNC_INTERVAL))
}

fn error_policy(service: Arc<Service>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    let key = service_key(&service);
    let delay = ctx.next_backoff(&key);
    error!(
        "Reconciliation failed for Service {} ({:?}): {}; retrying in {:?}",
        key,
        error.kind(),
        error,
        delay
    );
    Action::requeue(delay)
}

async fn list_candidates(client: &Client) -> Result<Vec<BackendCandidate>, ControllerError> {
    let nodes: Api<Node> = Api::all(client.clone());
    let list = nodes.list(&ListParams::default()).await?;
    Ok(list
        .items
        .iter()
        .map(BackendCandidate::from_node)
        .filter(|c| c.label(LABEL_EXCLUDE_FROM_LB).is_none())
        .collect())
}

async fn add_finalizer(api: &Api<Service>, service: &Service, identity: &ServiceIdentity) -> Result<(), ControllerError> {
    let mut finalizers = service.metadata.finalizers.clone().unwrap_or_default();
    finalizers.push(FINALIZER.to_string());
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&identity.name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    debug!("Added finalizer to Service {}", identity);
    Ok(())
}

async fn remove_finalizer(api: &Api<Service>, service: &Service, identity: &ServiceIdentity) -> Result<(), ControllerError> {
    let finalizers: Vec<String> = service
        .metadata
        .finalizers
        .as_ref()
        .map(|f| f.iter().filter(|s| *s != FINALIZER).cloned().collect())
        .unwrap_or_default();
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&identity.name, &PatchParams::default(), &Patch::Merge(&patch)).await?;
    debug!("Removed finalizer from Service {}", identity);
    Ok(())
}

/// Ingress IPs currently published on the service
fn published_ingress(service: &Service) -> Vec<String> {
    service
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .map(|ingress| ingress.iter().filter_map(|i| i.ip.clone()).collect())
        .unwrap_or_default()
}

async fn publish_status(
    api: &Api<Service>,
    service: &Service,
    identity: &ServiceIdentity,
    status: &LoadBalancerStatus,
) -> Result<(), ControllerError> {
    if published_ingress(service) == status.ingress {
        return Ok(());
    }
    let ingress: Vec<_> = status.ingress.iter().map(|ip| json!({ "ip": ip })).collect();
    let patch = json!({ "status": { "loadBalancer": { "ingress": ingress } } });
    api.patch_status(&identity.name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;
    info!("Published ingress {:?} for Service {}", status.ingress, identity);
    Ok(())
}

async fn write_listen_record(api: &Api<Service>, service: &Service, spec: &ServiceSpec) -> Result<(), ControllerError> {
    let record = ListenRecord::from_ports(&spec.ports).to_annotation();
    let current = service
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(ANNOTATION_LB_LISTEN));
    if current == Some(&record) {
        return Ok(());
    }
    let patch = json!({ "metadata": { "annotations": { ANNOTATION_LB_LISTEN: record } } });
    api.patch(&spec.identity.name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    debug!("Updated listen record of Service {}", spec.identity);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{LoadBalancerIngress, LoadBalancerStatus as K8sLoadBalancerStatus, ServiceStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn service(finalizers: Option<Vec<&str>>) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some("svc1".to_string()),
                namespace: Some("ns1".to_string()),
                finalizers: finalizers.map(|f| f.into_iter().map(String::from).collect()),
                ..Default::default()
            },
            spec: None,
            status: None,
        }
    }

    #[test]
    fn test_has_finalizer() {
        assert!(!has_finalizer(&service(None)));
        assert!(!has_finalizer(&service(Some(vec!["other/finalizer"]))));
        assert!(has_finalizer(&service(Some(vec!["other/finalizer", FINALIZER]))));
    }

    #[test]
    fn test_requeue_backoff_restarts_after_reset() {
        let backoffs = RequeueBackoffs::default();
        assert_eq!(backoffs.next("ns1/svc1"), Duration::from_secs(60));
        assert_eq!(backoffs.next("ns1/svc1"), Duration::from_secs(60));
        assert_eq!(backoffs.next("ns1/svc1"), Duration::from_secs(120));
        assert_eq!(backoffs.next("ns1/svc2"), Duration::from_secs(60));

        backoffs.reset("ns1/svc1");
        assert_eq!(backoffs.next("ns1/svc1"), Duration::from_secs(60));
        // Other services keep their position
        assert_eq!(backoffs.next("ns1/svc2"), Duration::from_secs(60));
        assert_eq!(backoffs.next("ns1/svc2"), Duration::from_secs(120));
    }

    #[test]
    fn test_service_key() {
        assert_eq!(service_key(&service(None)), "ns1/svc1");
    }

    #[test]
    fn test_published_ingress() {
        let mut svc = service(None);
        assert!(published_ingress(&svc).is_empty());
        svc.status = Some(ServiceStatus {
            load_balancer: Some(K8sLoadBalancerStatus {
                ingress: Some(vec![LoadBalancerIngress {
                    ip: Some("10.1.1.1".to_string()),
                    ..Default::default()
                }]),
            }),
            ..Default::default()
        });
        assert_eq!(published_ingress(&svc), vec!["10.1.1.1".to_string()]);
    }
}
