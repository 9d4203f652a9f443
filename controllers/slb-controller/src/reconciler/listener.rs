//! Listener planning and writes.
//!
//! Every declared port becomes one listener on the SLB's first VIP, with one real
//! server per backend candidate. The listen record annotation decides whether a port
//! is new (written with `exact`) or already present (written with `full`).

use super::Reconciler;
use crate::annotations::ListenRecord;
use crate::error::ControllerError;
use crate::poller::cancellable;
use crate::service::{BackendCandidate, ServiceSpec};
use slb_client::{Listen, RealServer, Slb, UpdateListenRequest, UpdateMode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Platform tag sent with every listener write
pub const PLATFORM_EKS: &str = "eks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedListener {
    pub listen: Listen,
    /// Port missing from the listen record
    pub is_new: bool,
}

/// Listeners to write for one service, in declared port order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerPlan {
    pub entries: Vec<PlannedListener>,
}

impl ListenerPlan {
    pub fn build(
        service: &ServiceSpec,
        vip: &str,
        candidates: &[BackendCandidate],
        record: &ListenRecord,
    ) -> Self {
        let entries = service
            .ports
            .iter()
            .map(|port| {
                let rs_list = candidates
                    .iter()
                    .map(|c| {
                        let ip = c.internal_address().unwrap_or_else(|| {
                            warn!("Node {} has no internal address", c.name);
                            ""
                        });
                        RealServer {
                            rs_lan_ip: ip.to_string(),
                            rs_port: port.node_port,
                        }
                    })
                    .collect();
                PlannedListener {
                    listen: Listen {
                        listen_ip: vip.to_string(),
                        listen_port: port.port,
                        listen_protocol: port.protocol.clone(),
                        rs_list,
                    },
                    is_new: !record.contains(port.port),
                }
            })
            .collect();
        Self { entries }
    }

    pub fn creates(&self) -> Vec<Listen> {
        self.select(true)
    }

    pub fn updates(&self) -> Vec<Listen> {
        self.select(false)
    }

    fn select(&self, is_new: bool) -> Vec<Listen> {
        self.entries
            .iter()
            .filter(|e| e.is_new == is_new)
            .map(|e| e.listen.clone())
            .collect()
    }

    /// Writes to send, in order.
    ///
    /// Only new ports: one `exact` write. Only known ports: one `full` write. Both: a
    /// single `full` write with every listener, since a second `full` write would wipe
    /// the listeners the `exact` write just added.
    pub fn batches(&self) -> Vec<(UpdateMode, Vec<Listen>)> {
        let creates = self.creates();
        let updates = self.updates();
        match (creates.is_empty(), updates.is_empty()) {
            (true, true) => Vec::new(),
            (false, true) => vec![(UpdateMode::Exact, creates)],
            (true, false) => vec![(UpdateMode::Full, updates)],
            (false, false) => vec![(
                UpdateMode::Full,
                self.entries.iter().map(|e| e.listen.clone()).collect(),
            )],
        }
    }
}

impl Reconciler {
    /// Write the service's listeners to the SLB and wait for each write to finish
    pub async fn sync_listeners(
        &self,
        service: &ServiceSpec,
        slb: &Slb,
        candidates: &[BackendCandidate],
        cancel: &CancellationToken,
    ) -> Result<(), ControllerError> {
        let vip = slb
            .first_vip()
            .ok_or_else(|| ControllerError::NoVip(slb.slb_id.clone()))?;
        let record = ListenRecord::from_annotations(&service.annotations)?;
        if record.is_empty() {
            debug!("Service {} has no listen record, every port is new", service.identity);
        }
        let plan = ListenerPlan::build(service, vip, candidates, &record);

        let batches = plan.batches();
        if batches.is_empty() {
            debug!("Service {} declares no ports, nothing to write", service.identity);
            return Ok(());
        }

        for (mode, listen_list) in batches {
            info!(
                "Writing {} listeners ({:?}) to SLB {} for service {}",
                listen_list.len(),
                mode,
                slb.slb_id,
                service.identity
            );
            let request = UpdateListenRequest {
                slb_id: slb.slb_id.clone(),
                platform: PLATFORM_EKS.to_string(),
                operator_type: mode,
                listen_list,
            };
            let task_id = cancellable(cancel, async {
                self.slb_client.update_listeners(&request).await.map_err(ControllerError::from)
            })
            .await?;
            self.await_task(&task_id, cancel).await?;
        }
        Ok(())
    }
}
