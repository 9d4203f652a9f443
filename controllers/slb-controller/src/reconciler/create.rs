//! SLB instance creation

use super::placement::select_zone;
use super::Reconciler;
use crate::annotations::{spec_display_name, SlbOptions};
use crate::error::ControllerError;
use crate::poller::cancellable;
use crate::service::{BackendCandidate, ServiceSpec};
use slb_client::{BillingSchemeQuery, CreateSlbRequest, SlbBandwidthInfo};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Billing catalog filters used for every new instance
const NET_TYPE_PUBLIC: &str = "public";
const BILLING_METHOD_PAY_AS_YOU_GO: &str = "0";

impl Reconciler {
    /// Create the SLB for a service and wait for the creation task.
    ///
    /// Returns the new instance id.
    pub(crate) async fn create_slb(
        &self,
        service: &ServiceSpec,
        options: &SlbOptions,
        candidates: &[BackendCandidate],
        cancel: &CancellationToken,
    ) -> Result<String, ControllerError> {
        let display_name = spec_display_name(&options.spec)
            .ok_or_else(|| ControllerError::Unsupported(format!("specification {}", options.spec)))?;

        let zone = select_zone(candidates, &mut rand::thread_rng())?;
        debug!("Placing SLB for {} in zone {}", service.identity, zone);

        let query = BillingSchemeQuery {
            available_zone_code: zone.clone(),
            net_type: NET_TYPE_PUBLIC.to_string(),
            billing_method: BILLING_METHOD_PAY_AS_YOU_GO.to_string(),
        };
        let schemes = cancellable(cancel, async {
            self.slb_client.billing_schemes(&query).await.map_err(ControllerError::from)
        })
        .await?;
        let scheme = schemes
            .into_iter()
            .find(|s| s.conf_name == display_name)
            .ok_or_else(|| ControllerError::NoBillingScheme {
                zone: zone.clone(),
                display_name: display_name.to_string(),
            })?;

        if options.protocol.is_some() || options.algorithm.is_some() {
            debug!(
                "Service {} requests protocol {:?}, algorithm {:?}",
                service.identity, options.protocol, options.algorithm
            );
        }

        let request = CreateSlbRequest {
            available_zone_code: zone,
            level: options.level,
            bandwidth_info: SlbBandwidthInfo {
                name: service.identity.slb_name(),
                billing_scheme_id: scheme.billing_scheme_id,
                qos: options.bandwidth,
                spec_type: options.spec.clone(),
                is_auto_renewal: false,
                is_to_month: false,
                duration: 0,
                eip_count: options.eip_count,
            },
        };

        info!(
            "Creating SLB {} in zone {} for service {}",
            request.bandwidth_info.name, request.available_zone_code, service.identity
        );
        let created = cancellable(cancel, async {
            self.slb_client.create_slb(&request).await.map_err(ControllerError::from)
        })
        .await?;

        self.await_task(&created.task_id, cancel).await?;
        Ok(created.slb_id)
    }
}
