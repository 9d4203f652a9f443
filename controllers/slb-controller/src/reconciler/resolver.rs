//! SLB lookup by derived name

use super::Reconciler;
use crate::error::ControllerError;
use crate::poller::cancellable;
use crate::service::ServiceIdentity;
use slb_client::Slb;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

impl Reconciler {
    /// Look up the SLB backing a service.
    ///
    /// `Ok(None)` means the API confirmed there is no such instance. A failed lookup
    /// is an error: callers must not create an instance when existence is unknown.
    pub async fn resolve(
        &self,
        identity: &ServiceIdentity,
        cancel: &CancellationToken,
    ) -> Result<Option<Slb>, ControllerError> {
        let name = identity.slb_name();
        debug!("Resolving SLB {} for service {}", name, identity);

        let slb = cancellable(cancel, async {
            self.slb_client.find_slb_by_name(&name).await.map_err(|e| {
                error!("Failed to look up SLB {}: {}", name, e);
                ControllerError::Slb(e)
            })
        })
        .await?;

        match &slb {
            Some(found) => debug!("SLB {} exists (ID: {})", name, found.slb_id),
            None => debug!("SLB {} does not exist", name),
        }
        Ok(slb)
    }
}
