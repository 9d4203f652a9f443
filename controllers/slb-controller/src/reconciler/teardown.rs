//! Listener removal on service deletion

use super::Reconciler;
use crate::error::ControllerError;
use crate::poller::cancellable;
use crate::service::ServiceIdentity;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

impl Reconciler {
    /// Clear every listener of the service's SLB.
    ///
    /// The instance itself is left in place. A missing instance is success.
    pub(crate) async fn teardown(
        &self,
        identity: &ServiceIdentity,
        cancel: &CancellationToken,
    ) -> Result<(), ControllerError> {
        let Some(slb) = self.resolve(identity, cancel).await? else {
            debug!("No SLB for service {}, nothing to tear down", identity);
            return Ok(());
        };

        info!("Clearing listeners of SLB {} for service {}", slb.slb_id, identity);
        let task_id = cancellable(cancel, async {
            self.slb_client.clear_listeners(&slb.slb_id).await.map_err(ControllerError::from)
        })
        .await?;
        self.await_task(&task_id, cancel).await
    }
}
