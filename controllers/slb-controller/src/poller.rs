//! Task completion polling.
//!
//! Every mutating SLB action returns a task id. `TaskPoller::wait` turns that into a
//! single awaited result: success, a failed task, a timeout after a fixed number of
//! status queries, or cancellation.

use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use slb_client::{SlbClientTrait, TaskStatus};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default number of status queries before a task is declared timed out
pub const DEFAULT_MAX_ATTEMPTS: u32 = 600;
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(5);

/// Attempt budget and inter-attempt delay bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
        }
    }
}

/// Race a remote call against cancellation
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, ControllerError>
where
    F: Future<Output = Result<T, ControllerError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ControllerError::Cancelled),
        result = fut => result,
    }
}

/// Waits for SLB tasks to reach a terminal state
#[derive(Debug, Clone)]
pub struct TaskPoller {
    config: PollConfig,
}

impl TaskPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Poll `task_id` until it succeeds, fails, runs out of attempts or is cancelled.
    ///
    /// A query error ends the wait immediately; it is not treated as "still pending".
    pub async fn wait(
        &self,
        client: &dyn SlbClientTrait,
        task_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ControllerError> {
        let mut backoff = FibonacciBackoff::new(self.config.min_interval, self.config.max_interval);

        for attempt in 1..=self.config.max_attempts {
            let status = cancellable(cancel, async {
                client.describe_task(task_id).await.map_err(ControllerError::from)
            })
            .await?;

            match status {
                TaskStatus::Success => {
                    debug!("Task {} succeeded after {} attempts", task_id, attempt);
                    return Ok(());
                }
                TaskStatus::Failed => {
                    warn!("Task {} failed after {} attempts", task_id, attempt);
                    return Err(ControllerError::TaskFailed(task_id.to_string()));
                }
                TaskStatus::Pending => {}
            }

            if attempt < self.config.max_attempts {
                let delay = backoff.next_backoff();
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(ControllerError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }

        warn!("Task {} still pending after {} attempts", task_id, self.config.max_attempts);
        Err(ControllerError::TaskTimeout {
            task_id: task_id.to_string(),
            attempts: self.config.max_attempts,
        })
    }
}
