//! SlbClient trait for mocking
//!
//! This trait abstracts the SlbClient to enable mocking in unit tests.
//! The concrete SlbClient implements this trait, and tests can use mock implementations.

use crate::error::SlbError;
use crate::models::*;

/// Trait for SLB OpenAPI operations
///
/// Every method maps to one OpenAPI action. A response whose `Code` is not
/// `Success` is returned as [`SlbError::Api`], never as an empty value.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait SlbClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Look up an SLB by its exact name.
    ///
    /// `Ok(None)` only when the API explicitly returned no instance.
    async fn find_slb_by_name(&self, name: &str) -> Result<Option<Slb>, SlbError>;

    /// Submit an SLB creation; returns the new instance id and the task to await
    async fn create_slb(&self, request: &CreateSlbRequest) -> Result<CreatedSlb, SlbError>;

    /// Write a batch of listeners; returns the task to await
    async fn update_listeners(&self, request: &UpdateListenRequest) -> Result<String, SlbError>;

    /// Remove every listener of an SLB; returns the task to await
    async fn clear_listeners(&self, slb_id: &str) -> Result<String, SlbError>;

    /// Current state of an asynchronous task
    async fn describe_task(&self, task_id: &str) -> Result<TaskStatus, SlbError>;

    /// Billing catalog entries available in a zone
    async fn billing_schemes(&self, query: &BillingSchemeQuery) -> Result<Vec<BillingScheme>, SlbError>;
}
