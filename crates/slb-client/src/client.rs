//! SLB OpenAPI client
//!
//! Implements the CDS VPC SLB actions the service controller needs:
//! instance lookup/creation, listener writes, task status and the billing catalog.

use crate::common::HttpClient;
use crate::error::SlbError;
use crate::models::*;
use crate::slb_trait::SlbClientTrait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// OpenAPI version sent with every action
pub const API_VERSION: &str = "2019-08-08";

pub const ACTION_DESCRIBE_VPC_SLB: &str = "DescribeVpcSlb";
pub const ACTION_PACKAGE_CREATE_SLB: &str = "PackageCreateSlb";
pub const ACTION_UPDATE_LISTEN: &str = "VpcSlbUpdateListen";
pub const ACTION_CLEAR_LISTEN: &str = "VpcSlbClearListen";
pub const ACTION_DESCRIBE_TASK: &str = "DescribeTask";
pub const ACTION_BILLING_SCHEME: &str = "VpcSlbBillingScheme";

/// SLB OpenAPI client
#[derive(Debug)]
pub struct SlbClient {
    http: HttpClient,
}

impl SlbClient {
    /// Create a new SLB client
    ///
    /// # Arguments
    /// * `base_url` - OpenAPI endpoint (e.g., "https://api.capitalonline.net")
    /// * `token` - API token for authentication
    pub fn new(base_url: String, token: String) -> Result<Self, SlbError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(SlbError::Http)?;

        Ok(Self {
            http: HttpClient::new(client, base_url, token, API_VERSION.to_string()),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Look up an SLB by name
    ///
    /// # Returns
    /// * `Ok(Some(Slb))` - The instance exists
    /// * `Ok(None)` - The API returned no instance (empty data or empty id)
    /// * `Err(SlbError)` - The lookup itself failed
    pub async fn find_slb_by_name(&self, name: &str) -> Result<Option<Slb>, SlbError> {
        debug!("Looking up SLB {}", name);
        let body = serde_json::json!({ "SlbName": name });
        let response = self
            .http
            .call::<_, Slb>(ACTION_DESCRIBE_VPC_SLB, &body)
            .await?;
        Ok(response.data.filter(|slb| !slb.slb_id.is_empty()))
    }

    /// Submit an SLB creation
    pub async fn create_slb(&self, request: &CreateSlbRequest) -> Result<CreatedSlb, SlbError> {
        debug!(
            "Creating SLB {} in zone {}",
            request.bandwidth_info.name, request.available_zone_code
        );
        let mut response = self
            .http
            .call::<_, CreateSlbData>(ACTION_PACKAGE_CREATE_SLB, request)
            .await?;
        let task_id = response.require_task_id(ACTION_PACKAGE_CREATE_SLB)?;
        let slb_id = response
            .data
            .map(|d| d.slb_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SlbError::MissingField {
                action: ACTION_PACKAGE_CREATE_SLB.to_string(),
                field: "SlbId",
            })?;
        Ok(CreatedSlb { slb_id, task_id })
    }

    /// Write a batch of listeners
    pub async fn update_listeners(&self, request: &UpdateListenRequest) -> Result<String, SlbError> {
        if request.listen_list.is_empty() {
            return Err(SlbError::InvalidRequest(format!(
                "empty listener batch for SLB {}",
                request.slb_id
            )));
        }
        debug!(
            "Writing {} listeners to SLB {} ({:?})",
            request.listen_list.len(),
            request.slb_id,
            request.operator_type
        );
        let mut response = self
            .http
            .call::<_, serde_json::Value>(ACTION_UPDATE_LISTEN, request)
            .await?;
        response.require_task_id(ACTION_UPDATE_LISTEN)
    }

    /// Remove every listener of an SLB
    pub async fn clear_listeners(&self, slb_id: &str) -> Result<String, SlbError> {
        debug!("Clearing listeners of SLB {}", slb_id);
        let request = ClearListenRequest {
            slb_id: slb_id.to_string(),
        };
        let mut response = self
            .http
            .call::<_, serde_json::Value>(ACTION_CLEAR_LISTEN, &request)
            .await?;
        response.require_task_id(ACTION_CLEAR_LISTEN)
    }

    /// Current state of an asynchronous task
    pub async fn describe_task(&self, task_id: &str) -> Result<TaskStatus, SlbError> {
        let request = DescribeTaskRequest {
            task_id: task_id.to_string(),
        };
        let response = self
            .http
            .call::<_, TaskInfo>(ACTION_DESCRIBE_TASK, &request)
            .await?;
        response
            .data
            .map(|info| info.task_status)
            .ok_or_else(|| SlbError::MissingField {
                action: ACTION_DESCRIBE_TASK.to_string(),
                field: "Data.TaskStatus",
            })
    }

    /// Billing catalog entries available in a zone
    pub async fn billing_schemes(&self, query: &BillingSchemeQuery) -> Result<Vec<BillingScheme>, SlbError> {
        debug!("Fetching billing schemes for zone {}", query.available_zone_code);
        let response = self
            .http
            .call::<_, Vec<BillingScheme>>(ACTION_BILLING_SCHEME, query)
            .await?;
        Ok(response.data.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl SlbClientTrait for SlbClient {
    fn base_url(&self) -> &str {
        self.base_url()
    }

    async fn find_slb_by_name(&self, name: &str) -> Result<Option<Slb>, SlbError> {
        SlbClient::find_slb_by_name(self, name).await
    }

    async fn create_slb(&self, request: &CreateSlbRequest) -> Result<CreatedSlb, SlbError> {
        SlbClient::create_slb(self, request).await
    }

    async fn update_listeners(&self, request: &UpdateListenRequest) -> Result<String, SlbError> {
        SlbClient::update_listeners(self, request).await
    }

    async fn clear_listeners(&self, slb_id: &str) -> Result<String, SlbError> {
        SlbClient::clear_listeners(self, slb_id).await
    }

    async fn describe_task(&self, task_id: &str) -> Result<TaskStatus, SlbError> {
        SlbClient::describe_task(self, task_id).await
    }

    async fn billing_schemes(&self, query: &BillingSchemeQuery) -> Result<Vec<BillingScheme>, SlbError> {
        SlbClient::billing_schemes(self, query).await
    }
}
