//! Mock SlbClient for unit testing
//!
//! This module provides a mock implementation of SlbClientTrait that can be used
//! in unit tests without requiring access to the OpenAPI endpoint.
//!
//! Instances live in memory keyed by name, task states are scripted per task,
//! and every call is journaled so tests can assert on what was sent.

use crate::error::SlbError;
use crate::models::*;
use crate::slb_trait::SlbClientTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One recorded call against the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    FindSlbByName(String),
    CreateSlb(CreateSlbRequest),
    UpdateListeners(UpdateListenRequest),
    ClearListeners(String),
    DescribeTask(String),
    BillingSchemes(BillingSchemeQuery),
}

/// Mock SlbClient for testing
///
/// Clones share state, so a test can keep a handle while the reconciler owns another.
#[derive(Clone)]
pub struct MockSlbClient {
    pub(crate) base_url: String,
    // In-memory storage keyed by SLB name
    pub(crate) slbs: Arc<Mutex<HashMap<String, Slb>>>,
    // Billing catalog keyed by zone code
    pub(crate) billing: Arc<Mutex<HashMap<String, Vec<BillingScheme>>>>,
    // Remaining scripted states per task id
    pub(crate) task_scripts: Arc<Mutex<HashMap<String, VecDeque<TaskStatus>>>>,
    // Scripts handed to the next tasks the mock issues, in order
    pub(crate) next_task_scripts: Arc<Mutex<VecDeque<Vec<TaskStatus>>>>,
    // Errors returned by the next calls of a given action
    pub(crate) failures: Arc<Mutex<HashMap<&'static str, String>>>,
    pub(crate) calls: Arc<Mutex<Vec<MockCall>>>,
    // Counter for generating IDs
    pub(crate) next_id: Arc<Mutex<u64>>,
}

impl MockSlbClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            slbs: Arc::new(Mutex::new(HashMap::new())),
            billing: Arc::new(Mutex::new(HashMap::new())),
            task_scripts: Arc::new(Mutex::new(HashMap::new())),
            next_task_scripts: Arc::new(Mutex::new(VecDeque::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Add an SLB to the mock store (for test setup)
    pub fn add_slb(&self, slb: Slb) {
        self.slbs.lock().unwrap().insert(slb.slb_name.clone(), slb);
    }

    /// Get an SLB by name from the mock store
    pub fn slb(&self, name: &str) -> Option<Slb> {
        self.slbs.lock().unwrap().get(name).cloned()
    }

    /// Set the billing catalog of a zone (for test setup)
    pub fn set_billing_schemes(&self, zone: &str, schemes: Vec<BillingScheme>) {
        self.billing.lock().unwrap().insert(zone.to_string(), schemes);
    }

    /// Script the states `describe_task` reports for a task id.
    ///
    /// Once the script is exhausted the last state keeps being reported.
    pub fn script_task(&self, task_id: &str, states: Vec<TaskStatus>) {
        self.task_scripts
            .lock()
            .unwrap()
            .insert(task_id.to_string(), states.into());
    }

    /// Script the states of the next task the mock issues
    pub fn script_next_task(&self, states: Vec<TaskStatus>) {
        self.next_task_scripts.lock().unwrap().push_back(states);
    }

    /// Make every call of `action` fail with an API error until cleared
    pub fn fail_action(&self, action: &'static str, message: &str) {
        self.failures.lock().unwrap().insert(action, message.to_string());
    }

    /// Stop failing `action`
    pub fn clear_failure(&self, action: &'static str) {
        self.failures.lock().unwrap().remove(action);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of `describe_task` calls made for a task id
    pub fn describe_task_count(&self, task_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, MockCall::DescribeTask(id) if id == task_id))
            .count()
    }

    /// Every create request received
    pub fn create_requests(&self) -> Vec<CreateSlbRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                MockCall::CreateSlb(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    /// Every listener write received
    pub fn listener_writes(&self) -> Vec<UpdateListenRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                MockCall::UpdateListeners(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    /// Generate next ID
    pub(crate) fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_failure(&self, action: &'static str) -> Result<(), SlbError> {
        match self.failures.lock().unwrap().get(action) {
            Some(message) => Err(SlbError::api(action, "MockFailure", message.clone())),
            None => Ok(()),
        }
    }

    /// Issue a task id, attaching the next queued script if any
    fn issue_task(&self) -> String {
        let task_id = format!("task-{}", self.next_id());
        if let Some(script) = self.next_task_scripts.lock().unwrap().pop_front() {
            self.script_task(&task_id, script);
        }
        task_id
    }
}

#[async_trait::async_trait]
impl SlbClientTrait for MockSlbClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn find_slb_by_name(&self, name: &str) -> Result<Option<Slb>, SlbError> {
        self.record(MockCall::FindSlbByName(name.to_string()));
        self.check_failure(crate::client::ACTION_DESCRIBE_VPC_SLB)?;
        Ok(self.slb(name))
    }

    async fn create_slb(&self, request: &CreateSlbRequest) -> Result<CreatedSlb, SlbError> {
        self.record(MockCall::CreateSlb(request.clone()));
        self.check_failure(crate::client::ACTION_PACKAGE_CREATE_SLB)?;

        let id = self.next_id();
        let slb = Slb {
            slb_id: format!("slb-{}", id),
            slb_name: request.bandwidth_info.name.clone(),
            vip_list: vec![Vip {
                vip: format!("10.255.0.{}", id % 250 + 1),
            }],
            status: Some("ok".to_string()),
        };
        let slb_id = slb.slb_id.clone();
        self.add_slb(slb);

        Ok(CreatedSlb {
            slb_id,
            task_id: self.issue_task(),
        })
    }

    async fn update_listeners(&self, request: &UpdateListenRequest) -> Result<String, SlbError> {
        self.record(MockCall::UpdateListeners(request.clone()));
        self.check_failure(crate::client::ACTION_UPDATE_LISTEN)?;
        if request.listen_list.is_empty() {
            return Err(SlbError::InvalidRequest(format!(
                "empty listener batch for SLB {}",
                request.slb_id
            )));
        }
        Ok(self.issue_task())
    }

    async fn clear_listeners(&self, slb_id: &str) -> Result<String, SlbError> {
        self.record(MockCall::ClearListeners(slb_id.to_string()));
        self.check_failure(crate::client::ACTION_CLEAR_LISTEN)?;
        Ok(self.issue_task())
    }

    async fn describe_task(&self, task_id: &str) -> Result<TaskStatus, SlbError> {
        self.record(MockCall::DescribeTask(task_id.to_string()));
        self.check_failure(crate::client::ACTION_DESCRIBE_TASK)?;

        let mut scripts = self.task_scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(task_id) else {
            return Ok(TaskStatus::Success);
        };
        let status = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().copied()
        };
        Ok(status.unwrap_or(TaskStatus::Success))
    }

    async fn billing_schemes(&self, query: &BillingSchemeQuery) -> Result<Vec<BillingScheme>, SlbError> {
        self.record(MockCall::BillingSchemes(query.clone()));
        self.check_failure(crate::client::ACTION_BILLING_SCHEME)?;
        Ok(self
            .billing
            .lock()
            .unwrap()
            .get(&query.available_zone_code)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_task_repeats_last_state() {
        let mock = MockSlbClient::new("http://mock");
        mock.script_task("t1", vec![TaskStatus::Pending, TaskStatus::Success]);
        assert_eq!(mock.describe_task("t1").await.unwrap(), TaskStatus::Pending);
        assert_eq!(mock.describe_task("t1").await.unwrap(), TaskStatus::Success);
        assert_eq!(mock.describe_task("t1").await.unwrap(), TaskStatus::Success);
        assert_eq!(mock.describe_task_count("t1"), 3);
    }

    #[tokio::test]
    async fn test_create_registers_slb_by_name() {
        let mock = MockSlbClient::new("http://mock");
        mock.script_next_task(vec![TaskStatus::Failed]);
        let created = mock
            .create_slb(&CreateSlbRequest {
                available_zone_code: "zoneA".to_string(),
                level: 4,
                bandwidth_info: SlbBandwidthInfo {
                    name: "web".to_string(),
                    billing_scheme_id: "b".to_string(),
                    qos: 10,
                    spec_type: "standard".to_string(),
                    is_auto_renewal: false,
                    is_to_month: false,
                    duration: 0,
                    eip_count: 1,
                },
            })
            .await
            .unwrap();

        let found = mock.find_slb_by_name("web").await.unwrap().unwrap();
        assert_eq!(found.slb_id, created.slb_id);
        assert!(found.first_vip().is_some());
        assert_eq!(mock.describe_task(&created.task_id).await.unwrap(), TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let mock = MockSlbClient::new("http://mock");
        mock.fail_action(crate::client::ACTION_DESCRIBE_VPC_SLB, "boom");
        assert!(matches!(
            mock.find_slb_by_name("web").await,
            Err(SlbError::Api { .. })
        ));
        mock.clear_failure(crate::client::ACTION_DESCRIBE_VPC_SLB);
        assert!(mock.find_slb_by_name("web").await.unwrap().is_none());
    }
}
