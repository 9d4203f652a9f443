//! SLB OpenAPI models
//!
//! These models match the CDS VPC SLB OpenAPI payloads, which use PascalCase keys.

use serde::{Deserialize, Serialize};

/// A VPC SLB instance as returned by `DescribeVpcSlb`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Slb {
    #[serde(default)]
    pub slb_id: String,
    #[serde(default)]
    pub slb_name: String,
    #[serde(default)]
    pub vip_list: Vec<Vip>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Slb {
    /// First non-empty virtual IP, in the order the API lists them
    pub fn first_vip(&self) -> Option<&str> {
        self.vip_list
            .iter()
            .map(|v| v.vip.as_str())
            .find(|vip| !vip.is_empty())
    }
}

/// Virtual IP bound to an SLB
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vip {
    #[serde(default)]
    pub vip: String,
}

/// Request body for `PackageCreateSlb`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateSlbRequest {
    pub available_zone_code: String,
    /// Protocol level (4 for layer-4)
    pub level: i64,
    pub bandwidth_info: SlbBandwidthInfo,
}

/// Bandwidth package attached to a new SLB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SlbBandwidthInfo {
    pub name: String,
    pub billing_scheme_id: String,
    /// Bandwidth in Mbps
    pub qos: i64,
    /// Specification label (`standard`, `high`, ...)
    #[serde(rename = "Type")]
    pub spec_type: String,
    pub is_auto_renewal: bool,
    pub is_to_month: bool,
    pub duration: i64,
    pub eip_count: i64,
}

/// `Data` payload of a `PackageCreateSlb` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateSlbData {
    #[serde(default)]
    pub slb_id: String,
}

/// Result of an accepted create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedSlb {
    pub slb_id: String,
    pub task_id: String,
}

/// Listener update strategy understood by `VpcSlbUpdateListen`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Only the listed listeners are touched
    Exact,
    /// The listed listeners replace the whole listener set
    Full,
}

/// Request body for `VpcSlbUpdateListen`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateListenRequest {
    pub slb_id: String,
    pub platform: String,
    pub operator_type: UpdateMode,
    pub listen_list: Vec<Listen>,
}

/// One listener: VIP, port, protocol and its real servers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listen {
    pub listen_ip: String,
    pub listen_port: i32,
    pub listen_protocol: String,
    pub rs_list: Vec<RealServer>,
}

/// Backend registration behind a listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RealServer {
    pub rs_lan_ip: String,
    pub rs_port: i32,
}

/// Request body for `VpcSlbClearListen`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClearListenRequest {
    pub slb_id: String,
}

/// Request body for `DescribeTask`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeTaskRequest {
    pub task_id: String,
}

/// Remote task state
///
/// The API reports `success` and `error` as terminal states; every other
/// value means the task is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    #[serde(rename = "error", alias = "failed")]
    Failed,
    #[serde(other)]
    Pending,
}

/// `Data` payload of a `DescribeTask` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskInfo {
    pub task_status: TaskStatus,
}

/// Query for `VpcSlbBillingScheme`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillingSchemeQuery {
    pub available_zone_code: String,
    pub net_type: String,
    pub billing_method: String,
}

/// Billing catalog entry; `conf_name` is the display name of the specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillingScheme {
    pub conf_name: String,
    pub billing_scheme_id: String,
}
