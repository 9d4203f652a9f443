//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating test data and setting up test scenarios.

#[cfg(test)]
use crate::annotations::{ANNOTATION_LB_BANDWIDTH, ANNOTATION_LB_EIP, ANNOTATION_LB_SPEC, ANNOTATION_LB_TYPE};
#[cfg(test)]
use crate::poller::PollConfig;
#[cfg(test)]
use crate::reconciler::Reconciler;
#[cfg(test)]
use crate::service::{AddressType, BackendCandidate, NodeAddress, PortSpec, ServiceIdentity, ServiceSpec, SessionAffinity};
#[cfg(test)]
use crate::reconciler::placement::LABEL_NODE_AZ;
#[cfg(test)]
use slb_client::{BillingScheme, MockSlbClient};
#[cfg(test)]
use std::collections::BTreeMap;
#[cfg(test)]
use std::time::Duration;

/// Helper to create a backend candidate with an optional zone label and internal IP
#[cfg(test)]
pub fn candidate(name: &str, zone: Option<&str>, internal_ip: Option<&str>) -> BackendCandidate {
    let mut labels = BTreeMap::new();
    if let Some(zone) = zone {
        labels.insert(LABEL_NODE_AZ.to_string(), zone.to_string());
    }
    let mut addresses = vec![NodeAddress {
        address_type: AddressType::Hostname,
        address: name.to_string(),
    }];
    if let Some(ip) = internal_ip {
        addresses.push(NodeAddress {
            address_type: AddressType::Internal,
            address: ip.to_string(),
        });
    }
    BackendCandidate {
        name: name.to_string(),
        labels,
        addresses,
    }
}

/// Creation annotations for a standard 100 Mbps SLB with one EIP
#[cfg(test)]
pub fn creation_annotations() -> BTreeMap<String, String> {
    [
        (ANNOTATION_LB_TYPE, "1"),
        (ANNOTATION_LB_SPEC, "standard"),
        (ANNOTATION_LB_BANDWIDTH, "100"),
        (ANNOTATION_LB_EIP, "1"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Helper to create the `svc1`/`ns1`/`u1` service with the given (port, node port) pairs
#[cfg(test)]
pub fn service_with_ports(ports: &[(i32, i32)]) -> ServiceSpec {
    ServiceSpec {
        identity: ServiceIdentity::new("svc1", "ns1", "u1"),
        annotations: creation_annotations(),
        session_affinity: SessionAffinity::None,
        ports: ports
            .iter()
            .map(|(port, node_port)| PortSpec {
                port: *port,
                node_port: *node_port,
                protocol: "TCP".to_string(),
            })
            .collect(),
    }
}

/// Billing catalog entry for the standard specification
#[cfg(test)]
pub fn standard_billing_scheme() -> BillingScheme {
    BillingScheme {
        conf_name: "标准型I".to_string(),
        billing_scheme_id: "bill-standard".to_string(),
    }
}

/// Poll configuration with no delay between attempts
#[cfg(test)]
pub fn fast_poll_config(max_attempts: u32) -> PollConfig {
    PollConfig {
        max_attempts,
        min_interval: Duration::ZERO,
        max_interval: Duration::ZERO,
    }
}

/// Helper to create a reconciler backed by a mock client.
///
/// The mock knows the standard billing scheme in `zoneA`; the returned handle shares
/// state with the one the reconciler owns.
#[cfg(test)]
pub fn create_test_reconciler() -> (Reconciler, MockSlbClient) {
    let mock = MockSlbClient::new("http://mock-slb");
    mock.set_billing_schemes("zoneA", vec![standard_billing_scheme()]);
    let reconciler = Reconciler::new(mock.clone(), fast_poll_config(5));
    (reconciler, mock)
}
