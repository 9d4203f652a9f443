//! Service annotations understood by the controller.

use crate::error::ControllerError;
use crate::service::PortSpec;
use std::collections::BTreeMap;

pub const ANNOTATION_LB_PROTOCOL: &str = "service.beta.kubernetes.io/cds-load-balancer-protocol";
/// Protocol level of the SLB (integer)
pub const ANNOTATION_LB_TYPE: &str = "service.beta.kubernetes.io/cds-load-balancer-types";
/// Specification label: standard, high, super or extreme
pub const ANNOTATION_LB_SPEC: &str = "service.beta.kubernetes.io/cds-load-balancer-specification";
/// Bandwidth in Mbps (integer)
pub const ANNOTATION_LB_BANDWIDTH: &str = "service.beta.kubernetes.io/cds-load-balancer-bandwidth";
/// Number of elastic IPs (integer)
pub const ANNOTATION_LB_EIP: &str = "service.beta.kubernetes.io/cds-load-balancer-eip";
pub const ANNOTATION_LB_ALGORITHM: &str = "service.beta.kubernetes.io/cds-load-balancer-algorithm";
/// JSON record of the listeners written by the last successful sync
pub const ANNOTATION_LB_LISTEN: &str = "service.eks.listen";

/// Specification label → billing catalog display name
const SPEC_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("standard", "标准型I"),
    ("high", "高阶型I"),
    ("super", "超强型I"),
    ("extreme", "至强型I"),
];

/// Billing catalog display name of a specification label
pub fn spec_display_name(spec: &str) -> Option<&'static str> {
    SPEC_DISPLAY_NAMES
        .iter()
        .find(|(label, _)| *label == spec)
        .map(|(_, display)| *display)
}

/// Creation parameters parsed from service annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlbOptions {
    pub level: i64,
    pub spec: String,
    pub bandwidth: i64,
    pub eip_count: i64,
    pub protocol: Option<String>,
    pub algorithm: Option<String>,
}

impl SlbOptions {
    /// Parse and validate the creation annotations.
    ///
    /// Runs before any remote call; a bad value aborts creation.
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Result<Self, ControllerError> {
        if annotations.is_empty() {
            return Err(ControllerError::MissingAnnotation(ANNOTATION_LB_TYPE));
        }

        let level = parse_int(annotations, ANNOTATION_LB_TYPE)?;
        let spec = required(annotations, ANNOTATION_LB_SPEC)?.to_string();
        if spec_display_name(&spec).is_none() {
            return Err(ControllerError::InvalidAnnotation {
                key: ANNOTATION_LB_SPEC,
                value: spec,
                reason: "expected one of standard, high, super, extreme".to_string(),
            });
        }
        let bandwidth = parse_int(annotations, ANNOTATION_LB_BANDWIDTH)?;
        let eip_count = parse_int(annotations, ANNOTATION_LB_EIP)?;

        Ok(Self {
            level,
            spec,
            bandwidth,
            eip_count,
            protocol: annotations.get(ANNOTATION_LB_PROTOCOL).cloned(),
            algorithm: annotations.get(ANNOTATION_LB_ALGORITHM).cloned(),
        })
    }
}

fn required<'a>(annotations: &'a BTreeMap<String, String>, key: &'static str) -> Result<&'a str, ControllerError> {
    annotations
        .get(key)
        .map(|v| v.trim())
        .ok_or(ControllerError::MissingAnnotation(key))
}

fn parse_int(annotations: &BTreeMap<String, String>, key: &'static str) -> Result<i64, ControllerError> {
    let value = required(annotations, key)?;
    value.parse::<i64>().map_err(|e| ControllerError::InvalidAnnotation {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Listeners recorded by the last successful sync, keyed by exposed port.
///
/// Stored in the service annotation as a JSON object, e.g. `{"80":"TCP","443":"TCP"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenRecord {
    ports: BTreeMap<String, String>,
}

impl ListenRecord {
    /// Read the record from the annotations; absent means no listener was ever written
    pub fn from_annotations(annotations: &BTreeMap<String, String>) -> Result<Self, ControllerError> {
        match annotations.get(ANNOTATION_LB_LISTEN) {
            None => Ok(Self::default()),
            Some(raw) if raw.trim().is_empty() => Ok(Self::default()),
            Some(raw) => serde_json::from_str(raw)
                .map(|ports| Self { ports })
                .map_err(ControllerError::InvalidListenRecord),
        }
    }

    /// Record describing exactly the given ports
    pub fn from_ports(ports: &[PortSpec]) -> Self {
        Self {
            ports: ports
                .iter()
                .map(|p| (p.port.to_string(), p.protocol.clone()))
                .collect(),
        }
    }

    pub fn contains(&self, port: i32) -> bool {
        self.ports.contains_key(&port.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Annotation value for this record
    pub fn to_annotation(&self) -> String {
        // A map of strings always serializes
        serde_json::to_string(&self.ports).unwrap_or_else(|_| "{}".to_string())
    }
}
