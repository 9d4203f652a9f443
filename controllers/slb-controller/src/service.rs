//! Service and node views consumed by the reconciler.
//!
//! The reconciler never touches `k8s_openapi` types directly; the watcher converts
//! each `Service` and `Node` into these plain values on every pass.

use crate::error::ControllerError;
use k8s_openapi::api::core::v1::{Node, Service};
use std::collections::BTreeMap;

/// Service type that asks for an external load balancer
pub const SERVICE_TYPE_LOAD_BALANCER: &str = "LoadBalancer";

/// Stable identity of a service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    pub name: String,
    pub namespace: String,
    pub uid: String,
}

impl ServiceIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            uid: uid.into(),
        }
    }

    /// Identity of a Kubernetes service; the namespace defaults to `default`
    pub fn from_service(service: &Service) -> Result<Self, ControllerError> {
        let meta = &service.metadata;
        let name = meta.name.clone()
            .ok_or_else(|| ControllerError::InvalidConfig("Service missing name".to_string()))?;
        let namespace = meta.namespace.clone().unwrap_or_else(|| "default".to_string());
        let uid = meta.uid.clone()
            .ok_or_else(|| ControllerError::InvalidConfig(format!("Service {}/{} missing uid", namespace, name)))?;
        Ok(Self { name, namespace, uid })
    }

    /// Name of the SLB backing this service.
    ///
    /// Pure function of the identity; the lookup-before-create path depends on it
    /// never changing for the lifetime of the service.
    pub fn slb_name(&self) -> String {
        format!("{}{}{}", self.name, self.namespace, self.uid)
    }
}

impl std::fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Session affinity requested by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAffinity {
    None,
    ClientIp,
    Other(String),
}

impl SessionAffinity {
    fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("None") => Self::None,
            Some("ClientIP") => Self::ClientIp,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// One declared service port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    /// Port exposed on the load balancer
    pub port: i32,
    /// Port the backends listen on
    pub node_port: i32,
    pub protocol: String,
}

/// Desired exposure of one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub identity: ServiceIdentity,
    pub annotations: BTreeMap<String, String>,
    pub session_affinity: SessionAffinity,
    pub ports: Vec<PortSpec>,
}

impl ServiceSpec {
    /// Build the reconciler view of a Kubernetes service
    pub fn from_service(service: &Service) -> Result<Self, ControllerError> {
        let identity = ServiceIdentity::from_service(service)?;
        let ServiceIdentity { name, namespace, .. } = &identity;

        let spec = service.spec.as_ref();
        let ports = spec
            .and_then(|s| s.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|p| {
                        let node_port = p.node_port.ok_or_else(|| {
                            ControllerError::Unsupported(format!(
                                "port {} of {}/{} has no node port allocated",
                                p.port, namespace, name
                            ))
                        })?;
                        Ok(PortSpec {
                            port: p.port,
                            node_port,
                            protocol: p.protocol.clone().unwrap_or_else(|| "TCP".to_string()),
                        })
                    })
                    .collect::<Result<Vec<_>, ControllerError>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            identity,
            annotations: service.metadata.annotations.clone().unwrap_or_default(),
            session_affinity: SessionAffinity::parse(spec.and_then(|s| s.session_affinity.as_deref())),
            ports,
        })
    }
}

/// True when the service asks for an external load balancer
pub fn is_load_balancer(service: &Service) -> bool {
    service
        .spec
        .as_ref()
        .and_then(|s| s.type_.as_deref())
        == Some(SERVICE_TYPE_LOAD_BALANCER)
}

/// Kind of a node address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressType {
    Internal,
    External,
    Hostname,
    Other(String),
}

impl AddressType {
    fn parse(value: &str) -> Self {
        match value {
            "InternalIP" => Self::Internal,
            "ExternalIP" => Self::External,
            "Hostname" => Self::Hostname,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddress {
    pub address_type: AddressType,
    pub address: String,
}

/// A node eligible to receive traffic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCandidate {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub addresses: Vec<NodeAddress>,
}

impl BackendCandidate {
    pub fn from_node(node: &Node) -> Self {
        let addresses = node
            .status
            .as_ref()
            .and_then(|s| s.addresses.as_ref())
            .map(|addrs| {
                addrs
                    .iter()
                    .map(|a| NodeAddress {
                        address_type: AddressType::parse(&a.type_),
                        address: a.address.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: node.metadata.name.clone().unwrap_or_default(),
            labels: node.metadata.labels.clone().unwrap_or_default(),
            addresses,
        }
    }

    /// First internal address, if the node reports one
    pub fn internal_address(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.address_type == AddressType::Internal)
            .map(|a| a.address.as_str())
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeAddress as K8sNodeAddress, NodeStatus, ServicePort, ServiceSpec as K8sServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn k8s_service(type_: &str, node_port: Option<i32>) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some("svc1".to_string()),
                namespace: Some("ns1".to_string()),
                uid: Some("u1".to_string()),
                ..Default::default()
            },
            spec: Some(K8sServiceSpec {
                type_: Some(type_.to_string()),
                ports: Some(vec![ServicePort {
                    port: 80,
                    node_port,
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            status: None,
        }
    }

    #[test]
    fn test_slb_name_is_deterministic() {
        let a = ServiceIdentity::new("svc1", "ns1", "u1");
        let b = ServiceIdentity::new("svc1", "ns1", "u1");
        assert_eq!(a.slb_name(), "svc1ns1u1");
        assert_eq!(a.slb_name(), b.slb_name());
        assert_ne!(a.slb_name(), ServiceIdentity::new("svc1", "ns1", "u2").slb_name());
    }

    #[test]
    fn test_from_service() {
        let spec = ServiceSpec::from_service(&k8s_service("LoadBalancer", Some(30080))).unwrap();
        assert_eq!(spec.identity.slb_name(), "svc1ns1u1");
        assert_eq!(spec.session_affinity, SessionAffinity::None);
        assert_eq!(
            spec.ports,
            vec![PortSpec { port: 80, node_port: 30080, protocol: "TCP".to_string() }]
        );
    }

    #[test]
    fn test_from_service_requires_node_port() {
        let err = ServiceSpec::from_service(&k8s_service("LoadBalancer", None)).unwrap_err();
        assert!(matches!(err, ControllerError::Unsupported(_)));
    }

    #[test]
    fn test_is_load_balancer() {
        assert!(is_load_balancer(&k8s_service("LoadBalancer", Some(1))));
        assert!(!is_load_balancer(&k8s_service("ClusterIP", Some(1))));
    }

    #[test]
    fn test_backend_candidate_internal_address() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("node-a".to_string()),
                ..Default::default()
            },
            spec: None,
            status: Some(NodeStatus {
                addresses: Some(vec![
                    K8sNodeAddress { type_: "Hostname".to_string(), address: "node-a".to_string() },
                    K8sNodeAddress { type_: "InternalIP".to_string(), address: "10.0.0.5".to_string() },
                ]),
                ..Default::default()
            }),
        };
        let candidate = BackendCandidate::from_node(&node);
        assert_eq!(candidate.name, "node-a");
        assert_eq!(candidate.internal_address(), Some("10.0.0.5"));
    }
}
