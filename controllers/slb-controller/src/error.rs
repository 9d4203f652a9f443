//! Controller-specific error types.
//!
//! This module defines error types specific to the SLB service controller
//! that are not covered by upstream library errors.

use kube::Error as KubeError;
use slb_client::SlbError;
use thiserror::Error;

/// Errors that can occur in the SLB service controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// SLB OpenAPI error (transport, or a non-success response code)
    #[error("SLB error: {0}")]
    Slb(#[from] SlbError),

    /// A required annotation is absent
    #[error("Missing annotation {0}")]
    MissingAnnotation(&'static str),

    /// An annotation could not be parsed as its expected type
    #[error("Invalid annotation {key}={value:?}: {reason}")]
    InvalidAnnotation {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// The stored listen record is not valid JSON
    #[error("Invalid listen record annotation: {0}")]
    InvalidListenRecord(#[source] serde_json::Error),

    /// The service asks for something the SLB cannot do
    #[error("Unsupported service configuration: {0}")]
    Unsupported(String),

    /// No backend candidates were supplied
    #[error("No backend candidates available")]
    NoCandidates,

    /// No candidate carries a zone label
    #[error("No availability zone could be determined from {0} candidates")]
    NoZone(usize),

    /// Billing catalog has no entry for the requested specification
    #[error("No billing scheme named {display_name:?} in zone {zone}")]
    NoBillingScheme { zone: String, display_name: String },

    /// The SLB exists but has no virtual IP yet
    #[error("SLB {0} has no virtual IP")]
    NoVip(String),

    /// The SLB is expected to exist but the lookup came back empty
    #[error("SLB {0} not found")]
    SlbNotFound(String),

    /// A remote task reached the failed state
    #[error("Task {0} failed")]
    TaskFailed(String),

    /// A remote task did not finish within the attempt budget
    #[error("Task {task_id} timed out after {attempts} attempts")]
    TaskTimeout { task_id: String, attempts: u32 },

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

/// Coarse failure classes, as seen by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; fails before any remote call
    Validation,
    /// Could not determine whether the SLB exists, or another remote call failed
    Remote,
    /// Nothing to place or bind against
    Policy,
    /// Remote task reached the failed state
    Task,
    /// Remote task did not finish in time
    Timeout,
    Cancelled,
    /// Kubernetes, configuration or watch plumbing
    Infrastructure,
}

impl ControllerError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingAnnotation(_)
            | Self::InvalidAnnotation { .. }
            | Self::InvalidListenRecord(_)
            | Self::Unsupported(_) => ErrorKind::Validation,
            Self::Slb(_) => ErrorKind::Remote,
            Self::NoCandidates
            | Self::NoZone(_)
            | Self::NoBillingScheme { .. }
            | Self::NoVip(_)
            | Self::SlbNotFound(_) => ErrorKind::Policy,
            Self::TaskFailed(_) => ErrorKind::Task,
            Self::TaskTimeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Kube(_) | Self::InvalidConfig(_) | Self::Watch(_) => ErrorKind::Infrastructure,
        }
    }
}
