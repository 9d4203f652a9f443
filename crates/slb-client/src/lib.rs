//! CDS VPC SLB OpenAPI Client
//!
//! A Rust client library for the CDS (Capital Online) VPC SLB OpenAPI.
//! Provides type-safe models and methods for the load-balancer lifecycle actions
//! a Kubernetes service controller needs.
//!
//! # Example
//!
//! ```no_run
//! use slb_client::{SlbClient, TaskStatus};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SlbClient::new(
//!     "https://api.capitalonline.net".to_string(),
//!     "your-api-token".to_string(),
//! )?;
//!
//! // Look up an instance by name
//! if let Some(slb) = client.find_slb_by_name("web-default-1234").await? {
//!     // Clear its listeners and check the resulting task
//!     let task_id = client.clear_listeners(&slb.slb_id).await?;
//!     let status = client.describe_task(&task_id).await?;
//!     assert!(matches!(status, TaskStatus::Pending | TaskStatus::Success | TaskStatus::Failed));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Envelope handling**: every non-`Success` response code surfaces as an error
//! - **Async tasks**: mutating actions return task ids for `describe_task`
//! - **Mocking**: `MockSlbClient` behind the `test-util` feature

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod slb_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::SlbClient;
pub use common::{ApiResponse, HttpClient};
pub use error::SlbError;
pub use models::*;
pub use slb_trait::SlbClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockCall, MockSlbClient};
