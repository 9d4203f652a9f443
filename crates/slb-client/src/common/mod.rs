//! Common utilities for the SLB OpenAPI client
//!
//! Every OpenAPI action is a POST to `/?Action=<name>&Version=<version>` with a JSON body,
//! answered by the same envelope. This module owns that transport and the envelope decoding.

use crate::error::SlbError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Code carried by every successful OpenAPI response
pub const CODE_SUCCESS: &str = "Success";

/// Response envelope shared by all OpenAPI actions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub task_id: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Turn a non-success `Code` into an error
    pub fn into_result(self, action: &str) -> Result<Self, SlbError> {
        if self.code != CODE_SUCCESS {
            return Err(SlbError::api(action, self.code, self.message));
        }
        Ok(self)
    }

    /// Take the task id of a mutating action, failing if the API omitted it
    pub fn require_task_id(&mut self, action: &str) -> Result<String, SlbError> {
        self.task_id
            .take()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SlbError::MissingField {
                action: action.to_string(),
                field: "TaskId",
            })
    }
}

/// HTTP client wrapper with authentication
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: String,
    version: String,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, token: String, version: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            version,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the URL of an OpenAPI action
    pub fn action_url(&self, action: &str) -> String {
        format!(
            "{}/?{}",
            self.base_url,
            build_query_string(&[("Action", action), ("Version", &self.version)])
        )
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Invoke an action and decode its envelope.
    ///
    /// HTTP-level failures and non-success `Code` values both come back as errors;
    /// the caller only ever sees envelopes whose code is `Success`.
    pub async fn call<B, T>(&self, action: &str, body: &B) -> Result<ApiResponse<T>, SlbError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.action_url(action);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(SlbError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(SlbError::api(action, status.as_str(), body_text));
        }

        let response_text = response.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&response_text).map_err(|e| {
            SlbError::api(
                action,
                "DecodeError",
                format!(
                    "error decoding response body: {} - Response (first 500 chars): {}",
                    e,
                    response_text.chars().take(500).collect::<String>()
                ),
            )
        })?;

        envelope.into_result(action)
    }
}

/// Build query string from key/value pairs
pub fn build_query_string(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Slb;

    #[test]
    fn test_envelope_success() {
        let envelope: ApiResponse<Slb> = serde_json::from_str(
            r#"{"Code":"Success","Message":"ok","Data":{"SlbId":"slb-1","SlbName":"a"}}"#,
        )
        .unwrap();
        let envelope = envelope.into_result("DescribeVpcSlb").unwrap();
        assert_eq!(envelope.data.unwrap().slb_id, "slb-1");
    }

    #[test]
    fn test_envelope_failure_code() {
        let envelope: ApiResponse<Slb> =
            serde_json::from_str(r#"{"Code":"InvalidParameter","Message":"bad name"}"#).unwrap();
        match envelope.into_result("DescribeVpcSlb") {
            Err(SlbError::Api { code, message, .. }) => {
                assert_eq!(code, "InvalidParameter");
                assert_eq!(message, "bad name");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_require_task_id() {
        let mut envelope: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"Code":"Success","TaskId":"task-9"}"#).unwrap();
        assert_eq!(envelope.require_task_id("VpcSlbClearListen").unwrap(), "task-9");

        let mut empty: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"Code":"Success","TaskId":""}"#).unwrap();
        assert!(matches!(
            empty.require_task_id("VpcSlbClearListen"),
            Err(SlbError::MissingField { field: "TaskId", .. })
        ));
    }

    #[test]
    fn test_action_url_encodes_parameters() {
        let http = HttpClient::new(
            Client::new(),
            "https://api.example.com/".to_string(),
            "t".to_string(),
            "2019-08-08".to_string(),
        );
        assert_eq!(
            http.action_url("DescribeVpcSlb"),
            "https://api.example.com/?Action=DescribeVpcSlb&Version=2019-08-08"
        );
        assert_eq!(build_query_string(&[("a b", "c&d")]), "a%20b=c%26d");
    }
}
