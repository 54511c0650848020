use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::FlowConfig;

/// JSON body for `POST /api/v1/run/{endpoint}`.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationRequest<'a> {
    pub input_value: &'a str,
    pub output_type: &'static str,
    pub input_type: &'static str,
    pub tweaks: &'a Map<String, Value>,
}

impl<'a> InvocationRequest<'a> {
    pub fn chat(prompt: &'a str, tweaks: &'a Map<String, Value>) -> Self {
        Self {
            input_value: prompt,
            output_type: "chat",
            input_type: "chat",
            tweaks,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait FlowTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &InvocationRequest<'_>,
    ) -> Result<TransportResponse>;
}

pub struct HttpFlowTransport {
    http_client: Arc<reqwest::Client>,
}

impl HttpFlowTransport {
    pub fn new(http_client: Arc<reqwest::Client>) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl FlowTransport for HttpFlowTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &InvocationRequest<'_>,
    ) -> Result<TransportResponse> {
        let response = self
            .http_client
            .post(url)
            .header("Authorization", format!("Bearer {bearer_token}"))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .context("failed to reach workflow service")?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("failed to read workflow response body")?;

        Ok(TransportResponse { status, body })
    }
}

/// What came back from one flow run, before any answer extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawResponse {
    /// Decoded body, kept verbatim whatever the HTTP status was.
    Json(Value),
    DecodeFailure {
        error: String,
        response_text: String,
        details: String,
    },
    TransportFailure {
        error: String,
        details: String,
    },
}

impl RawResponse {
    pub fn to_value(&self) -> Value {
        match self {
            RawResponse::Json(value) => value.clone(),
            RawResponse::DecodeFailure {
                error,
                response_text,
                details,
            } => serde_json::json!({
                "error": error,
                "response_text": response_text,
                "details": details,
            }),
            RawResponse::TransportFailure { error, details } => serde_json::json!({
                "error": error,
                "details": details,
            }),
        }
    }
}

pub struct FlowInvoker {
    transport: Arc<dyn FlowTransport>,
}

impl FlowInvoker {
    pub fn new(transport: Arc<dyn FlowTransport>) -> Self {
        Self { transport }
    }

    /// Run `prompt` through the flow. Never fails: transport and decode
    /// problems come back as `RawResponse` variants naming the flow.
    #[tracing::instrument(skip_all, fields(flow = %flow.name, endpoint = %flow.endpoint()))]
    pub async fn invoke(&self, flow: &FlowConfig, prompt: &str) -> RawResponse {
        let url = flow.run_url();
        let request = InvocationRequest::chat(prompt, &flow.tweaks);

        let response = match self
            .transport
            .post_json(&url, &flow.bearer_token, &request)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "workflow request failed");
                return RawResponse::TransportFailure {
                    error: format!("Request failed in {}", flow.name),
                    details: format!("{e:#}"),
                };
            }
        };

        if !(200..300).contains(&response.status) {
            tracing::warn!(status = response.status, "workflow service returned non-success status");
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => {
                tracing::info!(status = response.status, "workflow responded");
                RawResponse::Json(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, status = response.status, "workflow response is not JSON");
                RawResponse::DecodeFailure {
                    error: format!("Failed to decode JSON in {}", flow.name),
                    response_text: response.body,
                    details: e.to_string(),
                }
            }
        }
    }
}
