use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Map, Value, json};

pub const DEFAULT_BASE_URL: &str = "https://api.langflow.astra.datastax.com";
pub const WORKFLOW_GROUP_ID: &str = "664e2890-0079-4091-88d4-68d3da05aa38";

pub const MACRO_FLOW_ID: &str = "0287e3b8-2cca-4c53-b48e-80a75ca171cb";
pub const MACRO_ENDPOINT: &str = "Macro";
pub const MACRO_TOKEN_KEY: &str = "APPLICATION_TOKEN_1";

pub const PLAN_FLOW_ID: &str = "3e774dd8-0d0f-4006-93ca-fd14e2bcf0cb";
pub const PLAN_TOKEN_KEY: &str = "APPLICATION_TOKEN_2";

const PLAN_COMPONENTS: [&str; 15] = [
    "ChatInput-Biji5",
    "ParseData-E7X2H",
    "Prompt-hp7nd",
    "OpenAIModel-6rbG5",
    "AstraDB-d5nX2",
    "ConditionalRouter-7wvO2",
    "ToolCallingAgent-67WWg",
    "CalculatorTool-tGUPc",
    "OpenAIModel-Vp8ph",
    "ChatOutput-a0cfr",
    "Prompt-sldfq",
    "TextInput-g5A4Q",
    "Prompt-xGw0X",
    "OpenAIModel-UTsqR",
    "ChatOutput-d7HLR",
];

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing secret: {0}")]
    MissingSecret(&'static str),
}

/// Source of bearer tokens. Kept behind a trait so flows can be built with
/// fake credentials in tests.
pub trait SecretProvider: Send + Sync {
    fn secret(&self, key: &str) -> Option<String>;

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.secret(key)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret(key))
    }
}

/// Reads secrets from the process environment (populated from `.env` at startup).
pub struct EnvSecrets;

impl SecretProvider for EnvSecrets {
    fn secret(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl SecretProvider for HashMap<String, String> {
    fn secret(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Server configuration loaded from environment variables.
pub struct Config {
    pub port: u16,
    pub sentry_dsn: Option<String>,
    pub environment: String,
    pub base_url: String,
    /// `None` means requests wait as long as the upstream takes.
    pub flow_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_raw_values(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("SENTRY_DSN").ok().as_deref(),
            std::env::var("ENVIRONMENT").ok().as_deref(),
            std::env::var("LANGFLOW_BASE_URL").ok().as_deref(),
            std::env::var("FLOW_TIMEOUT_SECS").ok().as_deref(),
        )
    }

    /// Build a Config from raw string values (as they would come from env vars).
    /// Used directly in tests to avoid mutating process-global environment.
    pub fn from_raw_values(
        port: Option<&str>,
        sentry_dsn: Option<&str>,
        environment: Option<&str>,
        base_url: Option<&str>,
        flow_timeout_secs: Option<&str>,
    ) -> Self {
        let port = port.and_then(|v| v.parse().ok()).unwrap_or(8081);

        let sentry_dsn = sentry_dsn.filter(|s| !s.is_empty()).map(String::from);

        let environment = environment
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| "local".to_string());

        let base_url = base_url
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string();

        let flow_timeout = flow_timeout_secs
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Config {
            port,
            sentry_dsn,
            environment,
            base_url,
            flow_timeout,
        }
    }

    /// Diet macro recommendation flow ("API 1").
    pub fn macro_flow(&self, secrets: &dyn SecretProvider) -> Result<FlowConfig, ConfigError> {
        let mut tweaks = Map::new();
        tweaks.insert("TextInput-hjvnW".into(), json!({ "input_value": "goals" }));
        tweaks.insert("TextInput-0QPCj".into(), json!({ "input_value": "profile" }));
        for component in ["Prompt-h7iA7", "TextOutput-4vQAa", "PerplexityModel-Jtf2S"] {
            tweaks.insert(component.into(), json!({}));
        }

        Ok(FlowConfig {
            name: "API 1".to_string(),
            base_url: self.base_url.clone(),
            workflow_group_id: WORKFLOW_GROUP_ID.to_string(),
            flow_id: MACRO_FLOW_ID.to_string(),
            endpoint_name: Some(MACRO_ENDPOINT.to_string()),
            bearer_token: secrets.require(MACRO_TOKEN_KEY)?,
            tweaks,
        })
    }

    /// Personalized workout and diet plan flow ("API 2"). Addressed by flow id.
    pub fn plan_flow(&self, secrets: &dyn SecretProvider) -> Result<FlowConfig, ConfigError> {
        let tweaks = PLAN_COMPONENTS
            .iter()
            .map(|component| (component.to_string(), json!({})))
            .collect();

        Ok(FlowConfig {
            name: "API 2".to_string(),
            base_url: self.base_url.clone(),
            workflow_group_id: WORKFLOW_GROUP_ID.to_string(),
            flow_id: PLAN_FLOW_ID.to_string(),
            endpoint_name: None,
            bearer_token: secrets.require(PLAN_TOKEN_KEY)?,
            tweaks,
        })
    }
}

/// One remote workflow endpoint plus the fixed payload sent with every call.
#[derive(Clone)]
pub struct FlowConfig {
    /// Label used in decode/transport error messages.
    pub name: String,
    pub base_url: String,
    pub workflow_group_id: String,
    pub flow_id: String,
    pub endpoint_name: Option<String>,
    pub bearer_token: String,
    pub tweaks: Map<String, Value>,
}

impl FlowConfig {
    /// The run path segment: the endpoint name when set, else the flow id.
    pub fn endpoint(&self) -> &str {
        self.endpoint_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(self.flow_id.as_str())
    }

    pub fn run_url(&self) -> String {
        format!(
            "{}/lf/{}/api/v1/run/{}",
            self.base_url,
            self.workflow_group_id,
            self.endpoint()
        )
    }
}

impl std::fmt::Debug for FlowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowConfig")
            .field("name", &self.name)
            .field("url", &self.run_url())
            .field("bearer_token", &"<redacted>")
            .field("tweaks", &self.tweaks.len())
            .finish()
    }
}
