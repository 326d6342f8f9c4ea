//! Azure OpenAI chat-completions oracle

use crate::adapter::{ExtractionOracle, OracleError};
use crate::fragment::parse_fragment;
use crate::prompt::{refine_prompt, user_prompt, REFINE_SYSTEM_PROMPT, SYSTEM_PROMPT};
use erdscribe_core::{Fragment, OracleConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Oracle backed by an Azure OpenAI chat deployment
///
/// Replies are requested as a JSON object at temperature 0 and parsed with
/// [`parse_fragment`].
#[derive(Debug, Clone)]
pub struct AzureOpenAiOracle {
    client: reqwest::Client,
    url: String,
    api_key: String,
    deployment: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl AzureOpenAiOracle {
    /// Build a client from configuration
    ///
    /// Fails with [`OracleError::Configuration`] when the endpoint, key or
    /// deployment is missing, before any request is made.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        if !config.is_complete() {
            return Err(OracleError::Configuration(
                "Azure OpenAI is not configured; set AZURE_OPENAI_ENDPOINT, \
                 AZURE_OPENAI_API_KEY and AZURE_OPENAI_DEPLOYMENT"
                    .to_string(),
            ));
        }
        if config.timeout_secs == 0 {
            return Err(OracleError::Configuration(
                "Oracle timeout must be a positive number of seconds".to_string(),
            ));
        }

        let present = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
        let (endpoint, api_key, deployment) =
            (present(&config.endpoint), present(&config.api_key), present(&config.deployment));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Configuration(e.to_string()))?;

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            config.api_version
        );

        Ok(Self {
            client,
            url,
            api_key,
            deployment,
        })
    }

    /// Chat-completions URL requests are sent to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// One JSON-mode chat completion, parsed as a fragment
    async fn complete(&self, system: &str, user: &str) -> Result<Fragment, OracleError> {
        let request = ChatRequest {
            model: &self.deployment,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat { kind: "json_object" },
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| OracleError::MalformedFragment(format!("unexpected response envelope: {}", e)))?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::MalformedFragment("response has no message content".to_string()))?;

        parse_fragment(&content)
    }
}

#[async_trait::async_trait]
impl ExtractionOracle for AzureOpenAiOracle {
    fn name(&self) -> &'static str {
        "AzureOpenAI"
    }

    async fn extract(&self, batch_text: &str) -> Result<Fragment, OracleError> {
        debug!(url = %self.url, chars = batch_text.len(), "Sending extraction request");
        self.complete(SYSTEM_PROMPT, &user_prompt(batch_text)).await
    }

    async fn refine(&self, schema: &Fragment, hints: &str) -> Result<Fragment, OracleError> {
        let prompt = refine_prompt(schema, hints)?;
        debug!(url = %self.url, tables = schema.table_count(), "Sending refinement request");
        self.complete(REFINE_SYSTEM_PROMPT, &prompt).await
    }
}
