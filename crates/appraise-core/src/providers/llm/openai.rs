use super::{CompletionClient, CompletionConfig, UpstreamError};
use crate::errors::{EvalError, Result};
use crate::model::{LlmResponse, Message};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

pub struct OpenAIClient {
    config: CompletionConfig,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        config.validate()?;
        if config.api_key.trim().is_empty() {
            return Err(EvalError::config("OpenAI API key is empty"));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| EvalError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(
        &self,
        messages: &[Message],
    ) -> std::result::Result<LlmResponse, UpstreamError> {
        let body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "max_tokens": self.config.max_tokens,
            "frequency_penalty": self.config.frequency_penalty,
            "presence_penalty": self.config.presence_penalty,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                provider: "openai",
                status: status.as_u16(),
                body: error_text,
            });
        }

        let json: serde_json::Value = resp.json().await?;

        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or(UpstreamError::MissingContent("openai"))?
            .to_string();

        Ok(LlmResponse {
            text,
            provider: "openai".to_string(),
            model: self.config.model.clone(),
            meta: json.get("usage").cloned().unwrap_or_else(|| json!({})),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
