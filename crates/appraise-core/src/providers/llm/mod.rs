use crate::errors::{EvalError, Result};
use crate::model::{LlmResponse, Message};
use async_trait::async_trait;

pub mod fake;
pub mod openai;

/// Why a completion call produced no response text.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} API error (status {status}): {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{0} API response missing content")]
    MissingContent(&'static str),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// A single blocking-until-done text completion: messages in, top completion out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
    ) -> std::result::Result<LlmResponse, UpstreamError>;
    fn provider_name(&self) -> &'static str;
}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Sampling and transport settings owned by one client instance.
#[derive(Clone)]
pub struct CompletionConfig {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub timeout_seconds: Option<u64>,
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .field("frequency_penalty", &self.frequency_penalty)
            .field("presence_penalty", &self.presence_penalty)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 1000,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            timeout_seconds: None,
        }
    }
}

impl CompletionConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(EvalError::config("model name is empty"));
        }
        if self.max_tokens == 0 {
            return Err(EvalError::config("max_tokens must be positive"));
        }
        for (name, v) in [
            ("temperature", self.temperature),
            ("top_p", self.top_p),
            ("frequency_penalty", self.frequency_penalty),
            ("presence_penalty", self.presence_penalty),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(EvalError::config(format!(
                    "{} must be in [0, 1], got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        CompletionConfig::default().validate().unwrap();
    }

    #[test]
    fn test_out_of_range_rejected() {
        let cfg = CompletionConfig::default().with_temperature(1.5);
        assert!(matches!(
            cfg.validate(),
            Err(EvalError::InvalidConfiguration(_))
        ));

        let cfg = CompletionConfig {
            max_tokens: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = CompletionConfig::default().with_model("  ");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let cfg = CompletionConfig::default().with_api_key("sk-secret");
        let dbg = format!("{:?}", cfg);
        assert!(!dbg.contains("sk-secret"));
    }
}
