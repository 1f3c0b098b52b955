use crate::context::{ContextKeys, GradingCatalog};
use crate::errors::{EvalError, Result};
use crate::providers::llm::{CompletionConfig, DEFAULT_BASE_URL};
use crate::redaction::RedactionPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod path_resolver;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_FILE: &str = "appraise.yaml";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

const SAMPLE_CONFIG: &str = include_str!("../../../appraise.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppraiseConfig {
    pub version: u32,
    #[serde(default = "default_store")]
    pub store: String,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default = "default_keys")]
    pub defaults: ContextKeys,
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub redact_prompts: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Openai,
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSettings {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub frequency_penalty: f32,
    #[serde(default)]
    pub presence_penalty: f32,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Replies the fake provider returns in order before its fixed fallback.
    #[serde(default)]
    pub fake_responses: Vec<String>,
}

fn default_store() -> String {
    ".appraise/evaluations.db".to_string()
}

fn default_keys() -> ContextKeys {
    ContextKeys {
        award: "Performer of the Month".to_string(),
        tier: Some("Amn".to_string()),
        wing: Some("480 ISRW".to_string()),
        squadron: Some("30 IS".to_string()),
    }
}

fn default_model_name() -> String {
    CompletionConfig::default().model
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_temperature() -> f32 {
    CompletionConfig::default().temperature
}

fn default_top_p() -> f32 {
    CompletionConfig::default().top_p
}

fn default_max_tokens() -> u32 {
    CompletionConfig::default().max_tokens
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model_name(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            timeout_seconds: None,
            fake_responses: Vec::new(),
        }
    }
}

impl ModelSettings {
    /// Builds the client settings, pulling the credential through `lookup`
    /// (normally `std::env::var`). The fake provider needs no key.
    pub fn completion_config<F>(&self, lookup: F) -> Result<CompletionConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = match self.provider {
            Provider::Fake => String::new(),
            Provider::Openai => lookup(&self.api_key_env)
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    EvalError::config(format!(
                        "environment variable {} is not set",
                        self.api_key_env
                    ))
                })?,
        };
        let cfg = CompletionConfig {
            model: self.name.clone(),
            api_key,
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            frequency_penalty: self.frequency_penalty,
            presence_penalty: self.presence_penalty,
            timeout_seconds: self.timeout_seconds,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

impl Default for AppraiseConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            store: default_store(),
            model: ModelSettings::default(),
            defaults: default_keys(),
            catalog: None,
            redact_prompts: false,
        }
    }
}

impl AppraiseConfig {
    /// The configured catalog file, or the built-in one.
    pub fn load_catalog(&self) -> Result<GradingCatalog> {
        match &self.catalog {
            Some(path) => GradingCatalog::from_path(Path::new(path)),
            None => GradingCatalog::builtin(),
        }
    }

    pub fn redaction(&self) -> RedactionPolicy {
        RedactionPolicy::new(self.redact_prompts)
    }
}

pub fn parse_config(raw: &str) -> Result<AppraiseConfig> {
    let cfg: AppraiseConfig = serde_yaml::from_str(raw)
        .map_err(|e| EvalError::config(format!("failed to parse YAML: {}", e)))?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(EvalError::config(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    if cfg.store.trim().is_empty() {
        return Err(EvalError::config("store path is empty"));
    }
    if cfg.defaults.award.trim().is_empty() {
        return Err(EvalError::config("defaults.award is empty"));
    }
    Ok(cfg)
}

pub fn load_config(path: &Path) -> Result<AppraiseConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        EvalError::config(format!("failed to read config {}: {}", path.display(), e))
    })?;
    let mut cfg = parse_config(&raw)?;

    let r = path_resolver::PathResolver::new(path);
    r.resolve_in_place(&mut cfg.store);
    r.resolve_opt(&mut cfg.catalog);
    tracing::debug!(
        event = "config_loaded",
        path = %path.display(),
        store = %cfg.store,
        provider = ?cfg.model.provider
    );
    Ok(cfg)
}

/// Writes the sample config unless `path` already exists. Returns whether it wrote.
pub fn write_sample_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(path, SAMPLE_CONFIG)
        .map_err(|e| EvalError::config(format!("failed to write sample config: {}", e)))?;
    Ok(true)
}
