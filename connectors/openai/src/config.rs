//! Configuration for the OpenAI connector.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub small_model: String,
    pub api_base: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Request timeout. Default 300s, matching the corporate proxy's
    /// queueing behavior under load.
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub proxy: Option<ProxyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub no_proxy: Option<String>,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            small_model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            max_tokens: Some(4096),
            temperature: Some(0.0),
            timeout_secs: 300,
            max_retries: 3,
            proxy: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// gpt-5/o1/o3/o4 reasoning models reject `temperature` and use
    /// `max_completion_tokens` instead of `max_tokens`.
    pub fn is_reasoning_model(model: &str) -> bool {
        model.starts_with("gpt-5") || model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4")
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiEmbedderConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
    pub proxy: Option<ProxyConfig>,
}

impl OpenAiEmbedderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "text-embedding-3-small".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            dimensions: 1536,
            timeout_secs: 300,
            proxy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_model_detection() {
        assert!(OpenAiConfig::is_reasoning_model("gpt-5"));
        assert!(OpenAiConfig::is_reasoning_model("gpt-5-mini"));
        assert!(OpenAiConfig::is_reasoning_model("o1-preview"));
        assert!(OpenAiConfig::is_reasoning_model("o3"));
        assert!(OpenAiConfig::is_reasoning_model("o4-mini"));
        assert!(!OpenAiConfig::is_reasoning_model("gpt-4o"));
        assert!(!OpenAiConfig::is_reasoning_model("gpt-3.5-turbo"));
    }
}
