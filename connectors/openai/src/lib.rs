//! OpenAI connector: `LlmGateway` and `EmbedderGateway` implementations.

use async_trait::async_trait;
use chronofact_core::prelude::*;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info};

mod config;
mod models;

pub use config::{OpenAiConfig, OpenAiEmbedderConfig, ProxyConfig};
use models::*;

fn build_client(timeout_secs: u64, proxy: Option<&ProxyConfig>) -> Result<Client, LlmError> {
    let mut builder = Client::builder().timeout(std::time::Duration::from_secs(timeout_secs));

    if let Some(proxy_cfg) = proxy {
        let mut proxy_url = proxy_cfg.url.clone();
        if let (Some(user), Some(pass)) = (&proxy_cfg.username, &proxy_cfg.password) {
            if let Some((scheme, rest)) = proxy_url.split_once("://") {
                proxy_url = format!("{scheme}://{user}:{pass}@{rest}");
            }
        }
        let mut proxy = reqwest::Proxy::all(&proxy_url)
            .map_err(|e| LlmError::ConfigError(format!("invalid proxy url: {e}")))?;
        if let Some(no_proxy) = &proxy_cfg.no_proxy {
            proxy = proxy.no_proxy(reqwest::NoProxy::from_string(no_proxy));
        }
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| LlmError::ConfigError(format!("failed to build http client: {e}")))
}

pub struct OpenAiLlm {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiLlm {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = build_client(config.timeout_secs, config.proxy.as_ref())?;
        Ok(Self { client, config })
    }

    fn build_request(&self, request: &GenerationRequest) -> ChatCompletionRequest {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(OpenAiMessage { role: "system".into(), content: system.clone() });
        }
        for m in &request.messages {
            messages.push(OpenAiMessage { role: m.role.clone(), content: m.content.clone() });
        }

        let is_reasoning = OpenAiConfig::is_reasoning_model(&self.config.model);
        let tokens = request.max_tokens.or(self.config.max_tokens);

        let response_format = request.response_schema.as_ref().map(|schema| {
            let mut schema = schema.clone();
            strictify_schema(&mut schema);
            ResponseFormat::JsonSchema {
                json_schema: JsonSchemaSpec { name: "response".to_string(), schema, strict: true },
            }
        });

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: if is_reasoning { None } else { tokens },
            max_completion_tokens: if is_reasoning { tokens } else { None },
            temperature: if is_reasoning { None } else { request.temperature.or(self.config.temperature) },
            response_format,
        }
    }

    fn calculate_cost(&self, usage: &Usage) -> Option<f64> {
        let (input_per_1k, output_per_1k) = match self.config.model.as_str() {
            "gpt-4o" => (0.0025, 0.01),
            "gpt-4o-mini" => (0.00015, 0.0006),
            "gpt-4-turbo" => (0.01, 0.03),
            _ => (0.0025, 0.01),
        };
        Some((usage.prompt_tokens as f64 / 1000.0) * input_per_1k + (usage.completion_tokens as f64 / 1000.0) * output_per_1k)
    }
}

#[async_trait]
impl LlmGateway for OpenAiLlm {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let start = Instant::now();
        let has_schema = request.response_schema.is_some();
        let body = self.build_request(&request);

        debug!("calling OpenAI chat completions with model {}", self.config.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(format!("HTTP request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("OpenAI API error {}: {}", status, text);
            return Err(LlmError::ApiError(format!("OpenAI API error {status}: {text}")));
        }

        let chat_response: ChatCompletionResponse =
            response.json().await.map_err(|e| LlmError::ResponseParseError(format!("failed to parse response: {e}")))?;

        let content = chat_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| LlmError::ResponseParseError("no content in response".into()))?;

        let parsed = if has_schema {
            Some(
                serde_json::from_str(content.trim_start_matches("```json").trim_start_matches("```").trim_end_matches("```").trim())
                    .map_err(|e| LlmError::SchemaValidationError(format!("response did not match schema: {e}")))?,
            )
        } else {
            None
        };

        let latency = start.elapsed();
        info!("OpenAI generate completed in {}ms", latency.as_millis());

        Ok(GenerationResponse {
            text: content,
            parsed,
            metadata: GenerationMetadata {
                provider: "openai".into(),
                model_name: self.config.model.clone(),
                latency_ms: Some(latency.as_millis() as u64),
                input_tokens: chat_response.usage.as_ref().map(|u| u.prompt_tokens),
                output_tokens: chat_response.usage.as_ref().map(|u| u.completion_tokens),
                cost_usd: chat_response.usage.as_ref().and_then(|u| self.calculate_cost(u)),
            },
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiEmbedderConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiEmbedderConfig) -> Result<Self, LlmError> {
        let client = build_client(config.timeout_secs, config.proxy.as_ref())?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl EmbedderGateway for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let embeddings = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ResponseParseError("no embedding returned".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = EmbeddingRequest { model: self.config.model.clone(), input: texts.to_vec() };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::NetworkError(format!("HTTP request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(format!("OpenAI embeddings error {status}: {text}")));
        }

        let mut parsed: EmbeddingResponse =
            response.json().await.map_err(|e| LlmError::ResponseParseError(format!("failed to parse response: {e}")))?;

        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_model_request_drops_temperature() {
        let config = OpenAiConfig::new("test-key").with_model("gpt-5");
        let llm = OpenAiLlm::new(config).unwrap();
        let request = GenerationRequest::new(vec![LlmMessage::user("hi")]).with_temperature(0.7).with_max_tokens(100);
        let body = llm.build_request(&request);
        assert!(body.temperature.is_none());
        assert_eq!(body.max_completion_tokens, Some(100));
        assert!(body.max_tokens.is_none());
    }

    #[test]
    fn standard_model_request_keeps_temperature() {
        let config = OpenAiConfig::new("test-key").with_model("gpt-4o");
        let llm = OpenAiLlm::new(config).unwrap();
        let request = GenerationRequest::new(vec![LlmMessage::user("hi")]).with_temperature(0.5).with_max_tokens(100);
        let body = llm.build_request(&request);
        assert_eq!(body.temperature, Some(0.5));
        assert_eq!(body.max_tokens, Some(100));
        assert!(body.max_completion_tokens.is_none());
    }
}
