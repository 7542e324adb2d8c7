//! Anthropic connector: `LlmGateway` implementation.

use async_trait::async_trait;
use chronofact_core::prelude::*;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info};

mod config;
mod models;

pub use config::AnthropicConfig;
use models::*;

pub struct AnthropicLlm {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicLlm {
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::ConfigError(format!("failed to create http client: {e}")))?;

        Ok(Self { client, config })
    }

    fn build_request(&self, request: &GenerationRequest) -> MessageRequest {
        let messages: Vec<Message> = request
            .messages
            .iter()
            .map(|m| match m.role.as_str() {
                "assistant" => Message::new_assistant(&m.content),
                _ => Message::new_user(&m.content),
            })
            .collect();

        let response_format = request
            .response_schema
            .is_some()
            .then(|| ResponseFormat { format_type: "json_object".to_string() });

        MessageRequest {
            model: self.config.model.clone(),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens.or(self.config.max_tokens),
            temperature: request.temperature.or(self.config.temperature),
            response_format,
        }
    }

    fn calculate_cost(&self, usage: &Usage) -> Option<f64> {
        let (input_per_1k, output_per_1k) = match self.config.model.as_str() {
            "claude-3-opus" => (0.015, 0.075),
            "claude-3-sonnet" => (0.003, 0.015),
            "claude-3-haiku" => (0.00025, 0.00125),
            _ => (0.003, 0.015),
        };
        Some((usage.input_tokens as f64 / 1000.0) * input_per_1k + (usage.output_tokens as f64 / 1000.0) * output_per_1k)
    }
}

#[async_trait]
impl LlmGateway for AnthropicLlm {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let start_time = Instant::now();
        let has_schema = request.response_schema.is_some();
        let body = self.build_request(&request);

        debug!("calling Anthropic messages API with model {}", self.config.model);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.api_base))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
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
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            error!("Anthropic API error {}: {}", status, error_text);
            return Err(LlmError::ApiError(format!("Anthropic API error {status}: {error_text}")));
        }

        let message_response: MessageResponse =
            response.json().await.map_err(|e| LlmError::ResponseParseError(format!("failed to parse response: {e}")))?;

        let text = message_response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(LlmError::ResponseParseError("no content in response".into()));
        }

        let parsed = if has_schema {
            let cleaned = text.trim_start_matches("```json").trim_start_matches("```").trim_end_matches("```").trim();
            Some(
                serde_json::from_str(cleaned)
                    .map_err(|e| LlmError::SchemaValidationError(format!("response did not match schema: {e}")))?,
            )
        } else {
            None
        };

        let latency = start_time.elapsed();
        info!("Anthropic generate completed in {}ms", latency.as_millis());

        Ok(GenerationResponse {
            text,
            parsed,
            metadata: GenerationMetadata {
                provider: "anthropic".into(),
                model_name: self.config.model.clone(),
                latency_ms: Some(latency.as_millis() as u64),
                input_tokens: message_response.usage.as_ref().map(|u| u.input_tokens),
                output_tokens: message_response.usage.as_ref().map(|u| u.output_tokens),
                cost_usd: message_response.usage.as_ref().and_then(|u| self.calculate_cost(u)),
            },
        })
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_creation_succeeds() {
        let config = AnthropicConfig::new("test-key");
        assert!(AnthropicLlm::new(config).is_ok());
    }

    #[test]
    fn request_carries_system_prompt_and_schema_hint() {
        let config = AnthropicConfig::new("test-key");
        let llm = AnthropicLlm::new(config).unwrap();
        let request = GenerationRequest::new(vec![LlmMessage::user("hello")])
            .with_system_prompt("be terse")
            .with_response_schema(serde_json::json!({"type": "object"}));
        let body = llm.build_request(&request);
        assert_eq!(body.system.as_deref(), Some("be terse"));
        assert!(body.response_format.is_some());
    }

    #[test]
    fn request_without_schema_has_no_response_format() {
        let config = AnthropicConfig::new("test-key");
        let llm = AnthropicLlm::new(config).unwrap();
        let request = GenerationRequest::new(vec![LlmMessage::user("hello")]);
        let body = llm.build_request(&request);
        assert!(body.response_format.is_none());
    }
}
