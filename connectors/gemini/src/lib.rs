//! Gemini connector: `LlmGateway` and `EmbedderGateway` implementations.

use async_trait::async_trait;
use chronofact_core::prelude::*;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info};

mod config;
mod models;

pub use config::{GeminiConfig, GeminiEmbedderConfig};
use models::*;

pub struct GeminiLlm {
    client: Client,
    config: GeminiConfig,
}

impl GeminiLlm {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::ConfigError(format!("failed to create http client: {e}")))?;

        Ok(Self { client, config })
    }

    fn build_request(&self, request: &GenerationRequest) -> ContentRequest {
        let mut contents: Vec<Content> = Vec::new();
        if let Some(system) = &request.system_prompt {
            contents.push(Content::new_user(system));
        }
        for m in &request.messages {
            contents.push(match m.role.as_str() {
                "assistant" | "model" => Content::new_model(&m.content),
                _ => Content::new_user(&m.content),
            });
        }

        let generation_config = Some(GenerationConfig {
            temperature: request.temperature.or(self.config.temperature),
            max_output_tokens: request.max_tokens.or(self.config.max_tokens),
            response_mime_type: request.response_schema.as_ref().map(|_| "application/json".to_string()),
        });

        ContentRequest { contents, generation_config, safety_settings: None }
    }

    fn calculate_cost(&self, usage: &UsageMetadata) -> Option<f64> {
        let (input_per_1k, output_per_1k) = match self.config.model.as_str() {
            "gemini-1.5-pro" => (0.00125, 0.005),
            "gemini-1.5-flash" => (0.000075, 0.0003),
            _ => (0.000125, 0.000375),
        };
        Some(
            (usage.prompt_token_count as f64 / 1000.0) * input_per_1k
                + (usage.candidates_token_count as f64 / 1000.0) * output_per_1k,
        )
    }
}

#[async_trait]
impl LlmGateway for GeminiLlm {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let start_time = Instant::now();
        let has_schema = request.response_schema.is_some();
        let body = self.build_request(&request);

        debug!("calling Gemini generateContent with model {}", self.config.model);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.api_base, self.config.model, self.config.api_key
        );

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::NetworkError(format!("HTTP request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            error!("Gemini API error {}: {}", status, error_text);
            return Err(LlmError::ApiError(format!("Gemini API error {status}: {error_text}")));
        }

        let content_response: ContentResponse =
            response.json().await.map_err(|e| LlmError::ResponseParseError(format!("failed to parse response: {e}")))?;

        let text = content_response
            .candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("\n"))
            .ok_or_else(|| LlmError::ResponseParseError("no candidates in response".into()))?;

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
        info!("Gemini generate completed in {}ms", latency.as_millis());

        Ok(GenerationResponse {
            text,
            parsed,
            metadata: GenerationMetadata {
                provider: "gemini".into(),
                model_name: self.config.model.clone(),
                latency_ms: Some(latency.as_millis() as u64),
                input_tokens: content_response.usage_metadata.as_ref().map(|u| u.prompt_token_count),
                output_tokens: content_response.usage_metadata.as_ref().map(|u| u.candidates_token_count),
                cost_usd: content_response.usage_metadata.as_ref().and_then(|u| self.calculate_cost(u)),
            },
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

pub struct GeminiEmbedder {
    client: Client,
    config: GeminiEmbedderConfig,
}

impl GeminiEmbedder {
    pub fn new(config: GeminiEmbedderConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| LlmError::ConfigError(format!("failed to create http client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl EmbedderGateway for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let embeddings = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        embeddings.into_iter().next().ok_or_else(|| LlmError::ResponseParseError("no embedding returned".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let requests = texts
            .iter()
            .map(|t| EmbedContentRequest { model: format!("models/{}", self.config.model), content: Content::new_user(t) })
            .collect();
        let body = BatchEmbedContentsRequest { requests };

        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.config.api_base, self.config.model, self.config.api_key
        );

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::NetworkError(format!("HTTP request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(LlmError::ApiError(format!("Gemini embeddings error {status}: {error_text}")));
        }

        let parsed: BatchEmbedContentsResponse =
            response.json().await.map_err(|e| LlmError::ResponseParseError(format!("failed to parse response: {e}")))?;

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_creation_succeeds() {
        let config = GeminiConfig::new("test-key");
        assert!(GeminiLlm::new(config).is_ok());
    }

    #[test]
    fn request_sets_json_mime_type_when_schema_present() {
        let config = GeminiConfig::new("test-key");
        let llm = GeminiLlm::new(config).unwrap();
        let request = GenerationRequest::new(vec![LlmMessage::user("hello")])
            .with_response_schema(serde_json::json!({"type": "object"}));
        let body = llm.build_request(&request);
        assert_eq!(body.generation_config.unwrap().response_mime_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn embedder_reports_configured_dimensions() {
        let config = GeminiEmbedderConfig::new("test-key");
        let embedder = GeminiEmbedder::new(config).unwrap();
        assert_eq!(embedder.dimensions(), 768);
    }
}
