//! HTTP client for the chronofact REST API

use crate::config::ChronoctlConfig;
use chronofact_core::errors::CoreError;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Thin REST client for `/graph/*` operations
pub struct ChronofactClient {
    client: Client,
    config: ChronoctlConfig,
}

impl ChronofactClient {
    pub fn new(config: ChronoctlConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .default_headers(config.auth_headers())
            .build()
            .map_err(|e| CoreError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub async fn get(&self, path: &str) -> Result<Response, CoreError> {
        let url = self.config.api_url(path);
        debug!("GET {}", url);

        self.client.get(&url).send().await.map_err(|e| CoreError::Internal(format!("HTTP GET failed: {e}")))
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response, CoreError> {
        let url = self.config.api_url(path);
        debug!("POST {}", url);

        self.client.post(&url).json(body).send().await.map_err(|e| CoreError::Internal(format!("HTTP POST failed: {e}")))
    }

    pub async fn patch<T: Serialize>(&self, path: &str, body: &T) -> Result<Response, CoreError> {
        let url = self.config.api_url(path);
        debug!("PATCH {}", url);

        self.client.patch(&url).json(body).send().await.map_err(|e| CoreError::Internal(format!("HTTP PATCH failed: {e}")))
    }

    pub async fn delete(&self, path: &str) -> Result<Response, CoreError> {
        let url = self.config.api_url(path);
        debug!("DELETE {}", url);

        self.client.delete(&url).send().await.map_err(|e| CoreError::Internal(format!("HTTP DELETE failed: {e}")))
    }

    /// Parse an `ApiResponse<T>` envelope, surfacing the server's error message on failure.
    pub async fn handle_response<T: for<'de> Deserialize<'de>>(&self, response: Response) -> Result<T, CoreError> {
        let status = response.status();

        if status.is_success() {
            let envelope: ApiEnvelope<T> = response
                .json()
                .await
                .map_err(|e| CoreError::Internal(format!("failed to parse JSON response: {e}")))?;
            envelope.data.ok_or_else(|| CoreError::Internal("response carried no data".to_string()))
        } else {
            let body: ApiEnvelope<serde_json::Value> =
                response.json().await.unwrap_or(ApiEnvelope { success: false, data: None, error: None, timestamp: String::new() });
            let message = body.error.unwrap_or_else(|| format!("HTTP {status}"));
            error!("API error {}: {}", status, message);
            Err(CoreError::Internal(message))
        }
    }

    pub fn config(&self) -> &ChronoctlConfig {
        &self.config
    }
}

/// Mirrors `chronofact_http::ApiResponse<T>`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_succeeds_with_default_config() {
        let config = ChronoctlConfig::default();
        let client = ChronofactClient::new(config);
        assert!(client.is_ok());
    }
}
