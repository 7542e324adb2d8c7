//! Configuration management for chronoctl

use crate::cli::{Cli, OutputFormat};
use chronofact_core::errors::CoreError;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the chronoctl CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChronoctlConfig {
    /// chronofact HTTP API endpoint
    pub endpoint: String,
    /// Default group_id (namespace) for reads and writes
    pub default_group_id: Option<String>,
    /// Default output format
    pub default_format: OutputFormat,
    /// Bearer token, if the deployment fronts the API with one
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for ChronoctlConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            default_group_id: None,
            default_format: OutputFormat::Table,
            auth_token: None,
            timeout: 30,
        }
    }
}

impl ChronoctlConfig {
    /// Load configuration from file and environment
    pub async fn load(config_path: &Option<std::path::PathBuf>) -> Result<Self, CoreError> {
        let mut figment = Figment::new();

        let default_config_paths = ["chronoctl.yaml", "chronoctl.yml", ".chronoctl.yaml", ".chronoctl.yml"];

        for path in &default_config_paths {
            if Path::new(path).exists() {
                figment = figment.merge(Yaml::file(path));
                break;
            }
        }

        if let Some(path) = config_path {
            if path.exists() {
                figment = figment.merge(Yaml::file(path));
            } else {
                return Err(CoreError::Configuration(format!("configuration file not found: {}", path.display())));
            }
        }

        figment = figment.merge(Env::prefixed("CHRONOCTL_"));

        figment.extract().map_err(|e| CoreError::Configuration(format!("failed to parse configuration: {e}")))
    }

    /// Apply CLI argument overrides to the configuration
    pub fn with_overrides(mut self, args: &Cli) -> Self {
        if let Some(ref endpoint) = args.endpoint {
            self.endpoint = endpoint.clone();
        }

        if let Some(ref group_id) = args.group_id {
            self.default_group_id = Some(group_id.clone());
        }

        if let Some(ref format) = args.format {
            self.default_format = format.clone();
        }

        self
    }

    /// Base URL for a chronofact API path
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }

    /// Authentication headers, if a token is configured
    pub fn auth_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();

        if let Some(ref token) = self.auth_token {
            if let Ok(value) = format!("Bearer {token}").parse() {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn default_config_targets_localhost() {
        let config = ChronoctlConfig::default();
        assert_eq!(config.endpoint, "http://localhost:8000");
        assert_eq!(config.timeout, 30);
    }

    #[tokio::test]
    async fn config_loads_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "endpoint: http://example.com:9000").unwrap();
        writeln!(temp_file, "default_group_id: prod").unwrap();
        writeln!(temp_file, "timeout: 60").unwrap();

        let config = ChronoctlConfig::load(&Some(temp_file.path().to_path_buf())).await.unwrap();
        assert_eq!(config.endpoint, "http://example.com:9000");
        assert_eq!(config.default_group_id, Some("prod".to_string()));
        assert_eq!(config.timeout, 60);
    }

    #[test]
    fn api_url_joins_endpoint_and_path() {
        let config = ChronoctlConfig::default();
        assert_eq!(config.api_url("/graph/episodes"), "http://localhost:8000/graph/episodes");

        let config = ChronoctlConfig { endpoint: "http://example.com/".to_string(), ..Default::default() };
        assert_eq!(config.api_url("/graph/episodes"), "http://example.com/graph/episodes");
    }
}
