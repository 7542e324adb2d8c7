//! Health check command implementation

use crate::client::{ChronofactClient, HealthResponse};
use crate::config::ChronoctlConfig;
use crate::output;
use chronofact_core::errors::CoreError;
use tracing::info;

pub async fn handle_health_command(config: &ChronoctlConfig) -> Result<(), CoreError> {
    let client = ChronofactClient::new(config.clone())?;

    info!("Checking chronofact health at {}", config.endpoint);

    let response = client.get("/health").await?;
    match client.handle_response::<HealthResponse>(response).await {
        Ok(health) => {
            output::display_health(true, &health.status, "");
            Ok(())
        }
        Err(e) => {
            output::display_health(false, "", &e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_command_fails_without_a_live_server() {
        let config = ChronoctlConfig::default();
        let result = handle_health_command(&config).await;
        assert!(result.is_err());
    }
}
