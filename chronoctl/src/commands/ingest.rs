//! Episode ingestion command implementation

use crate::cli::EpisodeSourceArg;
use crate::client::ChronofactClient;
use crate::config::ChronoctlConfig;
use crate::output;
use chronofact_core::errors::CoreError;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

#[derive(Serialize)]
struct AddEpisodeBody {
    name: String,
    content: String,
    group_id: Option<String>,
    source: &'static str,
    source_description: String,
    source_url: Option<String>,
    uuid: Option<Uuid>,
}

#[allow(clippy::too_many_arguments)]
pub async fn handle_ingest_command(
    config: &ChronoctlConfig,
    name: String,
    content: String,
    source: EpisodeSourceArg,
    source_description: Option<String>,
    source_url: Option<String>,
    uuid: Option<Uuid>,
    format: &crate::cli::OutputFormat,
) -> Result<(), CoreError> {
    let client = ChronofactClient::new(config.clone())?;

    info!("Submitting episode '{}' to {}", name, config.endpoint);

    let body = AddEpisodeBody {
        name,
        content,
        group_id: config.default_group_id.clone(),
        source: source_str(source),
        source_description: source_description.unwrap_or_default(),
        source_url,
        uuid,
    };

    let response = client.post("/graph/episodes", &body).await?;
    let data: Value = client.handle_response(response).await?;

    let episode_name = data.get("episode_name").and_then(Value::as_str).unwrap_or("");
    let group_id = data.get("group_id").and_then(Value::as_str).unwrap_or("");
    let message = data.get("message").and_then(Value::as_str).unwrap_or("");

    output::display_episode_added(episode_name, group_id, message, format)
}

fn source_str(source: EpisodeSourceArg) -> &'static str {
    match source {
        EpisodeSourceArg::Text => "text",
        EpisodeSourceArg::Json => "json",
        EpisodeSourceArg::Message => "message",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_str_matches_episode_source_wire_format() {
        assert_eq!(source_str(EpisodeSourceArg::Text), "text");
        assert_eq!(source_str(EpisodeSourceArg::Json), "json");
        assert_eq!(source_str(EpisodeSourceArg::Message), "message");
    }
}
