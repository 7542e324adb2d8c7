//! Fact mutation command implementations

use crate::cli::{FactsCommands, OutputFormat};
use crate::client::ChronofactClient;
use crate::config::ChronoctlConfig;
use crate::output;
use chronofact_core::errors::CoreError;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

#[derive(Serialize)]
struct UpdateFactBody {
    fact: String,
    source_node_uuid: Option<uuid::Uuid>,
    target_node_uuid: Option<uuid::Uuid>,
    update_reason: Option<String>,
}

pub async fn handle_facts_command(command: FactsCommands, config: &ChronoctlConfig, format: &OutputFormat) -> Result<(), CoreError> {
    match command {
        FactsCommands::Update { uuid, fact, source_node_uuid, target_node_uuid, reason } => {
            let client = ChronofactClient::new(config.clone())?;

            info!("Correcting fact {}", uuid);

            let body = UpdateFactBody {
                fact: fact.clone(),
                source_node_uuid,
                target_node_uuid,
                update_reason: reason,
            };

            let response = client.patch(&format!("/graph/facts/{uuid}"), &body).await?;
            let data: Value = client.handle_response(response).await?;

            let old_uuid = data.get("old_uuid").and_then(Value::as_str).unwrap_or("");
            let new_uuid = data.get("new_uuid").and_then(Value::as_str).unwrap_or("");

            output::display_fact_updated(old_uuid, new_uuid, &fact, format)
        }
    }
}
