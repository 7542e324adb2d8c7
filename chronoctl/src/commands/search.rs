//! Search command implementation

use crate::cli::{OutputFormat, SearchTypeArg};
use crate::client::ChronofactClient;
use crate::config::ChronoctlConfig;
use crate::output;
use chronofact_core::errors::CoreError;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

#[derive(Serialize)]
struct SearchBody {
    query: String,
    search_type: &'static str,
    max_results: usize,
    group_ids: Vec<String>,
    entity_types: Vec<String>,
    center_node_uuid: Option<Uuid>,
}

#[allow(clippy::too_many_arguments)]
pub async fn handle_search_command(
    config: &ChronoctlConfig,
    query: String,
    search_type: SearchTypeArg,
    max_results: usize,
    entity_type: Vec<String>,
    center_node_uuid: Option<Uuid>,
    format: &OutputFormat,
) -> Result<(), CoreError> {
    let client = ChronofactClient::new(config.clone())?;

    info!("Searching {} for '{}'", search_type_str(search_type), query);

    let group_ids = config.default_group_id.clone().into_iter().collect();

    let body = SearchBody {
        query,
        search_type: search_type_str(search_type),
        max_results,
        group_ids,
        entity_types: entity_type,
        center_node_uuid,
    };

    let response = client.post("/graph/search", &body).await?;
    let data: Value = client.handle_response(response).await?;

    let results: Vec<Value> = data.get("results").and_then(Value::as_array).cloned().unwrap_or_default();

    output::display_search_results(search_type_str(search_type), &results, format)
}

fn search_type_str(search_type: SearchTypeArg) -> &'static str {
    match search_type {
        SearchTypeArg::Facts => "facts",
        SearchTypeArg::Nodes => "nodes",
        SearchTypeArg::Episodes => "episodes",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_type_str_matches_wire_format() {
        assert_eq!(search_type_str(SearchTypeArg::Facts), "facts");
        assert_eq!(search_type_str(SearchTypeArg::Nodes), "nodes");
        assert_eq!(search_type_str(SearchTypeArg::Episodes), "episodes");
    }
}
