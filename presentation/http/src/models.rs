//! Request/response bodies for the `/graph/*` REST surface.

use chronofact_core::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AddEpisodeBody {
    pub name: String,
    pub content: String,
    pub group_id: Option<String>,
    #[serde(default = "default_source")]
    pub source: EpisodeSource,
    #[serde(default)]
    pub source_description: String,
    pub source_url: Option<String>,
    pub uuid: Option<Uuid>,
}

fn default_source() -> EpisodeSource {
    EpisodeSource::Text
}

#[derive(Debug, Serialize)]
pub struct AddEpisodeResponseBody {
    pub status: String,
    pub message: String,
    pub episode_name: String,
    pub group_id: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTypeBody {
    Facts,
    Nodes,
    Episodes,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub query: String,
    pub search_type: SearchTypeBody,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub entity_types: Vec<String>,
    pub center_node_uuid: Option<Uuid>,
}

fn default_max_results() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct SearchResponseBody {
    pub message: String,
    pub search_type: &'static str,
    pub results: Vec<serde_json::Value>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteEpisodeResponseBody {
    pub status: String,
    pub uuid: Uuid,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFactBody {
    pub fact: String,
    pub source_node_uuid: Option<Uuid>,
    pub target_node_uuid: Option<Uuid>,
    pub update_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateFactResponseBody {
    pub status: String,
    pub old_uuid: Uuid,
    pub new_uuid: Uuid,
    pub message: String,
    pub new_edge: EntityEdge,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct TimelineQuery {
    pub component: Option<String>,
    pub category: Option<String>,
    pub group_ids: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecurringQuery {
    #[serde(default = "default_min_occurrences")]
    pub min_occurrences: usize,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    #[serde(default)]
    pub use_llm: bool,
    pub group_ids: Option<String>,
}

fn default_min_occurrences() -> usize {
    2
}

fn default_similarity_threshold() -> f32 {
    0.75
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ComponentImpactQuery {
    #[serde(default = "default_min_incidents")]
    pub min_incidents: usize,
    pub category_filter: Option<String>,
    pub component_filter: Option<String>,
    pub group_ids: Option<String>,
}

fn default_min_incidents() -> usize {
    2
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ComponentSeverityQuery {
    #[serde(default = "default_min_incidents")]
    pub min_incidents: usize,
    pub component_filter: Option<String>,
    pub group_ids: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FlowMetricsQuery {
    #[serde(default = "default_min_flow_count")]
    pub min_flow_count: usize,
    pub category_filter: Option<String>,
    pub group_ids: Option<String>,
}

fn default_min_flow_count() -> usize {
    2
}

pub fn parse_group_ids(raw: &Option<String>) -> Vec<GroupId> {
    raw.as_ref()
        .map(|s| s.split(',').filter(|g| !g.is_empty()).map(GroupId::new).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_group_ids() {
        let raw = Some("a,b,c".to_string());
        let ids = parse_group_ids(&raw);
        assert_eq!(ids, vec![GroupId::new("a"), GroupId::new("b"), GroupId::new("c")]);
    }

    #[test]
    fn empty_query_param_yields_no_group_ids() {
        assert!(parse_group_ids(&None).is_empty());
    }
}
