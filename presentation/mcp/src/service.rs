//! Dispatch-by-tool-name service implementation, mirroring `AppState`'s
//! access pattern in the HTTP layer but driven off a single `ToolCall`.

use crate::protocol::{ToolCall, ToolResult};
use chronofact_core::config::Services;
use chronofact_core::extraction::AddEpisodeRequest;
use chronofact_core::prelude::*;
use chronofact_core::search::SearchFilters;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use uuid::Uuid;

#[derive(Clone)]
pub struct McpService {
    services: Arc<Services>,
}

impl McpService {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    pub async fn dispatch(&self, call: ToolCall) -> ToolResult {
        let id = call.id.clone();
        let outcome = match call.tool.as_str() {
            "add_memory" => self.add_memory(call.params).await,
            "search_nodes" => self.search_nodes(call.params).await,
            "search_memory_facts" => self.search_memory_facts(call.params).await,
            "search_with_citations" => self.search_memory_facts(call.params).await,
            "get_citation_chain_tool" => self.get_citation_chain_tool(call.params).await,
            "delete_entity_edge" => self.delete_entity_edge(call.params).await,
            "delete_episode" => self.delete_episode(call.params).await,
            "get_entity_edge" => self.get_entity_edge(call.params).await,
            "get_episodes" => self.get_episodes(call.params).await,
            "clear_graph" => self.clear_graph(call.params).await,
            "get_status" => self.get_status().await,
            other => Err((404, format!("unknown tool: {other}"))),
        };

        match outcome {
            Ok(result) => ToolResult::ok(id, result),
            Err((code, message)) => ToolResult::err(id, code, message),
        }
    }

    async fn add_memory(&self, params: Value) -> Result<Value, (i32, String)> {
        #[derive(Deserialize)]
        struct Params {
            name: String,
            content: String,
            group_id: Option<String>,
            #[serde(default = "default_source")]
            source: EpisodeSource,
            #[serde(default)]
            source_description: String,
            source_url: Option<String>,
            uuid: Option<Uuid>,
        }

        let p: Params = serde_json::from_value(params).map_err(bad_request)?;
        let group_id = self
            .services
            .group_resolver()
            .resolve_one(p.group_id.map(GroupId::new))
            .ok_or_else(|| (500, "no group_id provided and no default configured".to_string()))?;

        let request = AddEpisodeRequest {
            group_id: group_id.clone(),
            name: p.name.clone(),
            content: p.content,
            source: p.source,
            source_description: p.source_description,
            source_url: p.source_url,
            uuid: p.uuid,
            reference_time: None,
            entity_types: self.services.config.graphiti.entity_types.clone(),
        };

        let episode_uuid = self.services.queue.add_episode(request);
        Ok(json!({"episode_uuid": episode_uuid, "episode_name": p.name, "group_id": group_id.to_string()}))
    }

    async fn search_nodes(&self, params: Value) -> Result<Value, (i32, String)> {
        let (query, filters, max_results) = parse_search_params(&self.services, params)?;
        let hits = self
            .services
            .search
            .search_nodes(&query, &filters, max_results)
            .await
            .map_err(core_error)?;
        Ok(json!({"results": hits, "count": hits.len()}))
    }

    async fn search_memory_facts(&self, params: Value) -> Result<Value, (i32, String)> {
        let (query, filters, max_results) = parse_search_params(&self.services, params)?;
        let hits = self
            .services
            .search
            .search_facts(&query, &filters, max_results)
            .await
            .map_err(core_error)?;
        Ok(json!({"results": hits, "count": hits.len()}))
    }

    async fn get_citation_chain_tool(&self, params: Value) -> Result<Value, (i32, String)> {
        #[derive(Deserialize)]
        struct Params {
            entity_uuid: Option<Uuid>,
            edge_uuid: Option<Uuid>,
        }

        let p: Params = serde_json::from_value(params).map_err(bad_request)?;

        if let Some(entity_uuid) = p.entity_uuid {
            let chain = self
                .services
                .facts
                .citation_chain_for_entity(entity_uuid)
                .await
                .map_err(core_error)?;
            return Ok(json!({"chain": chain}));
        }

        if let Some(edge_uuid) = p.edge_uuid {
            let edge = self
                .services
                .store
                .get_edge(edge_uuid)
                .await
                .map_err(|e| core_error(CoreError::Storage(e)))?
                .ok_or_else(|| (404, format!("edge {edge_uuid} not found")))?;
            let chain = self.services.facts.citation_chain_for_edge(&edge).await.map_err(core_error)?;
            return Ok(json!({"chain": chain}));
        }

        Err((400, "one of entity_uuid or edge_uuid is required".to_string()))
    }

    async fn delete_entity_edge(&self, params: Value) -> Result<Value, (i32, String)> {
        let uuid = parse_uuid_param(&params)?;
        let deleted = self
            .services
            .store
            .delete_edge(uuid)
            .await
            .map_err(|e| core_error(CoreError::Storage(e)))?;
        if !deleted {
            return Err((404, format!("edge {uuid} not found")));
        }
        Ok(json!({"status": "deleted", "uuid": uuid}))
    }

    async fn delete_episode(&self, params: Value) -> Result<Value, (i32, String)> {
        let uuid = parse_uuid_param(&params)?;
        let deleted = self
            .services
            .store
            .delete_episode(uuid)
            .await
            .map_err(|e| core_error(CoreError::Storage(e)))?;
        if !deleted {
            return Err((404, format!("episode {uuid} not found")));
        }
        Ok(json!({"status": "deleted", "uuid": uuid}))
    }

    async fn get_entity_edge(&self, params: Value) -> Result<Value, (i32, String)> {
        let uuid = parse_uuid_param(&params)?;
        let edge = self
            .services
            .store
            .get_edge(uuid)
            .await
            .map_err(|e| core_error(CoreError::Storage(e)))?
            .ok_or_else(|| (404, format!("edge {uuid} not found")))?;
        Ok(json!({"edge": edge}))
    }

    async fn get_episodes(&self, params: Value) -> Result<Value, (i32, String)> {
        #[derive(Deserialize, Default)]
        struct Params {
            #[serde(default)]
            group_ids: Vec<String>,
            max_results: Option<usize>,
        }

        let p: Params = if params.is_null() { Params::default() } else { serde_json::from_value(params).map_err(bad_request)? };
        let group_ids = self.services.group_resolver().resolve(&p.group_ids.into_iter().map(GroupId::new).collect::<Vec<_>>());
        let filters = SearchFilters { group_ids, entity_type_labels: Vec::new(), center_node_uuid: None };
        let episodes = self
            .services
            .search
            .search_episodes(&filters, p.max_results.unwrap_or(50))
            .await
            .map_err(core_error)?;
        Ok(json!({"episodes": episodes, "count": episodes.len()}))
    }

    /// Deletes every episode and current edge in the given namespaces. Leaves
    /// orphaned entity nodes behind; `GraphStore` exposes no entity deletion.
    async fn clear_graph(&self, params: Value) -> Result<Value, (i32, String)> {
        #[derive(Deserialize)]
        struct Params {
            group_ids: Vec<String>,
        }

        let p: Params = serde_json::from_value(params).map_err(bad_request)?;
        if p.group_ids.is_empty() {
            return Err((400, "group_ids is required for clear_graph".to_string()));
        }
        let group_ids: Vec<GroupId> = p.group_ids.into_iter().map(GroupId::new).collect();

        let episodes = self.services.store.list_episodes(&group_ids, 100_000).await.map_err(|e| core_error(CoreError::Storage(e)))?;
        let mut episodes_deleted = 0usize;
        for episode in &episodes {
            if self.services.store.delete_episode(episode.uuid).await.map_err(|e| core_error(CoreError::Storage(e)))? {
                episodes_deleted += 1;
            }
        }

        let edges = self.services.store.find_edges_by_group(&group_ids, 100_000).await.map_err(|e| core_error(CoreError::Storage(e)))?;
        let mut edges_deleted = 0usize;
        for edge in &edges {
            if self.services.store.delete_edge(edge.uuid).await.map_err(|e| core_error(CoreError::Storage(e)))? {
                edges_deleted += 1;
            }
        }

        Ok(json!({"episodes_deleted": episodes_deleted, "edges_deleted": edges_deleted}))
    }

    async fn get_status(&self) -> Result<Value, (i32, String)> {
        let healthy = self.services.store.health_check().await.is_ok();
        let stats = self.services.queue.stats();
        Ok(json!({
            "status": if healthy { "healthy" } else { "unhealthy" },
            "queue": {
                "submitted": stats.submitted.load(Ordering::Relaxed),
                "succeeded": stats.succeeded.load(Ordering::Relaxed),
                "failed": stats.failed.load(Ordering::Relaxed),
            },
        }))
    }
}

fn default_source() -> EpisodeSource {
    EpisodeSource::Text
}

fn parse_search_params(services: &Services, params: Value) -> Result<(String, SearchFilters, usize), (i32, String)> {
    #[derive(Deserialize)]
    struct Params {
        query: String,
        #[serde(default)]
        group_ids: Vec<String>,
        #[serde(default)]
        entity_types: Vec<String>,
        center_node_uuid: Option<Uuid>,
        max_results: Option<usize>,
    }

    let p: Params = serde_json::from_value(params).map_err(bad_request)?;
    let group_ids = services.group_resolver().resolve(&p.group_ids.into_iter().map(GroupId::new).collect::<Vec<_>>());
    let filters = SearchFilters { group_ids, entity_type_labels: p.entity_types, center_node_uuid: p.center_node_uuid };
    Ok((p.query, filters, p.max_results.unwrap_or(10)))
}

fn parse_uuid_param(params: &Value) -> Result<Uuid, (i32, String)> {
    params
        .get("uuid")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| (400, "a \"uuid\" string param is required".to_string()))
}

fn bad_request(e: serde_json::Error) -> (i32, String) {
    (400, format!("invalid params: {e}"))
}

fn core_error(e: CoreError) -> (i32, String) {
    let code = match &e {
        CoreError::Storage(GraphError::NodeNotFound(_)) | CoreError::Storage(GraphError::EdgeNotFound(_)) => 404,
        CoreError::InvalidRequest(_) | CoreError::Serialization(_) => 400,
        CoreError::Llm(LlmError::Timeout) => 408,
        _ => 500,
    };
    (code, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uuid_param_rejects_missing_field() {
        let err = parse_uuid_param(&json!({})).unwrap_err();
        assert_eq!(err.0, 400);
    }

    #[test]
    fn parse_uuid_param_accepts_valid_uuid() {
        let uuid = Uuid::new_v4();
        let parsed = parse_uuid_param(&json!({"uuid": uuid.to_string()})).unwrap();
        assert_eq!(parsed, uuid);
    }
}
