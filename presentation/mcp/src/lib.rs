//! MCP stdio tool-surface presentation adapter for chronofact.
//!
//! Reads newline-delimited `ToolCall` JSON objects from stdin and writes
//! `ToolResult` JSON objects to stdout, one per line, dispatching each call
//! to the same `Services` container the HTTP layer uses.

use async_trait::async_trait;
use chronofact_core::config::Services;
use chronofact_core::prelude::*;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

mod protocol;
mod service;

use protocol::{ToolCall, ToolResult};
use service::McpService;

/// MCP stdio presentation adapter.
pub struct McpServer {
    service: McpService,
}

impl McpServer {
    pub fn new(services: Arc<Services>) -> Self {
        Self { service: McpService::new(services) }
    }
}

#[async_trait]
impl PresentationAdapter for McpServer {
    async fn start(&self) -> Result<(), PresentationError> {
        info!("starting MCP stdio server");

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        loop {
            let line = lines
                .next_line()
                .await
                .map_err(|e| PresentationError::RequestHandling(format!("stdin read error: {e}")))?;

            let Some(line) = line else {
                debug!("stdin closed, stopping MCP server");
                break;
            };

            if line.trim().is_empty() {
                continue;
            }

            let result = match serde_json::from_str::<ToolCall>(&line) {
                Ok(call) => self.service.dispatch(call).await,
                Err(e) => {
                    warn!("malformed tool call: {e}");
                    ToolResult::err(serde_json::Value::Null, 400, format!("malformed tool call: {e}"))
                }
            };

            let encoded = serde_json::to_string(&result)
                .map_err(|e| PresentationError::RequestHandling(format!("response encode error: {e}")))?;

            if let Err(e) = stdout.write_all(encoded.as_bytes()).await {
                error!("failed to write response: {e}");
                break;
            }
            if let Err(e) = stdout.write_all(b"\n").await {
                error!("failed to write newline: {e}");
                break;
            }
            let _ = stdout.flush().await;
        }

        Ok(())
    }

    async fn stop(&self) -> Result<(), PresentationError> {
        info!("stopping MCP stdio server");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronofact_core::config::ServiceConfig;
    use chronofact_core::errors::GraphError;
    use chronofact_core::traits::{EmbedderGateway, GenerationRequest, GenerationResponse, GraphStore, LlmGateway};
    use chronofact_core::types::*;
    use std::collections::HashMap;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    struct NoopLlm;
    #[async_trait]
    impl LlmGateway for NoopLlm {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
            Ok(GenerationResponse::default())
        }
        fn provider_name(&self) -> &'static str {
            "noop"
        }
    }

    struct NoopEmbedder;
    #[async_trait]
    impl EmbedderGateway for NoopEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            Ok(vec![0.0; 4])
        }
        fn dimensions(&self) -> usize {
            4
        }
    }

    #[derive(Default)]
    struct InMemoryStub {
        episodes: Mutex<HashMap<Uuid, EpisodicNode>>,
    }

    #[async_trait]
    impl GraphStore for InMemoryStub {
        async fn save_episode(&self, episode: &EpisodicNode) -> Result<(), GraphError> {
            self.episodes.lock().await.insert(episode.uuid, episode.clone());
            Ok(())
        }
        async fn get_episode(&self, uuid: Uuid) -> Result<Option<EpisodicNode>, GraphError> {
            Ok(self.episodes.lock().await.get(&uuid).cloned())
        }
        async fn delete_episode(&self, uuid: Uuid) -> Result<bool, GraphError> {
            Ok(self.episodes.lock().await.remove(&uuid).is_some())
        }
        async fn list_episodes(&self, _group_ids: &[GroupId], _limit: u32) -> Result<Vec<EpisodicNode>, GraphError> {
            Ok(self.episodes.lock().await.values().cloned().collect())
        }
        async fn save_entity(&self, _entity: &EntityNode) -> Result<(), GraphError> {
            Ok(())
        }
        async fn get_entity(&self, _uuid: Uuid) -> Result<Option<EntityNode>, GraphError> {
            Ok(None)
        }
        async fn find_entity_by_name(&self, _group_id: &GroupId, _name: &str) -> Result<Option<EntityNode>, GraphError> {
            Ok(None)
        }
        async fn list_entities(&self, _group_ids: &[GroupId], _limit: u32) -> Result<Vec<EntityNode>, GraphError> {
            Ok(Vec::new())
        }
        async fn save_edge(&self, _edge: &EntityEdge) -> Result<(), GraphError> {
            Ok(())
        }
        async fn get_edge(&self, _uuid: Uuid) -> Result<Option<EntityEdge>, GraphError> {
            Ok(None)
        }
        async fn expire_edge(&self, _uuid: Uuid, _expired_at: chrono::DateTime<chrono::Utc>) -> Result<(), GraphError> {
            Ok(())
        }
        async fn delete_edge(&self, _uuid: Uuid) -> Result<bool, GraphError> {
            Ok(false)
        }
        async fn find_current_edges_between(&self, _source: Uuid, _target: Uuid) -> Result<Vec<EntityEdge>, GraphError> {
            Ok(Vec::new())
        }
        async fn find_edges_by_group(&self, _group_ids: &[GroupId], _limit: u32) -> Result<Vec<EntityEdge>, GraphError> {
            Ok(Vec::new())
        }
        async fn save_mentions(&self, _mentions: &MentionsEdge) -> Result<(), GraphError> {
            Ok(())
        }
        async fn find_mentions_of_entity(&self, _entity_uuid: Uuid) -> Result<Vec<MentionsEdge>, GraphError> {
            Ok(Vec::new())
        }
        async fn run_raw(&self, _query: GraphQuery) -> Result<Vec<PathRelationship>, GraphError> {
            Ok(Vec::new())
        }
        async fn health_check(&self) -> Result<(), GraphError> {
            Ok(())
        }
    }

    fn test_services() -> Arc<Services> {
        let store: Arc<dyn GraphStore> = Arc::new(InMemoryStub::default());
        let llm: Arc<dyn LlmGateway> = Arc::new(NoopLlm);
        let embedder: Arc<dyn EmbedderGateway> = Arc::new(NoopEmbedder);
        Arc::new(Services::new(store, llm, embedder, ServiceConfig::default()))
    }

    #[tokio::test]
    async fn get_status_dispatches_through_services() {
        let server = McpServer::new(test_services());
        let call: ToolCall = serde_json::from_str(r#"{"id":1,"tool":"get_status"}"#).unwrap();
        let result = server.service.dispatch(call).await;
        assert!(result.error.is_none());
        assert_eq!(result.result.unwrap()["status"], "healthy");
    }

    #[tokio::test]
    async fn unknown_tool_returns_404() {
        let server = McpServer::new(test_services());
        let call: ToolCall = serde_json::from_str(r#"{"id":1,"tool":"nonexistent"}"#).unwrap();
        let result = server.service.dispatch(call).await;
        assert_eq!(result.error.unwrap().code, 404);
    }
}
