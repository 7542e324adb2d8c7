//! Core trait seams: the graph store contract, the LLM/embedder gateway
//! contract, and the presentation-adapter contract.

use crate::errors::{GraphError, LlmError, PresentationError};
use crate::types::{EntityEdge, EntityNode, EpisodicNode, GraphQuery, GroupId, MentionsEdge, PathNode, PathRelationship};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Thin typed wrapper over a Cypher-style property graph store.
///
/// Errors: `StoreUnavailable` for connection failures, `NotFound` for uuid
/// misses (surfaced as `Ok(None)` from getters, `GraphError::NodeNotFound`/
/// `EdgeNotFound` from operations that require existence), `ConstraintViolation`
/// for uniqueness conflicts.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn save_episode(&self, episode: &EpisodicNode) -> Result<(), GraphError>;
    async fn get_episode(&self, uuid: Uuid) -> Result<Option<EpisodicNode>, GraphError>;
    async fn delete_episode(&self, uuid: Uuid) -> Result<bool, GraphError>;
    async fn list_episodes(&self, group_ids: &[GroupId], limit: u32) -> Result<Vec<EpisodicNode>, GraphError>;

    async fn save_entity(&self, entity: &EntityNode) -> Result<(), GraphError>;
    async fn get_entity(&self, uuid: Uuid) -> Result<Option<EntityNode>, GraphError>;
    async fn find_entity_by_name(&self, group_id: &GroupId, name: &str) -> Result<Option<EntityNode>, GraphError>;
    async fn list_entities(&self, group_ids: &[GroupId], limit: u32) -> Result<Vec<EntityNode>, GraphError>;

    /// Full insert/overwrite of an edge. Used for edge creation; bitemporal
    /// updates should prefer `expire_edge` for the old version to avoid the
    /// save-round-trip pitfall on `fact_embedding`.
    async fn save_edge(&self, edge: &EntityEdge) -> Result<(), GraphError>;
    async fn get_edge(&self, uuid: Uuid) -> Result<Option<EntityEdge>, GraphError>;
    /// Direct property update: `SET e.expired_at = $t`, never a full rewrite.
    async fn expire_edge(&self, uuid: Uuid, expired_at: chrono::DateTime<chrono::Utc>) -> Result<(), GraphError>;
    async fn delete_edge(&self, uuid: Uuid) -> Result<bool, GraphError>;
    async fn find_current_edges_between(
        &self,
        source_node_uuid: Uuid,
        target_node_uuid: Uuid,
    ) -> Result<Vec<EntityEdge>, GraphError>;
    async fn find_edges_by_group(&self, group_ids: &[GroupId], limit: u32) -> Result<Vec<EntityEdge>, GraphError>;

    async fn save_mentions(&self, mentions: &MentionsEdge) -> Result<(), GraphError>;
    /// Episodes that MENTIONS the given entity, for citation resolution.
    async fn find_mentions_of_entity(&self, entity_uuid: Uuid) -> Result<Vec<MentionsEdge>, GraphError>;

    /// Escape hatch for ad-hoc Cypher-style reads not covered above.
    async fn run_raw(&self, query: GraphQuery) -> Result<Vec<PathRelationship>, GraphError>;
    async fn health_check(&self) -> Result<(), GraphError>;
}

/// A node search candidate returned by the store when it can evaluate
/// vector distance natively; adapters without a native vector index fall
/// back to scanning `list_entities` and scoring in `core::search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredNode {
    pub node: PathNode,
    pub score: f32,
}

/// Uniform interface over LLM providers, hiding reasoning-model parameter
/// quirks and proxy-aware transport behind a single `generate` call.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Generate text or, if `response_schema` is set, a schema-validated
    /// JSON value. A single per-request timeout (`UpstreamTimeout` on
    /// expiry) wraps every call; the gateway never retries on its own.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;

    fn provider_name(&self) -> &'static str;
}

/// Interface over embedding providers.
#[async_trait]
pub trait EmbedderGateway: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.embed(t).await?);
        }
        Ok(out)
    }

    /// Fixed output dimensionality, constant for a given provider/model.
    fn dimensions(&self) -> usize;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub messages: Vec<LlmMessage>,
    pub system_prompt: Option<String>,
    /// JSON schema the response must validate against. When present the
    /// gateway performs schema strictening if the provider requires it.
    pub response_schema: Option<serde_json::Value>,
    pub max_tokens: Option<u32>,
    /// Ignored by the gateway when the model is detected as reasoning-class.
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(messages: Vec<LlmMessage>) -> Self {
        Self {
            messages,
            system_prompt: None,
            response_schema: None,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: String,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationResponse {
    pub text: String,
    /// Present when `response_schema` was set and parsing/validation succeeded.
    pub parsed: Option<serde_json::Value>,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationMetadata {
    pub provider: String,
    pub model_name: String,
    pub latency_ms: Option<u64>,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    pub cost_usd: Option<f64>,
}

/// Trait for presentation adapters (network transport layers).
#[async_trait]
pub trait PresentationAdapter: Send + Sync {
    async fn start(&self) -> Result<(), PresentationError>;
    async fn stop(&self) -> Result<(), PresentationError>;
}

/// Reference-counted bundle of the backends a `Services` container wires up.
pub type SharedGraphStore = Arc<dyn GraphStore>;
pub type SharedLlmGateway = Arc<dyn LlmGateway>;
pub type SharedEmbedderGateway = Arc<dyn EmbedderGateway>;
