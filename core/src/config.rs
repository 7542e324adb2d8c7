//! Configuration surface (spec §6.3) and the process-wide `Services`
//! container (spec §9 design note: no hidden globals, one value plumbed
//! through handlers, constructed once at startup).

use crate::analytics::AnalyticsService;
use crate::errors::CoreError;
use crate::extraction::{EntityTypeSchema, ExtractionService};
use crate::facts::FactService;
use crate::group::GroupResolver;
use crate::queue::IngestQueue;
use crate::search::HybridSearch;
use crate::traits::{EmbedderGateway, GraphStore, LlmGateway};
use crate::types::GroupId;
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    AzureOpenAi,
    Anthropic,
    Gemini,
    Groq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderProvider {
    OpenAi,
    AzureOpenAi,
    Gemini,
    Voyage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseProvider {
    Neo4jCompatible,
    FalkorDb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    Http,
    Sse,
    Stdio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub small_model: String,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o".into(),
            small_model: "gpt-4o-mini".into(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderSettings {
    pub provider: EmbedderProvider,
    pub model: String,
}

impl Default for EmbedderSettings {
    fn default() -> Self {
        Self { provider: EmbedderProvider::OpenAi, model: "text-embedding-3-small".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub provider: DatabaseProvider,
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            provider: DatabaseProvider::Neo4jCompatible,
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphitiSettings {
    pub group_id: Option<String>,
    pub entity_types: Vec<EntityTypeSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub transport: ServerTransport,
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { transport: ServerTransport::Http, host: "0.0.0.0".into(), port: 8000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProxySettings {
    pub use_proxy: bool,
    pub proxy_url: Option<String>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
    pub no_proxy: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub llm: LlmSettings,
    pub embedder: EmbedderSettings,
    pub database: DatabaseSettings,
    pub graphiti: GraphitiSettings,
    pub server: ServerSettings,
    pub proxy: ProxySettings,
    /// Global ingestion concurrency permit (env `SEMAPHORE_LIMIT`, default 10).
    pub semaphore_limit: usize,
    pub entity_similarity_threshold: f32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            embedder: EmbedderSettings::default(),
            database: DatabaseSettings::default(),
            graphiti: GraphitiSettings::default(),
            server: ServerSettings::default(),
            proxy: ProxySettings::default(),
            semaphore_limit: 10,
            entity_similarity_threshold: 0.85,
        }
    }
}

impl ServiceConfig {
    /// Layered load: defaults -> optional YAML file -> environment
    /// (unprefixed keys matching the spec's enumerated env vars).
    pub fn load(config_path: Option<&Path>) -> Result<Self, CoreError> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(ServiceConfig::default()));

        for candidate in ["chronofact.yaml", "chronofact.yml", ".chronofact.yaml"] {
            if Path::new(candidate).exists() {
                figment = figment.merge(Yaml::file(candidate));
                break;
            }
        }
        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::prefixed("CHRONOFACT_").split("__"));

        let mut config: ServiceConfig = figment
            .extract()
            .map_err(|e| CoreError::Configuration(format!("failed to parse configuration: {e}")))?;

        if let Ok(limit) = std::env::var("SEMAPHORE_LIMIT") {
            config.semaphore_limit = limit
                .parse()
                .map_err(|_| CoreError::Configuration("SEMAPHORE_LIMIT must be an integer".into()))?;
        }

        Ok(config)
    }

    pub fn group_resolver(&self) -> GroupResolver {
        GroupResolver::new(self.graphiti.group_id.clone().map(GroupId::new))
    }
}

/// Process-wide service container: store, gateways, queue, resolved
/// config. Construct once at startup; pass `Arc<Services>` through handlers
/// instead of relying on hidden globals.
pub struct Services {
    pub store: Arc<dyn GraphStore>,
    pub llm: Arc<dyn LlmGateway>,
    pub embedder: Arc<dyn EmbedderGateway>,
    pub queue: Arc<IngestQueue>,
    pub search: HybridSearch,
    pub analytics: AnalyticsService,
    pub facts: FactService,
    pub config: ServiceConfig,
}

impl Services {
    pub fn new(
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn LlmGateway>,
        embedder: Arc<dyn EmbedderGateway>,
        config: ServiceConfig,
    ) -> Self {
        let extraction = Arc::new(ExtractionService::new(
            store.clone(),
            llm.clone(),
            embedder.clone(),
            config.entity_similarity_threshold,
        ));
        let queue = Arc::new(IngestQueue::new(extraction, config.semaphore_limit));
        let search = HybridSearch::new(store.clone(), embedder.clone());
        let analytics = AnalyticsService::new(
            store.clone(),
            embedder.clone(),
            llm.clone(),
            crate::analytics::AnalyticsConfig::default(),
        );
        let facts = FactService::new(store.clone(), embedder.clone());

        Self { store, llm, embedder, queue, search, analytics, facts, config }
    }

    pub fn group_resolver(&self) -> GroupResolver {
        self.config.group_resolver()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.semaphore_limit, 10);
        assert_eq!(config.server.port, 8000);
    }
}
