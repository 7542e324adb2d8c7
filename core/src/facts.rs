//! Fact Versioning & Citation Store (C5).
//!
//! Bitemporal update semantics for `RELATES_TO` edges: updates never mutate
//! an edge's fact text in place. The old version is expired via a direct
//! property update, and a new version is created carrying the inherited
//! citation list. See `GraphStore::expire_edge` for the save-round-trip
//! pitfall this avoids.

use crate::errors::{CoreError, GraphError};
use crate::traits::{EmbedderGateway, GraphStore};
use crate::types::{EntityEdge, EpisodicNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub struct FactService {
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn EmbedderGateway>,
}

/// One entry in a fact's or entity's provenance list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub episode_uuid: Uuid,
    pub episode_name: String,
    pub source: String,
    pub source_description: String,
    pub created_at: DateTime<Utc>,
    pub source_url: Option<String>,
}

/// How an episode relates to the entity/edge it mentions, in a citation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationOperation {
    Created,
    Updated,
    Referenced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationChainEntry {
    pub episode_uuid: Uuid,
    pub episode_name: String,
    pub source: String,
    pub source_description: String,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub operation: CitationOperation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactUpdateRequest {
    pub uuid: Uuid,
    pub fact: String,
    pub source_node_uuid: Option<Uuid>,
    pub target_node_uuid: Option<Uuid>,
    pub update_reason: Option<String>,
}

impl FactService {
    pub fn new(store: Arc<dyn GraphStore>, embedder: Arc<dyn EmbedderGateway>) -> Self {
        Self { store, embedder }
    }

    /// Update protocol from spec §4.5: expire the old edge by direct
    /// property update, then create a fresh edge inheriting citations.
    /// `extra_episode` is appended to the inherited citation list, used by
    /// the extraction pipeline when a new episode supersedes a fact (the
    /// plain REST `PATCH /graph/facts/{uuid}` path leaves it `None`).
    pub async fn update_fact(
        &self,
        req: FactUpdateRequest,
        extra_episode: Option<Uuid>,
    ) -> Result<(Uuid, EntityEdge), CoreError> {
        let old = self
            .store
            .get_edge(req.uuid)
            .await?
            .ok_or_else(|| CoreError::Storage(GraphError::EdgeNotFound(req.uuid.to_string())))?;

        let now = Utc::now();
        self.store.expire_edge(old.uuid, now).await?;

        let fact_embedding = self.embedder.embed(&req.fact).await?;

        let mut episodes = old.episodes.clone();
        if let Some(ep) = extra_episode {
            if !episodes.contains(&ep) {
                episodes.push(ep);
            }
        }

        let mut new_edge = EntityEdge::new(
            req.source_node_uuid.unwrap_or(old.source_node_uuid),
            req.target_node_uuid.unwrap_or(old.target_node_uuid),
            old.name.clone(),
            req.fact.clone(),
            fact_embedding,
            episodes,
            old.group_id.clone(),
            now,
        );
        new_edge.updated_at = Some(now);
        new_edge.original_fact = Some(old.fact.clone());
        new_edge.update_reason = req.update_reason;

        self.store.save_edge(&new_edge).await?;

        Ok((old.uuid, new_edge))
    }

    /// Citation resolution for a fact (spec §4.5): read `episodes[]`, fetch
    /// each episodic node, extract `source_url`.
    pub async fn citations_for_edge(&self, edge: &EntityEdge) -> Result<Vec<Citation>, CoreError> {
        let mut citations = Vec::with_capacity(edge.episodes.len());
        for episode_uuid in &edge.episodes {
            if let Some(episode) = self.store.get_episode(*episode_uuid).await? {
                citations.push(episode_to_citation(&episode));
            }
        }
        Ok(citations)
    }

    /// Citation resolution for an entity: traverse `MENTIONS` edges pointing at it.
    pub async fn citations_for_entity(&self, entity_uuid: Uuid) -> Result<Vec<Citation>, CoreError> {
        let mentions = self.store.find_mentions_of_entity(entity_uuid).await?;
        let mut citations = Vec::with_capacity(mentions.len());
        for m in mentions {
            if let Some(episode) = self.store.get_episode(m.episode_uuid).await? {
                citations.push(episode_to_citation(&episode));
            }
        }
        citations.sort_by_key(|c| c.created_at);
        Ok(citations)
    }

    /// Citation chain for an entity: episodes mentioning it, ordered by
    /// `created_at`, tagged `created`/`updated`/`referenced` by comparing
    /// timestamps against the entity's own `created_at`/`updated_at`.
    pub async fn citation_chain_for_entity(&self, entity_uuid: Uuid) -> Result<Vec<CitationChainEntry>, CoreError> {
        let entity = self
            .store
            .get_entity(entity_uuid)
            .await?
            .ok_or_else(|| CoreError::Storage(GraphError::NodeNotFound(entity_uuid.to_string())))?;

        let mentions = self.store.find_mentions_of_entity(entity_uuid).await?;
        let mut chain = Vec::with_capacity(mentions.len());
        for m in mentions {
            if let Some(episode) = self.store.get_episode(m.episode_uuid).await? {
                let operation = if episode.created_at <= entity.created_at {
                    CitationOperation::Created
                } else {
                    CitationOperation::Referenced
                };
                chain.push(CitationChainEntry {
                    episode_uuid: episode.uuid,
                    episode_name: episode.name.clone(),
                    source: episode.source.to_string(),
                    source_description: episode.source_description.clone(),
                    source_url: episode.source_url_or_legacy(),
                    created_at: episode.created_at,
                    operation,
                });
            }
        }
        chain.sort_by_key(|e| e.created_at);
        Ok(chain)
    }

    /// Citation chain for an edge, tagging `updated` when the episode arrived
    /// after the edge's `updated_at` (if the edge has been revised).
    pub async fn citation_chain_for_edge(&self, edge: &EntityEdge) -> Result<Vec<CitationChainEntry>, CoreError> {
        let mut chain = Vec::with_capacity(edge.episodes.len());
        for episode_uuid in &edge.episodes {
            if let Some(episode) = self.store.get_episode(*episode_uuid).await? {
                let operation = match edge.updated_at {
                    Some(updated_at) if episode.created_at >= updated_at => CitationOperation::Updated,
                    _ if episode.created_at <= edge.created_at => CitationOperation::Created,
                    _ => CitationOperation::Referenced,
                };
                chain.push(CitationChainEntry {
                    episode_uuid: episode.uuid,
                    episode_name: episode.name.clone(),
                    source: episode.source.to_string(),
                    source_description: episode.source_description.clone(),
                    source_url: episode.source_url_or_legacy(),
                    created_at: episode.created_at,
                    operation,
                });
            }
        }
        chain.sort_by_key(|e| e.created_at);
        Ok(chain)
    }
}

fn episode_to_citation(episode: &EpisodicNode) -> Citation {
    Citation {
        episode_uuid: episode.uuid,
        episode_name: episode.name.clone(),
        source: episode.source.to_string(),
        source_description: episode.source_description.clone(),
        created_at: episode.created_at,
        source_url: episode.source_url_or_legacy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EpisodeSource, GroupId};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeEmbedder;
    #[async_trait::async_trait]
    impl EmbedderGateway for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, crate::errors::LlmError> {
            Ok(vec![text.len() as f32])
        }
        fn dimensions(&self) -> usize {
            1
        }
    }

    #[derive(Default)]
    struct FakeStore {
        episodes: Mutex<HashMap<Uuid, EpisodicNode>>,
        edges: Mutex<HashMap<Uuid, EntityEdge>>,
        mentions: Mutex<Vec<crate::types::MentionsEdge>>,
        entities: Mutex<HashMap<Uuid, crate::types::EntityNode>>,
    }

    #[async_trait::async_trait]
    impl GraphStore for FakeStore {
        async fn save_episode(&self, episode: &EpisodicNode) -> Result<(), GraphError> {
            self.episodes.lock().unwrap().insert(episode.uuid, episode.clone());
            Ok(())
        }
        async fn get_episode(&self, uuid: Uuid) -> Result<Option<EpisodicNode>, GraphError> {
            Ok(self.episodes.lock().unwrap().get(&uuid).cloned())
        }
        async fn delete_episode(&self, uuid: Uuid) -> Result<bool, GraphError> {
            Ok(self.episodes.lock().unwrap().remove(&uuid).is_some())
        }
        async fn list_episodes(&self, _g: &[GroupId], _l: u32) -> Result<Vec<EpisodicNode>, GraphError> {
            Ok(self.episodes.lock().unwrap().values().cloned().collect())
        }
        async fn save_entity(&self, entity: &crate::types::EntityNode) -> Result<(), GraphError> {
            self.entities.lock().unwrap().insert(entity.uuid, entity.clone());
            Ok(())
        }
        async fn get_entity(&self, uuid: Uuid) -> Result<Option<crate::types::EntityNode>, GraphError> {
            Ok(self.entities.lock().unwrap().get(&uuid).cloned())
        }
        async fn find_entity_by_name(&self, _g: &GroupId, _n: &str) -> Result<Option<crate::types::EntityNode>, GraphError> {
            Ok(None)
        }
        async fn list_entities(&self, _g: &[GroupId], _l: u32) -> Result<Vec<crate::types::EntityNode>, GraphError> {
            Ok(self.entities.lock().unwrap().values().cloned().collect())
        }
        async fn save_edge(&self, edge: &EntityEdge) -> Result<(), GraphError> {
            self.edges.lock().unwrap().insert(edge.uuid, edge.clone());
            Ok(())
        }
        async fn get_edge(&self, uuid: Uuid) -> Result<Option<EntityEdge>, GraphError> {
            Ok(self.edges.lock().unwrap().get(&uuid).cloned())
        }
        async fn expire_edge(&self, uuid: Uuid, expired_at: DateTime<Utc>) -> Result<(), GraphError> {
            if let Some(e) = self.edges.lock().unwrap().get_mut(&uuid) {
                e.expired_at = Some(expired_at);
            }
            Ok(())
        }
        async fn delete_edge(&self, uuid: Uuid) -> Result<bool, GraphError> {
            Ok(self.edges.lock().unwrap().remove(&uuid).is_some())
        }
        async fn find_current_edges_between(&self, _s: Uuid, _t: Uuid) -> Result<Vec<EntityEdge>, GraphError> {
            Ok(vec![])
        }
        async fn find_edges_by_group(&self, _g: &[GroupId], _l: u32) -> Result<Vec<EntityEdge>, GraphError> {
            Ok(self.edges.lock().unwrap().values().cloned().collect())
        }
        async fn save_mentions(&self, mentions: &crate::types::MentionsEdge) -> Result<(), GraphError> {
            self.mentions.lock().unwrap().push(mentions.clone());
            Ok(())
        }
        async fn find_mentions_of_entity(&self, entity_uuid: Uuid) -> Result<Vec<crate::types::MentionsEdge>, GraphError> {
            Ok(self
                .mentions
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.entity_uuid == entity_uuid)
                .cloned()
                .collect())
        }
        async fn run_raw(&self, _q: crate::types::GraphQuery) -> Result<Vec<crate::types::PathRelationship>, GraphError> {
            Ok(vec![])
        }
        async fn health_check(&self) -> Result<(), GraphError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn update_fact_inherits_citations() {
        let store = Arc::new(FakeStore::default());
        let embedder = Arc::new(FakeEmbedder);
        let ep1 = Uuid::new_v4();
        let ep2 = Uuid::new_v4();
        let old = EntityEdge::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "WORKS_AT",
            "Alice works at Acme",
            vec![1.0],
            vec![ep1, ep2],
            GroupId::new("g1"),
            Utc::now(),
        );
        store.save_edge(&old).await.unwrap();

        let svc = FactService::new(store.clone(), embedder);
        let (old_uuid, new_edge) = svc
            .update_fact(
                FactUpdateRequest {
                    uuid: old.uuid,
                    fact: "Alice works at Beta Corp".into(),
                    source_node_uuid: None,
                    target_node_uuid: None,
                    update_reason: Some("job change".into()),
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(old_uuid, old.uuid);
        assert_eq!(new_edge.episodes, vec![ep1, ep2]);
        assert_eq!(new_edge.original_fact, Some("Alice works at Acme".to_string()));

        let old_reloaded = store.get_edge(old.uuid).await.unwrap().unwrap();
        assert!(old_reloaded.expired_at.is_some());
    }
}
