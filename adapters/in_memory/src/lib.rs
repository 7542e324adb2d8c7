//! In-memory implementation of `GraphStore`, used in tests and for
//! single-node deployments that don't need a real graph database.

use async_trait::async_trait;
use chronofact_core::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct InMemoryConfig {
    pub max_episodes: Option<usize>,
    pub max_entities: Option<usize>,
    pub max_edges: Option<usize>,
    pub verbose: bool,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            max_episodes: Some(100_000),
            max_entities: Some(100_000),
            max_edges: Some(500_000),
            verbose: false,
        }
    }
}

#[derive(Default)]
struct MemoryStore {
    episodes: HashMap<Uuid, EpisodicNode>,
    episodes_by_group: HashMap<GroupId, Vec<Uuid>>,

    entities: HashMap<Uuid, EntityNode>,
    entities_by_group: HashMap<GroupId, Vec<Uuid>>,
    entities_by_name: HashMap<(GroupId, String), Uuid>,

    edges: HashMap<Uuid, EntityEdge>,
    edges_by_group: HashMap<GroupId, Vec<Uuid>>,
    edges_between: HashMap<(Uuid, Uuid), Vec<Uuid>>,

    mentions: HashMap<Uuid, MentionsEdge>,
    mentions_by_entity: HashMap<Uuid, Vec<Uuid>>,
}

impl MemoryStore {
    fn insert_episode(&mut self, episode: EpisodicNode) {
        self.episodes_by_group
            .entry(episode.group_id.clone())
            .or_default()
            .push(episode.uuid);
        self.episodes.insert(episode.uuid, episode);
    }

    fn insert_entity(&mut self, entity: EntityNode) {
        self.entities_by_group
            .entry(entity.group_id.clone())
            .or_default()
            .push(entity.uuid);
        self.entities_by_name
            .insert((entity.group_id.clone(), entity.name.clone()), entity.uuid);
        self.entities.insert(entity.uuid, entity);
    }

    fn insert_edge(&mut self, edge: EntityEdge) {
        self.edges_by_group.entry(edge.group_id.clone()).or_default().push(edge.uuid);
        self.edges_between
            .entry((edge.source_node_uuid, edge.target_node_uuid))
            .or_default()
            .push(edge.uuid);
        self.edges.insert(edge.uuid, edge);
    }

    fn insert_mentions(&mut self, mentions: MentionsEdge) {
        self.mentions_by_entity
            .entry(mentions.entity_uuid)
            .or_default()
            .push(mentions.uuid);
        self.mentions.insert(mentions.uuid, mentions);
    }

    fn stats(&self) -> (usize, usize, usize) {
        (self.episodes.len(), self.entities.len(), self.edges.len())
    }
}

pub struct InMemoryStore {
    store: Arc<RwLock<MemoryStore>>,
    config: InMemoryConfig,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::new_with_config(InMemoryConfig::default())
    }

    pub fn new_with_config(config: InMemoryConfig) -> Self {
        info!("creating in-memory store with config: {:?}", config);
        Self { store: Arc::new(RwLock::new(MemoryStore::default())), config }
    }

    pub async fn stats(&self) -> (usize, usize, usize) {
        self.store.read().await.stats()
    }

    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        *store = MemoryStore::default();
        info!("cleared in-memory store");
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for InMemoryStore {
    async fn save_episode(&self, episode: &EpisodicNode) -> Result<(), GraphError> {
        let mut store = self.store.write().await;
        if let Some(max) = self.config.max_episodes {
            if store.episodes.len() >= max && !store.episodes.contains_key(&episode.uuid) {
                return Err(GraphError::ConstraintViolation(format!("maximum episode limit ({max}) reached")));
            }
        }
        if self.config.verbose {
            debug!("saving episode {} ({})", episode.uuid, episode.name);
        }
        store.insert_episode(episode.clone());
        Ok(())
    }

    async fn get_episode(&self, uuid: Uuid) -> Result<Option<EpisodicNode>, GraphError> {
        Ok(self.store.read().await.episodes.get(&uuid).cloned())
    }

    async fn delete_episode(&self, uuid: Uuid) -> Result<bool, GraphError> {
        let mut store = self.store.write().await;
        if let Some(episode) = store.episodes.remove(&uuid) {
            if let Some(ids) = store.episodes_by_group.get_mut(&episode.group_id) {
                ids.retain(|&id| id != uuid);
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list_episodes(&self, group_ids: &[GroupId], limit: u32) -> Result<Vec<EpisodicNode>, GraphError> {
        let store = self.store.read().await;
        let mut out: Vec<EpisodicNode> = group_ids
            .iter()
            .flat_map(|g| store.episodes_by_group.get(g).cloned().unwrap_or_default())
            .filter_map(|id| store.episodes.get(&id).cloned())
            .collect();
        out.sort_by_key(|e| std::cmp::Reverse(e.created_at));
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn save_entity(&self, entity: &EntityNode) -> Result<(), GraphError> {
        let mut store = self.store.write().await;
        if let Some(max) = self.config.max_entities {
            if store.entities.len() >= max && !store.entities.contains_key(&entity.uuid) {
                return Err(GraphError::ConstraintViolation(format!("maximum entity limit ({max}) reached")));
            }
        }
        if self.config.verbose {
            debug!("saving entity {} ({})", entity.uuid, entity.name);
        }
        store.insert_entity(entity.clone());
        Ok(())
    }

    async fn get_entity(&self, uuid: Uuid) -> Result<Option<EntityNode>, GraphError> {
        Ok(self.store.read().await.entities.get(&uuid).cloned())
    }

    async fn find_entity_by_name(&self, group_id: &GroupId, name: &str) -> Result<Option<EntityNode>, GraphError> {
        let store = self.store.read().await;
        let uuid = store.entities_by_name.get(&(group_id.clone(), name.to_string()));
        Ok(uuid.and_then(|id| store.entities.get(id).cloned()))
    }

    async fn list_entities(&self, group_ids: &[GroupId], limit: u32) -> Result<Vec<EntityNode>, GraphError> {
        let store = self.store.read().await;
        let mut out: Vec<EntityNode> = group_ids
            .iter()
            .flat_map(|g| store.entities_by_group.get(g).cloned().unwrap_or_default())
            .filter_map(|id| store.entities.get(&id).cloned())
            .collect();
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn save_edge(&self, edge: &EntityEdge) -> Result<(), GraphError> {
        let mut store = self.store.write().await;
        if let Some(max) = self.config.max_edges {
            if store.edges.len() >= max && !store.edges.contains_key(&edge.uuid) {
                return Err(GraphError::ConstraintViolation(format!("maximum edge limit ({max}) reached")));
            }
        }
        if !store.entities.contains_key(&edge.source_node_uuid) {
            return Err(GraphError::NodeNotFound(edge.source_node_uuid.to_string()));
        }
        if !store.entities.contains_key(&edge.target_node_uuid) {
            return Err(GraphError::NodeNotFound(edge.target_node_uuid.to_string()));
        }
        if self.config.verbose {
            debug!("saving edge {} ({} -> {})", edge.uuid, edge.source_node_uuid, edge.target_node_uuid);
        }
        store.insert_edge(edge.clone());
        Ok(())
    }

    async fn get_edge(&self, uuid: Uuid) -> Result<Option<EntityEdge>, GraphError> {
        Ok(self.store.read().await.edges.get(&uuid).cloned())
    }

    async fn expire_edge(&self, uuid: Uuid, expired_at: chrono::DateTime<chrono::Utc>) -> Result<(), GraphError> {
        let mut store = self.store.write().await;
        let edge = store
            .edges
            .get_mut(&uuid)
            .ok_or_else(|| GraphError::EdgeNotFound(uuid.to_string()))?;
        edge.expired_at = Some(expired_at);
        Ok(())
    }

    async fn delete_edge(&self, uuid: Uuid) -> Result<bool, GraphError> {
        let mut store = self.store.write().await;
        if let Some(edge) = store.edges.remove(&uuid) {
            if let Some(ids) = store.edges_by_group.get_mut(&edge.group_id) {
                ids.retain(|&id| id != uuid);
            }
            if let Some(ids) = store.edges_between.get_mut(&(edge.source_node_uuid, edge.target_node_uuid)) {
                ids.retain(|&id| id != uuid);
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn find_current_edges_between(
        &self,
        source_node_uuid: Uuid,
        target_node_uuid: Uuid,
    ) -> Result<Vec<EntityEdge>, GraphError> {
        let store = self.store.read().await;
        let ids = store.edges_between.get(&(source_node_uuid, target_node_uuid)).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| store.edges.get(&id).cloned())
            .filter(|e| e.expired_at.is_none())
            .collect())
    }

    async fn find_edges_by_group(&self, group_ids: &[GroupId], limit: u32) -> Result<Vec<EntityEdge>, GraphError> {
        let store = self.store.read().await;
        let mut out: Vec<EntityEdge> = group_ids
            .iter()
            .flat_map(|g| store.edges_by_group.get(g).cloned().unwrap_or_default())
            .filter_map(|id| store.edges.get(&id).cloned())
            .collect();
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn save_mentions(&self, mentions: &MentionsEdge) -> Result<(), GraphError> {
        let mut store = self.store.write().await;
        if !store.episodes.contains_key(&mentions.episode_uuid) {
            return Err(GraphError::NodeNotFound(mentions.episode_uuid.to_string()));
        }
        if !store.entities.contains_key(&mentions.entity_uuid) {
            return Err(GraphError::NodeNotFound(mentions.entity_uuid.to_string()));
        }
        store.insert_mentions(mentions.clone());
        Ok(())
    }

    async fn find_mentions_of_entity(&self, entity_uuid: Uuid) -> Result<Vec<MentionsEdge>, GraphError> {
        let store = self.store.read().await;
        let ids = store.mentions_by_entity.get(&entity_uuid).cloned().unwrap_or_default();
        Ok(ids.into_iter().filter_map(|id| store.mentions.get(&id).cloned()).collect())
    }

    async fn run_raw(&self, query: GraphQuery) -> Result<Vec<PathRelationship>, GraphError> {
        match query {
            GraphQuery::Raw { .. } => {
                warn!("raw queries not supported by in-memory adapter");
                Err(GraphError::QueryFailed("raw queries not supported by in-memory adapter".into()))
            }
            GraphQuery::FindEdgesByGroup { group_ids, limit } => {
                let edges = self.find_edges_by_group(&group_ids, limit.unwrap_or(100)).await?;
                Ok(edges
                    .into_iter()
                    .map(|e| PathRelationship {
                        id: e.uuid,
                        rel_type: e.name.clone(),
                        start_node_id: e.source_node_uuid,
                        end_node_id: e.target_node_uuid,
                        properties: serde_json::to_value(&e).unwrap_or(serde_json::Value::Null),
                    })
                    .collect())
            }
            GraphQuery::CurrentEdgesBetween { source_node_uuid, target_node_uuid } => {
                let edges = self.find_current_edges_between(source_node_uuid, target_node_uuid).await?;
                Ok(edges
                    .into_iter()
                    .map(|e| PathRelationship {
                        id: e.uuid,
                        rel_type: e.name.clone(),
                        start_node_id: e.source_node_uuid,
                        end_node_id: e.target_node_uuid,
                        properties: serde_json::to_value(&e).unwrap_or(serde_json::Value::Null),
                    })
                    .collect())
            }
        }
    }

    async fn health_check(&self) -> Result<(), GraphError> {
        let (episodes, entities, edges) = self.stats().await;
        debug!("in-memory store health check: {episodes} episodes, {entities} entities, {edges} edges");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn save_and_get_entity_roundtrips() {
        let store = InMemoryStore::new();
        let entity = EntityNode::new("Acme Corp", GroupId::new("g1"));
        store.save_entity(&entity).await.unwrap();

        let found = store.get_entity(entity.uuid).await.unwrap().unwrap();
        assert_eq!(found.name, "Acme Corp");

        let by_name = store.find_entity_by_name(&GroupId::new("g1"), "Acme Corp").await.unwrap().unwrap();
        assert_eq!(by_name.uuid, entity.uuid);
    }

    #[tokio::test]
    async fn expire_edge_hides_it_from_current_lookup() {
        let store = InMemoryStore::new();
        let a = EntityNode::new("Alice", GroupId::new("g1"));
        let b = EntityNode::new("Bob", GroupId::new("g1"));
        store.save_entity(&a).await.unwrap();
        store.save_entity(&b).await.unwrap();

        let edge = EntityEdge::new(a.uuid, b.uuid, "KNOWS", "Alice knows Bob", vec![0.1], vec![], GroupId::new("g1"), Utc::now());
        store.save_edge(&edge).await.unwrap();

        let current = store.find_current_edges_between(a.uuid, b.uuid).await.unwrap();
        assert_eq!(current.len(), 1);

        store.expire_edge(edge.uuid, Utc::now()).await.unwrap();
        let current = store.find_current_edges_between(a.uuid, b.uuid).await.unwrap();
        assert!(current.is_empty());
    }

    #[tokio::test]
    async fn save_edge_requires_existing_entities() {
        let store = InMemoryStore::new();
        let edge = EntityEdge::new(Uuid::new_v4(), Uuid::new_v4(), "KNOWS", "x", vec![], vec![], GroupId::new("g1"), Utc::now());
        let result = store.save_edge(&edge).await;
        assert!(matches!(result, Err(GraphError::NodeNotFound(_))));
    }

    #[tokio::test]
    async fn list_episodes_filters_by_group() {
        let store = InMemoryStore::new();
        let e1 = EpisodicNode::new("e1", "body", chronofact_core::types::EpisodeSource::Text, GroupId::new("g1"), Utc::now());
        let e2 = EpisodicNode::new("e2", "body", chronofact_core::types::EpisodeSource::Text, GroupId::new("g2"), Utc::now());
        store.save_episode(&e1).await.unwrap();
        store.save_episode(&e2).await.unwrap();

        let listed = store.list_episodes(&[GroupId::new("g1")], 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "e1");
    }
}
