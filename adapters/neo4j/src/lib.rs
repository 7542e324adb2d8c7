//! Neo4j-compatible implementation of the `GraphStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chronofact_core::prelude::*;
use neo4j::{Graph, Query};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

mod config;
mod queries;
mod utils;

pub use config::Neo4jConfig;

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub async fn new(config: Neo4jConfig) -> Result<Self, GraphError> {
        info!("Connecting to Neo4j at {}", config.uri);

        let graph = Graph::new(
            &config.uri,
            config.user.as_deref().unwrap_or("neo4j"),
            config.password.as_deref().unwrap_or("neo4j"),
        )
        .await
        .map_err(|e| GraphError::StoreUnavailable(format!("Neo4j connection failed: {e}")))?;

        let store = Self { graph };
        store.health_check().await?;
        store.create_indices().await?;
        Ok(store)
    }

    async fn create_indices(&self) -> Result<(), GraphError> {
        let indices = [
            "CREATE INDEX episode_uuid_idx IF NOT EXISTS FOR (e:Episode) ON (e.uuid)",
            "CREATE INDEX episode_group_idx IF NOT EXISTS FOR (e:Episode) ON (e.group_id)",
            "CREATE INDEX entity_uuid_idx IF NOT EXISTS FOR (n:Entity) ON (n.uuid)",
            "CREATE INDEX entity_group_idx IF NOT EXISTS FOR (n:Entity) ON (n.group_id)",
            "CREATE INDEX entity_name_idx IF NOT EXISTS FOR (n:Entity) ON (n.name)",
            "CREATE INDEX edge_uuid_idx IF NOT EXISTS FOR ()-[r:RELATES_TO]-() ON (r.uuid)",
            "CREATE INDEX edge_group_idx IF NOT EXISTS FOR ()-[r:RELATES_TO]-() ON (r.group_id)",
            "CREATE INDEX edge_valid_at_idx IF NOT EXISTS FOR ()-[r:RELATES_TO]-() ON (r.valid_at)",
        ];

        for index_query in indices {
            debug!("Creating index: {}", index_query);
            self.graph
                .execute(Query::new(index_query.to_string()))
                .await
                .map_err(|e| GraphError::DatabaseError(format!("failed to create index: {e}")))?;
        }
        Ok(())
    }

    fn params_for(edge: &EntityEdge) -> HashMap<String, Value> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(edge.uuid.to_string()));
        params.insert("source_node_uuid".into(), Value::String(edge.source_node_uuid.to_string()));
        params.insert("target_node_uuid".into(), Value::String(edge.target_node_uuid.to_string()));
        params.insert("name".into(), Value::String(edge.name.clone()));
        params.insert("fact".into(), Value::String(edge.fact.clone()));
        params.insert("fact_embedding".into(), serde_json::to_value(&edge.fact_embedding).unwrap());
        params.insert(
            "episodes".into(),
            Value::Array(edge.episodes.iter().map(|u| Value::String(u.to_string())).collect()),
        );
        params.insert("group_id".into(), Value::String(edge.group_id.to_string()));
        params.insert("created_at".into(), Value::String(edge.created_at.to_rfc3339()));
        params.insert("valid_at".into(), Value::String(edge.valid_at.to_rfc3339()));
        params.insert("invalid_at".into(), opt_dt(edge.invalid_at));
        params.insert("expired_at".into(), opt_dt(edge.expired_at));
        params.insert("updated_at".into(), opt_dt(edge.updated_at));
        params.insert("original_fact".into(), opt_str(&edge.original_fact));
        params.insert("update_reason".into(), opt_str(&edge.update_reason));
        params
    }

    fn row_to_edge(
        &self,
        source_node_uuid: Uuid,
        target_node_uuid: Uuid,
        rel: &neo4j::Relationship,
    ) -> Result<EntityEdge, GraphError> {
        let props = rel.properties();
        Ok(EntityEdge {
            uuid: uuid_prop(props, "uuid")?,
            source_node_uuid,
            target_node_uuid,
            name: str_prop(props, "name")?,
            fact: str_prop(props, "fact")?,
            fact_embedding: vec_f32_prop(props, "fact_embedding"),
            episodes: uuid_vec_prop(props, "episodes"),
            group_id: GroupId::new(str_prop(props, "group_id")?),
            created_at: dt_prop(props, "created_at")?,
            valid_at: dt_prop(props, "valid_at")?,
            invalid_at: opt_dt_prop(props, "invalid_at"),
            expired_at: opt_dt_prop(props, "expired_at"),
            updated_at: opt_dt_prop(props, "updated_at"),
            original_fact: opt_str_prop(props, "original_fact"),
            update_reason: opt_str_prop(props, "update_reason"),
        })
    }

    fn row_to_entity(&self, node: &neo4j::Node) -> Result<EntityNode, GraphError> {
        let props = node.properties();
        Ok(EntityNode {
            uuid: uuid_prop(props, "uuid")?,
            name: str_prop(props, "name")?,
            name_embedding: vec_f32_prop(props, "name_embedding"),
            summary: opt_str_prop(props, "summary"),
            labels: str_vec_prop(props, "labels"),
            attributes: props.get("attributes").cloned().unwrap_or(Value::Object(Default::default())),
            group_id: GroupId::new(str_prop(props, "group_id")?),
            created_at: dt_prop(props, "created_at")?,
        })
    }

    fn row_to_episode(&self, node: &neo4j::Node) -> Result<EpisodicNode, GraphError> {
        let props = node.properties();
        Ok(EpisodicNode {
            uuid: uuid_prop(props, "uuid")?,
            name: str_prop(props, "name")?,
            content: str_prop(props, "content")?,
            source: str_prop(props, "source")?
                .parse()
                .map_err(GraphError::DatabaseError)?,
            source_description: str_prop(props, "source_description")?,
            source_url: opt_str_prop(props, "source_url"),
            group_id: GroupId::new(str_prop(props, "group_id")?),
            created_at: dt_prop(props, "created_at")?,
            valid_at: dt_prop(props, "valid_at")?,
        })
    }
}

fn opt_dt(dt: Option<DateTime<Utc>>) -> Value {
    dt.map(|d| Value::String(d.to_rfc3339())).unwrap_or(Value::Null)
}

fn opt_str(s: &Option<String>) -> Value {
    s.clone().map(Value::String).unwrap_or(Value::Null)
}

fn str_prop(props: &HashMap<String, Value>, key: &str) -> Result<String, GraphError> {
    props
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| GraphError::DatabaseError(format!("missing property {key}")))
}

fn opt_str_prop(props: &HashMap<String, Value>, key: &str) -> Option<String> {
    props.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn uuid_prop(props: &HashMap<String, Value>, key: &str) -> Result<Uuid, GraphError> {
    let raw = str_prop(props, key)?;
    Uuid::parse_str(&raw).map_err(|e| GraphError::DatabaseError(format!("invalid uuid for {key}: {e}")))
}

fn dt_prop(props: &HashMap<String, Value>, key: &str) -> Result<DateTime<Utc>, GraphError> {
    let raw = str_prop(props, key)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| GraphError::DatabaseError(format!("invalid datetime for {key}: {e}")))
}

fn opt_dt_prop(props: &HashMap<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    props
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

fn vec_f32_prop(props: &HashMap<String, Value>, key: &str) -> Vec<f32> {
    props
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|x| x.as_f64()).map(|x| x as f32).collect())
        .unwrap_or_default()
}

fn str_vec_prop(props: &HashMap<String, Value>, key: &str) -> Vec<String> {
    props
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|x| x.as_str()).map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

fn uuid_vec_prop(props: &HashMap<String, Value>, key: &str) -> Vec<Uuid> {
    props
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|x| x.as_str())
                .filter_map(|s| Uuid::parse_str(s).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn save_episode(&self, episode: &EpisodicNode) -> Result<(), GraphError> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(episode.uuid.to_string()));
        params.insert("name".into(), Value::String(episode.name.clone()));
        params.insert("content".into(), Value::String(episode.content.clone()));
        params.insert("source".into(), Value::String(episode.source.to_string()));
        params.insert("source_description".into(), Value::String(episode.source_description.clone()));
        params.insert("source_url".into(), opt_str(&episode.source_url));
        params.insert("group_id".into(), Value::String(episode.group_id.to_string()));
        params.insert("created_at".into(), Value::String(episode.created_at.to_rfc3339()));
        params.insert("valid_at".into(), Value::String(episode.valid_at.to_rfc3339()));

        self.graph
            .execute(Query::new(queries::UPSERT_EPISODE.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("save_episode failed: {e}")))?;
        Ok(())
    }

    async fn get_episode(&self, uuid: Uuid) -> Result<Option<EpisodicNode>, GraphError> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(uuid.to_string()));
        let mut result = self
            .graph
            .execute(Query::new(queries::GET_EPISODE_BY_UUID.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("get_episode failed: {e}")))?;

        if let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            let node: neo4j::Node = row
                .get("e")
                .map_err(|e| GraphError::QueryFailed(format!("missing e: {e}")))?;
            return Ok(Some(self.row_to_episode(&node)?));
        }
        Ok(None)
    }

    async fn delete_episode(&self, uuid: Uuid) -> Result<bool, GraphError> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(uuid.to_string()));
        let mut result = self
            .graph
            .execute(Query::new(queries::DELETE_EPISODE.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("delete_episode failed: {e}")))?;

        if let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            let deleted: i64 = row
                .get("deleted")
                .map_err(|e| GraphError::QueryFailed(format!("missing deleted: {e}")))?;
            Ok(deleted > 0)
        } else {
            Ok(false)
        }
    }

    async fn list_episodes(&self, group_ids: &[GroupId], limit: u32) -> Result<Vec<EpisodicNode>, GraphError> {
        let mut params = HashMap::new();
        params.insert(
            "group_ids".into(),
            Value::Array(group_ids.iter().map(|g| Value::String(g.to_string())).collect()),
        );
        params.insert("limit".into(), Value::Number(limit.into()));

        let mut result = self
            .graph
            .execute(Query::new(queries::LIST_EPISODES_BY_GROUP.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("list_episodes failed: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            if let Ok(node) = row.get::<neo4j::Node>("e") {
                out.push(self.row_to_episode(&node)?);
            }
        }
        Ok(out)
    }

    async fn save_entity(&self, entity: &EntityNode) -> Result<(), GraphError> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(entity.uuid.to_string()));
        params.insert("name".into(), Value::String(entity.name.clone()));
        params.insert("name_embedding".into(), serde_json::to_value(&entity.name_embedding).unwrap());
        params.insert("summary".into(), opt_str(&entity.summary));
        params.insert(
            "labels".into(),
            Value::Array(entity.labels.iter().cloned().map(Value::String).collect()),
        );
        params.insert("attributes".into(), entity.attributes.clone());
        params.insert("group_id".into(), Value::String(entity.group_id.to_string()));
        params.insert("created_at".into(), Value::String(entity.created_at.to_rfc3339()));

        self.graph
            .execute(Query::new(queries::UPSERT_ENTITY.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("save_entity failed: {e}")))?;
        Ok(())
    }

    async fn get_entity(&self, uuid: Uuid) -> Result<Option<EntityNode>, GraphError> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(uuid.to_string()));
        let mut result = self
            .graph
            .execute(Query::new(queries::GET_ENTITY_BY_UUID.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("get_entity failed: {e}")))?;

        if let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            let node: neo4j::Node = row
                .get("n")
                .map_err(|e| GraphError::QueryFailed(format!("missing n: {e}")))?;
            return Ok(Some(self.row_to_entity(&node)?));
        }
        Ok(None)
    }

    async fn find_entity_by_name(&self, group_id: &GroupId, name: &str) -> Result<Option<EntityNode>, GraphError> {
        let mut params = HashMap::new();
        params.insert("group_id".into(), Value::String(group_id.to_string()));
        params.insert("name".into(), Value::String(name.to_string()));
        let mut result = self
            .graph
            .execute(Query::new(queries::FIND_ENTITY_BY_NAME.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("find_entity_by_name failed: {e}")))?;

        if let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            let node: neo4j::Node = row
                .get("n")
                .map_err(|e| GraphError::QueryFailed(format!("missing n: {e}")))?;
            return Ok(Some(self.row_to_entity(&node)?));
        }
        Ok(None)
    }

    async fn list_entities(&self, group_ids: &[GroupId], limit: u32) -> Result<Vec<EntityNode>, GraphError> {
        let mut params = HashMap::new();
        params.insert(
            "group_ids".into(),
            Value::Array(group_ids.iter().map(|g| Value::String(g.to_string())).collect()),
        );
        params.insert("limit".into(), Value::Number(limit.into()));

        let mut result = self
            .graph
            .execute(Query::new(queries::LIST_ENTITIES_BY_GROUP.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("list_entities failed: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            if let Ok(node) = row.get::<neo4j::Node>("n") {
                out.push(self.row_to_entity(&node)?);
            }
        }
        Ok(out)
    }

    async fn save_edge(&self, edge: &EntityEdge) -> Result<(), GraphError> {
        let params = Self::params_for(edge);
        self.graph
            .execute(Query::new(queries::SAVE_EDGE.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("save_edge failed: {e}")))?;
        Ok(())
    }

    async fn get_edge(&self, uuid: Uuid) -> Result<Option<EntityEdge>, GraphError> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(uuid.to_string()));
        let mut result = self
            .graph
            .execute(Query::new(queries::GET_EDGE_BY_UUID.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("get_edge failed: {e}")))?;

        if let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            let rel: neo4j::Relationship = row
                .get("r")
                .map_err(|e| GraphError::QueryFailed(format!("missing r: {e}")))?;
            let source_str: String = row
                .get("source_node_uuid")
                .map_err(|e| GraphError::QueryFailed(format!("missing source_node_uuid: {e}")))?;
            let target_str: String = row
                .get("target_node_uuid")
                .map_err(|e| GraphError::QueryFailed(format!("missing target_node_uuid: {e}")))?;
            let source = Uuid::parse_str(&source_str).map_err(|e| GraphError::DatabaseError(e.to_string()))?;
            let target = Uuid::parse_str(&target_str).map_err(|e| GraphError::DatabaseError(e.to_string()))?;
            return Ok(Some(self.row_to_edge(source, target, &rel)?));
        }
        Ok(None)
    }

    async fn expire_edge(&self, uuid: Uuid, expired_at: DateTime<Utc>) -> Result<(), GraphError> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(uuid.to_string()));
        params.insert("expired_at".into(), Value::String(expired_at.to_rfc3339()));
        self.graph
            .execute(Query::new(queries::EXPIRE_EDGE.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("expire_edge failed: {e}")))?;
        Ok(())
    }

    async fn delete_edge(&self, uuid: Uuid) -> Result<bool, GraphError> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(uuid.to_string()));
        let mut result = self
            .graph
            .execute(Query::new(queries::DELETE_EDGE.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("delete_edge failed: {e}")))?;

        if let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            let deleted: i64 = row
                .get("deleted")
                .map_err(|e| GraphError::QueryFailed(format!("missing deleted: {e}")))?;
            Ok(deleted > 0)
        } else {
            Ok(false)
        }
    }

    async fn find_current_edges_between(
        &self,
        source_node_uuid: Uuid,
        target_node_uuid: Uuid,
    ) -> Result<Vec<EntityEdge>, GraphError> {
        let mut params = HashMap::new();
        params.insert("source_node_uuid".into(), Value::String(source_node_uuid.to_string()));
        params.insert("target_node_uuid".into(), Value::String(target_node_uuid.to_string()));

        let mut result = self
            .graph
            .execute(Query::new(queries::FIND_CURRENT_EDGES_BETWEEN.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("find_current_edges_between failed: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            if let Ok(rel) = row.get::<neo4j::Relationship>("r") {
                out.push(self.row_to_edge(source_node_uuid, target_node_uuid, &rel)?);
            }
        }
        Ok(out)
    }

    async fn find_edges_by_group(&self, group_ids: &[GroupId], limit: u32) -> Result<Vec<EntityEdge>, GraphError> {
        let mut params = HashMap::new();
        params.insert(
            "group_ids".into(),
            Value::Array(group_ids.iter().map(|g| Value::String(g.to_string())).collect()),
        );
        params.insert("limit".into(), Value::Number(limit.into()));

        let mut result = self
            .graph
            .execute(Query::new(queries::FIND_EDGES_BY_GROUP.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("find_edges_by_group failed: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            if let (Ok(source_str), Ok(target_str), Ok(rel)) = (
                row.get::<String>("source_node_uuid"),
                row.get::<String>("target_node_uuid"),
                row.get::<neo4j::Relationship>("r"),
            ) {
                let source = Uuid::parse_str(&source_str).map_err(|e| GraphError::DatabaseError(e.to_string()))?;
                let target = Uuid::parse_str(&target_str).map_err(|e| GraphError::DatabaseError(e.to_string()))?;
                out.push(self.row_to_edge(source, target, &rel)?);
            }
        }
        Ok(out)
    }

    async fn save_mentions(&self, mentions: &MentionsEdge) -> Result<(), GraphError> {
        let mut params = HashMap::new();
        params.insert("uuid".into(), Value::String(mentions.uuid.to_string()));
        params.insert("episode_uuid".into(), Value::String(mentions.episode_uuid.to_string()));
        params.insert("entity_uuid".into(), Value::String(mentions.entity_uuid.to_string()));
        params.insert("group_id".into(), Value::String(mentions.group_id.to_string()));
        params.insert("created_at".into(), Value::String(mentions.created_at.to_rfc3339()));

        self.graph
            .execute(Query::new(queries::SAVE_MENTIONS.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("save_mentions failed: {e}")))?;
        Ok(())
    }

    async fn find_mentions_of_entity(&self, entity_uuid: Uuid) -> Result<Vec<MentionsEdge>, GraphError> {
        let mut params = HashMap::new();
        params.insert("entity_uuid".into(), Value::String(entity_uuid.to_string()));

        let mut result = self
            .graph
            .execute(Query::new(queries::FIND_MENTIONS_OF_ENTITY.to_string()).params(params))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("find_mentions_of_entity failed: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
        {
            if let (Ok(episode_str), Ok(rel)) =
                (row.get::<String>("episode_uuid"), row.get::<neo4j::Relationship>("r"))
            {
                let episode_uuid = Uuid::parse_str(&episode_str).map_err(|e| GraphError::DatabaseError(e.to_string()))?;
                let props = rel.properties();
                out.push(MentionsEdge {
                    uuid: uuid_prop(props, "uuid")?,
                    episode_uuid,
                    entity_uuid,
                    group_id: GroupId::new(str_prop(props, "group_id")?),
                    created_at: dt_prop(props, "created_at")?,
                });
            }
        }
        Ok(out)
    }

    async fn run_raw(&self, query: GraphQuery) -> Result<Vec<PathRelationship>, GraphError> {
        match query {
            GraphQuery::Raw { query, params } => {
                let mut result = self
                    .graph
                    .execute(Query::new(query).params(params))
                    .await
                    .map_err(|e| GraphError::QueryFailed(format!("raw query failed: {e}")))?;

                let mut out = Vec::new();
                while let Some(row) = result
                    .next()
                    .await
                    .map_err(|e| GraphError::QueryFailed(format!("fetch row failed: {e}")))?
                {
                    if let Ok(rel) = row.get::<neo4j::Relationship>("r") {
                        out.push(PathRelationship {
                            id: Uuid::new_v4(),
                            rel_type: rel.rel_type().clone(),
                            start_node_id: *rel.start_node_identity(),
                            end_node_id: *rel.end_node_identity(),
                            properties: serde_json::to_value(rel.properties().clone()).unwrap_or(Value::Null),
                        });
                    }
                }
                Ok(out)
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
                        properties: serde_json::to_value(&e).unwrap_or(Value::Null),
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
                        properties: serde_json::to_value(&e).unwrap_or(Value::Null),
                    })
                    .collect())
            }
        }
    }

    async fn health_check(&self) -> Result<(), GraphError> {
        debug!("Performing Neo4j health check");
        let mut result = self
            .graph
            .execute(Query::new(queries::HEALTH_CHECK.to_string()))
            .await
            .map_err(|e| GraphError::StoreUnavailable(format!("health check failed: {e}")))?;

        if result
            .next()
            .await
            .map_err(|e| GraphError::StoreUnavailable(format!("health check result failed: {e}")))?
            .is_some()
        {
            Ok(())
        } else {
            Err(GraphError::StoreUnavailable("health check returned no results".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neo4j_config_defaults() {
        let config = Neo4jConfig::new("bolt://localhost:7687").with_auth("neo4j", "password");
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.max_connections, 10);
    }
}
