//! Cypher query text for the Neo4j-compatible graph store.

pub const UPSERT_EPISODE: &str = r#"
MERGE (e:Episode {uuid: $uuid})
SET e.name = $name,
    e.content = $content,
    e.source = $source,
    e.source_description = $source_description,
    e.source_url = $source_url,
    e.group_id = $group_id,
    e.created_at = $created_at,
    e.valid_at = $valid_at
"#;

pub const GET_EPISODE_BY_UUID: &str = r#"
MATCH (e:Episode {uuid: $uuid})
RETURN e
"#;

pub const DELETE_EPISODE: &str = r#"
MATCH (e:Episode {uuid: $uuid})
DETACH DELETE e
RETURN count(e) as deleted
"#;

pub const LIST_EPISODES_BY_GROUP: &str = r#"
MATCH (e:Episode)
WHERE e.group_id IN $group_ids
RETURN e
ORDER BY e.created_at DESC
LIMIT $limit
"#;

pub const UPSERT_ENTITY: &str = r#"
MERGE (n:Entity {uuid: $uuid})
SET n.name = $name,
    n.name_embedding = $name_embedding,
    n.summary = $summary,
    n.labels = $labels,
    n.attributes = $attributes,
    n.group_id = $group_id,
    n.created_at = $created_at
"#;

pub const GET_ENTITY_BY_UUID: &str = r#"
MATCH (n:Entity {uuid: $uuid})
RETURN n
"#;

pub const FIND_ENTITY_BY_NAME: &str = r#"
MATCH (n:Entity {group_id: $group_id, name: $name})
RETURN n
LIMIT 1
"#;

pub const LIST_ENTITIES_BY_GROUP: &str = r#"
MATCH (n:Entity)
WHERE n.group_id IN $group_ids
RETURN n
LIMIT $limit
"#;

/// Create a fact edge between two already-existing entity nodes.
pub const SAVE_EDGE: &str = r#"
MATCH (source:Entity {uuid: $source_node_uuid})
MATCH (target:Entity {uuid: $target_node_uuid})
MERGE (source)-[r:RELATES_TO {uuid: $uuid}]->(target)
SET r.name = $name,
    r.fact = $fact,
    r.fact_embedding = $fact_embedding,
    r.episodes = $episodes,
    r.group_id = $group_id,
    r.created_at = $created_at,
    r.valid_at = $valid_at,
    r.invalid_at = $invalid_at,
    r.expired_at = $expired_at,
    r.updated_at = $updated_at,
    r.original_fact = $original_fact,
    r.update_reason = $update_reason
"#;

pub const GET_EDGE_BY_UUID: &str = r#"
MATCH (source:Entity)-[r:RELATES_TO {uuid: $uuid}]->(target:Entity)
RETURN source.uuid as source_node_uuid, target.uuid as target_node_uuid, r
"#;

/// Direct property update, not a full edge rewrite -- spec's bitemporal
/// update protocol only ever mutates `expired_at` on the superseded version.
pub const EXPIRE_EDGE: &str = r#"
MATCH ()-[r:RELATES_TO {uuid: $uuid}]->()
SET r.expired_at = $expired_at
"#;

pub const DELETE_EDGE: &str = r#"
MATCH ()-[r:RELATES_TO {uuid: $uuid}]->()
DELETE r
RETURN count(r) as deleted
"#;

pub const FIND_CURRENT_EDGES_BETWEEN: &str = r#"
MATCH (source:Entity {uuid: $source_node_uuid})-[r:RELATES_TO]->(target:Entity {uuid: $target_node_uuid})
WHERE r.expired_at IS NULL
RETURN source.uuid as source_node_uuid, target.uuid as target_node_uuid, r
"#;

pub const FIND_EDGES_BY_GROUP: &str = r#"
MATCH (source:Entity)-[r:RELATES_TO]->(target:Entity)
WHERE r.group_id IN $group_ids
RETURN source.uuid as source_node_uuid, target.uuid as target_node_uuid, r
LIMIT $limit
"#;

pub const SAVE_MENTIONS: &str = r#"
MATCH (e:Episode {uuid: $episode_uuid})
MATCH (n:Entity {uuid: $entity_uuid})
MERGE (e)-[r:MENTIONS {uuid: $uuid}]->(n)
SET r.group_id = $group_id,
    r.created_at = $created_at
"#;

pub const FIND_MENTIONS_OF_ENTITY: &str = r#"
MATCH (e:Episode)-[r:MENTIONS]->(n:Entity {uuid: $entity_uuid})
RETURN e.uuid as episode_uuid, n.uuid as entity_uuid, r
"#;

pub const HEALTH_CHECK: &str = "RETURN 1 as ok";
