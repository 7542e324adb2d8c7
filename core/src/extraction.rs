//! Extraction Pipeline (C3): turns an episode body into entities and facts,
//! deduplicating against what's already in the namespace.

use crate::errors::{CoreError, GraphError, LlmError};
use crate::facts::{FactService, FactUpdateRequest};
use crate::scoring::cosine_similarity;
use crate::traits::{EmbedderGateway, GenerationRequest, GraphStore, LlmGateway, LlmMessage};
use crate::types::{EntityEdge, EntityNode, EpisodeSource, EpisodicNode, GroupId, MentionsEdge};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Runtime-constructed schema descriptor for a custom entity type, passed to
/// the extraction prompt. No reflective type creation — just a name the LLM
/// is asked to use as a label and a description steering it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTypeSchema {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtractionEnvelope {
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
    #[serde(default)]
    pub facts: Vec<ExtractedFact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub id_alias: String,
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub source_id_alias: String,
    pub target_id_alias: String,
    pub name: String,
    pub fact: String,
    #[serde(default)]
    pub valid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invalid_at: Option<DateTime<Utc>>,
}

pub fn extraction_response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "entities": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id_alias": {"type": "string"},
                        "name": {"type": "string"},
                        "labels": {"type": "array", "items": {"type": "string"}},
                        "summary": {"type": "string"},
                        "attributes": {"type": "object"}
                    },
                    "required": ["id_alias", "name"]
                }
            },
            "facts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "source_id_alias": {"type": "string"},
                        "target_id_alias": {"type": "string"},
                        "name": {"type": "string"},
                        "fact": {"type": "string"},
                        "valid_at": {"type": "string"},
                        "invalid_at": {"type": "string"}
                    },
                    "required": ["source_id_alias", "target_id_alias", "name", "fact"]
                }
            }
        },
        "required": ["entities", "facts"]
    })
}

fn build_extraction_prompt(entity_types: &[EntityTypeSchema]) -> String {
    let mut prompt = String::from(
        "Extract entities and the facts (relationships) between them from the following \
         episode text. Respond with JSON matching the provided schema. Every fact must \
         reference entities by id_alias declared in the entities array.",
    );
    if !entity_types.is_empty() {
        prompt.push_str("\n\nUse these entity types where applicable:\n");
        for t in entity_types {
            prompt.push_str(&format!("- {}: {}\n", t.name, t.description));
        }
    }
    prompt
}

#[derive(Debug, Clone)]
pub struct AddEpisodeRequest {
    pub group_id: GroupId,
    pub name: String,
    pub content: String,
    pub source: EpisodeSource,
    pub source_description: String,
    pub source_url: Option<String>,
    pub uuid: Option<Uuid>,
    pub reference_time: Option<DateTime<Utc>>,
    pub entity_types: Vec<EntityTypeSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddEpisodeResult {
    pub episode_uuid: Uuid,
    pub episode_name: String,
    pub entities_created: usize,
    pub entities_linked: usize,
    pub edges_created: usize,
    pub edges_updated: usize,
}

pub struct ExtractionService {
    store: Arc<dyn GraphStore>,
    llm: Arc<dyn LlmGateway>,
    embedder: Arc<dyn EmbedderGateway>,
    facts: FactService,
    /// Cosine-similarity floor above which two candidates are treated as
    /// the same real-world referent / fact.
    similarity_threshold: f32,
}

impl ExtractionService {
    pub fn new(
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn LlmGateway>,
        embedder: Arc<dyn EmbedderGateway>,
        similarity_threshold: f32,
    ) -> Self {
        let facts = FactService::new(store.clone(), embedder.clone());
        Self { store, llm, embedder, facts, similarity_threshold }
    }

    /// Runs the full pipeline described in spec §4.3. Idempotent on retry
    /// when `request.uuid` is supplied and already exists (P6, B2 from
    /// S1-style scenarios): re-processing returns the prior result without
    /// creating a second episodic node.
    pub async fn add_episode(&self, request: AddEpisodeRequest) -> Result<AddEpisodeResult, CoreError> {
        if let Some(uuid) = request.uuid {
            if let Some(existing) = self.store.get_episode(uuid).await? {
                return Ok(AddEpisodeResult {
                    episode_uuid: existing.uuid,
                    episode_name: existing.name,
                    entities_created: 0,
                    entities_linked: 0,
                    edges_created: 0,
                    edges_updated: 0,
                });
            }
        }

        let now = Utc::now();
        let mut episode = EpisodicNode::new(
            request.name.clone(),
            request.content.clone(),
            request.source,
            request.group_id.clone(),
            request.reference_time.unwrap_or(now),
        )
        .with_source_description(request.source_description.clone());
        if let Some(url) = &request.source_url {
            episode = episode.with_source_url(url.clone());
        }
        if let Some(uuid) = request.uuid {
            episode = episode.with_uuid(uuid);
        }
        self.store.save_episode(&episode).await?;

        let envelope = self.extract(&episode, &request.entity_types).await?;

        let mut alias_to_uuid = std::collections::HashMap::new();
        let mut entities_created = 0usize;
        let mut entities_linked = 0usize;

        for extracted in &envelope.entities {
            let embedding = self.embedder.embed(&extracted.name).await?;
            let resolved = self
                .resolve_entity(&request.group_id, &extracted.name, &embedding)
                .await?;

            let entity_uuid = match resolved {
                Some(existing) => {
                    entities_linked += 1;
                    existing
                }
                None => {
                    let entity = EntityNode::new(extracted.name.clone(), request.group_id.clone())
                        .with_name_embedding(embedding)
                        .with_labels(extracted.labels.clone())
                        .with_summary(extracted.summary.clone().unwrap_or_default());
                    self.store.save_entity(&entity).await?;
                    entities_created += 1;
                    entity.uuid
                }
            };
            alias_to_uuid.insert(extracted.id_alias.clone(), entity_uuid);

            let mentions = MentionsEdge::new(episode.uuid, entity_uuid, request.group_id.clone());
            self.store.save_mentions(&mentions).await?;
        }

        let mut edges_created = 0usize;
        let mut edges_updated = 0usize;

        for candidate in &envelope.facts {
            let (Some(&source_uuid), Some(&target_uuid)) = (
                alias_to_uuid.get(&candidate.source_id_alias),
                alias_to_uuid.get(&candidate.target_id_alias),
            ) else {
                continue;
            };

            let fact_embedding = self.embedder.embed(&candidate.fact).await?;
            let existing = self.store.find_current_edges_between(source_uuid, target_uuid).await?;
            let equivalent = find_most_similar(&existing, &fact_embedding, self.similarity_threshold);

            match equivalent {
                Some(edge) if edge.fact == candidate.fact => {
                    // Same fact re-observed: just attach the new citation.
                    let mut updated = edge.clone();
                    if !updated.episodes.contains(&episode.uuid) {
                        updated.episodes.push(episode.uuid);
                    }
                    if let Some(valid_at) = candidate.valid_at {
                        updated.valid_at = valid_at;
                    }
                    self.store.save_edge(&updated).await?;
                    edges_updated += 1;
                }
                Some(edge) => {
                    // Superseded by new evidence: expire old, create new
                    // version carrying forward citations plus this episode.
                    self.facts
                        .update_fact(
                            FactUpdateRequest {
                                uuid: edge.uuid,
                                fact: candidate.fact.clone(),
                                source_node_uuid: None,
                                target_node_uuid: None,
                                update_reason: Some("superseded by new episode evidence".into()),
                            },
                            Some(episode.uuid),
                        )
                        .await?;
                    edges_updated += 1;
                }
                None => {
                    let mut edge = EntityEdge::new(
                        source_uuid,
                        target_uuid,
                        candidate.name.clone(),
                        candidate.fact.clone(),
                        fact_embedding,
                        vec![episode.uuid],
                        request.group_id.clone(),
                        candidate.valid_at.unwrap_or(episode.valid_at),
                    );
                    edge.invalid_at = candidate.invalid_at;
                    self.store.save_edge(&edge).await?;
                    edges_created += 1;
                }
            }
        }

        Ok(AddEpisodeResult {
            episode_uuid: episode.uuid,
            episode_name: episode.name,
            entities_created,
            entities_linked,
            edges_created,
            edges_updated,
        })
    }

    async fn extract(
        &self,
        episode: &EpisodicNode,
        entity_types: &[EntityTypeSchema],
    ) -> Result<ExtractionEnvelope, CoreError> {
        let request = GenerationRequest::new(vec![LlmMessage::user(episode.content.clone())])
            .with_system_prompt(build_extraction_prompt(entity_types))
            .with_response_schema(extraction_response_schema());

        let response = self.llm.generate(request).await?;
        let parsed = response
            .parsed
            .ok_or_else(|| LlmError::ResponseParseError("extraction response was not structured JSON".into()))?;
        serde_json::from_value(parsed)
            .map_err(|e| CoreError::Llm(LlmError::ResponseParseError(e.to_string())))
    }

    async fn resolve_entity(
        &self,
        group_id: &GroupId,
        name: &str,
        embedding: &[f32],
    ) -> Result<Option<Uuid>, GraphError> {
        if let Some(exact) = self.store.find_entity_by_name(group_id, name).await? {
            return Ok(Some(exact.uuid));
        }
        let candidates = self.store.list_entities(std::slice::from_ref(group_id), 500).await?;
        let mut best: Option<(Uuid, f32)> = None;
        for candidate in candidates {
            let score = cosine_similarity(&candidate.name_embedding, embedding);
            if score >= self.similarity_threshold && best.as_ref().map_or(true, |(_, b)| score > *b) {
                best = Some((candidate.uuid, score));
            }
        }
        Ok(best.map(|(uuid, _)| uuid))
    }
}

fn find_most_similar<'a>(edges: &'a [EntityEdge], embedding: &[f32], threshold: f32) -> Option<&'a EntityEdge> {
    edges
        .iter()
        .map(|e| (e, cosine_similarity(&e.fact_embedding, embedding)))
        .filter(|(_, score)| *score >= threshold)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(e, _)| e)
} 