//! Core data types for chronofact: the bitemporal episode/entity/fact model.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Advisory namespace applied to every node and edge. Isolation is not
/// enforced as auth; it is a filter callers are expected to supply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How an episode's raw content should be interpreted by extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeSource {
    Text,
    Message,
    Json,
}

impl std::fmt::Display for EpisodeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EpisodeSource::Text => "text",
            EpisodeSource::Message => "message",
            EpisodeSource::Json => "json",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EpisodeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(EpisodeSource::Text),
            "message" => Ok(EpisodeSource::Message),
            "json" => Ok(EpisodeSource::Json),
            other => Err(format!("unknown episode source: {other}")),
        }
    }
}

/// One ingested event record; the unit of provenance for every fact and
/// entity it mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodicNode {
    pub uuid: Uuid,
    pub name: String,
    pub content: String,
    pub source: EpisodeSource,
    pub source_description: String,
    /// First-class origin URL. See `source_url_or_legacy` for records written
    /// before this field existed.
    pub source_url: Option<String>,
    pub group_id: GroupId,
    pub created_at: DateTime<Utc>,
    pub valid_at: DateTime<Utc>,
}

static LEGACY_SOURCE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"source_url:\s*(https?://\S+)").unwrap());

impl EpisodicNode {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        source: EpisodeSource,
        group_id: GroupId,
        valid_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            source,
            source_description: String::new(),
            source_url: None,
            group_id,
            created_at: now,
            valid_at,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_source_description(mut self, description: impl Into<String>) -> Self {
        self.source_description = description.into();
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// The origin URL, preferring the first-class field and falling back to
    /// the legacy `source_url: <url>` convention embedded in
    /// `source_description` for episodes written before promotion.
    pub fn source_url_or_legacy(&self) -> Option<String> {
        self.source_url.clone().or_else(|| {
            LEGACY_SOURCE_URL_RE
                .captures(&self.source_description)
                .map(|c| c[1].to_string())
        })
    }
}

/// A deduplicated real-world referent mentioned by one or more episodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityNode {
    pub uuid: Uuid,
    pub name: String,
    pub name_embedding: Vec<f32>,
    pub summary: Option<String>,
    pub labels: Vec<String>,
    pub attributes: serde_json::Value,
    pub group_id: GroupId,
    pub created_at: DateTime<Utc>,
}

impl EntityNode {
    pub fn new(name: impl Into<String>, group_id: GroupId) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            name_embedding: Vec::new(),
            summary: None,
            labels: Vec::new(),
            attributes: serde_json::Value::Object(Default::default()),
            group_id,
            created_at: Utc::now(),
        }
    }

    pub fn with_name_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.name_embedding = embedding;
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// A directed fact between two entity nodes, the bitemporal unit of the
/// graph. See `core::facts` for the update-without-mutation protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEdge {
    pub uuid: Uuid,
    pub source_node_uuid: Uuid,
    pub target_node_uuid: Uuid,
    pub name: String,
    pub fact: String,
    pub fact_embedding: Vec<f32>,
    /// Episodic-node uuids supporting this fact; the citation back-pointer.
    pub episodes: Vec<Uuid>,
    pub group_id: GroupId,
    pub created_at: DateTime<Utc>,
    pub valid_at: DateTime<Utc>,
    pub invalid_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub original_fact: Option<String>,
    pub update_reason: Option<String>,
}

impl EntityEdge {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_node_uuid: Uuid,
        target_node_uuid: Uuid,
        name: impl Into<String>,
        fact: impl Into<String>,
        fact_embedding: Vec<f32>,
        episodes: Vec<Uuid>,
        group_id: GroupId,
        valid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            source_node_uuid,
            target_node_uuid,
            name: name.into(),
            fact: fact.into(),
            fact_embedding,
            episodes,
            group_id,
            created_at: Utc::now(),
            valid_at,
            invalid_at: None,
            expired_at: None,
            updated_at: None,
            original_fact: None,
            update_reason: None,
        }
    }

    /// At a given instant, is this the current (non-superseded) version?
    pub fn is_current_at(&self, t: DateTime<Utc>) -> bool {
        self.expired_at.is_none() && self.invalid_at.map_or(true, |end| end > t)
    }
}

/// Episode -> Entity relationship created by extraction; traversed for
/// entity citation resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionsEdge {
    pub uuid: Uuid,
    pub episode_uuid: Uuid,
    pub entity_uuid: Uuid,
    pub group_id: GroupId,
    pub created_at: DateTime<Utc>,
}

impl MentionsEdge {
    pub fn new(episode_uuid: Uuid, entity_uuid: Uuid, group_id: GroupId) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            episode_uuid,
            entity_uuid,
            group_id,
            created_at: Utc::now(),
        }
    }
}

/// Query structure for the graph store's escape-hatch and structured reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GraphQuery {
    Raw {
        query: String,
        params: HashMap<String, serde_json::Value>,
    },
    FindEdgesByGroup {
        group_ids: Vec<GroupId>,
        limit: Option<u32>,
    },
    CurrentEdgesBetween {
        source_node_uuid: Uuid,
        target_node_uuid: Uuid,
    },
}

/// A node or edge in a raw query result (used by the `run_raw` escape hatch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathNode {
    pub id: Uuid,
    pub labels: Vec<String>,
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRelationship {
    pub id: Uuid,
    pub rel_type: String,
    pub start_node_id: Uuid,
    pub end_node_id: Uuid,
    pub properties: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_source_url_extraction() {
        let ep = EpisodicNode::new(
            "e1",
            "body",
            EpisodeSource::Text,
            GroupId::new("g1"),
            Utc::now(),
        )
        .with_source_description("ingested from source_url: https://example.com/alert/1 at 10pm");
        assert_eq!(
            ep.source_url_or_legacy(),
            Some("https://example.com/alert/1".to_string())
        );
    }

    #[test]
    fn first_class_source_url_wins() {
        let ep = EpisodicNode::new(
            "e1",
            "body",
            EpisodeSource::Text,
            GroupId::new("g1"),
            Utc::now(),
        )
        .with_source_description("source_url: https://legacy.example.com/x")
        .with_source_url("https://new.example.com/y");
        assert_eq!(
            ep.source_url_or_legacy(),
            Some("https://new.example.com/y".to_string())
        );
    }

    #[test]
    fn edge_current_at_respects_expiry_and_invalidity() {
        let now = Utc::now();
        let mut edge = EntityEdge::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "WORKS_AT",
            "Alice works at Acme",
            vec![0.1, 0.2],
            vec![Uuid::new_v4()],
            GroupId::new("g1"),
            now,
        );
        assert!(edge.is_current_at(now));
        edge.expired_at = Some(now);
        assert!(!edge.is_current_at(now));
    }
}
