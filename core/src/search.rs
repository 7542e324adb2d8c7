//! Hybrid Search (C6): fact and node search fusing vector similarity,
//! BM25-style lexical scoring, reciprocal rank fusion, and optional
//! graph-distance re-ranking from a center node.

use crate::errors::CoreError;
use crate::facts::{Citation, FactService};
use crate::scoring::{bm25_score, cosine_similarity, rank_by_score, reciprocal_rank_fusion};
use crate::traits::{EmbedderGateway, GraphStore};
use crate::types::{EntityEdge, EntityNode, EpisodicNode, GroupId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

const RRF_K: f32 = 60.0;
const CANDIDATE_SCAN_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub group_ids: Vec<GroupId>,
    pub entity_type_labels: Vec<String>,
    pub center_node_uuid: Option<Uuid>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FactSearchResult {
    pub edge: EntityEdge,
    pub score: f32,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeSearchResult {
    pub node: EntityNode,
    pub score: f32,
}

pub struct HybridSearch {
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn EmbedderGateway>,
    facts: FactService,
}

impl HybridSearch {
    pub fn new(store: Arc<dyn GraphStore>, embedder: Arc<dyn EmbedderGateway>) -> Self {
        let facts = FactService::new(store.clone(), embedder.clone());
        Self { store, embedder, facts }
    }

    /// Ranks `RELATES_TO` edges. `max_results = 0` is a caller error
    /// (B1); validate before calling.
    pub async fn search_facts(
        &self,
        query: &str,
        filters: &SearchFilters,
        max_results: usize,
    ) -> Result<Vec<FactSearchResult>, CoreError> {
        let candidates: Vec<EntityEdge> = self
            .store
            .find_edges_by_group(&filters.group_ids, CANDIDATE_SCAN_LIMIT)
            .await?
            .into_iter()
            .filter(|e| e.expired_at.is_none())
            .collect();

        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let query_embedding = self.embedder.embed(query).await?;
        let facts_corpus: Vec<&str> = candidates.iter().map(|e| e.fact.as_str()).collect();

        let vector_scored: Vec<(Uuid, f32)> = candidates
            .iter()
            .map(|e| (e.uuid, cosine_similarity(&e.fact_embedding, &query_embedding)))
            .collect();
        let lexical_scored: Vec<(Uuid, f32)> = candidates
            .iter()
            .map(|e| (e.uuid, bm25_score(query, &e.fact, &facts_corpus)))
            .collect();

        let vector_ranking = rank_by_score(&vector_scored);
        let lexical_ranking = rank_by_score(&lexical_scored);
        let mut fused = reciprocal_rank_fusion(&[vector_ranking, lexical_ranking], RRF_K);

        if let Some(center) = filters.center_node_uuid {
            let distances = bfs_distances(&candidates, center);
            for edge in &candidates {
                let dist = distances
                    .get(&edge.source_node_uuid)
                    .or_else(|| distances.get(&edge.target_node_uuid));
                if let Some(&d) = dist {
                    // promote closer edges: add a bounded bonus that decays with distance
                    *fused.entry(edge.uuid).or_insert(0.0) += 1.0 / (1.0 + d as f32);
                }
            }
        }

        let mut ranked: Vec<(&EntityEdge, f32)> = candidates
            .iter()
            .map(|e| (e, *fused.get(&e.uuid).unwrap_or(&0.0)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(max_results);

        let mut results = Vec::with_capacity(ranked.len());
        for (edge, score) in ranked {
            let citations = self.facts.citations_for_edge(edge).await?;
            results.push(FactSearchResult { edge: edge.clone(), score, citations });
        }
        Ok(results)
    }

    /// Ranks entity nodes by name similarity.
    pub async fn search_nodes(
        &self,
        query: &str,
        filters: &SearchFilters,
        max_results: usize,
    ) -> Result<Vec<NodeSearchResult>, CoreError> {
        let mut candidates = self.store.list_entities(&filters.group_ids, CANDIDATE_SCAN_LIMIT).await?;
        if !filters.entity_type_labels.is_empty() {
            candidates.retain(|n| n.labels.iter().any(|l| filters.entity_type_labels.contains(l)));
        }
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let query_embedding = self.embedder.embed(query).await?;
        let names_corpus: Vec<&str> = candidates.iter().map(|n| n.name.as_str()).collect();

        let vector_scored: Vec<(Uuid, f32)> = candidates
            .iter()
            .map(|n| (n.uuid, cosine_similarity(&n.name_embedding, &query_embedding)))
            .collect();
        let lexical_scored: Vec<(Uuid, f32)> = candidates
            .iter()
            .map(|n| (n.uuid, bm25_score(query, &n.name, &names_corpus)))
            .collect();

        let vector_ranking = rank_by_score(&vector_scored);
        let lexical_ranking = rank_by_score(&lexical_scored);
        let fused = reciprocal_rank_fusion(&[vector_ranking, lexical_ranking], RRF_K);

        let mut ranked: Vec<(EntityNode, f32)> = candidates
            .into_iter()
            .map(|n| {
                let score = *fused.get(&n.uuid).unwrap_or(&0.0);
                (n, score)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(max_results);

        Ok(ranked.into_iter().map(|(node, score)| NodeSearchResult { node, score }).collect())
    }

    /// Plain `created_at`-descending scan, filtered by group.
    pub async fn search_episodes(
        &self,
        filters: &SearchFilters,
        max_results: usize,
    ) -> Result<Vec<EpisodicNode>, CoreError> {
        let mut episodes = self.store.list_episodes(&filters.group_ids, CANDIDATE_SCAN_LIMIT).await?;
        episodes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        episodes.truncate(max_results);
        Ok(episodes)
    }
}

/// Shortest hop distance from `center` to every node reachable through the
/// candidate edge set, treated as undirected for distance purposes.
fn bfs_distances(edges: &[EntityEdge], center: Uuid) -> HashMap<Uuid, usize> {
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for e in edges {
        adjacency.entry(e.source_node_uuid).or_default().push(e.target_node_uuid);
        adjacency.entry(e.target_node_uuid).or_default().push(e.source_node_uuid);
    }

    let mut distances = HashMap::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    distances.insert(center, 0);
    visited.insert(center);
    queue.push_back(center);

    while let Some(node) = queue.pop_front() {
        let d = distances[&node];
        if let Some(neighbors) = adjacency.get(&node) {
            for &next in neighbors {
                if visited.insert(next) {
                    distances.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bfs_distance_grows_with_hops() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let edges = vec![
            EntityEdge::new(a, b, "R", "a relates to b", vec![], vec![], GroupId::new("g"), chrono::Utc::now()),
            EntityEdge::new(b, c, "R", "b relates to c", vec![], vec![], GroupId::new("g"), chrono::Utc::now()),
        ];
        let distances = bfs_distances(&edges, a);
        assert_eq!(distances[&a], 0);
        assert_eq!(distances[&b], 1);
        assert_eq!(distances[&c], 2);
    }
}
