//! Causality & Recurrence Analytics (C7): post-processing the graph into
//! timelines, recurrence clusters, and CVR-style funnel metrics.

use crate::errors::CoreError;
use crate::scoring::cosine_similarity;
use crate::traits::{EmbedderGateway, GenerationRequest, GraphStore, LlmGateway, LlmMessage};
use crate::types::GroupId;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

static CAUSE_CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Labels:\s*Alert;\s*(reason/\w+)").unwrap());
static ROOT_CAUSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)root cause").unwrap());

/// Keyword set a fact's text must contain (case-insensitive) to count as a
/// causality-chain edge.
const CAUSALITY_KEYWORDS: &[&str] = &[
    "caused", "triggered", "linked", "introduced", "resulted in", "led to",
    "due to", "because of", "rolled back", "mitigated", "resolved by",
];

/// Additional keywords that count an incident as "severe" for component
/// severity conversion, beyond the `WARNING:2`/`CRITICAL` name match.
const SEVERE_RELATION_KEYWORDS: &[&str] = &["pagerduty", "triggered", "slo"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Entity names excluded from causality component sets: pager systems,
    /// generic infra tooling, and example/placeholder URLs. Externalized
    /// per the source's "hardcoded blocklist" design note.
    pub tool_entity_blocklist: Vec<String>,
    pub min_incidents: usize,
    pub min_flow_count: usize,
    pub similarity_threshold: f32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            tool_entity_blocklist: vec![
                "pagerduty".into(),
                "slack".into(),
                "git".into(),
                "github".into(),
                "runbook".into(),
                "dashboard".into(),
                "example.com".into(),
            ],
            min_incidents: 2,
            min_flow_count: 2,
            similarity_threshold: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalityChainEntry {
    pub source_name: String,
    pub relation: String,
    pub target_name: String,
    pub fact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: DateTime<Utc>,
    pub episode_uuid: Uuid,
    pub episode_name: String,
    pub cause_category: Option<String>,
    pub causality_chains: Vec<CausalityChainEntry>,
    pub components: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComponentHistory {
    pub occurrences: usize,
    pub first_incident: Option<DateTime<Utc>>,
    pub last_incident: Option<DateTime<Utc>>,
    pub incidents: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineFilters {
    pub group_ids: Vec<GroupId>,
    pub component: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalityTimeline {
    pub timeline: Vec<TimelineEntry>,
    pub component_history: HashMap<String, ComponentHistory>,
    pub total_episodes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub episode_a: Uuid,
    pub episode_b: Uuid,
    pub embedding_similarity: f32,
    pub llm_similarity_score: Option<f32>,
    pub similarity_reason: Option<String>,
    pub common_pattern: Option<String>,
    pub interval_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentImpact {
    pub category: String,
    pub component: String,
    pub occurrences: usize,
    pub contribution_rate: f32,
    pub severity_weighted_rate: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSeverity {
    pub component: String,
    pub total: usize,
    pub severe: usize,
    pub severe_rate: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowMetric {
    pub category: String,
    pub component: String,
    pub total_flows: usize,
    pub component_to_severe_rate: f32,
    pub severe_to_slo_rate: f32,
    pub end_to_end_cvr: f32,
}

pub fn parse_cause_category(content: &str) -> Option<String> {
    CAUSE_CATEGORY_RE.captures(content).map(|c| c[1].to_string())
}

fn is_severe_name(name: &str) -> bool {
    name.contains("WARNING:2") || name.contains("CRITICAL")
}

fn is_causality_fact(fact: &str) -> bool {
    let lower = fact.to_lowercase();
    CAUSALITY_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_severe_relation(fact: &str) -> bool {
    let lower = fact.to_lowercase();
    SEVERE_RELATION_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Root cause section: the text following a line containing "Root cause".
/// A structured `root_cause` field supersedes this heuristic when present
/// in episode content as `Root cause: <text>` on a single line; otherwise
/// falls back to joining the lines after the marker line.
pub fn extract_root_cause(content: &str) -> Option<String> {
    let lines: Vec<&str> = content.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if let Some(idx) = ROOT_CAUSE_RE.find(line) {
            let same_line_tail = line[idx.end()..].trim_start_matches([':', ' ', '-']).trim();
            if !same_line_tail.is_empty() {
                return Some(same_line_tail.to_string());
            }
            let rest: String = lines[i + 1..]
                .iter()
                .take_while(|l| !l.trim().is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
            if !rest.trim().is_empty() {
                return Some(rest.trim().to_string());
            }
        }
    }
    None
}

pub struct AnalyticsService {
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn EmbedderGateway>,
    llm: Arc<dyn LlmGateway>,
    config: AnalyticsConfig,
}

impl AnalyticsService {
    pub fn new(
        store: Arc<dyn GraphStore>,
        embedder: Arc<dyn EmbedderGateway>,
        llm: Arc<dyn LlmGateway>,
        config: AnalyticsConfig,
    ) -> Self {
        Self { store, embedder, llm, config }
    }

    pub async fn causality_timeline(&self, filters: &TimelineFilters) -> Result<CausalityTimeline, CoreError> {
        let mut episodes = self.store.list_episodes(&filters.group_ids, 10_000).await?;
        episodes.sort_by_key(|e| e.valid_at);

        let mut timeline = Vec::with_capacity(episodes.len());
        let mut component_history: HashMap<String, ComponentHistory> = HashMap::new();

        for episode in &episodes {
            let cause_category = parse_cause_category(&episode.content);
            if let Some(cat_filter) = &filters.category {
                if cause_category.as_deref() != Some(cat_filter.as_str()) {
                    continue;
                }
            }

            let mentioned_entities = self.entities_mentioned_by(episode.uuid, &episode.group_id).await?;
            let entity_ids: std::collections::HashSet<Uuid> = mentioned_entities.iter().map(|e| e.uuid).collect();
            let name_by_id: HashMap<Uuid, String> =
                mentioned_entities.iter().map(|e| (e.uuid, e.name.clone())).collect();

            let edges = self
                .store
                .find_edges_by_group(std::slice::from_ref(&episode.group_id), 10_000)
                .await?;

            let mut chains = Vec::new();
            let mut components: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
            for edge in edges.iter().filter(|e| e.expired_at.is_none()) {
                if !entity_ids.contains(&edge.source_node_uuid) || !entity_ids.contains(&edge.target_node_uuid) {
                    continue;
                }
                if !is_causality_fact(&edge.fact) {
                    continue;
                }
                let source_name = name_by_id.get(&edge.source_node_uuid).cloned().unwrap_or_default();
                let target_name = name_by_id.get(&edge.target_node_uuid).cloned().unwrap_or_default();
                chains.push(CausalityChainEntry {
                    source_name: source_name.clone(),
                    relation: edge.name.clone(),
                    target_name: target_name.clone(),
                    fact: edge.fact.clone(),
                });
                for name in [&source_name, &target_name] {
                    if !self.is_blocklisted(name) {
                        components.insert(name.clone());
                    }
                }
            }

            if let Some(comp_filter) = &filters.component {
                if !components.contains(comp_filter) {
                    continue;
                }
            }

            for component in &components {
                let entry = component_history.entry(component.clone()).or_default();
                entry.occurrences += 1;
                entry.incidents.push(episode.uuid);
                entry.first_incident = Some(entry.first_incident.map_or(episode.valid_at, |t| t.min(episode.valid_at)));
                entry.last_incident = Some(entry.last_incident.map_or(episode.valid_at, |t| t.max(episode.valid_at)));
            }

            timeline.push(TimelineEntry {
                date: episode.valid_at,
                episode_uuid: episode.uuid,
                episode_name: episode.name.clone(),
                cause_category,
                causality_chains: chains,
                components: components.into_iter().collect(),
            });
        }

        let total_episodes = episodes.len();
        Ok(CausalityTimeline { timeline, component_history, total_episodes })
    }

    async fn entities_mentioned_by(
        &self,
        episode_uuid: Uuid,
        group_id: &GroupId,
    ) -> Result<Vec<crate::types::EntityNode>, CoreError> {
        let all_entities = self.store.list_entities(std::slice::from_ref(group_id), 10_000).await?;
        let mut mentioned = Vec::new();
        for entity in all_entities {
            let mentions = self.store.find_mentions_of_entity(entity.uuid).await?;
            if mentions.iter().any(|m| m.episode_uuid == episode_uuid) {
                mentioned.push(entity);
            }
        }
        Ok(mentioned)
    }

    fn is_blocklisted(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.config.tool_entity_blocklist.iter().any(|b| lower.contains(&b.to_lowercase()))
    }

    /// Recurrence detection (advanced): pairwise root-cause similarity,
    /// LLM-adjudicated when the embedding similarity crosses `threshold`.
    pub async fn recurring_incidents(
        &self,
        filters: &TimelineFilters,
        min_occurrences: usize,
        similarity_threshold: f32,
        use_llm: bool,
    ) -> Result<Vec<RecurrencePattern>, CoreError> {
        let episodes = self.store.list_episodes(&filters.group_ids, 10_000).await?;
        let with_root_cause: Vec<_> = episodes
            .iter()
            .filter_map(|e| extract_root_cause(&e.content).map(|rc| (e, rc)))
            .collect();

        let mut patterns = Vec::new();
        for i in 0..with_root_cause.len() {
            for j in (i + 1)..with_root_cause.len() {
                let (ep_a, rc_a) = &with_root_cause[i];
                let (ep_b, rc_b) = &with_root_cause[j];

                let emb_a = self.embedder.embed(rc_a).await?;
                let emb_b = self.embedder.embed(rc_b).await?;
                let similarity = cosine_similarity(&emb_a, &emb_b);

                if similarity < similarity_threshold {
                    continue;
                }

                let mut llm_score = None;
                let mut reason = None;
                let mut common_pattern = None;
                let mut is_recurring = true;

                if use_llm {
                    let judgment = self.judge_recurrence(rc_a, rc_b).await?;
                    is_recurring = judgment.is_recurring;
                    llm_score = Some(judgment.similarity_score);
                    reason = Some(judgment.similarity_reason);
                    common_pattern = Some(judgment.common_pattern);
                }

                if is_recurring {
                    patterns.push(RecurrencePattern {
                        episode_a: ep_a.uuid,
                        episode_b: ep_b.uuid,
                        embedding_similarity: similarity,
                        llm_similarity_score: llm_score,
                        similarity_reason: reason,
                        common_pattern,
                        interval_days: (ep_b.valid_at - ep_a.valid_at).num_days().abs(),
                    });
                }
            }
        }

        if patterns.len() < min_occurrences {
            return Ok(vec![]);
        }
        Ok(patterns)
    }

    async fn judge_recurrence(&self, root_cause_a: &str, root_cause_b: &str) -> Result<RecurrenceJudgment, CoreError> {
        let prompt = format!(
            "Compare these two incident root causes and judge whether they represent a \
             recurring pattern. Respond as JSON: \
             {{\"similarity_score\": float 0-1, \"similarity_reason\": string, \
             \"common_pattern\": string, \"is_recurring\": boolean}}.\n\nRoot cause A: {root_cause_a}\nRoot cause B: {root_cause_b}"
        );
        let request = GenerationRequest::new(vec![LlmMessage::user(prompt)]).with_response_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "similarity_score": {"type": "number"},
                "similarity_reason": {"type": "string"},
                "common_pattern": {"type": "string"},
                "is_recurring": {"type": "boolean"}
            },
            "required": ["similarity_score", "similarity_reason", "common_pattern", "is_recurring"]
        }));
        let response = self.llm.generate(request).await?;
        let parsed = response.parsed.ok_or_else(|| {
            crate::errors::LlmError::ResponseParseError("recurrence judgment was not structured JSON".into())
        })?;
        serde_json::from_value(parsed).map_err(|e| CoreError::Llm(crate::errors::LlmError::ResponseParseError(e.to_string())))
    }

    pub async fn component_impact(
        &self,
        filters: &TimelineFilters,
        min_incidents: usize,
    ) -> Result<Vec<ComponentImpact>, CoreError> {
        let timeline = self.causality_timeline(filters).await?;

        let mut category_totals: HashMap<String, usize> = HashMap::new();
        let mut pair_counts: HashMap<(String, String), usize> = HashMap::new();
        let mut pair_severe: HashMap<(String, String), usize> = HashMap::new();

        for entry in &timeline.timeline {
            let Some(category) = &entry.cause_category else { continue };
            *category_totals.entry(category.clone()).or_insert(0) += 1;
            let severe = is_severe_name(&entry.episode_name);
            for component in &entry.components {
                let key = (category.clone(), component.clone());
                *pair_counts.entry(key.clone()).or_insert(0) += 1;
                if severe {
                    *pair_severe.entry(key).or_insert(0) += 1;
                }
            }
        }

        let mut results = Vec::new();
        for ((category, component), count) in &pair_counts {
            if *count < min_incidents {
                continue;
            }
            let total_for_category = *category_totals.get(category).unwrap_or(&1) as f32;
            let contribution_rate = *count as f32 / total_for_category;
            let severe_count = *pair_severe.get(&(category.clone(), component.clone())).unwrap_or(&0) as f32;
            let severity_weighted_rate = contribution_rate * (1.0 + severe_count / *count as f32);
            results.push(ComponentImpact {
                category: category.clone(),
                component: component.clone(),
                occurrences: *count,
                contribution_rate,
                severity_weighted_rate,
            });
        }
        Ok(results)
    }

    pub async fn component_severity(
        &self,
        filters: &TimelineFilters,
        min_incidents: usize,
    ) -> Result<Vec<ComponentSeverity>, CoreError> {
        let timeline = self.causality_timeline(filters).await?;

        let mut totals: HashMap<String, usize> = HashMap::new();
        let mut severe: HashMap<String, usize> = HashMap::new();

        for entry in &timeline.timeline {
            let name_severe = is_severe_name(&entry.episode_name);
            let chain_severe = entry.causality_chains.iter().any(|c| is_severe_relation(&c.fact));
            for component in &entry.components {
                *totals.entry(component.clone()).or_insert(0) += 1;
                if name_severe || chain_severe {
                    *severe.entry(component.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut results = Vec::new();
        for (component, total) in &totals {
            if *total < min_incidents {
                continue;
            }
            let severe_count = *severe.get(component).unwrap_or(&0);
            results.push(ComponentSeverity {
                component: component.clone(),
                total: *total,
                severe: severe_count,
                severe_rate: severe_count as f32 / *total as f32,
            });
        }
        Ok(results)
    }

    pub async fn flow_metrics(
        &self,
        filters: &TimelineFilters,
        min_flow_count: usize,
    ) -> Result<Vec<FlowMetric>, CoreError> {
        let timeline = self.causality_timeline(filters).await?;

        let mut category_component_total: HashMap<(String, String), usize> = HashMap::new();
        let mut category_component_severe: HashMap<(String, String), usize> = HashMap::new();
        let mut category_component_slo: HashMap<(String, String), usize> = HashMap::new();

        for entry in &timeline.timeline {
            let Some(category) = &entry.cause_category else { continue };
            let name_severe = is_severe_name(&entry.episode_name);
            let has_slo = entry
                .causality_chains
                .iter()
                .any(|c| c.fact.to_lowercase().contains("slo"));

            for component in &entry.components {
                let key = (category.clone(), component.clone());
                *category_component_total.entry(key.clone()).or_insert(0) += 1;
                if name_severe {
                    *category_component_severe.entry(key.clone()).or_insert(0) += 1;
                }
                if has_slo {
                    *category_component_slo.entry(key).or_insert(0) += 1;
                }
            }
        }

        let mut results = Vec::new();
        for ((category, component), total) in &category_component_total {
            if *total < min_flow_count {
                continue;
            }
            let severe = *category_component_severe.get(&(category.clone(), component.clone())).unwrap_or(&0);
            let slo = *category_component_slo.get(&(category.clone(), component.clone())).unwrap_or(&0);
            results.push(FlowMetric {
                category: category.clone(),
                component: component.clone(),
                total_flows: *total,
                component_to_severe_rate: severe as f32 / *total as f32,
                severe_to_slo_rate: if severe > 0 { slo as f32 / severe as f32 } else { 0.0 },
                end_to_end_cvr: slo as f32 / *total as f32,
            });
        }
        Ok(results)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecurrenceJudgment {
    similarity_score: f32,
    similarity_reason: String,
    common_pattern: String,
    is_recurring: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cause_category_from_alert_label() {
        let content = "Labels: Alert; reason/config\nsomething else";
        assert_eq!(parse_cause_category(content), Some("reason/config".to_string()));
    }

    #[test]
    fn no_cause_category_without_label() {
        assert_eq!(parse_cause_category("just some text"), None);
    }

    #[test]
    fn causality_keyword_matching_is_case_insensitive() {
        assert!(is_causality_fact("web-prod-01 TRIGGERED PagerDuty"));
        assert!(!is_causality_fact("web-prod-01 is adjacent to PagerDuty"));
    }

    #[test]
    fn root_cause_extraction_takes_following_lines() {
        let content = "Incident summary\nRoot cause\nmisconfigured canary weight\n\nfooter";
        assert_eq!(extract_root_cause(content), Some("misconfigured canary weight".to_string()));
    }

    #[test]
    fn root_cause_extraction_handles_inline_colon_form() {
        let content = "Root cause: canary rollout config typo";
        assert_eq!(extract_root_cause(content), Some("canary rollout config typo".to_string()));
    }

    #[test]
    fn blocklist_filters_tool_entities() {
        let config = AnalyticsConfig::default();
        assert!(config.tool_entity_blocklist.contains(&"pagerduty".to_string()));
    }
}
