//! Causality/recurrence analytics handlers for `/graph/analysis/*`.

use crate::models::*;
use crate::{handle_core_error, ApiResponse, AppState};
use axum::{extract::{Query, State}, http::StatusCode, response::Json};
use chronofact_core::analytics::TimelineFilters;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TimelineResponseBody {
    pub timeline: Vec<chronofact_core::analytics::TimelineEntry>,
    pub component_history: std::collections::HashMap<String, chronofact_core::analytics::ComponentHistory>,
    pub total_episodes: usize,
    pub filters: TimelineQuery,
}

pub async fn causality_timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<ApiResponse<TimelineResponseBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    let group_ids = parse_group_ids(&query.group_ids);
    let filters = TimelineFilters {
        group_ids: state.services.group_resolver().resolve(&group_ids),
        component: query.component.clone(),
        category: query.category.clone(),
    };

    let result = state.services.analytics.causality_timeline(&filters).await.map_err(handle_core_error)?;

    Ok(Json(ApiResponse::success(TimelineResponseBody {
        timeline: result.timeline,
        component_history: result.component_history,
        total_episodes: result.total_episodes,
        filters: query,
    })))
}

#[derive(Debug, Serialize)]
pub struct RecurringResponseBody {
    pub recurring_patterns: Vec<chronofact_core::analytics::RecurrencePattern>,
    pub total_patterns: usize,
    pub analysis_method: &'static str,
    pub similarity_threshold: f32,
}

pub async fn recurring_incidents(
    State(state): State<AppState>,
    Query(query): Query<RecurringQuery>,
) -> Result<Json<ApiResponse<RecurringResponseBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    let group_ids = parse_group_ids(&query.group_ids);
    let filters = TimelineFilters {
        group_ids: state.services.group_resolver().resolve(&group_ids),
        component: None,
        category: None,
    };

    let patterns = state
        .services
        .analytics
        .recurring_incidents(&filters, query.min_occurrences, query.similarity_threshold, query.use_llm)
        .await
        .map_err(handle_core_error)?;

    Ok(Json(ApiResponse::success(RecurringResponseBody {
        total_patterns: patterns.len(),
        recurring_patterns: patterns,
        analysis_method: if query.use_llm { "embedding+llm" } else { "embedding" },
        similarity_threshold: query.similarity_threshold,
    })))
}

#[derive(Debug, Serialize)]
pub struct ComponentImpactResponseBody {
    pub analysis_results: Vec<chronofact_core::analytics::ComponentImpact>,
    pub category_totals: std::collections::HashMap<String, usize>,
    pub total_pairs: usize,
    pub filters: ComponentImpactQuery,
}

pub async fn component_impact(
    State(state): State<AppState>,
    Query(query): Query<ComponentImpactQuery>,
) -> Result<Json<ApiResponse<ComponentImpactResponseBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    let group_ids = parse_group_ids(&query.group_ids);
    let filters = TimelineFilters {
        group_ids: state.services.group_resolver().resolve(&group_ids),
        component: query.component_filter.clone(),
        category: query.category_filter.clone(),
    };

    let results = state
        .services
        .analytics
        .component_impact(&filters, query.min_incidents)
        .await
        .map_err(handle_core_error)?;

    let mut category_totals: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for r in &results {
        *category_totals.entry(r.category.clone()).or_insert(0) += r.occurrences;
    }

    Ok(Json(ApiResponse::success(ComponentImpactResponseBody {
        total_pairs: results.len(),
        analysis_results: results,
        category_totals,
        filters: query,
    })))
}

#[derive(Debug, Serialize)]
pub struct ComponentSeverityResponseBody {
    pub analysis_results: Vec<chronofact_core::analytics::ComponentSeverity>,
    pub total_components: usize,
    pub filters: ComponentSeverityQuery,
    pub severity_criteria: &'static str,
}

pub async fn component_severity(
    State(state): State<AppState>,
    Query(query): Query<ComponentSeverityQuery>,
) -> Result<Json<ApiResponse<ComponentSeverityResponseBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    let group_ids = parse_group_ids(&query.group_ids);
    let filters = TimelineFilters {
        group_ids: state.services.group_resolver().resolve(&group_ids),
        component: query.component_filter.clone(),
        category: None,
    };

    let results = state
        .services
        .analytics
        .component_severity(&filters, query.min_incidents)
        .await
        .map_err(handle_core_error)?;

    Ok(Json(ApiResponse::success(ComponentSeverityResponseBody {
        total_components: results.len(),
        analysis_results: results,
        filters: query,
        severity_criteria: "incidents mentioning pagerduty escalation, SLO breach, or a triggered alert count as severe",
    })))
}

#[derive(Debug, Serialize)]
pub struct FlowMetricsResponseBody {
    pub flow_metrics: Vec<chronofact_core::analytics::FlowMetric>,
    pub total_flows: usize,
    pub category_totals: std::collections::HashMap<String, usize>,
    pub cvr_definitions: &'static str,
}

pub async fn flow_metrics(
    State(state): State<AppState>,
    Query(query): Query<FlowMetricsQuery>,
) -> Result<Json<ApiResponse<FlowMetricsResponseBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    let group_ids = parse_group_ids(&query.group_ids);
    let filters = TimelineFilters {
        group_ids: state.services.group_resolver().resolve(&group_ids),
        component: None,
        category: query.category_filter.clone(),
    };

    let results = state
        .services
        .analytics
        .flow_metrics(&filters, query.min_flow_count)
        .await
        .map_err(handle_core_error)?;

    let mut category_totals: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for r in &results {
        *category_totals.entry(r.category.clone()).or_insert(0) += r.total_flows;
    }

    Ok(Json(ApiResponse::success(FlowMetricsResponseBody {
        total_flows: results.iter().map(|r| r.total_flows).sum(),
        flow_metrics: results,
        category_totals,
        cvr_definitions: "component_to_severe_rate = severe incidents / component incidents; severe_to_slo_rate = slo breaches / severe incidents; end_to_end_cvr = their product",
    })))
}
