//! Episode ingestion, search, deletion, and fact update handlers.

use crate::models::*;
use crate::{handle_core_error, ApiResponse, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chronofact_core::extraction::AddEpisodeRequest;
use chronofact_core::facts::FactUpdateRequest;
use chronofact_core::prelude::*;
use chronofact_core::search::SearchFilters;
use tracing::info;
use uuid::Uuid;

pub async fn add_episode(
    State(state): State<AppState>,
    Json(body): Json<AddEpisodeBody>,
) -> Result<Json<ApiResponse<AddEpisodeResponseBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    let group_id = state
        .services
        .group_resolver()
        .resolve_one(body.group_id.map(GroupId::new))
        .ok_or_else(|| {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::<()>::error("no group_id provided and no default configured")))
        })?;

    let request = AddEpisodeRequest {
        group_id: group_id.clone(),
        name: body.name.clone(),
        content: body.content,
        source: body.source,
        source_description: body.source_description,
        source_url: body.source_url,
        uuid: body.uuid,
        reference_time: None,
        entity_types: state.services.config.graphiti.entity_types.clone(),
    };

    let episode_uuid = state.services.queue.add_episode(request);
    info!("queued episode {} ({}) in namespace {}", episode_uuid, body.name, group_id);

    Ok(Json(ApiResponse::success(AddEpisodeResponseBody {
        status: "success".to_string(),
        message: "episode queued for processing".to_string(),
        episode_name: body.name,
        group_id: group_id.to_string(),
    })))
}

pub async fn search(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Result<Json<ApiResponse<SearchResponseBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    if body.max_results == 0 || body.max_results > 100 {
        return Err((StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::error("max_results must be in [1, 100]"))));
    }

    let group_ids = state
        .services
        .group_resolver()
        .resolve(&body.group_ids.into_iter().map(GroupId::new).collect::<Vec<_>>());
    let filters = SearchFilters { group_ids, entity_type_labels: body.entity_types, center_node_uuid: body.center_node_uuid };

    let (search_type, results): (&'static str, Vec<serde_json::Value>) = match body.search_type {
        SearchTypeBody::Facts => {
            let hits = state
                .services
                .search
                .search_facts(&body.query, &filters, body.max_results)
                .await
                .map_err(handle_core_error)?;
            ("facts", hits.into_iter().map(|h| serde_json::to_value(h_to_json(h)).unwrap()).collect())
        }
        SearchTypeBody::Nodes => {
            let hits = state
                .services
                .search
                .search_nodes(&body.query, &filters, body.max_results)
                .await
                .map_err(handle_core_error)?;
            (
                "nodes",
                hits.into_iter()
                    .map(|r| serde_json::json!({"node": r.node, "score": r.score}))
                    .collect(),
            )
        }
        SearchTypeBody::Episodes => {
            let hits = state
                .services
                .search
                .search_episodes(&filters, body.max_results)
                .await
                .map_err(handle_core_error)?;
            ("episodes", hits.into_iter().map(|e| serde_json::to_value(e).unwrap()).collect())
        }
    };

    let count = results.len();
    Ok(Json(ApiResponse::success(SearchResponseBody {
        message: format!("found {count} {search_type}"),
        search_type,
        results,
        count,
    })))
}

fn h_to_json(result: chronofact_core::search::FactSearchResult) -> serde_json::Value {
    serde_json::json!({
        "edge": result.edge,
        "score": result.score,
        "citations": result.citations,
    })
}

pub async fn delete_episode(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteEpisodeResponseBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    let deleted = state.services.store.delete_episode(uuid).await.map_err(|e| handle_core_error(CoreError::Storage(e)))?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, Json(ApiResponse::<()>::error(format!("episode {uuid} not found")))));
    }

    Ok(Json(ApiResponse::success(DeleteEpisodeResponseBody {
        status: "deleted".to_string(),
        uuid,
        message: "episode deleted".to_string(),
    })))
}

pub async fn update_fact(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(body): Json<UpdateFactBody>,
) -> Result<Json<ApiResponse<UpdateFactResponseBody>>, (StatusCode, Json<ApiResponse<()>>)> {
    let request = FactUpdateRequest {
        uuid,
        fact: body.fact,
        source_node_uuid: body.source_node_uuid,
        target_node_uuid: body.target_node_uuid,
        update_reason: body.update_reason,
    };

    let (old_uuid, new_edge) = state.services.facts.update_fact(request, None).await.map_err(handle_core_error)?;

    Ok(Json(ApiResponse::success(UpdateFactResponseBody {
        status: "updated".to_string(),
        old_uuid,
        new_uuid: new_edge.uuid,
        message: "fact updated".to_string(),
        new_edge,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_body_defaults_max_results_to_ten() {
        let body: SearchBody = serde_json::from_str(r#"{"query":"q","search_type":"facts"}"#).unwrap();
        assert_eq!(body.max_results, 10);
    }
}
