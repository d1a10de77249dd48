use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::auth::{CurrentUser, MaybeUser};
use super::validation::{clamp_limit, clamp_offset};
use super::{ApiError, ApiResponse, AppState, JamFetchQuery, JamListQuery};
use crate::domain::JamView;
use crate::models::{JamPatch, NewJam};
use crate::services::{JamPage, JamQuery};

/// GET /jams
pub async fn list_jams(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<JamListQuery>,
) -> Result<Json<ApiResponse<JamPage>>, ApiError> {
    let (default_limit, max_limit) = {
        let config = state.config().read().await;
        (config.jams.default_page_size, config.jams.max_page_size)
    };

    let page = state
        .jam_service()
        .list(
            viewer.as_ref(),
            JamQuery {
                featured_only: query.featured,
                limit: clamp_limit(query.limit, default_limit, max_limit),
                offset: clamp_offset(query.offset),
                bypass_mystery: query.bypass_mystery,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(page)))
}

/// GET /jams/{slug}
pub async fn get_jam(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<JamFetchQuery>,
) -> Result<Json<ApiResponse<JamView>>, ApiError> {
    let jam = state
        .jam_service()
        .get(viewer.as_ref(), &slug, query.bypass_mystery)
        .await?;
    Ok(Json(ApiResponse::success(jam)))
}

/// POST /jams
pub async fn create_jam(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    payload: Result<Json<NewJam>, JsonRejection>,
) -> Result<Json<ApiResponse<JamView>>, ApiError> {
    let Json(jam) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let created = state.jam_service().create(&actor, jam).await?;
    Ok(Json(ApiResponse::success(created)))
}

/// PATCH /jams/{slug}
pub async fn update_jam(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(slug): Path<String>,
    payload: Result<Json<JamPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<JamView>>, ApiError> {
    let Json(patch) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let updated = state.jam_service().update(&actor, &slug, patch).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// DELETE /jams/{slug}
pub async fn delete_jam(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.jam_service().delete(&actor, &slug).await?;
    Ok(Json(ApiResponse::success(())))
}
