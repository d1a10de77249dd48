use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::{CurrentUser, MaybeUser};
use super::validation::validate_project_id;
use super::{ApiError, ApiResponse, AppState};
use crate::services::{Remaining, UpvoteTally};

/// GET /jams/{slug}/projects/{id}/upvotes
pub async fn get_upvotes(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<UpvoteTally>>, ApiError> {
    let project_id = validate_project_id(id)?;
    let tally = state
        .upvotes()
        .count_for_project(&slug, project_id, viewer.as_ref().map(|u| u.name.as_str()))
        .await?;
    Ok(Json(ApiResponse::success(tally)))
}

/// POST /jams/{slug}/projects/{id}/upvotes
pub async fn cast_upvote(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<UpvoteTally>>, ApiError> {
    let project_id = validate_project_id(id)?;
    let ledger = state.upvotes();

    ledger.cast(&slug, project_id, &user.name).await?;
    let tally = ledger
        .count_for_project(&slug, project_id, Some(&user.name))
        .await?;
    Ok(Json(ApiResponse::success(tally)))
}

/// DELETE /jams/{slug}/projects/{id}/upvotes
pub async fn revoke_upvote(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<UpvoteTally>>, ApiError> {
    let project_id = validate_project_id(id)?;
    let ledger = state.upvotes();

    ledger.revoke(&slug, project_id, &user.name).await?;
    let tally = ledger
        .count_for_project(&slug, project_id, Some(&user.name))
        .await?;
    Ok(Json(ApiResponse::success(tally)))
}

/// GET /jams/{slug}/upvotes/remaining
pub async fn remaining_upvotes(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Remaining>>, ApiError> {
    let remaining = state.upvotes().remaining(&slug, &user.name).await?;
    Ok(Json(ApiResponse::success(remaining)))
}
