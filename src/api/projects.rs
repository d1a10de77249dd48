use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::auth::{CurrentUser, MaybeUser};
use super::validation::validate_project_id;
use super::{ApiError, ApiResponse, AppState, SubmitProjectRequest};
use crate::models::{Project, ProjectEntry};

/// GET /jams/{slug}/projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    MaybeUser(viewer): MaybeUser,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Vec<ProjectEntry>>>, ApiError> {
    let projects = state
        .project_service()
        .list(viewer.as_ref(), &slug)
        .await?;
    Ok(Json(ApiResponse::success(projects)))
}

/// POST /jams/{slug}/projects
pub async fn submit_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(slug): Path<String>,
    payload: Result<Json<SubmitProjectRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Project>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let project_id = validate_project_id(request.project_id)?;

    let project = state
        .project_service()
        .submit(&actor, &slug, project_id)
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

/// DELETE /jams/{slug}/projects/{id}
pub async fn withdraw_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let project_id = validate_project_id(id)?;
    state
        .project_service()
        .withdraw(&actor, &slug, project_id)
        .await?;
    Ok(Json(ApiResponse::success(())))
}

/// PUT /jams/{slug}/projects/{id}/selected
pub async fn select_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<Project>>, ApiError> {
    let project_id = validate_project_id(id)?;
    let project = state
        .project_service()
        .set_selected(&actor, &slug, project_id, true)
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

/// DELETE /jams/{slug}/projects/{id}/selected
pub async fn unselect_project(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<Project>>, ApiError> {
    let project_id = validate_project_id(id)?;
    let project = state
        .project_service()
        .set_selected(&actor, &slug, project_id, false)
        .await?;
    Ok(Json(ApiResponse::success(project)))
}

/// GET /jams/{slug}/winners
pub async fn list_winners(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Vec<ProjectEntry>>>, ApiError> {
    let winners = state.project_service().winners(&slug).await?;
    Ok(Json(ApiResponse::success(winners)))
}
