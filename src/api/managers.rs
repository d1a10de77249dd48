use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, ManagerDto};

/// GET /jams/{slug}/managers
pub async fn list_managers(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Vec<ManagerDto>>>, ApiError> {
    let managers = state
        .jam_service()
        .list_managers(&slug)
        .await?
        .into_iter()
        .map(|name| ManagerDto {
            jam: slug.clone(),
            name,
        })
        .collect();

    Ok(Json(ApiResponse::success(managers)))
}

/// PUT /jams/{slug}/managers/{name}
pub async fn add_manager(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path((slug, name)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ManagerDto>>, ApiError> {
    let name = state.jam_service().add_manager(&actor, &slug, &name).await?;
    Ok(Json(ApiResponse::success(ManagerDto { jam: slug, name })))
}

/// DELETE /jams/{slug}/managers/{name}
pub async fn remove_manager(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path((slug, name)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .jam_service()
        .remove_manager(&actor, &slug, &name)
        .await?;
    Ok(Json(ApiResponse::success(())))
}
