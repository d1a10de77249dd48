use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_user_name;
use super::{ApiError, ApiResponse, AppState, ProvisionUserRequest};
use crate::models::User;

/// GET /users/{name}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let name = validate_user_name(&name)?;
    let user = state.account_service().get_user(name).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// POST /users
pub async fn provision_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    payload: Result<Json<ProvisionUserRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::validation(e.body_text()))?;
    let name = validate_user_name(&request.name)?;

    let user = state
        .account_service()
        .provision(&actor, name, request.admin)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /users/{name}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.account_service().delete(&actor, &name).await?;
    Ok(Json(ApiResponse::success(())))
}

/// PUT /users/{name}/ban
pub async fn ban_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.account_service().set_banned(&actor, &name, true).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /users/{name}/ban
pub async fn unban_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.account_service().set_banned(&actor, &name, false).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /users/{name}/admin
pub async fn grant_admin(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.account_service().set_admin(&actor, &name, true).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// DELETE /users/{name}/admin
pub async fn revoke_admin(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.account_service().set_admin(&actor, &name, false).await?;
    Ok(Json(ApiResponse::success(user)))
}
