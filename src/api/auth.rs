use axum::{
    Json,
    extract::{FromRequestParts, Query, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use super::{ApiError, ApiResponse, AppState};
use crate::constants::auth::{CONFIRM_LOGIN_PATH, LOGIN_ERROR_PATH};
use crate::models::User;
use crate::services::AuthFailure;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct BeginQuery {
    pub host: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackQuery {
    pub private_code: Option<String>,
    pub host: Option<String>,
}

#[derive(Deserialize)]
pub struct InfoQuery {
    pub token: String,
}

#[derive(Serialize)]
pub struct SessionInfoResponse {
    pub name: String,
    pub token: String,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

// ============================================================================
// Caller resolution
// ============================================================================

/// Identity attached to a request by [`auth_middleware`].
#[derive(Clone)]
pub struct Caller {
    pub user: Option<User>,
}

/// Requires an authenticated caller.
pub struct CurrentUser(pub User);

/// Authenticated caller if a token was presented, otherwise anonymous.
pub struct MaybeUser(pub Option<User>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .and_then(|caller| caller.user.clone())
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthenticated("Login required"))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<Caller>()
                .and_then(|caller| caller.user.clone()),
        ))
    }
}

/// Resolves the bearer token, if any, to a user.
///
/// No token means an anonymous caller. A token that does not match a live
/// session is rejected outright, even on routes that allow anonymous access.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(request.headers()) else {
        request.extensions_mut().insert(Caller { user: None });
        return Ok(next.run(request).await);
    };

    let session = state
        .sessions()
        .find_by_token(&token)
        .ok_or_else(|| ApiError::unauthenticated("Session is invalid or has been revoked"))?;

    let user = state
        .store()
        .get_user(&session.name)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Session owner no longer exists"))?;

    if user.banned {
        return Err(ApiError::forbidden("banned", "This account is banned"));
    }

    tracing::Span::current().record("user_id", user.name.as_str());
    request.extensions_mut().insert(Caller { user: Some(user) });

    Ok(next.run(request).await)
}

/// `Authorization: Bearer <token>`, or the bare token as the header value.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();

    (!token.is_empty()).then(|| token.to_string())
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn front_end_url(host: &str, path: &str, param: (&str, &str)) -> Result<String, ApiError> {
    let mut url = Url::parse(&format!("{host}{path}"))
        .map_err(|e| ApiError::internal(format!("Invalid return host '{host}': {e}")))?;
    url.query_pairs_mut().append_pair(param.0, param.1);
    Ok(url.into())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /auth/begin
/// Redirects the browser to the identity provider
pub async fn begin(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BeginQuery>,
) -> Result<Response, ApiError> {
    let url = state
        .identity()
        .begin_auth(query.host.as_deref())
        .map_err(|failure| match failure {
            AuthFailure::ReturnHostNotAllowed(_) => ApiError::InvalidRequest {
                code: "returnHostNotAllowed",
                detail: failure.to_string(),
            },
            other => ApiError::internal(other.to_string()),
        })?;

    Ok(found(url.as_str()))
}

/// GET /auth/callback
/// Completes the provider handshake, issues a session and hands the
/// one-time token to the front-end
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let identity = state.identity();

    // An unknown host cannot be trusted with a token, nor with an error page.
    let host = identity
        .return_host(query.host.as_deref())
        .or_else(|_| identity.return_host(None))
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let private_code = query.private_code.unwrap_or_default();

    let outcome = match identity.complete_auth(&private_code).await {
        Ok(user) => state
            .sessions()
            .issue(&user.name)
            .await
            .map_err(|e| AuthFailure::Internal(e.to_string())),
        Err(failure) => Err(failure),
    };

    let location = match outcome {
        Ok(issued) => front_end_url(
            &host,
            CONFIRM_LOGIN_PATH,
            ("token", &issued.one_time_token),
        )?,
        Err(failure) => {
            tracing::info!(code = failure.code(), error = %failure, "Login failed");
            front_end_url(&host, LOGIN_ERROR_PATH, ("code", failure.code()))?
        }
    };

    Ok(found(&location))
}

/// GET /auth/info
/// Exchanges a one-time token for the durable session token, exactly once
pub async fn info(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InfoQuery>,
) -> Result<Json<ApiResponse<SessionInfoResponse>>, ApiError> {
    let session = state.sessions().exchange_one_time(&query.token).await?;

    Ok(Json(ApiResponse::success(SessionInfoResponse {
        name: session.name,
        token: session.token,
    })))
}

/// POST /auth/logout
/// Revokes the presented token. Revoking an unknown token succeeds.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<LogoutResponse>>, ApiError> {
    let token = extract_token(&headers)
        .ok_or_else(|| ApiError::unauthenticated("No session token presented"))?;

    let revoked = state.sessions().revoke(&token).await?;

    Ok(Json(ApiResponse::success(LogoutResponse { revoked })))
}

/// GET /auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_extraction_accepts_bearer_and_bare() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc123"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn front_end_url_encodes_param() {
        let url = front_end_url("http://localhost:3000", LOGIN_ERROR_PATH, ("code", "a b")).unwrap();
        assert_eq!(url, "http://localhost:3000/login/error?code=a+b");
    }
}
