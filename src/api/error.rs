use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::domain::MysteryBypassDenied;
use crate::services::{AccountError, JamError, ProjectError, SessionError, UpvoteError};

/// Error surfaced at the HTTP boundary. Every variant carries a stable
/// camelCase machine code and a human-readable detail.
#[derive(Debug)]
pub enum ApiError {
    Unauthenticated { code: &'static str, detail: String },

    Forbidden { code: &'static str, detail: String },

    NotFound { code: &'static str, detail: String },

    Conflict { code: &'static str, detail: String },

    InvalidRequest { code: &'static str, detail: String },

    UpstreamUnavailable { service: String, message: String },

    PreconditionFailed { code: &'static str, detail: String },

    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated { code, detail }
            | Self::Forbidden { code, detail }
            | Self::NotFound { code, detail }
            | Self::Conflict { code, detail }
            | Self::InvalidRequest { code, detail }
            | Self::PreconditionFailed { code, detail } => write!(f, "{code}: {detail}"),
            Self::UpstreamUnavailable { service, message } => {
                write!(f, "{service} error: {message}")
            }
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Machine code of an error response, left on the response for the request log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::PreconditionFailed { .. } => StatusCode::PRECONDITION_FAILED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated { code, .. }
            | Self::Forbidden { code, .. }
            | Self::NotFound { code, .. }
            | Self::Conflict { code, .. }
            | Self::InvalidRequest { code, .. }
            | Self::PreconditionFailed { code, .. } => *code,
            Self::UpstreamUnavailable { .. } => "upstreamUnavailable",
            Self::Internal(_) => "internal",
        }
    }

    pub fn unauthenticated(detail: impl Into<String>) -> Self {
        Self::Unauthenticated {
            code: "unauthenticated",
            detail: detail.into(),
        }
    }

    pub fn forbidden(code: &'static str, detail: impl Into<String>) -> Self {
        Self::Forbidden {
            code,
            detail: detail.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            code: "notFound",
            detail: format!("{resource} {id} not found"),
        }
    }

    pub fn conflict(code: &'static str, detail: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            detail: detail.into(),
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::InvalidRequest {
            code: "invalidRequest",
            detail: detail.into(),
        }
    }

    pub fn precondition(code: &'static str, detail: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            code,
            detail: detail.into(),
        }
    }

    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let detail = match self {
            Self::Unauthenticated { detail, .. }
            | Self::Forbidden { detail, .. }
            | Self::NotFound { detail, .. }
            | Self::Conflict { detail, .. }
            | Self::InvalidRequest { detail, .. }
            | Self::PreconditionFailed { detail, .. } => detail,
            Self::UpstreamUnavailable { service, message } => {
                tracing::warn!("{} API error: {}", service, message);
                format!("{service} service is unavailable")
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        };

        let body = ApiResponse::<()>::error(code, detail);
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorCode(code));
        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<MysteryBypassDenied> for ApiError {
    fn from(err: MysteryBypassDenied) -> Self {
        Self::forbidden("mysteryBypassDenied", err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => Self::NotFound {
                code: "sessionNotFound",
                detail: "Login token is unknown or was already used".to_string(),
            },
            SessionError::Database(msg) => Self::Internal(msg),
        }
    }
}

impl From<JamError> for ApiError {
    fn from(err: JamError) -> Self {
        let detail = err.to_string();
        match err {
            JamError::NotFound(_) => Self::NotFound {
                code: "jamNotFound",
                detail,
            },
            JamError::UserNotFound(_) => Self::NotFound {
                code: "userNotFound",
                detail,
            },
            JamError::ManagerNotFound(_) => Self::NotFound {
                code: "managerNotFound",
                detail,
            },
            JamError::SlugTaken(_) => Self::conflict("slugTaken", detail),
            JamError::ManagerExists(_) => Self::conflict("managerExists", detail),
            JamError::AlreadyAdmin(_) => Self::conflict("alreadyAdmin", detail),
            JamError::Validation(_) => Self::validation(detail),
            JamError::Forbidden(_) => Self::forbidden("forbidden", detail),
            JamError::MysteryBypassDenied(inner) => inner.into(),
            JamError::Database(msg) => Self::Internal(msg),
        }
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        let detail = err.to_string();
        match err {
            ProjectError::JamNotFound(_) => Self::NotFound {
                code: "jamNotFound",
                detail,
            },
            ProjectError::NotFound(_) => Self::NotFound {
                code: "projectNotFound",
                detail,
            },
            ProjectError::ExternalProjectNotFound(_) => Self::NotFound {
                code: "externalProjectNotFound",
                detail,
            },
            ProjectError::JamNotOpen => Self::precondition("jamNotOpen", detail),
            ProjectError::AlreadySubmitted(_) => Self::conflict("alreadySubmitted", detail),
            ProjectError::NotProjectOwner(_) => Self::forbidden("notProjectOwner", detail),
            ProjectError::Forbidden(_) => Self::forbidden("forbidden", detail),
            ProjectError::UpstreamUnavailable(message) => Self::upstream("Community", message),
            ProjectError::Database(msg) => Self::Internal(msg),
        }
    }
}

impl From<UpvoteError> for ApiError {
    fn from(err: UpvoteError) -> Self {
        let detail = err.to_string();
        match err {
            UpvoteError::JamNotFound(_) => Self::NotFound {
                code: "jamNotFound",
                detail,
            },
            UpvoteError::ProjectNotFound(_) => Self::NotFound {
                code: "projectNotFound",
                detail,
            },
            UpvoteError::NotFound => Self::NotFound {
                code: "upvoteNotFound",
                detail,
            },
            UpvoteError::AlreadyUpvoted => Self::conflict("alreadySubmitted", detail),
            UpvoteError::TooManyUpvotes { .. } => Self::precondition("tooManyUpvotes", detail),
            UpvoteError::Database(msg) => Self::Internal(msg),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        let detail = err.to_string();
        match err {
            AccountError::UserNotFound(_) => Self::NotFound {
                code: "userNotFound",
                detail,
            },
            AccountError::UserExists(_) => Self::conflict("userExists", detail),
            AccountError::Validation(_) => Self::validation(detail),
            AccountError::Forbidden => Self::forbidden("forbidden", detail),
            AccountError::UpstreamUnavailable(message) => Self::upstream("Community", message),
            AccountError::Database(msg) | AccountError::Internal(msg) => Self::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_codes_are_stable() {
        let err: ApiError = ProjectError::JamNotOpen.into();
        assert_eq!(err.status(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(err.code(), "jamNotOpen");

        let err: ApiError = UpvoteError::TooManyUpvotes { cap: 3 }.into();
        assert_eq!(err.status(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(err.code(), "tooManyUpvotes");
    }

    #[test]
    fn duplicates_are_conflicts() {
        let err: ApiError = ProjectError::AlreadySubmitted(5).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "alreadySubmitted");

        let err: ApiError = UpvoteError::AlreadyUpvoted.into();
        assert_eq!(err.code(), "alreadySubmitted");
    }

    #[test]
    fn internal_details_do_not_leak() {
        let response = ApiError::internal("disk on fire").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<ErrorCode>(),
            Some(&ErrorCode("internal"))
        );
    }

    #[test]
    fn bypass_denied_is_forbidden() {
        let err: ApiError = JamError::MysteryBypassDenied(MysteryBypassDenied).into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "mysteryBypassDenied");
    }
}
