use crate::api::AppState;
use crate::api::error::ErrorCode;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// The jam and project a request path points at, if any.
#[derive(Debug, Default, PartialEq, Eq)]
struct JamTarget {
    jam: Option<String>,
    project_id: Option<i64>,
}

fn jam_target(path: &str) -> JamTarget {
    let mut segments = path.trim_start_matches('/').split('/');
    if segments.next() != Some("api") || segments.next() != Some("jams") {
        return JamTarget::default();
    }

    let jam = segments
        .next()
        .filter(|slug| !slug.is_empty())
        .map(str::to_string);
    let project_id = match segments.next() {
        Some("projects") => segments.next().and_then(|id| id.parse().ok()),
        _ => None,
    };

    JamTarget { jam, project_id }
}

/// Wraps each request in a span tagged with the jam and project it touches.
/// `user_id` is recorded by the auth middleware once the caller is known.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = req.method().clone();
    let route = req.extensions().get::<MatchedPath>().map_or_else(
        || "unmatched".to_string(),
        |matched| matched.as_str().to_string(),
    );
    let target = jam_target(req.uri().path());

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        route = %route,
        jam = target.jam,
        project_id = target.project_id,
        user_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status();
        let error_code = response.extensions().get::<ErrorCode>().map(|code| code.0);

        let labels = [
            ("method", method.to_string()),
            ("route", route),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        if let Some(code) = error_code {
            metrics::counter!("api_errors_total", "code" => code).increment(1);
        }

        info!(
            status = status.as_u16(),
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            error_code,
            "Request finished"
        );

        response
    }
    .instrument(span)
    .await
}
