use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, IdentityBridge, JamService, ProjectService, SessionStore, UpvoteLedger,
};
use crate::state::SharedState;

pub mod auth;
mod error;
mod jams;
mod managers;
mod observability;
mod projects;
mod system;
mod types;
mod upvotes;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.shared.sessions
    }

    #[must_use]
    pub fn identity(&self) -> &Arc<IdentityBridge> {
        &self.shared.identity
    }

    #[must_use]
    pub fn upvotes(&self) -> &Arc<UpvoteLedger> {
        &self.shared.upvotes
    }

    #[must_use]
    pub fn jam_service(&self) -> &Arc<dyn JamService> {
        &self.shared.jam_service
    }

    #[must_use]
    pub fn project_service(&self) -> &Arc<dyn ProjectService> {
        &self.shared.project_service
    }

    #[must_use]
    pub fn account_service(&self) -> &Arc<dyn AccountService> {
        &self.shared.account_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().read().await.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(create_session_router(state.clone()))
        .route("/auth/logout", post(auth::logout))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Routes that resolve the caller from the bearer token first.
fn create_session_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/begin", get(auth::begin))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/info", get(auth::info))
        .route("/auth/me", get(auth::me))
        .route("/users", post(users::provision_user))
        .route(
            "/users/{name}",
            get(users::get_user).delete(users::delete_user),
        )
        .route(
            "/users/{name}/ban",
            put(users::ban_user).delete(users::unban_user),
        )
        .route(
            "/users/{name}/admin",
            put(users::grant_admin).delete(users::revoke_admin),
        )
        .route("/jams", get(jams::list_jams).post(jams::create_jam))
        .route(
            "/jams/{slug}",
            get(jams::get_jam)
                .patch(jams::update_jam)
                .delete(jams::delete_jam),
        )
        .route("/jams/{slug}/managers", get(managers::list_managers))
        .route(
            "/jams/{slug}/managers/{name}",
            put(managers::add_manager).delete(managers::remove_manager),
        )
        .route(
            "/jams/{slug}/projects",
            get(projects::list_projects).post(projects::submit_project),
        )
        .route(
            "/jams/{slug}/projects/{id}",
            axum::routing::delete(projects::withdraw_project),
        )
        .route(
            "/jams/{slug}/projects/{id}/selected",
            put(projects::select_project).delete(projects::unselect_project),
        )
        .route(
            "/jams/{slug}/projects/{id}/upvotes",
            get(upvotes::get_upvotes)
                .post(upvotes::cast_upvote)
                .delete(upvotes::revoke_upvote),
        )
        .route("/jams/{slug}/upvotes/remaining", get(upvotes::remaining_upvotes))
        .route("/jams/{slug}/winners", get(projects::list_winners))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
