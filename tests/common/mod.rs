#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use jamhub::api::{self, AppState};
use jamhub::clients::{
    IdentityVerifier, Profile, ProfileDirectory, ProjectDirectory, Verification,
};
use jamhub::config::Config;
use jamhub::db::Store;
use jamhub::domain::slugify;
use jamhub::models::{JamContent, JamDates, JamOptions, NewJam, User};
use jamhub::state::{Clients, SharedState};

pub const PUBLIC_URL: &str = "http://api.test";
pub const FRONT_END: &str = "http://front.test";

#[derive(Default)]
pub struct FakeVerifier {
    codes: Mutex<HashMap<String, Verification>>,
    pub down: AtomicBool,
}

impl FakeVerifier {
    /// Registers a private code the provider will vouch for.
    pub fn accept(&self, code: &str, username: &str) {
        self.codes.lock().unwrap().insert(
            code.to_string(),
            Verification {
                valid: true,
                username: Some(username.to_string()),
                redirect: Some(format!("{PUBLIC_URL}/api/auth/callback?host={FRONT_END}")),
            },
        );
    }
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, private_code: &str) -> anyhow::Result<Verification> {
        if self.down.load(Ordering::SeqCst) {
            anyhow::bail!("provider unreachable");
        }
        Ok(self
            .codes
            .lock()
            .unwrap()
            .get(private_code)
            .cloned()
            .unwrap_or(Verification {
                valid: false,
                username: None,
                redirect: None,
            }))
    }
}

#[derive(Default)]
pub struct FakeProfiles {
    users: Mutex<HashMap<String, Profile>>,
}

impl FakeProfiles {
    pub fn add(&self, username: &str) {
        self.users.lock().unwrap().insert(
            username.to_lowercase(),
            Profile {
                username: username.to_string(),
                avatar_url: Some(format!("https://cdn.test/{username}.png")),
            },
        );
    }
}

#[async_trait]
impl ProfileDirectory for FakeProfiles {
    async fn lookup(&self, name: &str) -> anyhow::Result<Option<Profile>> {
        Ok(self.users.lock().unwrap().get(&name.to_lowercase()).cloned())
    }
}

#[derive(Default)]
pub struct FakeProjects {
    authors: Mutex<HashMap<i64, String>>,
    pub down: AtomicBool,
}

impl FakeProjects {
    pub fn add(&self, project_id: i64, author: &str) {
        self.authors
            .lock()
            .unwrap()
            .insert(project_id, author.to_string());
    }
}

#[async_trait]
impl ProjectDirectory for FakeProjects {
    async fn project_author(&self, project_id: i64) -> anyhow::Result<Option<String>> {
        if self.down.load(Ordering::SeqCst) {
            anyhow::bail!("community API unreachable");
        }
        Ok(self.authors.lock().unwrap().get(&project_id).cloned())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub verifier: Arc<FakeVerifier>,
    pub profiles: Arc<FakeProfiles>,
    pub projects: Arc<FakeProjects>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.public_url = PUBLIC_URL.to_string();
    config.server.allowed_return_hosts = vec![FRONT_END.to_string()];
    config.server.default_return_host = FRONT_END.to_string();
    config.observability.metrics_enabled = false;
    config
}

pub async fn spawn_app() -> TestApp {
    let verifier = Arc::new(FakeVerifier::default());
    let profiles = Arc::new(FakeProfiles::default());
    let projects = Arc::new(FakeProjects::default());

    let clients = Clients {
        verifier: verifier.clone(),
        profiles: profiles.clone(),
        projects: projects.clone(),
    };

    let shared = SharedState::with_clients(test_config(), clients)
        .await
        .expect("Failed to create shared state");
    let state = api::create_app_state(Arc::new(shared), None);
    let router = api::router(state.clone()).await;

    TestApp {
        router,
        state,
        verifier,
        profiles,
        projects,
    }
}

impl TestApp {
    pub fn store(&self) -> &Store {
        self.state.store()
    }

    /// Creates a user and a live session; returns the bearer token.
    pub async fn login(&self, name: &str, admin: bool) -> String {
        self.profiles.add(name);
        let user: Option<User> = self
            .store()
            .create_user(name, None, admin, "test")
            .await
            .unwrap();
        assert!(user.is_some(), "user {name} already exists");

        self.state
            .sessions()
            .issue(name)
            .await
            .unwrap()
            .token
    }

    /// Inserts a jam directly, bypassing the API.
    pub async fn seed_jam(&self, name: &str, dates: JamDates, enable_mystery: bool) -> String {
        let slug = slugify(name);
        let jam = NewJam {
            name: name.to_string(),
            dates,
            content: JamContent {
                body: Some("Secret theme: lighthouses".to_string()),
                colors: Some(serde_json::json!({ "primary": "#223344" })),
                header_image: Some("https://cdn.test/header.png".to_string()),
                description: Some("A jam".to_string()),
            },
            options: JamOptions { enable_mystery },
            featured: false,
        };

        self.store()
            .insert_jam(&slug, &jam, "test")
            .await
            .unwrap()
            .expect("slug collision while seeding");
        slug
    }

    /// Inserts a project directly with an explicit submission time.
    pub async fn seed_project(
        &self,
        jam: &str,
        project_id: i64,
        author: &str,
        submitted_at: DateTime<Utc>,
    ) {
        self.store()
            .insert_project(jam, project_id, author, submitted_at)
            .await
            .unwrap()
            .expect("duplicate project while seeding");
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a request and returns the status plus the decoded JSON body.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.send(request).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }
}

pub fn open_dates() -> JamDates {
    let now = Utc::now();
    JamDates {
        start: now - Duration::days(1),
        end: now + Duration::days(7),
        voting_start: None,
        voting_end: None,
    }
}

pub fn upcoming_dates() -> JamDates {
    let now = Utc::now();
    JamDates {
        start: now + Duration::days(3),
        end: now + Duration::days(10),
        voting_start: None,
        voting_end: None,
    }
}

pub fn closed_dates() -> JamDates {
    let now = Utc::now();
    JamDates {
        start: now - Duration::days(10),
        end: now - Duration::days(1),
        voting_start: None,
        voting_end: None,
    }
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
