//! Outbound HTTP clients for the identity provider and the community API.
//!
//! Services depend on the traits below rather than the concrete clients so the
//! upstream can be swapped out in tests. An `Err` from any of these methods
//! always means the upstream could not be reached or answered garbage; a
//! definitive "no" is expressed in the `Ok` value.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::constants::USER_AGENT;

pub mod community;
pub mod identity;

pub use community::CommunityClient;
pub use identity::IdentityProviderClient;

/// Result of exchanging a private code with the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Verification {
    pub valid: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
}

/// Public profile as reported by the community API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, private_code: &str) -> Result<Verification>;
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Looks up a user by case-insensitive name. `Ok(None)` if no such user.
    async fn lookup(&self, name: &str) -> Result<Option<Profile>>;
}

#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Returns the author of an external project, `Ok(None)` if it does not exist.
    async fn project_author(&self, project_id: i64) -> Result<Option<String>>;
}

/// Build a shared HTTP client for the upstream APIs.
pub fn build_http_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}
