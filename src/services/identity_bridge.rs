//! Bridge to the external identity provider.
//!
//! Login is a redirect handshake: the browser is sent to the provider with a
//! base64-encoded callback URL, the provider sends it back with a private
//! code, and the code is exchanged server-side for a verified user name.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::clients::{IdentityVerifier, ProfileDirectory};
use crate::config::Config;
use crate::constants::auth::CALLBACK_PATH;
use crate::db::Store;
use crate::models::User;

/// Why a login attempt did not produce a user.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("The identity provider rejected the login code")]
    Invalid,

    #[error("No community account matches the verified name")]
    UserNotFound,

    #[error("Identity service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("This account is banned")]
    Banned,

    #[error("Return host is not allowed: {0}")]
    ReturnHostNotAllowed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthFailure {
    /// Stable classification carried to the login-error page.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::UserNotFound => "userNotFound",
            Self::UpstreamUnavailable(_) => "upstreamUnavailable",
            Self::Banned => "banned",
            Self::ReturnHostNotAllowed(_) => "returnHostNotAllowed",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<anyhow::Error> for AuthFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<sea_orm::DbErr> for AuthFailure {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(err.to_string())
    }
}

pub struct IdentityBridge {
    store: Store,
    verifier: Arc<dyn IdentityVerifier>,
    profiles: Arc<dyn ProfileDirectory>,
    provider_url: String,
    app_name: String,
    callback_url: String,
    allowed_return_hosts: Vec<String>,
    default_return_host: String,
}

impl IdentityBridge {
    #[must_use]
    pub fn new(
        config: &Config,
        store: Store,
        verifier: Arc<dyn IdentityVerifier>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            store,
            verifier,
            profiles,
            provider_url: config.identity.provider_url.clone(),
            app_name: config.identity.app_name.clone(),
            callback_url: format!(
                "{}{}",
                config.server.public_url.trim_end_matches('/'),
                CALLBACK_PATH
            ),
            allowed_return_hosts: config
                .server
                .allowed_return_hosts
                .iter()
                .map(|h| h.trim_end_matches('/').to_string())
                .collect(),
            default_return_host: config
                .server
                .default_return_host
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Resolves the front-end host a login should return to.
    ///
    /// `None` selects the configured default; any other value must be on the
    /// allow-list.
    pub fn return_host(&self, requested: Option<&str>) -> Result<String, AuthFailure> {
        let Some(host) = requested.map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(self.default_return_host.clone());
        };

        let host = host.trim_end_matches('/');
        if self.allowed_return_hosts.iter().any(|allowed| allowed == host) {
            Ok(host.to_string())
        } else {
            Err(AuthFailure::ReturnHostNotAllowed(host.to_string()))
        }
    }

    /// Builds the provider URL that starts a login returning to `return_host`.
    pub fn begin_auth(&self, return_host: Option<&str>) -> Result<Url, AuthFailure> {
        let host = self.return_host(return_host)?;

        let mut callback = Url::parse(&self.callback_url)
            .map_err(|e| AuthFailure::Internal(format!("Invalid public_url: {e}")))?;
        callback.query_pairs_mut().append_pair("host", &host);

        let encoded = STANDARD.encode(callback.as_str());

        Url::parse_with_params(
            &self.provider_url,
            &[("redirect", encoded.as_str()), ("name", self.app_name.as_str())],
        )
        .map_err(|e| AuthFailure::Internal(format!("Invalid identity.provider_url: {e}")))
    }

    /// Exchanges a provider private code for a local user record.
    ///
    /// Unseen users are created; known users get their canonical casing and
    /// avatar refreshed. Banned users are refused before anything is written.
    pub async fn complete_auth(&self, private_code: &str) -> Result<User, AuthFailure> {
        let result = self.verify_and_load(private_code).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(failure) => failure.code(),
        };
        metrics::counter!("auth_logins_total", "outcome" => outcome).increment(1);

        result
    }

    async fn verify_and_load(&self, private_code: &str) -> Result<User, AuthFailure> {
        if private_code.trim().is_empty() {
            return Err(AuthFailure::Invalid);
        }

        let verification = self.verifier.verify(private_code).await.map_err(|e| {
            warn!(error = %e, "Identity verification failed");
            AuthFailure::UpstreamUnavailable(e.to_string())
        })?;

        if !verification.valid {
            return Err(AuthFailure::Invalid);
        }

        // A code minted for some other application's callback is not ours.
        if let Some(redirect) = verification.redirect.as_deref()
            && !redirect.starts_with(&self.callback_url)
        {
            warn!(redirect = %redirect, "Login code was issued for a different callback");
            return Err(AuthFailure::Invalid);
        }

        let Some(username) = verification.username else {
            return Err(AuthFailure::Invalid);
        };

        let profile = self
            .profiles
            .lookup(&username)
            .await
            .map_err(|e| {
                warn!(error = %e, "Profile lookup failed");
                AuthFailure::UpstreamUnavailable(e.to_string())
            })?
            .ok_or(AuthFailure::UserNotFound)?;

        if let Some(existing) = self.store.get_user(&profile.username).await?
            && existing.banned
        {
            info!(user = %existing.name, "Refused login for banned user");
            return Err(AuthFailure::Banned);
        }

        let user = self
            .store
            .upsert_login_user(&profile.username, profile.avatar_url.as_deref())
            .await?;

        info!(user = %user.name, "User authenticated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{Profile, Verification};
    use async_trait::async_trait;

    struct FixedVerifier(anyhow::Result<Verification>);

    #[async_trait]
    impl IdentityVerifier for FixedVerifier {
        async fn verify(&self, _code: &str) -> anyhow::Result<Verification> {
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    struct Canonical;

    #[async_trait]
    impl ProfileDirectory for Canonical {
        async fn lookup(&self, name: &str) -> anyhow::Result<Option<Profile>> {
            Ok(name.eq_ignore_ascii_case("alice").then(|| Profile {
                username: "Alice".to_string(),
                avatar_url: Some("https://cdn/alice.png".to_string()),
            }))
        }
    }

    fn verified(name: &str) -> Verification {
        Verification {
            valid: true,
            username: Some(name.to_string()),
            redirect: None,
        }
    }

    async fn bridge(verification: anyhow::Result<Verification>) -> (IdentityBridge, Store) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let bridge = IdentityBridge::new(
            &Config::default(),
            store.clone(),
            Arc::new(FixedVerifier(verification)),
            Arc::new(Canonical),
        );
        (bridge, store)
    }

    #[tokio::test]
    async fn begin_auth_encodes_callback() {
        let (bridge, _) = bridge(Ok(verified("alice"))).await;
        let url = bridge.begin_auth(None).unwrap();

        let redirect = url
            .query_pairs()
            .find(|(k, _)| k == "redirect")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let decoded = String::from_utf8(STANDARD.decode(redirect).unwrap()).unwrap();
        assert!(decoded.starts_with("http://localhost:8787/api/auth/callback?host="));
        assert!(url.query_pairs().any(|(k, v)| k == "name" && v == "Jamhub"));
    }

    #[tokio::test]
    async fn begin_auth_rejects_unknown_host() {
        let (bridge, _) = bridge(Ok(verified("alice"))).await;
        let err = bridge.begin_auth(Some("https://evil.example")).unwrap_err();
        assert_eq!(err.code(), "returnHostNotAllowed");
    }

    #[tokio::test]
    async fn complete_auth_creates_user_with_canonical_name() {
        let (bridge, store) = bridge(Ok(verified("ALICE"))).await;
        let user = bridge.complete_auth("code").await.unwrap();

        assert_eq!(user.name, "Alice");
        assert_eq!(user.avatar_url.as_deref(), Some("https://cdn/alice.png"));
        assert!(store.get_user("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn complete_auth_classifies_failures() {
        let (rejected, _) = bridge(Ok(Verification {
            valid: false,
            username: None,
            redirect: None,
        }))
        .await;
        assert_eq!(rejected.complete_auth("code").await.unwrap_err().code(), "invalid");

        let (unknown, _) = bridge(Ok(verified("nobody"))).await;
        assert_eq!(unknown.complete_auth("code").await.unwrap_err().code(), "userNotFound");

        let (down, _) = bridge(Err(anyhow::anyhow!("timeout"))).await;
        assert_eq!(down.complete_auth("code").await.unwrap_err().code(), "upstreamUnavailable");
    }

    #[tokio::test]
    async fn complete_auth_rejects_foreign_redirect() {
        let (bridge, _) = bridge(Ok(Verification {
            valid: true,
            username: Some("alice".to_string()),
            redirect: Some("https://other.app/callback".to_string()),
        }))
        .await;
        assert_eq!(bridge.complete_auth("code").await.unwrap_err().code(), "invalid");
    }

    #[tokio::test]
    async fn banned_user_is_refused() {
        let (bridge, store) = bridge(Ok(verified("alice"))).await;
        store.create_user("Alice", None, false, "admin").await.unwrap();
        store.set_user_banned("alice", true, "admin").await.unwrap();

        let err = bridge.complete_auth("code").await.unwrap_err();
        assert!(matches!(err, AuthFailure::Banned));
    }
}
