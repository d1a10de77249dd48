use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::{IdentityVerifier, Verification};

#[derive(Clone)]
pub struct IdentityProviderClient {
    client: Client,
    verify_url: String,
}

impl IdentityProviderClient {
    #[must_use]
    pub fn new(client: Client, verify_url: impl Into<String>) -> Self {
        Self {
            client,
            verify_url: verify_url.into(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for IdentityProviderClient {
    async fn verify(&self, private_code: &str) -> Result<Verification> {
        let response = self
            .client
            .get(&self.verify_url)
            .query(&[("privateCode", private_code)])
            .send()
            .await
            .context("Identity provider request failed")?;

        // The provider answers unknown or expired codes with a 4xx and no body
        // worth parsing; that is a rejection, not an outage.
        if response.status().is_client_error() {
            return Ok(Verification {
                valid: false,
                username: None,
                redirect: None,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Identity provider error: {} - {}",
                status,
                body
            ));
        }

        response
            .json::<Verification>()
            .await
            .context("Failed to decode identity provider response")
    }
}
