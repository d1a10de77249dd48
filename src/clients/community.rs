use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

use super::{Profile, ProfileDirectory, ProjectDirectory};

const AVATAR_SIZE: &str = "90x90";

#[derive(Debug, Deserialize)]
struct UserResponse {
    username: String,
    #[serde(default)]
    profile: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    #[serde(default)]
    images: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    author: ProjectAuthor,
}

#[derive(Debug, Deserialize)]
struct ProjectAuthor {
    username: String,
}

/// Client for the community site's public REST API.
#[derive(Clone)]
pub struct CommunityClient {
    client: Client,
    base_url: String,
}

impl CommunityClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Community API request failed: {url}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Community API error: {} - {}", status, body));
        }

        let parsed = response
            .json::<T>()
            .await
            .context("Failed to decode community API response")?;
        Ok(Some(parsed))
    }
}

#[async_trait]
impl ProfileDirectory for CommunityClient {
    async fn lookup(&self, name: &str) -> Result<Option<Profile>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let url = format!("{}/users/{}", self.base_url, urlencoding::encode(name));
        let user: Option<UserResponse> = self.get_json(&url).await?;

        Ok(user.map(|user| Profile {
            avatar_url: user
                .profile
                .and_then(|mut profile| profile.images.remove(AVATAR_SIZE)),
            username: user.username,
        }))
    }
}

#[async_trait]
impl ProjectDirectory for CommunityClient {
    async fn project_author(&self, project_id: i64) -> Result<Option<String>> {
        let url = format!("{}/projects/{}", self.base_url, project_id);
        let project: Option<ProjectResponse> = self.get_json(&url).await?;
        Ok(project.map(|p| p.author.username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_picks_avatar() {
        let raw = r#"{
            "id": 1,
            "username": "Griffpatch",
            "profile": {"images": {"90x90": "https://cdn/90.png", "50x50": "https://cdn/50.png"}}
        }"#;
        let user: UserResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(user.username, "Griffpatch");
        let images = user.profile.unwrap().images;
        assert_eq!(images.get(AVATAR_SIZE).map(String::as_str), Some("https://cdn/90.png"));
    }

    #[test]
    fn project_response_reads_author() {
        let raw = r#"{"id": 42, "title": "Pong", "author": {"id": 7, "username": "alice"}}"#;
        let project: ProjectResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(project.author.username, "alice");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = CommunityClient::new(Client::new(), "https://api.example/");
        assert_eq!(client.base_url, "https://api.example");
    }
}
