use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::limits;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub identity: IdentityConfig,

    pub jams: JamConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/jamhub.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    /// Externally reachable base URL of this backend. The identity provider
    /// redirects back to `{public_url}/api/auth/callback`.
    pub public_url: String,

    pub cors_allowed_origins: Vec<String>,

    /// Front-end hosts the login flow may send the browser back to.
    pub allowed_return_hosts: Vec<String>,

    /// Used when a login starts without an explicit return host.
    pub default_return_host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8787,
            public_url: "http://localhost:8787".to_string(),
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            allowed_return_hosts: vec!["http://localhost:3000".to_string()],
            default_return_host: "http://localhost:3000".to_string(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn is_allowed_return_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('/');
        self.allowed_return_hosts
            .iter()
            .any(|allowed| allowed.trim_end_matches('/') == host)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Page the browser is sent to in order to prove account ownership.
    pub provider_url: String,

    /// Endpoint that exchanges a private code for a verified user name.
    pub verify_url: String,

    /// Name shown to the user on the provider's page.
    pub app_name: String,

    /// Base URL of the community API used for profile and project lookups.
    pub profile_api_url: String,

    /// Request timeout in seconds (default: 15)
    pub request_timeout_seconds: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            provider_url: "https://auth.itinerary.eu.org/auth/".to_string(),
            verify_url: "https://auth.itinerary.eu.org/api/auth/verifyToken".to_string(),
            app_name: "Jamhub".to_string(),
            profile_api_url: "https://api.scratch.mit.edu".to_string(),
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JamConfig {
    /// Maximum upvotes a user may cast within one jam.
    pub upvote_cap: u64,

    pub default_page_size: u64,

    pub max_page_size: u64,
}

impl Default for JamConfig {
    fn default() -> Self {
        Self {
            upvote_cap: limits::UPVOTES_PER_JAM,
            default_page_size: limits::DEFAULT_PAGE_SIZE,
            max_page_size: limits::MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Random bytes per session secret (default: 32). Must be at least 16.
    pub session_token_bytes: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session_token_bytes: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            identity: IdentityConfig::default(),
            jams: JamConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var("JAMHUB_CONFIG") {
            let path = PathBuf::from(explicit);
            info!("Loading config from JAMHUB_CONFIG: {}", path.display());
            return Self::load_from_path(&path);
        }

        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("jamhub").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".jamhub").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.public_url.trim().is_empty() {
            anyhow::bail!("server.public_url cannot be empty");
        }

        if self.security.session_token_bytes < 16 {
            anyhow::bail!("security.session_token_bytes must be at least 16 (128 bits)");
        }

        if self.jams.upvote_cap == 0 {
            anyhow::bail!("jams.upvote_cap must be greater than 0");
        }

        if self.jams.default_page_size == 0
            || self.jams.default_page_size > self.jams.max_page_size
        {
            anyhow::bail!("jams.default_page_size must be between 1 and jams.max_page_size");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.jams.upvote_cap, 3);
        assert_eq!(config.security.session_token_bytes, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[identity]"));
        assert!(toml_str.contains("[jams]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [jams]
            upvote_cap = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.jams.upvote_cap, 5);

        assert_eq!(config.jams.default_page_size, 20);
        assert_eq!(config.server.port, 8787);
    }

    #[test]
    fn test_validate_rejects_short_tokens() {
        let mut config = Config::default();
        config.security.session_token_bytes = 8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_return_host_matching_ignores_trailing_slash() {
        let config = ServerConfig::default();
        assert!(config.is_allowed_return_host("http://localhost:3000/"));
        assert!(!config.is_allowed_return_host("https://evil.example"));
    }
}
