/// Configuration for the slidegist backend.
/// Reads server.json from ~/.config/slidegist/server.json (or platform equivalent),
/// overridable with SLIDEGIST_CONFIG. The remote credential comes from the
/// environment only: API_TOKEN, falling back to GITHUB_TOKEN.
use serde::{Deserialize, Serialize};
use slidegist_core::config::GatewayConfig;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "SLIDEGIST_CONFIG";
pub const TOKEN_ENV: &str = "API_TOKEN";
pub const TOKEN_ENV_FALLBACK: &str = "GITHUB_TOKEN";

/// Which remote document store backs the gist endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Github,
    /// In-process store, lost on restart. Needs no credential.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Base for share links; defaults to http://{bind_address}:{port}.
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default)]
    pub gist: GatewayConfig,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            public_base_url: None,
            api_base_url: default_api_base_url(),
            store: StoreKind::default(),
            gist: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://{}:{}", self.bind_address, self.port),
        }
    }
}

/// Default config path: ~/.config/slidegist/server.json
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("slidegist")
        .join("server.json")
}

/// Load config from path. Returns default if file doesn't exist or can't be parsed.
pub fn load_config(path: &Path) -> ServerConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config {}: {}", path.display(), e);
            ServerConfig::default()
        }),
        Err(_) => {
            log::info!("No config at {}, using defaults", path.display());
            ServerConfig::default()
        }
    }
}

/// Remote credential from the environment. Blank values count as missing.
pub fn api_token_from_env() -> Option<String> {
    [TOKEN_ENV, TOKEN_ENV_FALLBACK]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.json"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreKind::Github);
        assert_eq!(config.gist.markdown_file, "presentation.md");
        assert_eq!(config.public_base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("server.json");
        fs::write(
            &path,
            r#"{"port": 9000, "store": "memory", "public_base_url": "https://slides.example/",
                "gist": {"defaultTitle": "Untitled deck", "public": true}}"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.port, 9000);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.public_base_url(), "https://slides.example");
        assert_eq!(config.api_base_url, "https://api.github.com");
        assert_eq!(config.gist.default_title, "Untitled deck");
        assert_eq!(config.gist.metadata_file, "metadata.json");
        assert!(config.gist.public);
    }

    #[test]
    fn test_unparsable_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("server.json");
        fs::write(&path, "port = 1").unwrap();
        assert_eq!(load_config(&path).port, 8080);
    }
}
