/// Shared application state passed to axum handlers.
use std::sync::Arc;

use slidegist_core::config::GatewayConfig;
use slidegist_core::gist::{GistGateway, MemoryGistApi};

use crate::config::{ServerConfig, StoreKind};
use crate::github::GithubGists;
use crate::remote::GistBackend;

pub type Gateway = GistGateway<GistBackend>;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no remote store is configured (missing credential).
    pub gateway: Option<Arc<Gateway>>,
    pub port: u16,
    pub bind_address: String,
}

impl AppState {
    /// Build state from config and the optional remote credential.
    pub fn from_config(config: &ServerConfig, token: Option<String>) -> Self {
        let backend = match (config.store, token) {
            (StoreKind::Memory, _) => Some(GistBackend::Memory(MemoryGistApi::new())),
            (StoreKind::Github, Some(token)) => Some(GistBackend::Github(GithubGists::new(
                config.api_base_url.clone(),
                token,
            ))),
            (StoreKind::Github, None) => {
                log::warn!("No API token configured; gist endpoints are disabled");
                None
            }
        };

        if let Some(backend) = &backend {
            log::info!("Gist store: {}", backend.name());
        }

        Self {
            gateway: backend.map(|backend| Arc::new(GistGateway::new(backend, config.gist.clone()))),
            port: config.port,
            bind_address: config.bind_address.clone(),
        }
    }

    /// State with an in-process store, for tests and demos.
    pub fn in_memory(gist: GatewayConfig) -> Self {
        Self {
            gateway: Some(Arc::new(GistGateway::new(
                GistBackend::Memory(MemoryGistApi::new()),
                gist,
            ))),
            port: 0,
            bind_address: "127.0.0.1".to_string(),
        }
    }

    /// State with no remote store at all.
    pub fn unconfigured() -> Self {
        Self {
            gateway: None,
            port: 0,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}
