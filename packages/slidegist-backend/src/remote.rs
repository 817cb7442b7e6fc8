/// Remote store selected at startup: GitHub, or the in-process store.
use slidegist_core::gist::{GistApi, GistError, GistPayload, MemoryGistApi, RemoteGist};

use crate::github::GithubGists;

pub enum GistBackend {
    Github(GithubGists),
    Memory(MemoryGistApi),
}

impl GistBackend {
    pub fn name(&self) -> &'static str {
        match self {
            GistBackend::Github(_) => "github",
            GistBackend::Memory(_) => "memory",
        }
    }
}

impl GistApi for GistBackend {
    async fn create(&self, payload: &GistPayload) -> Result<RemoteGist, GistError> {
        match self {
            GistBackend::Github(api) => api.create(payload).await,
            GistBackend::Memory(api) => api.create(payload).await,
        }
    }

    async fn update(&self, id: &str, payload: &GistPayload) -> Result<RemoteGist, GistError> {
        match self {
            GistBackend::Github(api) => api.update(id, payload).await,
            GistBackend::Memory(api) => api.update(id, payload).await,
        }
    }

    async fn fetch(&self, id: &str) -> Result<RemoteGist, GistError> {
        match self {
            GistBackend::Github(api) => api.fetch(id).await,
            GistBackend::Memory(api) => api.fetch(id).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<(), GistError> {
        match self {
            GistBackend::Github(api) => api.delete(id).await,
            GistBackend::Memory(api) => api.delete(id).await,
        }
    }
}
