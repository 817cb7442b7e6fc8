//! Remote gist store: API seam, wire schema and errors.
//!
//! The remote is an opaque key/value document store in the shape of the
//! GitHub gist API. Documents are addressed by an id the remote assigns and
//! carry a map of named text files. Every field of a remote response is
//! optional on read.
#[cfg(test)]
pub(crate) mod delayed;
pub mod gateway;
pub mod memory;

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use serde::{Deserialize, Serialize};

pub use gateway::GistGateway;
pub use memory::MemoryGistApi;

/// One file of a remote gist as returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteFile {
    pub content: Option<String>,
    pub truncated: bool,
    pub raw_url: Option<String>,
}

/// A remote gist. Unknown fields are ignored, missing ones defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteGist {
    pub id: String,
    pub html_url: String,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// GitHub reports a deleted file in a PATCH response as `null`.
    pub files: HashMap<String, Option<RemoteFile>>,
}

impl RemoteGist {
    /// Text content of a named file, if present and non-null.
    pub fn file_content(&self, name: &str) -> Option<&str> {
        self.files
            .get(name)
            .and_then(|file| file.as_ref())
            .and_then(|file| file.content.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadFile {
    pub content: String,
}

/// Request body for create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GistPayload {
    pub description: String,
    pub public: bool,
    pub files: BTreeMap<String, PayloadFile>,
}

#[derive(Debug, thiserror::Error)]
pub enum GistError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Remote document store is not configured")]
    NotConfigured,

    #[error("Remote document store unreachable: {0}")]
    Transport(String),

    #[error("Remote document store returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Unexpected response from remote document store: {0}")]
    Decode(String),
}

impl GistError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GistError::NotFound(_))
    }
}

/// Remote document API.
///
/// Implementations: `MemoryGistApi` (in-process), the GitHub client in the
/// backend crate.
pub trait GistApi: Send + Sync {
    fn create(
        &self,
        payload: &GistPayload,
    ) -> impl Future<Output = Result<RemoteGist, GistError>> + Send;

    fn update(
        &self,
        id: &str,
        payload: &GistPayload,
    ) -> impl Future<Output = Result<RemoteGist, GistError>> + Send;

    fn fetch(&self, id: &str) -> impl Future<Output = Result<RemoteGist, GistError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), GistError>> + Send;
}
