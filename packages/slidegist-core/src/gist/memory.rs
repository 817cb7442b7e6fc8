//! In-process gist store.
//!
//! Behaves like the remote API for the operations the gateway uses: ids are
//! assigned on create, unknown ids report `NotFound`, updates merge files.
//! `set_offline(true)` makes every call fail with a transport error.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};

use super::{GistApi, GistError, GistPayload, RemoteFile, RemoteGist};

pub struct MemoryGistApi {
    gists: Mutex<HashMap<String, RemoteGist>>,
    offline: AtomicBool,
    url_base: String,
}

impl Default for MemoryGistApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGistApi {
    pub fn new() -> Self {
        Self::with_url_base("memory://gists")
    }

    /// `html_url` of stored gists is `{url_base}/{id}`.
    pub fn with_url_base(url_base: impl Into<String>) -> Self {
        Self {
            gists: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            url_base: url_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Store a gist exactly as given (for shapes the gateway never writes).
    pub fn insert_raw(&self, gist: RemoteGist) {
        self.lock().insert(gist.id.clone(), gist);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RemoteGist>> {
        self.gists.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_online(&self) -> Result<(), GistError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(GistError::Transport("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn files_of(payload: &GistPayload) -> HashMap<String, Option<RemoteFile>> {
        payload
            .files
            .iter()
            .map(|(name, file)| {
                (
                    name.clone(),
                    Some(RemoteFile {
                        content: Some(file.content.clone()),
                        truncated: false,
                        raw_url: None,
                    }),
                )
            })
            .collect()
    }
}

impl GistApi for MemoryGistApi {
    async fn create(&self, payload: &GistPayload) -> Result<RemoteGist, GistError> {
        self.check_online()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let now = Self::now();
        let gist = RemoteGist {
            id: id.clone(),
            html_url: format!("{}/{}", self.url_base, id),
            description: Some(payload.description.clone()),
            created_at: Some(now.clone()),
            updated_at: Some(now),
            files: Self::files_of(payload),
        };
        self.lock().insert(id, gist.clone());
        Ok(gist)
    }

    async fn update(&self, id: &str, payload: &GistPayload) -> Result<RemoteGist, GistError> {
        self.check_online()?;
        let mut gists = self.lock();
        let gist = gists
            .get_mut(id)
            .ok_or_else(|| GistError::NotFound(id.to_string()))?;
        gist.description = Some(payload.description.clone());
        gist.updated_at = Some(Self::now());
        gist.files.extend(Self::files_of(payload));
        Ok(gist.clone())
    }

    async fn fetch(&self, id: &str) -> Result<RemoteGist, GistError> {
        self.check_online()?;
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| GistError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), GistError> {
        self.check_online()?;
        self.lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| GistError::NotFound(id.to_string()))
    }
}
