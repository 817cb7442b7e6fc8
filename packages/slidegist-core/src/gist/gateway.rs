//! Ownership-aware save/load/list/delete over a [`GistApi`].
//!
//! The caller passes the client's [`OwnedDocs`] into every call that can
//! change it; the gateway never keeps ownership state of its own.
//!
//! Failure policy:
//! - save: an update that fails for any reason falls back to creating a new
//!   document. Only a failing create reaches the caller.
//! - list: ids that cannot be fetched are dropped from the result.
//! - delete: "not found" upstream counts as success.
//! - load: errors are returned as-is, there is nothing to fall back to.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;

use super::{GistApi, GistError, GistPayload, PayloadFile, RemoteGist};
use crate::config::GatewayConfig;
use crate::ownership::OwnedDocs;
use crate::types::{Document, DocumentMeta, DocumentSummary, SaveOutcome};

pub struct GistGateway<A> {
    api: A,
    config: GatewayConfig,
}

impl<A: GistApi> GistGateway<A> {
    pub fn new(api: A, config: GatewayConfig) -> Self {
        Self { api, config }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Persist a document.
    ///
    /// With an owned `existing_id` the remote document is updated in place.
    /// If that update fails, or the id is not owned by this client, a new
    /// document is created instead and its id is added to `owned`.
    pub async fn save(
        &self,
        owned: &mut OwnedDocs,
        title: &str,
        content: &str,
        existing_id: Option<&str>,
    ) -> Result<SaveOutcome, GistError> {
        let now = Utc::now();

        if let Some(id) = existing_id {
            if owned.contains(id) {
                match self.update_existing(id, title, content, now).await {
                    Ok(gist) => {
                        owned.add(id);
                        log::info!(target: "slidegist.gateway", "Updated document {}", id);
                        return Ok(SaveOutcome {
                            id: id.to_string(),
                            url: gist.html_url,
                            updated: true,
                        });
                    }
                    Err(e) => {
                        log::warn!(
                            target: "slidegist.gateway",
                            "Update of {} failed ({}), creating a new document",
                            id,
                            e
                        );
                    }
                }
            } else {
                log::info!(
                    target: "slidegist.gateway",
                    "Document {} is not owned by this client, creating a copy",
                    id
                );
            }
        }

        let payload = self.payload(title, content, now, now);
        let gist = self.api.create(&payload).await?;
        if gist.id.is_empty() {
            return Err(GistError::Decode("create response has no id".to_string()));
        }
        owned.add(gist.id.clone());
        log::info!(target: "slidegist.gateway", "Created document {}", gist.id);

        Ok(SaveOutcome {
            id: gist.id,
            url: gist.html_url,
            updated: false,
        })
    }

    async fn update_existing(
        &self,
        id: &str,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<RemoteGist, GistError> {
        // Keep the original creation time when the current metadata is readable.
        let created_at = match self.api.fetch(id).await {
            Ok(gist) => self.read_meta(&gist).and_then(|meta| meta.created_at),
            Err(e) => {
                log::debug!(target: "slidegist.gateway", "Pre-update fetch of {} failed: {}", id, e);
                None
            }
        };
        let payload = self.payload(title, content, created_at.unwrap_or(now), now);
        self.api.update(id, &payload).await
    }

    /// Fetch a document by id.
    pub async fn load(&self, id: &str) -> Result<Document, GistError> {
        let gist = self.api.fetch(id).await?;
        let meta = self.read_meta(&gist).unwrap_or_default();
        let now = Utc::now();

        Ok(Document {
            id: id.to_string(),
            title: self.title_or_default(meta.title),
            content: gist
                .file_content(&self.config.markdown_file)
                .unwrap_or_default()
                .to_string(),
            created_at: meta
                .created_at
                .or_else(|| parse_timestamp(gist.created_at.as_deref()))
                .unwrap_or(now),
            updated_at: meta
                .updated_at
                .or_else(|| parse_timestamp(gist.updated_at.as_deref()))
                .unwrap_or(now),
        })
    }

    /// Summaries for every owned id that still resolves upstream.
    ///
    /// Lookups run concurrently; the result keeps the order of `owned`.
    pub async fn list(&self, owned: &OwnedDocs) -> Vec<DocumentSummary> {
        let lookups = owned.ids().iter().map(|id| async move {
            let result = self.api.fetch(id).await;
            (id, result)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(gist) => Some(self.summary(id, &gist)),
                Err(e) => {
                    log::debug!(target: "slidegist.gateway", "Dropping {} from list: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Delete a document and forget it in `owned`.
    ///
    /// Ids the client does not own are only dropped locally; the remote copy
    /// is left alone.
    pub async fn delete(&self, owned: &mut OwnedDocs, id: &str) -> Result<(), GistError> {
        if !owned.contains(id) {
            log::info!(
                target: "slidegist.gateway",
                "Delete of {} skipped: not owned by this client",
                id
            );
            return Ok(());
        }

        match self.api.delete(id).await {
            Ok(()) => log::info!(target: "slidegist.gateway", "Deleted document {}", id),
            Err(e) if e.is_not_found() => {
                log::info!(target: "slidegist.gateway", "Document {} was already gone", id)
            }
            Err(e) => return Err(e),
        }
        owned.remove(id);
        Ok(())
    }

    /// Ownership as recorded by the client token. No remote call.
    pub fn check_ownership(&self, owned: &OwnedDocs, id: &str) -> bool {
        owned.contains(id)
    }

    fn payload(
        &self,
        title: &str,
        content: &str,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> GistPayload {
        let meta = DocumentMeta {
            title: Some(title.to_string()),
            created_at: Some(created_at),
            updated_at: Some(updated_at),
        };
        let meta_json = serde_json::to_string_pretty(&meta).unwrap_or_else(|_| "{}".to_string());

        let mut files = BTreeMap::new();
        files.insert(
            self.config.markdown_file.clone(),
            PayloadFile {
                content: content.to_string(),
            },
        );
        files.insert(
            self.config.metadata_file.clone(),
            PayloadFile { content: meta_json },
        );

        GistPayload {
            description: self.title_or_default(Some(title.to_string())),
            public: self.config.public,
            files,
        }
    }

    /// Metadata entry of a gist. `None` when the entry is absent or is not a
    /// JSON object; individual unreadable fields are skipped.
    fn read_meta(&self, gist: &RemoteGist) -> Option<DocumentMeta> {
        let raw = gist.file_content(&self.config.metadata_file)?;
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            Ok(_) => {
                log::warn!(target: "slidegist.gateway", "Metadata of {} is not an object", gist.id);
                return None;
            }
            Err(e) => {
                log::warn!(target: "slidegist.gateway", "Malformed metadata in {}: {}", gist.id, e);
                return None;
            }
        };

        Some(DocumentMeta {
            title: value["title"].as_str().map(str::to_string),
            created_at: parse_timestamp(value["createdAt"].as_str()),
            updated_at: parse_timestamp(value["updatedAt"].as_str()),
        })
    }

    fn title_or_default(&self, title: Option<String>) -> String {
        title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.config.default_title.clone())
    }

    fn summary(&self, id: &str, gist: &RemoteGist) -> DocumentSummary {
        let meta = self.read_meta(gist).unwrap_or_default();
        DocumentSummary {
            id: id.to_string(),
            title: self.title_or_default(meta.title),
            description: gist.description.clone().unwrap_or_default(),
            updated_at: meta
                .updated_at
                .or_else(|| parse_timestamp(gist.updated_at.as_deref()))
                .unwrap_or_else(Utc::now),
            url: gist.html_url.clone(),
        }
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
