//! Presentation session: the editor/presenter state bound to one document.
//!
//! Every content or title change restarts the autosave debounce. When it
//! fires, the draft is written to local storage and, if the session is bound
//! to a remote document, saved through the gateway as well. Remote autosave
//! failures are logged and never reach the editor.
pub mod autosave;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gist::{GistApi, GistError, GistGateway};
use crate::ownership::OwnedDocs;
use crate::slides::{render, segment};
use crate::storage::DraftStorage;

pub use autosave::Debouncer;

pub const DRAFT_CONTENT_KEY: &str = "slidegist.content";
pub const DRAFT_TITLE_KEY: &str = "slidegist.title";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub autosave_delay: Duration,
    /// Base of shareable URLs, e.g. `https://slides.example.com`.
    pub share_base_url: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_secs(2),
            share_base_url: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub content: String,
    pub title: String,
    pub current_slide: usize,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub bound_document_id: Option<String>,
    /// Address embedding the bound document id; reloading it resumes the binding.
    pub location: Option<String>,
}

struct Inner<A, S> {
    gateway: Arc<GistGateway<A>>,
    drafts: Arc<S>,
    state: Mutex<SessionState>,
    owned: Mutex<OwnedDocs>,
    share_base_url: String,
}

pub struct PresentationSession<A, S> {
    inner: Arc<Inner<A, S>>,
    autosave: Debouncer,
}

impl<A, S> PresentationSession<A, S>
where
    A: GistApi + 'static,
    S: DraftStorage + 'static,
{
    pub fn new(
        gateway: Arc<GistGateway<A>>,
        drafts: Arc<S>,
        owned: OwnedDocs,
        options: SessionOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                drafts,
                state: Mutex::new(SessionState::default()),
                owned: Mutex::new(owned),
                share_base_url: options.share_base_url.trim_end_matches('/').to_string(),
            }),
            autosave: Debouncer::new(options.autosave_delay),
        }
    }

    /// Snapshot of the session state.
    pub fn state(&self) -> SessionState {
        self.inner.state().clone()
    }

    /// Snapshot of the client's ownership token.
    pub fn owned(&self) -> OwnedDocs {
        self.inner.owned().clone()
    }

    /// Load content and title from the local draft, if one exists.
    /// Returns true if anything was restored.
    pub fn restore_draft(&self) -> bool {
        let content = self.inner.drafts.get(DRAFT_CONTENT_KEY);
        let title = self.inner.drafts.get(DRAFT_TITLE_KEY);
        let restored = content.is_some() || title.is_some();

        let mut state = self.inner.state();
        if let Some(content) = content {
            state.content = content;
        }
        if let Some(title) = title {
            state.title = title;
        }
        state.current_slide = clamp_index(&state.content, state.current_slide);
        restored
    }

    pub fn set_content(&self, content: impl Into<String>) {
        {
            let mut state = self.inner.state();
            state.content = content.into();
            state.current_slide = clamp_index(&state.content, state.current_slide);
        }
        self.schedule_autosave();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.inner.state().title = title.into();
        self.schedule_autosave();
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    fn schedule_autosave(&self) {
        let inner = self.inner.clone();
        self.autosave.schedule(async move {
            inner.autosave().await;
        });
    }

    /// Cancel the pending debounce and autosave immediately.
    pub async fn flush_autosave(&self) {
        self.autosave.cancel();
        self.inner.autosave().await;
    }

    /// Shareable URL for the document, publishing it first if unbound.
    pub async fn share(&self) -> Result<String, GistError> {
        if let Some(id) = self.inner.state().bound_document_id.clone() {
            return Ok(self.inner.share_url(&id));
        }

        let (title, content) = {
            let state = self.inner.state();
            (state.title.clone(), state.content.clone())
        };
        let mut owned = self.owned();
        let outcome = self
            .inner
            .gateway
            .save(&mut owned, &title, &content, None)
            .await?;
        self.inner.owned().add(outcome.id.clone());

        let url = self.inner.share_url(&outcome.id);
        let mut state = self.inner.state();
        state.bound_document_id = Some(outcome.id);
        state.location = Some(url.clone());
        state.last_saved_at = Some(Utc::now());
        Ok(url)
    }

    /// Load a remote document into the session.
    ///
    /// The session binds to it only when this client owns it; otherwise it
    /// is opened read-only and the next share creates a copy.
    pub async fn open_document(&self, id: &str) -> Result<(), GistError> {
        let document = self.inner.gateway.load(id).await?;
        let owned = self.inner.gateway.check_ownership(&self.owned(), id);
        self.autosave.cancel();

        let mut state = self.inner.state();
        state.content = document.content;
        state.title = document.title;
        state.current_slide = 0;
        if owned {
            state.bound_document_id = Some(document.id);
            state.location = Some(self.inner.share_url(id));
        } else {
            state.bound_document_id = None;
            state.location = None;
        }
        Ok(())
    }

    pub fn slides(&self) -> Vec<String> {
        segment(&self.inner.state().content)
    }

    pub fn slide_count(&self) -> usize {
        self.slides().len()
    }

    pub fn current_slide(&self) -> usize {
        self.inner.state().current_slide
    }

    /// Move to `index`, clamped to the existing slides. Returns the new index.
    pub fn go_to_slide(&self, index: usize) -> usize {
        let mut state = self.inner.state();
        state.current_slide = clamp_index(&state.content, index);
        state.current_slide
    }

    pub fn next_slide(&self) -> usize {
        let current = self.current_slide();
        self.go_to_slide(current.saturating_add(1))
    }

    pub fn previous_slide(&self) -> usize {
        let current = self.current_slide();
        self.go_to_slide(current.saturating_sub(1))
    }

    /// Sanitized HTML of the slide currently shown.
    pub fn current_slide_html(&self) -> String {
        let (content, index) = {
            let state = self.inner.state();
            (state.content.clone(), state.current_slide)
        };
        let slides = segment(&content);
        render(&slides[index.min(slides.len() - 1)])
    }
}

impl<A: GistApi, S: DraftStorage> Inner<A, S> {
    fn state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn owned(&self) -> std::sync::MutexGuard<'_, OwnedDocs> {
        self.owned.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn share_url(&self, id: &str) -> String {
        format!("{}/?gist={}", self.share_base_url, id)
    }

    async fn autosave(&self) {
        let (title, content, bound) = {
            let state = self.state();
            (
                state.title.clone(),
                state.content.clone(),
                state.bound_document_id.clone(),
            )
        };

        if let Err(e) = self
            .drafts
            .set(DRAFT_CONTENT_KEY, &content)
            .and_then(|_| self.drafts.set(DRAFT_TITLE_KEY, &title))
        {
            log::warn!(target: "slidegist.session", "Local draft save failed: {}", e);
        }

        let Some(bound) = bound else {
            self.state().last_saved_at = Some(Utc::now());
            return;
        };

        // Ids are merged into the live token; overlapping saves never drop one.
        let mut owned = self.owned().clone();
        match self
            .gateway
            .save(&mut owned, &title, &content, Some(&bound))
            .await
        {
            Ok(outcome) => {
                self.owned().add(outcome.id.clone());
                let mut state = self.state();
                state.last_saved_at = Some(Utc::now());
                if outcome.id != bound && state.bound_document_id.as_deref() == Some(bound.as_str()) {
                    log::info!(
                        target: "slidegist.session",
                        "Autosave forked {} into {}",
                        bound,
                        outcome.id
                    );
                    state.location = Some(self.share_url(&outcome.id));
                    state.bound_document_id = Some(outcome.id);
                }
            }
            Err(e) => {
                log::warn!(target: "slidegist.session", "Remote autosave of {} failed: {}", bound, e);
            }
        }
    }
}

fn clamp_index(content: &str, index: usize) -> usize {
    index.min(segment(content).len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::gist::MemoryGistApi;
    use crate::storage::MemoryDraftStorage;

    type TestSession = PresentationSession<MemoryGistApi, MemoryDraftStorage>;

    fn session_with(owned: OwnedDocs) -> (TestSession, Arc<GistGateway<MemoryGistApi>>, Arc<MemoryDraftStorage>) {
        let gateway = Arc::new(GistGateway::new(MemoryGistApi::new(), GatewayConfig::default()));
        let drafts = Arc::new(MemoryDraftStorage::new());
        let options = SessionOptions {
            autosave_delay: Duration::from_secs(2),
            share_base_url: "https://slides.test/".to_string(),
        };
        let session = PresentationSession::new(gateway.clone(), drafts.clone(), owned, options);
        (session, gateway, drafts)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_writes_local_draft_only_when_unbound() {
        let (session, gateway, drafts) = session_with(OwnedDocs::new());

        session.set_title("Deck");
        session.set_content("# One\n## Two");
        assert!(session.autosave_pending());
        assert_eq!(drafts.get(DRAFT_CONTENT_KEY), None);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        settle().await;

        assert_eq!(drafts.get(DRAFT_CONTENT_KEY).as_deref(), Some("# One\n## Two"));
        assert_eq!(drafts.get(DRAFT_TITLE_KEY).as_deref(), Some("Deck"));
        assert!(gateway.api().is_empty());
        assert!(session.state().last_saved_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutations_restart_the_debounce() {
        let (session, _gateway, drafts) = session_with(OwnedDocs::new());

        session.set_content("# a");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        session.set_content("# ab");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        settle().await;
        assert_eq!(drafts.get(DRAFT_CONTENT_KEY), None);

        tokio::time::sleep(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(drafts.get(DRAFT_CONTENT_KEY).as_deref(), Some("# ab"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_binds_and_autosave_updates_remote() {
        let (session, gateway, _drafts) = session_with(OwnedDocs::new());
        session.set_title("Talk");
        session.set_content("# Hello");

        let url = session.share().await.unwrap();
        let id = session.state().bound_document_id.unwrap();
        assert_eq!(url, format!("https://slides.test/?gist={}", id));
        assert_eq!(session.state().location.as_deref(), Some(url.as_str()));
        assert!(session.owned().contains(&id));

        // Sharing again produces the same URL without a remote call.
        gateway.api().set_offline(true);
        assert_eq!(session.share().await.unwrap(), url);
        gateway.api().set_offline(false);

        session.set_content("# Hello\n## More");
        tokio::time::sleep(Duration::from_secs(3)).await;
        settle().await;

        let doc = gateway.load(&id).await.unwrap();
        assert_eq!(doc.content, "# Hello\n## More");
        assert_eq!(doc.title, "Talk");
        assert_eq!(gateway.api().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_autosave_failure_is_swallowed() {
        let (session, gateway, drafts) = session_with(OwnedDocs::new());
        session.set_content("# Hello");
        session.share().await.unwrap();

        gateway.api().set_offline(true);
        session.set_content("# Offline edit");
        tokio::time::sleep(Duration::from_secs(3)).await;
        settle().await;

        assert_eq!(drafts.get(DRAFT_CONTENT_KEY).as_deref(), Some("# Offline edit"));
        assert!(session.state().bound_document_id.is_some());
    }

    #[tokio::test]
    async fn test_autosave_rebinds_when_remote_copy_vanished() {
        let (session, gateway, _drafts) = session_with(OwnedDocs::new());
        session.set_content("# v1");
        session.share().await.unwrap();
        let first = session.state().bound_document_id.unwrap();

        // Deleted upstream behind the session's back.
        gateway.api().delete(&first).await.unwrap();
        assert!(session.owned().contains(&first));

        session.set_content("# v2");
        session.flush_autosave().await;

        let rebound = session.state().bound_document_id.unwrap();
        assert_ne!(rebound, first);
        assert_eq!(gateway.load(&rebound).await.unwrap().content, "# v2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_autosaves_keep_every_forked_id() {
        use crate::gist::delayed::DelayedGistApi;

        let gateway = Arc::new(GistGateway::new(
            DelayedGistApi::with_create_delay(Duration::from_millis(100)),
            GatewayConfig::default(),
        ));
        let session = PresentationSession::new(
            gateway.clone(),
            Arc::new(MemoryDraftStorage::new()),
            OwnedDocs::new(),
            SessionOptions::default(),
        );
        session.set_content("# v1");
        session.share().await.unwrap();
        let first = session.state().bound_document_id.unwrap();
        gateway.api().inner.delete(&first).await.unwrap();

        session.set_content("# v2");
        tokio::join!(session.flush_autosave(), session.flush_autosave());

        let owned = session.owned();
        assert_eq!(owned.len(), 3);
        assert!(owned.contains(&first));
        let rebound = session.state().bound_document_id.unwrap();
        assert!(owned.contains(&rebound));
        assert_ne!(rebound, first);
    }

    #[tokio::test]
    async fn test_share_failure_leaves_session_unbound() {
        let (session, gateway, _drafts) = session_with(OwnedDocs::new());
        gateway.api().set_offline(true);
        session.set_content("# x");

        assert!(session.share().await.is_err());
        assert_eq!(session.state().bound_document_id, None);
        assert!(session.owned().is_empty());
    }

    #[tokio::test]
    async fn test_open_document_binds_only_when_owned() {
        let (author, gateway, _) = session_with(OwnedDocs::new());
        author.set_title("Shared");
        author.set_content("# A\n# B");
        author.share().await.unwrap();
        let id = author.state().bound_document_id.unwrap();

        let owner = PresentationSession::new(
            gateway.clone(),
            Arc::new(MemoryDraftStorage::new()),
            author.owned(),
            SessionOptions::default(),
        );
        owner.open_document(&id).await.unwrap();
        assert_eq!(owner.state().bound_document_id.as_deref(), Some(id.as_str()));
        assert_eq!(owner.state().title, "Shared");

        let visitor = PresentationSession::new(
            gateway.clone(),
            Arc::new(MemoryDraftStorage::new()),
            OwnedDocs::new(),
            SessionOptions::default(),
        );
        visitor.open_document(&id).await.unwrap();
        assert_eq!(visitor.state().bound_document_id, None);
        assert_eq!(visitor.slide_count(), 2);

        assert!(visitor.open_document("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_navigation_is_clamped() {
        let (session, _, _) = session_with(OwnedDocs::new());
        session.set_content("# One\n## Two\n### not a slide\n# Three");

        assert_eq!(session.slide_count(), 3);
        assert_eq!(session.previous_slide(), 0);
        assert_eq!(session.next_slide(), 1);
        assert_eq!(session.next_slide(), 2);
        assert_eq!(session.next_slide(), 2);
        assert!(session.current_slide_html().contains("<h1>Three</h1>"));

        session.set_content("# Only");
        assert_eq!(session.current_slide(), 0);
        assert_eq!(session.go_to_slide(10), 0);
    }

    #[test]
    fn test_editing_outside_runtime_keeps_local_state() {
        let (session, _, drafts) = session_with(OwnedDocs::new());

        session.set_title("Offline");
        session.set_content("# One\n# Two");

        assert_eq!(session.state().title, "Offline");
        assert_eq!(session.slide_count(), 2);
        assert!(!session.autosave_pending());
        assert_eq!(drafts.get(DRAFT_CONTENT_KEY), None);
    }

    #[tokio::test]
    async fn test_restore_draft() {
        let (session, _, drafts) = session_with(OwnedDocs::new());
        assert!(!session.restore_draft());

        drafts.set(DRAFT_CONTENT_KEY, "# Saved").unwrap();
        drafts.set(DRAFT_TITLE_KEY, "Saved deck").unwrap();
        assert!(session.restore_draft());
        assert_eq!(session.state().content, "# Saved");
        assert_eq!(session.state().title, "Saved deck");
    }
}
