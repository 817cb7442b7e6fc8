//! `MemoryGistApi` with artificial latency, for timing-sensitive tests.
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{GistApi, GistError, GistPayload, MemoryGistApi, RemoteGist};

#[derive(Default)]
pub(crate) struct DelayedGistApi {
    pub(crate) inner: MemoryGistApi,
    create_delay: Duration,
    fetch_delays: Mutex<HashMap<String, Duration>>,
}

impl DelayedGistApi {
    pub(crate) fn with_create_delay(create_delay: Duration) -> Self {
        Self {
            create_delay,
            ..Self::default()
        }
    }

    pub(crate) fn delay_fetch(&self, id: &str, delay: Duration) {
        self.fetch_delays
            .lock()
            .unwrap()
            .insert(id.to_string(), delay);
    }

    fn fetch_delay(&self, id: &str) -> Duration {
        self.fetch_delays
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or_default()
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

impl GistApi for DelayedGistApi {
    async fn create(&self, payload: &GistPayload) -> Result<RemoteGist, GistError> {
        pause(self.create_delay).await;
        self.inner.create(payload).await
    }

    async fn update(&self, id: &str, payload: &GistPayload) -> Result<RemoteGist, GistError> {
        self.inner.update(id, payload).await
    }

    async fn fetch(&self, id: &str) -> Result<RemoteGist, GistError> {
        let delay = self.fetch_delay(id);
        pause(delay).await;
        self.inner.fetch(id).await
    }

    async fn delete(&self, id: &str) -> Result<(), GistError> {
        self.inner.delete(id).await
    }
}
