//! Debounced task scheduling.
//!
//! Each `schedule` call replaces the pending timer: the previous task is
//! dropped if its delay has not elapsed yet. Once a timer fires its task is
//! detached, so later schedules never cancel work that already started.
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `task` after the delay unless another schedule comes first.
    ///
    /// Outside a tokio runtime nothing is scheduled and false is returned.
    pub fn schedule<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!(target: "slidegist.session", "Autosave not scheduled: {}", e);
                return false;
            }
        };

        let delay = self.delay;
        let spawner = handle.clone();
        let timer = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            spawner.spawn(task);
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
        true
    }

    /// Drop the pending task, if any. Returns true if one was waiting.
    pub fn cancel(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner()).take();
        match pending {
            Some(timer) if !timer.is_finished() => {
                timer.abort();
                true
            }
            _ => false,
        }
    }

    /// True while a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.get_mut().ok().and_then(Option::take) {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_schedule_without_runtime_is_skipped() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let runs = Arc::new(AtomicUsize::new(0));

        assert!(!debouncer.schedule(counting_task(&runs)));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.cancel());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_after_delay() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let runs = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(counting_task(&runs));
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(1999)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_schedules_coalesce() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            debouncer.schedule(counting_task(&runs));
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_task() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let runs = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(counting_task(&runs));
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_task_is_not_cancelled_by_new_schedule() {
        let debouncer = Debouncer::new(Duration::from_secs(1));
        let finished = Arc::new(AtomicUsize::new(0));

        let slow = {
            let finished = finished.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
        };
        debouncer.schedule(slow);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        settle().await;

        debouncer.schedule(counting_task(&finished));
        tokio::time::sleep(Duration::from_secs(20)).await;
        settle().await;
        assert_eq!(finished.load(Ordering::SeqCst), 2);
    }
}
