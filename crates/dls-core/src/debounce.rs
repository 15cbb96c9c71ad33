//! Per-URI debounce scheduling.
//!
//! One timer slot per URI; replacing the queued closure while the timer
//! is pending discards the older one. `remove` installs a no-op so any
//! in-flight timer becomes a guaranteed-safe nothing, matching the
//! invariant that closed-document work must never run.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lsp_types::Url;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send>>;

struct Slot {
    generation: Arc<AtomicU64>,
}

/// Schedules boxed futures to run after a per-URI quiet period, replacing
/// any not-yet-fired work scheduled for the same URI.
pub struct Debouncer {
    slots: Mutex<FxHashMap<Url, Slot>>,
    default_delay: Duration,
}

impl Debouncer {
    pub fn new(default_delay: Duration) -> Self {
        Self {
            slots: Mutex::new(FxHashMap::default()),
            default_delay,
        }
    }

    /// Schedules `make_task` to run after the quiet period. `make_task`
    /// is only invoked once the delay has elapsed without being
    /// superseded, so the caller can safely read document state at that
    /// point rather than snapshotting eagerly.
    pub fn queue<F>(&self, uri: Url, make_task: F)
    where
        F: FnOnce() -> BoxedTask + Send + 'static,
    {
        self.queue_after(uri, self.default_delay, make_task);
    }

    pub fn queue_after<F>(&self, uri: Url, delay: Duration, make_task: F)
    where
        F: FnOnce() -> BoxedTask + Send + 'static,
    {
        let generation = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(uri).or_insert_with(|| Slot {
                generation: Arc::new(AtomicU64::new(0)),
            });
            let gen = Arc::clone(&slot.generation);
            gen.fetch_add(1, Ordering::SeqCst);
            gen
        };
        let my_generation = generation.load(Ordering::SeqCst);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) != my_generation {
                return; // superseded by a later `queue` call.
            }
            make_task().await;
        });
    }

    /// Drops the slot, so any in-flight timer observes a generation
    /// mismatch and becomes a no-op.
    pub fn remove(&self, uri: &Url) {
        self.slots.lock().remove(uri);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn replacing_queued_work_discards_the_older_closure() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let uri = Url::parse("file:///workspace/a.hcl").unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&ran);
        debouncer.queue(uri.clone(), move || {
            Box::pin(async move {
                first.fetch_add(1, Ordering::SeqCst);
            })
        });

        let second = Arc::clone(&ran);
        let (tx, mut rx) = mpsc::channel(1);
        debouncer.queue(uri, move || {
            Box::pin(async move {
                second.fetch_add(10, Ordering::SeqCst);
                let _ = tx.send(()).await;
            })
        });

        tokio::time::advance(Duration::from_millis(60)).await;
        rx.recv().await;
        assert_eq!(ran.load(Ordering::SeqCst), 10, "only the newer closure should run");
    }

    #[tokio::test(start_paused = true)]
    async fn remove_prevents_pending_work_from_running() {
        let debouncer = Debouncer::new(Duration::from_millis(50));
        let uri = Url::parse("file:///workspace/b.hcl").unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        let flag = Arc::clone(&ran);
        debouncer.queue(uri.clone(), move || {
            Box::pin(async move {
                flag.fetch_add(1, Ordering::SeqCst);
            })
        });
        debouncer.remove(&uri);

        tokio::time::advance(Duration::from_millis(60)).await;
        tokio::task::yield_now().await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
