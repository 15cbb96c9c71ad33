//! Image intelligence cache.
//!
//! Keyed by normalized image reference, single-flight per key, entries
//! expire one hour after insertion. Concurrent `get` calls for the same
//! key share one in-flight fetch rather than issuing duplicate requests,
//! mirroring the per-URI slot map the document manager's debouncer keeps
//! (one `Mutex<HashMap<K, Slot>>`, work done outside the lock).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};

const ENTRY_TTL: Duration = Duration::from_secs(60 * 60);
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ImageReport {
    pub image: String,
    #[serde(default)]
    pub diagnostics: Vec<serde_json::Value>,
    #[serde(default)]
    pub edits: Vec<serde_json::Value>,
    #[serde(default)]
    pub infos: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("network request for image report failed: {0}")]
    Network(String),
    #[error("image report request timed out")]
    Timeout,
}

/// The HTTP collaborator, injectable so tests can supply a fake instead
/// of making real network calls.
#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, image_reference: &str) -> Result<ImageReport, FetchError>;
}

/// Production fetcher backed by `reqwest`.
pub struct HttpImageFetcher {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, image_reference: &str) -> Result<ImageReport, FetchError> {
        let url = format!("{}/{image_reference}", self.endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Network(err.to_string())
                }
            })?;
        match response.json::<ImageReport>().await {
            Ok(report) => Ok(report),
            Err(_) => Ok(ImageReport {
                image: image_reference.to_string(),
                ..ImageReport::default()
            }),
        }
    }
}

/// `true` when the test-only network suppression flag
/// (`DOCKER_NETWORK_NONE=true`) is set. Checked fresh on every call
/// rather than cached, since tests flip it between cases.
pub fn network_disabled() -> bool {
    std::env::var("DOCKER_NETWORK_NONE").as_deref() == Ok("true")
}

struct Slot {
    inserted_at: Instant,
    result: Arc<OnceCell<Result<ImageReport, FetchError>>>,
}

pub struct ImageCache {
    fetcher: Arc<dyn ImageFetcher>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl ImageCache {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached or freshly-fetched report for `image_reference`.
    /// Network failures are not user-visible errors; the caller drops
    /// the diagnostic/hover that would have used this.
    ///
    /// When `DOCKER_NETWORK_NONE=true` the request is skipped outright,
    /// no cache entry, no network call, so the diagnostics pipeline
    /// stays deterministic in tests.
    pub async fn get(&self, image_reference: &str) -> Result<ImageReport, FetchError> {
        if network_disabled() {
            return Ok(ImageReport { image: image_reference.to_string(), ..ImageReport::default() });
        }

        let key = normalize_reference(image_reference);
        let once = {
            let mut slots = self.slots.lock().await;
            let needs_refresh = slots
                .get(&key)
                .is_none_or(|slot| slot.inserted_at.elapsed() >= ENTRY_TTL);
            if needs_refresh {
                slots.insert(
                    key.clone(),
                    Slot {
                        inserted_at: Instant::now(),
                        result: Arc::new(OnceCell::new()),
                    },
                );
            }
            Arc::clone(&slots.get(&key).expect("just inserted or already present").result)
        };

        once.get_or_init(|| async { self.fetcher.fetch(image_reference).await })
            .await
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}

fn normalize_reference(image_reference: &str) -> String {
    image_reference.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ImageFetcher for CountingFetcher {
        async fn fetch(&self, image_reference: &str) -> Result<ImageReport, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ImageReport {
                image: image_reference.to_string(),
                ..ImageReport::default()
            })
        }
    }

    #[tokio::test]
    async fn concurrent_gets_for_the_same_key_share_one_fetch() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(ImageCache::new(fetcher.clone()));

        let a = cache.clone();
        let b = cache.clone();
        let (ra, rb) = tokio::join!(a.get("alpine:3.19"), b.get("alpine:3.19"));
        assert_eq!(ra.unwrap().image, "alpine:3.19");
        assert_eq!(rb.unwrap().image, "alpine:3.19");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_each_get_their_own_fetch() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let cache = ImageCache::new(fetcher.clone());
        cache.get("alpine:3.19").await.unwrap();
        cache.get("debian:bookworm").await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl_and_refetches() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let cache = ImageCache::new(fetcher.clone());
        cache.get("alpine:3.19").await.unwrap();
        tokio::time::advance(ENTRY_TTL + Duration::from_secs(1)).await;
        cache.get("alpine:3.19").await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn network_disabled_skips_the_network_call_entirely() {
        std::env::set_var("DOCKER_NETWORK_NONE", "true");
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let cache = ImageCache::new(fetcher.clone());
        let report = cache.get("alpine:3.19").await.unwrap();
        cache.get("alpine:3.19").await.unwrap();
        assert_eq!(report.image, "alpine:3.19");
        assert_eq!(cache.len().await, 0);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        std::env::remove_var("DOCKER_NETWORK_NONE");
    }
}
