// Page cache - rendered pages kept for a fixed time, bounded by LRU

use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AppResult;

#[derive(Debug, Clone)]
struct CachedPage {
    body: Arc<str>,
    inserted_at: Instant,
}

impl CachedPage {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

pub struct PageCache {
    inner: Mutex<LruCache<String, CachedPage>>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Return the page stored under `key` while it is fresh; otherwise run
    /// `render`, store its output and return it. Failed renders are not cached.
    pub async fn cached_render<F, Fut>(&self, key: &str, render: F) -> AppResult<Arc<str>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<String>>,
    {
        if let Some(body) = self.get(key).await {
            debug!(key, "page cache hit");
            return Ok(body);
        }

        debug!(key, "page cache miss");
        let body: Arc<str> = render().await?.into();
        self.inner.lock().await.put(
            key.to_string(),
            CachedPage {
                body: body.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(body)
    }

    pub async fn get(&self, key: &str) -> Option<Arc<str>> {
        let mut inner = self.inner.lock().await;
        match inner.get(key) {
            Some(page) if !page.is_expired(self.ttl) => Some(page.body.clone()),
            Some(_) => {
                inner.pop(key);
                None
            }
            None => None,
        }
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.lock().await.pop(key);
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_cached_render_reuses_fresh_page() {
        let cache = PageCache::new(10, Duration::from_secs(20));
        let renders = AtomicUsize::new(0);

        for _ in 0..3 {
            let body = cache
                .cached_render("/", || async {
                    renders.fetch_add(1, Ordering::SeqCst);
                    Ok("page".to_string())
                })
                .await
                .unwrap();
            assert_eq!(&*body, "page");
        }
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_page_is_rendered_again() {
        let cache = PageCache::new(10, Duration::from_millis(20));
        cache
            .cached_render("/", || async { Ok("old".to_string()) })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let body = cache
            .cached_render("/", || async { Ok("new".to_string()) })
            .await
            .unwrap();
        assert_eq!(&*body, "new");
    }

    #[tokio::test]
    async fn test_keys_include_query_string() {
        let cache = PageCache::new(10, Duration::from_secs(20));
        cache.cached_render("/?page=1", || async { Ok("one".to_string()) }).await.unwrap();
        let body = cache
            .cached_render("/?page=2", || async { Ok("two".to_string()) })
            .await
            .unwrap();
        assert_eq!(&*body, "two");
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_failed_render_is_not_cached() {
        let cache = PageCache::new(10, Duration::from_secs(20));
        let result = cache
            .cached_render("/", || async {
                Err(crate::error::AppError::Internal("boom".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.get("/").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_and_capacity() {
        let cache = PageCache::new(2, Duration::from_secs(20));
        for key in ["a", "b", "c"] {
            cache.cached_render(key, || async { Ok(key.to_string()) }).await.unwrap();
        }
        assert_eq!(cache.len().await, 2);
        assert!(cache.get("a").await.is_none());

        cache.invalidate("b").await;
        assert!(cache.get("b").await.is_none());
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
