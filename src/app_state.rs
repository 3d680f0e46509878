// AppState - shared handles cloned into every request
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{BlogStore, MediaStorage, PageCache, SqliteStore};
use crate::services::{FeedService, PostService};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub feed: FeedService,
    pub posts: PostService,
    pub page_cache: Arc<PageCache>,
    pub media: MediaStorage,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        // Initialize database
        let store = SqliteStore::connect(&config.database.url, config.database.max_connections)
            .await?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Wire services around an existing store, e.g. an in-memory one in tests.
    pub fn with_store(config: Config, store: Arc<dyn BlogStore>) -> Self {
        let media = MediaStorage::new(config.media.root.clone());
        let page_cache = Arc::new(PageCache::new(
            config.cache.capacity,
            config.index_cache_ttl(),
        ));

        Self {
            feed: FeedService::new(store.clone(), config.site.page_size),
            posts: PostService::new(store.clone(), media.clone()),
            store,
            page_cache,
            media,
            config: Arc::new(config),
        }
    }
}
