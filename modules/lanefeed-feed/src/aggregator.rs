//! Feed aggregator: fans out to all configured platform adapters, merges and
//! sorts their results, and fronts the whole thing with the persistent
//! snapshot cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use lanefeed_common::{Config, Post};
use lanefeed_store::{FeedStore, StoreError};

use crate::adapter::PlatformAdapter;
use crate::facebook::FacebookAdapter;
use crate::instagram::InstagramAdapter;
use crate::policy::{self, CacheStats};

/// Hard ceiling per adapter call. One hung platform must not stall the
/// aggregate: its slot resolves to an empty result at the deadline.
const ADAPTER_TIMEOUT: Duration = Duration::from_secs(20);

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

pub struct FeedAggregator {
    adapters: Vec<Arc<dyn PlatformAdapter>>,
    store: FeedStore,
    ttl: chrono::Duration,
    fetch_limit: u32,
}

impl FeedAggregator {
    pub fn new(
        adapters: Vec<Arc<dyn PlatformAdapter>>,
        store: FeedStore,
        ttl: chrono::Duration,
        fetch_limit: u32,
    ) -> Self {
        Self {
            adapters,
            store,
            ttl,
            fetch_limit,
        }
    }

    /// Build an aggregator from configuration. A platform is enabled only
    /// when its credentials and the feed tag are all present; anything less
    /// silently disables that platform. `FEED_ENABLED=false` disables the
    /// whole feed with zero adapters instantiated.
    pub fn from_config(config: &Config, store: FeedStore) -> Self {
        let mut adapters: Vec<Arc<dyn PlatformAdapter>> = Vec::new();

        if !config.feed_enabled {
            info!("Feed is disabled, serving empty feed");
            return Self::new(adapters, store, config.cache_ttl(), config.fetch_limit);
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        match (
            &config.instagram_access_token,
            &config.instagram_user_id,
            &config.feed_tag,
        ) {
            (Some(token), Some(user_id), Some(tag)) => {
                info!(tag = %tag, "Instagram adapter enabled");
                adapters.push(Arc::new(InstagramAdapter::new(
                    client.clone(),
                    token,
                    user_id,
                    tag,
                )));
            }
            _ => debug!("Instagram credentials incomplete, platform disabled"),
        }

        match (
            &config.facebook_access_token,
            &config.facebook_page_id,
            &config.feed_tag,
        ) {
            (Some(token), Some(page_id), Some(tag)) => {
                info!(tag = %tag, "Facebook adapter enabled");
                adapters.push(Arc::new(FacebookAdapter::new(
                    client.clone(),
                    token,
                    page_id,
                    tag,
                )));
            }
            _ => debug!("Facebook credentials incomplete, platform disabled"),
        }

        Self::new(adapters, store, config.cache_ttl(), config.fetch_limit)
    }

    pub fn platform_count(&self) -> usize {
        self.adapters.len()
    }

    /// Aggregated feed, newest first. The dominant fast path is a fresh cache
    /// hit, which issues zero platform I/O. On a miss or forced refresh, all
    /// adapters are queried concurrently and the merged result replaces the
    /// stored snapshot in full before being returned.
    ///
    /// Never errors for a well-formed configuration: failing adapters
    /// contribute empty results, and a store write failure is logged without
    /// discarding the in-memory result. Two concurrent refreshes both fan out
    /// and both write; the store's full-replace semantics make that
    /// last-write-wins rather than a correctness problem.
    pub async fn fetch_all_posts(&self, force_refresh: bool) -> Vec<Post> {
        if !force_refresh {
            if let Some(snapshot) = self.store.read().await {
                if policy::is_fresh(snapshot.fetched_at, Utc::now(), self.ttl) {
                    debug!(count = snapshot.count, "Serving feed from cache");
                    return snapshot.posts;
                }
                debug!(count = snapshot.count, "Cached feed expired, refreshing");
            }
        }

        if self.adapters.is_empty() {
            debug!("No platforms configured, serving empty feed");
            return Vec::new();
        }

        let limit = self.fetch_limit;
        let fetches = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            async move {
                match tokio::time::timeout(ADAPTER_TIMEOUT, adapter.fetch_posts(limit)).await {
                    Ok(posts) => posts,
                    Err(_) => {
                        warn!(source = %adapter.source(), "Adapter timed out, contributing empty result");
                        Vec::new()
                    }
                }
            }
        });

        let results = join_all(fetches).await;

        let mut posts: Vec<Post> = results
            .into_iter()
            .flatten()
            .filter(|post| {
                if post.image_url.is_none() {
                    debug!(source = %post.source, id = %post.id, "Dropping post with no resolvable image");
                    false
                } else {
                    true
                }
            })
            .collect();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        if let Err(e) = self.store.write(&posts).await {
            warn!(error = %e, "Failed to persist feed snapshot, serving in-memory result");
        }

        info!(count = posts.len(), "Feed refreshed");
        posts
    }

    /// Empty the persistent cache. Does not trigger a refetch.
    pub async fn clear_cache(&self) -> Result<(), StoreError> {
        self.store.clear().await?;
        info!("Feed cache cleared");
        Ok(())
    }

    /// Current cache statistics. Read-only.
    pub async fn cache_stats(&self) -> CacheStats {
        policy::evaluate(self.store.stats().await, Utc::now(), self.ttl)
    }
}
