//! Aggregator behavior with in-memory mock adapters and a real temp-file
//! store: cache shortcut, forced refresh, fan-out failure tolerance, merge
//! ordering, and the image-presence filter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use lanefeed_common::{MediaKind, Post, PostCategory, PostSource};
use lanefeed_feed::{FeedAggregator, PlatformAdapter};
use lanefeed_store::FeedStore;

fn post(id: &str, source: PostSource, ts_secs: i64) -> Post {
    Post {
        id: id.to_string(),
        source,
        kind: MediaKind::Image,
        image_url: Some(format!("https://cdn.example.com/{id}.jpg")),
        permalink: format!("https://example.com/{id}"),
        caption: "Fun on the lanes".to_string(),
        timestamp: Utc.timestamp_opt(ts_secs, 0).unwrap(),
        category: PostCategory::FunTimes,
    }
}

/// Serves a fixed post list and counts how often it is called.
struct StaticAdapter {
    source: PostSource,
    posts: Vec<Post>,
    calls: AtomicUsize,
}

impl StaticAdapter {
    fn new(source: PostSource, posts: Vec<Post>) -> Arc<Self> {
        Arc::new(Self {
            source,
            posts,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformAdapter for StaticAdapter {
    async fn fetch_posts(&self, _limit: u32) -> Vec<Post> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.posts.clone()
    }

    fn source(&self) -> PostSource {
        self.source
    }
}

/// Models a platform whose fetch failed: per the adapter contract, failures
/// surface as an empty contribution.
struct FailingAdapter;

#[async_trait]
impl PlatformAdapter for FailingAdapter {
    async fn fetch_posts(&self, _limit: u32) -> Vec<Post> {
        Vec::new()
    }

    fn source(&self) -> PostSource {
        PostSource::Facebook
    }
}

/// Hangs far past the per-adapter timeout.
struct HangingAdapter;

#[async_trait]
impl PlatformAdapter for HangingAdapter {
    async fn fetch_posts(&self, _limit: u32) -> Vec<Post> {
        tokio::time::sleep(StdDuration::from_secs(3600)).await;
        vec![post("never", PostSource::Facebook, 999)]
    }

    fn source(&self) -> PostSource {
        PostSource::Facebook
    }
}

async fn aggregator_with(
    adapters: Vec<Arc<dyn PlatformAdapter>>,
    ttl: Duration,
) -> (tempfile::TempDir, FeedAggregator) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite:{}/feed.db", dir.path().display());
    let store = FeedStore::open(&url).await.expect("open store");
    (dir, FeedAggregator::new(adapters, store, ttl, 25))
}

#[tokio::test]
async fn fresh_cache_hit_issues_zero_adapter_calls() {
    let adapter = StaticAdapter::new(
        PostSource::Instagram,
        vec![post("a", PostSource::Instagram, 100)],
    );
    let (_dir, aggregator) =
        aggregator_with(vec![adapter.clone()], Duration::minutes(30)).await;

    let first = aggregator.fetch_all_posts(false).await;
    assert_eq!(adapter.call_count(), 1);

    let second = aggregator.fetch_all_posts(false).await;
    assert_eq!(adapter.call_count(), 1, "second read must be pure cache");

    let first_ids: Vec<_> = first.iter().map(|p| &p.id).collect();
    let second_ids: Vec<_> = second.iter().map(|p| &p.id).collect();
    assert_eq!(first_ids, second_ids, "cached sequence returned unchanged");
}

#[tokio::test]
async fn forced_refresh_bypasses_fresh_cache() {
    let adapter = StaticAdapter::new(
        PostSource::Instagram,
        vec![post("a", PostSource::Instagram, 100)],
    );
    let (_dir, aggregator) =
        aggregator_with(vec![adapter.clone()], Duration::minutes(30)).await;

    aggregator.fetch_all_posts(false).await;
    aggregator.fetch_all_posts(true).await;
    assert_eq!(adapter.call_count(), 2, "force_refresh always hits adapters");
}

#[tokio::test]
async fn expired_cache_triggers_refetch() {
    let adapter = StaticAdapter::new(
        PostSource::Instagram,
        vec![post("a", PostSource::Instagram, 100)],
    );
    let (_dir, aggregator) = aggregator_with(vec![adapter.clone()], Duration::zero()).await;

    aggregator.fetch_all_posts(false).await;
    tokio::time::sleep(StdDuration::from_millis(10)).await;
    aggregator.fetch_all_posts(false).await;
    assert_eq!(adapter.call_count(), 2, "zero TTL means every read refetches");
}

#[tokio::test]
async fn results_merged_and_sorted_newest_first() {
    let instagram = StaticAdapter::new(
        PostSource::Instagram,
        vec![
            post("t1", PostSource::Instagram, 100),
            post("t3", PostSource::Instagram, 300),
        ],
    );
    let facebook = StaticAdapter::new(
        PostSource::Facebook,
        vec![post("t2", PostSource::Facebook, 200)],
    );
    let (_dir, aggregator) =
        aggregator_with(vec![instagram, facebook], Duration::minutes(30)).await;

    let posts = aggregator.fetch_all_posts(true).await;
    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t2", "t1"]);
}

#[tokio::test]
async fn posts_without_image_are_dropped() {
    let mut no_image = post("no_image", PostSource::Facebook, 500);
    no_image.image_url = None;
    let adapter = StaticAdapter::new(
        PostSource::Facebook,
        vec![no_image, post("with_image", PostSource::Facebook, 400)],
    );
    let (_dir, aggregator) = aggregator_with(vec![adapter], Duration::minutes(30)).await;

    let posts = aggregator.fetch_all_posts(true).await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "with_image");
}

#[tokio::test]
async fn partial_adapter_failure_keeps_other_results() {
    let healthy = StaticAdapter::new(
        PostSource::Instagram,
        vec![
            post("a", PostSource::Instagram, 200),
            post("b", PostSource::Instagram, 100),
        ],
    );
    let (_dir, aggregator) = aggregator_with(
        vec![healthy, Arc::new(FailingAdapter)],
        Duration::minutes(30),
    )
    .await;

    let posts = aggregator.fetch_all_posts(true).await;
    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"], "aggregate equals the healthy adapter's posts");
}

#[tokio::test(start_paused = true)]
async fn hung_adapter_cannot_stall_the_aggregate() {
    let healthy = StaticAdapter::new(
        PostSource::Instagram,
        vec![post("a", PostSource::Instagram, 100)],
    );
    let (_dir, aggregator) = aggregator_with(
        vec![healthy, Arc::new(HangingAdapter)],
        Duration::minutes(30),
    )
    .await;

    let posts = aggregator.fetch_all_posts(true).await;
    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a"], "hung adapter's slot resolves empty at the deadline");
}

#[tokio::test]
async fn zero_adapters_is_a_valid_empty_feed() {
    let (_dir, aggregator) = aggregator_with(Vec::new(), Duration::minutes(30)).await;
    assert!(aggregator.fetch_all_posts(false).await.is_empty());
    assert!(aggregator.fetch_all_posts(true).await.is_empty());
    assert_eq!(aggregator.platform_count(), 0);
}

#[tokio::test]
async fn refresh_fully_replaces_previous_snapshot() {
    let first_batch = StaticAdapter::new(
        PostSource::Instagram,
        vec![
            post("old1", PostSource::Instagram, 100),
            post("old2", PostSource::Instagram, 200),
            post("old3", PostSource::Instagram, 300),
        ],
    );
    let (dir, aggregator) = aggregator_with(vec![first_batch], Duration::minutes(30)).await;
    aggregator.fetch_all_posts(true).await;

    // Same store, new adapter set returning a single post.
    let url = format!("sqlite:{}/feed.db", dir.path().display());
    let store = FeedStore::open(&url).await.expect("reopen store");
    let second_batch = StaticAdapter::new(
        PostSource::Instagram,
        vec![post("new1", PostSource::Instagram, 400)],
    );
    let aggregator = FeedAggregator::new(vec![second_batch], store, Duration::minutes(30), 25);

    let posts = aggregator.fetch_all_posts(true).await;
    assert_eq!(posts.len(), 1);

    let stats = aggregator.cache_stats().await;
    assert_eq!(stats.count, 1, "snapshot count is the new batch, never old + new");
}

#[tokio::test]
async fn clear_then_stats_reports_empty() {
    let adapter = StaticAdapter::new(
        PostSource::Instagram,
        vec![post("a", PostSource::Instagram, 100)],
    );
    let (_dir, aggregator) = aggregator_with(vec![adapter], Duration::minutes(30)).await;

    aggregator.fetch_all_posts(true).await;
    aggregator.clear_cache().await.expect("clear");

    let stats = aggregator.cache_stats().await;
    assert!(!stats.exists);
    assert!(stats.expired);
    assert_eq!(stats.count, 0);
}

#[tokio::test]
async fn stats_after_refresh_are_active() {
    let adapter = StaticAdapter::new(
        PostSource::Instagram,
        vec![
            post("a", PostSource::Instagram, 100),
            post("b", PostSource::Instagram, 200),
        ],
    );
    let (_dir, aggregator) = aggregator_with(vec![adapter], Duration::minutes(30)).await;

    aggregator.fetch_all_posts(true).await;
    let stats = aggregator.cache_stats().await;
    assert!(stats.exists);
    assert!(!stats.expired);
    assert_eq!(stats.count, 2);
    assert_eq!(stats.age_minutes, Some(0));
}
