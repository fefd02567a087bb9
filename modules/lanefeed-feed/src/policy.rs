//! Cache freshness policy. Pure logic over snapshot metadata and the current
//! time: no I/O, no clocks of its own, so the TTL boundary is testable to the
//! millisecond.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use lanefeed_common::SnapshotMeta;

/// Display classification of the cache. Mutually exclusive and total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Empty,
    Active,
    Expired,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStatus::Empty => write!(f, "empty"),
            CacheStatus::Active => write!(f, "active"),
            CacheStatus::Expired => write!(f, "expired"),
        }
    }
}

/// Stats surface for the admin panel. `expired` is reported as `true` when no
/// snapshot exists at all: an empty cache is never fresh.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub exists: bool,
    pub expired: bool,
    pub status: CacheStatus,
    pub count: usize,
    pub age_minutes: Option<i64>,
    pub cached_at: Option<DateTime<Utc>>,
}

/// Is a snapshot written at `fetched_at` still eligible to shortcut the fetch
/// path? Fresh means present and aged at most `ttl`.
pub fn is_fresh(fetched_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(fetched_at) <= ttl
}

/// Evaluate cache stats for a snapshot (or its absence) at a given time.
pub fn evaluate(meta: Option<SnapshotMeta>, now: DateTime<Utc>, ttl: Duration) -> CacheStats {
    match meta {
        None => CacheStats {
            exists: false,
            expired: true,
            status: CacheStatus::Empty,
            count: 0,
            age_minutes: None,
            cached_at: None,
        },
        Some(meta) => {
            let age = now.signed_duration_since(meta.fetched_at);
            let expired = age > ttl;
            CacheStats {
                exists: true,
                expired,
                status: if expired {
                    CacheStatus::Expired
                } else {
                    CacheStatus::Active
                },
                count: meta.count,
                age_minutes: Some(age.num_minutes()),
                cached_at: Some(meta.fetched_at),
            }
        }
    }
}
