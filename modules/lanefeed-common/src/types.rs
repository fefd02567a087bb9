use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Enums ---

/// Origin platform of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSource {
    Instagram,
    Facebook,
}

impl std::fmt::Display for PostSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostSource::Instagram => write!(f, "instagram"),
            PostSource::Facebook => write!(f, "facebook"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// Display category derived from the caption. See `category::classify_caption`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostCategory {
    Parties,
    Leagues,
    Events,
    FunTimes,
}

impl std::fmt::Display for PostCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostCategory::Parties => write!(f, "Parties"),
            PostCategory::Leagues => write!(f, "Leagues"),
            PostCategory::Events => write!(f, "Events"),
            PostCategory::FunTimes => write!(f, "FunTimes"),
        }
    }
}

// --- Unified post model ---

/// A normalized post from any social platform. Platform adapters convert
/// their native record types into this. (`id`, `source`) is the composite
/// identity; `id` alone is only unique within its platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub source: PostSource,
    pub kind: MediaKind,
    /// Display image. Video posts resolve to a thumbnail; carousel posts to
    /// their first image attachment. Posts that resolve to `None` are dropped
    /// by the aggregator.
    pub image_url: Option<String>,
    pub permalink: String,
    pub caption: String,
    pub timestamp: DateTime<Utc>,
    pub category: PostCategory,
}

// --- Cache snapshot ---

/// One complete cached result set. Posts are sorted newest-first and the
/// ordering is stable for the lifetime of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub posts: Vec<Post>,
    pub fetched_at: DateTime<Utc>,
    pub count: usize,
}

/// Snapshot metadata for stats queries. Cheap to load: the post list itself
/// is never materialized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub count: usize,
    pub fetched_at: DateTime<Utc>,
}
