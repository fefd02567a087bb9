use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lanefeed_common::{Post, PostSource};

/// A platform adapter translates one external platform's API into the unified
/// post shape. Implementations are stateless beyond held credentials and
/// never error to the caller: internal failures resolve to an empty result,
/// logged at warn level.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    async fn fetch_posts(&self, limit: u32) -> Vec<Post>;
    fn source(&self) -> PostSource;
}

/// Parse a Graph API timestamp. The API emits ISO 8601 with a numeric offset
/// and no colon (`2024-03-05T18:30:00+0000`), which strict RFC 3339 parsing
/// rejects, so try both.
pub fn parse_graph_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
