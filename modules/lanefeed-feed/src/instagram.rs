//! Instagram platform adapter (Graph API hashtag search).
//!
//! Instagram cannot list tagged media directly: the configured hashtag is
//! first resolved to an internal hashtag id, then that id's recent media is
//! listed. The listing is already tag-scoped, so no client-side filtering is
//! needed here.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use lanefeed_common::{classify_caption, MediaKind, Post, PostSource};

use crate::adapter::{parse_graph_timestamp, PlatformAdapter};
use crate::error::{PlatformError, Result};

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

const MEDIA_FIELDS: &str =
    "id,caption,media_type,media_url,thumbnail_url,permalink,timestamp,children{media_type,media_url}";

// --- Raw Graph API shapes ---

#[derive(Debug, Clone, Deserialize)]
pub struct HashtagSearchResponse {
    pub data: Vec<HashtagId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HashtagId {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaListing {
    pub data: Vec<InstagramMedia>,
}

/// A single media record from the hashtag recent-media endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct InstagramMedia {
    pub id: String,
    pub caption: Option<String>,
    pub media_type: Option<String>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub permalink: Option<String>,
    pub timestamp: Option<String>,
    pub children: Option<MediaChildren>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaChildren {
    pub data: Vec<MediaChild>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaChild {
    pub media_type: Option<String>,
    pub media_url: Option<String>,
}

/// Map a raw Instagram media record to the unified post shape.
/// Records without a permalink or a parseable timestamp are dropped.
pub fn map_instagram_media(media: InstagramMedia) -> Option<Post> {
    let permalink = media.permalink?;
    let raw_ts = media.timestamp?;
    let Some(timestamp) = parse_graph_timestamp(&raw_ts) else {
        warn!(media_id = %media.id, raw = %raw_ts, "Unparseable Instagram timestamp, dropping record");
        return None;
    };

    let caption = media.caption.unwrap_or_default();
    let (kind, image_url) = match media.media_type.as_deref() {
        // For videos `media_url` is the video file itself, not displayable as
        // an image. Only the thumbnail qualifies; without one the post has no
        // resolvable image and the aggregator drops it.
        Some("VIDEO") => (MediaKind::Video, media.thumbnail_url),
        Some("CAROUSEL_ALBUM") => (
            MediaKind::Image,
            media
                .media_url
                .or_else(|| first_image_child(media.children.as_ref())),
        ),
        _ => (MediaKind::Image, media.media_url),
    };

    Some(Post {
        id: media.id,
        source: PostSource::Instagram,
        kind,
        image_url,
        permalink,
        category: classify_caption(&caption),
        caption,
        timestamp,
    })
}

fn first_image_child(children: Option<&MediaChildren>) -> Option<String> {
    children?
        .data
        .iter()
        .find(|c| c.media_type.as_deref() != Some("VIDEO"))
        .and_then(|c| c.media_url.clone())
}

// --- Adapter ---

pub struct InstagramAdapter {
    client: reqwest::Client,
    access_token: String,
    user_id: String,
    tag: String,
}

impl InstagramAdapter {
    pub fn new(client: reqwest::Client, access_token: &str, user_id: &str, tag: &str) -> Self {
        Self {
            client,
            access_token: access_token.to_string(),
            user_id: user_id.to_string(),
            tag: tag.trim_start_matches('#').to_string(),
        }
    }

    /// Resolve the configured hashtag to its internal Graph API id.
    async fn resolve_hashtag_id(&self) -> Result<String> {
        let url = format!("{GRAPH_API_BASE}/ig_hashtag_search");
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("user_id", self.user_id.clone()),
                ("q", self.tag.clone()),
                ("access_token", self.access_token.clone()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let search: HashtagSearchResponse = resp.json().await?;
        search
            .data
            .into_iter()
            .next()
            .map(|h| h.id)
            .ok_or_else(|| PlatformError::Parse(format!("no hashtag match for '{}'", self.tag)))
    }

    async fn fetch_inner(&self, limit: u32) -> Result<Vec<Post>> {
        let hashtag_id = self.resolve_hashtag_id().await?;
        debug!(tag = %self.tag, hashtag_id = %hashtag_id, "Resolved Instagram hashtag");

        let url = format!("{GRAPH_API_BASE}/{hashtag_id}/recent_media");
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("user_id", self.user_id.clone()),
                ("fields", MEDIA_FIELDS.to_string()),
                ("limit", limit.to_string()),
                ("access_token", self.access_token.clone()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let listing: MediaListing = resp.json().await?;
        Ok(listing
            .data
            .into_iter()
            .filter_map(map_instagram_media)
            .collect())
    }
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    async fn fetch_posts(&self, limit: u32) -> Vec<Post> {
        match self.fetch_inner(limit).await {
            Ok(posts) => {
                info!(source = "instagram", count = posts.len(), "Fetched posts");
                posts
            }
            Err(e) => {
                warn!(source = "instagram", error = %e, "Platform fetch failed, contributing empty result");
                Vec::new()
            }
        }
    }

    fn source(&self) -> PostSource {
        PostSource::Instagram
    }
}
