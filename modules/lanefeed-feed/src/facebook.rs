//! Facebook platform adapter (Graph API page posts).
//!
//! The page-posts listing cannot filter by tag server-side, so candidates are
//! filtered client-side to captions mentioning the configured tag.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use lanefeed_common::{classify_caption, MediaKind, Post, PostSource};

use crate::adapter::{parse_graph_timestamp, PlatformAdapter};
use crate::error::{PlatformError, Result};

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

const POST_FIELDS: &str = "id,message,full_picture,permalink_url,created_time,\
attachments{media_type,media{image{src}},subattachments{media_type,media{image{src}}}}";

// --- Raw Graph API shapes ---

#[derive(Debug, Clone, Deserialize)]
pub struct PostsListing {
    pub data: Vec<FacebookPost>,
}

/// A single post from the page-posts endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FacebookPost {
    pub id: String,
    pub message: Option<String>,
    pub full_picture: Option<String>,
    pub permalink_url: Option<String>,
    pub created_time: Option<String>,
    pub attachments: Option<AttachmentListing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentListing {
    pub data: Vec<Attachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub media_type: Option<String>,
    pub media: Option<AttachmentMedia>,
    pub subattachments: Option<Box<AttachmentListing>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentMedia {
    pub image: Option<AttachmentImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentImage {
    pub src: Option<String>,
}

/// Does a caption mention the configured tag? Case-insensitive; matches both
/// `#tag` and a bare `tag` occurrence.
pub fn matches_tag(caption: &str, tag: &str) -> bool {
    let lower = caption.to_lowercase();
    let tag = tag.trim_start_matches('#').to_lowercase();
    !tag.is_empty() && lower.contains(&tag)
}

/// Map a raw Facebook post to the unified post shape. The display image comes
/// from `full_picture` (which is also the video thumbnail), falling back to
/// the first image attachment. Records without a permalink or a parseable
/// timestamp are dropped.
pub fn map_facebook_post(post: FacebookPost) -> Option<Post> {
    let permalink = post.permalink_url?;
    let raw_ts = post.created_time?;
    let Some(timestamp) = parse_graph_timestamp(&raw_ts) else {
        warn!(post_id = %post.id, raw = %raw_ts, "Unparseable Facebook timestamp, dropping record");
        return None;
    };

    let caption = post.message.unwrap_or_default();
    let kind = if is_video(post.attachments.as_ref()) {
        MediaKind::Video
    } else {
        MediaKind::Image
    };
    let image_url = post
        .full_picture
        .or_else(|| first_attachment_image(post.attachments.as_ref()));

    Some(Post {
        id: post.id,
        source: PostSource::Facebook,
        kind,
        image_url,
        permalink,
        category: classify_caption(&caption),
        caption,
        timestamp,
    })
}

fn is_video(attachments: Option<&AttachmentListing>) -> bool {
    attachments
        .map(|a| {
            a.data
                .iter()
                .any(|att| matches!(att.media_type.as_deref(), Some("video") | Some("video_inline")))
        })
        .unwrap_or(false)
}

fn first_attachment_image(attachments: Option<&AttachmentListing>) -> Option<String> {
    let listing = attachments?;
    for att in &listing.data {
        if let Some(src) = attachment_image(att) {
            return Some(src);
        }
        if let Some(subs) = &att.subattachments {
            if let Some(src) = subs.data.iter().find_map(attachment_image) {
                return Some(src);
            }
        }
    }
    None
}

fn attachment_image(att: &Attachment) -> Option<String> {
    att.media.as_ref()?.image.as_ref()?.src.clone()
}

// --- Adapter ---

pub struct FacebookAdapter {
    client: reqwest::Client,
    access_token: String,
    page_id: String,
    tag: String,
}

impl FacebookAdapter {
    pub fn new(client: reqwest::Client, access_token: &str, page_id: &str, tag: &str) -> Self {
        Self {
            client,
            access_token: access_token.to_string(),
            page_id: page_id.to_string(),
            tag: tag.to_string(),
        }
    }

    async fn fetch_inner(&self, limit: u32) -> Result<Vec<Post>> {
        let url = format!("{GRAPH_API_BASE}/{}/posts", self.page_id);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("fields", POST_FIELDS.to_string()),
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

        let listing: PostsListing = resp.json().await?;
        Ok(listing
            .data
            .into_iter()
            .filter(|p| matches_tag(p.message.as_deref().unwrap_or(""), &self.tag))
            .filter_map(map_facebook_post)
            .collect())
    }
}

#[async_trait]
impl PlatformAdapter for FacebookAdapter {
    async fn fetch_posts(&self, limit: u32) -> Vec<Post> {
        match self.fetch_inner(limit).await {
            Ok(posts) => {
                info!(source = "facebook", count = posts.len(), "Fetched posts");
                posts
            }
            Err(e) => {
                warn!(source = "facebook", error = %e, "Platform fetch failed, contributing empty result");
                Vec::new()
            }
        }
    }

    fn source(&self) -> PostSource {
        PostSource::Facebook
    }
}
