use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::account::Platform;
use crate::id::{AccountId, BrandId, PostId, PostItemId, UserId};

/// Post lifecycle states.
///
/// ```text
/// Draft ──submit──▶ PendingApproval ──approve──▶ Approved ──schedule──▶ Scheduled
///   │                     │                          │                     │
///   │                  reject                      publish              due / publish
///   │                     ▼                          ▼                     ▼
///   │                 Rejected ──edit──▶ Draft    Publishing ◀─────────────┘
///   └──schedule (no approval needed)──▶ Scheduled     │
///                                          Published / PartiallyPublished / Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    Scheduled,
    Publishing,
    Published,
    PartiallyPublished,
    Failed,
}

impl PostStatus {
    /// Whether moving from `self` to `next` is a legal lifecycle transition.
    pub fn can_transition_to(&self, next: PostStatus) -> bool {
        use PostStatus::*;
        matches!(
            (self, next),
            (Draft, PendingApproval | Scheduled | Publishing)
                | (PendingApproval, Approved | Rejected | Draft)
                | (Rejected, Draft)
                | (Approved, Scheduled | Publishing | Draft)
                | (Scheduled, Publishing | Draft | Scheduled)
                | (Publishing, Published | PartiallyPublished | Failed)
                | (Failed, Scheduled | Publishing | Draft)
                | (PartiallyPublished, Publishing)
        )
    }

    /// Content that has (at least partly) gone live, or is going live, is
    /// frozen: no edits and no deletion.
    pub fn is_locked(&self) -> bool {
        matches!(
            self,
            PostStatus::Publishing | PostStatus::Published | PostStatus::PartiallyPublished
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::PendingApproval => "pending_approval",
            PostStatus::Approved => "approved",
            PostStatus::Rejected => "rejected",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Publishing => "publishing",
            PostStatus::Published => "published",
            PostStatus::PartiallyPublished => "partially_published",
            PostStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "pending_approval" => Ok(PostStatus::PendingApproval),
            "approved" => Ok(PostStatus::Approved),
            "rejected" => Ok(PostStatus::Rejected),
            "scheduled" => Ok(PostStatus::Scheduled),
            "publishing" => Ok(PostStatus::Publishing),
            "published" => Ok(PostStatus::Published),
            "partially_published" => Ok(PostStatus::PartiallyPublished),
            "failed" => Ok(PostStatus::Failed),
            other => Err(format!("invalid post status: '{other}'")),
        }
    }
}

/// Per-platform publish state of a single PostItem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Publishing,
    Published,
    Failed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::Publishing => write!(f, "publishing"),
            ItemStatus::Published => write!(f, "published"),
            ItemStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ItemStatus::Pending),
            "publishing" => Ok(ItemStatus::Publishing),
            "published" => Ok(ItemStatus::Published),
            "failed" => Ok(ItemStatus::Failed),
            other => Err(format!("invalid item status: '{other}'")),
        }
    }
}

/// Shape of the media attached to a post item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Text,
    Image,
    Carousel,
    Video,
    Reel,
}

impl MediaType {
    /// Infer a media type from the attached URLs.
    pub fn infer(media_urls: &[String]) -> MediaType {
        match media_urls {
            [] => MediaType::Text,
            [single] if looks_like_video(single) => MediaType::Reel,
            [_] => MediaType::Image,
            _ => MediaType::Carousel,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaType::Video | MediaType::Reel)
    }
}

fn looks_like_video(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    [".mp4", ".mov", ".m4v", ".webm"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Text => write!(f, "text"),
            MediaType::Image => write!(f, "image"),
            MediaType::Carousel => write!(f, "carousel"),
            MediaType::Video => write!(f, "video"),
            MediaType::Reel => write!(f, "reel"),
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(MediaType::Text),
            "image" => Ok(MediaType::Image),
            "carousel" => Ok(MediaType::Carousel),
            "video" => Ok(MediaType::Video),
            "reel" => Ok(MediaType::Reel),
            other => Err(format!("invalid media type: '{other}'")),
        }
    }
}

/// A post composed once and published to one or more social accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub brand_id: BrandId,
    pub title: Option<String>,
    /// Base caption; each item may carry its own variant.
    pub content: String,
    pub media_urls: Vec<String>,
    pub hashtags: Vec<String>,
    pub status: PostStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub review_note: Option<String>,
    pub reviewed_by: Option<UserId>,
    pub items: Vec<PostItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-platform variant of a Post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostItem {
    pub id: PostItemId,
    pub post_id: PostId,
    pub social_account_id: AccountId,
    pub platform: Platform,
    pub content: String,
    pub media_urls: Vec<String>,
    pub hashtags: Vec<String>,
    pub media_type: MediaType,
    pub status: ItemStatus,
    /// Platform media/post id once published.
    pub external_id: Option<String>,
    pub permalink: Option<String>,
    pub error: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl PostItem {
    /// Final caption sent to the platform: content, a blank line, then the
    /// hashtags. Tags already present in the content are not repeated.
    pub fn caption(&self) -> String {
        let in_content: Vec<String> = extract_hashtags(&self.content)
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        let mut seen: Vec<String> = Vec::new();
        for tag in &self.hashtags {
            let Some(tag) = normalize_hashtag(tag) else {
                continue;
            };
            let key = tag.to_lowercase();
            if seen.iter().any(|t| t.to_lowercase() == key) || in_content.contains(&key) {
                continue;
            }
            seen.push(tag);
        }

        if seen.is_empty() {
            self.content.trim().to_string()
        } else if self.content.trim().is_empty() {
            seen.join(" ")
        } else {
            format!("{}\n\n{}", self.content.trim(), seen.join(" "))
        }
    }
}

/// Request to create a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Accounts to publish to; one PostItem is created per account.
    pub account_ids: Vec<AccountId>,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Overrides media type inference.
    pub media_type: Option<MediaType>,
}

/// Partial update of a post. Item variants are rebuilt from the new base
/// content when `content`, `media_urls`, or `hashtags` change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub media_urls: Option<Vec<String>>,
    pub hashtags: Option<Vec<String>>,
}

/// Per-item caption override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub content: Option<String>,
    pub hashtags: Option<Vec<String>>,
}

/// Approve/reject decision from a reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub approve: bool,
    pub note: Option<String>,
}

/// Normalize a hashtag to `#word` form.
///
/// Leading `#` characters and surrounding whitespace are stripped, inner
/// characters that are not alphanumeric or `_` are removed. Returns `None`
/// when nothing usable remains.
///
/// ```
/// use socialdesk_types::post::normalize_hashtag;
///
/// assert_eq!(normalize_hashtag("##coffee "), Some("#coffee".to_string()));
/// assert_eq!(normalize_hashtag("latte art"), Some("#latteart".to_string()));
/// assert_eq!(normalize_hashtag("#"), None);
/// ```
pub fn normalize_hashtag(raw: &str) -> Option<String> {
    let body: String = raw
        .trim()
        .trim_start_matches('#')
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if body.is_empty() {
        None
    } else {
        Some(format!("#{body}"))
    }
}

/// Normalize and de-duplicate a hashtag list (case-insensitive, first wins).
pub fn normalize_hashtags(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw.iter().filter_map(|t| normalize_hashtag(t)) {
        if !out.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            out.push(tag);
        }
    }
    out
}

/// Extract `#hashtags` appearing in free text, normalized and de-duplicated.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let candidates: Vec<String> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| w.starts_with('#'))
        .map(|w| w.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_').to_string())
        .collect();
    normalize_hashtags(&candidates)
}
