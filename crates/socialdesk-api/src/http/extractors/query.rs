//! Query parameter extractors for list endpoints.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use socialdesk_core::repository::SortOrder;
use socialdesk_core::repository::conversation::ConversationFilter;
use socialdesk_core::repository::media::MediaFilter;
use socialdesk_core::repository::post::PostFilter;

use crate::http::error::AppError;

/// Largest page a list endpoint returns.
pub const MAX_LIMIT: i64 = 200;

fn parse_opt<T: FromStr<Err = String>>(value: Option<&str>) -> Result<Option<T>, AppError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(AppError::Validation))
        .transpose()
}

fn clamp_limit(limit: Option<i64>) -> Option<i64> {
    limit.map(|l| l.clamp(1, MAX_LIMIT))
}

#[derive(Debug, Deserialize, Default)]
pub struct PostListQuery {
    /// draft, pending_approval, approved, rejected, scheduled, ...
    pub status: Option<String>,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_order")]
    pub order: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn default_sort() -> String {
    "created_at".to_string()
}

fn default_order() -> String {
    "desc".to_string()
}

impl PostListQuery {
    pub fn into_filter(self) -> Result<PostFilter, AppError> {
        let sort_order = match self.order.to_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        Ok(PostFilter {
            status: parse_opt(self.status.as_deref())?,
            sort_by: Some(self.sort),
            sort_order: Some(sort_order),
            limit: clamp_limit(self.limit),
            offset: self.offset,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct InboxListQuery {
    pub status: Option<String>,
    /// direct_message, comment, mention
    pub kind: Option<String>,
    pub account_id: Option<String>,
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl InboxListQuery {
    pub fn into_filter(self) -> Result<ConversationFilter, AppError> {
        let account_id = self
            .account_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| v.parse().map_err(|_| AppError::Validation(format!("invalid account id '{v}'"))))
            .transpose()?;
        Ok(ConversationFilter {
            status: parse_opt(self.status.as_deref())?,
            kind: parse_opt(self.kind.as_deref())?,
            account_id,
            unread_only: self.unread,
            limit: clamp_limit(self.limit),
            offset: self.offset,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct MediaListQuery {
    pub kind: Option<String>,
    /// upload, unsplash, generated, composited
    pub source: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MediaListQuery {
    pub fn into_filter(self) -> Result<MediaFilter, AppError> {
        Ok(MediaFilter {
            kind: parse_opt(self.kind.as_deref())?,
            source: parse_opt(self.source.as_deref())?,
            tag: self.tag.filter(|t| !t.is_empty()),
            limit: clamp_limit(self.limit),
            offset: self.offset,
        })
    }
}

/// Month view; defaults to the current UTC month.
#[derive(Debug, Deserialize, Default)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Explicit `[from, to)` window.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct StockSearchQuery {
    pub q: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_per_page() -> u32 {
    12
}
