//! Graph API wire types.

use serde::Deserialize;
use socialdesk_types::error::PlatformError;

/// `{"error": {...}}` body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct GraphErrorBody {
    pub error: GraphError,
}

#[derive(Debug, Deserialize)]
pub struct GraphError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub error_subcode: Option<i64>,
}

impl GraphError {
    pub fn into_platform_error(self) -> PlatformError {
        match self.code {
            // invalid / expired OAuth token, or session invalidated
            190 | 102 => PlatformError::TokenExpired,
            // application, user, page, and custom rate limits
            4 | 17 | 32 | 613 => PlatformError::RateLimited,
            code => PlatformError::Api {
                code,
                message: self.message,
            },
        }
    }
}

/// Response of any create call (`/media`, `/feed`, `/replies`, ...).
#[derive(Debug, Deserialize)]
pub struct IdResponse {
    pub id: String,
    /// `/photos` returns the feed post id separately.
    #[serde(default)]
    pub post_id: Option<String>,
}

/// Response of `/{ig-user}/messages` and `/{page}/messages`.
#[derive(Debug, Deserialize)]
pub struct SendMessageResponse {
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ContainerStatusResponse {
    pub status_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PermalinkResponse {
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentList {
    #[serde(default)]
    pub data: Vec<GraphComment>,
}

/// A comment as returned by either Instagram (`text`, `username`) or
/// Facebook (`message`, `from.name`).
#[derive(Debug, Deserialize)]
pub struct GraphComment {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub from: Option<GraphUser>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}
