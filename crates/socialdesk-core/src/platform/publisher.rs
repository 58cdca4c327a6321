//! SocialPublisher trait definition.

use serde::{Deserialize, Serialize};

use socialdesk_types::account::SocialAccount;
use socialdesk_types::error::PlatformError;
use socialdesk_types::inbox::InboundEvent;
use socialdesk_types::post::PostItem;

/// Platform-side identity of a published item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedMedia {
    pub external_id: String,
    pub permalink: Option<String>,
}

/// Where a reply goes on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    /// Threaded reply under a comment.
    Comment { comment_id: String },
    /// Private message to a user (platform-scoped user id).
    DirectMessage { recipient_id: String },
    /// Reply to a post or comment that mentioned the account.
    Mention {
        media_id: String,
        comment_id: Option<String>,
    },
}

/// Trait for social platform backends.
///
/// Uses native async fn in traits (RPITIT). Implementations live in
/// socialdesk-infra (e.g., `MetaGraphClient`).
pub trait SocialPublisher: Send + Sync {
    /// Publish one post item to the account it targets.
    fn publish(
        &self,
        account: &SocialAccount,
        item: &PostItem,
    ) -> impl std::future::Future<Output = Result<PublishedMedia, PlatformError>> + Send;

    /// Send a reply and return the platform id of the created message/comment.
    fn reply(
        &self,
        account: &SocialAccount,
        target: &ReplyTarget,
        text: &str,
    ) -> impl std::future::Future<Output = Result<String, PlatformError>> + Send;

    /// Pull the comments currently on a published media item.
    fn fetch_comments(
        &self,
        account: &SocialAccount,
        media_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<InboundEvent>, PlatformError>> + Send;
}
