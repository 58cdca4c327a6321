use thiserror::Error;

use crate::post::PostStatus;

/// Errors from repository operations (used by trait definitions in socialdesk-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to brands and their team members.
#[derive(Debug, Error)]
pub enum BrandError {
    #[error("brand not found")]
    NotFound,

    #[error("slug '{0}' already exists")]
    SlugConflict(String),

    #[error("invalid brand name: {0}")]
    InvalidName(String),

    #[error("user not found")]
    UserNotFound,

    #[error("invalid email: '{0}'")]
    InvalidEmail(String),

    #[error("email '{0}' is already a member of this brand")]
    EmailConflict(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to connected social accounts.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("social account not found")]
    NotFound,

    #[error("account '{0}' is already connected")]
    AlreadyConnected(String),

    #[error("invalid account: {0}")]
    Invalid(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to the post lifecycle.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    NotFound,

    #[error("invalid post: {0}")]
    Validation(String),

    #[error("scheduled time must be in the future")]
    ScheduledInPast,

    #[error("cannot move post from '{from}' to '{to}'")]
    InvalidTransition { from: PostStatus, to: PostStatus },

    #[error("published posts cannot be deleted")]
    CannotDeletePublished,

    #[error("post is '{0}' and can no longer be edited")]
    Locked(PostStatus),

    #[error("post must be approved before it can be scheduled or published")]
    ApprovalRequired,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("account unavailable: {0}")]
    AccountUnavailable(String),

    #[error("post is already being published")]
    AlreadyPublishing,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from social platform APIs (Meta Graph API).
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("platform error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("access token expired or revoked")]
    TokenExpired,

    #[error("platform rate limit reached")]
    RateLimited,

    #[error("media container failed: {0}")]
    ContainerFailed(String),

    #[error("media container expired before publishing")]
    ContainerExpired,

    #[error("media container not ready after {attempts} status checks")]
    ContainerTimeout { attempts: u32 },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("unexpected response: {0}")]
    Deserialization(String),
}

/// Errors related to the inbox.
#[derive(Debug, Error)]
pub enum InboxError {
    #[error("conversation not found")]
    NotFound,

    #[error("no connected account with platform id '{0}'")]
    UnknownAccount(String),

    #[error("reply cannot be empty")]
    EmptyReply,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from the AI content provider.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited")]
    RateLimited,

    #[error("provider returned no content")]
    EmptyResponse,

    #[error("content blocked: {0}")]
    Blocked(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("AI provider not configured")]
    NotConfigured,
}

/// Errors related to media storage and rendering.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media asset not found")]
    NotFound,

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("stock photo search failed: {0}")]
    StockSearch(String),

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("invalid media request: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let err = PostError::InvalidTransition {
            from: PostStatus::Published,
            to: PostStatus::Draft,
        };
        assert_eq!(err.to_string(), "cannot move post from 'published' to 'draft'");
    }

    #[test]
    fn test_container_timeout_display() {
        let err = PlatformError::ContainerTimeout { attempts: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_inbox_wraps_platform_error() {
        let err: InboxError = PlatformError::TokenExpired.into();
        assert_eq!(err.to_string(), "access token expired or revoked");
    }
}
