//! Application error type mapping domain errors to HTTP status codes and
//! the envelope format.

use std::collections::HashMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use socialdesk_types::error::{
    AccountError, BrandError, ContentError, InboxError, MediaError, PlatformError, PostError,
};

use crate::http::response::{ApiErrorDetail, ApiMeta, ApiResponse};

#[derive(Debug)]
pub enum AppError {
    Brand(BrandError),
    Account(AccountError),
    Post(PostError),
    Inbox(InboxError),
    Media(MediaError),
    Content(ContentError),
    Platform(PlatformError),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Validation(String),
    Internal(String),
}

macro_rules! impl_from {
    ($($err:ty => $variant:ident),* $(,)?) => {
        $(impl From<$err> for AppError {
            fn from(e: $err) -> Self {
                AppError::$variant(e)
            }
        })*
    };
}

impl_from!(
    BrandError => Brand,
    AccountError => Account,
    PostError => Post,
    InboxError => Inbox,
    MediaError => Media,
    ContentError => Content,
    PlatformError => Platform,
);

type Parts = (StatusCode, &'static str, String);

fn not_found(msg: impl ToString) -> Parts {
    (StatusCode::NOT_FOUND, "NOT_FOUND", msg.to_string())
}

fn conflict(msg: impl ToString) -> Parts {
    (StatusCode::CONFLICT, "CONFLICT", msg.to_string())
}

fn invalid(msg: impl ToString) -> Parts {
    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.to_string())
}

fn upstream(msg: impl ToString) -> Parts {
    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.to_string())
}

fn internal(msg: impl ToString) -> Parts {
    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.to_string())
}

fn not_configured(msg: impl ToString) -> Parts {
    (StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED", msg.to_string())
}

fn platform_parts(e: &PlatformError) -> Parts {
    match e {
        PlatformError::Unsupported(_) => invalid(e),
        _ => upstream(e),
    }
}

fn content_parts(e: &ContentError) -> Parts {
    match e {
        ContentError::NotConfigured => not_configured(e),
        ContentError::InvalidRequest(_) => invalid(e),
        ContentError::Blocked(_) => (StatusCode::BAD_REQUEST, "CONTENT_BLOCKED", e.to_string()),
        _ => upstream(e),
    }
}

impl AppError {
    /// Status, error code, and message for this error.
    pub fn parts(&self) -> Parts {
        match self {
            AppError::Brand(e) => match e {
                BrandError::NotFound | BrandError::UserNotFound => not_found(e),
                BrandError::SlugConflict(_) | BrandError::EmailConflict(_) => conflict(e),
                BrandError::InvalidName(_) | BrandError::InvalidEmail(_) => invalid(e),
                BrandError::StorageError(_) => internal(e),
            },
            AppError::Account(e) => match e {
                AccountError::NotFound => not_found(e),
                AccountError::AlreadyConnected(_) => conflict(e),
                AccountError::Invalid(_) => invalid(e),
                AccountError::StorageError(_) => internal(e),
            },
            AppError::Post(e) => match e {
                PostError::NotFound => not_found(e),
                PostError::Validation(_) | PostError::ScheduledInPast => invalid(e),
                PostError::InvalidTransition { .. }
                | PostError::Locked(_)
                | PostError::CannotDeletePublished
                | PostError::ApprovalRequired => (StatusCode::CONFLICT, "INVALID_TRANSITION", e.to_string()),
                PostError::AccountUnavailable(_) | PostError::AlreadyPublishing => conflict(e),
                PostError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string()),
                PostError::StorageError(_) => internal(e),
            },
            AppError::Inbox(e) => match e {
                InboxError::NotFound | InboxError::UnknownAccount(_) => not_found(e),
                InboxError::EmptyReply => invalid(e),
                InboxError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string()),
                InboxError::Platform(p) => platform_parts(p),
                InboxError::Content(c) => content_parts(c),
                InboxError::StorageError(_) => internal(e),
            },
            AppError::Media(e) => match e {
                MediaError::NotFound => not_found(e),
                MediaError::Validation(_) => invalid(e),
                MediaError::NotConfigured(_) => not_configured(e),
                MediaError::Upload(_) | MediaError::Fetch(_) | MediaError::StockSearch(_) => upstream(e),
                MediaError::Render(_) | MediaError::StorageError(_) => internal(e),
            },
            AppError::Content(e) => content_parts(e),
            AppError::Platform(e) => platform_parts(e),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::NotFound(msg) => not_found(msg),
            AppError::Validation(msg) => invalid(msg),
            AppError::Internal(msg) => internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(%status, code, %message, "request failed");
        } else {
            tracing::debug!(%status, code, %message, "request rejected");
        }

        let body: ApiResponse<()> = ApiResponse {
            data: None,
            meta: ApiMeta::new(uuid::Uuid::now_v7().to_string(), 0),
            errors: vec![ApiErrorDetail {
                code: code.to_string(),
                message,
            }],
            links: HashMap::new(),
        };
        (status, Json(body)).into_response()
    }
}
