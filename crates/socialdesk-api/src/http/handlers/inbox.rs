//! Unified inbox handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use socialdesk_core::service::inbox::{SyncReport, Thread};
use socialdesk_types::id::{AccountId, ConversationId};
use socialdesk_types::inbox::{Conversation, ConversationStatus, Message};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::InboxListQuery;
use crate::http::handlers::{parse_id, require_editor};
use crate::http::response::{ApiResponse, Timer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReplyBody {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: ConversationStatus,
}

#[derive(Debug, Deserialize)]
pub struct SyncBody {
    pub account_id: AccountId,
    /// Platform id of the published media whose comments to pull.
    pub media_id: String,
}

#[derive(Debug, Serialize)]
pub struct Suggestion {
    pub text: String,
}

/// GET /api/v1/inbox
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<InboxListQuery>,
) -> Result<Json<ApiResponse<Vec<Conversation>>>, AppError> {
    let timer = Timer::start();
    let conversations = state
        .inbox_service
        .list(&auth.brand_id(), query.into_filter()?)
        .await?;
    Ok(Json(timer.finish(conversations).with_link("self", "/api/v1/inbox")))
}

/// GET /api/v1/inbox/{id} - conversation with its messages.
pub async fn get_thread(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Thread>>, AppError> {
    let timer = Timer::start();
    let id: ConversationId = parse_id(&id, "conversation")?;
    let thread = state.inbox_service.get_thread(&auth.brand_id(), &id).await?;
    let messages = format!("/api/v1/inbox/{id}/messages");
    Ok(Json(timer.finish(thread).with_link("messages", &messages)))
}

/// GET /api/v1/inbox/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let timer = Timer::start();
    let id: ConversationId = parse_id(&id, "conversation")?;
    let thread = state.inbox_service.get_thread(&auth.brand_id(), &id).await?;
    Ok(Json(timer.finish(thread.messages)))
}

/// POST /api/v1/inbox/{id}/reply
pub async fn reply(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(body): Json<ReplyBody>,
) -> Result<Json<ApiResponse<Message>>, AppError> {
    let timer = Timer::start();
    let id: ConversationId = parse_id(&id, "conversation")?;
    let message = state
        .inbox_service
        .reply(&auth.brand_id(), &id, auth.actor(), &body.text)
        .await?;
    Ok(Json(timer.finish(message)))
}

/// POST /api/v1/inbox/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let timer = Timer::start();
    let id: ConversationId = parse_id(&id, "conversation")?;
    let conversation = state.inbox_service.mark_read(&auth.brand_id(), &id).await?;
    Ok(Json(timer.finish(conversation)))
}

/// POST /api/v1/inbox/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<ApiResponse<Conversation>>, AppError> {
    let timer = Timer::start();
    let id: ConversationId = parse_id(&id, "conversation")?;
    let conversation = state
        .inbox_service
        .set_status(&auth.brand_id(), &id, auth.actor(), body.status)
        .await?;
    Ok(Json(timer.finish(conversation)))
}

/// POST /api/v1/inbox/{id}/suggest - AI-drafted reply, not sent.
pub async fn suggest_reply(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Suggestion>>, AppError> {
    let timer = Timer::start();
    let id: ConversationId = parse_id(&id, "conversation")?;
    let text = state
        .inbox_service
        .suggest_reply(&auth.brand_id(), &id, state.content_service.as_ref())
        .await?;
    Ok(Json(timer.finish(Suggestion { text })))
}

/// POST /api/v1/inbox/sync - pull comments of a published media item.
pub async fn sync_comments(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<SyncBody>,
) -> Result<Json<ApiResponse<SyncReport>>, AppError> {
    let timer = Timer::start();
    require_editor(&auth)?;
    let report = state
        .inbox_service
        .sync_comments(&auth.brand_id(), &body.account_id, &body.media_id)
        .await?;
    Ok(Json(timer.finish(report)))
}
