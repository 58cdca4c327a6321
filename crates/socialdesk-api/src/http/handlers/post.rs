//! Post lifecycle handlers: CRUD, review workflow, scheduling, publishing.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use socialdesk_types::id::{PostId, PostItemId};
use socialdesk_types::post::{CreatePostRequest, Post, ReviewDecision, UpdateItemRequest, UpdatePostRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::PostListQuery;
use crate::http::handlers::parse_id;
use crate::http::response::{ApiResponse, Timer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
    pub scheduled_at: DateTime<Utc>,
}

fn post_response(timer: Timer, post: Post) -> Json<ApiResponse<Post>> {
    let href = format!("/api/v1/posts/{}", post.id);
    Json(timer.finish(post).with_link("self", &href))
}

/// GET /api/v1/posts
pub async fn list_posts(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<PostListQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>, AppError> {
    let timer = Timer::start();
    let posts = state
        .post_service
        .list(&auth.brand_id(), query.into_filter()?)
        .await?;
    Ok(Json(timer.finish(posts).with_link("self", "/api/v1/posts")))
}

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CreatePostRequest>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let post = state
        .post_service
        .create_post(&auth.brand_id(), auth.actor(), body)
        .await?;
    Ok(post_response(timer, post))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let post = state.post_service.get(&auth.brand_id(), &id).await?;
    Ok(post_response(timer, post))
}

/// PATCH /api/v1/posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let post = state
        .post_service
        .update_post(&auth.brand_id(), &id, auth.actor(), body)
        .await?;
    Ok(post_response(timer, post))
}

/// PATCH /api/v1/posts/{id}/items/{item_id} - edit one platform variant.
pub async fn update_item(
    State(state): State<AppState>,
    auth: Authenticated,
    Path((id, item_id)): Path<(String, String)>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let item_id: PostItemId = parse_id(&item_id, "post item")?;
    let post = state
        .post_service
        .update_item(&auth.brand_id(), &id, &item_id, auth.actor(), body)
        .await?;
    Ok(post_response(timer, post))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    state
        .post_service
        .delete_post(&auth.brand_id(), &id, auth.actor())
        .await?;
    Ok(Json(timer.finish(serde_json::json!({ "deleted": id }))))
}

/// POST /api/v1/posts/{id}/submit
pub async fn submit_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let post = state
        .post_service
        .submit_for_review(&auth.brand_id(), &id, auth.actor())
        .await?;
    Ok(post_response(timer, post))
}

/// POST /api/v1/posts/{id}/review - approve or reject.
pub async fn review_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(body): Json<ReviewDecision>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let post = state
        .post_service
        .review(&auth.brand_id(), &id, auth.actor(), body)
        .await?;
    Ok(post_response(timer, post))
}

/// POST /api/v1/posts/{id}/schedule
pub async fn schedule_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(body): Json<ScheduleBody>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let post = state
        .post_service
        .schedule(&auth.brand_id(), &id, auth.actor(), body.scheduled_at)
        .await?;
    Ok(post_response(timer, post))
}

/// POST /api/v1/posts/{id}/unschedule
pub async fn unschedule_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let post = state
        .post_service
        .unschedule(&auth.brand_id(), &id, auth.actor())
        .await?;
    Ok(post_response(timer, post))
}

/// POST /api/v1/posts/{id}/publish - publish now, or retry failed items.
pub async fn publish_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let post = state
        .publish_service
        .publish_now(&auth.brand_id(), &id, auth.actor())
        .await?;
    Ok(post_response(timer, post))
}

/// POST /api/v1/posts/{id}/duplicate
pub async fn duplicate_post(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let post = state
        .post_service
        .duplicate_post(&auth.brand_id(), &id, auth.actor())
        .await?;
    Ok(post_response(timer, post))
}
