//! Content calendar handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use socialdesk_core::service::calendar::CalendarDay;
use socialdesk_types::id::PostId;
use socialdesk_types::post::Post;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::{CalendarQuery, RangeQuery};
use crate::http::handlers::parse_id;
use crate::http::response::{ApiResponse, Timer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RescheduleBody {
    pub date: NaiveDate,
}

/// GET /api/v1/calendar?year=2026&month=3
pub async fn month(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<ApiResponse<Vec<CalendarDay>>>, AppError> {
    let timer = Timer::start();
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());
    let days = state
        .calendar_service
        .month(&auth.brand_id(), year, month)
        .await?;
    Ok(Json(timer.finish(days)))
}

/// GET /api/v1/calendar/range?from=...&to=...
pub async fn range(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ApiResponse<Vec<Post>>>, AppError> {
    let timer = Timer::start();
    let posts = state
        .calendar_service
        .range(&auth.brand_id(), query.from, query.to)
        .await?;
    Ok(Json(timer.finish(posts)))
}

/// POST /api/v1/calendar/{post_id}/reschedule - move a post to another day.
pub async fn reschedule(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(body): Json<RescheduleBody>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    let timer = Timer::start();
    let id: PostId = parse_id(&id, "post")?;
    let post = state
        .calendar_service
        .reschedule(&auth.brand_id(), &id, auth.actor(), body.date)
        .await?;
    Ok(Json(timer.finish(post)))
}
