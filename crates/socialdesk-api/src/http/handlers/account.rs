//! Connected social account handlers.

use axum::Json;
use axum::extract::{Path, State};

use socialdesk_types::account::{ConnectAccountRequest, SocialAccount};
use socialdesk_types::id::AccountId;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::handlers::{parse_id, require_admin};
use crate::http::response::{ApiResponse, Timer};
use crate::state::AppState;

/// GET /api/v1/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<SocialAccount>>>, AppError> {
    let timer = Timer::start();
    let accounts = state.account_service.list(&auth.brand_id()).await?;
    Ok(Json(timer.finish(accounts).with_link("self", "/api/v1/accounts")))
}

/// POST /api/v1/accounts - connect (or reconnect) an account.
pub async fn connect_account(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<ConnectAccountRequest>,
) -> Result<Json<ApiResponse<SocialAccount>>, AppError> {
    let timer = Timer::start();
    require_admin(&auth)?;
    let account = state.account_service.connect(&auth.brand_id(), body).await?;
    let href = format!("/api/v1/accounts/{}", account.id);
    Ok(Json(timer.finish(account).with_link("self", &href)))
}

/// GET /api/v1/accounts/{id}
pub async fn get_account(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SocialAccount>>, AppError> {
    let timer = Timer::start();
    let id: AccountId = parse_id(&id, "account")?;
    let account = state.account_service.get(&auth.brand_id(), &id).await?;
    Ok(Json(timer.finish(account)))
}

/// DELETE /api/v1/accounts/{id} - disconnect; the row is kept.
pub async fn disconnect_account(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SocialAccount>>, AppError> {
    let timer = Timer::start();
    require_admin(&auth)?;
    let id: AccountId = parse_id(&id, "account")?;
    let account = state.account_service.disconnect(&auth.brand_id(), &id).await?;
    Ok(Json(timer.finish(account)))
}
