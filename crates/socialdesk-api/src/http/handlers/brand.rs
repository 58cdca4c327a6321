//! Brand and team handlers. A key only ever sees its own brand.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use socialdesk_types::brand::{Brand, CreateUserRequest, UpdateBrandRequest, User};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::handlers::require_admin;
use crate::http::response::{ApiResponse, Timer};
use crate::state::AppState;

#[derive(Serialize)]
pub struct Me {
    pub brand: Brand,
    pub user: User,
}

/// GET /api/v1/brands/me
pub async fn get_me(State(state): State<AppState>, auth: Authenticated) -> Result<Json<ApiResponse<Me>>, AppError> {
    let timer = Timer::start();
    let brand = state.brand_service.get(&auth.brand_id()).await?;
    let user = state.brand_service.get_user(&auth.brand_id(), &auth.0.user_id).await?;
    Ok(Json(
        timer
            .finish(Me { brand, user })
            .with_link("self", "/api/v1/brands/me")
            .with_link("users", "/api/v1/brands/me/users"),
    ))
}

/// PATCH /api/v1/brands/me
pub async fn update_me(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<UpdateBrandRequest>,
) -> Result<Json<ApiResponse<Brand>>, AppError> {
    let timer = Timer::start();
    require_admin(&auth)?;
    let brand = state.brand_service.update_brand(&auth.brand_id(), body).await?;
    Ok(Json(timer.finish(brand)))
}

/// GET /api/v1/brands/me/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let timer = Timer::start();
    let users = state.brand_service.list_users(&auth.brand_id()).await?;
    Ok(Json(timer.finish(users)))
}

/// POST /api/v1/brands/me/users
pub async fn add_user(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let timer = Timer::start();
    require_admin(&auth)?;
    let user = state.brand_service.add_user(&auth.brand_id(), body).await?;
    Ok(Json(timer.finish(user)))
}
