use axum::Json;
use axum::extract::{Path, State};

use socialdesk_types::id::ProductId;
use socialdesk_types::media::{CreateProductRequest, Product, UpdateProductRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::handlers::{parse_id, require_editor};
use crate::http::response::{ApiResponse, Timer};
use crate::state::AppState;

/// GET /api/v1/products
pub async fn list_products(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<Product>>>, AppError> {
    let timer = Timer::start();
    let products = state.product_service.list(&auth.brand_id()).await?;
    Ok(Json(timer.finish(products)))
}

/// POST /api/v1/products
pub async fn create_product(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CreateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let timer = Timer::start();
    require_editor(&auth)?;
    let product = state.product_service.create(&auth.brand_id(), body).await?;
    let href = format!("/api/v1/products/{}", product.id);
    Ok(Json(timer.finish(product).with_link("self", &href)))
}

/// GET /api/v1/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let timer = Timer::start();
    let id: ProductId = parse_id(&id, "product")?;
    let product = state.product_service.get(&auth.brand_id(), &id).await?;
    Ok(Json(timer.finish(product)))
}

/// PATCH /api/v1/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let timer = Timer::start();
    require_editor(&auth)?;
    let id: ProductId = parse_id(&id, "product")?;
    let product = state.product_service.update(&auth.brand_id(), &id, body).await?;
    Ok(Json(timer.finish(product)))
}

/// DELETE /api/v1/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let timer = Timer::start();
    require_editor(&auth)?;
    let id: ProductId = parse_id(&id, "product")?;
    state.product_service.delete(&auth.brand_id(), &id).await?;
    Ok(Json(timer.finish(serde_json::json!({ "deleted": id }))))
}
