//! Axum router configuration with middleware.
//!
//! Brand-scoped routes live under `/api/v1/` and authenticate with an API
//! key. `/webhooks/meta` and `/health` are public.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Uploads travel base64-encoded, so allow headroom over the 20 MB image cap.
const UPLOAD_BODY_LIMIT: usize = 30 * 1024 * 1024;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Brand and team
        .route(
            "/brands/me",
            get(handlers::brand::get_me).patch(handlers::brand::update_me),
        )
        .route(
            "/brands/me/users",
            get(handlers::brand::list_users).post(handlers::brand::add_user),
        )
        // Connected accounts
        .route(
            "/accounts",
            get(handlers::account::list_accounts).post(handlers::account::connect_account),
        )
        .route(
            "/accounts/{id}",
            get(handlers::account::get_account).delete(handlers::account::disconnect_account),
        )
        // Posts
        .route(
            "/posts",
            get(handlers::post::list_posts).post(handlers::post::create_post),
        )
        .route(
            "/posts/{id}",
            get(handlers::post::get_post)
                .patch(handlers::post::update_post)
                .delete(handlers::post::delete_post),
        )
        .route(
            "/posts/{id}/items/{item_id}",
            axum::routing::patch(handlers::post::update_item),
        )
        .route("/posts/{id}/submit", post(handlers::post::submit_post))
        .route("/posts/{id}/review", post(handlers::post::review_post))
        .route("/posts/{id}/schedule", post(handlers::post::schedule_post))
        .route("/posts/{id}/unschedule", post(handlers::post::unschedule_post))
        .route("/posts/{id}/publish", post(handlers::post::publish_post))
        .route("/posts/{id}/duplicate", post(handlers::post::duplicate_post))
        // Calendar
        .route("/calendar", get(handlers::calendar::month))
        .route("/calendar/range", get(handlers::calendar::range))
        .route(
            "/calendar/{id}/reschedule",
            post(handlers::calendar::reschedule),
        )
        // Inbox
        .route("/inbox", get(handlers::inbox::list_conversations))
        .route("/inbox/sync", post(handlers::inbox::sync_comments))
        .route("/inbox/{id}", get(handlers::inbox::get_thread))
        .route("/inbox/{id}/messages", get(handlers::inbox::list_messages))
        .route("/inbox/{id}/reply", post(handlers::inbox::reply))
        .route("/inbox/{id}/read", post(handlers::inbox::mark_read))
        .route("/inbox/{id}/status", post(handlers::inbox::set_status))
        .route("/inbox/{id}/suggest", post(handlers::inbox::suggest_reply))
        // Media library
        .route(
            "/media",
            get(handlers::media::list_media)
                .post(handlers::media::upload_media)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/media/stock", get(handlers::media::search_stock))
        .route("/media/stock/import", post(handlers::media::import_stock))
        .route("/media/carousel", post(handlers::media::render_carousel))
        .route("/media/generated", post(handlers::media::generate_media))
        .route(
            "/media/{id}",
            get(handlers::media::get_media).delete(handlers::media::delete_media),
        )
        // Product catalog
        .route(
            "/products",
            get(handlers::product::list_products).post(handlers::product::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::product::get_product)
                .patch(handlers::product::update_product)
                .delete(handlers::product::delete_product),
        )
        // AI content
        .route("/ai/caption", post(handlers::ai::caption))
        .route("/ai/hashtags", post(handlers::ai::hashtags))
        .route("/ai/image", post(handlers::ai::image));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/webhooks/meta",
            get(handlers::webhook::verify).post(handlers::webhook::receive),
        )
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
