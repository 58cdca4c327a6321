use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// GET /health - liveness plus configured integrations. No auth.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "integrations": state.integrations,
        "scheduler": state.config.scheduler.enabled,
    }))
}
