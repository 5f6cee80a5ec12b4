use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports service status and which TeX engine was detected at startup.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "texforge-api",
        "version": env!("CARGO_PKG_VERSION"),
        "engine": state.engine.map(|e| e.as_str()),
    }))
}
