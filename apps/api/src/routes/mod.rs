pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analyze;
use crate::compile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/render", post(compile::handlers::handle_compile))
        // Alias kept for the frontend's original fetch path.
        .route("/api/compile-latex", post(compile::handlers::handle_compile))
        .route("/api/analyze", post(analyze::handlers::handle_analyze))
        .with_state(state)
}
