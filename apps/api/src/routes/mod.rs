pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Email generation API
        .route("/api/v1/emails/generate", post(handlers::handle_generate))
        .route("/api/v1/emails/redraft", post(handlers::handle_redraft))
        .route("/api/v1/emails/bulk", post(handlers::handle_bulk))
        .with_state(state)
}
