pub mod health;

use std::any::Any;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::adventure::handlers;
use crate::errors::AppError;
use crate::state::AppState;

/// Turns a handler panic into the generic internal-error response.
fn handle_panic(_payload: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Internal(anyhow::anyhow!("request handler panicked")).into_response()
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/generate", post(handlers::handle_generate))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}
