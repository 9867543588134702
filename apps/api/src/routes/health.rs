use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Liveness check for load balancers. Never touches the completion service.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "microquest-api"
    }))
}
