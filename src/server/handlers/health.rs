use axum::response::Json;
use serde_json::{json, Value};

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Chatbot API is running",
        "service": "chatflow",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
