use axum::response::IntoResponse;
use http::StatusCode;

/// Liveness probe; reports `ok` whether or not a model is loaded
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
