use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET liveness probe for the reload server
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "healthy")
}
