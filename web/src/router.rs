use crate::{controller::health_check_controller, sse::handler, AppState};
use axum::{
    routing::{any, get},
    Router,
};
use std::path::Path;
use tower_http::services::ServeDir;

pub fn define_routes(app_state: AppState) -> Router {
    let root_dir = app_state.config.root_dir().clone();

    Router::new()
        .merge(health_routes())
        .merge(sse_routes(app_state))
        .fallback_service(static_routes(&root_dir))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

/// Routes for the live-reload event stream and its trigger
fn sse_routes(app_state: AppState) -> Router {
    let subscribe_path = app_state.config.subscribe_path().to_string();
    let trigger_path = app_state.config.trigger_path().to_string();

    Router::new()
        .route(&subscribe_path, get(handler::subscribe))
        .route(&trigger_path, any(handler::reload))
        .with_state(app_state)
}

// Everything else is served straight from the working directory
pub fn static_routes(root_dir: &Path) -> ServeDir {
    ServeDir::new(root_dir)
}
