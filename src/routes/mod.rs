use axum::{
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};

use crate::state::AppState;

pub mod recommendations;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state))
}

/// API routes under /api/v1
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/titles/:title_id/recommendations",
            get(recommendations::list).post(recommendations::create),
        )
        .route(
            "/titles/:title_id/recommendations/permission",
            get(recommendations::permission),
        )
        .route(
            "/titles/:title_id/recommendations/:recommended_id",
            delete(recommendations::remove),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
