use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

pub mod favorites;
pub mod movies;
pub mod recommendations;
pub mod state;
pub mod tmdb;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            // Outermost first: the request ID must exist before the trace span opens
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/:user_id/recommendations",
            get(recommendations::recommend),
        )
        .route("/users/:user_id/favorites", get(favorites::list))
        .route(
            "/users/:user_id/favorites/:tmdb_id",
            post(favorites::add).delete(favorites::remove),
        )
        .route("/movies", get(movies::list))
        .route("/tmdb/trending", get(tmdb::trending))
        .route("/tmdb/search", get(tmdb::search))
        .route("/tmdb/movies/:tmdb_id", get(tmdb::details))
        .route(
            "/tmdb/movies/:tmdb_id/recommendations",
            get(tmdb::similar),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
