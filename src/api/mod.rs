pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::sentiment::Classifier;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub classifier: Arc<dyn Classifier>,
}

/// Create and configure the API router
pub fn create_router(classifier: Arc<dyn Classifier>) -> Router {
    let state = ApiState { classifier };

    // Configure CORS to allow all origins (adjust for production)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/classify", post(handlers::classify))
        .layer(cors)
        .with_state(state)
}
