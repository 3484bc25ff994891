use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::aggregator::SearchAggregator;
use crate::source::RecordSource;

pub mod handlers;
pub mod models;

pub fn create_router<S: RecordSource>(aggregator: Arc<SearchAggregator<S>>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", post(handlers::search_handler::<S>))
        .route("/api/collections", get(handlers::collections_handler::<S>))
        .route("/health", get(handlers::health_handler))
        .with_state(aggregator)
        .layer(cors)
}
