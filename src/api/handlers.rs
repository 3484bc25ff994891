use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::aggregator::SearchAggregator;
use crate::source::RecordSource;

use super::models::{CollectionInfo, SearchRequest, SearchResponseBody};

pub async fn search_handler<S: RecordSource>(
    State(aggregator): State<Arc<SearchAggregator<S>>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponseBody>, (StatusCode, String)> {
    let start = Instant::now();

    if request.query.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query cannot be empty".to_string()));
    }

    let response = aggregator.search(&request.query).await;

    let processing_time_ms = start.elapsed().as_millis();

    Ok(Json(SearchResponseBody {
        query: request.query,
        grouped_by_category: response.grouped_by_category(),
        total_results: response.total_count(),
        results: response.results,
        failed_collections: response.failed_collections,
        processing_time_ms,
        searched_at: Utc::now(),
    }))
}

pub async fn collections_handler<S: RecordSource>(
    State(aggregator): State<Arc<SearchAggregator<S>>>,
) -> Json<Vec<CollectionInfo>> {
    Json(aggregator.registry().iter().map(CollectionInfo::from).collect())
}

pub async fn health_handler() -> &'static str {
    "ok"
}
