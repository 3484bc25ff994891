use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::SourceCollection;
use crate::data_models::{Category, SearchResult};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponseBody {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub grouped_by_category: BTreeMap<Category, Vec<SearchResult>>,
    pub total_results: usize,
    pub failed_collections: Vec<String>,
    pub processing_time_ms: u128,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub category: Category,
    pub label: String,
    pub required_keywords: Vec<String>,
}

impl From<&SourceCollection> for CollectionInfo {
    fn from(collection: &SourceCollection) -> Self {
        Self {
            name: collection.name.clone(),
            category: collection.category,
            label: collection.label.clone(),
            required_keywords: collection.required_keywords.clone(),
        }
    }
}
