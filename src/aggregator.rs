use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::cache::ResultCache;
use crate::catalog::SourceCollection;
use crate::config::SearchSettings;
use crate::data_models::{Category, SearchResult, SearchTerm};
use crate::error::SourceError;
use crate::normalize::normalize;
use crate::ranking::{group_by_category, rank};
use crate::source::RecordSource;

/// One point-in-time snapshot of a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub term: String,
    pub results: Vec<SearchResult>,
    /// Collections whose query failed or timed out.
    pub failed_collections: Vec<String>,
    pub queried_collections: usize,
}

impl SearchResponse {
    pub fn empty(term: &str) -> Self {
        Self {
            term: term.trim().to_string(),
            results: Vec::new(),
            failed_collections: Vec::new(),
            queried_collections: 0,
        }
    }

    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    pub fn grouped_by_category(&self) -> BTreeMap<Category, Vec<SearchResult>> {
        group_by_category(&self.results)
    }

    pub fn is_partial(&self) -> bool {
        !self.failed_collections.is_empty()
    }
}

/// Fans a term out to every registered collection, then merges, ranks
/// and caps the normalized rows.
pub struct SearchAggregator<S> {
    source: Arc<S>,
    registry: Vec<SourceCollection>,
    settings: SearchSettings,
    cache: Option<ResultCache>,
}

impl<S: RecordSource> SearchAggregator<S> {
    pub fn new(source: S, registry: Vec<SourceCollection>, settings: SearchSettings) -> Self {
        let cache = (!settings.cache_ttl.is_zero()).then(|| ResultCache::new(settings.cache_ttl));
        Self {
            source: Arc::new(source),
            registry,
            settings,
            cache,
        }
    }

    pub fn registry(&self) -> &[SourceCollection] {
        &self.registry
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    /// Never fails: collections that error or time out contribute nothing
    /// and are reported in [`SearchResponse::failed_collections`].
    pub async fn search(&self, raw_term: &str) -> SearchResponse {
        let Some(term) = SearchTerm::parse(raw_term) else {
            tracing::debug!(term = raw_term, "term too short, skipping search");
            return SearchResponse::empty(raw_term);
        };

        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(term.key())) {
            tracing::debug!(%term, "serving search from cache");
            return cached.as_ref().clone();
        }

        let mut join_set = JoinSet::new();
        let mut task_index = HashMap::new();
        for (index, collection) in self.registry.iter().enumerate() {
            if !collection.accepts(&term) {
                tracing::debug!(collection = %collection.name, %term, "keyword precondition not met, skipping");
                continue;
            }
            let source = Arc::clone(&self.source);
            let query = collection.query_for(&term, self.settings.collection_limit);
            let timeout = self.settings.query_timeout;
            let handle = join_set.spawn(async move {
                match tokio::time::timeout(timeout, source.select(&query)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(SourceError::Timeout {
                        collection: query.collection.clone(),
                        after: timeout,
                    }),
                }
            });
            task_index.insert(handle.id(), index);
        }
        let queried_collections = join_set.len();

        let mut per_collection: Vec<Option<Vec<SearchResult>>> = vec![None; self.registry.len()];
        let mut failed = vec![false; self.registry.len()];

        while let Some(task) = join_set.join_next_with_id().await {
            let (id, outcome) = match task {
                Ok((id, outcome)) => (id, Ok(outcome)),
                Err(join_error) => (join_error.id(), Err(join_error)),
            };
            // every spawned task id was recorded above
            let Some(&index) = task_index.get(&id) else {
                continue;
            };
            let collection = &self.registry[index];
            match outcome {
                Ok(Ok(rows)) => {
                    tracing::debug!(collection = %collection.name, rows = rows.len(), "collection query settled");
                    let results = rows
                        .into_iter()
                        .enumerate()
                        .map(|(position, row)| normalize(collection, row, position))
                        .collect();
                    per_collection[index] = Some(results);
                }
                Ok(Err(e)) => {
                    tracing::warn!(collection = %collection.name, error = %e, "collection query failed");
                    failed[index] = true;
                }
                Err(e) => {
                    tracing::error!(collection = %collection.name, error = %e, "collection query task did not complete");
                    failed[index] = true;
                }
            }
        }

        let failed_collections: Vec<String> = self
            .registry
            .iter()
            .zip(&failed)
            .filter(|(_, failed)| **failed)
            .map(|(collection, _)| collection.name.clone())
            .collect();

        let merged: Vec<SearchResult> = per_collection.into_iter().flatten().flatten().collect();
        let results = rank(merged, &term, self.settings.max_results);

        tracing::info!(
            %term,
            results = results.len(),
            queried = queried_collections,
            failed = failed_collections.len(),
            "search completed"
        );

        let response = SearchResponse {
            term: term.as_str().to_string(),
            results,
            failed_collections,
            queried_collections,
        };

        if let Some(cache) = &self.cache {
            if !response.is_partial() {
                cache.insert(term.key(), Arc::new(response.clone()));
            }
        }
        response
    }
}
