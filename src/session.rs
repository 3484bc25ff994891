use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::aggregator::{SearchAggregator, SearchResponse};
use crate::data_models::{Category, SearchResult, SearchTerm};
use crate::source::RecordSource;

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    Success,
    PartialFailure,
}

/// What a consumer renders: the active term and the latest accepted results.
#[derive(Serialize, Debug, Clone, Default)]
pub struct SearchView {
    pub term: String,
    pub phase: SearchPhase,
    pub results: Vec<SearchResult>,
    pub grouped_by_category: BTreeMap<Category, Vec<SearchResult>>,
    pub is_loading: bool,
    pub total_count: usize,
    pub failed_collections: Vec<String>,
}

impl SearchView {
    fn idle(term: String) -> Self {
        Self {
            term,
            ..Self::default()
        }
    }

    fn settle(&mut self, response: SearchResponse) {
        self.phase = if response.is_partial() {
            SearchPhase::PartialFailure
        } else {
            SearchPhase::Success
        };
        self.grouped_by_category = response.grouped_by_category();
        self.total_count = response.total_count();
        self.results = response.results;
        self.failed_collections = response.failed_collections;
        self.is_loading = false;
    }
}

/// Observable search state bound to a single search box.
///
/// Every `search`/`clear` bumps a generation counter. A response is applied
/// only if no newer request has started and the displayed term is still the
/// one it was computed for, so a slow earlier query can never overwrite a
/// later one.
pub struct SearchSession<S> {
    aggregator: Arc<SearchAggregator<S>>,
    generation: AtomicU64,
    state: watch::Sender<SearchView>,
}

impl<S: RecordSource> SearchSession<S> {
    pub fn new(aggregator: Arc<SearchAggregator<S>>) -> Self {
        let (state, _) = watch::channel(SearchView::default());
        Self {
            aggregator,
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn snapshot(&self) -> SearchView {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.state.subscribe()
    }

    /// Runs a search for `term` and publishes it unless superseded.
    /// Returns whether the response was applied.
    pub async fn search(&self, term: &str) -> bool {
        let display_term = term.trim().to_string();
        let runnable = SearchTerm::parse(term).is_some();

        // the generation bump and the term write share the watch lock
        let mut generation = 0;
        self.state.send_modify(|view| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if runnable {
                view.term = display_term.clone();
                view.phase = SearchPhase::Searching;
                view.is_loading = true;
            } else {
                *view = SearchView::idle(display_term.clone());
            }
        });
        if !runnable {
            return true;
        }

        let response = self.aggregator.search(term).await;

        let applied = self.state.send_if_modified(|view| {
            let current = self.generation.load(Ordering::SeqCst) == generation;
            if !current || view.term != display_term {
                return false;
            }
            view.settle(response);
            true
        });
        if !applied {
            tracing::debug!(term = %display_term, generation, "discarding stale search response");
        }
        applied
    }

    /// Fire-and-forget variant of [`SearchSession::search`].
    pub fn spawn_search(self: &Arc<Self>, term: String) -> JoinHandle<bool> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.search(&term).await })
    }

    /// Resets to an empty idle view and invalidates in-flight searches.
    pub fn clear(&self) {
        self.state.send_modify(|view| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *view = SearchView::default();
        });
    }
}
