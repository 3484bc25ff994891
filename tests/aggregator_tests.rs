use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lexsearch::aggregator::SearchAggregator;
use lexsearch::catalog::{SourceCollection, collections, default_registry};
use lexsearch::config::SearchSettings;
use lexsearch::data_models::{Category, RawRecord};
use lexsearch::error::SourceError;
use lexsearch::memory::MemorySource;
use lexsearch::source::{CollectionQuery, RecordSource};

mod test_helpers {
    use super::*;

    pub fn records(values: Vec<Value>) -> Vec<RawRecord> {
        values
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect()
    }

    /// Wraps a memory source, records every collection it is asked for and
    /// fails, stalls or panics on the configured ones.
    #[derive(Default)]
    pub struct ScriptedSource {
        pub inner: MemorySource,
        pub failing: HashSet<String>,
        pub stalled: HashSet<String>,
        pub panicking: HashSet<String>,
        pub calls: AtomicUsize,
        pub queried: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        pub fn new(inner: MemorySource) -> Self {
            Self {
                inner,
                ..Self::default()
            }
        }

        pub fn failing(mut self, collection: &str) -> Self {
            self.failing.insert(collection.to_string());
            self
        }

        pub fn stalled(mut self, collection: &str) -> Self {
            self.stalled.insert(collection.to_string());
            self
        }

        pub fn panicking(mut self, collection: &str) -> Self {
            self.panicking.insert(collection.to_string());
            self
        }

        pub fn queried(&self) -> Vec<String> {
            let mut names = self.queried.lock().unwrap().clone();
            names.sort();
            names
        }
    }

    impl RecordSource for ScriptedSource {
        async fn select(&self, query: &CollectionQuery) -> Result<Vec<RawRecord>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queried.lock().unwrap().push(query.collection.clone());
            if self.failing.contains(&query.collection) {
                return Err(SourceError::query(&query.collection, "connection reset"));
            }
            if self.panicking.contains(&query.collection) {
                panic!("driver bug while reading {}", query.collection);
            }
            if self.stalled.contains(&query.collection) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.inner.select(query).await
        }
    }

    pub fn scenario_registry() -> Vec<SourceCollection> {
        vec![
            SourceCollection::new("videos", Category::Video, "Videoaula")
                .title("Aula")
                .body("Descrição"),
            SourceCollection::new("statutes", Category::Statute, "Vade Mecum")
                .title("Número do Artigo")
                .body("Artigo"),
            SourceCollection::new("books", Category::Book, "Biblioteca")
                .title("livro")
                .body("sobre"),
        ]
    }

    pub fn scenario_source() -> MemorySource {
        MemorySource::new()
            .with_collection(
                "videos",
                records(vec![json!({ "id": 1, "Aula": "Contratos Diversos", "Descrição": "parte geral" })]),
            )
            .with_collection(
                "statutes",
                records(vec![json!({
                    "id": 565,
                    "Número do Artigo": "Art. 565",
                    "Artigo": "Na locação de coisas... contrato de locação",
                })]),
            )
            .with_collection(
                "books",
                records(vec![json!({ "id": 9, "livro": "Direito Penal", "sobre": "crimes em espécie" })]),
            )
    }

    pub fn aggregator<S: RecordSource>(
        source: S,
        registry: Vec<SourceCollection>,
    ) -> SearchAggregator<S> {
        SearchAggregator::new(source, registry, SearchSettings::default())
    }

    pub fn ids(response: &lexsearch::aggregator::SearchResponse) -> Vec<String> {
        response.results.iter().map(|r| r.id.clone()).collect()
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_contrato_scenario() {
    let aggregator = aggregator(scenario_source(), scenario_registry());

    let response = aggregator.search("contrato").await;

    assert_eq!(ids(&response), vec!["videos-1", "statutes-565"]);
    assert_eq!(response.results[0].category, Category::Video);
    assert_eq!(response.results[1].category, Category::Statute);
    assert_eq!(response.queried_collections, 3);
    assert!(!response.is_partial());
}

#[tokio::test]
async fn test_short_terms_never_reach_the_source() {
    let source = Arc::new(ScriptedSource::new(scenario_source()));

    let aggregator = aggregator(Arc::clone(&source), scenario_registry());
    aggregator.search("ab").await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);

    aggregator.search("abc").await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_blog_is_only_queried_for_blog_terms() {
    let registry = default_registry();
    let mut inner = MemorySource::new();
    for collection in &registry {
        inner.insert(&collection.name, Vec::new());
    }
    let source = Arc::new(ScriptedSource::new(inner));

    let aggregator = aggregator(Arc::clone(&source), registry);

    let response = aggregator.search("prescrição").await;
    assert_eq!(response.queried_collections, 9);
    assert!(!source.queried().contains(&collections::BLOG.to_string()));

    let response = aggregator.search("jusblog atualização").await;
    assert_eq!(response.queried_collections, 10);
    assert!(source.queried().contains(&collections::BLOG.to_string()));
}

#[tokio::test]
async fn test_failed_collection_equals_omitting_it() {
    let failing = aggregator(
        ScriptedSource::new(scenario_source()).failing("videos"),
        scenario_registry(),
    );
    let without: Vec<SourceCollection> = scenario_registry()
        .into_iter()
        .filter(|c| c.name != "videos")
        .collect();
    let omitted = aggregator(scenario_source(), without);

    let with_failure = failing.search("contrato").await;
    let reference = omitted.search("contrato").await;

    assert_eq!(with_failure.results, reference.results);
    assert_eq!(with_failure.failed_collections, vec!["videos"]);
    assert!(with_failure.is_partial());
}

#[tokio::test]
async fn test_panicking_collection_is_reported_as_failed() {
    let source = ScriptedSource::new(scenario_source()).panicking("statutes");
    let aggregator = aggregator(source, scenario_registry());

    let response = aggregator.search("contrato").await;
    assert_eq!(ids(&response), vec!["videos-1"]);
    assert_eq!(response.failed_collections, vec!["statutes"]);
    assert_eq!(response.queried_collections, 3);
}

#[tokio::test]
async fn test_panics_are_attributed_to_their_own_collection() {
    let source = ScriptedSource::new(scenario_source())
        .panicking("videos")
        .failing("books");
    let aggregator = aggregator(source, scenario_registry());

    let response = aggregator.search("contrato").await;
    assert_eq!(ids(&response), vec!["statutes-565"]);
    assert_eq!(response.failed_collections, vec!["videos", "books"]);
}

#[tokio::test]
async fn test_unkeyed_rows_do_not_shadow_keyed_ones() {
    let source = MemorySource::new()
        .with_collection(
            "videos",
            records(vec![
                json!({ "id": 1, "Aula": "Contrato A" }),
                json!({ "Aula": "Contrato B" }),
            ]),
        )
        .with_collection("statutes", Vec::new())
        .with_collection("books", Vec::new());
    let aggregator = aggregator(source, scenario_registry());

    let response = aggregator.search("contrato").await;
    assert_eq!(response.total_count(), 2);
    assert_eq!(ids(&response), vec!["videos-1", "videos-#1"]);
}

#[tokio::test]
async fn test_total_failure_degrades_to_empty() {
    let source = ScriptedSource::new(scenario_source())
        .failing("videos")
        .failing("statutes")
        .failing("books");
    let aggregator = aggregator(source, scenario_registry());

    let response = aggregator.search("contrato").await;
    assert!(response.results.is_empty());
    assert_eq!(response.failed_collections.len(), 3);
}

#[tokio::test]
async fn test_timed_out_collection_is_a_failure() {
    let source = ScriptedSource::new(scenario_source()).stalled("statutes");
    let settings = SearchSettings {
        query_timeout: Duration::from_millis(50),
        ..SearchSettings::default()
    };
    let aggregator = SearchAggregator::new(source, scenario_registry(), settings);

    let response = aggregator.search("contrato").await;
    assert_eq!(ids(&response), vec!["videos-1"]);
    assert_eq!(response.failed_collections, vec!["statutes"]);
}

#[tokio::test]
async fn test_results_are_capped_at_one_hundred() {
    let rows: Vec<Value> = (0..80)
        .map(|i| json!({ "id": i, "Aula": format!("Contrato {i}") }))
        .collect();
    let more: Vec<Value> = (0..80)
        .map(|i| json!({ "id": i, "livro": "Obra", "sobre": format!("contrato {i}") }))
        .collect();
    let source = MemorySource::new()
        .with_collection("videos", records(rows))
        .with_collection("statutes", Vec::new())
        .with_collection("books", records(more));
    let settings = SearchSettings {
        collection_limit: 0,
        ..SearchSettings::default()
    };
    let aggregator = SearchAggregator::new(source, scenario_registry(), settings);

    let response = aggregator.search("contrato").await;
    assert_eq!(response.total_count(), 100);
    assert!(response.results[..80].iter().all(|r| r.collection == "videos"));
}

#[tokio::test]
async fn test_title_matches_precede_body_matches() {
    let source = MemorySource::new()
        .with_collection(
            "videos",
            records(vec![json!({ "id": 1, "Aula": "Locação", "Descrição": "contrato" })]),
        )
        .with_collection("statutes", Vec::new())
        .with_collection(
            "books",
            records(vec![json!({ "id": 2, "livro": "Teoria do Contrato", "sobre": "" })]),
        );
    let aggregator = aggregator(source, scenario_registry());

    let response = aggregator.search("contrato").await;
    assert_eq!(ids(&response), vec!["books-2", "videos-1"]);

    let title_matched = response
        .results
        .iter()
        .position(|r| !r.title.to_lowercase().contains("contrato"))
        .unwrap();
    assert!(
        response.results[title_matched..]
            .iter()
            .all(|r| !r.title.to_lowercase().contains("contrato"))
    );
}

#[tokio::test]
async fn test_priority_categories_precede_others() {
    let registry = vec![
        SourceCollection::new("news", Category::News, "Notícia").title("t").body("b"),
        SourceCollection::new("articles", Category::Article, "Artigo").title("t").body("b"),
        SourceCollection::new("summaries", Category::Summary, "Resumo").title("t").body("b"),
        SourceCollection::new("audio", Category::Audio, "Audioaula").title("t").body("b"),
    ];
    let mut source = MemorySource::new();
    for collection in &registry {
        source.insert(
            &collection.name,
            records(vec![json!({ "id": 1, "t": "x", "b": "usucapião" })]),
        );
    }
    let aggregator = aggregator(source, registry);

    let response = aggregator.search("usucapião").await;
    assert_eq!(
        ids(&response),
        vec!["summaries-1", "articles-1", "news-1", "audio-1"]
    );
}

#[tokio::test]
async fn test_identical_searches_are_idempotent() {
    let aggregator = aggregator(scenario_source(), scenario_registry());

    let first = aggregator.search("contrato").await;
    let second = aggregator.search("contrato").await;
    assert_eq!(first.results, second.results);
}

#[tokio::test]
async fn test_grouping_view_keeps_ranked_order() {
    let aggregator = aggregator(scenario_source(), scenario_registry());

    let response = aggregator.search("contrato").await;
    let groups = response.grouped_by_category();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&Category::Video][0].id, "videos-1");
    assert_eq!(groups[&Category::Statute][0].id, "statutes-565");
}

#[tokio::test]
async fn test_cache_serves_repeat_searches_but_not_partial_ones() {
    let settings = SearchSettings {
        cache_ttl: Duration::from_secs(60),
        ..SearchSettings::default()
    };

    let aggregator = SearchAggregator::new(scenario_source(), scenario_registry(), settings.clone());
    aggregator.search("Contrato").await;
    let cache = aggregator.cache().unwrap();
    assert_eq!(cache.len(), 1);
    let cached = aggregator.search("contrato").await;
    assert_eq!(ids(&cached), vec!["videos-1", "statutes-565"]);

    let partial = SearchAggregator::new(
        ScriptedSource::new(scenario_source()).failing("books"),
        scenario_registry(),
        settings,
    );
    partial.search("contrato").await;
    assert!(partial.cache().unwrap().is_empty());
}

#[tokio::test]
async fn test_cache_does_not_grow_past_live_terms() {
    let settings = SearchSettings {
        cache_ttl: Duration::from_millis(1),
        ..SearchSettings::default()
    };
    let aggregator = SearchAggregator::new(scenario_source(), scenario_registry(), settings);

    for i in 0..200 {
        aggregator.search(&format!("contrato {i}")).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    aggregator.search("contrato").await;

    assert_eq!(aggregator.cache().unwrap().len(), 1);
}
