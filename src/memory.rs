use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::data_models::RawRecord;
use crate::error::SourceError;
use crate::source::{CollectionQuery, RecordSource, value_as_text};

/// Process-local record store. Applies the same OR-of-substring filter the
/// database source does, which makes it usable for offline serving and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: HashMap<String, Vec<RawRecord>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: &str, records: Vec<RawRecord>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(records);
    }

    pub fn with_collection(mut self, collection: &str, records: Vec<RawRecord>) -> Self {
        self.insert(collection, records);
        self
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    pub fn records(&self, collection: &str) -> &[RawRecord] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Loads every `<collection>.json` file in `dir`; each must hold a JSON
    /// array of objects.
    pub fn from_json_dir(dir: &Path) -> Result<Self> {
        let mut source = Self::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read fixture directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let rows: Vec<Value> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            let records: Vec<RawRecord> = rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            tracing::info!(collection = name, records = records.len(), "loaded fixture collection");
            source.insert(name, records);
        }
        Ok(source)
    }
}

impl RecordSource for MemorySource {
    async fn select(&self, query: &CollectionQuery) -> Result<Vec<RawRecord>, SourceError> {
        // an absent collection reads as empty, as it does in MongoDB
        let rows = self.records(&query.collection);

        let mut matched: Vec<RawRecord> = rows.iter().filter(|r| query.matches(r)).cloned().collect();
        if let Some(order_by) = &query.order_by {
            matched.sort_by(|a, b| compare_order(a.get(order_by), b.get(order_by)));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }
}

/// Ascending order as MongoDB sorts mixed values: missing first, then
/// numbers by value (integers and floats alike), then text.
fn compare_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(_) => 2,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
            x.total_cmp(&y)
        }
        (Some(x), Some(y)) if rank(a) == 2 && rank(b) == 2 => value_as_text(x).cmp(&value_as_text(y)),
        _ => rank(a).cmp(&rank(b)),
    }
}
