use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::data_models::RawRecord;
use crate::error::SourceError;

/// A single collection lookup: rows whose `fields` contain `pattern`
/// (case-insensitive, any field may match), sorted by `order_by`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    pub collection: String,
    pub fields: Vec<String>,
    pub pattern: String,
    pub order_by: Option<String>,
    pub limit: Option<usize>,
}

impl CollectionQuery {
    /// Evaluates the OR-of-ILIKE predicate against an in-memory record.
    pub fn matches(&self, record: &RawRecord) -> bool {
        let needle = self.pattern.to_lowercase();
        self.fields.iter().any(|field| {
            record
                .get(field)
                .map(|value| value_as_text(value).to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
    }
}

/// The data-store capability the aggregator depends on.
pub trait RecordSource: Send + Sync + 'static {
    fn select(
        &self,
        query: &CollectionQuery,
    ) -> impl Future<Output = Result<Vec<RawRecord>, SourceError>> + Send;
}

impl<S: RecordSource> RecordSource for Arc<S> {
    fn select(
        &self,
        query: &CollectionQuery,
    ) -> impl Future<Output = Result<Vec<RawRecord>, SourceError>> + Send {
        (**self).select(query)
    }
}

/// Renders scalar JSON values as text; null and composite values become empty.
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
