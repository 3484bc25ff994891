use std::time::Duration;

use thiserror::Error;

/// Why a single collection contributed nothing to a search.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("query on `{collection}` failed: {message}")]
    Query { collection: String, message: String },

    #[error("query on `{collection}` timed out after {after:?}")]
    Timeout { collection: String, after: Duration },
}

impl SourceError {
    pub fn query(collection: impl Into<String>, err: impl std::fmt::Display) -> Self {
        SourceError::Query {
            collection: collection.into(),
            message: err.to_string(),
        }
    }
}
