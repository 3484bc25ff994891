use anyhow::{Context, Result};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{
    Client, Collection, Database as MongoDatabase,
    bson::{Bson, Document, doc},
};
use serde_json::Value;

use crate::config::CONFIG;
use crate::data_models::RawRecord;
use crate::error::SourceError;
use crate::source::{CollectionQuery, RecordSource};

/// Main database wrapper providing connection management and collection access
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    db: MongoDatabase,
}

impl Database {
    /// Create a new Database instance with custom URI and database name.
    /// Useful for testing with a different database.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let client_options = ClientOptions::parse(uri)
            .await
            .context("Failed to parse MongoDB connection string")?;

        let client =
            Client::with_options(client_options).context("Failed to create MongoDB client")?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("Failed to connect to MongoDB")?;

        tracing::info!(db_name, "connected to MongoDB");

        let db = client.database(db_name);

        Ok(Self { client, db })
    }

    /// Create a Database instance using environment configuration
    pub async fn from_config() -> Result<Self> {
        Self::new(&CONFIG.mongo_uri, &CONFIG.mongo_db_name).await
    }

    /// Get an untyped collection by name
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    /// Get the underlying MongoDB client (for advanced operations)
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Insert raw records into `collection`, returning how many were written.
    pub async fn insert_records(&self, collection: &str, records: &[RawRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let docs = records
            .iter()
            .map(mongodb::bson::to_document)
            .collect::<Result<Vec<Document>, _>>()
            .context("Failed to convert records to BSON")?;

        let result = self
            .collection(collection)
            .insert_many(docs)
            .await
            .with_context(|| format!("Failed to insert records into {collection}"))?;
        Ok(result.inserted_ids.len())
    }
}

/// Escapes regex metacharacters so the term is matched literally.
pub fn escape_regex(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `$or` of case-insensitive regex predicates, one per field.
pub fn build_filter(query: &CollectionQuery) -> Document {
    let pattern = escape_regex(&query.pattern);
    let predicates: Vec<Document> = query
        .fields
        .iter()
        .map(|field| doc! { field.as_str(): { "$regex": pattern.as_str(), "$options": "i" } })
        .collect();
    doc! { "$or": predicates }
}

fn document_to_record(document: Document) -> RawRecord {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}

impl RecordSource for Database {
    async fn select(&self, query: &CollectionQuery) -> Result<Vec<RawRecord>, SourceError> {
        let options = FindOptions::builder()
            .sort(query.order_by.as_ref().map(|field| doc! { field.as_str(): 1 }))
            .limit(query.limit.map(|l| l as i64))
            .build();

        let documents: Vec<Document> = self
            .collection(&query.collection)
            .find(build_filter(query))
            .with_options(options)
            .await
            .map_err(|e| SourceError::query(&query.collection, e))?
            .try_collect()
            .await
            .map_err(|e| SourceError::query(&query.collection, e))?;

        Ok(documents.into_iter().map(document_to_record).collect())
    }
}

// =============================================================================
// Test utilities
// =============================================================================
