use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        mongo_uri: get_env_or_default("MONGO_URI", "mongodb://localhost:27017"),
        mongo_db_name: get_env_or_default("MONGO_DB_NAME", "lexsearch"),
        bind_addr: get_env_or_default("SEARCH_BIND", "127.0.0.1:3000"),
        search: SearchSettings {
            query_timeout: Duration::from_millis(parse_env_or("SEARCH_QUERY_TIMEOUT_MS", 5_000)),
            max_results: parse_env_or("SEARCH_MAX_RESULTS", 100),
            collection_limit: parse_env_or("SEARCH_COLLECTION_LIMIT", 50),
            cache_ttl: Duration::from_secs(parse_env_or("SEARCH_CACHE_TTL_SECS", 60)),
        },
    }
});

pub struct Config {
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub bind_addr: String,
    pub search: SearchSettings,
}

/// Knobs for a single aggregation run.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Per-collection query budget; an expired query counts as a failure.
    pub query_timeout: Duration,
    /// Cap applied after ranking.
    pub max_results: usize,
    /// Rows requested from each collection.
    pub collection_limit: usize,
    /// Zero disables the result cache.
    pub cache_ttl: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(5),
            max_results: 100,
            collection_limit: 50,
            cache_ttl: Duration::ZERO,
        }
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, %default, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
