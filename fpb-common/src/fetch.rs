//! Storage fetch abstraction
//!
//! The core never talks to cloud storage directly; it consumes a
//! `fetch(object) -> bytes` interface. `GcsFetcher` reads public objects
//! over HTTPS the way the original deployment does; `MemoryFetcher`
//! backs tests and local development.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("fpb/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Storage fetch errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The object does not exist in the bucket
    #[error("object not found: {0}")]
    NotFound(String),

    /// Network or server failure
    #[error("storage error: {0}")]
    Io(String),
}

/// Fetch one named object from storage as raw bytes
#[async_trait]
pub trait StorageFetcher: Send + Sync {
    async fn fetch(&self, object: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetcher for public Google Cloud Storage objects
/// (`{base_url}/{bucket}/{object}`, unauthenticated GET)
pub struct GcsFetcher {
    http: reqwest::Client,
    base: String,
}

impl GcsFetcher {
    pub fn new(base_url: &str, bucket: &str) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Io(e.to_string()))?;

        Ok(Self {
            http,
            base: format!("{}/{}", base_url.trim_end_matches('/'), bucket),
        })
    }
}

#[async_trait]
impl StorageFetcher for GcsFetcher {
    async fn fetch(&self, object: &str) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/{}", self.base, object);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(object.to_string()));
        }
        if !response.status().is_success() {
            return Err(FetchError::Io(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Io(e.to_string()))
    }
}

/// In-memory fetcher for tests and local development
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    objects: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object's bytes
    pub fn with_object(mut self, object: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(object.to_string(), bytes.into());
        self
    }

    /// Make an object fail with an I/O error instead of not-found
    pub fn with_failure(mut self, object: &str) -> Self {
        self.failing.insert(object.to_string());
        self
    }
}

#[async_trait]
impl StorageFetcher for MemoryFetcher {
    async fn fetch(&self, object: &str) -> Result<Vec<u8>, FetchError> {
        if self.failing.contains(object) {
            return Err(FetchError::Io(format!("simulated failure: {}", object)));
        }
        self.objects
            .get(object)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(object.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_fetcher_returns_bytes() {
        let fetcher = MemoryFetcher::new().with_object("a.csv", "NAME\nx.jpg\n");
        let bytes = fetcher.fetch("a.csv").await.unwrap();
        assert_eq!(bytes, b"NAME\nx.jpg\n");
    }

    #[tokio::test]
    async fn test_memory_fetcher_not_found() {
        let fetcher = MemoryFetcher::new();
        assert_eq!(
            fetcher.fetch("missing.csv").await,
            Err(FetchError::NotFound("missing.csv".to_string()))
        );
    }

    #[tokio::test]
    async fn test_memory_fetcher_simulated_failure() {
        let fetcher = MemoryFetcher::new().with_failure("broken.csv");
        assert!(matches!(
            fetcher.fetch("broken.csv").await,
            Err(FetchError::Io(_))
        ));
    }

    #[test]
    fn test_gcs_fetcher_builds() {
        let fetcher = GcsFetcher::new("https://storage.googleapis.com/", "bucket").unwrap();
        assert_eq!(fetcher.base, "https://storage.googleapis.com/bucket");
    }
}
