//! Table Loader: fetch, parse, validate, and cache source tables
//!
//! Fetches raw bytes through the storage collaborator, parses them into a
//! header-plus-rows table, validates the required columns, and caches
//! successful parses per source id for a configurable TTL. Failed loads
//! are never cached, so the next call retries.
//!
//! Two wire formats are accepted, selected by the object name:
//! - `.json`: a JSON grid `[[header, ...], [row, ...], ...]`
//! - anything else: CSV with a header line and double-quote quoting

use crate::config::SourceConfig;
use crate::error::LoadError;
use crate::fetch::{FetchError, StorageFetcher};
use crate::table::{
    normalize_column, CharacterField, SourceRow, SourceTable, CHARACTER_TOKEN, COL_DESCRIPTION,
    COL_NAME, COL_YEAR,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Cache status for one loaded source table
#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub source_id: String,
    pub rows: usize,
    pub loaded_at: DateTime<Utc>,
}

struct CacheEntry {
    table: Arc<SourceTable>,
    loaded_at: Instant,
    loaded_at_utc: DateTime<Utc>,
}

/// Loads and caches source tables
pub struct TableLoader {
    fetcher: Arc<dyn StorageFetcher>,
    ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl TableLoader {
    pub fn new(fetcher: Arc<dyn StorageFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load one source table, reusing the cached parse within the TTL window
    pub async fn load(&self, source: &SourceConfig) -> Result<Arc<SourceTable>, LoadError> {
        if let Some(table) = self.cached(&source.id).await {
            return Ok(table);
        }

        let bytes = self
            .fetcher
            .fetch(&source.table_object)
            .await
            .map_err(|e| match e {
                FetchError::NotFound(object) => LoadError::NotFound(object),
                FetchError::Io(message) => LoadError::Io {
                    source_id: source.id.clone(),
                    message,
                },
            })?;

        let table = Arc::new(parse_table(&source.id, &source.table_object, &bytes)?);
        debug!(
            source_id = %source.id,
            rows = table.rows.len(),
            "loaded source table"
        );

        let mut cache = self.cache.write().await;
        match cache.get(&source.id) {
            // Another caller repopulated the entry while we were parsing
            Some(entry) if entry.loaded_at.elapsed() < self.ttl => {}
            _ => {
                cache.insert(
                    source.id.clone(),
                    CacheEntry {
                        table: Arc::clone(&table),
                        loaded_at: Instant::now(),
                        loaded_at_utc: Utc::now(),
                    },
                );
            }
        }

        Ok(table)
    }

    /// Cache status of every currently loaded table
    pub async fn status(&self) -> Vec<TableStatus> {
        let cache = self.cache.read().await;
        let mut statuses: Vec<TableStatus> = cache
            .iter()
            .map(|(id, entry)| TableStatus {
                source_id: id.clone(),
                rows: entry.table.rows.len(),
                loaded_at: entry.loaded_at_utc,
            })
            .collect();
        statuses.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        statuses
    }

    async fn cached(&self, source_id: &str) -> Option<Arc<SourceTable>> {
        let cache = self.cache.read().await;
        cache
            .get(source_id)
            .filter(|entry| entry.loaded_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.table))
    }
}

/// Parse raw table bytes into a validated `SourceTable`
fn parse_table(source_id: &str, object: &str, bytes: &[u8]) -> Result<SourceTable, LoadError> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{FEFF}');

    let grid = if object.to_ascii_lowercase().ends_with(".json") {
        parse_json_grid(source_id, text)?
    } else {
        parse_csv_grid(text)
    };

    let Some(header) = grid.first() else {
        // Genuinely empty table: skipped by the unifier, not an error
        return Ok(SourceTable {
            source_id: source_id.to_string(),
            character_columns: Vec::new(),
            rows: Vec::new(),
        });
    };

    let columns: Vec<String> = header.iter().map(|c| normalize_column(c)).collect();

    let required = [COL_DESCRIPTION, COL_YEAR, COL_NAME];
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !columns.iter().any(|col| col == *c))
        .map(|c| c.to_string())
        .collect();

    if !missing.is_empty() {
        warn!(
            source_id = %source_id,
            missing = ?missing,
            found = ?columns,
            "source table is missing required columns"
        );
        return Err(LoadError::MissingColumns {
            source_id: source_id.to_string(),
            missing,
            found: columns,
        });
    }

    let index_of = |name: &str| columns.iter().position(|c| c == name);
    let description_idx = index_of(COL_DESCRIPTION);
    let year_idx = index_of(COL_YEAR);
    let name_idx = index_of(COL_NAME);

    let character_columns: Vec<String> = columns
        .iter()
        .filter(|c| c.contains(CHARACTER_TOKEN))
        .cloned()
        .collect();
    let character_indices: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.contains(CHARACTER_TOKEN))
        .map(|(i, _)| i)
        .collect();

    let cell = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for raw in grid.iter().skip(1) {
        let filename = cell(raw, name_idx).trim().to_string();
        if filename.is_empty() {
            dropped += 1;
            continue;
        }

        let characters = character_indices
            .iter()
            .zip(character_columns.iter())
            .map(|(&idx, column)| CharacterField {
                column: column.clone(),
                value: raw.get(idx).cloned().unwrap_or_default(),
            })
            .collect();

        rows.push(SourceRow {
            description: cell(raw, description_idx),
            year: cell(raw, year_idx),
            characters,
            filename,
        });
    }

    if dropped > 0 {
        debug!(
            source_id = %source_id,
            dropped,
            "dropped rows without a photo filename"
        );
    }

    Ok(SourceTable {
        source_id: source_id.to_string(),
        character_columns,
        rows,
    })
}

fn parse_json_grid(source_id: &str, text: &str) -> Result<Vec<Vec<String>>, LoadError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| LoadError::Io {
        source_id: source_id.to_string(),
        message: format!("invalid JSON grid: {}", e),
    })
}

fn parse_csv_grid(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(split_csv_line)
        .collect()
}

/// Split one CSV line, honoring double-quoted fields with `""` escapes
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CSV: &str = "\
Description,Year,Name,Character 1,Character 2
Beach trip,2001,beach.jpg,Ana,Luis
Birthday,2003.0,party.jpg,Luis,
No file,2004,,Ana,
";

    fn source(id: &str, object: &str) -> SourceConfig {
        SourceConfig {
            id: id.to_string(),
            name: format!("SOURCE {}", id),
            table_object: object.to_string(),
            photo_folder: format!("FOLDER{}", id),
        }
    }

    fn loader_with(fetcher: MemoryFetcher) -> TableLoader {
        TableLoader::new(Arc::new(fetcher), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_load_csv_table() {
        let loader = loader_with(MemoryFetcher::new().with_object("a.csv", CSV));
        let table = loader.load(&source("1", "a.csv")).await.unwrap();

        assert_eq!(table.character_columns, vec!["CHARACTER 1", "CHARACTER 2"]);
        // Row without a filename is dropped
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].filename, "beach.jpg");
        assert_eq!(table.rows[0].description, "Beach trip");
        assert_eq!(table.rows[1].year, "2003.0");
        assert_eq!(table.rows[0].characters[0].value, "Ana");
    }

    #[tokio::test]
    async fn test_load_json_grid() {
        let grid = serde_json::json!([
            ["Name", "Year", "Description"],
            ["a.jpg", "1999", "First"],
            ["b.jpg", "", "Second"]
        ]);
        let loader =
            loader_with(MemoryFetcher::new().with_object("t.json", grid.to_string()));
        let table = loader.load(&source("1", "t.json")).await.unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].filename, "b.jpg");
        assert!(table.character_columns.is_empty());
    }

    #[tokio::test]
    async fn test_missing_columns() {
        let loader =
            loader_with(MemoryFetcher::new().with_object("bad.csv", "Name,Notes\na.jpg,x\n"));
        let err = loader.load(&source("1", "bad.csv")).await.unwrap_err();

        match err {
            LoadError::MissingColumns {
                source_id,
                missing,
                found,
            } => {
                assert_eq!(source_id, "1");
                assert_eq!(missing, vec!["DESCRIPTION", "YEAR"]);
                assert_eq!(found, vec!["NAME", "NOTES"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_object_is_empty_table() {
        let loader = loader_with(MemoryFetcher::new().with_object("empty.csv", ""));
        let table = loader.load(&source("1", "empty.csv")).await.unwrap();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_not_found() {
        let loader = loader_with(MemoryFetcher::new());
        let err = loader.load(&source("1", "gone.csv")).await.unwrap_err();
        assert_eq!(err, LoadError::NotFound("gone.csv".to_string()));
    }

    struct CountingFetcher {
        inner: MemoryFetcher,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl StorageFetcher for CountingFetcher {
        async fn fetch(&self, object: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(object).await
        }
    }

    #[tokio::test]
    async fn test_cache_reuses_parse_within_ttl() {
        let fetcher = Arc::new(CountingFetcher {
            inner: MemoryFetcher::new().with_object("a.csv", CSV),
            calls: AtomicUsize::new(0),
        });
        let loader = TableLoader::new(
            Arc::clone(&fetcher) as Arc<dyn StorageFetcher>,
            Duration::from_secs(3600),
        );

        let src = source("1", "a.csv");
        loader.load(&src).await.unwrap();
        loader.load(&src).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let fetcher = Arc::new(CountingFetcher {
            inner: MemoryFetcher::new().with_object("a.csv", CSV),
            calls: AtomicUsize::new(0),
        });
        let loader =
            TableLoader::new(Arc::clone(&fetcher) as Arc<dyn StorageFetcher>, Duration::ZERO);

        let src = source("1", "a.csv");
        loader.load(&src).await.unwrap();
        loader.load(&src).await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let fetcher = Arc::new(CountingFetcher {
            inner: MemoryFetcher::new().with_failure("a.csv"),
            calls: AtomicUsize::new(0),
        });
        let loader = TableLoader::new(
            Arc::clone(&fetcher) as Arc<dyn StorageFetcher>,
            Duration::from_secs(3600),
        );

        let src = source("1", "a.csv");
        assert!(loader.load(&src).await.is_err());
        assert!(loader.load(&src).await.is_err());

        // Both attempts hit storage: failures are retried, not cached
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(loader.status().await.is_empty());
    }

    #[test]
    fn test_split_csv_line_quoting() {
        assert_eq!(
            split_csv_line(r#"plain,"with, comma","say ""hi""""#),
            vec!["plain", "with, comma", r#"say "hi""#]
        );
    }
}
