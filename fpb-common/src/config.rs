//! Configuration loading and source registry
//!
//! Configuration resolves in priority order:
//! 1. Explicit path (command-line argument, highest priority)
//! 2. `FPB_CONFIG` environment variable (handled by the binary's CLI layer)
//! 3. Per-user config file (`<config dir>/fpb/config.toml`)
//! 4. Compiled-in default registry (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

fn default_base_url() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

/// One source: a spreadsheet-like table object plus its photo folder
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    /// Selection id (e.g. "1")
    pub id: String,
    /// Display name (e.g. "CONER FAMILY")
    pub name: String,
    /// Object name of the metadata table within the bucket
    pub table_object: String,
    /// Folder within the bucket holding this source's photos
    pub photo_folder: String,
}

/// One global query: a caller-specified load order over source ids
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GlobalQueryConfig {
    /// Selection id (e.g. "41")
    pub id: String,
    /// Display name
    pub name: String,
    /// Source ids in unification order; the index is the source rank
    pub load_order: Vec<String>,
}

/// FPB configuration: storage location plus the source registry
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Cloud storage bucket holding tables and photo folders
    pub bucket: String,

    /// Base URL for public object access
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Time-to-live for cached table parses, in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Individual sources
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,

    /// Global (multi-source) queries
    #[serde(default, rename = "global_query")]
    pub global_queries: Vec<GlobalQueryConfig>,
}

impl Config {
    /// Resolve configuration from an optional explicit path, falling back
    /// to the per-user config file and then the compiled-in default.
    pub fn resolve(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(dir) = dirs::config_dir() {
            let path = dir.join("fpb").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::builtin())
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Compiled-in default registry matching the original deployment:
    /// three family sources and three global orderings over them.
    pub fn builtin() -> Config {
        Config {
            bucket: "fotosfamilialfve".to_string(),
            base_url: default_base_url(),
            cache_ttl_secs: default_cache_ttl(),
            sources: vec![
                SourceConfig {
                    id: "1".to_string(),
                    name: "CONER FAMILY".to_string(),
                    table_object: "t_fotos_coner.csv".to_string(),
                    photo_folder: "FOTOSCO".to_string(),
                },
                SourceConfig {
                    id: "2".to_string(),
                    name: "VELASCO ESPINOSA FAMILY".to_string(),
                    table_object: "fotos.csv".to_string(),
                    photo_folder: "FOTOSVE".to_string(),
                },
                SourceConfig {
                    id: "3".to_string(),
                    name: "VELASCO ENDARA FAMILY".to_string(),
                    table_object: "hijos.csv".to_string(),
                    photo_folder: "HIJOS".to_string(),
                },
            ],
            global_queries: vec![
                GlobalQueryConfig {
                    id: "41".to_string(),
                    name: "GLOBAL QUERY (order 1, 2, 3)".to_string(),
                    load_order: vec!["1".into(), "2".into(), "3".into()],
                },
                GlobalQueryConfig {
                    id: "42".to_string(),
                    name: "GLOBAL QUERY (order 2, 1, 3)".to_string(),
                    load_order: vec!["2".into(), "1".into(), "3".into()],
                },
                GlobalQueryConfig {
                    id: "43".to_string(),
                    name: "GLOBAL QUERY (order 3, 1, 2)".to_string(),
                    load_order: vec!["3".into(), "1".into(), "2".into()],
                },
            ],
        }
    }

    /// Look up an individual source by selection id
    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Look up a global query by selection id
    pub fn global_query(&self, id: &str) -> Option<&GlobalQueryConfig> {
        self.global_queries.iter().find(|q| q.id == id)
    }

    /// Public URL for a resolved (folder, filename) pair
    pub fn photo_url(&self, folder: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            folder.trim_matches('/'),
            filename
        )
    }

    fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("bucket must not be empty".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for source in &self.sources {
            if !seen.insert(&source.id) {
                return Err(Error::Config(format!("duplicate source id: {}", source.id)));
            }
        }
        for query in &self.global_queries {
            if !seen.insert(&query.id) {
                return Err(Error::Config(format!("duplicate selection id: {}", query.id)));
            }
        }
        Ok(())
    }
}
