//! Browse session: one user's query state
//!
//! Replaces the original's ambient per-screen state with one explicit
//! context object. Opening a session resolves the selection, loads and
//! unifies its sources, and holds the unified base table for the life of
//! the session. Each filter run replaces the result set wholesale and
//! resets the cursor; picking a different selection means opening a new
//! session.

use crate::config::Config;
use crate::error::{Error, QueryError};
use crate::filter::{self, FilterMode, FilterNotice};
use crate::loader::TableLoader;
use crate::navigate::Navigator;
use crate::table::PhotoRecord;
use crate::unify;
use tracing::warn;

/// Whether a session browses one source or a unified global query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    Individual,
    Global,
}

/// Per-session query state
#[derive(Debug)]
pub struct BrowseSession {
    selection_id: String,
    selection_name: String,
    scope: QueryScope,
    mode: FilterMode,
    criterion: String,
    year_text: String,
    base: Vec<PhotoRecord>,
    nav: Navigator,
    notices: Vec<FilterNotice>,
}

impl BrowseSession {
    /// Open a session for a selection id: an individual source id or a
    /// global query id. Loads and unifies the selection's sources.
    pub async fn open(config: &Config, loader: &TableLoader, selection: &str) -> Result<Self, Error> {
        let (name, scope, base) = if let Some(source) = config.source(selection) {
            let base = unify::unify(loader, &[source]).await?;
            (source.name.clone(), QueryScope::Individual, base)
        } else if let Some(query) = config.global_query(selection) {
            let sources: Vec<_> = query
                .load_order
                .iter()
                .filter_map(|id| {
                    let source = config.source(id);
                    if source.is_none() {
                        warn!(source_id = %id, query_id = %query.id, "unknown source id in load order");
                    }
                    source
                })
                .collect();
            let base = unify::unify(loader, &sources).await?;
            (query.name.clone(), QueryScope::Global, base)
        } else {
            return Err(QueryError::UnknownSelection(selection.to_string()).into());
        };

        Ok(Self {
            selection_id: selection.to_string(),
            selection_name: name,
            scope,
            mode: FilterMode::Description,
            criterion: String::new(),
            year_text: String::new(),
            base,
            nav: Navigator::default(),
            notices: Vec::new(),
        })
    }

    /// Run the filter engine over the base table and install the result
    /// set. Character mode with an empty criterion is rejected here,
    /// before the engine runs.
    pub fn run_filter(&mut self, criterion: &str, year_text: &str) -> Result<(), QueryError> {
        if self.mode == FilterMode::Character && criterion.is_empty() {
            return Err(QueryError::EmptyCriterion);
        }

        let outcome = filter::apply(
            &self.base,
            self.mode,
            criterion,
            year_text,
            self.scope == QueryScope::Individual,
        );

        for notice in &outcome.notices {
            match notice {
                FilterNotice::YearAdjusted { requested, found } => warn!(
                    requested,
                    found, "no photos at the requested year; showing the nearest later year"
                ),
                FilterNotice::YearTextIgnored { text } => {
                    warn!(year_text = %text, "year text is not a number; ignoring the year filter")
                }
            }
        }

        self.criterion = criterion.to_string();
        self.year_text = year_text.to_string();
        self.notices = outcome.notices;
        self.nav.install(outcome.records);
        Ok(())
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
    }

    pub fn step(&mut self, direction: i64) -> usize {
        self.nav.step(direction)
    }

    pub fn reset(&mut self) -> usize {
        self.nav.reset()
    }

    pub fn current_record(&self) -> Option<&PhotoRecord> {
        self.nav.current()
    }

    pub fn current_index(&self) -> usize {
        self.nav.index()
    }

    pub fn total(&self) -> usize {
        self.nav.total()
    }

    pub fn result_set(&self) -> &[PhotoRecord] {
        self.nav.results()
    }

    pub fn notices(&self) -> &[FilterNotice] {
        &self.notices
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn scope(&self) -> QueryScope {
        self.scope
    }

    pub fn selection_id(&self) -> &str {
        &self.selection_id
    }

    pub fn selection_name(&self) -> &str {
        &self.selection_name
    }

    /// Rows in the unified base table, before any filtering
    pub fn base_rows(&self) -> usize {
        self.base.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GlobalQueryConfig, SourceConfig};
    use crate::fetch::MemoryFetcher;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            bucket: "bucket".to_string(),
            base_url: "https://storage.example.com".to_string(),
            cache_ttl_secs: 3600,
            sources: vec![
                SourceConfig {
                    id: "1".into(),
                    name: "FIRST".into(),
                    table_object: "first.csv".into(),
                    photo_folder: "FIRST".into(),
                },
                SourceConfig {
                    id: "2".into(),
                    name: "SECOND".into(),
                    table_object: "second.csv".into(),
                    photo_folder: "SECOND".into(),
                },
            ],
            global_queries: vec![GlobalQueryConfig {
                id: "41".into(),
                name: "ALL".into(),
                load_order: vec!["2".into(), "1".into()],
            }],
        }
    }

    fn test_loader() -> TableLoader {
        let fetcher = MemoryFetcher::new()
            .with_object(
                "first.csv",
                "Description,Year,Name,Character 1\n\
                 Beach,2001,beach.jpg,Ana\n\
                 Party,2003,party.jpg,Luis\n",
            )
            .with_object(
                "second.csv",
                "Description,Year,Name,Character 1\n\
                 Wedding,2002,wedding.jpg,Marta\n",
            );
        TableLoader::new(Arc::new(fetcher), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_open_individual_session() {
        let config = test_config();
        let loader = test_loader();

        let session = BrowseSession::open(&config, &loader, "1").await.unwrap();
        assert_eq!(session.scope(), QueryScope::Individual);
        assert_eq!(session.selection_name(), "FIRST");
        assert_eq!(session.base_rows(), 2);
        assert_eq!(session.total(), 0);
    }

    #[tokio::test]
    async fn test_open_global_session_unifies() {
        let config = test_config();
        let loader = test_loader();

        let session = BrowseSession::open(&config, &loader, "41").await.unwrap();
        assert_eq!(session.scope(), QueryScope::Global);
        assert_eq!(session.base_rows(), 3);
    }

    #[tokio::test]
    async fn test_open_unknown_selection() {
        let config = test_config();
        let loader = test_loader();

        let err = BrowseSession::open(&config, &loader, "99").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Query(QueryError::UnknownSelection(_))
        ));
    }

    #[tokio::test]
    async fn test_character_mode_requires_criterion() {
        let config = test_config();
        let loader = test_loader();

        let mut session = BrowseSession::open(&config, &loader, "1").await.unwrap();
        session.set_mode(FilterMode::Character);

        assert_eq!(
            session.run_filter("", "").unwrap_err(),
            QueryError::EmptyCriterion
        );
        // The rejected query never replaced the (empty) result set
        assert_eq!(session.total(), 0);
    }

    #[tokio::test]
    async fn test_filter_installs_results_and_resets_cursor() {
        let config = test_config();
        let loader = test_loader();

        let mut session = BrowseSession::open(&config, &loader, "1").await.unwrap();
        session.run_filter("", "").unwrap();
        assert_eq!(session.total(), 2);

        session.step(1);
        assert_eq!(session.current_index(), 1);

        session.run_filter("beach", "").unwrap();
        assert_eq!(session.total(), 1);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.current_record().unwrap().filename, "beach.jpg");
    }
}
