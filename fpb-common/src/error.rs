//! Common error types for FPB

use thiserror::Error;

/// Common result type for FPB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error for FPB operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source table load error
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Query validation or execution error
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
}

/// Failure to load one source table.
///
/// Load errors are local to their source: a multi-source query skips the
/// failing source and continues with the rest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The table object does not exist in the storage bucket
    #[error("source table not found: {0}")]
    NotFound(String),

    /// The table is missing one or more required columns
    #[error("source table {source_id} is missing required columns: {}", missing.join(", "))]
    MissingColumns {
        source_id: String,
        /// Required columns absent after normalization
        missing: Vec<String>,
        /// Columns that were actually found, for diagnostics
        found: Vec<String>,
    },

    /// Fetch or parse failure for the table object
    #[error("failed to load source table {source_id}: {message}")]
    Io { source_id: String, message: String },
}

/// Caller-level query validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Character mode requires a non-empty search term; rejected before
    /// the filter engine runs
    #[error("a search term is required when searching by character")]
    EmptyCriterion,

    /// Every source in the requested order failed to load or was empty
    #[error("no source tables could be loaded for this query")]
    NoSourcesLoaded,

    /// The selection id names neither a source nor a global query
    #[error("unknown source selection: {0}")]
    UnknownSelection(String),
}
