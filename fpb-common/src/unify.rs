//! Unifier: merge source tables in caller-specified order
//!
//! Each source's rows are tagged with that source's photo folder and its
//! rank in the load order, concatenated preserving per-source row order,
//! then canonically sorted. Sources that fail to load or are empty are
//! skipped; only all sources failing is fatal. The helper keys (rank,
//! derived year) never appear in the returned records.

use crate::config::SourceConfig;
use crate::error::QueryError;
use crate::loader::TableLoader;
use crate::sort::{canonical_sort, RankedRecord};
use crate::table::PhotoRecord;
use tracing::{debug, warn};

/// Load and unify the given sources in order; the index in `sources` is
/// the source rank used as a sort tie-breaker.
pub async fn unify(
    loader: &TableLoader,
    sources: &[&SourceConfig],
) -> Result<Vec<PhotoRecord>, QueryError> {
    let mut rows: Vec<RankedRecord> = Vec::new();
    let mut survivors = 0usize;

    for (rank, source) in sources.iter().enumerate() {
        let table = match loader.load(source).await {
            Ok(table) => table,
            Err(e) => {
                warn!(source_id = %source.id, error = %e, "skipping source");
                continue;
            }
        };
        if table.is_empty() {
            debug!(source_id = %source.id, "skipping empty source table");
            continue;
        }

        survivors += 1;
        rows.extend(table.rows.iter().map(|row| {
            RankedRecord::new(
                PhotoRecord {
                    description: row.description.clone(),
                    year: row.year.clone(),
                    characters: row.characters.clone(),
                    filename: row.filename.clone(),
                    folder: source.photo_folder.clone(),
                },
                rank,
            )
        }));
    }

    if survivors == 0 {
        return Err(QueryError::NoSourcesLoaded);
    }

    canonical_sort(&mut rows);
    Ok(rows.into_iter().map(|r| r.record).collect())
}
