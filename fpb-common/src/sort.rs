//! Deterministic ordering of unified rows
//!
//! The canonical order is (numeric year ascending with missing years last,
//! source rank ascending, filename ascending), stable so rows with equal
//! keys keep their input order. The year-only re-sort backs the filter
//! engine's single-source special case.

use crate::table::PhotoRecord;

/// A photo record tagged with the sort helper keys attached during
/// unification and dropped before the unified table is returned
#[derive(Debug, Clone)]
pub struct RankedRecord {
    pub record: PhotoRecord,
    /// Index of the originating source in the caller-specified load order
    pub source_rank: usize,
    /// Derived numeric year, computed once per row
    pub year: Option<i64>,
}

impl RankedRecord {
    pub fn new(record: PhotoRecord, source_rank: usize) -> Self {
        let year = record.year_number();
        Self {
            record,
            source_rank,
            year,
        }
    }
}

/// Missing years order after every real year
fn year_key(year: Option<i64>) -> (bool, i64) {
    match year {
        Some(y) => (false, y),
        None => (true, 0),
    }
}

/// Canonical stable sort: year, then source rank, then filename
pub fn canonical_sort(rows: &mut [RankedRecord]) {
    rows.sort_by(|a, b| {
        year_key(a.year)
            .cmp(&year_key(b.year))
            .then_with(|| a.source_rank.cmp(&b.source_rank))
            .then_with(|| a.record.filename.cmp(&b.record.filename))
    });
}

/// Stable re-sort by numeric year alone, missing years last
pub fn year_sort(records: &mut [PhotoRecord]) {
    records.sort_by_key(|r| year_key(r.year_number()));
}
