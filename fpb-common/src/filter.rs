//! Filter Engine: text predicate plus year threshold with fallback
//!
//! Filtering runs in two stages. The text stage scans either the
//! description field or the union of all character fields. The year stage
//! keeps rows from the nearest available year at or after the requested
//! year, signalling a notice when the nearest year is later than asked.
//!
//! Single-source queries with a year filter re-sort the final rows by
//! numeric year alone, overriding the canonical order. Multi-source
//! queries never do, even under identical inputs. The asymmetry is
//! deliberate and must not be "fixed".

use crate::sort::year_sort;
use crate::table::PhotoRecord;
use serde::{Deserialize, Serialize};

/// Which field(s) the text criterion scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Match against the description field; an empty criterion matches all
    Description,
    /// Match against any character field; requires a non-empty criterion
    Character,
}

/// Non-fatal signals raised while filtering, surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterNotice {
    /// No photos at the requested year; results start at the nearest
    /// later year instead
    YearAdjusted { requested: i64, found: i64 },
    /// The year text did not parse as an integer; the year filter was
    /// skipped
    YearTextIgnored { text: String },
}

/// The filtered, ordered result set plus any notices
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub records: Vec<PhotoRecord>,
    pub notices: Vec<FilterNotice>,
}

/// Apply the two-stage filter. `individual` marks a single-source query,
/// which opts into the year re-sort special case.
pub fn apply(
    records: &[PhotoRecord],
    mode: FilterMode,
    criterion: &str,
    year_text: &str,
    individual: bool,
) -> FilterOutcome {
    let needle = criterion.to_lowercase();

    let mut kept: Vec<PhotoRecord> = match mode {
        FilterMode::Description => {
            if criterion.is_empty() {
                records.to_vec()
            } else {
                records
                    .iter()
                    .filter(|r| r.description.to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            }
        }
        FilterMode::Character => {
            if criterion.is_empty() {
                // Caller-level validation rejects this before the engine
                // runs; an empty criterion never matches anything here
                Vec::new()
            } else {
                records
                    .iter()
                    .filter(|r| {
                        r.characters
                            .iter()
                            .any(|c| c.value.to_lowercase().contains(&needle))
                    })
                    .cloned()
                    .collect()
            }
        }
    };

    // Nothing survived the text stage: year filtering is skipped entirely
    if kept.is_empty() {
        return FilterOutcome::default();
    }

    let mut notices = Vec::new();

    if !year_text.is_empty() {
        match year_text.trim().parse::<i64>() {
            Ok(requested) => {
                let found = kept
                    .iter()
                    .filter_map(|r| r.year_number())
                    .filter(|y| *y >= requested)
                    .min();

                match found {
                    Some(found) => {
                        // Keep rows relative to the nearest available year,
                        // not the requested one; rows without a numeric
                        // year drop out here
                        kept.retain(|r| r.year_number().map_or(false, |y| y >= found));
                        if found > requested {
                            notices.push(FilterNotice::YearAdjusted { requested, found });
                        }
                    }
                    None => kept.clear(),
                }
            }
            Err(_) => notices.push(FilterNotice::YearTextIgnored {
                text: year_text.to_string(),
            }),
        }
    }

    // The gate is the raw year text, not whether it parsed
    if individual && !year_text.is_empty() && !kept.is_empty() {
        year_sort(&mut kept);
    }

    FilterOutcome {
        records: kept,
        notices,
    }
}
