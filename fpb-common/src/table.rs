//! Table and photo-record models
//!
//! Source tables are spreadsheet-like: a header row naming columns plus
//! data rows. Column names are normalized (trimmed, upper-cased) before
//! any lookup. Three columns are required; any column whose normalized
//! name contains the token `CHARACTER` is a character field, discovered
//! once when the table is loaded rather than re-scanned per filter call.

use serde::Serialize;
use std::path::Path;

/// Required column: free-text photo description
pub const COL_DESCRIPTION: &str = "DESCRIPTION";
/// Required column: year the photo was taken (text as stored)
pub const COL_YEAR: &str = "YEAR";
/// Required column: photo filename within the source's folder
pub const COL_NAME: &str = "NAME";
/// Token marking a character (person) column, matched after normalization
pub const CHARACTER_TOKEN: &str = "CHARACTER";

/// Normalize a raw column name: trim surrounding whitespace and upper-case
pub fn normalize_column(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Derive the numeric year from stored year text.
///
/// Accepts integer text or float text truncated toward zero ("2001.0"
/// parses as 2001). Anything else is a missing year: it sorts last and is
/// excluded from year-threshold comparisons.
pub fn parse_year(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(year) = trimmed.parse::<i64>() {
        return Some(year);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value as i64),
        _ => None,
    }
}

/// Media kind of a photo file, classified by filename extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

/// Classify a filename by its extension (case-insensitive)
pub fn media_kind(filename: &str) -> MediaKind {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff") => MediaKind::Image,
        Some("mp4" | "avi" | "mov" | "mkv") => MediaKind::Video,
        _ => MediaKind::Other,
    }
}

/// One character field: the normalized column name and its stored text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterField {
    pub column: String,
    pub value: String,
}

/// One row of a source table, before unification assigns a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    pub description: String,
    pub year: String,
    pub characters: Vec<CharacterField>,
    /// Trimmed photo filename; never empty for rows that survive loading
    pub filename: String,
}

/// One parsed source table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTable {
    pub source_id: String,
    /// Character columns discovered in the header, in column order
    pub character_columns: Vec<String>,
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row of unified metadata: a source row tagged with its photo folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoRecord {
    pub description: String,
    /// Year text as stored; the numeric year is derived on demand
    pub year: String,
    /// Character fields in column order, including empty values
    pub characters: Vec<CharacterField>,
    pub filename: String,
    /// Photo-storage folder of the originating source, fixed at load time
    pub folder: String,
}

impl PhotoRecord {
    /// Derived numeric year; `None` when missing or unparseable
    pub fn year_number(&self) -> Option<i64> {
        parse_year(&self.year)
    }

    /// Integer year rendered for display, empty when missing
    pub fn display_year(&self) -> String {
        self.year_number().map(|y| y.to_string()).unwrap_or_default()
    }

    /// Non-empty character values in column order, for display
    pub fn character_roster(&self) -> Vec<&str> {
        self.characters
            .iter()
            .map(|c| c.value.trim())
            .filter(|v| !v.is_empty())
            .collect()
    }

    pub fn media_kind(&self) -> MediaKind {
        media_kind(&self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column() {
        assert_eq!(normalize_column("  description "), "DESCRIPTION");
        assert_eq!(normalize_column("Character 1"), "CHARACTER 1");
        assert_eq!(normalize_column("YEAR"), "YEAR");
    }

    #[test]
    fn test_parse_year_integer() {
        assert_eq!(parse_year("2001"), Some(2001));
        assert_eq!(parse_year(" 1987 "), Some(1987));
        assert_eq!(parse_year("-1"), Some(-1));
    }

    #[test]
    fn test_parse_year_float_truncates() {
        assert_eq!(parse_year("2001.0"), Some(2001));
        assert_eq!(parse_year("1999.9"), Some(1999));
    }

    #[test]
    fn test_parse_year_missing() {
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("  "), None);
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year("NaN"), None);
        assert_eq!(parse_year("inf"), None);
    }

    #[test]
    fn test_media_kind() {
        assert_eq!(media_kind("family.JPG"), MediaKind::Image);
        assert_eq!(media_kind("trip.png"), MediaKind::Image);
        assert_eq!(media_kind("wedding.mp4"), MediaKind::Video);
        assert_eq!(media_kind("notes.txt"), MediaKind::Other);
        assert_eq!(media_kind("no_extension"), MediaKind::Other);
    }

    #[test]
    fn test_display_year() {
        let mut record = record_with_year("2001.0");
        assert_eq!(record.display_year(), "2001");
        record.year = "unknown".to_string();
        assert_eq!(record.display_year(), "");
    }

    #[test]
    fn test_character_roster_skips_empty() {
        let record = PhotoRecord {
            description: String::new(),
            year: String::new(),
            characters: vec![
                CharacterField {
                    column: "CHARACTER 1".into(),
                    value: "Ana".into(),
                },
                CharacterField {
                    column: "CHARACTER 2".into(),
                    value: "  ".into(),
                },
                CharacterField {
                    column: "CHARACTER 3".into(),
                    value: "Luis".into(),
                },
            ],
            filename: "a.jpg".into(),
            folder: "F".into(),
        };
        assert_eq!(record.character_roster(), vec!["Ana", "Luis"]);
    }

    fn record_with_year(year: &str) -> PhotoRecord {
        PhotoRecord {
            description: String::new(),
            year: year.to_string(),
            characters: Vec::new(),
            filename: "a.jpg".into(),
            folder: "F".into(),
        }
    }
}
