use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Zero-based cell position. Orders row-major (row first, then column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellPos {
    /// Spreadsheet-style address, e.g. `B7` for (6, 1).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut col = self.col + 1;
        let mut letters = Vec::new();
        while col > 0 {
            let rem = (col - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            col = (col - 1) / 26;
        }
        let letters: String = letters.into_iter().rev().collect();
        write!(f, "{}{}", letters, self.row + 1)
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One validated catalogue row.
///
/// `code` is always normalized to the configured fixed-length numeric form
/// and unique within the parse run that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub code: String,
    pub display_name: String,
    /// Cell the code was read from.
    pub source_position: CellPos,
    /// Cell where the layout expects this row's picture, if any.
    pub image_position: Option<CellPos>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidCode,
    EmptyName,
    DuplicateCode,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCode => write!(f, "invalid_code"),
            Self::EmptyName => write!(f, "empty_name"),
            Self::DuplicateCode => write!(f, "duplicate_code"),
        }
    }
}

/// A candidate row that did not make it into the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRowRecord {
    pub position: CellPos,
    pub reason: SkipReason,
    /// For duplicates: where the kept first occurrence lives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<CellPos>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub invalid_code: usize,
    pub empty_name: usize,
    pub duplicate_code: usize,
}

impl SkipCounts {
    pub fn tally(skipped: &[SkippedRowRecord]) -> Self {
        let mut counts = Self::default();
        for s in skipped {
            match s.reason {
                SkipReason::InvalidCode => counts.invalid_code += 1,
                SkipReason::EmptyName => counts.empty_name += 1,
                SkipReason::DuplicateCode => counts.duplicate_code += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.invalid_code + self.empty_name + self.duplicate_code
    }
}

/// One display name carried by two or more distinct codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCollision {
    pub name: String,
    pub codes: Vec<String>,
}

/// Group rows by exact display name and report names with 2+ distinct codes.
/// Output is sorted by name; codes within an entry are sorted.
pub fn name_collisions(rows: &[NormalizedRow]) -> Vec<NameCollision> {
    let mut by_name: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for row in rows {
        by_name
            .entry(row.display_name.as_str())
            .or_default()
            .insert(row.code.as_str());
    }

    by_name
        .into_iter()
        .filter(|(_, codes)| codes.len() >= 2)
        .map(|(name, codes)| NameCollision {
            name: name.to_string(),
            codes: codes.into_iter().map(str::to_string).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, name: &str, r: usize) -> NormalizedRow {
        NormalizedRow {
            code: code.into(),
            display_name: name.into(),
            source_position: CellPos::new(r, 0),
            image_position: None,
        }
    }

    #[test]
    fn cell_address_display() {
        assert_eq!(CellPos::new(0, 0).to_string(), "A1");
        assert_eq!(CellPos::new(6, 1).to_string(), "B7");
        assert_eq!(CellPos::new(9, 26).to_string(), "AA10");
    }

    #[test]
    fn positions_order_row_major() {
        let mut v = vec![CellPos::new(2, 0), CellPos::new(1, 5), CellPos::new(1, 2)];
        v.sort();
        assert_eq!(v, vec![CellPos::new(1, 2), CellPos::new(1, 5), CellPos::new(2, 0)]);
    }

    #[test]
    fn skip_counts_tally() {
        let skipped = vec![
            SkippedRowRecord { position: CellPos::new(1, 0), reason: SkipReason::InvalidCode, duplicate_of: None },
            SkippedRowRecord { position: CellPos::new(2, 0), reason: SkipReason::InvalidCode, duplicate_of: None },
            SkippedRowRecord {
                position: CellPos::new(3, 0),
                reason: SkipReason::DuplicateCode,
                duplicate_of: Some(CellPos::new(0, 0)),
            },
        ];
        let counts = SkipCounts::tally(&skipped);
        assert_eq!(counts.invalid_code, 2);
        assert_eq!(counts.duplicate_code, 1);
        assert_eq!(counts.empty_name, 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn collisions_need_two_distinct_codes() {
        let rows = vec![
            row("10000", "Apple", 0),
            row("10001", "Apple", 1),
            row("20000", "Pear", 2),
            row("30000", "apple", 3), // exact-name grouping; case matters
        ];
        let report = name_collisions(&rows);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].name, "Apple");
        assert_eq!(report[0].codes, vec!["10000", "10001"]);
    }

    #[test]
    fn skipped_record_omits_empty_back_pointer() {
        let rec = SkippedRowRecord { position: CellPos::new(4, 2), reason: SkipReason::EmptyName, duplicate_of: None };
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"position":{"row":4,"col":2},"reason":"empty_name"}"#);
    }
}
