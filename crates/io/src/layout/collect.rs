use std::collections::HashMap;

use shelfline_core::{clean_name, is_padding, CellPos, CodePattern, NormalizedRow, SkipReason, SkippedRowRecord};

/// Validates candidate rows for one strategy run and keeps the first
/// occurrence of every code.
pub(crate) struct RowCollector<'a> {
    pattern: &'a CodePattern,
    rows: Vec<NormalizedRow>,
    skipped: Vec<SkippedRowRecord>,
    first_seen: HashMap<String, CellPos>,
}

impl<'a> RowCollector<'a> {
    pub fn new(pattern: &'a CodePattern) -> Self {
        Self {
            pattern,
            rows: Vec::new(),
            skipped: Vec::new(),
            first_seen: HashMap::new(),
        }
    }

    /// Offer one candidate. Blank code and blank name together is not a row.
    /// Otherwise checks run in order: code, name, duplicate.
    pub fn offer(&mut self, raw_code: &str, raw_name: &str, source: CellPos, image: Option<CellPos>) {
        if raw_code.trim().is_empty() && raw_name.trim().is_empty() {
            return;
        }

        let Some(code) = self.pattern.normalize(raw_code) else {
            self.skip(source, SkipReason::InvalidCode, None);
            return;
        };

        let name = clean_name(raw_name);
        if is_padding(&name) {
            self.skip(source, SkipReason::EmptyName, None);
            return;
        }

        if let Some(first) = self.first_seen.get(&code) {
            let first = *first;
            self.skip(source, SkipReason::DuplicateCode, Some(first));
            return;
        }

        self.first_seen.insert(code.clone(), source);
        self.rows.push(NormalizedRow {
            code,
            display_name: name,
            source_position: source,
            image_position: image,
        });
    }

    fn skip(&mut self, position: CellPos, reason: SkipReason, duplicate_of: Option<CellPos>) {
        self.skipped.push(SkippedRowRecord {
            position,
            reason,
            duplicate_of,
        });
    }

    pub fn finish(self) -> (Vec<NormalizedRow>, Vec<SkippedRowRecord>) {
        (self.rows, self.skipped)
    }
}
