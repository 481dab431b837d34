// Classic header-row layout: one product per row, columns found by header
// keyword with content-based fallbacks.

use serde::Serialize;
use shelfline_core::config::LayoutConfig;
use shelfline_core::{CellPos, CodePattern};

use super::collect::RowCollector;
use super::{LayoutKind, StrategyOutcome};
use crate::workbook::Grid;

const IMAGE_TOKENS: &[&str] = &["image", "images", "picture", "pictures", "photo", "img", "bild", "foto", "pic"];

const CODE_TOKENS: &[&str] = &["plu", "code", "sku", "number", "nummer", "artikelnummer", "artnr"];

/// Abbreviations that mark a code column only in a cell made of header
/// keywords ("Item No", "ID"); product names use them too ("Bread No 5").
const SHORT_CODE_TOKENS: &[&str] = &["nr", "no", "id"];

const NAME_TOKENS: &[&str] = &[
    "name",
    "description",
    "descr",
    "product",
    "bezeichnung",
    "artikelbezeichnung",
    "artikel",
    "item",
    "title",
    "text",
    "designation",
    "produkt",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Role {
    Code,
    Name,
    Image,
}

/// Classify a header cell. Image beats Code beats Name when a cell carries
/// tokens for several roles ("Product code" is a code column).
pub(crate) fn header_role(cell: &str) -> Option<Role> {
    let lower = cell.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let has = |set: &[&str]| tokens.iter().any(|t| set.contains(t));
    let all_keywords = tokens
        .iter()
        .all(|t| [IMAGE_TOKENS, CODE_TOKENS, SHORT_CODE_TOKENS, NAME_TOKENS].iter().any(|set| set.contains(t)));

    if has(IMAGE_TOKENS) {
        Some(Role::Image)
    } else if has(CODE_TOKENS) || (has(SHORT_CODE_TOKENS) && all_keywords) {
        Some(Role::Code)
    } else if has(NAME_TOKENS) {
        Some(Role::Name)
    } else {
        None
    }
}

/// Header row within the first `scan_rows` rows: no cell may be a code, and
/// the row needs a code keyword or two distinct roles. The row with the most
/// distinct roles wins, earliest on ties.
pub(crate) fn find_header_row(grid: &Grid, pattern: &CodePattern, scan_rows: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for r in 0..grid.height().min(scan_rows) {
        let cells = grid.row(r);
        if cells.iter().any(|c| pattern.is_code(c)) {
            continue;
        }
        let mut roles: Vec<Role> = cells.iter().filter_map(|c| header_role(c)).collect();
        roles.sort();
        roles.dedup();
        if roles.len() < 2 && !roles.contains(&Role::Code) {
            continue;
        }
        if best.map_or(true, |(_, n)| roles.len() > n) {
            best = Some((r, roles.len()));
        }
    }
    best.map(|(r, _)| r)
}

/// Columns chosen for a header-row sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeaderColumns {
    /// `None` when the sheet has no recognizable header and data starts at
    /// the first row.
    pub header_row: Option<usize>,
    pub code_col: usize,
    pub name_col: usize,
    pub image_col: Option<usize>,
}

impl HeaderColumns {
    fn data_start(&self) -> usize {
        self.header_row.map_or(0, |r| r + 1)
    }
}

/// Leftmost column whose non-empty cells (at least two) in the probe window
/// are all codes.
fn probe_code_column(grid: &Grid, pattern: &CodePattern, start: usize, probe: usize) -> Option<usize> {
    let end = grid.height().min(start + probe);
    (0..grid.width()).find(|&c| {
        let values: Vec<&str> = (start..end).map(|r| grid.cell(r, c)).filter(|v| !v.is_empty()).collect();
        values.len() >= 2 && values.iter().all(|v| pattern.is_code(v))
    })
}

/// Column with the highest average non-code text length in the probe window.
fn probe_name_column(
    grid: &Grid,
    pattern: &CodePattern,
    start: usize,
    cfg: &LayoutConfig,
    exclude: &[usize],
) -> Option<usize> {
    let end = grid.height().min(start + cfg.name_probe_rows);
    let mut best: Option<(usize, f64)> = None;
    for c in (0..grid.width()).filter(|c| !exclude.contains(c)) {
        let lengths: Vec<usize> = (start..end)
            .map(|r| grid.cell(r, c))
            .filter(|v| !v.is_empty() && !pattern.is_code(v))
            .map(|v| v.chars().count())
            .collect();
        if lengths.len() < cfg.name_min_samples {
            continue;
        }
        let avg = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        if best.map_or(true, |(_, b)| avg > b) {
            best = Some((c, avg));
        }
    }
    best.map(|(c, _)| c)
}

pub(crate) fn detect_columns(grid: &Grid, pattern: &CodePattern, cfg: &LayoutConfig) -> Option<HeaderColumns> {
    let header_row = find_header_row(grid, pattern, cfg.header_scan_rows);

    let mut code_col = None;
    let mut name_col = None;
    let mut image_col = None;
    if let Some(r) = header_row {
        for (c, cell) in grid.row(r).iter().enumerate() {
            match header_role(cell) {
                Some(Role::Code) if code_col.is_none() => code_col = Some(c),
                Some(Role::Name) if name_col.is_none() => name_col = Some(c),
                Some(Role::Image) if image_col.is_none() => image_col = Some(c),
                _ => {}
            }
        }
    }

    let start = header_row.map_or(0, |r| r + 1);
    let code_col = match code_col {
        Some(c) => c,
        None => probe_code_column(grid, pattern, start, cfg.code_probe_rows)?,
    };
    let name_col = match name_col {
        Some(c) => c,
        None => {
            let exclude: Vec<usize> = std::iter::once(code_col).chain(image_col).collect();
            probe_name_column(grid, pattern, start, cfg, &exclude)?
        }
    };

    Some(HeaderColumns {
        header_row,
        code_col,
        name_col,
        image_col,
    })
}

pub(crate) fn extract(grid: &Grid, pattern: &CodePattern, cfg: &LayoutConfig) -> StrategyOutcome {
    let Some(columns) = detect_columns(grid, pattern, cfg) else {
        log::debug!("header layout: no code/name column found");
        return StrategyOutcome::empty(LayoutKind::Header);
    };

    let mut collector = RowCollector::new(pattern);
    for r in columns.data_start()..grid.height() {
        collector.offer(
            grid.cell(r, columns.code_col),
            grid.cell(r, columns.name_col),
            CellPos::new(r, columns.code_col),
            columns.image_col.map(|c| CellPos::new(r, c)),
        );
    }

    let (rows, skipped) = collector.finish();
    StrategyOutcome {
        kind: LayoutKind::Header,
        rows,
        skipped,
        columns: Some(columns),
    }
}
