//! Layout detection and row extraction.
//!
//! Each strategy is an independent function from a [`Grid`] to a
//! [`StrategyOutcome`]. [`parse_sheet`] runs them in priority order and
//! compares outcomes explicitly; it never fails, however malformed the sheet.

mod banded;
mod block;
mod collect;
mod header;

use std::fmt;

use serde::Serialize;
use shelfline_core::config::LayoutConfig;
use shelfline_core::{
    name_collisions, CodePattern, IngestConfig, NameCollision, NormalizedRow, SkipCounts, SkippedRowRecord,
};

use crate::workbook::Grid;

pub use header::HeaderColumns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// Column-per-product blocks.
    Block,
    /// Repeated text-row/code-row pairs.
    Banded,
    /// One product per row under a header.
    Header,
}

impl LayoutKind {
    /// Lower is preferred when outcomes otherwise tie.
    fn priority(self) -> u8 {
        match self {
            Self::Block => 0,
            Self::Banded => 1,
            Self::Header => 2,
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => write!(f, "block"),
            Self::Banded => write!(f, "banded"),
            Self::Header => write!(f, "header"),
        }
    }
}

/// Result of one strategy run plus what is needed to rank it.
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub kind: LayoutKind,
    pub rows: Vec<NormalizedRow>,
    pub skipped: Vec<SkippedRowRecord>,
    /// Only the header strategy detects columns.
    pub columns: Option<HeaderColumns>,
}

impl StrategyOutcome {
    pub(crate) fn empty(kind: LayoutKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
            skipped: Vec::new(),
            columns: None,
        }
    }

    pub fn skip_counts(&self) -> SkipCounts {
        SkipCounts::tally(&self.skipped)
    }

    /// More rows wins, then fewer skips, then strategy priority.
    pub fn beats(&self, other: &StrategyOutcome) -> bool {
        let key = |o: &StrategyOutcome| (std::cmp::Reverse(o.rows.len()), o.skipped.len(), o.kind.priority());
        key(self) < key(other)
    }
}

/// Parsed sheet: rows and their diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedSheet {
    pub layout: LayoutKind,
    pub rows: Vec<NormalizedRow>,
    pub skipped: Vec<SkippedRowRecord>,
    pub skip_counts: SkipCounts,
    pub name_collisions: Vec<NameCollision>,
    pub columns: Option<HeaderColumns>,
}

impl From<StrategyOutcome> for ParsedSheet {
    fn from(outcome: StrategyOutcome) -> Self {
        Self {
            layout: outcome.kind,
            skip_counts: SkipCounts::tally(&outcome.skipped),
            name_collisions: name_collisions(&outcome.rows),
            rows: outcome.rows,
            skipped: outcome.skipped,
            columns: outcome.columns,
        }
    }
}

fn pick(a: StrategyOutcome, b: StrategyOutcome) -> StrategyOutcome {
    if b.beats(&a) {
        b
    } else {
        a
    }
}

/// Choose a layout and extract rows.
///
/// Block layout runs first when detected; if it yields nothing or skips more
/// than `block_skip_ratio` times what it produced, the header layout is run
/// and the better of the two kept. The banded layout is the last resort when
/// the header layout produced nothing and either found no columns or
/// recorded at least `banded_min_invalid` invalid codes.
pub fn select_layout(grid: &Grid, pattern: &CodePattern, cfg: &LayoutConfig) -> StrategyOutcome {
    let mut header_run: Option<(usize, bool)> = None;
    let mut run_header = || {
        let outcome = header::extract(grid, pattern, cfg);
        header_run = Some((outcome.skip_counts().invalid_code, outcome.columns.is_some()));
        outcome
    };

    let best = if block::detect(grid, pattern, cfg) {
        let block = block::extract(grid, pattern);
        let produced = block.rows.len();
        if produced == 0 || block.skipped.len() > cfg.block_skip_ratio * produced {
            log::debug!(
                "block layout produced {} row(s) with {} skip(s); trying header layout",
                produced,
                block.skipped.len()
            );
            pick(block, run_header())
        } else {
            block
        }
    } else {
        run_header()
    };

    if !best.rows.is_empty() {
        return best;
    }
    match header_run {
        Some((invalid, found_columns)) if invalid >= cfg.banded_min_invalid || !found_columns => {
            log::debug!("header layout produced nothing ({} invalid codes); trying banded layout", invalid);
            pick(best, banded::extract(grid, pattern, cfg))
        }
        _ => best,
    }
}

/// Detect the layout of a grid and extract its rows.
pub fn parse_sheet(grid: &Grid, cfg: &IngestConfig) -> ParsedSheet {
    let pattern = CodePattern::from(&cfg.code);
    let parsed = ParsedSheet::from(select_layout(grid, &pattern, &cfg.layout));
    log::info!(
        "layout {}: {} row(s), skipped {} (invalid code {}, empty name {}, duplicate {}), {} name collision(s)",
        parsed.layout,
        parsed.rows.len(),
        parsed.skip_counts.total(),
        parsed.skip_counts.invalid_code,
        parsed.skip_counts.empty_name,
        parsed.skip_counts.duplicate_code,
        parsed.name_collisions.len()
    );
    parsed
}
