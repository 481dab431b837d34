// Banded multi-row-pair layout: a text row directly above a code row,
// repeated down the sheet with some spacing. Each band is read on its own.

use shelfline_core::config::LayoutConfig;
use shelfline_core::{CellPos, CodePattern};

use super::collect::RowCollector;
use super::{LayoutKind, StrategyOutcome};
use crate::workbook::Grid;

fn counts(grid: &Grid, pattern: &CodePattern, r: usize) -> (usize, usize) {
    let mut codes = 0;
    let mut text = 0;
    for cell in grid.row(r).iter().filter(|c| !c.is_empty()) {
        if pattern.is_code(cell) {
            codes += 1;
        } else {
            text += 1;
        }
    }
    (codes, text)
}

/// Code rows of every band. The first band must start within
/// `band_scan_rows`; later ones may sit anywhere in the sheet, each at least
/// `band_min_gap` rows below the previous one.
pub(crate) fn find_band_rows(grid: &Grid, pattern: &CodePattern, cfg: &LayoutConfig) -> Vec<usize> {
    let mut bands: Vec<usize> = Vec::new();
    for lower in 1..grid.height() {
        if bands.is_empty() && lower >= cfg.band_scan_rows {
            break;
        }
        if let Some(&prev) = bands.last() {
            if lower - prev < cfg.band_min_gap {
                continue;
            }
        }
        let (codes, _) = counts(grid, pattern, lower);
        if codes < cfg.band_min_cells {
            continue;
        }
        let (_, text) = counts(grid, pattern, lower - 1);
        if text >= cfg.band_min_cells {
            bands.push(lower);
        }
    }
    bands
}

pub(crate) fn extract(grid: &Grid, pattern: &CodePattern, cfg: &LayoutConfig) -> StrategyOutcome {
    let bands = find_band_rows(grid, pattern, cfg);
    log::debug!("banded layout: {} band(s)", bands.len());

    let mut collector = RowCollector::new(pattern);
    for &code_row in &bands {
        let name_row = code_row - 1;
        for c in 0..grid.width() {
            collector.offer(
                grid.cell(code_row, c),
                grid.cell(name_row, c),
                CellPos::new(code_row, c),
                Some(CellPos::new(code_row + 1, c)),
            );
        }
    }

    let (rows, skipped) = collector.finish();
    StrategyOutcome {
        kind: LayoutKind::Banded,
        rows,
        skipped,
        columns: None,
    }
}
