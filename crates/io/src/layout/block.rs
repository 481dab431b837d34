// Column-per-product block layout.
//
// Each product occupies one column of a band: a name row, one or two code
// rows, then the row its picture sits in. Bands repeat down the sheet.

use shelfline_core::config::LayoutConfig;
use shelfline_core::{CellPos, CodePattern};

use super::collect::RowCollector;
use super::header::find_header_row;
use super::{LayoutKind, StrategyOutcome};
use crate::workbook::Grid;

/// A row holding product codes side by side: at least two code cells, and at
/// most one stray text cell per four codes.
fn is_code_row(grid: &Grid, pattern: &CodePattern, r: usize) -> bool {
    let mut codes = 0;
    let mut text = 0;
    for cell in grid.row(r).iter().filter(|c| !c.is_empty()) {
        if pattern.is_code(cell) {
            codes += 1;
        } else {
            text += 1;
        }
    }
    codes >= 2 && text * 4 <= codes
}

/// Block layout applies when no header appears in the early rows and one of
/// them carries codes in two or more columns.
pub(crate) fn detect(grid: &Grid, pattern: &CodePattern, cfg: &LayoutConfig) -> bool {
    if find_header_row(grid, pattern, cfg.block_scan_rows).is_some() {
        return false;
    }
    (0..grid.height().min(cfg.block_scan_rows)).any(|r| is_code_row(grid, pattern, r))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Band {
    name_row: Option<usize>,
    code_rows: Vec<usize>,
    image_row: usize,
}

fn find_bands(grid: &Grid, pattern: &CodePattern) -> Vec<Band> {
    let mut bands = Vec::new();
    let mut floor = 0;
    let mut r = 0;
    while r < grid.height() {
        if !is_code_row(grid, pattern, r) {
            r += 1;
            continue;
        }
        let mut code_rows = vec![r];
        if r + 1 < grid.height() && is_code_row(grid, pattern, r + 1) {
            code_rows.push(r + 1);
        }
        let last = code_rows[code_rows.len() - 1];

        // Name row: nearest filled row above, within two rows and below the
        // previous band.
        let name_row = (floor..r)
            .rev()
            .take(2)
            .find(|&above| grid.filled(above) > 0);

        bands.push(Band {
            name_row,
            code_rows,
            image_row: last + 1,
        });
        floor = last + 2;
        r = last + 1;
    }
    bands
}

pub(crate) fn extract(grid: &Grid, pattern: &CodePattern) -> StrategyOutcome {
    let bands = find_bands(grid, pattern);
    log::debug!("block layout: {} band(s)", bands.len());

    let mut collector = RowCollector::new(pattern);
    for band in &bands {
        for c in 0..grid.width() {
            // First code row with a valid code in this column, else the first
            // non-blank one so the failure gets recorded.
            let source_row = band
                .code_rows
                .iter()
                .copied()
                .find(|&r| pattern.is_code(grid.cell(r, c)))
                .or_else(|| band.code_rows.iter().copied().find(|&r| !grid.cell(r, c).is_empty()))
                .unwrap_or(band.code_rows[0]);

            let name = band.name_row.map_or("", |r| grid.cell(r, c));
            collector.offer(
                grid.cell(source_row, c),
                name,
                CellPos::new(source_row, c),
                Some(CellPos::new(band.image_row, c)),
            );
        }
    }

    let (rows, skipped) = collector.finish();
    StrategyOutcome {
        kind: LayoutKind::Block,
        rows,
        skipped,
        columns: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::from_rows(rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect())
    }

    fn sheet() -> Grid {
        grid(&[
            &["Rye bread", "Pretzel", "Baguette"],
            &["4011", "4012", "4013"],
            &[],
            &[],
            &["Croissant", "Muffin, blueberry", ""],
            &["4021", "4022", ""],
            &["123456789", "", ""],
        ])
    }

    #[test]
    fn detects_headerless_code_rows() {
        let pattern = CodePattern::default();
        let cfg = LayoutConfig::default();
        assert!(detect(&sheet(), &pattern, &cfg));

        let with_header = grid(&[&["PLU", "Name"], &["4011", "4012"]]);
        assert!(!detect(&with_header, &pattern, &cfg));

        // Abbreviations inside product names do not make a header
        let numbered = grid(&[&["Bread No 5", "Bread No 7", "Roll"], &["4011", "4012", "4013"]]);
        assert!(detect(&numbered, &pattern, &cfg));
        assert_eq!(extract(&numbered, &pattern).rows[0].display_name, "Bread No 5");
    }

    #[test]
    fn bands_with_second_code_row() {
        let bands = find_bands(&sheet(), &CodePattern::default());
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0], Band { name_row: Some(0), code_rows: vec![1], image_row: 2 });
        // Row 6 has one code cell only, so the second band has one code row
        assert_eq!(bands[1], Band { name_row: Some(4), code_rows: vec![5], image_row: 6 });
    }

    #[test]
    fn one_product_per_column() {
        let out = extract(&sheet(), &CodePattern::default());
        let got: Vec<(&str, &str)> = out.rows.iter().map(|r| (r.code.as_str(), r.display_name.as_str())).collect();
        assert_eq!(
            got,
            vec![
                ("04011", "Rye bread"),
                ("04012", "Pretzel"),
                ("04013", "Baguette"),
                ("04021", "Croissant"),
                ("04022", "Muffin"),
            ]
        );
        assert_eq!(out.rows[4].image_position, Some(CellPos::new(6, 1)));
        assert!(out.skipped.is_empty());
    }
}
