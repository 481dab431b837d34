// Spreadsheet container opening (xlsx, xls, xlsb, ods)
//
// Reads the first populated sheet into a plain text grid. Cell typing is
// flattened the same way for every container format so the layout heuristics
// only ever see strings.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};

use crate::error::IngestError;

/// Dense, row-major grid of trimmed cell text. Out-of-range reads return "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<String>>,
    width: usize,
}

impl Grid {
    /// Build from ragged rows; short rows are padded to the widest one.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let cells = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        Self { cells, width }
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row(&self, row: usize) -> &[String] {
        self.cells.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of non-blank cells in a row.
    pub fn filled(&self, row: usize) -> usize {
        self.row(row).iter().filter(|c| !c.is_empty()).count()
    }
}

/// An opened container: the sheet we parse plus the reader's raw picture list.
#[derive(Debug)]
pub struct SourceWorkbook {
    pub sheet_names: Vec<String>,
    /// Position of the parsed sheet in `sheet_names` (workbook order).
    pub sheet_index: usize,
    pub grid: Grid,
    /// Unpositioned pictures as reported by the reader: (extension, bytes).
    pub pictures: Vec<(String, Vec<u8>)>,
}

impl SourceWorkbook {
    pub fn sheet_name(&self) -> &str {
        &self.sheet_names[self.sheet_index]
    }
}

/// Open a spreadsheet from memory. Fails only when the container itself is
/// unreadable or has no sheets.
pub fn open(bytes: &[u8]) -> Result<SourceWorkbook, IngestError> {
    let mut workbook: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::Unreadable(e.to_string()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(IngestError::NoSheets);
    }

    let mut chosen: Option<(usize, Grid)> = None;
    for (idx, name) in sheet_names.iter().enumerate() {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| IngestError::Sheet {
                sheet: name.clone(),
                message: e.to_string(),
            })?;

        let (height, width) = range.get_size();
        if height == 0 || width == 0 {
            continue;
        }

        // Range start offset (data may not begin at A1)
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
        for row in range.rows() {
            let mut cells = vec![String::new(); start_col as usize];
            cells.extend(row.iter().map(cell_text));
            rows.push(cells);
        }
        chosen = Some((idx, Grid::from_rows(rows)));
        break;
    }

    let (sheet_index, grid) = chosen.unwrap_or_default();
    let pictures = workbook.pictures().unwrap_or_default();

    log::debug!(
        "opened workbook: {} sheet(s), parsing '{}' ({}x{}), {} raw picture(s)",
        sheet_names.len(),
        sheet_names[sheet_index],
        grid.height(),
        grid.width(),
        pictures.len()
    );

    Ok(SourceWorkbook {
        sheet_names,
        sheet_index,
        grid,
        pictures,
    })
}

/// Flatten a typed cell to trimmed text.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(n) => {
            // Integers without decimals so numeric codes survive
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_pads_ragged_rows() {
        let grid = Grid::from_rows(vec![
            vec!["a".into()],
            vec!["b".into(), "c".into(), "d".into()],
        ]);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell(0, 2), "");
        assert_eq!(grid.cell(1, 2), "d");
        assert_eq!(grid.cell(9, 9), "");
        assert_eq!(grid.filled(1), 3);
    }

    #[test]
    fn float_cells_lose_integer_fraction() {
        assert_eq!(cell_text(&Data::Float(4011.0)), "4011");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::String("  Rye  ".into())), "Rye");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn garbage_bytes_are_unreadable() {
        let err = open(b"definitely not a spreadsheet").unwrap_err();
        assert!(err.to_string().starts_with("cannot parse file"));
    }
}
