// Reading of .xlsx uploads into the raw grid.

use log::debug;

use calamine::{open_workbook, DataType, Reader, Xlsx};

use padron_ingest::Cell;

use crate::app::*;

/// Materializes the first worksheet of the workbook as a grid of cells.
/// Header detection and column mapping happen later, in the ingestion
/// engine; this only converts the reader's cell values.
pub fn read_grid(path: &str) -> AppResult<Vec<Vec<Cell>>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(MissingSheetSnafu { path })?
        .context(OpeningExcelSnafu { path })?;
    debug!("read_grid: {:?} rows in {:?}", wrange.height(), path);

    let grid: Vec<Vec<Cell>> = wrange
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    Ok(grid)
}

fn convert_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Bool(b) => Cell::Text(b.to_string()),
        DataType::Empty => Cell::Empty,
        other => {
            debug!("convert_cell: treating {:?} as blank", other);
            Cell::Empty
        }
    }
}
