// Primitives for reading CSV uploads.

use log::debug;

use padron_ingest::Cell;

use crate::app::*;

/// Reads a whole CSV file as a grid of text cells.
///
/// The reader does no header interpretation of its own: the first physical
/// line lands at row 0 and the ingestion engine decides what is a header.
/// Rows may have uneven lengths.
pub fn read_grid(path: &str) -> AppResult<Vec<Vec<Cell>>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;

    let mut grid: Vec<Vec<Cell>> = Vec::new();
    for (idx, record) in rdr.into_records().enumerate() {
        let record = record.context(CsvLineParseSnafu { lineno: idx + 1 })?;
        grid.push(
            record
                .iter()
                .map(|field| Cell::Text(field.to_string()))
                .collect(),
        );
    }
    debug!("read_grid: {:?} rows in {:?}", grid.len(), path);
    Ok(grid)
}
