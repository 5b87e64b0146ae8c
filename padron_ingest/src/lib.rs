//! Ingestion and normalization engine for the election spreadsheets.
//!
//! The engine receives a fully materialized grid of [Cell] values, locates
//! the header row, maps the semantic fields (volume, page, surname, given
//! name, sponsor) to column positions and builds the canonical dataset:
//! either the flat roll of eligible voters or the sponsor-aggregated
//! candidate overlay. Uploaded files come with arbitrary column order and
//! naming, so the mapping runs on alias tables with a positional fallback.
//!
//! The engine performs no I/O and keeps no state between calls: each
//! ingestion is a pure function from (grid, kind) to a dataset or an error.

mod model;

use log::debug;

use indexmap::map::Entry;
use indexmap::IndexMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub use crate::model::*;

// **** Alias configuration ****

// Accepted header spellings per semantic field. Matching happens on
// normalized text, in both containment directions.
const VOLUME_ALIASES: [&str; 5] = ["tomo", "libro", "tmo", "t.", "t"];
const PAGE_ALIASES: [&str; 6] = ["folio", "fol", "f.", "pag", "pág", "f"];
const SURNAME_ALIASES: [&str; 4] = ["apellido", "ape", "apell", "last"];
const GIVEN_NAME_ALIASES: [&str; 3] = ["nombre", "nom", "first"];
const SPONSOR_ALIASES: [&str; 5] = ["referente", "ref", "puntero", "responsable", "lista"];

// A row is the header row when one of its cells normalizes to one of these.
const HEADER_MARKERS: [&str; 3] = ["tomo", "folio", "apellido"];

// Only the top of the sheet is searched for a header row.
const HEADER_SCAN_ROWS: usize = 10;

// Column positions assumed for a field when no alias matches it.
const DEFAULT_VOLUME_COL: usize = 0;
const DEFAULT_PAGE_COL: usize = 1;
const DEFAULT_SURNAME_COL: usize = 2;
const DEFAULT_GIVEN_NAME_COL: usize = 3;
const DEFAULT_SPONSOR_COL: usize = 4;

/// Normalizes a token for comparisons: lower-cased, trimmed, diacritics
/// dropped, all whitespace removed.
///
/// This is only used to compare header-cell text against the alias tables.
/// Stored data values are never altered by it.
fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// The resolved column position of every semantic field.
///
/// The sponsor position is only guaranteed for the candidates kind; for a
/// roster it is present only when an alias happened to match.
#[derive(Eq, PartialEq, Debug, Clone)]
struct ColumnMap {
    volume: usize,
    page: usize,
    surname: usize,
    given_name: usize,
    sponsor: Option<usize>,
}

/// Finds the first header cell that matches one of the aliases.
///
/// A cell matches when its normalized text contains a normalized alias or
/// the alias contains the cell text. Empty cells never match.
fn find_column(header: &[Cell], aliases: &[&str]) -> Option<usize> {
    let aliases: Vec<String> = aliases.iter().map(|a| normalize(a)).collect();
    for (idx, cell) in header.iter().enumerate() {
        let text = normalize(&cell.display_text());
        if text.is_empty() {
            continue;
        }
        if aliases
            .iter()
            .any(|alias| text.contains(alias.as_str()) || alias.contains(text.as_str()))
        {
            return Some(idx);
        }
    }
    None
}

/// Locates the header row and maps every field to a column position.
///
/// Returns the column map together with the index of the first data row.
/// When no row within the scan window carries a recognizable header marker,
/// row 0 serves as the assumed header and data also starts at row 0, so the
/// assumed header row gets parsed as a data record as well.
fn resolve_columns(
    grid: &[Vec<Cell>],
    kind: DatasetKind,
) -> Result<(ColumnMap, usize), IngestError> {
    if grid.is_empty() {
        return Err(IngestError::EmptyGrid);
    }

    let header_idx = grid.iter().take(HEADER_SCAN_ROWS).position(|row| {
        row.iter().any(|cell| {
            let n = normalize(&cell.display_text());
            HEADER_MARKERS.contains(&n.as_str())
        })
    });

    let (header_row, data_start) = match header_idx {
        Some(idx) => (&grid[idx], idx + 1),
        None => (&grid[0], 0),
    };

    let columns = ColumnMap {
        volume: find_column(header_row, &VOLUME_ALIASES).unwrap_or(DEFAULT_VOLUME_COL),
        page: find_column(header_row, &PAGE_ALIASES).unwrap_or(DEFAULT_PAGE_COL),
        surname: find_column(header_row, &SURNAME_ALIASES).unwrap_or(DEFAULT_SURNAME_COL),
        given_name: find_column(header_row, &GIVEN_NAME_ALIASES).unwrap_or(DEFAULT_GIVEN_NAME_COL),
        sponsor: match kind {
            DatasetKind::Candidates => Some(
                find_column(header_row, &SPONSOR_ALIASES).unwrap_or(DEFAULT_SPONSOR_COL),
            ),
            DatasetKind::Roster => find_column(header_row, &SPONSOR_ALIASES),
        },
    };
    debug!(
        "resolve_columns: kind {:?} columns {:?} data_start {:?}",
        kind, columns, data_start
    );
    Ok((columns, data_start))
}

/// Reads one mapped cell as trimmed text. Positions beyond the row width
/// read as empty, like a blank cell would.
fn cell_text(row: &[Cell], idx: usize) -> String {
    row.get(idx)
        .map(|cell| cell.display_text())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Reconstructs the roll of eligible voters from a raw grid.
///
/// Rows whose volume or page trims to empty are discarded; surviving rows
/// keep their order. Fails when the grid has no rows or no row survives.
pub fn ingest_roster(grid: &[Vec<Cell>]) -> Result<Vec<RosterEntry>, IngestError> {
    let (columns, data_start) = resolve_columns(grid, DatasetKind::Roster)?;

    let mut entries: Vec<RosterEntry> = Vec::new();
    for row in &grid[data_start..] {
        let volume = cell_text(row, columns.volume);
        let page = cell_text(row, columns.page);
        if volume.is_empty() || page.is_empty() {
            continue;
        }
        entries.push(RosterEntry {
            volume,
            page,
            surname: cell_text(row, columns.surname),
            given_name: cell_text(row, columns.given_name),
        });
    }
    debug!("ingest_roster: {} entries", entries.len());

    if entries.is_empty() {
        return Err(IngestError::NoRosterRows);
    }
    Ok(entries)
}

/// Reconstructs the candidate overlay from a raw grid, merging rows that
/// share a (volume, page) identity.
///
/// The first row for an identity creates the entry and fixes its surname
/// and given name; later rows only contribute sponsors that are not
/// already present, preserving first-seen order. A blank sponsor cell
/// records [NO_SPONSOR]. Entries come back in first-creation order.
pub fn ingest_candidates(grid: &[Vec<Cell>]) -> Result<Vec<CandidateEntry>, IngestError> {
    let (columns, data_start) = resolve_columns(grid, DatasetKind::Candidates)?;
    let sponsor_col = columns.sponsor.unwrap_or(DEFAULT_SPONSOR_COL);

    let mut merged: IndexMap<String, CandidateEntry> = IndexMap::new();
    for row in &grid[data_start..] {
        let volume = cell_text(row, columns.volume);
        let page = cell_text(row, columns.page);
        if volume.is_empty() || page.is_empty() {
            continue;
        }
        let mut sponsor = cell_text(row, sponsor_col);
        if sponsor.is_empty() {
            sponsor = NO_SPONSOR.to_string();
        }

        match merged.entry(vote_key(&volume, &page)) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if !entry.sponsors.contains(&sponsor) {
                    entry.sponsors.push(sponsor);
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CandidateEntry {
                    volume,
                    page,
                    surname: cell_text(row, columns.surname),
                    given_name: cell_text(row, columns.given_name),
                    sponsors: vec![sponsor],
                });
            }
        }
    }
    debug!("ingest_candidates: {} merged entries", merged.len());

    if merged.is_empty() {
        return Err(IngestError::NoCandidateRows);
    }
    Ok(merged.into_values().collect())
}
