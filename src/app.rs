use log::{debug, info};

use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::path::Path;

use padron_ingest::{
    ingest_candidates, ingest_roster, vote_key, CandidateEntry, Cell, IngestError, RosterEntry,
};

use crate::args::{Args, Command};

pub mod io_csv;
pub mod io_excel;
pub mod reports;
pub mod store;

// The data store location when --data is not given.
const DEFAULT_STORE: &str = "escrutinio.json";

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Could not open the spreadsheet {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The spreadsheet {path} has no worksheets"))]
    MissingSheet { path: String },
    #[snafu(display("Could not open the file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Could not parse line {lineno} of the file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("{source}"))]
    Ingest { source: IngestError },
    #[snafu(display("Could not read the data store {path}"))]
    OpeningStore {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The data store {path} is not valid JSON"))]
    ParsingStore {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Could not write the data store {path}"))]
    WritingStore {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not serialize the report summary"))]
    SerializingReport { source: serde_json::Error },
    #[snafu(display("Could not write the report summary to {path}"))]
    WritingReport {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

/// The whole in-memory state of the tool: the roll, the candidate overlay
/// and the set of cast-vote keys.
///
/// A successful upload replaces its dataset in full. A failed upload leaves
/// everything untouched: ingestion errors surface before any slot mutates.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub padron: Vec<RosterEntry>,
    pub verdes: Vec<CandidateEntry>,
    pub voted: HashSet<String>,
}

impl AppState {
    pub fn new() -> AppState {
        AppState::default()
    }

    /// Flips the cast-vote mark for one person and reports whether the
    /// person is now marked as having voted.
    pub fn toggle_vote(&mut self, volume: &str, page: &str) -> bool {
        let key = vote_key(volume, page);
        if self.voted.remove(&key) {
            debug!("toggle_vote: removed {:?}", key);
            false
        } else {
            debug!("toggle_vote: inserted {:?}", key);
            self.voted.insert(key);
            true
        }
    }

    pub fn clear(&mut self) {
        self.padron.clear();
        self.verdes.clear();
        self.voted.clear();
    }

    /// Overlay entries whose person already cast a vote.
    pub fn green_voted_count(&self) -> usize {
        self.verdes
            .iter()
            .filter(|v| self.voted.contains(&v.key()))
            .count()
    }

    /// The distinct volumes present in the roll, numeric ones first in
    /// numeric order, the rest lexicographically after them.
    pub fn volumes(&self) -> Vec<String> {
        let distinct: HashSet<&str> = self.padron.iter().map(|e| e.volume.as_str()).collect();
        let mut volumes: Vec<String> = distinct.into_iter().map(|s| s.to_string()).collect();
        volumes.sort_by(|a, b| match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        });
        volumes
    }

    /// Every sponsor named in the overlay, sorted.
    pub fn sponsors(&self) -> Vec<String> {
        let distinct: HashSet<&str> = self
            .verdes
            .iter()
            .flat_map(|v| v.sponsors.iter().map(|s| s.as_str()))
            .collect();
        let mut sponsors: Vec<String> = distinct.into_iter().map(|s| s.to_string()).collect();
        sponsors.sort();
        sponsors
    }

    pub fn filter_padron(&self, search: Option<&str>, volume: Option<&str>) -> Vec<&RosterEntry> {
        let needle = search.map(|s| s.to_lowercase());
        self.padron
            .iter()
            .filter(|e| volume.map_or(true, |v| e.volume == v))
            .filter(|e| match &needle {
                Some(needle) => {
                    contains_ci(&e.volume, needle)
                        || contains_ci(&e.page, needle)
                        || contains_ci(&e.surname, needle)
                        || contains_ci(&e.given_name, needle)
                }
                None => true,
            })
            .collect()
    }

    pub fn filter_verdes(
        &self,
        search: Option<&str>,
        sponsor: Option<&str>,
        volume: Option<&str>,
    ) -> Vec<&CandidateEntry> {
        let needle = search.map(|s| s.to_lowercase());
        self.verdes
            .iter()
            .filter(|e| volume.map_or(true, |v| e.volume == v))
            .filter(|e| sponsor.map_or(true, |s| e.sponsors.iter().any(|r| r == s)))
            .filter(|e| match &needle {
                Some(needle) => {
                    contains_ci(&e.volume, needle)
                        || contains_ci(&e.page, needle)
                        || contains_ci(&e.surname, needle)
                        || contains_ci(&e.given_name, needle)
                        || e.sponsors.iter().any(|r| contains_ci(r, needle))
                }
                None => true,
            })
            .collect()
    }
}

// needle is already lower-cased by the callers.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Reads a dataset file into the raw grid the ingestion engine expects.
/// The format is picked from the file extension.
fn load_grid(path: &str) -> AppResult<Vec<Vec<Cell>>> {
    info!("Attempting to read dataset file {:?}", path);
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => io_excel::read_grid(path),
        Some("csv") => io_csv::read_grid(path),
        _ => whatever!(
            "Unsupported file extension for {:?}: expected .xlsx or .csv",
            path
        ),
    }
}

pub fn run(args: &Args) -> AppResult<()> {
    let store_path = args.data.clone().unwrap_or_else(|| DEFAULT_STORE.to_string());
    let mut state = store::load(&store_path)?;

    match &args.command {
        Command::LoadPadron { file } => {
            let grid = load_grid(file)?;
            let entries = ingest_roster(&grid).context(IngestSnafu {})?;
            info!("load-padron: {} entries from {:?}", entries.len(), file);
            state.padron = entries;
            store::save(&store_path, &state)?;
            println!("Padrón cargado: {} abogados.", state.padron.len());
        }
        Command::LoadVerdes { file } => {
            let grid = load_grid(file)?;
            let entries = ingest_candidates(&grid).context(IngestSnafu {})?;
            info!("load-verdes: {} entries from {:?}", entries.len(), file);
            state.verdes = entries;
            store::save(&store_path, &state)?;
            println!("Votos Verdes cargados: {} registros.", state.verdes.len());
        }
        Command::Vote { tomo, folio } => {
            let now_voted = state.toggle_vote(tomo, folio);
            store::save(&store_path, &state)?;
            if now_voted {
                println!("Voto registrado para {}.", vote_key(tomo, folio));
            } else {
                println!("Voto quitado para {}.", vote_key(tomo, folio));
            }
        }
        Command::Status => {
            println!(
                "Padrón:         {} abogados en {} tomos",
                state.padron.len(),
                state.volumes().len()
            );
            println!(
                "Votos Verdes:   {} registros de {} referentes",
                state.verdes.len(),
                state.sponsors().len()
            );
            println!(
                "Votos emitidos: {} (lista verde: {})",
                state.voted.len(),
                state.green_voted_count()
            );
        }
        Command::List {
            verdes,
            search,
            referente,
            tomo,
        } => {
            if *verdes {
                let rows = state.filter_verdes(search.as_deref(), referente.as_deref(), tomo.as_deref());
                print!("{}", reports::render_overlay_table(&rows, &state.voted));
            } else {
                let rows = state.filter_padron(search.as_deref(), tomo.as_deref());
                print!("{}", reports::render_roster_table(&rows, &state.voted));
            }
        }
        Command::Report { referente, out } => {
            let global = reports::global_stats(&state.verdes, &state.voted);
            let stats = reports::sponsor_stats(&state.verdes, &state.voted, referente.as_deref());
            print!("{}", reports::render_report(&global, &stats));
            if let Some(out_path) = out {
                let summary = reports::summary_json(&global, &stats);
                let pretty =
                    serde_json::to_string_pretty(&summary).context(SerializingReportSnafu {})?;
                std::fs::write(out_path, pretty).context(WritingReportSnafu {
                    path: out_path.as_str(),
                })?;
                info!("report: summary written to {:?}", out_path);
            }
        }
        Command::Clear { yes } => {
            if !*yes {
                whatever!("This deletes every loaded dataset and vote mark; pass --yes to confirm");
            }
            state.clear();
            store::save(&store_path, &state)?;
            println!("Todos los datos fueron borrados.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(volume: &str, page: &str, surname: &str, given_name: &str) -> RosterEntry {
        RosterEntry {
            volume: volume.to_string(),
            page: page.to_string(),
            surname: surname.to_string(),
            given_name: given_name.to_string(),
        }
    }

    fn green(
        volume: &str,
        page: &str,
        surname: &str,
        given_name: &str,
        sponsors: &[&str],
    ) -> CandidateEntry {
        CandidateEntry {
            volume: volume.to_string(),
            page: page.to_string(),
            surname: surname.to_string(),
            given_name: given_name.to_string(),
            sponsors: sponsors.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sample_state() -> AppState {
        AppState {
            padron: vec![
                entry("10", "1", "Gomez", "Ana"),
                entry("2", "5", "Diaz", "Juan"),
                entry("2", "7", "Paz", "Eva"),
                entry("B1", "2", "Sosa", "Mia"),
            ],
            verdes: vec![
                green("2", "5", "Diaz", "Juan", &["Norte", "Sur"]),
                green("10", "1", "Gomez", "Ana", &["Sur"]),
            ],
            voted: HashSet::new(),
        }
    }

    #[test]
    fn toggle_vote_flips_membership() {
        let mut state = sample_state();
        assert!(state.toggle_vote("2", "5"));
        assert!(state.voted.contains("2-5"));
        assert!(!state.toggle_vote("2", "5"));
        assert!(state.voted.is_empty());
    }

    #[test]
    fn green_voted_count_follows_the_voted_set() {
        let mut state = sample_state();
        assert_eq!(state.green_voted_count(), 0);
        state.toggle_vote("2", "5");
        state.toggle_vote("2", "7"); // not in the overlay
        assert_eq!(state.green_voted_count(), 1);
    }

    #[test]
    fn volumes_sort_numerically_before_lexicographically() {
        let state = sample_state();
        assert_eq!(state.volumes(), vec!["2", "10", "B1"]);
    }

    #[test]
    fn sponsors_are_distinct_and_sorted() {
        let state = sample_state();
        assert_eq!(state.sponsors(), vec!["Norte", "Sur"]);
    }

    #[test]
    fn padron_filtering_by_search_and_volume() {
        let state = sample_state();
        let hits = state.filter_padron(Some("gom"), None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].surname, "Gomez");

        let hits = state.filter_padron(None, Some("2"));
        assert_eq!(hits.len(), 2);

        let hits = state.filter_padron(Some("eva"), Some("2"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].surname, "Paz");
    }

    #[test]
    fn overlay_search_also_matches_sponsor_names() {
        let state = sample_state();
        let hits = state.filter_verdes(Some("nor"), None, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].surname, "Diaz");
    }

    #[test]
    fn overlay_sponsor_filter_is_exact() {
        let state = sample_state();
        assert_eq!(state.filter_verdes(None, Some("Sur"), None).len(), 2);
        assert_eq!(state.filter_verdes(None, Some("Su"), None).len(), 0);
    }

    #[test]
    fn clear_empties_every_slot() {
        let mut state = sample_state();
        state.toggle_vote("2", "5");
        state.clear();
        assert!(state.padron.is_empty());
        assert!(state.verdes.is_empty());
        assert!(state.voted.is_empty());
    }
}
