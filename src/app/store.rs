// Durable storage of the application state.
//
// Everything lives in one JSON document with three named slots: the roll,
// the candidate overlay and the cast-vote keys. The slot names match the
// storage keys of the earlier in-browser edition of the tool, so a store
// exported from it loads unchanged.

use log::debug;

use serde::{Deserialize, Serialize};

use std::fs;
use std::path::Path;

use padron_ingest::{CandidateEntry, RosterEntry};

use crate::app::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct StoredLawyer {
    tomo: String,
    folio: String,
    apellido: String,
    nombre: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct StoredGreenVote {
    tomo: String,
    folio: String,
    apellido: String,
    nombre: String,
    referentes: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
struct StoredState {
    #[serde(rename = "caq_padron", default)]
    padron: Vec<StoredLawyer>,
    #[serde(rename = "caq_votos_verdes", default)]
    votos_verdes: Vec<StoredGreenVote>,
    #[serde(rename = "caq_voted", default)]
    voted: Vec<String>,
}

impl From<&AppState> for StoredState {
    fn from(state: &AppState) -> StoredState {
        let mut voted: Vec<String> = state.voted.iter().cloned().collect();
        // The set iterates in arbitrary order; sort so the document is stable.
        voted.sort();
        StoredState {
            padron: state
                .padron
                .iter()
                .map(|e| StoredLawyer {
                    tomo: e.volume.clone(),
                    folio: e.page.clone(),
                    apellido: e.surname.clone(),
                    nombre: e.given_name.clone(),
                })
                .collect(),
            votos_verdes: state
                .verdes
                .iter()
                .map(|e| StoredGreenVote {
                    tomo: e.volume.clone(),
                    folio: e.page.clone(),
                    apellido: e.surname.clone(),
                    nombre: e.given_name.clone(),
                    referentes: e.sponsors.clone(),
                })
                .collect(),
            voted,
        }
    }
}

impl StoredState {
    fn into_state(self) -> AppState {
        AppState {
            padron: self
                .padron
                .into_iter()
                .map(|e| RosterEntry {
                    volume: e.tomo,
                    page: e.folio,
                    surname: e.apellido,
                    given_name: e.nombre,
                })
                .collect(),
            verdes: self
                .votos_verdes
                .into_iter()
                .map(|e| CandidateEntry {
                    volume: e.tomo,
                    page: e.folio,
                    surname: e.apellido,
                    given_name: e.nombre,
                    sponsors: e.referentes,
                })
                .collect(),
            voted: self.voted.into_iter().collect(),
        }
    }
}

/// Loads the state from the store file, or starts empty when there is none.
pub fn load(path: &str) -> AppResult<AppState> {
    if !Path::new(path).exists() {
        debug!("store: no file at {:?}, starting empty", path);
        return Ok(AppState::new());
    }
    let contents = fs::read_to_string(path).context(OpeningStoreSnafu { path })?;
    let stored: StoredState =
        serde_json::from_str(&contents).context(ParsingStoreSnafu { path })?;
    debug!(
        "store: loaded {} roll entries, {} overlay entries, {} votes from {:?}",
        stored.padron.len(),
        stored.votos_verdes.len(),
        stored.voted.len(),
        path
    );
    Ok(stored.into_state())
}

/// Writes the whole state back to the store file.
pub fn save(path: &str, state: &AppState) -> AppResult<()> {
    let stored = StoredState::from(state);
    let contents = serde_json::to_string_pretty(&stored).context(ParsingStoreSnafu { path })?;
    fs::write(path, contents).context(WritingStoreSnafu { path })?;
    debug!("store: wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_state() -> AppState {
        AppState {
            padron: vec![RosterEntry {
                volume: "12".to_string(),
                page: "34".to_string(),
                surname: "Gomez".to_string(),
                given_name: "Ana".to_string(),
            }],
            verdes: vec![CandidateEntry {
                volume: "1".to_string(),
                page: "1".to_string(),
                surname: "Diaz".to_string(),
                given_name: "Juan".to_string(),
                sponsors: vec!["Norte".to_string(), "Sur".to_string()],
            }],
            voted: HashSet::from(["12-34".to_string(), "1-1".to_string()]),
        }
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = sample_state();
        let stored = StoredState::from(&state);
        let js = serde_json::to_string(&stored).unwrap();
        let back: StoredState = serde_json::from_str(&js).unwrap();
        let restored = back.into_state();
        assert_eq!(restored.padron, state.padron);
        assert_eq!(restored.verdes, state.verdes);
        assert_eq!(restored.voted, state.voted);
    }

    #[test]
    fn document_uses_the_legacy_slot_names_and_sorted_votes() {
        let stored = StoredState::from(&sample_state());
        let js = serde_json::to_value(&stored).unwrap();
        assert!(js.get("caq_padron").is_some());
        assert!(js.get("caq_votos_verdes").is_some());
        assert_eq!(js["caq_voted"][0], "1-1");
        assert_eq!(js["caq_voted"][1], "12-34");
    }

    #[test]
    fn missing_slots_default_to_empty() {
        let back: StoredState = serde_json::from_str("{}").unwrap();
        let state = back.into_state();
        assert!(state.padron.is_empty());
        assert!(state.verdes.is_empty());
        assert!(state.voted.is_empty());
    }
}
