// Dashboard numbers, listings and the per-sponsor tracking report.

use log::debug;

use serde_json::{json, Value as JSValue};

use std::collections::{HashMap, HashSet};

use padron_ingest::{CandidateEntry, RosterEntry};

/// Election-wide tally of the cast votes.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GlobalStats {
    pub total_cast: usize,
    pub green_cast: usize,
}

impl GlobalStats {
    /// Share of the cast votes identified on the overlay, in percent.
    pub fn green_share(&self) -> f64 {
        if self.total_cast > 0 {
            (self.green_cast as f64 / self.total_cast as f64) * 100.0
        } else {
            0.0
        }
    }
}

pub fn global_stats(verdes: &[CandidateEntry], voted: &HashSet<String>) -> GlobalStats {
    GlobalStats {
        total_cast: voted.len(),
        green_cast: verdes.iter().filter(|v| voted.contains(&v.key())).count(),
    }
}

/// Tracking numbers for one sponsor: how many overlay entries carry the
/// sponsor, how many of those already voted, and who is still pending.
#[derive(Debug, Clone)]
pub struct SponsorStats<'a> {
    pub name: String,
    pub total: usize,
    pub voted: usize,
    pub pending: Vec<&'a CandidateEntry>,
}

impl SponsorStats<'_> {
    pub fn effectiveness(&self) -> f64 {
        if self.total > 0 {
            (self.voted as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Aggregates the overlay per sponsor. Sponsors come back ordered by total
/// assigned entries, largest first, ties broken by name. With `only`, the
/// result is restricted to that exact sponsor.
pub fn sponsor_stats<'a>(
    verdes: &'a [CandidateEntry],
    voted: &HashSet<String>,
    only: Option<&str>,
) -> Vec<SponsorStats<'a>> {
    let mut by_name: HashMap<String, SponsorStats<'a>> = HashMap::new();
    for entry in verdes {
        let has_voted = voted.contains(&entry.key());
        for name in &entry.sponsors {
            let stat = by_name
                .entry(name.clone())
                .or_insert_with(|| SponsorStats {
                    name: name.clone(),
                    total: 0,
                    voted: 0,
                    pending: Vec::new(),
                });
            stat.total += 1;
            if has_voted {
                stat.voted += 1;
            } else {
                stat.pending.push(entry);
            }
        }
    }

    let mut stats: Vec<SponsorStats<'a>> = by_name.into_values().collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    if let Some(name) = only {
        stats.retain(|s| s.name == name);
    }
    debug!("sponsor_stats: {} sponsors", stats.len());
    stats
}

pub fn render_report(global: &GlobalStats, stats: &[SponsorStats]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Votos emitidos (total): {}\n", global.total_cast));
    out.push_str(&format!(
        "Votos de lista verde:   {} ({:.1}% del total emitido)\n",
        global.green_cast,
        global.green_share()
    ));

    if stats.is_empty() {
        out.push_str("\nNo hay datos de Votos Verdes cargados.\n");
        return out;
    }

    for stat in stats {
        out.push_str(&format!("\n== {} ==\n", stat.name));
        out.push_str(&format!(
            "  asignados: {}   efectivizados: {}   pendientes: {}   efectividad: {:.1}%\n",
            stat.total,
            stat.voted,
            stat.pending.len(),
            stat.effectiveness()
        ));
        if stat.pending.is_empty() {
            out.push_str("  todos los abogados de este referente ya votaron\n");
        } else {
            out.push_str("  faltan votar:\n");
            for entry in &stat.pending {
                out.push_str(&format!(
                    "    {:<10} {}, {}\n",
                    entry.key(),
                    entry.surname,
                    entry.given_name
                ));
            }
        }
    }
    out
}

/// The report as a JSON document, for the --out option.
pub fn summary_json(global: &GlobalStats, stats: &[SponsorStats]) -> JSValue {
    let sponsors: Vec<JSValue> = stats
        .iter()
        .map(|stat| {
            let pending: Vec<JSValue> = stat
                .pending
                .iter()
                .map(|entry| {
                    json!({
                        "key": entry.key(),
                        "apellido": entry.surname,
                        "nombre": entry.given_name,
                    })
                })
                .collect();
            json!({
                "referente": stat.name,
                "total": stat.total,
                "votaron": stat.voted,
                "efectividad": format!("{:.1}", stat.effectiveness()),
                "pendientes": pending,
            })
        })
        .collect();
    json!({
        "votosEmitidos": global.total_cast,
        "votosVerdes": global.green_cast,
        "porcentajeVerde": format!("{:.1}", global.green_share()),
        "referentes": sponsors,
    })
}

pub fn render_roster_table(entries: &[&RosterEntry], voted: &HashSet<String>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:<32} {}\n",
        "TOMO-FOLIO", "ABOGADO", "ESTADO"
    ));
    for entry in entries {
        out.push_str(&format!(
            "{:<12} {:<32} {}\n",
            entry.key(),
            format!("{}, {}", entry.surname, entry.given_name),
            status_label(voted.contains(&entry.key()))
        ));
    }
    out.push_str(&format!("{} registros\n", entries.len()));
    out
}

pub fn render_overlay_table(entries: &[&CandidateEntry], voted: &HashSet<String>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:<28} {:<28} {}\n",
        "TOMO-FOLIO", "ABOGADO", "REFERENTES", "ESTADO"
    ));
    for entry in entries {
        out.push_str(&format!(
            "{:<12} {:<28} {:<28} {}\n",
            entry.key(),
            format!("{}, {}", entry.surname, entry.given_name),
            entry.sponsors.join(", "),
            status_label(voted.contains(&entry.key()))
        ));
    }
    out.push_str(&format!("{} registros\n", entries.len()));
    out
}

fn status_label(has_voted: bool) -> &'static str {
    if has_voted {
        "VOTÓ"
    } else {
        "PENDIENTE"
    }
}
