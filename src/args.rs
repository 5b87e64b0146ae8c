use clap::{Parser, Subcommand};

/// Vote-day tally tool for the bar association election.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON data store holding the loaded datasets and the
    /// cast-vote marks. Defaults to escrutinio.json in the working directory.
    #[clap(short, long, value_parser)]
    pub data: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Loads the roll of eligible voters from a spreadsheet, replacing the current one.
    LoadPadron {
        /// (file path) The spreadsheet with the roll (.xlsx or .csv). Column order
        /// and header naming are detected automatically.
        #[clap(value_parser)]
        file: String,
    },
    /// Loads the sponsor-tagged candidate overlay, replacing the current one.
    LoadVerdes {
        /// (file path) The spreadsheet with the overlay (.xlsx or .csv).
        #[clap(value_parser)]
        file: String,
    },
    /// Toggles the cast-vote mark for one person, identified by volume and page.
    Vote {
        #[clap(value_parser)]
        tomo: String,
        #[clap(value_parser)]
        folio: String,
    },
    /// Prints the dashboard counters.
    Status,
    /// Lists the roll, or the overlay with --verdes, as a table.
    List {
        /// List the candidate overlay instead of the roll.
        #[clap(long, takes_value = false)]
        verdes: bool,
        /// Case-insensitive text filter over volume, page, surname, given name
        /// and (for the overlay) sponsor names.
        #[clap(short, long, value_parser)]
        search: Option<String>,
        /// Restrict the overlay to entries carrying exactly this sponsor.
        #[clap(short, long, value_parser)]
        referente: Option<String>,
        /// Restrict the listing to one volume.
        #[clap(short, long, value_parser)]
        tomo: Option<String>,
    },
    /// Prints the per-sponsor tracking report.
    Report {
        /// Only report on this sponsor.
        #[clap(short, long, value_parser)]
        referente: Option<String>,
        /// (file path) Additionally write the report summary as JSON to this location.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
    /// Deletes every stored dataset and every cast-vote mark.
    Clear {
        /// Confirm the deletion.
        #[clap(long, takes_value = false)]
        yes: bool,
    },
}
