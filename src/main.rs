mod app;
mod args;

use clap::Parser;
use log::debug;

fn main() {
    let parsed = args::Args::parse();

    let mut log_builder = env_logger::Builder::from_default_env();
    if parsed.verbose {
        log_builder.filter_level(log::LevelFilter::Debug);
    }
    log_builder.init();
    debug!("args: {:?}", parsed);

    if let Err(e) = app::run(&parsed) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
