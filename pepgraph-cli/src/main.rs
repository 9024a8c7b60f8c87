//! Command line front end over the [`pepgraph`] pipeline.

use clap::Parser;

mod cli;

use cli::Args;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Args::parse().into_config();
    match pepgraph::pipeline::run(&config) {
        Ok(summary) => {
            log::info!(
                "done: {} entries read, {} graphs built, {} rows written, {} entries skipped, {} read errors",
                summary.entries_read,
                summary.processed,
                summary.written,
                summary.skipped,
                summary.read_errors
            );
        }
        Err(error) => {
            log::error!("{error}");
            std::process::exit(1);
        }
    }
}
