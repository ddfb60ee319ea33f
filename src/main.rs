mod cli;
mod filename;
mod itunes;
mod matching;
mod pipeline;
mod prompt;
mod tags;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout is reserved for progress, the
    // shortlist, and the summary.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    cli::run(cli::Cli::parse()).await
}
