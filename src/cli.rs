use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::pipeline;

#[derive(Parser)]
#[command(name = "tagdig")]
#[command(about = "Tag .mp3 files with metadata from the iTunes Search API")]
pub struct Cli {
    /// Directory containing the files to tag
    #[arg(default_value = "./music")]
    pub root: PathBuf,
}

/// Run the batch and map the result onto process exit codes: 0 for normal
/// completion and for "no files found", 1 for a fatal error.
pub async fn run(cli: Cli) -> ExitCode {
    match pipeline::run(&cli.root).await {
        Ok(summary) => {
            if summary.total > 0 {
                println!(
                    "Successfully processed {}/{} files!",
                    summary.processed, summary.total
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
    }
}
