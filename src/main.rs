use clap::Parser;
use mediatidy::cli::{Cli, run_cli};
use mediatidy::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_cli(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The runner has already reported a bad source directory.
            if !matches!(e, mediatidy::TidyError::DirectoryNotFound(_)) {
                OutputFormatter::error(&format!("Error: {}", e));
            }
            ExitCode::FAILURE
        }
    }
}
