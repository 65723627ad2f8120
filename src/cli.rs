//! Command-line interface for mediatidy.
//!
//! Every subcommand maps onto one [`OperationRunner`] entry point. Mutating
//! subcommands really change the tree unless `--dry-run` is given.

use crate::config::OrganizerConfig;
use crate::error::TidyError;
use crate::file_organizer::OrganizeOptions;
use crate::output::{ConsoleReporter, OutputFormatter};
use crate::report::{LogReporter, Reporter};
use crate::runner::{OperationRunner, OperationSummary};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mediatidy")]
#[command(about = "Sort photos and videos by date, quarantine duplicates and clean up", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, short = 's', global = true, help = "Media folder to work on (overrides source_dir)")]
    pub source: Option<PathBuf>,

    #[arg(long, global = true, help = "Report through the log facade instead of colored output")]
    pub log: bool,

    #[arg(long, global = true, help = "Print the operation summary as JSON")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Sort images and videos into Sorted_Media/YYYY/MM")]
    Organize {
        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,

        #[arg(long, help = "Keep Images and Videos in separate trees")]
        split: bool,

        #[arg(long, help = "Also sort files that are neither images nor videos")]
        all: bool,
    },

    #[command(about = "Move identical media into per-folder Duplicates folders")]
    Dedupe {
        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,
    },

    #[command(about = "Delete all Duplicates folders under Sorted_Media")]
    RemoveDuplicates {
        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,
    },

    #[command(about = "Delete empty files and empty folders")]
    Clean {
        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,
    },

    #[command(about = "Move unwanted files into Unwanted_Files")]
    Unwanted {
        #[arg(long, help = "Show what would happen without changing anything")]
        dry_run: bool,
    },

    #[command(about = "List files above the size threshold")]
    Large,

    #[command(about = "Print the effective configuration")]
    Config,
}

/// Loads the configuration the command line asks for.
pub fn effective_config(cli: &Cli) -> Result<OrganizerConfig, TidyError> {
    let mut config = OrganizerConfig::load(cli.config.as_deref())?;
    if let Some(source) = &cli.source {
        config.source_dir = source.clone();
    }
    Ok(config)
}

/// Runs the parsed command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use mediatidy::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["mediatidy", "--source", "/home/me/Pictures", "organize", "--dry-run"]);
/// if let Err(e) = run_cli(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<(), TidyError> {
    let config = effective_config(cli)?;

    let summary = if cli.log {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
        run_command(&cli.command, config, &LogReporter)?
    } else {
        let reporter = if cli.json {
            ConsoleReporter::new().quiet()
        } else {
            ConsoleReporter::new()
        };
        run_command(&cli.command, config, &reporter)?
    };

    if cli.json
        && let Some(summary) = summary
    {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => OutputFormatter::plain(&json),
            Err(e) => OutputFormatter::error(&format!("Could not render summary: {}", e)),
        }
    }
    Ok(())
}

/// Runs one subcommand. Only operations produce a summary.
fn run_command(
    command: &Commands,
    config: OrganizerConfig,
    reporter: &dyn Reporter,
) -> Result<Option<OperationSummary>, TidyError> {
    let summary = match *command {
        Commands::Config => {
            OutputFormatter::plain(&config.to_toml()?);
            return Ok(None);
        }
        Commands::Organize { dry_run, split, all } => {
            let options = OrganizeOptions {
                merge_categories: !split,
                include_unclassified: all || config.include_unclassified,
            };
            OperationRunner::new(config, reporter).organize_with(dry_run, options)
        }
        Commands::Dedupe { dry_run } => OperationRunner::new(config, reporter).deduplicate(dry_run),
        Commands::RemoveDuplicates { dry_run } => {
            OperationRunner::new(config, reporter).remove_duplicate_folders(dry_run)
        }
        Commands::Clean { dry_run } => OperationRunner::new(config, reporter).clean_empty(dry_run),
        Commands::Unwanted { dry_run } => {
            OperationRunner::new(config, reporter).move_unwanted(dry_run)
        }
        Commands::Large => OperationRunner::new(config, reporter).find_large(),
    }?;
    Ok(Some(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_organize_flags() {
        let cli = Cli::parse_from(["mediatidy", "organize", "--dry-run", "--split"]);
        assert_eq!(
            cli.command,
            Commands::Organize {
                dry_run: true,
                split: true,
                all: false
            }
        );
    }

    #[test]
    fn test_mutating_commands_default_to_real_run() {
        let cli = Cli::parse_from(["mediatidy", "remove-duplicates"]);
        assert_eq!(cli.command, Commands::RemoveDuplicates { dry_run: false });
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["mediatidy", "clean", "--source", "/m", "--json"]);
        assert_eq!(cli.source, Some(PathBuf::from("/m")));
        assert!(cli.json);
        assert_eq!(cli.command, Commands::Clean { dry_run: false });
    }

    #[test]
    fn test_source_overrides_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        std::fs::write(&config_path, "source_dir = \"/from/file\"\nsize_threshold_mb = 7\n")
            .unwrap();

        let cli = Cli::parse_from([
            "mediatidy",
            "--config",
            config_path.to_str().unwrap(),
            "--source",
            "/from/flag",
            "large",
        ]);
        let config = effective_config(&cli).unwrap();

        assert_eq!(config.source_dir, PathBuf::from("/from/flag"));
        assert_eq!(config.size_threshold_mb, 7);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["mediatidy", "--config", "/nonexistent/config.toml", "large"]);
        assert!(matches!(effective_config(&cli), Err(TidyError::Config(_))));
    }

    #[test]
    fn test_config_command_produces_no_summary() {
        let config = OrganizerConfig::default();
        let summary = run_command(&Commands::Config, config, &crate::report::MemoryReporter::new())
            .unwrap();
        assert_eq!(summary, None);
    }

    #[test]
    fn test_operation_command_returns_its_summary() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = OrganizerConfig {
            source_dir: temp.path().to_path_buf(),
            ..OrganizerConfig::default()
        };

        let summary = run_command(&Commands::Large, config, &crate::report::MemoryReporter::new())
            .unwrap()
            .unwrap();
        assert_eq!(summary.operation, "find large files");
    }
}
