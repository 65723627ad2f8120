//! mediatidy - sort and tidy a media library
//!
//! This library sorts photos and videos into a year/month hierarchy by
//! capture date, without ever overwriting an existing file. It also
//! quarantines byte-identical duplicates and removes clutter. Every mutating
//! operation supports a dry run that reports exactly what a real run would do.

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod date_resolver;
pub mod duplicates;
pub mod error;
pub mod exclusion;
pub mod file_category;
pub mod file_organizer;
pub mod large_files;
pub mod output;
pub mod relocator;
pub mod report;
pub mod runner;
pub mod walker;

pub use config::{ConfigError, OrganizerConfig};
pub use date_resolver::{DateResolver, FfprobeProbe, MetadataProbe, NoProbe};
pub use error::{ItemError, TidyError};
pub use file_category::{Category, PathClassifier};
pub use file_organizer::OrganizeOptions;
pub use report::{LogReporter, MemoryReporter, PlannedAction, Reporter};
pub use runner::{OperationRunner, OperationSummary};

pub use cli::{Cli, run_cli};
