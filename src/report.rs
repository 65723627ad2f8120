//! Reporting sink used by every operation.
//!
//! The engine never prints. Everything it has to say goes through a
//! [`Reporter`]: start and end of an operation, each planned action, and
//! per-item warnings. Dry-run and real runs emit the same records; only the
//! verb of an action line changes.

use crate::runner::OperationSummary;
use log::Level;
use serde::Serialize;
use std::cell::RefCell;
use std::path::PathBuf;

/// Kind of filesystem mutation an operation decided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    DeleteFile,
    DeleteFolder,
}

impl ActionKind {
    /// Verb for a completed action.
    pub fn past_tense(&self) -> &'static str {
        match self {
            ActionKind::Move => "Moved",
            ActionKind::DeleteFile => "Deleted",
            ActionKind::DeleteFolder => "Deleted folder",
        }
    }

    /// Verb for a simulated action.
    pub fn conditional(&self) -> &'static str {
        match self {
            ActionKind::Move => "Would move",
            ActionKind::DeleteFile => "Would delete",
            ActionKind::DeleteFolder => "Would delete folder",
        }
    }
}

/// One mutation decision, executed or simulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    pub kind: ActionKind,
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
}

impl PlannedAction {
    pub fn moved(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            kind: ActionKind::Move,
            source,
            destination: Some(destination),
        }
    }

    pub fn deleted_file(path: PathBuf) -> Self {
        Self {
            kind: ActionKind::DeleteFile,
            source: path,
            destination: None,
        }
    }

    pub fn deleted_folder(path: PathBuf) -> Self {
        Self {
            kind: ActionKind::DeleteFolder,
            source: path,
            destination: None,
        }
    }

    /// Report line for this action, e.g. `Moved: a.jpg → 2021/07/a.jpg` or
    /// `[DRY RUN] Would move: a.jpg → 2021/07/a.jpg`.
    pub fn describe(&self, dry_run: bool) -> String {
        let verb = if dry_run {
            format!("[DRY RUN] {}", self.kind.conditional())
        } else {
            self.kind.past_tense().to_string()
        };
        match &self.destination {
            Some(destination) => format!(
                "{}: {} → {}",
                verb,
                self.source.display(),
                destination.display()
            ),
            None => format!("{}: {}", verb, self.source.display()),
        }
    }
}

/// A single reported message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub level: Level,
    pub message: String,
}

/// Sink for everything an operation reports.
///
/// Implementors only have to provide [`Reporter::record`]; the other methods
/// format their messages and forward to it.
pub trait Reporter {
    fn record(&self, level: Level, message: &str);

    fn started(&self, operation: &str, dry_run: bool) {
        self.record(Level::Info, &format!("Starting {}...", operation));
        if dry_run {
            self.record(
                Level::Info,
                &format!("{} running in DRY RUN mode.", operation),
            );
        }
    }

    fn finished(&self, summary: &OperationSummary) {
        self.record(
            Level::Info,
            &format!(
                "Completed {}: {} {}, {} {}.",
                summary.operation,
                summary.actions.len(),
                if summary.actions.len() == 1 { "action" } else { "actions" },
                summary.failures,
                if summary.failures == 1 { "failure" } else { "failures" },
            ),
        );
    }

    fn action(&self, action: &PlannedAction, dry_run: bool) {
        self.record(Level::Info, &action.describe(dry_run));
    }

    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }
}

/// Forwards every record to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn record(&self, level: Level, message: &str) {
        log::log!(target: "mediatidy", level, "{}", message);
    }
}

/// Keeps records in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    records: RefCell<Vec<Record>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl Reporter for MemoryReporter {
    fn record(&self, level: Level, message: &str) {
        self.records.borrow_mut().push(Record {
            level,
            message: message.to_string(),
        });
    }
}
