//! Terminal output.
//!
//! [`ConsoleReporter`] is the default [`Reporter`] of the command-line tool:
//! colored, one line per record, followed by a summary table when an
//! operation finishes.

use crate::report::{ActionKind, PlannedAction, Reporter};
use crate::runner::OperationSummary;
use colored::*;
use log::Level;
use std::collections::BTreeMap;

/// Writes styled messages to stdout and stderr.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mediatidy::output::OutputFormatter;
    /// OutputFormatter::success("Sorted 12 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run action line in yellow.
    pub fn dry_run_notice(message: &str) {
        println!("{}", message.yellow());
    }

    /// Prints the action counts of a finished operation, and the large files
    /// it found.
    pub fn summary_table(summary: &OperationSummary) {
        Self::header("SUMMARY");

        let rows = summary_rows(summary);
        let label_width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max("Action".len());

        println!(
            "{:<width$} | {}",
            "Action".bold(),
            "Items".bold(),
            width = label_width
        );
        println!("{}", "-".repeat(label_width + 10));
        for (label, count) in &rows {
            println!(
                "{:<width$} | {}",
                label,
                count.to_string().green(),
                width = label_width
            );
        }
        println!("{}", "-".repeat(label_width + 10));
        println!(
            "{:<width$} | {}",
            "Failures".bold(),
            if summary.failures == 0 {
                summary.failures.to_string().green()
            } else {
                summary.failures.to_string().red()
            },
            width = label_width
        );

        if !summary.large_files.is_empty() {
            Self::header("LARGE FILES");
            for file in &summary.large_files {
                println!(
                    "{:>10.2} MB  {}",
                    file.size_mb,
                    file.path.display().to_string().cyan()
                );
            }
        }

        if summary.dry_run {
            Self::dry_run_notice("\nDry run complete. No files were modified.");
        }
    }
}

/// Label and count per action kind, in a stable order.
fn summary_rows(summary: &OperationSummary) -> Vec<(&'static str, usize)> {
    let mut counts: BTreeMap<u8, (&'static str, usize)> = BTreeMap::new();
    for action in &summary.actions {
        let (order, label) = row_label(action, summary.dry_run);
        counts.entry(order).or_insert((label, 0)).1 += 1;
    }
    counts.into_values().collect()
}

fn row_label(action: &PlannedAction, dry_run: bool) -> (u8, &'static str) {
    let order = match action.kind {
        ActionKind::Move => 0,
        ActionKind::DeleteFile => 1,
        ActionKind::DeleteFolder => 2,
    };
    let label = if dry_run {
        action.kind.conditional()
    } else {
        action.kind.past_tense()
    };
    (order, label)
}

/// Colored [`Reporter`] for interactive use.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses everything but warnings and errors.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

impl Reporter for ConsoleReporter {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::Error => OutputFormatter::error(message),
            Level::Warn => OutputFormatter::warning(message),
            _ if self.quiet => {}
            Level::Info => OutputFormatter::plain(message),
            Level::Debug | Level::Trace => OutputFormatter::info(message),
        }
    }

    fn started(&self, operation: &str, dry_run: bool) {
        if self.quiet {
            return;
        }
        OutputFormatter::header(&format!("Starting {}...", operation));
        if dry_run {
            OutputFormatter::dry_run_notice(&format!("{} running in DRY RUN mode.", operation));
        }
    }

    fn action(&self, action: &PlannedAction, dry_run: bool) {
        if self.quiet {
            return;
        }
        let line = action.describe(dry_run);
        if dry_run {
            OutputFormatter::dry_run_notice(&line);
        } else {
            OutputFormatter::success(&line);
        }
    }

    fn finished(&self, summary: &OperationSummary) {
        if self.quiet {
            return;
        }
        OutputFormatter::summary_table(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_summary_rows_group_by_kind() {
        let mut summary = OperationSummary::new("clean empty", false);
        summary.actions = vec![
            PlannedAction::deleted_folder(PathBuf::from("/m/a")),
            PlannedAction::deleted_file(PathBuf::from("/m/a/x")),
            PlannedAction::deleted_file(PathBuf::from("/m/a/y")),
        ];

        assert_eq!(
            summary_rows(&summary),
            vec![("Deleted", 2), ("Deleted folder", 1)]
        );
    }

    #[test]
    fn test_summary_rows_use_conditional_verbs_in_dry_run() {
        let mut summary = OperationSummary::new("organize", true);
        summary.actions = vec![PlannedAction::moved(
            PathBuf::from("/m/a.jpg"),
            PathBuf::from("/m/Sorted_Media/2020/01/a.jpg"),
        )];

        assert_eq!(summary_rows(&summary), vec![("Would move", 1)]);
    }
}
