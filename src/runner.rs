//! Operation lifecycle.
//!
//! [`OperationRunner`] is the only entry point the CLI uses. Each call runs
//! one operation through the same sequence: validate the root, report the
//! start, execute, report the end. Problems with individual files are
//! contained inside the operation and counted; only a bad root aborts.

use crate::cleanup;
use crate::config::OrganizerConfig;
use crate::date_resolver::{FfprobeProbe, MetadataProbe, NoProbe};
use crate::duplicates;
use crate::error::{ItemError, Result, TidyError};
use crate::exclusion::ExclusionSet;
use crate::file_category::PathClassifier;
use crate::file_organizer::{self, OrganizeOptions};
use crate::large_files::{self, LargeFile};
use crate::report::{PlannedAction, Reporter};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// What an operation did, or would have done in dry-run mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSummary {
    pub operation: String,
    pub dry_run: bool,
    pub actions: Vec<PlannedAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub large_files: Vec<LargeFile>,
    /// Items skipped because of an error.
    pub failures: usize,
}

impl OperationSummary {
    pub fn new(operation: &str, dry_run: bool) -> Self {
        Self {
            operation: operation.to_string(),
            dry_run,
            actions: Vec::new(),
            large_files: Vec::new(),
            failures: 0,
        }
    }
}

/// State shared by the steps of one operation.
///
/// Built fresh for every call; nothing in here outlives the operation.
pub struct OperationContext<'a> {
    /// Canonical operation root.
    pub root: PathBuf,
    pub exclusions: ExclusionSet,
    pub dry_run: bool,
    pub config: &'a OrganizerConfig,
    pub classifier: PathClassifier,
    pub probe: &'a dyn MetadataProbe,
    reporter: &'a dyn Reporter,
    summary: OperationSummary,
}

impl<'a> OperationContext<'a> {
    pub fn new(
        operation: &str,
        root: PathBuf,
        dry_run: bool,
        config: &'a OrganizerConfig,
        probe: &'a dyn MetadataProbe,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            exclusions: ExclusionSet::resolve(&root, &config.excluded_folders),
            root,
            dry_run,
            config,
            classifier: PathClassifier::from_config(config),
            probe,
            reporter,
            summary: OperationSummary::new(operation, dry_run),
        }
    }

    /// Reports and records a mutation decision.
    pub fn record(&mut self, action: PlannedAction) {
        self.reporter.action(&action, self.dry_run);
        self.summary.actions.push(action);
    }

    /// Reports a per-item failure and counts it. The operation carries on.
    pub fn contain(&mut self, error: ItemError) {
        self.reporter.warning(&error.to_string());
        self.summary.failures += 1;
    }

    pub fn report_large_file(&mut self, file: LargeFile) {
        self.reporter.info(&format!(
            "Large file: {} ({:.2} MB)",
            file.path.display(),
            file.size_mb
        ));
        self.summary.large_files.push(file);
    }

    pub fn info(&self, message: &str) {
        self.reporter.info(message);
    }

    pub fn warn(&self, message: &str) {
        self.reporter.warning(message);
    }

    pub fn summary(&self) -> &OperationSummary {
        &self.summary
    }

    pub fn into_summary(self) -> OperationSummary {
        self.summary
    }
}

/// Runs operations against the configured source directory.
pub struct OperationRunner<'a> {
    config: OrganizerConfig,
    reporter: &'a dyn Reporter,
    probe: Box<dyn MetadataProbe>,
}

impl<'a> OperationRunner<'a> {
    /// Creates a runner. The video probe is `ffprobe` unless disabled in the
    /// configuration.
    pub fn new(config: OrganizerConfig, reporter: &'a dyn Reporter) -> Self {
        let probe: Box<dyn MetadataProbe> = if config.probe.enabled {
            Box::new(FfprobeProbe::new(
                config.probe.program.clone(),
                config.probe.timeout(),
            ))
        } else {
            Box::new(NoProbe)
        };
        Self {
            config,
            reporter,
            probe,
        }
    }

    /// Replaces the video metadata probe.
    pub fn with_probe(mut self, probe: Box<dyn MetadataProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Sorts media into `Sorted_Media`, by year and month.
    pub fn organize(&self, dry_run: bool, merge_categories: bool) -> Result<OperationSummary> {
        let options = OrganizeOptions {
            merge_categories,
            include_unclassified: self.config.include_unclassified,
        };
        self.organize_with(dry_run, options)
    }

    pub fn organize_with(
        &self,
        dry_run: bool,
        options: OrganizeOptions,
    ) -> Result<OperationSummary> {
        self.run("organize", dry_run, |ctx| file_organizer::organize(ctx, options))
    }

    /// Moves byte-identical media into per-folder `Duplicates` folders.
    pub fn deduplicate(&self, dry_run: bool) -> Result<OperationSummary> {
        self.run("deduplicate", dry_run, duplicates::deduplicate)
    }

    /// Deletes every `Duplicates` folder under `Sorted_Media` with its contents.
    pub fn remove_duplicate_folders(&self, dry_run: bool) -> Result<OperationSummary> {
        self.run(
            "remove duplicate folders",
            dry_run,
            duplicates::remove_duplicate_folders,
        )
    }

    /// Deletes zero-byte files, then folders left empty.
    pub fn clean_empty(&self, dry_run: bool) -> Result<OperationSummary> {
        self.run("clean empty", dry_run, cleanup::clean_empty)
    }

    /// Moves unwanted files into `Unwanted_Files`.
    pub fn move_unwanted(&self, dry_run: bool) -> Result<OperationSummary> {
        self.run("move unwanted", dry_run, file_organizer::move_unwanted)
    }

    /// Lists files above the size threshold. Never mutates anything.
    pub fn find_large(&self) -> Result<OperationSummary> {
        self.run("find large files", false, large_files::find_large_files)
    }

    fn validate_root(&self) -> Result<PathBuf> {
        let source = &self.config.source_dir;
        if source.as_os_str().is_empty() {
            return Err(TidyError::DirectoryNotFound(source.clone()));
        }
        match fs::canonicalize(source) {
            Ok(root) if root.is_dir() => Ok(root),
            _ => Err(TidyError::DirectoryNotFound(source.clone())),
        }
    }

    fn run<F>(&self, operation: &str, dry_run: bool, execute: F) -> Result<OperationSummary>
    where
        F: FnOnce(&mut OperationContext<'_>),
    {
        let root = match self.validate_root() {
            Ok(root) => root,
            Err(err) => {
                self.reporter.error(&err.to_string());
                return Err(err);
            }
        };

        self.reporter.started(operation, dry_run);
        let mut ctx = OperationContext::new(
            operation,
            root,
            dry_run,
            &self.config,
            self.probe.as_ref(),
            self.reporter,
        );
        execute(&mut ctx);

        let summary = ctx.into_summary();
        self.reporter.finished(&summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;
    use log::Level;
    use tempfile::TempDir;

    fn config_for(dir: &std::path::Path) -> OrganizerConfig {
        OrganizerConfig {
            source_dir: dir.to_path_buf(),
            probe: crate::config::ProbeConfig {
                enabled: false,
                ..Default::default()
            },
            ..OrganizerConfig::default()
        }
    }

    #[test]
    fn test_missing_root_is_fatal_and_reported() {
        let reporter = MemoryReporter::new();
        let config = config_for(std::path::Path::new("/nonexistent/mediatidy"));
        let runner = OperationRunner::new(config, &reporter);

        let result = runner.clean_empty(false);

        assert!(matches!(result, Err(TidyError::DirectoryNotFound(_))));
        assert_eq!(reporter.messages_at(Level::Error).len(), 1);
        assert!(!reporter.messages().iter().any(|m| m.starts_with("Starting")));
    }

    #[test]
    fn test_empty_root_is_fatal() {
        let reporter = MemoryReporter::new();
        let runner = OperationRunner::new(OrganizerConfig::default(), &reporter);

        assert!(matches!(
            runner.find_large(),
            Err(TidyError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_file_as_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("photo.jpg");
        std::fs::write(&file, b"x").unwrap();
        let reporter = MemoryReporter::new();
        let runner = OperationRunner::new(config_for(&file), &reporter);

        assert!(runner.organize(true, true).is_err());
    }

    #[test]
    fn test_lifecycle_messages_bracket_the_operation() {
        let temp = TempDir::new().unwrap();
        let reporter = MemoryReporter::new();
        let runner = OperationRunner::new(config_for(temp.path()), &reporter);

        let summary = runner.clean_empty(true).unwrap();

        let messages = reporter.messages();
        assert_eq!(messages[0], "Starting clean empty...");
        assert_eq!(messages[1], "clean empty running in DRY RUN mode.");
        assert_eq!(
            messages.last().unwrap(),
            "Completed clean empty: 0 actions, 0 failures."
        );
        assert!(summary.dry_run);
        assert_eq!(summary.operation, "clean empty");
    }

    #[test]
    fn test_contain_counts_failures_as_warnings() {
        let temp = TempDir::new().unwrap();
        let reporter = MemoryReporter::new();
        let config = config_for(temp.path());
        let mut ctx = OperationContext::new(
            "test",
            temp.path().to_path_buf(),
            false,
            &config,
            &NoProbe,
            &reporter,
        );

        ctx.contain(ItemError::PermissionDenied {
            path: PathBuf::from("/locked"),
        });

        assert_eq!(ctx.summary().failures, 1);
        assert_eq!(reporter.messages_at(Level::Warn).len(), 1);
    }

    #[test]
    fn test_summary_serializes_for_json_output() {
        let mut summary = OperationSummary::new("clean empty", true);
        summary
            .actions
            .push(PlannedAction::deleted_file(PathBuf::from("/m/empty.txt")));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["operation"], "clean empty");
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["actions"][0]["kind"], "delete_file");
        assert!(json.get("large_files").is_none());
    }
}
