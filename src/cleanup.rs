//! Empty file and folder removal.

use crate::error::ItemError;
use crate::report::PlannedAction;
use crate::runner::OperationContext;
use crate::walker::TreeWalker;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Deletes files and folders for one operation.
///
/// Keeps a ledger of everything it removed, or would have removed in dry-run
/// mode. A folder whose remaining entries are all in the ledger counts as
/// empty, so a simulated run reports the same parents a real run deletes.
#[derive(Debug, Default)]
pub struct CleanupEngine {
    dry_run: bool,
    removed: HashSet<PathBuf>,
}

impl CleanupEngine {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            removed: HashSet::new(),
        }
    }

    pub fn is_removed(&self, path: &Path) -> bool {
        self.removed.contains(path)
    }

    pub fn delete_file(&mut self, path: &Path) -> Result<PlannedAction, ItemError> {
        if !self.dry_run {
            fs::remove_file(path).map_err(|e| ItemError::deleting(path, e))?;
        }
        self.removed.insert(path.to_path_buf());
        Ok(PlannedAction::deleted_file(path.to_path_buf()))
    }

    /// Removes an empty folder. Never removes anything with content.
    pub fn delete_folder(&mut self, path: &Path) -> Result<PlannedAction, ItemError> {
        if !self.dry_run {
            fs::remove_dir(path).map_err(|e| ItemError::deleting(path, e))?;
        }
        self.removed.insert(path.to_path_buf());
        Ok(PlannedAction::deleted_folder(path.to_path_buf()))
    }

    /// True when every entry still in `dir` has already been removed by this
    /// engine. Excluded entries count as content.
    pub fn is_effectively_empty(&self, dir: &Path) -> Result<bool, ItemError> {
        let entries = fs::read_dir(dir).map_err(|e| ItemError::reading(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ItemError::reading(dir, e))?;
            if !self.is_removed(&entry.path()) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn is_zero_byte_file(path: &Path) -> Result<bool, ItemError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| ItemError::reading(path, e))?;
    Ok(metadata.is_file() && metadata.len() == 0)
}

/// Deletes every zero-byte regular file below the root.
pub fn delete_empty_files(ctx: &mut OperationContext<'_>, engine: &mut CleanupEngine) {
    for listing in TreeWalker::new(&ctx.root, &ctx.exclusions) {
        let listing = match listing {
            Ok(listing) => listing,
            Err(e) => {
                ctx.contain(e);
                continue;
            }
        };
        for file in &listing.files {
            match is_zero_byte_file(file) {
                Ok(true) => match engine.delete_file(file) {
                    Ok(action) => ctx.record(action),
                    Err(e) => ctx.contain(e),
                },
                Ok(false) => {}
                Err(e) => ctx.contain(e),
            }
        }
    }
}

/// Deletes folders that are, or have become, empty. The root is kept.
pub fn delete_empty_folders(ctx: &mut OperationContext<'_>, engine: &mut CleanupEngine) {
    let root = ctx.root.clone();
    for listing in TreeWalker::new(&root, &ctx.exclusions).bottom_up() {
        let listing = match listing {
            Ok(listing) => listing,
            Err(e) => {
                ctx.contain(e);
                continue;
            }
        };
        if listing.dir == root {
            continue;
        }
        match engine.is_effectively_empty(&listing.dir) {
            Ok(true) => match engine.delete_folder(&listing.dir) {
                Ok(action) => ctx.record(action),
                Err(e) => ctx.contain(e),
            },
            Ok(false) => {}
            Err(e) => ctx.contain(e),
        }
    }
}

/// Empty files first, then the folders that leaves empty.
pub fn clean_empty(ctx: &mut OperationContext<'_>) {
    let mut engine = CleanupEngine::new(ctx.dry_run);
    delete_empty_files(ctx, &mut engine);
    delete_empty_folders(ctx, &mut engine);
}
