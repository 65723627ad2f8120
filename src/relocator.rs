//! Conflict-free file relocation.
//!
//! Every move in the crate goes through [`ConflictFreeRelocator`]. A move
//! never replaces an existing file: when the proposed destination is taken,
//! a numbered variant (`photo_1.jpg`, `photo_2.jpg`, ...) is chosen instead.

use crate::error::ItemError;
use crate::report::PlannedAction;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A single move decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    pub source: PathBuf,
    /// Where the caller wanted the file to go.
    pub proposed: PathBuf,
    /// Where it actually goes; equal to `proposed` unless that was taken.
    pub destination: PathBuf,
}

impl RelocationPlan {
    pub fn action(&self) -> PlannedAction {
        PlannedAction::moved(self.source.clone(), self.destination.clone())
    }
}

/// Returns `proposed`, or the first `<stem>_<n><.ext>` variant for which
/// `taken` is false, counting from 1.
///
/// # Examples
///
/// ```
/// use mediatidy::relocator::conflict_free_path;
/// use std::path::{Path, PathBuf};
///
/// let taken = [PathBuf::from("/m/photo.jpg"), PathBuf::from("/m/photo_1.jpg")];
/// let free = conflict_free_path(Path::new("/m/photo.jpg"), |p| taken.iter().any(|t| t == p));
/// assert_eq!(free, PathBuf::from("/m/photo_2.jpg"));
/// ```
pub fn conflict_free_path(proposed: &Path, taken: impl Fn(&Path) -> bool) -> PathBuf {
    if !taken(proposed) {
        return proposed.to_path_buf();
    }

    let parent = proposed.parent().unwrap_or_else(|| Path::new(""));
    let stem = proposed
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = proposed
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter: u64 = 1;
    loop {
        let candidate = parent.join(format!("{}_{}{}", stem, counter, extension));
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Plans and performs moves for one operation.
///
/// Destinations chosen earlier in the same operation count as taken even in
/// dry-run mode, where nothing is written, so a simulated run picks the same
/// names a real run would.
#[derive(Debug, Default)]
pub struct ConflictFreeRelocator {
    dry_run: bool,
    claimed: HashSet<PathBuf>,
}

impl ConflictFreeRelocator {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            claimed: HashSet::new(),
        }
    }

    fn is_taken(&self, path: &Path) -> bool {
        self.claimed.contains(path) || path.exists()
    }

    /// Picks a free destination for `source` and claims it.
    pub fn plan(&mut self, source: &Path, proposed: PathBuf) -> RelocationPlan {
        let destination = conflict_free_path(&proposed, |p| self.is_taken(p));
        self.claimed.insert(destination.clone());
        RelocationPlan {
            source: source.to_path_buf(),
            proposed,
            destination,
        }
    }

    /// Carries out `plan`, or does nothing in dry-run mode.
    pub fn execute(&self, plan: &RelocationPlan) -> Result<(), ItemError> {
        if self.dry_run {
            return Ok(());
        }

        if let Some(parent) = plan.destination.parent() {
            fs::create_dir_all(parent).map_err(|e| ItemError::creating_dir(parent, e))?;
        }

        match fs::rename(&plan.source, &plan.destination) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                copy_then_remove(&plan.source, &plan.destination)
                    .map_err(|e| ItemError::moving(&plan.source, &plan.destination, e))
            }
            Err(e) => Err(ItemError::moving(&plan.source, &plan.destination, e)),
        }
    }

    /// Moves `source` to `proposed` or a free variant of it.
    ///
    /// Returns the action taken (or that would be taken in dry-run mode).
    pub fn relocate(
        &mut self,
        source: &Path,
        proposed: PathBuf,
    ) -> Result<PlannedAction, ItemError> {
        let plan = self.plan(source, proposed);
        self.execute(&plan)?;
        Ok(plan.action())
    }
}

fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    if let Err(e) = fs::remove_file(source) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}
