//! Exclusion-aware directory traversal.
//!
//! [`TreeWalker`] yields one [`DirListing`] per directory, in the style of a
//! `(directory, subdirectories, files)` triple. Excluded subtrees are pruned
//! before they are read: they are never yielded, never descended into and
//! never listed as a parent's subdirectory.
//!
//! The listing of a directory is read at the moment it is yielded. Bottom-up
//! consumers therefore observe the effects of whatever they did to the
//! children, which is what empty-folder removal relies on.

use crate::error::ItemError;
use crate::exclusion::ExclusionSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// Order in which directories are yielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOrder {
    /// Parents before children.
    TopDown,
    /// Children before parents.
    BottomUp,
}

/// Contents of a single directory at the time it was visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirListing {
    pub dir: PathBuf,
    /// Non-excluded subdirectories, sorted by name.
    pub subdirs: Vec<PathBuf>,
    /// Every non-directory entry, sorted by name.
    pub files: Vec<PathBuf>,
}

/// A file with the metadata the operations need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Lower-cased extension without the dot.
    pub extension: Option<String>,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            extension: lowercase_extension(path),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// Lower-cased extension of `path`, without the leading dot.
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Builder for a pruned traversal rooted at one directory.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    exclusions: ExclusionSet,
    skip_names: Vec<OsString>,
    order: WalkOrder,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>, exclusions: &ExclusionSet) -> Self {
        Self {
            root: root.into(),
            exclusions: exclusions.clone(),
            skip_names: Vec::new(),
            order: WalkOrder::TopDown,
        }
    }

    /// Yield children before their parents.
    pub fn bottom_up(mut self) -> Self {
        self.order = WalkOrder::BottomUp;
        self
    }

    /// Prune every directory called `name`, wherever it appears below the root.
    pub fn skip_named(mut self, name: &str) -> Self {
        self.skip_names.push(OsString::from(name));
        self
    }

    fn is_pruned(&self, dir: &Path, depth: usize) -> bool {
        if self.exclusions.is_excluded(dir) {
            return true;
        }
        depth > 0
            && dir
                .file_name()
                .is_some_and(|name| self.skip_names.iter().any(|skip| skip == name))
    }
}

impl IntoIterator for TreeWalker {
    type Item = Result<DirListing, ItemError>;
    type IntoIter = Walk;

    fn into_iter(self) -> Walk {
        let state = match self.order {
            WalkOrder::TopDown => WalkState::TopDown(Box::new(directories(&self))),
            WalkOrder::BottomUp => {
                // First pass: the pruned pre-order list of directories. Every
                // child comes after its parent there, so the reversed list
                // puts children first.
                let mut collected: Vec<Result<PathBuf, ItemError>> =
                    directories(&self).collect();
                collected.reverse();
                WalkState::BottomUp(collected.into_iter())
            }
        };
        Walk { walker: self, state }
    }
}

enum WalkState {
    TopDown(Box<dyn Iterator<Item = Result<PathBuf, ItemError>>>),
    BottomUp(std::vec::IntoIter<Result<PathBuf, ItemError>>),
}

/// Lazy iterator produced by [`TreeWalker`].
pub struct Walk {
    walker: TreeWalker,
    state: WalkState,
}

impl Iterator for Walk {
    type Item = Result<DirListing, ItemError>;

    fn next(&mut self) -> Option<Self::Item> {
        let dir = match &mut self.state {
            WalkState::TopDown(dirs) => dirs.next()?,
            WalkState::BottomUp(dirs) => dirs.next()?,
        };
        Some(dir.and_then(|dir| read_listing(&self.walker, dir)))
    }
}

/// Pre-order directory paths below the walker's root, pruned.
///
/// A directory that cannot be opened is yielded once as `Ok`, and reading its
/// listing reports the failure. walkdir's own error for the same directory
/// follows immediately and is dropped.
fn directories(walker: &TreeWalker) -> impl Iterator<Item = Result<PathBuf, ItemError>> + 'static {
    let pruner = walker.clone();
    let root = walker.root.clone();
    let mut last_yielded: Option<PathBuf> = None;
    WalkDir::new(&walker.root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            entry.file_type().is_dir() && !pruner.is_pruned(entry.path(), entry.depth())
        })
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                let path = entry.into_path();
                last_yielded = Some(path.clone());
                Some(Ok(path))
            }
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                if last_yielded.take().is_some_and(|last| last == path) {
                    return None;
                }
                let error = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
                Some(Err(ItemError::reading(&path, error)))
            }
        })
}

fn read_listing(walker: &TreeWalker, dir: PathBuf) -> Result<DirListing, ItemError> {
    let entries = fs::read_dir(&dir).map_err(|e| ItemError::reading(&dir, e))?;

    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ItemError::reading(&dir, e))?;
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            if !walker.is_pruned(&path, 1) {
                subdirs.push(path);
            }
        } else {
            files.push(path);
        }
    }
    subdirs.sort();
    files.sort();

    Ok(DirListing {
        dir,
        subdirs,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> (TempDir, PathBuf) {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = fs::canonicalize(temp.path()).unwrap();
        let root = root.as_path();
        fs::create_dir_all(root.join("a/inner")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("private/deep")).unwrap();
        fs::write(root.join("top.jpg"), b"x").unwrap();
        fs::write(root.join("a/one.jpg"), b"x").unwrap();
        fs::write(root.join("a/inner/two.mp4"), b"x").unwrap();
        fs::write(root.join("private/secret.jpg"), b"x").unwrap();
        fs::write(root.join("private/deep/hidden.jpg"), b"x").unwrap();
        let root = root.to_path_buf();
        (temp, root)
    }

    fn dirs(walker: TreeWalker) -> Vec<PathBuf> {
        walker
            .into_iter()
            .map(|listing| listing.expect("listing").dir)
            .collect()
    }

    #[test]
    fn test_top_down_visits_parents_first() {
        let (_temp, root) = tree();
        let root = root.as_path();

        let visited = dirs(TreeWalker::new(root, &ExclusionSet::new()));

        assert_eq!(visited[0], root);
        let pos = |p: &Path| visited.iter().position(|d| d == p).unwrap();
        assert!(pos(&root.join("a")) < pos(&root.join("a/inner")));
        assert_eq!(visited.len(), 6);
    }

    #[test]
    fn test_bottom_up_visits_children_first() {
        let (_temp, root) = tree();
        let root = root.as_path();

        let visited = dirs(TreeWalker::new(root, &ExclusionSet::new()).bottom_up());

        assert_eq!(visited.last().unwrap(), root);
        let pos = |p: &Path| visited.iter().position(|d| d == p).unwrap();
        assert!(pos(&root.join("a/inner")) < pos(&root.join("a")));
        assert!(pos(&root.join("private/deep")) < pos(&root.join("private")));
    }

    #[test]
    fn test_excluded_subtree_is_pruned() {
        let (_temp, root) = tree();
        let root = root.as_path();
        let exclusions = ExclusionSet::new().with(root.join("private"));

        for walker in [
            TreeWalker::new(root, &exclusions),
            TreeWalker::new(root, &exclusions).bottom_up(),
        ] {
            let listings: Vec<DirListing> = walker.into_iter().map(|l| l.unwrap()).collect();
            for listing in &listings {
                assert!(!listing.dir.starts_with(root.join("private")));
                assert!(!listing.subdirs.contains(&root.join("private")));
                assert!(listing.files.iter().all(|f| !f.starts_with(root.join("private"))));
            }
            assert_eq!(listings.len(), 4);
        }
    }

    #[test]
    fn test_excluded_root_yields_nothing() {
        let (_temp, root) = tree();
        let exclusions = ExclusionSet::new().with(root.clone());

        assert!(dirs(TreeWalker::new(&root, &exclusions)).is_empty());
    }

    #[test]
    fn test_skip_named_prunes_matching_directories() {
        let (_temp, root) = tree();
        let root = root.as_path();

        let visited = dirs(TreeWalker::new(root, &ExclusionSet::new()).skip_named("inner"));

        assert!(!visited.contains(&root.join("a/inner")));
        assert!(visited.contains(&root.join("a")));
    }

    #[test]
    fn test_listing_splits_files_and_subdirs() {
        let (_temp, root) = tree();
        let root = root.as_path();

        let first = TreeWalker::new(root, &ExclusionSet::new())
            .into_iter()
            .next()
            .unwrap()
            .unwrap();

        assert_eq!(first.files, vec![root.join("top.jpg")]);
        assert_eq!(
            first.subdirs,
            vec![root.join("a"), root.join("b"), root.join("private")]
        );
    }

    #[test]
    fn test_bottom_up_listing_reflects_removed_children() {
        let (_temp, root) = tree();
        let root = root.as_path();

        for listing in TreeWalker::new(root, &ExclusionSet::new()).bottom_up() {
            let listing = listing.unwrap();
            if listing.dir == root.join("b") {
                fs::remove_dir(&listing.dir).unwrap();
            }
            if listing.dir == root {
                assert!(!listing.subdirs.contains(&root.join("b")));
            }
        }
    }

    #[test]
    fn test_file_entry_reads_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Clip.MP4");
        fs::write(&path, b"12345").unwrap();

        let entry = FileEntry::from_path(&path).unwrap();
        assert_eq!(entry.extension.as_deref(), Some("mp4"));
        assert_eq!(entry.size, 5);
        assert!(entry.modified.is_some());
    }

    #[test]
    fn test_missing_root_reports_error() {
        let mut walk = TreeWalker::new("/nonexistent/mediatidy/root", &ExclusionSet::new()).into_iter();
        assert!(matches!(walk.next(), Some(Err(_))));
    }

    #[test]
    #[cfg(unix)]
    fn test_unreadable_directory_is_reported_once() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, root) = tree();
        let locked = root.join("b");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Running with privileges that ignore permission bits.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        for walker in [
            TreeWalker::new(&root, &ExclusionSet::new()),
            TreeWalker::new(&root, &ExclusionSet::new()).bottom_up(),
        ] {
            let results: Vec<_> = walker.into_iter().collect();
            let errors = results.iter().filter(|r| r.is_err()).count();
            let listed = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(errors, 1);
            assert_eq!(listed, 5);
        }

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
