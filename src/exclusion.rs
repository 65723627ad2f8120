//! Excluded subtrees.

use std::path::{Path, PathBuf};

/// Ordered set of directory prefixes that operations must never enter.
///
/// Matching is component-wise: `/photos/logs` excludes `/photos/logs/a.jpg`
/// but not `/photos/my_logs/a.jpg`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    prefixes: Vec<PathBuf>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set for an operation rooted at `root`.
    ///
    /// Relative entries are taken relative to `root`. Entries that exist on
    /// disk are canonicalized so they compare equal to paths produced by a
    /// walk of the canonical root.
    pub fn resolve(root: &Path, configured: &[PathBuf]) -> Self {
        let mut set = Self::new();
        for entry in configured {
            let absolute = if entry.is_absolute() {
                entry.clone()
            } else {
                root.join(entry)
            };
            set.insert(absolute);
        }
        set
    }

    /// Adds a prefix, keeping insertion order and skipping duplicates.
    pub fn insert(&mut self, prefix: PathBuf) {
        let prefix = std::fs::canonicalize(&prefix).unwrap_or(prefix);
        if !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
    }

    /// Returns a copy with `prefix` added.
    pub fn with(mut self, prefix: PathBuf) -> Self {
        self.insert(prefix);
        self
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix))
    }

    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_descendants_excluded() {
        let set = ExclusionSet::new().with(PathBuf::from("/nonexistent/photos/private"));

        assert!(set.is_excluded(Path::new("/nonexistent/photos/private")));
        assert!(set.is_excluded(Path::new("/nonexistent/photos/private/2020/a.jpg")));
        assert!(!set.is_excluded(Path::new("/nonexistent/photos")));
        assert!(!set.is_excluded(Path::new("/nonexistent/photos/public/a.jpg")));
    }

    #[test]
    fn test_directory_boundary_respected() {
        let set = ExclusionSet::new().with(PathBuf::from("/nonexistent/photos/logs"));

        assert!(!set.is_excluded(Path::new("/nonexistent/photos/my_logs/a.jpg")));
        assert!(!set.is_excluded(Path::new("/nonexistent/photos/logs_old")));
    }

    #[test]
    fn test_relative_entries_resolve_under_root() {
        let root = Path::new("/nonexistent/root");
        let set = ExclusionSet::resolve(
            root,
            &[PathBuf::from("Private"), PathBuf::from("/nonexistent/elsewhere")],
        );

        assert!(set.is_excluded(Path::new("/nonexistent/root/Private/x.png")));
        assert!(set.is_excluded(Path::new("/nonexistent/elsewhere/y.png")));
        assert!(!set.is_excluded(Path::new("/nonexistent/root/Public/x.png")));
    }

    #[test]
    fn test_duplicates_collapse() {
        let set = ExclusionSet::new()
            .with(PathBuf::from("/nonexistent/a"))
            .with(PathBuf::from("/nonexistent/a"));
        assert_eq!(set.prefixes().len(), 1);
    }

    #[test]
    fn test_existing_prefix_canonicalized() {
        let dir = tempfile::TempDir::new().unwrap();
        let excluded = dir.path().join("skip");
        std::fs::create_dir(&excluded).unwrap();

        let set = ExclusionSet::new().with(excluded.clone());
        let canonical = std::fs::canonicalize(&excluded).unwrap();
        assert!(set.is_excluded(&canonical.join("file.jpg")));
    }

    #[test]
    fn test_empty_set_excludes_nothing() {
        let set = ExclusionSet::new();
        assert!(set.prefixes().is_empty());
        assert!(!set.is_excluded(Path::new("/anything")));
    }
}
