//! Moves media into a dated hierarchy and quarantines unwanted files.
//!
//! Sorted output lives under `<root>/Sorted_Media`, either as one shared
//! `YYYY/MM` tree or split per category (`Images/YYYY/MM`, `Videos/YYYY/MM`).
//! Files without a plausible date go to an `Unsorted` folder next to the
//! year folders. Both output folders are skipped when walking the root, so
//! running an operation twice never reprocesses its own output.

use crate::date_resolver::DateResolver;
use crate::file_category::Category;
use crate::relocator::ConflictFreeRelocator;
use crate::runner::OperationContext;
use crate::walker::TreeWalker;
use std::path::{Path, PathBuf};

/// Output folder of the organize operation, directly under the root.
pub const SORTED_MEDIA_DIR: &str = "Sorted_Media";

/// Quarantine folder for unwanted files, directly under the root.
pub const UNWANTED_DIR: &str = "Unwanted_Files";

/// Layout switches for one organize run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrganizeOptions {
    /// Put images and videos in the same `YYYY/MM` folders.
    pub merge_categories: bool,
    /// Also sort files that are neither images nor videos, by modification time.
    pub include_unclassified: bool,
}

impl OrganizeOptions {
    pub fn merged() -> Self {
        Self {
            merge_categories: true,
            include_unclassified: false,
        }
    }

    fn sorts(&self, category: Category) -> bool {
        match category {
            Category::Image | Category::Video => true,
            Category::Unclassified => self.include_unclassified,
            Category::Unwanted => false,
        }
    }
}

/// Base folder for `category` under `sorted_root`.
pub fn category_root(sorted_root: &Path, category: Category, options: OrganizeOptions) -> PathBuf {
    if options.merge_categories {
        sorted_root.to_path_buf()
    } else {
        sorted_root.join(category.dir_name())
    }
}

/// Sorts every image and video below the root into `Sorted_Media`.
///
/// # Examples
///
/// ```no_run
/// use mediatidy::config::OrganizerConfig;
/// use mediatidy::report::LogReporter;
/// use mediatidy::runner::OperationRunner;
///
/// let config = OrganizerConfig {
///     source_dir: "/home/me/Pictures".into(),
///     ..OrganizerConfig::default()
/// };
/// let reporter = LogReporter;
/// let summary = OperationRunner::new(config, &reporter).organize(true, true)?;
/// println!("{} files would move", summary.actions.len());
/// # Ok::<(), mediatidy::error::TidyError>(())
/// ```
pub fn organize(ctx: &mut OperationContext<'_>, options: OrganizeOptions) {
    let sorted_root = ctx.root.join(SORTED_MEDIA_DIR);
    let exclusions = ctx
        .exclusions
        .clone()
        .with(sorted_root.clone())
        .with(ctx.root.join(UNWANTED_DIR));

    let resolver = DateResolver::new(ctx.probe);
    let mut relocator = ConflictFreeRelocator::new(ctx.dry_run);

    for listing in TreeWalker::new(&ctx.root, &exclusions) {
        let listing = match listing {
            Ok(listing) => listing,
            Err(e) => {
                ctx.contain(e);
                continue;
            }
        };
        for file in &listing.files {
            let category = ctx.classifier.classify(file);
            if !options.sorts(category) {
                continue;
            }
            let Some(name) = file.file_name() else {
                continue;
            };

            let record = resolver.resolve(file, category);
            let bucket = resolver.bucket(record.as_ref());
            let target = category_root(&sorted_root, category, options)
                .join(bucket.relative_dir())
                .join(name);

            match relocator.relocate(file, target) {
                Ok(action) => ctx.record(action),
                Err(e) => ctx.contain(e),
            }
        }
    }
}

/// Moves every unwanted file below the root into `Unwanted_Files`.
pub fn move_unwanted(ctx: &mut OperationContext<'_>) {
    let quarantine = ctx.root.join(UNWANTED_DIR);
    let exclusions = ctx.exclusions.clone().with(quarantine.clone());
    let mut relocator = ConflictFreeRelocator::new(ctx.dry_run);

    for listing in TreeWalker::new(&ctx.root, &exclusions) {
        let listing = match listing {
            Ok(listing) => listing,
            Err(e) => {
                ctx.contain(e);
                continue;
            }
        };
        for file in &listing.files {
            if ctx.classifier.classify(file) != Category::Unwanted {
                continue;
            }
            let Some(name) = file.file_name() else {
                continue;
            };
            match relocator.relocate(file, quarantine.join(name)) {
                Ok(action) => ctx.record(action),
                Err(e) => ctx.contain(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrganizerConfig;
    use crate::date_resolver::MetadataProbe;
    use crate::report::{MemoryReporter, PlannedAction};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    struct FixedProbe(NaiveDateTime);

    impl MetadataProbe for FixedProbe {
        fn probe_creation_time(&self, _path: &Path) -> Option<NaiveDateTime> {
            Some(self.0)
        }
    }

    fn root() -> (TempDir, PathBuf) {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = fs::canonicalize(temp.path()).unwrap();
        (temp, root)
    }

    /// Writes a file whose modification time is mid-June 2020.
    fn write_2020(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(1_592_222_400))
            .unwrap();
    }

    fn run<F>(root: &Path, dry_run: bool, probe: &dyn MetadataProbe, op: F) -> Vec<PlannedAction>
    where
        F: FnOnce(&mut OperationContext<'_>),
    {
        let config = OrganizerConfig {
            source_dir: root.to_path_buf(),
            ..OrganizerConfig::default()
        };
        let reporter = MemoryReporter::new();
        let mut ctx =
            OperationContext::new("test", root.to_path_buf(), dry_run, &config, probe, &reporter);
        op(&mut ctx);
        ctx.into_summary().actions
    }

    fn probe_2019() -> FixedProbe {
        FixedProbe(
            NaiveDate::from_ymd_opt(2019, 3, 14)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_merged_layout_shares_month_folders() {
        let (_temp, root) = root();
        write_2020(&root.join("camera/a.jpg"));
        write_2020(&root.join("phone/b.mp4"));

        let probe = probe_2019();
        run(&root, false, &probe, |ctx| organize(ctx, OrganizeOptions::merged()));

        assert!(root.join("Sorted_Media/2020/06/a.jpg").exists());
        assert!(root.join("Sorted_Media/2019/03/b.mp4").exists());
        assert!(!root.join("camera/a.jpg").exists());
    }

    #[test]
    fn test_split_layout_separates_categories() {
        let (_temp, root) = root();
        write_2020(&root.join("a.jpg"));
        write_2020(&root.join("b.mov"));

        let probe = probe_2019();
        run(&root, false, &probe, |ctx| organize(ctx, OrganizeOptions::default()));

        assert!(root.join("Sorted_Media/Images/2020/06/a.jpg").exists());
        assert!(root.join("Sorted_Media/Videos/2019/03/b.mov").exists());
    }

    #[test]
    fn test_unwanted_and_unclassified_stay_by_default() {
        let (_temp, root) = root();
        write_2020(&root.join("notes.txt"));
        write_2020(&root.join("Thumbs.db"));

        let probe = probe_2019();
        let actions = run(&root, false, &probe, |ctx| organize(ctx, OrganizeOptions::merged()));

        assert!(actions.is_empty());
        assert!(root.join("notes.txt").exists());
        assert!(root.join("Thumbs.db").exists());
    }

    #[test]
    fn test_unclassified_sorted_when_included() {
        let (_temp, root) = root();
        write_2020(&root.join("notes.txt"));

        let options = OrganizeOptions {
            merge_categories: false,
            include_unclassified: true,
        };
        let probe = probe_2019();
        run(&root, false, &probe, |ctx| organize(ctx, options));

        assert!(root.join("Sorted_Media/Other/2020/06/notes.txt").exists());
    }

    #[test]
    fn test_implausible_date_goes_to_unsorted_in_category_folder() {
        let (_temp, root) = root();
        write_2020(&root.join("clip.mp4"));

        let probe = FixedProbe(
            NaiveDate::from_ymd_opt(1970, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        run(&root, false, &probe, |ctx| organize(ctx, OrganizeOptions::default()));

        assert!(root.join("Sorted_Media/Videos/Unsorted/clip.mp4").exists());
    }

    #[test]
    fn test_sorted_output_is_not_reprocessed() {
        let (_temp, root) = root();
        write_2020(&root.join("Sorted_Media/2020/06/old.jpg"));
        write_2020(&root.join("new.jpg"));

        let probe = probe_2019();
        let actions = run(&root, false, &probe, |ctx| organize(ctx, OrganizeOptions::merged()));

        assert_eq!(actions.len(), 1);
        assert!(root.join("Sorted_Media/2020/06/old.jpg").exists());
        assert!(root.join("Sorted_Media/2020/06/new.jpg").exists());
    }

    #[test]
    fn test_same_names_get_numbered_variants() {
        let (_temp, root) = root();
        write_2020(&root.join("a/IMG.jpg"));
        write_2020(&root.join("b/IMG.jpg"));

        let probe = probe_2019();
        run(&root, false, &probe, |ctx| organize(ctx, OrganizeOptions::merged()));

        let month = root.join("Sorted_Media/2020/06");
        assert!(month.join("IMG.jpg").exists());
        assert!(month.join("IMG_1.jpg").exists());
    }

    #[test]
    fn test_move_unwanted_quarantines_by_name_and_extension() {
        let (_temp, root) = root();
        write_2020(&root.join("a/Thumbs.db"));
        write_2020(&root.join("b/Thumbs.db"));
        write_2020(&root.join("c/scratch.tmp"));
        write_2020(&root.join("c/photo.jpg"));

        let probe = probe_2019();
        let actions = run(&root, false, &probe, move_unwanted);

        assert_eq!(actions.len(), 3);
        let quarantine = root.join(UNWANTED_DIR);
        assert!(quarantine.join("Thumbs.db").exists());
        assert!(quarantine.join("Thumbs_1.db").exists());
        assert!(quarantine.join("scratch.tmp").exists());
        assert!(root.join("c/photo.jpg").exists());
    }

    #[test]
    fn test_move_unwanted_leaves_quarantine_alone() {
        let (_temp, root) = root();
        write_2020(&root.join("Unwanted_Files/old.tmp"));

        let probe = probe_2019();
        let actions = run(&root, false, &probe, move_unwanted);

        assert!(actions.is_empty());
        assert!(root.join("Unwanted_Files/old.tmp").exists());
    }
}
