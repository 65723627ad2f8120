//! Byte-identical duplicate detection.
//!
//! Duplicates are only looked for within one folder at a time: two identical
//! photos in different month folders are both kept. Within a folder the
//! files are visited shortest name first, then by name, so `photo.jpg` is
//! seen before `photo_1.jpg` or `photo copy.jpg`. The first file visited is
//! the original and every later copy moves into the folder's `Duplicates`
//! subfolder.

use crate::cleanup::CleanupEngine;
use crate::error::ItemError;
use crate::file_organizer::SORTED_MEDIA_DIR;
use crate::relocator::ConflictFreeRelocator;
use crate::runner::OperationContext;
use crate::walker::{DirListing, TreeWalker};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Folder that receives duplicates, one per scope.
pub const DUPLICATES_DIR: &str = "Duplicates";

const BUFFER_SIZE: usize = 8192;

/// Computes the SHA-256 digest of a file as lower-case hex.
///
/// Reads the file in 8 KiB chunks so large videos never sit in memory.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Digest to first-seen path, for one scope.
#[derive(Debug, Default)]
pub struct HashIndex {
    seen: HashMap<String, PathBuf>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `path` under `digest`. If the digest was already seen, the
    /// index is left unchanged and the original path is returned.
    pub fn insert(&mut self, digest: String, path: &Path) -> Option<PathBuf> {
        match self.seen.get(&digest) {
            Some(original) => Some(original.clone()),
            None => {
                self.seen.insert(digest, path.to_path_buf());
                None
            }
        }
    }
}

fn sorted_media_root(ctx: &OperationContext<'_>) -> Option<PathBuf> {
    let sorted = ctx.root.join(SORTED_MEDIA_DIR);
    if sorted.is_dir() {
        Some(sorted)
    } else {
        ctx.info(&format!(
            "No {} folder in {}; nothing to do.",
            SORTED_MEDIA_DIR,
            ctx.root.display()
        ));
        None
    }
}

/// Moves later copies of identical media into `<folder>/Duplicates`, for
/// every folder under `Sorted_Media`.
pub fn deduplicate(ctx: &mut OperationContext<'_>) {
    let Some(sorted) = sorted_media_root(ctx) else {
        return;
    };

    let mut relocator = ConflictFreeRelocator::new(ctx.dry_run);
    for listing in TreeWalker::new(&sorted, &ctx.exclusions).skip_named(DUPLICATES_DIR) {
        match listing {
            Ok(listing) => deduplicate_scope(ctx, &mut relocator, &listing),
            Err(e) => ctx.contain(e),
        }
    }
}

fn deduplicate_scope(
    ctx: &mut OperationContext<'_>,
    relocator: &mut ConflictFreeRelocator,
    listing: &DirListing,
) {
    let mut candidates: Vec<&PathBuf> = listing
        .files
        .iter()
        .filter(|file| ctx.classifier.is_media(file))
        .collect();
    candidates.sort_by_key(|file| {
        let name = file.file_name().unwrap_or_default();
        (name.len(), name.to_os_string())
    });

    let mut index = HashIndex::new();
    for file in candidates {
        let digest = match hash_file(file) {
            Ok(digest) => digest,
            Err(e) => {
                ctx.contain(ItemError::reading(file, e));
                continue;
            }
        };
        if index.insert(digest, file).is_none() {
            continue;
        }
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = listing.dir.join(DUPLICATES_DIR).join(name);
        match relocator.relocate(file, target) {
            Ok(action) => ctx.record(action),
            Err(e) => ctx.contain(e),
        }
    }
}

/// Outermost `Duplicates` folders under `sorted`, outside exclusions.
fn find_duplicate_folders(ctx: &mut OperationContext<'_>, sorted: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for listing in TreeWalker::new(sorted, &ctx.exclusions).skip_named(DUPLICATES_DIR) {
        match listing {
            Ok(listing) => {
                let candidate = listing.dir.join(DUPLICATES_DIR);
                if candidate.is_dir() && !ctx.exclusions.is_excluded(&candidate) {
                    found.push(candidate);
                }
            }
            Err(e) => ctx.contain(e),
        }
    }
    found
}

/// Deletes every `Duplicates` folder under `Sorted_Media`, contents first.
pub fn remove_duplicate_folders(ctx: &mut OperationContext<'_>) {
    let Some(sorted) = sorted_media_root(ctx) else {
        return;
    };

    let folders = find_duplicate_folders(ctx, &sorted);
    if folders.is_empty() {
        ctx.info("No Duplicates folders found.");
        return;
    }

    let mut engine = CleanupEngine::new(ctx.dry_run);
    for folder in &folders {
        for listing in TreeWalker::new(folder, &ctx.exclusions).bottom_up() {
            let listing = match listing {
                Ok(listing) => listing,
                Err(e) => {
                    ctx.contain(e);
                    continue;
                }
            };
            for file in &listing.files {
                match engine.delete_file(file) {
                    Ok(action) => ctx.record(action),
                    Err(e) => ctx.contain(e),
                }
            }
            match engine.is_effectively_empty(&listing.dir) {
                Ok(true) => match engine.delete_folder(&listing.dir) {
                    Ok(action) => ctx.record(action),
                    Err(e) => ctx.contain(e),
                },
                Ok(false) => ctx.warn(&format!(
                    "Kept {}: it still has content.",
                    listing.dir.display()
                )),
                Err(e) => ctx.contain(e),
            }
        }
    }
}
