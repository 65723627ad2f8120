//! Oversized file report.

use crate::error::ItemError;
use crate::runner::OperationContext;
use crate::walker::{FileEntry, TreeWalker};
use serde::Serialize;
use std::path::PathBuf;

pub const BYTES_PER_MB: f64 = 1_048_576.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LargeFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub size_mb: f64,
}

pub fn size_in_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Reports every file strictly larger than `size_threshold_mb`.
pub fn find_large_files(ctx: &mut OperationContext<'_>) {
    let threshold = ctx.config.size_threshold_mb as f64;
    for listing in TreeWalker::new(&ctx.root, &ctx.exclusions) {
        let listing = match listing {
            Ok(listing) => listing,
            Err(e) => {
                ctx.contain(e);
                continue;
            }
        };
        for path in &listing.files {
            let entry = match FileEntry::from_path(path) {
                Ok(entry) => entry,
                Err(e) => {
                    ctx.contain(ItemError::reading(path, e));
                    continue;
                }
            };
            let size_mb = size_in_mb(entry.size);
            if size_mb > threshold {
                ctx.report_large_file(LargeFile {
                    path: entry.path,
                    size_bytes: entry.size,
                    size_mb,
                });
            }
        }
    }
}
