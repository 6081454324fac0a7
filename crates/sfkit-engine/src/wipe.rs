//! Idempotent recursive deletion
//!
//! Leaves are removed concurrently through the worker pool, then directories
//! one at a time, deepest first, then the root itself. A target that is
//! already gone counts as removed, so a failed wipe can simply be run again.

use crate::pool::WorkerPool;
use crate::progress::ProgressCounter;
use crate::walk::{enumerate, IgnoreSet};
use sfkit_types::{
    EntryKind, EntryStat, Error, OperationStats, ProgressCallback, Result, TreeEntry,
    TreeListing,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Remove `path` and everything below it
pub(crate) async fn wipe(
    path: &Path,
    ignore: &IgnoreSet,
    pool: &WorkerPool,
    on_progress: Option<ProgressCallback>,
) -> Result<OperationStats> {
    let start_time = Instant::now();
    let mut stats = OperationStats::new();

    debug!("wipe {}", path.display());

    let stat = match lstat(path).await? {
        Some(stat) => stat,
        None => {
            debug!("wipe {}: already gone", path.display());
            return Ok(stats);
        }
    };

    if !stat.is_dir() {
        remove_leaf(path.to_path_buf(), stat).await?;
        count_leaf(&mut stats, stat.kind);
        ProgressCounter::new(1, on_progress).advance();
        stats.duration = start_time.elapsed();
        return Ok(stats);
    }

    let listing = match listing_if_present(path, ignore).await? {
        Some(listing) => listing,
        None => {
            debug!("wipe {}: vanished before the walk", path.display());
            return Ok(stats);
        }
    };

    // The walk and the deletes are not atomic; re-check what is still there
    let mut directories = Vec::new();
    let mut leaves = Vec::new();
    let candidates = listing
        .directories
        .into_iter()
        .chain(listing.entries.into_iter().map(|entry| entry.path));
    for relative in candidates {
        match lstat(&path.join(&relative)).await? {
            Some(stat) if stat.is_dir() => directories.push(relative),
            Some(stat) => leaves.push(TreeEntry {
                path: relative,
                stat,
            }),
            None => continue,
        }
    }

    let counter = Arc::new(ProgressCounter::new(
        (directories.len() + leaves.len()) as u64,
        on_progress,
    ));

    let root = path.to_path_buf();
    let removed = pool
        .run(leaves, |entry| {
            let full_path = root.join(&entry.path);
            let counter = Arc::clone(&counter);
            async move {
                remove_leaf(full_path, entry.stat).await?;
                counter.advance();
                Ok(entry.stat.kind)
            }
        })
        .await?;
    for kind in removed {
        count_leaf(&mut stats, kind);
    }

    for dir in &removal_order(directories) {
        let full_dir = path.join(dir);
        debug!("rmdir {}", full_dir.display());
        remove_dir(&full_dir).await?;
        stats.directories += 1;
        counter.advance();
    }

    debug!("rmdir {}", path.display());
    remove_dir(path).await?;

    stats.duration = start_time.elapsed();
    info!(
        "wipe {} done (removed {} files & {} directories)",
        path.display(),
        stats.leaves(),
        stats.directories
    );

    Ok(stats)
}

/// Enumerate `path`, or `None` if it disappeared since it was stat'ed
async fn listing_if_present(path: &Path, ignore: &IgnoreSet) -> Result<Option<TreeListing>> {
    match enumerate(path, ignore).await {
        Ok(listing) => Ok(Some(listing)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Deepest first; a child's relative path is always longer than its parent's
fn removal_order(mut directories: Vec<PathBuf>) -> Vec<PathBuf> {
    directories.sort_by_key(|dir| std::cmp::Reverse(dir.as_os_str().len()));
    directories
}

/// `lstat` that maps not-found to `None`
pub(crate) async fn lstat(path: &Path) -> Result<Option<EntryStat>> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => Ok(Some(EntryStat::from_metadata(&metadata))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::from_io(&e, path)),
    }
}

async fn remove_leaf(path: PathBuf, stat: EntryStat) -> Result<()> {
    debug!("unlink {}", path.display());
    let result = tokio::fs::remove_file(&path).await;

    // Directory symlinks on Windows are removed like directories
    #[cfg(windows)]
    let result = match result {
        Err(_) if stat.is_symlink() => tokio::fs::remove_dir(&path).await,
        other => other,
    };
    #[cfg(not(windows))]
    let _ = stat;

    tolerate_not_found(result, &path)
}

async fn remove_dir(path: &Path) -> Result<()> {
    tolerate_not_found(tokio::fs::remove_dir(path).await, path)
}

fn tolerate_not_found(result: io::Result<()>, path: &Path) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::from_io(&e, path)),
    }
}

fn count_leaf(stats: &mut OperationStats, kind: EntryKind) {
    match kind {
        EntryKind::Symlink => stats.symlinks += 1,
        _ => stats.files += 1,
    }
}
