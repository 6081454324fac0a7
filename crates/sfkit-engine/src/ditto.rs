//! Additive tree mirroring
//!
//! After a successful [`ditto`], every entry of the source exists at the
//! destination: files with equal content, symlinks with the same target
//! string, directories as directories. Entries that only exist at the
//! destination are left alone.

use crate::pool::WorkerPool;
use crate::progress::ProgressCounter;
use crate::walk::{enumerate, IgnoreSet};
use crate::wipe::{lstat, wipe};
use sfkit_types::{
    EntryKind, EntryStat, Error, IoResultExt, Operation, OperationStats,
    ProgressCallback, Result, SkipPredicate,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Options for [`crate::Engine::ditto`]
#[derive(Clone, Default)]
pub struct DittoOptions {
    /// Receives one event per placed file or symlink
    pub on_progress: Option<ProgressCallback>,
    /// Relative paths for which this returns true are not placed
    pub should_skip: Option<SkipPredicate>,
    /// Copy bytes or rename files into place
    pub operation: Operation,
}

impl DittoOptions {
    /// Default options: copy everything, no progress
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the progress callback
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Set the skip predicate
    pub fn should_skip<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.should_skip = Some(Arc::new(predicate));
        self
    }

    /// Set the operation
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    fn skips(&self, relative: &Path) -> bool {
        self.should_skip
            .as_ref()
            .is_some_and(|predicate| predicate(relative))
    }
}

impl std::fmt::Debug for DittoOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DittoOptions")
            .field("on_progress", &self.on_progress.is_some())
            .field("should_skip", &self.should_skip.is_some())
            .field("operation", &self.operation)
            .finish()
    }
}

/// Mirror `src` into `dst`
pub(crate) async fn ditto(
    src: &Path,
    dst: &Path,
    options: DittoOptions,
    ignore: &IgnoreSet,
    pool: &WorkerPool,
) -> Result<OperationStats> {
    let start_time = Instant::now();
    let mut stats = OperationStats::new();

    debug!("ditto {} {}", src.display(), dst.display());

    let stat = lstat(src).await?.ok_or_else(|| Error::FileNotFound {
        path: src.to_path_buf(),
    })?;

    if !stat.is_dir() {
        stats.bytes = place_entry(src, dst, stat, options.operation, ignore, pool).await?;
        count_leaf(&mut stats, stat.kind);
        ProgressCounter::new(1, options.on_progress).advance();
        stats.duration = start_time.elapsed();
        return Ok(stats);
    }

    tokio::fs::create_dir_all(dst).await.at_path(dst)?;

    let listing = enumerate(src, ignore).await?;

    // Parents before children; has to be sequential
    for dir in listing.directories_shallow_first() {
        let full_dir = dst.join(&dir);
        debug!("mkdir {}", full_dir.display());
        tokio::fs::create_dir_all(&full_dir)
            .await
            .at_path(&full_dir)?;
        stats.directories += 1;
    }

    let mut work = Vec::with_capacity(listing.entries.len());
    for entry in listing.entries {
        if options.skips(&entry.path) {
            debug!("skipping {}", entry.path.display());
            stats.skipped += 1;
        } else {
            work.push(entry);
        }
    }

    let counter = Arc::new(ProgressCounter::new(
        work.len() as u64,
        options.on_progress.clone(),
    ));
    let operation = options.operation;

    // All directories exist, leaves can go in parallel
    let placed = pool
        .run(work, |entry| {
            let src_file = src.join(&entry.path);
            let dst_file = dst.join(&entry.path);
            let counter = Arc::clone(&counter);
            let ignore = ignore.clone();
            let pool = pool.clone();
            async move {
                let bytes =
                    place_entry(&src_file, &dst_file, entry.stat, operation, &ignore, &pool)
                        .await?;
                counter.advance();
                Ok((entry.stat.kind, bytes))
            }
        })
        .await?;

    for (kind, bytes) in placed {
        count_leaf(&mut stats, kind);
        stats.bytes += bytes;
    }

    stats.duration = start_time.elapsed();
    info!(
        "ditto {} {} done (copied {} files & {} directories)",
        src.display(),
        dst.display(),
        stats.leaves(),
        stats.directories
    );

    Ok(stats)
}

/// Place one non-directory entry, returning the bytes written
async fn place_entry(
    src_file: &Path,
    dst_file: &Path,
    stat: EntryStat,
    operation: Operation,
    ignore: &IgnoreSet,
    pool: &WorkerPool,
) -> Result<u64> {
    if stat.is_symlink() {
        let link_target = tokio::fs::read_link(src_file).await.at_path(src_file)?;
        debug!("symlink {} {}", link_target.display(), dst_file.display());

        // Own permits so this never waits on the one held by the caller
        wipe(dst_file, ignore, &pool.sibling(), None).await?;
        create_symlink(src_file, &link_target, dst_file).await?;
        return Ok(0);
    }

    match operation {
        Operation::Move => {
            debug!("rename {} {}", src_file.display(), dst_file.display());
            tokio::fs::rename(src_file, dst_file)
                .await
                .at_path(src_file)?;
            Ok(0)
        }
        Operation::Copy => copy_file(src_file, dst_file, stat).await,
    }
}

async fn copy_file(src_file: &Path, dst_file: &Path, stat: EntryStat) -> Result<u64> {
    // Keep the copy readable and writable whatever the source allowed
    let mode = (stat.mode & 0o777) | 0o666;
    debug!(
        "cp {:o} {} {}",
        mode,
        src_file.display(),
        dst_file.display()
    );

    let mut reader = tokio::fs::File::open(src_file).await.at_path(src_file)?;

    let mut open_options = tokio::fs::OpenOptions::new();
    open_options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    open_options.mode(mode);
    let mut writer = open_options.open(dst_file).await.at_path(dst_file)?;

    let bytes = tokio::io::copy(&mut reader, &mut writer)
        .await
        .at_path(dst_file)?;
    writer.flush().await.at_path(dst_file)?;
    writer.shutdown().await.at_path(dst_file)?;

    Ok(bytes)
}

#[cfg(unix)]
async fn create_symlink(_src_file: &Path, link_target: &Path, dst_file: &Path) -> Result<()> {
    tokio::fs::symlink(link_target, dst_file)
        .await
        .at_path(dst_file)
}

#[cfg(windows)]
async fn create_symlink(src_file: &Path, link_target: &Path, dst_file: &Path) -> Result<()> {
    let points_to_dir = tokio::fs::metadata(src_file)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if points_to_dir {
        tokio::fs::symlink_dir(link_target, dst_file)
            .await
            .at_path(dst_file)
    } else {
        tokio::fs::symlink_file(link_target, dst_file)
            .await
            .at_path(dst_file)
    }
}

fn count_leaf(stats: &mut OperationStats, kind: EntryKind) {
    match kind {
        EntryKind::Symlink => stats.symlinks += 1,
        _ => stats.files += 1,
    }
}
