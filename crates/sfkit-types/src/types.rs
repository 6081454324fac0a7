//! Core data types for sfkit
//!
//! Tree listings, per-entry stats, progress events and operation statistics
//! shared by the engine, the configuration layer and the CLI.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Kind of a filesystem entry, as seen without following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntryKind {
    /// Regular file (or anything that is neither a directory nor a symlink)
    File,
    /// Directory
    Directory,
    /// Symbolic link; never followed
    Symlink,
}

/// Per-entry stat captured during one walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntryStat {
    /// Entry kind
    pub kind: EntryKind,
    /// Permission bits (`st_mode & 0o7777` on Unix, synthesized elsewhere)
    pub mode: u32,
    /// Size in bytes as reported by `lstat`
    pub size: u64,
}

impl EntryStat {
    /// Build a stat from `symlink_metadata` output
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        Self {
            kind,
            mode: permission_bits(metadata),
            size: metadata.len(),
        }
    }

    /// Whether this is a directory
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Whether this is a symbolic link
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &std::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

/// A file or symlink found under a walked root
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeEntry {
    /// Path relative to the walked root
    pub path: PathBuf,
    /// Stat taken during the walk
    pub stat: EntryStat,
}

/// Result of enumerating a directory tree.
///
/// Directories and leaf entries are kept apart because callers order the two
/// groups differently (directories by depth, leaves in any order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeListing {
    /// Relative paths of directories below the root
    pub directories: Vec<PathBuf>,
    /// Files and symlinks below the root
    pub entries: Vec<TreeEntry>,
}

impl TreeListing {
    /// Create an empty listing
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of directories and leaf entries
    pub fn len(&self) -> usize {
        self.directories.len() + self.entries.len()
    }

    /// Whether the listing holds nothing
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.entries.is_empty()
    }

    /// Sum of leaf entry sizes
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.stat.size).sum()
    }

    /// Directories sorted so that parents come before children
    pub fn directories_shallow_first(&self) -> Vec<PathBuf> {
        let mut dirs = self.directories.clone();
        dirs.sort_by_key(|d| path_length(d));
        dirs
    }

    /// Directories sorted so that children come before parents
    pub fn directories_deep_first(&self) -> Vec<PathBuf> {
        let mut dirs = self.directories.clone();
        dirs.sort_by_key(|d| std::cmp::Reverse(path_length(d)));
        dirs
    }

    /// Whether `path` is listed as a directory or leaf
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.directories.iter().any(|d| d == path) || self.entries.iter().any(|e| e.path == path)
    }
}

// A child's relative path is always strictly longer than its parent's.
fn path_length(path: &Path) -> usize {
    path.as_os_str().len()
}

/// Progress of one operation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressEvent {
    /// Completion in percent, 0 to 100
    pub percent: f64,
    /// Entries completed so far
    pub done: u64,
    /// Entries the operation will process
    pub total: u64,
}

impl ProgressEvent {
    /// Event for `done` out of `total` entries
    pub fn new(done: u64, total: u64) -> Self {
        let percent = if total > 0 {
            (done as f64 * 100.0 / total as f64).min(100.0)
        } else {
            100.0
        };
        Self {
            percent,
            done,
            total,
        }
    }

    /// Whether every entry has been processed
    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// Callback invoked for every progress event
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Predicate deciding whether a relative path is skipped during mirroring
pub type SkipPredicate = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// How leaf entries are placed at the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    /// Stream bytes into a new destination file
    #[default]
    Copy,
    /// Rename the source file into place
    Move,
}

/// Statistics for one mirror or erase call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OperationStats {
    /// Regular files copied, moved or removed
    pub files: u64,
    /// Symlinks materialized or removed
    pub symlinks: u64,
    /// Directories created or removed
    pub directories: u64,
    /// Entries excluded by the skip predicate
    pub skipped: u64,
    /// Bytes written by copies
    pub bytes: u64,
    /// Wall-clock duration of the call
    pub duration: Duration,
}

impl OperationStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Files plus symlinks
    pub fn leaves(&self) -> u64 {
        self.files + self.symlinks
    }

    /// Merge statistics from another instance
    pub fn merge(&mut self, other: &OperationStats) {
        self.files += other.files;
        self.symlinks += other.symlinks;
        self.directories += other.directories;
        self.skipped += other.skipped;
        self.bytes += other.bytes;
        self.duration += other.duration;
    }

    /// Bytes per second over the recorded duration
    pub fn transfer_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.bytes as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}
