//! Ignore-aware recursive enumeration
//!
//! [`enumerate`] lists everything below a root as root-relative paths, split
//! into directories and leaf entries (files and symlinks). Symlinks are never
//! followed. Paths matching the [`IgnoreSet`] are left out, and an ignored
//! directory is not descended into.

use globset::{Glob, GlobSet, GlobSetBuilder};
use sfkit_types::{EntryStat, Error, Result, TreeEntry, TreeListing};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Compiled set of ignore globs, matched against root-relative paths
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    glob_set: GlobSet,
    patterns: Vec<String>,
}

impl IgnoreSet {
    /// An ignore set that matches nothing
    pub fn empty() -> Self {
        Self {
            glob_set: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    /// Compile `patterns` into an ignore set
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut pattern_list = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob =
                Glob::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;
            builder.add(glob);
            pattern_list.push(pattern.to_string());
        }

        let glob_set = builder
            .build()
            .map_err(|e| Error::invalid_pattern(pattern_list.join(", "), e.to_string()))?;

        Ok(Self {
            glob_set,
            patterns: pattern_list,
        })
    }

    /// Whether a root-relative path is ignored
    pub fn is_ignored(&self, relative: impl AsRef<Path>) -> bool {
        self.glob_set.is_match(relative.as_ref())
    }

    /// The source patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// List everything below `root`, excluding ignored paths.
///
/// Hidden entries are included. Entries that disappear while the walk is in
/// progress are dropped; any other walk error fails the enumeration. The root
/// itself is not part of the listing, and a non-directory root yields an
/// empty listing.
pub async fn enumerate(root: impl AsRef<Path>, ignore: &IgnoreSet) -> Result<TreeListing> {
    let root = root.as_ref().to_path_buf();
    let ignore = ignore.clone();

    tokio::task::spawn_blocking(move || enumerate_blocking(&root, &ignore))
        .await
        .map_err(|e| Error::worker(format!("Enumeration task failed: {}", e)))?
}

/// Blocking form of [`enumerate`]
pub fn enumerate_blocking(root: &Path, ignore: &IgnoreSet) -> Result<TreeListing> {
    let mut listing = TreeListing::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            match entry.path().strip_prefix(root) {
                Ok(relative) => !ignore.is_ignored(relative),
                Err(_) => true,
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if e.depth() > 0 && is_vanished(&e) {
                    trace!("Entry vanished during walk: {:?}", e.path());
                    continue;
                }
                return Err(walk_error(&e, root));
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) if is_vanished(&e) => {
                trace!("Entry vanished before stat: {}", entry.path().display());
                continue;
            }
            Err(e) => return Err(walk_error(&e, entry.path())),
        };

        let relative = relative_path(root, entry.path())?;
        let stat = EntryStat::from_metadata(&metadata);

        if stat.is_dir() {
            listing.directories.push(relative);
        } else {
            listing.entries.push(TreeEntry {
                path: relative,
                stat,
            });
        }
    }

    debug!(
        "Enumerated {}: {} directories, {} entries",
        root.display(),
        listing.directories.len(),
        listing.entries.len()
    );

    Ok(listing)
}

fn is_vanished(error: &walkdir::Error) -> bool {
    error
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

fn walk_error(error: &walkdir::Error, fallback: &Path) -> Error {
    let path = error.path().unwrap_or(fallback);
    match error.io_error() {
        Some(io_error) => Error::from_io(io_error, path),
        None => Error::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        },
    }
}

fn relative_path(root: &Path, path: &Path) -> Result<PathBuf> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| Error::other(format!("{} is not under {}", path.display(), root.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn build_tree(root: &Path) {
        std::fs::create_dir_all(root.join("a/b")).unwrap();
        std::fs::create_dir_all(root.join(".hidden")).unwrap();
        std::fs::write(root.join("top.txt"), b"top").unwrap();
        std::fs::write(root.join("a/one.txt"), b"one").unwrap();
        std::fs::write(root.join("a/b/two.bin"), b"two!").unwrap();
        std::fs::write(root.join(".hidden/.dotfile"), b"x").unwrap();
    }

    #[rstest]
    #[case("**/.Trashes", ".Trashes", true)]
    #[case("**/.Trashes", "vol/.Trashes", true)]
    #[case("**/.Trashes/**", "vol/.Trashes/501/file", true)]
    #[case("**/.Trashes/**", "vol/Trashes/file", false)]
    #[case("*.tmp", "scratch.tmp", true)]
    #[case("*.tmp", "scratch.txt", false)]
    fn test_ignore_set_matching(#[case] pattern: &str, #[case] path: &str, #[case] ignored: bool) {
        let ignore = IgnoreSet::new([pattern]).unwrap();
        assert_eq!(ignore.is_ignored(path), ignored);
    }

    #[test]
    fn test_invalid_pattern() {
        let error = IgnoreSet::new(["a[b"]).unwrap_err();
        assert_eq!(error.kind(), sfkit_types::ErrorKind::Pattern);
    }

    #[tokio::test]
    async fn test_enumerate_lists_everything_relative() {
        let temp_dir = TempDir::new().unwrap();
        build_tree(temp_dir.path());

        let listing = enumerate(temp_dir.path(), &IgnoreSet::empty()).await.unwrap();

        assert_eq!(listing.directories.len(), 3);
        assert_eq!(listing.entries.len(), 4);
        assert!(listing.contains("a/b"));
        assert!(listing.contains(".hidden/.dotfile"));
        assert!(listing.contains("a/b/two.bin"));
        assert!(!listing.contains(""));
        assert_eq!(listing.total_bytes(), 3 + 3 + 4 + 1);
    }

    #[tokio::test]
    async fn test_ignored_directory_is_pruned() {
        let temp_dir = TempDir::new().unwrap();
        build_tree(temp_dir.path());
        std::fs::create_dir_all(temp_dir.path().join("a/.Trashes/501")).unwrap();
        std::fs::write(temp_dir.path().join("a/.Trashes/501/junk"), b"junk").unwrap();

        let ignore = IgnoreSet::new(sfkit_types::DEFAULT_IGNORE_PATTERNS).unwrap();
        let listing = enumerate(temp_dir.path(), &ignore).await.unwrap();

        assert!(!listing.contains("a/.Trashes"));
        assert!(!listing.contains("a/.Trashes/501"));
        assert!(!listing.contains("a/.Trashes/501/junk"));
        assert!(listing.contains("a/one.txt"));
    }

    #[tokio::test]
    async fn test_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let error = enumerate(temp_dir.path().join("absent"), &IgnoreSet::empty())
            .await
            .unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn test_file_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("lonely.txt");
        std::fs::write(&file, b"").unwrap();

        let listing = enumerate(&file, &IgnoreSet::empty()).await.unwrap();
        assert!(listing.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        build_tree(temp_dir.path());
        std::os::unix::fs::symlink("a", temp_dir.path().join("to_a")).unwrap();

        let listing = enumerate(temp_dir.path(), &IgnoreSet::empty()).await.unwrap();

        let link = listing
            .entries
            .iter()
            .find(|e| e.path == Path::new("to_a"))
            .unwrap();
        assert!(link.stat.is_symlink());
        assert!(!listing.contains("to_a/one.txt"));
    }
}
