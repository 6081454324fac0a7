//! Unified test utilities for sfkit tests
//!
//! Fixture trees are described with [`TestTree`], materialized on disk, and
//! compared with [`snapshot`]. [`ProgressRecorder`] collects progress events
//! for later assertions.

use sfkit_types::{ProgressCallback, ProgressEvent};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Test data generation patterns
#[derive(Debug, Clone, Copy)]
pub enum TestDataPattern {
    /// All zeros
    Zeros,
    /// Structured bytes that differ from offset to offset
    Realistic,
}

/// Generate test data with specified pattern
pub fn generate_test_data(size: usize, pattern: TestDataPattern) -> Vec<u8> {
    match pattern {
        TestDataPattern::Zeros => vec![0u8; size],
        TestDataPattern::Realistic => (0..size).map(|i| ((i * 7 + 13) % 256) as u8).collect(),
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
    Symlink(PathBuf),
}

/// Declarative description of a fixture tree
#[derive(Debug, Clone, Default)]
pub struct TestTree {
    nodes: Vec<(PathBuf, Node)>,
}

impl TestTree {
    /// Empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Typical application bundle: nested directories, a hidden file, an
    /// empty directory and a larger binary
    pub fn app_bundle() -> Self {
        Self::new()
            .dir("bin")
            .dir("lib/plugins")
            .dir("share/empty")
            .file("bin/game", generate_test_data(256 * 1024, TestDataPattern::Realistic))
            .file("lib/libcore.so", generate_test_data(4096, TestDataPattern::Realistic))
            .file("lib/plugins/audio.so", generate_test_data(1024, TestDataPattern::Zeros))
            .file(".meta/receipt.json", b"{\"build\":42}".to_vec())
            .file("README.txt", b"have fun".to_vec())
    }

    /// Add a directory (parents are created as needed)
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.nodes.push((path.into(), Node::Dir));
        self
    }

    /// Add a file with the given contents
    pub fn file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.nodes.push((path.into(), Node::File(contents.into())));
        self
    }

    /// Add a symlink pointing at `target` (stored verbatim)
    pub fn symlink(mut self, path: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        self.nodes.push((path.into(), Node::Symlink(target.into())));
        self
    }

    /// Materialize the tree under `root`
    pub fn build(&self, root: &Path) -> std::io::Result<()> {
        fs::create_dir_all(root)?;
        for (relative, node) in &self.nodes {
            let full_path = root.join(relative);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            match node {
                Node::Dir => fs::create_dir_all(&full_path)?,
                Node::File(contents) => fs::write(&full_path, contents)?,
                Node::Symlink(target) => make_symlink(target, &full_path)?,
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// What a snapshot recorded for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEntry {
    /// A directory
    Dir,
    /// A regular file and its bytes
    File(Vec<u8>),
    /// A symlink and its target string
    Symlink(PathBuf),
}

/// Record every entry below `root`, keyed by relative path, without following symlinks
pub fn snapshot(root: &Path) -> std::io::Result<BTreeMap<PathBuf, SnapshotEntry>> {
    let mut entries = BTreeMap::new();
    snapshot_into(root, root, &mut entries)?;
    Ok(entries)
}

fn snapshot_into(
    root: &Path,
    dir: &Path,
    entries: &mut BTreeMap<PathBuf, SnapshotEntry>,
) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            entries.insert(relative, SnapshotEntry::Symlink(fs::read_link(&path)?));
        } else if file_type.is_dir() {
            entries.insert(relative, SnapshotEntry::Dir);
            snapshot_into(root, &path, entries)?;
        } else {
            entries.insert(relative, SnapshotEntry::File(fs::read(&path)?));
        }
    }
    Ok(())
}

/// Assert that every entry under `src` is present and equal under `dst`
pub fn assert_mirrored(src: &Path, dst: &Path) {
    let expected = snapshot(src).expect("snapshot source");
    let actual = snapshot(dst).expect("snapshot destination");

    for (relative, entry) in &expected {
        match actual.get(relative) {
            Some(found) => assert_eq!(
                found,
                entry,
                "{} differs at destination",
                relative.display()
            ),
            None => panic!("{} missing at destination", relative.display()),
        }
    }
}

/// Collects progress events for later inspection
#[derive(Debug, Clone, Default)]
pub struct ProgressRecorder {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressRecorder {
    /// New recorder with no events
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback appending to this recorder
    pub fn callback(&self) -> ProgressCallback {
        let events = Arc::clone(&self.events);
        Arc::new(move |event: ProgressEvent| events.lock().expect("recorder lock").push(event))
    }

    /// Events seen so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("recorder lock").clone()
    }

    /// Whether percentages never went down
    pub fn is_monotonic(&self) -> bool {
        self.events()
            .windows(2)
            .all(|pair| pair[0].percent <= pair[1].percent)
    }

    /// Last event seen, if any
    pub fn last(&self) -> Option<ProgressEvent> {
        self.events().last().copied()
    }
}
