//! Small file helpers used by installer workflows

use crate::engine::Engine;
use crate::walk::enumerate;
use globset::GlobBuilder;
use sfkit_types::{Error, IoResultExt, Result};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

impl Engine {
    /// Read a whole file as UTF-8
    pub async fn read_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        tokio::fs::read_to_string(path).await.at_path(path)
    }

    /// Write `contents` to `path`, creating missing parent directories
    pub async fn write_file(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.mkdir(parent).await?;
        }
        tokio::fs::write(path, contents).await.at_path(path)
    }

    /// Create a directory and any missing parents; an existing directory is fine
    pub async fn mkdir(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        debug!("mkdir {}", path.display());
        tokio::fs::create_dir_all(path).await.at_path(path)
    }

    /// Read up to `length` bytes starting at byte `position`.
    ///
    /// Returns fewer bytes when the file ends first, and none when `position`
    /// is past the end.
    pub async fn read_chunk(
        &self,
        path: impl AsRef<Path>,
        position: u64,
        length: usize,
    ) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let mut file = tokio::fs::File::open(path).await.at_path(path)?;
        file.seek(SeekFrom::Start(position)).await.at_path(path)?;

        let mut buffer = Vec::with_capacity(length);
        file.take(length as u64)
            .read_to_end(&mut buffer)
            .await
            .at_path(path)?;
        Ok(buffer)
    }

    /// Relative paths under `cwd` matching `pattern`, sorted.
    ///
    /// `*` does not cross directory separators; `**` does. Hidden entries are
    /// matched and the engine's ignore patterns apply.
    pub async fn glob(&self, cwd: impl AsRef<Path>, pattern: &str) -> Result<Vec<PathBuf>> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?
            .compile_matcher();

        let listing = enumerate(cwd, self.ignore_set()).await?;
        let mut matches: Vec<PathBuf> = listing
            .directories
            .into_iter()
            .chain(listing.entries.into_iter().map(|entry| entry.path))
            .filter(|path| matcher.is_match(path))
            .collect();
        matches.sort();
        Ok(matches)
    }
}
