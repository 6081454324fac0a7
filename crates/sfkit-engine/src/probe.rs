//! Existence probe

use sfkit_types::{Error, Result};
use std::io;
use std::path::Path;

/// Whether anything exists at `path`.
///
/// Symlinks are followed, so a dangling link does not exist. Only a
/// not-found condition yields `Ok(false)`; every other failure is returned.
pub async fn exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match tokio::fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::from_io(&e, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_exists_file_and_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("present.txt");
        tokio::fs::write(&file, b"hi").await.unwrap();

        assert!(exists(&file).await.unwrap());
        assert!(exists(temp_dir.path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_path_is_false() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!exists(temp_dir.path().join("nope")).await.unwrap());
        assert!(!exists(temp_dir.path().join("nope/deeper")).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_followed() {
        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join("dangling");
        let target = temp_dir.path().join("target");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(!exists(&link).await.unwrap());

        tokio::fs::write(&target, b"now here").await.unwrap();
        assert!(exists(&link).await.unwrap());
    }
}
