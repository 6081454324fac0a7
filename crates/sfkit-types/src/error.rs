//! Error types and handling for sfkit
//!
//! Every fallible engine operation returns [`Error`]. Not-found conditions are
//! kept distinct from other I/O faults because the eraser treats them as
//! success while the mirror treats a missing source as fatal.

use std::io;
use std::path::{Path, PathBuf};

/// Main error type for sfkit operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed for a reason other than not-found or permission
    #[error("I/O error on {}: {message}", path.display())]
    Io {
        /// Path the operation was acting on
        path: PathBuf,
        /// Error message from the I/O operation
        message: String,
    },

    /// File or directory not found
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path that was not found
        path: PathBuf,
    },

    /// Permission denied
    #[error("Permission denied: {}", path.display())]
    PermissionDenied {
        /// Path with permission issues
        path: PathBuf,
    },

    /// Ignore or glob pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// A component was used before it was initialized
    #[error("{component} used before initialization")]
    Uninitialized {
        /// Name of the component
        component: String,
    },

    /// A worker task could not be joined
    #[error("Worker error: {message}")]
    Worker {
        /// Error message describing the worker failure
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Target vanished or never existed
    NotFound,
    /// Access refused by the operating system
    PermissionDenied,
    /// Any other I/O fault
    Io,
    /// Bad glob pattern
    Pattern,
    /// Configuration errors
    Config,
    /// Programming error: component used before initialization
    Uninitialized,
    /// Worker pool failures
    Worker,
    /// Other errors
    Other,
}

impl Error {
    /// Classify an [`io::Error`] raised while acting on `path`
    pub fn from_io(error: &io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match error.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io {
                path,
                message: error.to_string(),
            },
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::FileNotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::InvalidPattern { .. } => ErrorKind::Pattern,
            Self::Config { .. } => ErrorKind::Config,
            Self::Uninitialized { .. } => ErrorKind::Uninitialized,
            Self::Worker { .. } => ErrorKind::Worker,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Whether this is a not-found condition
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Whether calling the same idempotent operation again may succeed.
    ///
    /// Filesystem faults leave the target in a re-attemptable state; pattern,
    /// configuration and initialization errors will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io { .. } | Self::FileNotFound { .. } | Self::Worker { .. } => true,
            Self::PermissionDenied { .. }
            | Self::InvalidPattern { .. }
            | Self::Config { .. }
            | Self::Uninitialized { .. }
            | Self::Other { .. } => false,
        }
    }

    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. } | Self::FileNotFound { path } | Self::PermissionDenied { path } => {
                Some(path)
            }
            _ => None,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid pattern error
    pub fn invalid_pattern<P: Into<String>, S: Into<String>>(pattern: P, message: S) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a new uninitialized-component error
    pub fn uninitialized<S: Into<String>>(component: S) -> Self {
        Self::Uninitialized {
            component: component.into(),
        }
    }

    /// Create a new worker error
    pub fn worker<S: Into<String>>(message: S) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Extension for attaching a path to raw [`io::Result`]s
pub trait IoResultExt<T> {
    /// Convert the error side into [`Error`] using `path` as context
    fn at_path(self, path: impl AsRef<Path>) -> crate::Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at_path(self, path: impl AsRef<Path>) -> crate::Result<T> {
        self.map_err(|e| Error::from_io(&e, path))
    }
}
