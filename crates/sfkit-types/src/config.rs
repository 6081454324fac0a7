//! Engine configuration types
//!
//! The worker-pool size and ignore-pattern list are plain values handed to the
//! engine at construction; nothing here is process-global.

/// Worker-pool size with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct ConcurrencyLimit(usize);

impl ConcurrencyLimit {
    /// Minimum number of in-flight file operations
    pub const MIN: usize = 1;
    /// Maximum number of in-flight file operations
    pub const MAX: usize = 256;
    /// Sized for I/O-bound work, not CPU parallelism
    pub const DEFAULT: usize = 8;

    /// Create a new limit with validation
    pub fn new(limit: usize) -> Result<Self, String> {
        if limit < Self::MIN {
            Err(format!("Concurrency limit {} is below minimum {}", limit, Self::MIN))
        } else if limit > Self::MAX {
            Err(format!("Concurrency limit {} exceeds maximum {}", limit, Self::MAX))
        } else {
            Ok(Self(limit))
        }
    }

    /// Get the limit value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for ConcurrencyLimit {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConcurrencyLimit> for usize {
    fn from(limit: ConcurrencyLimit) -> Self {
        limit.0
    }
}

/// Patterns excluded from every enumeration unless overridden.
///
/// Trash folders on mounted macOS disk images exist but cannot be listed.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["**/.Trashes", "**/.Trashes/**"];

/// Configuration consumed by the tree engine
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Maximum number of concurrent file-level operations
    pub concurrency_limit: ConcurrencyLimit,
    /// Glob rules matched against root-relative paths
    pub ignore_patterns: Vec<String>,
}

impl EngineConfig {
    /// Replace the concurrency limit
    pub fn with_concurrency_limit(mut self, limit: ConcurrencyLimit) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Replace the ignore patterns
    pub fn with_ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: ConcurrencyLimit::default(),
            ignore_patterns: DEFAULT_IGNORE_PATTERNS.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}
