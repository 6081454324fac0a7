//! Core type system and error handling for sfkit
//!
//! This crate provides the foundational types shared by the sfkit engine,
//! configuration layer and CLI:
//!
//! - **Error handling**: one error enum with not-found kept distinct from other faults
//! - **Tree model**: entry kinds, per-entry stats and tree listings
//! - **Progress**: progress events and callback aliases
//! - **Configuration**: validated engine settings
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use sfkit_types::{OperationStats, ProgressEvent, Result};
//!
//! fn example_operation() -> Result<OperationStats> {
//!     let mut stats = OperationStats::new();
//!     stats.files = 10;
//!     stats.bytes = 1024 * 1024;
//!     Ok(stats)
//! }
//!
//! let event = ProgressEvent::new(1, 4);
//! assert_eq!(event.percent, 25.0);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod types;

// Re-export commonly used types
pub use config::{ConcurrencyLimit, EngineConfig, DEFAULT_IGNORE_PATTERNS};
pub use error::{Error, ErrorKind, IoResultExt};
pub use result::Result;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_operation_stats_creation() {
        let stats = OperationStats::new();
        assert_eq!(stats.files, 0);
        assert_eq!(stats.bytes, 0);
        assert_eq!(stats.transfer_rate(), 0.0);
    }

    #[test]
    fn test_operation_stats_merge() {
        let mut stats1 = OperationStats::new();
        stats1.files = 5;
        stats1.symlinks = 1;
        stats1.bytes = 1000;

        let mut stats2 = OperationStats::new();
        stats2.files = 3;
        stats2.bytes = 500;
        stats2.duration = Duration::from_secs(1);

        stats1.merge(&stats2);
        assert_eq!(stats1.files, 8);
        assert_eq!(stats1.leaves(), 9);
        assert_eq!(stats1.bytes, 1500);
        assert_eq!(stats1.transfer_rate(), 1500.0);
    }

    #[test]
    fn test_concurrency_limit_validation() {
        assert!(ConcurrencyLimit::new(1).is_ok());
        assert!(ConcurrencyLimit::new(256).is_ok());
        assert!(ConcurrencyLimit::new(0).is_err());
        assert!(ConcurrencyLimit::new(257).is_err());
        assert_eq!(ConcurrencyLimit::default().get(), 8);
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.concurrency_limit.get(), 8);
        assert!(config.ignore_patterns.iter().any(|p| p.contains(".Trashes")));

        let config = config.with_ignore_patterns(["*.tmp"]);
        assert_eq!(config.ignore_patterns, vec!["*.tmp".to_string()]);
    }

    #[test]
    fn test_progress_event_percent() {
        assert_eq!(ProgressEvent::new(0, 4).percent, 0.0);
        assert_eq!(ProgressEvent::new(2, 4).percent, 50.0);
        assert!(ProgressEvent::new(4, 4).is_complete());
        // An empty operation is complete from the start
        assert_eq!(ProgressEvent::new(0, 0).percent, 100.0);
    }

    #[test]
    fn test_listing_depth_orderings() {
        let listing = TreeListing {
            directories: vec![
                PathBuf::from("a/b"),
                PathBuf::from("a"),
                PathBuf::from("a/b/c"),
            ],
            entries: Vec::new(),
        };

        assert_eq!(
            listing.directories_shallow_first(),
            vec![PathBuf::from("a"), PathBuf::from("a/b"), PathBuf::from("a/b/c")]
        );
        assert_eq!(
            listing.directories_deep_first(),
            vec![PathBuf::from("a/b/c"), PathBuf::from("a/b"), PathBuf::from("a")]
        );
        assert!(listing.contains("a/b"));
        assert!(!listing.contains("a/x"));
        assert_eq!(listing.len(), 3);
    }
}
