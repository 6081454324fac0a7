//! JSON output structures for the sfkit CLI

use serde::{Deserialize, Serialize};
use sfkit_types::{OperationStats, TreeListing};
use std::path::Path;

/// JSON report for ditto and wipe
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationReportJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// Operation statistics
    pub stats: StatsJson,
}

/// Operation metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct OperationMetadata {
    /// sfkit version
    pub version: String,
    /// Operation name
    pub operation: String,
    /// Source path, when the operation has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// Target path
    pub target_path: String,
}

/// Flattened operation statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsJson {
    /// Regular files handled
    pub files: u64,
    /// Symlinks handled
    pub symlinks: u64,
    /// Directories handled
    pub directories: u64,
    /// Entries skipped
    pub skipped: u64,
    /// Bytes copied
    pub bytes: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Transfer rate in MB/s
    pub transfer_rate_mbps: f64,
}

impl From<&OperationStats> for StatsJson {
    fn from(stats: &OperationStats) -> Self {
        Self {
            files: stats.files,
            symlinks: stats.symlinks,
            directories: stats.directories,
            skipped: stats.skipped,
            bytes: stats.bytes,
            duration_ms: u64::try_from(stats.duration.as_millis()).unwrap_or(u64::MAX),
            transfer_rate_mbps: stats.transfer_rate() / 1024.0 / 1024.0,
        }
    }
}

impl OperationReportJson {
    /// Report for a finished operation
    pub fn new(
        operation: &str,
        source: Option<&Path>,
        target: &Path,
        stats: &OperationStats,
    ) -> Self {
        Self {
            metadata: OperationMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                operation: operation.to_string(),
                source_path: source.map(|p| p.display().to_string()),
                target_path: target.display().to_string(),
            },
            stats: StatsJson::from(stats),
        }
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a listing as JSON
pub fn print_listing_json(listing: &TreeListing) -> anyhow::Result<()> {
    print_json(listing)
}
