//! Display utilities for the sfkit CLI

use console::style;
use sfkit_types::{OperationStats, TreeListing};
use std::time::Duration;

/// Print statistics for a finished ditto
pub fn display_ditto_stats(stats: &OperationStats) {
    println!();
    println!("{}", style("Mirror Statistics:").bold().underlined());
    println!("  Files placed: {}", style(stats.files).green());
    println!("  Symlinks placed: {}", style(stats.symlinks).green());
    println!(
        "  Directories created: {}",
        style(stats.directories).green()
    );
    println!("  Entries skipped: {}", style(stats.skipped).yellow());
    println!(
        "  Bytes copied: {}",
        style(format_bytes(stats.bytes)).green()
    );
    println!(
        "  Duration: {}",
        style(format_duration(stats.duration)).blue()
    );
    println!(
        "  Transfer rate: {}",
        style(format!(
            "{:.2} MB/s",
            stats.transfer_rate() / 1024.0 / 1024.0
        ))
        .blue()
    );
}

/// Print statistics for a finished wipe
pub fn display_wipe_stats(stats: &OperationStats) {
    println!();
    println!("{}", style("Wipe Statistics:").bold().underlined());
    println!("  Files removed: {}", style(stats.leaves()).green());
    println!(
        "  Directories removed: {}",
        style(stats.directories).green()
    );
    println!(
        "  Duration: {}",
        style(format_duration(stats.duration)).blue()
    );
}

/// Print a tree listing, directories first
pub fn display_listing(listing: &TreeListing) {
    for dir in listing.directories_shallow_first() {
        println!("{}/", style(dir.display()).blue().bold());
    }
    for entry in &listing.entries {
        if entry.stat.is_symlink() {
            println!("{}", style(entry.path.display()).cyan());
        } else {
            println!(
                "{}  {}",
                entry.path.display(),
                style(format_bytes(entry.stat.size)).dim()
            );
        }
    }
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Display a warning message
pub fn display_warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

/// Display an error message
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

/// Display a success message
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), style(message).green());
}

/// Display an info message
pub fn display_info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), style(message).blue());
}
