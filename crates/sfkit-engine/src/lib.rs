//! File-tree engine for sfkit
//!
//! Places downloaded application bundles onto disk and removes superseded
//! installs.
//!
//! # Features
//!
//! - **Mirroring**: [`Engine::ditto`] copies or moves a tree into place,
//!   recreating symlinks and keeping permission bits, without pruning
//!   anything already at the destination
//! - **Erasing**: [`Engine::wipe`] deletes a tree deepest-first and succeeds
//!   on paths that are already gone, so it can be retried freely
//! - **Bounded I/O**: file-level work runs through a [`WorkerPool`] capped at
//!   the configured concurrency limit
//! - **Progress**: per-entry [`ProgressEvent`](sfkit_types::ProgressEvent)s,
//!   composable across phases with [`subprogress`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use sfkit_engine::{subprogress, DittoOptions, Engine};
//! use sfkit_types::{EngineConfig, ProgressCallback};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Engine::new(EngineConfig::default())?;
//! let report: ProgressCallback = Arc::new(|event| println!("{:.0}%", event.percent));
//!
//! // Copying is the first 80% of the install, cleanup the rest
//! let options = DittoOptions::new().on_progress(subprogress(report.clone(), 0.0, 80.0));
//! let stats = engine.ditto("staging/app", "apps/app", options).await?;
//! engine
//!     .wipe_with_progress("apps/app-old", subprogress(report, 80.0, 100.0))
//!     .await?;
//!
//! println!("Placed {} files", stats.files);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod ditto;
pub mod engine;
pub mod files;
pub mod pool;
pub mod probe;
pub mod progress;
pub mod walk;
pub mod wipe;

pub use ditto::DittoOptions;
pub use engine::{Engine, EngineBuilder, EngineSlot};
pub use pool::WorkerPool;
pub use probe::exists;
pub use progress::{noop, progress_channel, subprogress, ProgressCounter, ProgressStream};
pub use walk::{enumerate, enumerate_blocking, IgnoreSet};
