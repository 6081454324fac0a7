//! Engine entry point

use crate::ditto::{ditto, DittoOptions};
use crate::pool::WorkerPool;
use crate::probe;
use crate::walk::{enumerate, IgnoreSet};
use crate::wipe::wipe;
use once_cell::sync::OnceCell;
use sfkit_config::Config;
use sfkit_types::{
    ConcurrencyLimit, EngineConfig, Error, OperationStats, ProgressCallback, Result, TreeListing,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// File-tree engine: mirrors, erases and inspects directory trees.
///
/// Settings are fixed at construction. Every operation builds its own
/// listing, so one engine can serve concurrent calls on unrelated trees.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    ignore: IgnoreSet,
    pool: WorkerPool,
}

impl Engine {
    /// Create an engine from explicit settings
    pub fn new(config: EngineConfig) -> Result<Self> {
        let ignore = IgnoreSet::new(&config.ignore_patterns)?;
        let pool = WorkerPool::new(config.concurrency_limit);

        info!(
            "Engine initialized (concurrency {}, {} ignore patterns)",
            pool.limit(),
            ignore.patterns().len()
        );

        Ok(Self {
            config,
            ignore,
            pool,
        })
    }

    /// Create an engine from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.engine.clone())
    }

    /// Settings this engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compiled ignore patterns
    pub fn ignore_set(&self) -> &IgnoreSet {
        &self.ignore
    }

    /// Whether anything exists at `path`; see [`probe::exists`]
    pub async fn exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        probe::exists(path).await
    }

    /// Ignore-aware recursive listing of `root`
    pub async fn enumerate(&self, root: impl AsRef<Path>) -> Result<TreeListing> {
        enumerate(root, &self.ignore).await
    }

    /// Remove `path` and everything below it. Missing paths are not an error.
    pub async fn wipe(&self, path: impl AsRef<Path>) -> Result<OperationStats> {
        wipe(path.as_ref(), &self.ignore, &self.pool, None).await
    }

    /// [`Engine::wipe`] with one progress event per removed file or directory
    pub async fn wipe_with_progress(
        &self,
        path: impl AsRef<Path>,
        on_progress: ProgressCallback,
    ) -> Result<OperationStats> {
        wipe(path.as_ref(), &self.ignore, &self.pool, Some(on_progress)).await
    }

    /// Mirror `src` into `dst` without removing destination-only entries
    pub async fn ditto(
        &self,
        src: impl AsRef<Path>,
        dst: impl AsRef<Path>,
        options: DittoOptions,
    ) -> Result<OperationStats> {
        ditto(src.as_ref(), dst.as_ref(), options, &self.ignore, &self.pool).await
    }
}

/// Builder for creating an engine with custom settings
#[derive(Debug, Default)]
pub struct EngineBuilder {
    config: Option<EngineConfig>,
    concurrency_limit: Option<usize>,
    ignore_patterns: Option<Vec<String>>,
}

impl EngineBuilder {
    /// Create a new engine builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from these settings
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the concurrency limit
    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    /// Override the ignore patterns
    pub fn ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<Engine> {
        let mut config = self.config.unwrap_or_default();

        if let Some(limit) = self.concurrency_limit {
            config.concurrency_limit = ConcurrencyLimit::new(limit).map_err(Error::config)?;
        }
        if let Some(patterns) = self.ignore_patterns {
            config.ignore_patterns = patterns;
        }

        Engine::new(config)
    }
}

/// Write-once holder for a shared engine.
///
/// [`EngineSlot::get`] fails with [`Error::Uninitialized`] until an engine has
/// been installed, instead of handing out a half-configured default.
#[derive(Debug, Default)]
pub struct EngineSlot {
    cell: OnceCell<Arc<Engine>>,
}

impl EngineSlot {
    /// An empty slot
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Install `engine`; fails if one is already installed
    pub fn install(&self, engine: Engine) -> Result<Arc<Engine>> {
        let engine = Arc::new(engine);
        self.cell
            .set(Arc::clone(&engine))
            .map_err(|_| Error::config("An engine is already installed"))?;
        Ok(engine)
    }

    /// The installed engine
    pub fn get(&self) -> Result<Arc<Engine>> {
        self.cell
            .get()
            .cloned()
            .ok_or_else(|| Error::uninitialized("engine"))
    }

    /// Whether an engine has been installed
    pub fn is_installed(&self) -> bool {
        self.cell.get().is_some()
    }
}
