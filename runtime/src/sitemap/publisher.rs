//! Run orchestration: clean, stage, generate, publish.
//!
//! Everything is written into a staging directory first. Readers only see
//! the new tree once it is complete, when staging is moved onto the
//! production path. A run that fails before that point leaves production
//! alone and keeps the staging directory around for inspection.

use super::index::write_index;
use super::{SitemapFile, SitemapWriter, UrlSource};
use crate::audit::logger::{RunEvent, RunLogger};
use crate::catalog::Catalog;
use crate::config::{PublishStrategy, SitemapConfig};
use crate::error::{Result, SitemapError};
use crate::routes::{OpenOniRoutes, PageRouter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Called after every sitemap file is flushed.
pub type FlushHook = Box<dyn Fn(&SitemapFile) + Send + Sync>;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub files: Vec<SitemapFile>,
    pub url_count: usize,
    /// Location of `sitemap.xml` in the production directory.
    pub index_path: PathBuf,
    /// Whether a custom sitemap was carried over from the previous tree.
    pub custom_sitemap_kept: bool,
    pub elapsed: Duration,
}

/// Output of the generate step, still in staging.
#[derive(Debug, Clone)]
pub struct Generated {
    pub files: Vec<SitemapFile>,
    pub url_count: usize,
    pub index_path: PathBuf,
}

/// Drives one full sitemap rebuild.
pub struct Publisher {
    config: SitemapConfig,
    router: Box<dyn PageRouter>,
    on_flush: Option<FlushHook>,
}

impl Publisher {
    pub fn new(config: SitemapConfig) -> Self {
        Self {
            config,
            router: Box::new(OpenOniRoutes),
            on_flush: None,
        }
    }

    /// Use a different OCR HTML router.
    pub fn with_router(mut self, router: impl PageRouter + 'static) -> Self {
        self.router = Box::new(router);
        self
    }

    pub fn on_flush(mut self, hook: impl Fn(&SitemapFile) + Send + Sync + 'static) -> Self {
        self.on_flush = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &SitemapConfig {
        &self.config
    }

    /// Rebuild the sitemap tree from `catalog` and publish it.
    ///
    /// The outcome is appended to the run log when one is configured.
    pub fn run<C: Catalog + ?Sized>(&self, catalog: &C) -> Result<RunSummary> {
        let start = Instant::now();
        let result = self.run_steps(catalog, start);
        self.record(&result, start.elapsed());
        result
    }

    fn run_steps<C: Catalog + ?Sized>(&self, catalog: &C, start: Instant) -> Result<RunSummary> {
        self.config.validate()?;
        let staging = &self.config.staging_dir;
        let production = &self.config.production_dir;

        info!(
            "building sitemaps for {} in {}",
            self.config.base_url,
            staging.display()
        );
        clean(staging)?;
        stage(staging)?;

        let generated = self.generate(catalog, staging)?;
        let custom_sitemap_kept = self.carry_custom_sitemap()?;

        self.publish()?;
        info!(
            "published {} sitemap(s) with {} URLs to {}",
            generated.files.len(),
            generated.url_count,
            production.display()
        );

        // Paths now live under the production directory.
        let files = generated
            .files
            .into_iter()
            .map(|mut f| {
                if let Some(name) = f.path.file_name() {
                    f.path = production.join(name);
                }
                f
            })
            .collect();

        Ok(RunSummary {
            files,
            url_count: generated.url_count,
            index_path: production.join(crate::config::INDEX_FILE_NAME),
            custom_sitemap_kept,
            elapsed: start.elapsed(),
        })
    }

    /// Enumerate the catalog into `dir`: sitemap files, then the index.
    pub fn generate<C: Catalog + ?Sized>(&self, catalog: &C, dir: &Path) -> Result<Generated> {
        let mut writer = SitemapWriter::new(dir, &self.config.base_url, self.config.max_urls);

        for record in UrlSource::new(catalog, self.router.as_ref()) {
            if let Some(file) = writer.push(record?)? {
                self.notify(file);
            }
        }

        let url_count = writer.url_count();
        let flushed = writer.files().len();
        let files = writer.finish()?;
        if let Some(last) = files.get(flushed) {
            self.notify(last);
        }

        let index_path = write_index(dir, &self.config.base_url, &self.config.custom_sitemap, &files)?;
        Ok(Generated {
            files,
            url_count,
            index_path,
        })
    }

    fn notify(&self, file: &SitemapFile) {
        debug!("flushed {} ({} URLs)", file.path.display(), file.url_count);
        if let Some(hook) = &self.on_flush {
            hook(file);
        }
    }

    /// Copy the hand-maintained custom sitemap from the live tree into
    /// staging so replacing the directory does not drop it.
    fn carry_custom_sitemap(&self) -> Result<bool> {
        let from = self.config.production_dir.join(&self.config.custom_sitemap);
        let to = self.config.staging_dir.join(&self.config.custom_sitemap);
        match std::fs::copy(&from, &to) {
            Ok(_) => {
                debug!("kept {}", from.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "{} not found; the index will reference a missing custom sitemap",
                    from.display()
                );
                Ok(false)
            }
            Err(e) => Err(SitemapError::io("copy", &from, e)),
        }
    }

    /// Move staging onto the production path.
    fn publish(&self) -> Result<()> {
        let staging = &self.config.staging_dir;
        let production = &self.config.production_dir;

        match self.config.publish_strategy {
            PublishStrategy::Replace => {
                remove_dir_if_exists(production)?;
                rename(staging, production)
            }
            PublishStrategy::SwapAside => swap_aside(staging, production),
        }
    }

    fn record(&self, result: &Result<RunSummary>, elapsed: Duration) {
        let Some(path) = &self.config.run_log else {
            return;
        };

        let production = &self.config.production_dir;
        let duration_ms = elapsed.as_millis() as u64;
        let event = match result {
            Ok(summary) => RunEvent::success(production, summary.url_count, summary.files.len(), duration_ms),
            Err(e) => RunEvent::aborted(production, &e.to_string(), duration_ms),
        };

        if let Err(e) = RunLogger::open(path).and_then(|mut logger| logger.log(&event)) {
            warn!("failed to record run in {}: {e:#}", path.display());
        }
    }
}

/// Remove leftovers from a previous run. A missing directory is fine.
fn clean(staging: &Path) -> Result<()> {
    debug!("cleaning {}", staging.display());
    remove_dir_if_exists(staging)
}

/// Create a fresh staging directory. It must not exist.
fn stage(staging: &Path) -> Result<()> {
    if let Some(parent) = staging.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SitemapError::io("create", parent, e))?;
    }
    match std::fs::create_dir(staging) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(SitemapError::StagingExists {
            path: staging.to_path_buf(),
        }),
        Err(e) => Err(SitemapError::io("create", staging, e)),
    }
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SitemapError::io("remove", path, e)),
    }
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    debug!("renaming {} -> {}", from.display(), to.display());
    std::fs::rename(from, to).map_err(|e| SitemapError::io("rename", from, e))
}

/// Park production at `<production>.old`, move staging into place, then drop
/// the parked tree. If staging cannot be moved in, the parked tree is put
/// back so production still holds the previous run.
fn swap_aside(staging: &Path, production: &Path) -> Result<()> {
    let old = aside_path(production);
    remove_dir_if_exists(&old)?;

    let parked = production.exists();
    if parked {
        rename(production, &old)?;
    }
    if let Err(e) = rename(staging, production) {
        if parked {
            if let Err(restore) = rename(&old, production) {
                warn!(
                    "previous sitemaps left at {}: {restore}",
                    old.display()
                );
            }
        }
        return Err(e);
    }

    // The new tree is live; a leftover old tree is only clutter.
    if let Err(e) = remove_dir_if_exists(&old) {
        warn!("{e}");
    }
    Ok(())
}

/// `static/sitemaps` -> `static/sitemaps.old`.
fn aside_path(production: &Path) -> PathBuf {
    let mut name = production
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".old");
    production.with_file_name(name)
}
