//! Run configuration: base URL, directory layout, and publish behaviour.
//!
//! A `SitemapConfig` is built once and handed to the publisher. Values come
//! from a JSON file, then environment overrides, then whatever the CLI layers
//! on top.

use crate::error::{Result, SitemapError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Per https://www.sitemaps.org/protocol.html, max URLs is 50k per file.
pub const MAX_URLS: usize = 50_000;

/// File name of the sitemap index.
pub const INDEX_FILE_NAME: &str = "sitemap.xml";

/// File name of the externally maintained sitemap referenced first in the index.
pub const CUSTOM_SITEMAP_NAME: &str = "sitemap-custom.xml";

pub const ENV_BASE_URL: &str = "ONI_SITEMAP_BASE_URL";
pub const ENV_DIR: &str = "ONI_SITEMAP_DIR";
pub const ENV_STAGING_DIR: &str = "ONI_SITEMAP_STAGING_DIR";

/// How the finished staging directory replaces the production directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStrategy {
    /// Delete production, then rename staging into place. Readers briefly see
    /// no directory at all.
    #[default]
    Replace,
    /// Rename production aside, rename staging into place, then delete the
    /// old tree. There is always a directory at the production path.
    SwapAside,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Base URL every `<loc>` and index entry is resolved against.
    pub base_url: Url,
    /// Directory served to readers.
    pub production_dir: PathBuf,
    /// Scratch directory the run writes into before publishing.
    pub staging_dir: PathBuf,
    /// Name of the custom sitemap listed first in the index.
    pub custom_sitemap: String,
    pub max_urls: usize,
    pub publish_strategy: PublishStrategy,
    /// Append-only JSONL ledger of runs. Disabled when unset.
    pub run_log: Option<PathBuf>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost/").expect("static URL is valid"),
            production_dir: PathBuf::from("static/sitemaps"),
            staging_dir: PathBuf::from("static/sitemap-tmp"),
            custom_sitemap: CUSTOM_SITEMAP_NAME.to_string(),
            max_urls: MAX_URLS,
            publish_strategy: PublishStrategy::Replace,
            run_log: None,
        }
    }
}

impl SitemapConfig {
    /// Config rooted at `production_dir`, with the staging directory as a sibling.
    pub fn new(base_url: &str, production_dir: impl Into<PathBuf>) -> Result<Self> {
        let production_dir = production_dir.into();
        let staging_dir = sibling_staging_dir(&production_dir);
        let config = Self {
            base_url: parse_base_url(base_url)?,
            production_dir,
            staging_dir,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file. Missing keys fall back to defaults, except
    /// `staging_dir`, which becomes a sibling of the file's `production_dir`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let invalid = |e: serde_json::Error| SitemapError::Config(format!("{}: {e}", path.display()));

        let raw = std::fs::read_to_string(path).map_err(|e| SitemapError::io("read", path, e))?;
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(invalid)?;
        let has_staging_dir = value.get("staging_dir").is_some_and(|v| !v.is_null());

        let mut config: Self = serde_json::from_value(value).map_err(invalid)?;
        config.base_url = parse_base_url(config.base_url.as_str())?;
        if !has_staging_dir {
            config.staging_dir = sibling_staging_dir(&config.production_dir);
        }
        Ok(config)
    }

    /// Apply `ONI_SITEMAP_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(base) = std::env::var(ENV_BASE_URL) {
            self.base_url = parse_base_url(&base)?;
        }
        if let Ok(dir) = std::env::var(ENV_DIR) {
            self.production_dir = PathBuf::from(dir);
            self.staging_dir = sibling_staging_dir(&self.production_dir);
        }
        if let Ok(dir) = std::env::var(ENV_STAGING_DIR) {
            self.staging_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Point at a different production directory; staging follows as its sibling.
    pub fn with_production_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.production_dir = dir.into();
        self.staging_dir = sibling_staging_dir(&self.production_dir);
        self
    }

    pub fn with_max_urls(mut self, max_urls: usize) -> Self {
        self.max_urls = max_urls;
        self
    }

    pub fn with_publish_strategy(mut self, strategy: PublishStrategy) -> Self {
        self.publish_strategy = strategy;
        self
    }

    pub fn with_run_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.run_log = Some(path.into());
        self
    }

    /// Check the invariants a run relies on.
    pub fn validate(&self) -> Result<()> {
        if self.max_urls == 0 || self.max_urls > MAX_URLS {
            return Err(SitemapError::Config(format!(
                "max_urls must be between 1 and {MAX_URLS}, got {}",
                self.max_urls
            )));
        }
        if self.staging_dir == self.production_dir {
            return Err(SitemapError::Config(format!(
                "staging and production directories are both {}",
                self.production_dir.display()
            )));
        }
        if self.custom_sitemap.is_empty() || self.custom_sitemap.contains('/') {
            return Err(SitemapError::Config(format!(
                "custom sitemap must be a bare file name, got {:?}",
                self.custom_sitemap
            )));
        }
        Ok(())
    }
}

/// Parse and normalise a base URL so relative joins keep its path.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |reason: String| SitemapError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// `static/sitemaps` -> `static/sitemaps-tmp`.
fn sibling_staging_dir(production_dir: &Path) -> PathBuf {
    let name = production_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sitemaps".to_string());
    production_dir.with_file_name(format!("{name}-tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_limit() {
        let config = SitemapConfig::default();
        assert_eq!(config.max_urls, 50_000);
        assert_eq!(config.custom_sitemap, "sitemap-custom.xml");
        assert_eq!(config.publish_strategy, PublishStrategy::Replace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("https://example.org/oni").unwrap();
        assert_eq!(url.as_str(), "https://example.org/oni/");

        let url = parse_base_url("https://example.org").unwrap();
        assert_eq!(url.as_str(), "https://example.org/");
    }

    #[test]
    fn test_parse_base_url_rejects_non_http() {
        assert!(parse_base_url("ftp://example.org/").is_err());
        assert!(parse_base_url("mailto:someone@example.org").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_new_places_staging_next_to_production() {
        let config = SitemapConfig::new("https://example.org/", "/srv/static/sitemaps").unwrap();
        assert_eq!(config.staging_dir, PathBuf::from("/srv/static/sitemaps-tmp"));
    }

    #[test]
    fn test_validate_rejects_bad_max_urls() {
        let config = SitemapConfig::default().with_max_urls(0);
        assert!(config.validate().is_err());
        let config = SitemapConfig::default().with_max_urls(MAX_URLS + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_same_dirs() {
        let mut config = SitemapConfig::default();
        config.staging_dir = config.production_dir.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.json");
        std::fs::write(
            &path,
            r#"{"base_url": "https://chroniclingamerica.example", "publish_strategy": "swap_aside"}"#,
        )
        .unwrap();

        let config = SitemapConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url.as_str(), "https://chroniclingamerica.example/");
        assert_eq!(config.publish_strategy, PublishStrategy::SwapAside);
        assert_eq!(config.max_urls, MAX_URLS);
        assert_eq!(config.production_dir, PathBuf::from("static/sitemaps"));
        assert_eq!(config.staging_dir, PathBuf::from("static/sitemaps-tmp"));
    }

    #[test]
    fn test_from_file_derives_sibling_staging() {
        let dir = tempfile::tempdir().unwrap();
        let production = dir.path().join("www/sitemaps");
        let path = dir.path().join("sitemap.json");
        std::fs::write(
            &path,
            serde_json::json!({
                "base_url": "https://example.org/",
                "production_dir": production,
            })
            .to_string(),
        )
        .unwrap();

        let config = SitemapConfig::from_file(&path).unwrap();
        assert_eq!(config.production_dir, production);
        assert_eq!(config.staging_dir, dir.path().join("www/sitemaps-tmp"));
        assert_eq!(config.staging_dir.parent(), config.production_dir.parent());
    }

    #[test]
    fn test_from_file_keeps_explicit_staging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.json");
        std::fs::write(
            &path,
            r#"{"production_dir": "/srv/www/sitemaps", "staging_dir": "/srv/www/sitemap-scratch"}"#,
        )
        .unwrap();

        let config = SitemapConfig::from_file(&path).unwrap();
        assert_eq!(config.staging_dir, PathBuf::from("/srv/www/sitemap-scratch"));
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            SitemapConfig::from_file(&path),
            Err(SitemapError::Config(_))
        ));
    }
}
