//! Error taxonomy for a sitemap run.
//!
//! Every variant is fatal to the run that raised it. Nothing here is retried;
//! a failed run is expected to be re-run wholesale by whatever scheduled it.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, SitemapError>;

#[derive(Debug, Error)]
pub enum SitemapError {
    /// The backing catalog could not be enumerated.
    #[error("catalog enumeration failed: {source}")]
    Catalog {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A file-system operation failed at some publisher step.
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staging directory survived cleanup. Another run may be writing to it.
    #[error("staging directory {} already exists; refusing to overwrite", .path.display())]
    StagingExists { path: PathBuf },

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A catalog location could not be resolved against the base URL.
    #[error("cannot resolve {location:?} against base URL: {source}")]
    InvalidUrl {
        location: String,
        #[source]
        source: url::ParseError,
    },

    /// A published sitemap document could not be read back.
    #[error("malformed sitemap XML at byte {position}: {reason}")]
    MalformedXml { position: u64, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SitemapError {
    /// Wrap an I/O error with the operation and path that produced it.
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Wrap any catalog-side failure.
    pub fn catalog(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Catalog {
            source: Box::new(source),
        }
    }
}

impl From<rusqlite::Error> for SitemapError {
    fn from(e: rusqlite::Error) -> Self {
        Self::catalog(e)
    }
}
