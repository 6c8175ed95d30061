//! Sitemap generation: enumerate archive URLs, page them into sitemap files,
//! write the index, and publish the finished tree in one move.

pub mod index;
pub mod publisher;
pub mod reader;
pub mod source;
pub mod writer;

pub use publisher::{Publisher, RunSummary};
pub use source::UrlSource;
pub use writer::SitemapWriter;

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::PathBuf;

/// Namespace shared by `<urlset>` and `<sitemapindex>`.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub(crate) const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// A location and when it last changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    /// Path or absolute URL; resolved against the base URL on write.
    pub location: String,
    pub last_modified: DateTime<Utc>,
}

impl UrlRecord {
    pub fn new(location: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            location: location.into(),
            last_modified,
        }
    }
}

/// A sitemap file written during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapFile {
    /// 1-based, no gaps.
    pub sequence: u32,
    pub path: PathBuf,
    /// Absolute URL the file will be served at.
    pub url: String,
    pub url_count: usize,
}

/// `sitemap-00001.xml` for sequence 1.
pub fn sitemap_file_name(sequence: u32) -> String {
    format!("sitemap-{sequence:05}.xml")
}

/// Internet timestamp used in `<lastmod>`, e.g. `2008-04-02T20:00:00Z`.
pub fn format_lastmod(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
