//! Sitemap generation for digitized-newspaper archives.
//!
//! Walks a [`catalog::Catalog`] of batches, issues, pages, and titles, writes
//! every public URL into paginated sitemap files plus a `sitemap.xml` index,
//! and publishes the tree in one move so readers never see a half-built set.
//!
//! ```no_run
//! use oni_sitemap::catalog::SqliteCatalog;
//! use oni_sitemap::config::SitemapConfig;
//! use oni_sitemap::sitemap::Publisher;
//!
//! # fn main() -> oni_sitemap::error::Result<()> {
//! let catalog = SqliteCatalog::open("catalog.db".as_ref())?;
//! let config = SitemapConfig::new("https://chroniclingamerica.example/", "static/sitemaps")?;
//! let summary = Publisher::new(config).run(&catalog)?;
//! println!("{} URLs in {} files", summary.url_count, summary.files.len());
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod sitemap;
