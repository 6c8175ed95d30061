//! Read-only view of the newspaper catalog.
//!
//! The catalog stores batches, titles, issues, and pages. Sitemap generation
//! only ever walks it top-down in the catalog's default order, one parent at
//! a time, so implementations hand back children per parent rather than the
//! whole hierarchy.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

use crate::error::Result;
use crate::routes::PageKey;
use chrono::{DateTime, NaiveDate, Utc};

/// A unit of ingested content.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    pub name: String,
    pub created: DateTime<Utc>,
    /// Canonical path of the batch page.
    pub url: String,
}

/// A newspaper title.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleRecord {
    pub lccn: String,
    pub created: DateTime<Utc>,
    pub url: String,
}

/// One published edition of a title.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
    /// Catalog-internal identifier, used to look up pages.
    pub id: i64,
    /// LCCN of the parent title.
    pub lccn: String,
    pub date_issued: NaiveDate,
    pub edition: u32,
    pub url: String,
}

/// A scanned page and its derived representations.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub sequence: u32,
    pub url: String,
    pub ocr_url: String,
    pub txt_url: String,
    pub pdf_url: String,
}

impl IssueRecord {
    /// Key for a page of this issue.
    pub fn page_key(&self, page: &PageRecord) -> PageKey {
        PageKey {
            lccn: self.lccn.clone(),
            date: self.date_issued,
            edition: self.edition,
            sequence: page.sequence,
        }
    }
}

/// Enumeration queries the sitemap needs. Every method returns records in
/// the catalog's default (stable) order.
pub trait Catalog {
    fn batches(&self) -> Result<Vec<BatchRecord>>;
    fn issues(&self, batch: &BatchRecord) -> Result<Vec<IssueRecord>>;
    fn pages(&self, issue: &IssueRecord) -> Result<Vec<PageRecord>>;
    fn titles(&self) -> Result<Vec<TitleRecord>>;
}
