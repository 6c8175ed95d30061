//! In-memory catalog used by tests and fixtures.

use super::{BatchRecord, Catalog, IssueRecord, PageRecord, TitleRecord};
use crate::error::{Result, SitemapError};
use crate::routes::{OpenOniRoutes, PageKey};
use chrono::{DateTime, NaiveDate, Utc};
use std::cell::Cell;
use std::collections::HashMap;

/// Handle to a batch added with [`MemoryCatalog::add_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchId(usize);

/// Handle to an issue added with [`MemoryCatalog::add_issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueId(i64);

/// Catalog held entirely in memory, routed with the Open ONI scheme.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    batches: Vec<(BatchRecord, Vec<IssueRecord>)>,
    pages: HashMap<i64, Vec<PageRecord>>,
    titles: Vec<TitleRecord>,
    next_issue_id: i64,
    routes: OpenOniRoutes,
    queries: Cell<usize>,
    fail_on_query: Option<usize>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_batch(&mut self, name: &str, created: DateTime<Utc>) -> BatchId {
        let record = BatchRecord {
            name: name.to_string(),
            created,
            url: self.routes.batch(name),
        };
        self.batches.push((record, Vec::new()));
        BatchId(self.batches.len() - 1)
    }

    /// Add an issue to a batch. Panics if `batch` did not come from this catalog.
    pub fn add_issue(&mut self, batch: BatchId, lccn: &str, date: NaiveDate, edition: u32) -> IssueId {
        self.next_issue_id += 1;
        let id = self.next_issue_id;
        let record = IssueRecord {
            id,
            lccn: lccn.to_string(),
            date_issued: date,
            edition,
            url: self.routes.issue(lccn, date, edition),
        };
        self.batches[batch.0].1.push(record);
        self.pages.insert(id, Vec::new());
        IssueId(id)
    }

    /// Add a page to an issue. Panics if `issue` did not come from this catalog.
    pub fn add_page(&mut self, issue: IssueId, sequence: u32) {
        let key = self
            .batches
            .iter()
            .flat_map(|(_, issues)| issues.iter())
            .find(|i| i.id == issue.0)
            .map(|i| PageKey {
                lccn: i.lccn.clone(),
                date: i.date_issued,
                edition: i.edition,
                sequence,
            })
            .expect("issue belongs to this catalog");

        let record = PageRecord {
            sequence,
            url: self.routes.page(&key),
            ocr_url: self.routes.ocr_xml(&key),
            txt_url: self.routes.ocr_txt(&key),
            pdf_url: self.routes.pdf(&key),
        };
        self.pages.entry(issue.0).or_default().push(record);
    }

    pub fn add_title(&mut self, lccn: &str, created: DateTime<Utc>) {
        self.titles.push(TitleRecord {
            lccn: lccn.to_string(),
            created,
            url: self.routes.title(lccn),
        });
    }

    /// Make the `n`th query (1-based, counting every trait call) fail.
    pub fn fail_on_query(mut self, n: usize) -> Self {
        self.fail_on_query = Some(n);
        self
    }

    /// Number of trait calls answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    fn query(&self) -> Result<()> {
        let n = self.queries.get() + 1;
        self.queries.set(n);
        if self.fail_on_query == Some(n) {
            return Err(SitemapError::catalog(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                format!("simulated catalog failure on query {n}"),
            )));
        }
        Ok(())
    }
}

impl Catalog for MemoryCatalog {
    fn batches(&self) -> Result<Vec<BatchRecord>> {
        self.query()?;
        Ok(self.batches.iter().map(|(b, _)| b.clone()).collect())
    }

    fn issues(&self, batch: &BatchRecord) -> Result<Vec<IssueRecord>> {
        self.query()?;
        Ok(self
            .batches
            .iter()
            .find(|(b, _)| b.name == batch.name)
            .map(|(_, issues)| issues.clone())
            .unwrap_or_default())
    }

    fn pages(&self, issue: &IssueRecord) -> Result<Vec<PageRecord>> {
        self.query()?;
        Ok(self.pages.get(&issue.id).cloned().unwrap_or_default())
    }

    fn titles(&self) -> Result<Vec<TitleRecord>> {
        self.query()?;
        Ok(self.titles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_memory_catalog_hierarchy() {
        let created = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        let mut catalog = MemoryCatalog::new();
        let batch = catalog.add_batch("batch_one", created);
        let issue = catalog.add_issue(batch, "sn1", NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(), 1);
        catalog.add_page(issue, 1);
        catalog.add_page(issue, 2);

        let batches = catalog.batches().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].url, "/batches/batch_one/");

        let issues = catalog.issues(&batches[0]).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].url, "/lccn/sn1/1900-01-01/ed-1/");

        let pages = catalog.pages(&issues[0]).unwrap();
        assert_eq!(pages.iter().map(|p| p.sequence).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(pages[1].pdf_url, "/lccn/sn1/1900-01-01/ed-1/seq-2.pdf");
    }

    #[test]
    fn test_memory_catalog_injected_failure() {
        let catalog = MemoryCatalog::new().fail_on_query(2);
        assert!(catalog.batches().is_ok());
        assert!(matches!(catalog.titles(), Err(SitemapError::Catalog { .. })));
        assert!(catalog.titles().is_ok());
        assert_eq!(catalog.query_count(), 3);
    }
}
