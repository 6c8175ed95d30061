//! Lazy walk of the catalog yielding every public URL.
//!
//! Order is fixed: each batch, then each of its issues, then each issue's
//! pages (page, OCR HTML, OCR XML, text, PDF); after all batches, every
//! title. Issues and pages carry their batch's creation time, titles carry
//! their own. Children are fetched one parent at a time.

use super::UrlRecord;
use crate::catalog::{BatchRecord, Catalog, IssueRecord, TitleRecord};
use crate::error::Result;
use crate::routes::PageRouter;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Batches,
    Titles,
    Done,
}

/// Pull-based URL enumeration over a [`Catalog`].
///
/// Yields `Err` at most once, then ends.
pub struct UrlSource<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    router: &'a dyn PageRouter,
    phase: Phase,
    pending: VecDeque<UrlRecord>,
    batches: std::vec::IntoIter<BatchRecord>,
    issues: std::vec::IntoIter<IssueRecord>,
    titles: std::vec::IntoIter<TitleRecord>,
    batch_created: Option<DateTime<Utc>>,
}

impl<'a, C: Catalog + ?Sized> UrlSource<'a, C> {
    pub fn new(catalog: &'a C, router: &'a dyn PageRouter) -> Self {
        Self {
            catalog,
            router,
            phase: Phase::Start,
            pending: VecDeque::new(),
            batches: Vec::new().into_iter(),
            issues: Vec::new().into_iter(),
            titles: Vec::new().into_iter(),
            batch_created: None,
        }
    }

    /// Queue the next group of records, or move to the next phase.
    fn refill(&mut self) -> Result<()> {
        while self.pending.is_empty() {
            match self.phase {
                Phase::Start => {
                    self.batches = self.catalog.batches()?.into_iter();
                    self.phase = Phase::Batches;
                }
                Phase::Batches => {
                    if let (Some(created), Some(issue)) = (self.batch_created, self.issues.next()) {
                        self.queue_issue(&issue, created)?;
                    } else if let Some(batch) = self.batches.next() {
                        self.pending.push_back(UrlRecord::new(batch.url.clone(), batch.created));
                        self.issues = self.catalog.issues(&batch)?.into_iter();
                        self.batch_created = Some(batch.created);
                    } else {
                        self.batch_created = None;
                        self.titles = self.catalog.titles()?.into_iter();
                        self.phase = Phase::Titles;
                    }
                }
                Phase::Titles => match self.titles.next() {
                    Some(title) => self.pending.push_back(UrlRecord::new(title.url, title.created)),
                    None => self.phase = Phase::Done,
                },
                Phase::Done => return Ok(()),
            }
        }
        Ok(())
    }

    fn queue_issue(&mut self, issue: &IssueRecord, created: DateTime<Utc>) -> Result<()> {
        self.pending.push_back(UrlRecord::new(issue.url.clone(), created));
        for page in self.catalog.pages(issue)? {
            let ocr_html = self.router.ocr_html_url(&issue.page_key(&page));
            self.pending.extend([
                UrlRecord::new(page.url, created),
                UrlRecord::new(ocr_html, created),
                UrlRecord::new(page.ocr_url, created),
                UrlRecord::new(page.txt_url, created),
                UrlRecord::new(page.pdf_url, created),
            ]);
        }
        Ok(())
    }
}

impl<C: Catalog + ?Sized> Iterator for UrlSource<'_, C> {
    type Item = Result<UrlRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(e) = self.refill() {
            self.phase = Phase::Done;
            self.pending.clear();
            return Some(Err(e));
        }
        self.pending.pop_front().map(Ok)
    }
}

impl<C: Catalog + ?Sized> std::iter::FusedIterator for UrlSource<'_, C> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::routes::OpenOniRoutes;
    use chrono::{NaiveDate, TimeZone};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 1, day, 0, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(1890, 2, day).unwrap()
    }

    #[test]
    fn test_emission_order_and_timestamps() {
        let mut catalog = MemoryCatalog::new();
        let batch = catalog.add_batch("b1", ts(1));
        let issue = catalog.add_issue(batch, "sn1", date(3), 1);
        catalog.add_page(issue, 1);
        catalog.add_title("sn1", ts(9));

        let routes = OpenOniRoutes;
        let records: Vec<UrlRecord> = UrlSource::new(&catalog, &routes)
            .collect::<Result<_>>()
            .unwrap();

        let locations: Vec<&str> = records.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(
            locations,
            vec![
                "/batches/b1/",
                "/lccn/sn1/1890-02-03/ed-1/",
                "/lccn/sn1/1890-02-03/ed-1/seq-1/",
                "/lccn/sn1/1890-02-03/ed-1/seq-1/ocr/",
                "/lccn/sn1/1890-02-03/ed-1/seq-1/ocr.xml",
                "/lccn/sn1/1890-02-03/ed-1/seq-1/ocr.txt",
                "/lccn/sn1/1890-02-03/ed-1/seq-1.pdf",
                "/lccn/sn1/",
            ]
        );

        // Everything under the batch carries the batch's timestamp.
        assert!(records[..7].iter().all(|r| r.last_modified == ts(1)));
        assert_eq!(records[7].last_modified, ts(9));
    }

    #[test]
    fn test_batches_walk_depth_first() {
        let mut catalog = MemoryCatalog::new();
        let b1 = catalog.add_batch("b1", ts(1));
        let b2 = catalog.add_batch("b2", ts(2));
        catalog.add_issue(b1, "sn1", date(1), 1);
        catalog.add_issue(b1, "sn1", date(2), 1);
        catalog.add_issue(b2, "sn2", date(1), 2);

        let routes = OpenOniRoutes;
        let records: Vec<UrlRecord> = UrlSource::new(&catalog, &routes)
            .collect::<Result<_>>()
            .unwrap();
        let locations: Vec<&str> = records.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(
            locations,
            vec![
                "/batches/b1/",
                "/lccn/sn1/1890-02-01/ed-1/",
                "/lccn/sn1/1890-02-02/ed-1/",
                "/batches/b2/",
                "/lccn/sn2/1890-02-01/ed-2/",
            ]
        );
        assert_eq!(records[4].last_modified, ts(2));
    }

    #[test]
    fn test_ocr_html_comes_from_router() {
        let mut catalog = MemoryCatalog::new();
        let batch = catalog.add_batch("b1", ts(1));
        let issue = catalog.add_issue(batch, "sn1", date(1), 1);
        catalog.add_page(issue, 4);

        let router = |k: &crate::routes::PageKey| format!("/custom-ocr/{}/{}", k.lccn, k.sequence);
        let records: Vec<UrlRecord> = UrlSource::new(&catalog, &router)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records[3].location, "/custom-ocr/sn1/4");
    }

    #[test]
    fn test_empty_catalog_yields_nothing() {
        let catalog = MemoryCatalog::new();
        let routes = OpenOniRoutes;
        assert_eq!(UrlSource::new(&catalog, &routes).count(), 0);
    }

    #[test]
    fn test_catalog_error_is_yielded_once() {
        let mut catalog = MemoryCatalog::new();
        catalog.add_batch("b1", ts(1));
        // Query 1 lists batches, query 2 lists b1's issues.
        let catalog = catalog.fail_on_query(2);

        let routes = OpenOniRoutes;
        let mut source = UrlSource::new(&catalog, &routes);
        assert!(matches!(source.next(), Some(Err(_))));
        assert!(source.next().is_none());
        assert!(source.next().is_none());
    }

    #[test]
    fn test_pages_fetched_lazily() {
        let mut catalog = MemoryCatalog::new();
        let batch = catalog.add_batch("b1", ts(1));
        for day in 1..=3 {
            let issue = catalog.add_issue(batch, "sn1", date(day), 1);
            catalog.add_page(issue, 1);
        }

        let routes = OpenOniRoutes;
        let mut source = UrlSource::new(&catalog, &routes);
        // batch record: batches() + issues(b1)
        source.next().unwrap().unwrap();
        assert_eq!(catalog.query_count(), 2);
        // first issue record pulls only that issue's pages
        source.next().unwrap().unwrap();
        assert_eq!(catalog.query_count(), 3);
    }
}
