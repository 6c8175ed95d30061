//! URL routing for archive entities.
//!
//! Batches, titles, issues, and pages each have a canonical path. Pages also
//! have derived representations (OCR HTML, OCR XML, plain text, PDF). The
//! OCR HTML view has no shortcut on the page itself, so it is built from the
//! page's key through a [`PageRouter`].

use chrono::NaiveDate;

/// Everything needed to address a single page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    /// LCCN of the parent title.
    pub lccn: String,
    pub date: NaiveDate,
    pub edition: u32,
    pub sequence: u32,
}

/// Builds the OCR HTML path for a page.
pub trait PageRouter: Send + Sync {
    fn ocr_html_url(&self, key: &PageKey) -> String;
}

impl<F> PageRouter for F
where
    F: Fn(&PageKey) -> String + Send + Sync,
{
    fn ocr_html_url(&self, key: &PageKey) -> String {
        self(key)
    }
}

/// The Open ONI route scheme.
///
/// ```text
/// /batches/{name}/
/// /lccn/{lccn}/
/// /lccn/{lccn}/{date}/ed-{edition}/
/// /lccn/{lccn}/{date}/ed-{edition}/seq-{sequence}/
/// /lccn/{lccn}/{date}/ed-{edition}/seq-{sequence}/ocr/
/// /lccn/{lccn}/{date}/ed-{edition}/seq-{sequence}/ocr.xml
/// /lccn/{lccn}/{date}/ed-{edition}/seq-{sequence}/ocr.txt
/// /lccn/{lccn}/{date}/ed-{edition}/seq-{sequence}.pdf
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOniRoutes;

impl OpenOniRoutes {
    pub fn batch(&self, name: &str) -> String {
        format!("/batches/{name}/")
    }

    pub fn title(&self, lccn: &str) -> String {
        format!("/lccn/{lccn}/")
    }

    pub fn issue(&self, lccn: &str, date: NaiveDate, edition: u32) -> String {
        format!("/lccn/{lccn}/{}/ed-{edition}/", date.format("%Y-%m-%d"))
    }

    pub fn page(&self, key: &PageKey) -> String {
        format!("{}seq-{}/", self.issue(&key.lccn, key.date, key.edition), key.sequence)
    }

    pub fn ocr_xml(&self, key: &PageKey) -> String {
        format!("{}ocr.xml", self.page(key))
    }

    pub fn ocr_txt(&self, key: &PageKey) -> String {
        format!("{}ocr.txt", self.page(key))
    }

    pub fn pdf(&self, key: &PageKey) -> String {
        let page = self.page(key);
        format!("{}.pdf", page.trim_end_matches('/'))
    }
}

impl PageRouter for OpenOniRoutes {
    fn ocr_html_url(&self, key: &PageKey) -> String {
        format!("{}ocr/", self.page(key))
    }
}
