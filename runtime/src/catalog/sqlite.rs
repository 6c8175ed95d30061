//! Catalog backed by an Open ONI-shaped SQLite database.

use super::{BatchRecord, Catalog, IssueRecord, PageRecord, TitleRecord};
use crate::error::Result;
use crate::routes::{OpenOniRoutes, PageKey};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS batches (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS titles (
    id INTEGER PRIMARY KEY,
    lccn TEXT NOT NULL UNIQUE,
    created TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS issues (
    id INTEGER PRIMARY KEY,
    batch_id INTEGER NOT NULL REFERENCES batches(id),
    title_id INTEGER NOT NULL REFERENCES titles(id),
    date_issued TEXT NOT NULL,
    edition INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY,
    issue_id INTEGER NOT NULL REFERENCES issues(id),
    sequence INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS issues_batch ON issues(batch_id);
CREATE INDEX IF NOT EXISTS pages_issue ON pages(issue_id);
";

/// Catalog read from SQLite. Rows come back in primary-key order.
pub struct SqliteCatalog {
    db: Connection,
    routes: OpenOniRoutes,
}

impl SqliteCatalog {
    /// Open an existing catalog database read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!("opened catalog {}", path.display());
        Ok(Self::from_connection(db))
    }

    /// Open (or create) a writable catalog and make sure the schema exists.
    pub fn create(path: &Path) -> Result<Self> {
        let catalog = Self::from_connection(Connection::open(path)?);
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// Fresh in-memory catalog with the schema applied.
    pub fn in_memory() -> Result<Self> {
        let catalog = Self::from_connection(Connection::open_in_memory()?);
        catalog.init_schema()?;
        Ok(catalog)
    }

    pub fn from_connection(db: Connection) -> Self {
        Self {
            db,
            routes: OpenOniRoutes,
        }
    }

    pub fn init_schema(&self) -> Result<()> {
        self.db.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn insert_batch(&self, name: &str, created: DateTime<Utc>) -> Result<i64> {
        self.db.execute(
            "INSERT INTO batches (name, created) VALUES (?1, ?2)",
            params![name, created],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    pub fn insert_title(&self, lccn: &str, created: DateTime<Utc>) -> Result<i64> {
        self.db.execute(
            "INSERT INTO titles (lccn, created) VALUES (?1, ?2)",
            params![lccn, created],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    pub fn insert_issue(
        &self,
        batch_id: i64,
        title_id: i64,
        date_issued: NaiveDate,
        edition: u32,
    ) -> Result<i64> {
        self.db.execute(
            "INSERT INTO issues (batch_id, title_id, date_issued, edition) VALUES (?1, ?2, ?3, ?4)",
            params![batch_id, title_id, date_issued, edition],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    pub fn insert_page(&self, issue_id: i64, sequence: u32) -> Result<i64> {
        self.db.execute(
            "INSERT INTO pages (issue_id, sequence) VALUES (?1, ?2)",
            params![issue_id, sequence],
        )?;
        Ok(self.db.last_insert_rowid())
    }
}

impl Catalog for SqliteCatalog {
    fn batches(&self) -> Result<Vec<BatchRecord>> {
        let mut stmt = self
            .db
            .prepare_cached("SELECT name, created FROM batches ORDER BY id")?;
        let batches = stmt
            .query_map([], |row| {
                let name: String = row.get(0)?;
                Ok(BatchRecord {
                    url: self.routes.batch(&name),
                    created: row.get(1)?,
                    name,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(batches)
    }

    fn issues(&self, batch: &BatchRecord) -> Result<Vec<IssueRecord>> {
        let mut stmt = self.db.prepare_cached(
            "SELECT i.id, t.lccn, i.date_issued, i.edition
             FROM issues i
             JOIN batches b ON b.id = i.batch_id
             JOIN titles t ON t.id = i.title_id
             WHERE b.name = ?1
             ORDER BY i.id",
        )?;
        let issues = stmt
            .query_map(params![batch.name], |row| {
                let lccn: String = row.get(1)?;
                let date_issued: NaiveDate = row.get(2)?;
                let edition: u32 = row.get(3)?;
                Ok(IssueRecord {
                    id: row.get(0)?,
                    url: self.routes.issue(&lccn, date_issued, edition),
                    lccn,
                    date_issued,
                    edition,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    fn pages(&self, issue: &IssueRecord) -> Result<Vec<PageRecord>> {
        let mut stmt = self
            .db
            .prepare_cached("SELECT sequence FROM pages WHERE issue_id = ?1 ORDER BY id")?;
        let pages = stmt
            .query_map(params![issue.id], |row| {
                let sequence: u32 = row.get(0)?;
                let key = PageKey {
                    lccn: issue.lccn.clone(),
                    date: issue.date_issued,
                    edition: issue.edition,
                    sequence,
                };
                Ok(PageRecord {
                    sequence,
                    url: self.routes.page(&key),
                    ocr_url: self.routes.ocr_xml(&key),
                    txt_url: self.routes.ocr_txt(&key),
                    pdf_url: self.routes.pdf(&key),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn titles(&self) -> Result<Vec<TitleRecord>> {
        let mut stmt = self
            .db
            .prepare_cached("SELECT lccn, created FROM titles ORDER BY id")?;
        let titles = stmt
            .query_map([], |row| {
                let lccn: String = row.get(0)?;
                Ok(TitleRecord {
                    url: self.routes.title(&lccn),
                    created: row.get(1)?,
                    lccn,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(titles)
    }
}
