//! Buffer URL records and write them out as numbered `<urlset>` files.

use super::{format_lastmod, sitemap_file_name, SitemapFile, UrlRecord, SITEMAP_NS, XML_DECL};
use crate::error::{Result, SitemapError};
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Writes `sitemap-NNNNN.xml` files of at most `max_urls` entries each.
///
/// A file is flushed as soon as the buffer is full, and once more on
/// [`finish`](Self::finish) if anything is left. Empty buffers never produce
/// a file.
pub struct SitemapWriter {
    dir: PathBuf,
    base_url: Url,
    max_urls: usize,
    buffer: Vec<(String, DateTime<Utc>)>,
    sequence: u32,
    files: Vec<SitemapFile>,
    url_count: usize,
}

impl SitemapWriter {
    pub fn new(dir: impl Into<PathBuf>, base_url: &Url, max_urls: usize) -> Self {
        let max_urls = max_urls.max(1);
        Self {
            dir: dir.into(),
            base_url: base_url.clone(),
            max_urls,
            buffer: Vec::with_capacity(max_urls.min(4096)),
            sequence: 0,
            files: Vec::new(),
            url_count: 0,
        }
    }

    /// Add a record, flushing a full file if this one fills the buffer.
    ///
    /// Returns the file written, if any.
    pub fn push(&mut self, record: UrlRecord) -> Result<Option<&SitemapFile>> {
        let loc = resolve(&self.base_url, &record.location)?;
        self.buffer.push((loc, record.last_modified));
        self.url_count += 1;
        if self.buffer.len() >= self.max_urls {
            return self.flush();
        }
        Ok(None)
    }

    /// Write the buffered records to the next numbered file.
    pub fn flush(&mut self) -> Result<Option<&SitemapFile>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let sequence = self.sequence + 1;
        let name = sitemap_file_name(sequence);
        let path = self.dir.join(&name);
        info!("writing sitemap \"{}\"", path.display());

        write_urlset(&path, &self.buffer).map_err(|e| SitemapError::io("write", &path, e))?;

        let url = resolve(&self.base_url, &name)?;
        self.sequence = sequence;
        self.files.push(SitemapFile {
            sequence,
            path,
            url,
            url_count: self.buffer.len(),
        });
        self.buffer.clear();
        Ok(self.files.last())
    }

    /// Flush whatever is left and return every file written, in order.
    pub fn finish(mut self) -> Result<Vec<SitemapFile>> {
        self.flush()?;
        Ok(self.files)
    }

    pub fn files(&self) -> &[SitemapFile] {
        &self.files
    }

    /// Records accepted so far, flushed or not.
    pub fn url_count(&self) -> usize {
        self.url_count
    }
}

/// Resolve a catalog location against the base URL. Absolute URLs pass
/// through; paths are joined with the usual relative-reference rules.
pub fn resolve(base: &Url, location: &str) -> Result<String> {
    base.join(location)
        .map(String::from)
        .map_err(|source| SitemapError::InvalidUrl {
            location: location.to_string(),
            source,
        })
}

/// Render one `<urlset>` document.
pub fn render_urlset(entries: &[(String, DateTime<Utc>)]) -> String {
    let mut out = String::with_capacity(128 + entries.len() * 128);
    out.push_str(XML_DECL);
    out.push_str(&format!("<urlset xmlns=\"{SITEMAP_NS}\">\n"));
    for (loc, last_modified) in entries {
        out.push_str("\t<url>\n");
        out.push_str(&format!("\t\t<loc>{}</loc>\n", escape(loc.as_str())));
        out.push_str(&format!("\t\t<lastmod>{}</lastmod>\n", format_lastmod(last_modified)));
        out.push_str("\t</url>\n");
    }
    out.push_str("</urlset>\n");
    out
}

fn write_urlset(path: &Path, entries: &[(String, DateTime<Utc>)]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(render_urlset(entries).as_bytes())?;
    out.flush()?;
    out.get_ref().sync_all()
}
