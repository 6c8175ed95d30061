//! The `sitemap.xml` index pointing at every generated sitemap.

use super::{writer::resolve, SitemapFile, SITEMAP_NS, XML_DECL};
use crate::config::INDEX_FILE_NAME;
use crate::error::{Result, SitemapError};
use quick_xml::escape::escape;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Render the index: the custom sitemap first, then each file in sequence order.
pub fn render_index(custom_url: &str, files: &[SitemapFile]) -> String {
    let mut out = String::from(XML_DECL);
    out.push_str(&format!("<sitemapindex xmlns=\"{SITEMAP_NS}\">\n"));
    for loc in std::iter::once(custom_url).chain(files.iter().map(|f| f.url.as_str())) {
        out.push_str(&format!("<sitemap><loc>{}</loc></sitemap>\n", escape(loc)));
    }
    out.push_str("</sitemapindex>\n");
    out
}

/// Write `sitemap.xml` into `dir`. Always written, even with no sitemap files.
pub fn write_index(
    dir: &Path,
    base_url: &Url,
    custom_sitemap: &str,
    files: &[SitemapFile],
) -> Result<PathBuf> {
    let custom_url = resolve(base_url, custom_sitemap)?;
    let path = dir.join(INDEX_FILE_NAME);
    info!(
        "writing sitemap index \"{}\" ({} entries)",
        path.display(),
        files.len() + 1
    );
    std::fs::write(&path, render_index(&custom_url, files))
        .map_err(|e| SitemapError::io("write", &path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(sequence: u32) -> SitemapFile {
        SitemapFile {
            sequence,
            path: PathBuf::from(format!("sitemap-{sequence:05}.xml")),
            url: format!("https://example.org/sitemap-{sequence:05}.xml"),
            url_count: 1,
        }
    }

    #[test]
    fn test_render_index_exact_bytes() {
        let xml = render_index("https://example.org/sitemap-custom.xml", &[file(1), file(2)]);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
             <sitemap><loc>https://example.org/sitemap-custom.xml</loc></sitemap>\n\
             <sitemap><loc>https://example.org/sitemap-00001.xml</loc></sitemap>\n\
             <sitemap><loc>https://example.org/sitemap-00002.xml</loc></sitemap>\n\
             </sitemapindex>\n"
        );
    }

    #[test]
    fn test_write_index_with_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = Url::parse("https://example.org/").unwrap();
        let path = write_index(dir.path(), &base, "sitemap-custom.xml", &[]).unwrap();

        let xml = std::fs::read_to_string(path).unwrap();
        assert_eq!(xml.matches("<sitemap>").count(), 1);
        assert!(xml.contains("<loc>https://example.org/sitemap-custom.xml</loc>"));
    }
}
