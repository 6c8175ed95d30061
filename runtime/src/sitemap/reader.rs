//! Read back published sitemap files.

use crate::error::{Result, SitemapError};
use quick_xml::events::Event;
use quick_xml::Reader;

/// An entry parsed from a `<urlset>` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

/// Parse the `<loc>` of every `<sitemap>` in an index document, in order.
pub fn parse_index(xml: &str) -> Result<Vec<String>> {
    Ok(parse_entries(xml, b"sitemap")?
        .into_iter()
        .map(|e| e.loc)
        .collect())
}

/// Parse every `<url>` entry of a sitemap document, in order.
pub fn parse_urlset(xml: &str) -> Result<Vec<UrlEntry>> {
    parse_entries(xml, b"url")
}

/// Walk the document once. Syntax errors, a missing root element, and a
/// document that ends with elements still open are all rejected, so a
/// truncated file is never mistaken for a short one.
fn parse_entries(xml: &str, entry_tag: &[u8]) -> Result<Vec<UrlEntry>> {
    let mut entries = Vec::new();
    let mut in_entry = false;
    let mut current_loc = String::new();
    let mut current_lastmod: Option<String> = None;
    let mut current_tag = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let malformed = |reader: &Reader<&[u8]>, reason: String| SitemapError::MalformedXml {
        position: reader.buffer_position() as u64,
        reason,
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                saw_root = true;
                let name = e.name().as_ref().to_vec();
                if name == entry_tag {
                    in_entry = true;
                    current_loc.clear();
                    current_lastmod = None;
                }
                current_tag = name;
            }
            Ok(Event::Empty(_)) => saw_root = true,
            Ok(Event::Text(ref e)) => {
                if in_entry {
                    let text = e
                        .unescape()
                        .map_err(|err| malformed(&reader, err.to_string()))?
                        .trim()
                        .to_string();
                    match current_tag.as_slice() {
                        b"loc" => current_loc = text,
                        b"lastmod" => current_lastmod = Some(text),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                depth = depth.saturating_sub(1);
                if e.name().as_ref() == entry_tag && in_entry {
                    if !current_loc.is_empty() {
                        entries.push(UrlEntry {
                            loc: std::mem::take(&mut current_loc),
                            lastmod: current_lastmod.take(),
                        });
                    }
                    in_entry = false;
                }
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(&reader, e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(malformed(&reader, "no root element".to_string()));
    }
    if depth > 0 {
        return Err(malformed(&reader, format!("document ends with {depth} element(s) open")));
    }
    Ok(entries)
}
