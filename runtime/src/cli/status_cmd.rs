//! `oni-sitemap status` - describe the currently published sitemap tree.

use crate::cli::output::{self, Styled};
use crate::config::{SitemapConfig, INDEX_FILE_NAME};
use crate::sitemap::reader::{parse_index, parse_urlset};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, clap::Args)]
pub struct StatusArgs {
    /// Production directory to inspect.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// JSON config file to take the directory from.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// One `<sitemap>` entry of the published index.
#[derive(Debug, Clone, Serialize)]
pub struct EntryStatus {
    pub loc: String,
    pub file_name: String,
    /// Whether the referenced file exists next to the index.
    pub present: bool,
    pub url_count: usize,
    pub bytes: u64,
    /// Set when the file exists but is not a well-formed urlset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeStatus {
    pub dir: PathBuf,
    pub entries: Vec<EntryStatus>,
    pub total_urls: usize,
    pub index_age_secs: Option<u64>,
}

/// Inspect a published directory. `None` when there is no index.
pub fn collect_status(dir: &Path) -> Result<Option<TreeStatus>> {
    let index_path = dir.join(INDEX_FILE_NAME);
    if !index_path.exists() {
        return Ok(None);
    }

    let index = std::fs::read_to_string(&index_path)
        .with_context(|| format!("failed to read {}", index_path.display()))?;
    let index_age_secs = index_path
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.elapsed().ok())
        .map(|d| d.as_secs());

    let mut entries = Vec::new();
    let locs = parse_index(&index).with_context(|| format!("failed to parse {}", index_path.display()))?;
    for loc in locs {
        let file_name = file_name_of(&loc);
        let path = dir.join(&file_name);
        let (present, url_count, bytes, error) = match std::fs::read_to_string(&path) {
            Ok(xml) => match parse_urlset(&xml) {
                Ok(urls) => (true, urls.len(), xml.len() as u64, None),
                Err(e) => (true, 0, xml.len() as u64, Some(e.to_string())),
            },
            Err(_) => (false, 0, 0, None),
        };
        entries.push(EntryStatus {
            loc,
            file_name,
            present,
            url_count,
            bytes,
            error,
        });
    }

    let total_urls = entries.iter().map(|e| e.url_count).sum();
    Ok(Some(TreeStatus {
        dir: dir.to_path_buf(),
        entries,
        total_urls,
        index_age_secs,
    }))
}

/// Last path segment of a sitemap URL.
fn file_name_of(loc: &str) -> String {
    url::Url::parse(loc)
        .ok()
        .and_then(|u| u.path_segments().and_then(|mut s| s.next_back()).map(String::from))
        .unwrap_or_else(|| loc.rsplit('/').next().unwrap_or(loc).to_string())
}

/// Run the status command.
pub async fn run(args: StatusArgs) -> Result<()> {
    let s = Styled::new();
    let dir = match (&args.dir, &args.config) {
        (Some(dir), _) => dir.clone(),
        (None, Some(path)) => SitemapConfig::from_file(path)?.production_dir,
        (None, None) => {
            let mut config = SitemapConfig::default();
            config.apply_env()?;
            config.production_dir
        }
    };

    let Some(status) = collect_status(&dir)? else {
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": "not_found",
                "message": format!("No sitemap index in {}", dir.display()),
            }));
        } else if !output::is_quiet() {
            eprintln!("  No sitemap index in {}.", dir.display());
            eprintln!("  Build one with: oni-sitemap build");
        }
        return Ok(());
    };

    if output::is_json() {
        output::print_json(&serde_json::to_value(&status)?);
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::print_header(&s);
    eprintln!("  {}", s.bold(&status.dir.display().to_string()));
    if let Some(age) = status.index_age_secs {
        eprintln!("  Built {} ago", output::format_duration(age));
    }
    eprintln!();

    for entry in &status.entries {
        let symbol = if entry.present && entry.error.is_none() {
            s.ok_sym()
        } else {
            s.warn_sym()
        };
        let detail = match (&entry.error, entry.present) {
            (Some(e), _) => format!("unreadable: {e}"),
            (None, true) => format!("{:>6} URLs  {}", entry.url_count, output::format_size(entry.bytes)),
            (None, false) => "missing".to_string(),
        };
        output::print_check(symbol, &entry.file_name, &detail);
    }

    eprintln!();
    eprintln!(
        "  {} URLs across {} index entries",
        s.green(&status.total_urls.to_string()),
        status.entries.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::sitemap::Publisher;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of("https://example.org/oni/sitemap-00003.xml"), "sitemap-00003.xml");
        assert_eq!(file_name_of("sitemap-custom.xml"), "sitemap-custom.xml");
    }

    #[test]
    fn test_collect_status_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_status(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_collect_status_after_publish() {
        let dir = tempfile::tempdir().unwrap();
        let config = SitemapConfig::new("https://example.org/", dir.path().join("sitemaps"))
            .unwrap()
            .with_max_urls(4);

        let created = Utc.with_ymd_and_hms(2021, 8, 1, 0, 0, 0).unwrap();
        let mut catalog = MemoryCatalog::new();
        let batch = catalog.add_batch("b", created);
        let issue = catalog.add_issue(batch, "sn9", NaiveDate::from_ymd_opt(1920, 1, 1).unwrap(), 1);
        catalog.add_page(issue, 1);
        Publisher::new(config.clone()).run(&catalog).unwrap();

        let status = collect_status(&config.production_dir).unwrap().unwrap();
        // custom (missing) + two files of 4 and 3
        assert_eq!(status.entries.len(), 3);
        assert!(!status.entries[0].present);
        assert_eq!(status.entries[1].url_count, 4);
        assert_eq!(status.entries[2].url_count, 3);
        assert_eq!(status.total_urls, 7);
        assert!(status.entries.iter().all(|e| e.error.is_none()));
    }

    #[test]
    fn test_collect_status_flags_truncated_sitemap() {
        let dir = tempfile::tempdir().unwrap();
        let config = SitemapConfig::new("https://example.org/", dir.path().join("sitemaps")).unwrap();

        let created = Utc.with_ymd_and_hms(2021, 8, 1, 0, 0, 0).unwrap();
        let mut catalog = MemoryCatalog::new();
        let batch = catalog.add_batch("b", created);
        let issue = catalog.add_issue(batch, "sn9", NaiveDate::from_ymd_opt(1920, 1, 1).unwrap(), 1);
        catalog.add_page(issue, 1);
        Publisher::new(config.clone()).run(&catalog).unwrap();

        // Cut the file off in the middle of its second entry.
        let path = config.production_dir.join("sitemap-00001.xml");
        let xml = std::fs::read_to_string(&path).unwrap();
        let second = xml.match_indices("<url>").nth(1).unwrap().0;
        std::fs::write(&path, &xml[..second + 20]).unwrap();

        let status = collect_status(&config.production_dir).unwrap().unwrap();
        let entry = &status.entries[1];
        assert!(entry.present);
        assert!(entry.error.is_some());
        assert_eq!(entry.url_count, 0);
    }

    #[test]
    fn test_collect_status_malformed_index_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE_NAME), "<sitemapindex><sitemap>").unwrap();
        assert!(collect_status(dir.path()).is_err());
    }
}
