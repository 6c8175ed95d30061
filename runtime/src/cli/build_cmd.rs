//! `oni-sitemap build` - rebuild and publish the sitemap tree.

use crate::audit::logger::RunLogger;
use crate::catalog::SqliteCatalog;
use crate::cli::output::{self, Styled};
use crate::cli::progress;
use crate::config::{PublishStrategy, SitemapConfig};
use crate::sitemap::{Publisher, RunSummary};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, clap::Args)]
pub struct BuildArgs {
    /// Catalog database (SQLite).
    #[arg(long, default_value = "catalog.db")]
    pub db: PathBuf,

    /// Base URL every sitemap location is resolved against.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Production directory the finished tree is published to.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Staging directory (defaults to a sibling of --dir).
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// JSON config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Rename the old tree aside instead of deleting it before the swap.
    #[arg(long)]
    pub swap_aside: bool,

    /// Append a JSON line describing the run to this file.
    #[arg(long)]
    pub run_log: Option<PathBuf>,

    /// Record the run in the default ledger (~/.oni-sitemap/runs.jsonl).
    #[arg(long, conflicts_with = "run_log")]
    pub record: bool,
}

/// Layer config file, environment, and flags, in that order.
pub fn resolve_config(args: &BuildArgs) -> Result<SitemapConfig> {
    let mut config = match &args.config {
        Some(path) => SitemapConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SitemapConfig::default(),
    };
    config.apply_env()?;

    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(dir) = &args.dir {
        config = config.with_production_dir(dir);
    }
    if let Some(dir) = &args.staging_dir {
        config.staging_dir = dir.clone();
    }
    if args.swap_aside {
        config = config.with_publish_strategy(PublishStrategy::SwapAside);
    }
    if let Some(path) = &args.run_log {
        config = config.with_run_log(path);
    } else if args.record {
        config = config.with_run_log(RunLogger::default_path());
    }

    config.validate()?;
    Ok(config)
}

/// Run the build command.
pub async fn run(args: BuildArgs) -> Result<()> {
    let s = Styled::new();
    let config = resolve_config(&args)?;
    let show_progress = !output::is_quiet() && !output::is_json() && !output::is_verbose();

    if !output::is_quiet() && !output::is_json() {
        output::print_header(&s);
    }

    let mut publisher = Publisher::new(config.clone());
    let spinner = show_progress.then(|| progress::create_spinner("Writing sitemaps"));
    if let Some(bar) = &spinner {
        let bar = bar.clone();
        let total = AtomicUsize::new(0);
        publisher = publisher.on_flush(move |file| {
            let urls = total.fetch_add(file.url_count, Ordering::Relaxed) + file.url_count;
            progress::set_flushed(&bar, file.sequence, urls);
        });
    }

    let db = args.db.clone();
    let result = tokio::task::spawn_blocking(move || {
        let catalog = SqliteCatalog::open(&db)?;
        publisher.run(&catalog)
    })
    .await
    .context("sitemap build task failed")?;

    match result {
        Ok(summary) => {
            if let Some(bar) = &spinner {
                progress::set_done(bar, &format!("Wrote {} sitemap(s)", summary.files.len()));
            }
            print_summary(&s, &config, &summary);
            Ok(())
        }
        Err(e) => {
            if let Some(bar) = &spinner {
                progress::set_failed(bar, "Build aborted");
            }
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "status": "aborted",
                    "error": e.to_string(),
                    "staging_dir": config.staging_dir.display().to_string(),
                }));
            }
            Err(anyhow::Error::new(e).context(format!(
                "sitemap build aborted; {} left unchanged",
                config.production_dir.display()
            )))
        }
    }
}

fn print_summary(s: &Styled, config: &SitemapConfig, summary: &RunSummary) {
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "status": "success",
            "base_url": config.base_url.as_str(),
            "production_dir": config.production_dir.display().to_string(),
            "index": summary.index_path.display().to_string(),
            "url_count": summary.url_count,
            "sitemaps": summary.files.iter().map(|f| serde_json::json!({
                "sequence": f.sequence,
                "url": f.url,
                "url_count": f.url_count,
            })).collect::<Vec<_>>(),
            "custom_sitemap_kept": summary.custom_sitemap_kept,
            "duration_ms": summary.elapsed.as_millis(),
        }));
        return;
    }

    if output::is_quiet() {
        return;
    }

    eprintln!();
    output::print_check(
        s.ok_sym(),
        "Published:",
        &format!(
            "{} URLs in {} sitemap(s) ({})",
            summary.url_count,
            summary.files.len(),
            output::format_duration(summary.elapsed.as_secs())
        ),
    );
    output::print_check(s.ok_sym(), "Index:", &summary.index_path.display().to_string());
    if summary.custom_sitemap_kept {
        output::print_check(s.ok_sym(), "Custom:", &config.custom_sitemap);
    } else {
        output::print_check(
            s.warn_sym(),
            "Custom:",
            &format!("{} missing from {}", config.custom_sitemap, config.production_dir.display()),
        );
    }

    if output::is_verbose() {
        for file in &summary.files {
            eprintln!("      {}  {:>6} URLs", s.dim(&file.url), file.url_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn args(root: &std::path::Path) -> BuildArgs {
        BuildArgs {
            db: root.join("catalog.db"),
            base_url: Some("https://example.org/oni".to_string()),
            dir: Some(root.join("sitemaps")),
            staging_dir: None,
            config: None,
            swap_aside: false,
            run_log: None,
            record: false,
        }
    }

    #[test]
    fn test_resolve_config_from_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path());
        args.swap_aside = true;

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.base_url.as_str(), "https://example.org/oni/");
        assert_eq!(config.production_dir, dir.path().join("sitemaps"));
        assert_eq!(config.staging_dir, dir.path().join("sitemaps-tmp"));
        assert_eq!(config.publish_strategy, PublishStrategy::SwapAside);
    }

    #[test]
    fn test_resolve_config_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.json");
        std::fs::write(
            &path,
            r#"{"base_url": "https://from-file.example/", "max_urls": 1000}"#,
        )
        .unwrap();

        let mut args = args(dir.path());
        args.config = Some(path);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.base_url.as_str(), "https://example.org/oni/");
        assert_eq!(config.max_urls, 1000);
    }

    #[test]
    fn test_resolve_config_file_staging_follows_production() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.json");
        let production = dir.path().join("www/sitemaps");
        std::fs::write(
            &path,
            serde_json::json!({ "production_dir": production }).to_string(),
        )
        .unwrap();

        let mut args = args(dir.path());
        args.dir = None;
        args.config = Some(path);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.production_dir, production);
        assert_eq!(config.staging_dir, dir.path().join("www/sitemaps-tmp"));
    }

    #[tokio::test]
    async fn test_build_against_sqlite_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let args = args(dir.path());

        {
            let catalog = SqliteCatalog::create(&args.db).unwrap();
            let created = Utc.with_ymd_and_hms(2014, 3, 1, 0, 0, 0).unwrap();
            let batch = catalog.insert_batch("batch_a", created).unwrap();
            let title = catalog.insert_title("sn1", created).unwrap();
            let issue = catalog
                .insert_issue(batch, title, NaiveDate::from_ymd_opt(1899, 9, 9).unwrap(), 1)
                .unwrap();
            catalog.insert_page(issue, 1).unwrap();
        }

        std::env::set_var(output::ENV_QUIET, "1");
        run(args.clone()).await.unwrap();

        let index = std::fs::read_to_string(dir.path().join("sitemaps/sitemap.xml")).unwrap();
        assert!(index.contains("<loc>https://example.org/oni/sitemap-00001.xml</loc>"));
        let sitemap = std::fs::read_to_string(dir.path().join("sitemaps/sitemap-00001.xml")).unwrap();
        // Absolute catalog paths resolve against the host, as URL joining does.
        assert!(sitemap.contains("<loc>https://example.org/batches/batch_a/</loc>"));
        assert_eq!(sitemap.matches("<url>").count(), 8);
    }

    #[tokio::test]
    async fn test_build_missing_catalog_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var(output::ENV_QUIET, "1");
        assert!(run(args(dir.path())).await.is_err());
        assert!(!dir.path().join("sitemaps").exists());
    }
}
