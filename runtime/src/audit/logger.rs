//! JSONL run ledger - one line appended per sitemap run.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Outcome of a single run as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub timestamp: String,
    /// `"success"` or `"aborted"`.
    pub status: String,
    pub url_count: usize,
    pub sitemap_count: usize,
    pub duration_ms: u64,
    pub production_dir: String,
    pub error: Option<String>,
}

impl RunEvent {
    pub fn success(production_dir: &Path, url_count: usize, sitemap_count: usize, duration_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            status: "success".to_string(),
            url_count,
            sitemap_count,
            duration_ms,
            production_dir: production_dir.display().to_string(),
            error: None,
        }
    }

    pub fn aborted(production_dir: &Path, error: &str, duration_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            status: "aborted".to_string(),
            url_count: 0,
            sitemap_count: 0,
            duration_ms,
            production_dir: production_dir.display().to_string(),
            error: Some(error.to_string()),
        }
    }
}

/// Append-only JSONL run logger.
pub struct RunLogger {
    file: File,
}

impl RunLogger {
    /// Open or create the ledger file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open run log: {}", path.display()))?;

        Ok(Self { file })
    }

    /// Default ledger location, ~/.oni-sitemap/runs.jsonl.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".oni-sitemap")
            .join("runs.jsonl")
    }

    pub fn log(&mut self, event: &RunEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.file, "{json}")?;
        Ok(())
    }
}

/// Read back every event in a ledger, oldest first. Unparseable lines are skipped.
pub fn read_events(path: &Path) -> Result<Vec<RunEvent>> {
    let file = File::open(path).with_context(|| format!("failed to read run log: {}", path.display()))?;
    let events = BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect();
    Ok(events)
}
