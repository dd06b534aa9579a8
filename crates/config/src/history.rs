//! Retained stock check reports.
//!
//! One JSON file per finalized session under `<config dir>/history/`. The
//! file is the full report plus the scope it was taken for; listings only
//! read a small probe of each file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockcheck_recon::{FinalizeReport, SessionOutcome};

const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Serialize)]
struct StoredReport<'a> {
    scope: &'a str,
    #[serde(flatten)]
    report: &'a FinalizeReport,
}

/// Fields needed for a listing; everything else in the file is ignored.
#[derive(Deserialize)]
struct Probe {
    #[serde(default)]
    scope: String,
    outcome: SessionOutcome,
    finalized_at: DateTime<Utc>,
    #[serde(default)]
    expected_total: usize,
    #[serde(default)]
    scanned: usize,
    #[serde(default)]
    unknown_scans: usize,
    #[serde(default)]
    missing: Vec<serde::de::IgnoredAny>,
}

/// One retained report, as shown by `stockcheck history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub path: PathBuf,
    pub scope: String,
    pub outcome: SessionOutcome,
    pub finalized_at: DateTime<Utc>,
    pub expected_total: usize,
    pub scanned: usize,
    pub unknown_scans: usize,
    pub missing: usize,
}

#[derive(Debug, Clone)]
pub struct History {
    dir: PathBuf,
}

impl History {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/history`
    pub fn open_default() -> Option<Self> {
        crate::config_dir().map(|c| Self::new(c.join("history")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a finalized report. Returns the file written.
    pub fn record(&self, scope: &str, report: &FinalizeReport) -> Result<PathBuf, String> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| format!("Failed to create history directory: {}", e))?;

        let stem = format!(
            "{}-{}",
            report.finalized_at.format("%Y%m%dT%H%M%S%3fZ"),
            file_safe(scope)
        );
        let json = serde_json::to_string_pretty(&StoredReport { scope, report })
            .map_err(|e| format!("Failed to serialize report: {}", e))?;

        // Never overwrite: a second report in the same millisecond gets `-1`, `-2`, ...
        let mut attempt = 0u32;
        let (path, mut file) = loop {
            let name = match attempt {
                0 => format!("{}.json", stem),
                n => format!("{}-{}.json", stem, n),
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(format!("Failed to create {}: {}", path.display(), e)),
            }
        };
        file.write_all(json.as_bytes())
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

        log::info!("report saved to {}", path.display());
        Ok(path)
    }

    /// All readable reports, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Vec<HistoryEntry> {
        let mut result = Vec::new();

        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let probe = fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|s| serde_json::from_str::<Probe>(&s).map_err(|e| e.to_string()));
                match probe {
                    Ok(p) => result.push(HistoryEntry {
                        path,
                        scope: p.scope,
                        outcome: p.outcome,
                        finalized_at: p.finalized_at,
                        expected_total: p.expected_total,
                        scanned: p.scanned,
                        unknown_scans: p.unknown_scans,
                        missing: p.missing.len(),
                    }),
                    Err(e) => log::warn!("skipping {}: {}", path.display(), e),
                }
            }
        }

        result.sort_by(|a, b| b.finalized_at.cmp(&a.finalized_at));
        result
    }

    /// Full stored report as JSON.
    pub fn load_raw(&self, path: &Path) -> Result<serde_json::Value, String> {
        let contents = fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&contents).map_err(|e| e.to_string())
    }
}

fn file_safe(scope: &str) -> String {
    let cleaned: String = scope
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "scope".to_string() } else { cleaned }
}
