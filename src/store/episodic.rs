//! Episodic tier - read side of the monthly session files.
//!
//! Sessions are written by an external encoder as `YYYY-MM.json` files,
//! each holding a `sessions` array. This crate only ever reads them;
//! malformed files are skipped with a warning so one bad month never
//! sinks a whole extraction run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::ProjectLayout;
use crate::types::SessionRecord;

/// On-disk shape of one monthly episodic file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodicFile {
    pub sessions: Vec<SessionRecord>,
}

/// Read-only view over a project's episodic tier.
pub struct EpisodicStore {
    dir: PathBuf,
}

impl EpisodicStore {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            dir: layout.episodic_dir(),
        }
    }

    /// List monthly file stems (`YYYY-MM`), oldest first.
    pub fn list_months(&self) -> Result<Vec<String>> {
        let mut months = Vec::new();
        if !self.dir.exists() {
            return Ok(months);
        }

        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(stem) = name_str.strip_suffix(".json") {
                if is_month_stem(stem) {
                    months.push(stem.to_string());
                }
            }
        }

        months.sort();
        Ok(months)
    }

    /// Load every session across all monthly files.
    ///
    /// Duplicate session ids (a hook firing twice re-encodes the same
    /// session) collapse to the first occurrence. The result is sorted
    /// by (timestamp, session_id) so downstream clustering is
    /// deterministic.
    pub fn load_sessions(&self) -> Result<Vec<SessionRecord>> {
        let mut sessions: Vec<SessionRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for month in self.list_months()? {
            let path = self.dir.join(format!("{}.json", month));
            let contents = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Skipping unreadable episodic file {}: {}", path.display(), e);
                    continue;
                }
            };
            let file: EpisodicFile = match serde_json::from_str(&contents) {
                Ok(f) => f,
                Err(e) => {
                    warn!("Skipping malformed episodic file {}: {}", path.display(), e);
                    continue;
                }
            };
            debug!("Loaded {} sessions from {}", file.sessions.len(), path.display());

            for session in file.sessions {
                if seen.insert(session.session_id.clone()) {
                    sessions.push(session);
                }
            }
        }

        sessions.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }

    /// All known session ids, for evidence validation.
    pub fn session_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .load_sessions()?
            .into_iter()
            .map(|s| s.session_id)
            .collect())
    }
}

/// True for `YYYY-MM` shaped file stems.
fn is_month_stem(stem: &str) -> bool {
    let bytes = stem.as_bytes();
    bytes.len() == 7
        && bytes[..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[5..].iter().all(|b| b.is_ascii_digit())
}
