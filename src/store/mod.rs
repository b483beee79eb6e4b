//! Persistent stores for the three memory tiers.
//!
//! A project directory holds one subdirectory per tier:
//!
//! ```text
//! <project>/
//! ├── engram.toml          # pipeline configuration
//! ├── episodic/            # YYYY-MM.json session files (external writer)
//! ├── semantic/            # per-category pattern files + patterns.json
//! └── procedural/          # markdown rule artifacts
//! ```
//!
//! Every artifact this crate persists goes through [`write_atomic`]:
//! write to a temp file in the target directory, fsync, then rename,
//! so a racing reader never sees a partial file.

pub mod episodic;
pub mod procedural;
pub mod semantic;

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Episodic tier subdirectory name.
pub const EPISODIC_DIR: &str = "episodic";

/// Semantic tier subdirectory name.
pub const SEMANTIC_DIR: &str = "semantic";

/// Procedural tier subdirectory name.
pub const PROCEDURAL_DIR: &str = "procedural";

/// Directory layout of one project's memory.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn episodic_dir(&self) -> PathBuf {
        self.root.join(EPISODIC_DIR)
    }

    pub fn semantic_dir(&self) -> PathBuf {
        self.root.join(SEMANTIC_DIR)
    }

    pub fn procedural_dir(&self) -> PathBuf {
        self.root.join(PROCEDURAL_DIR)
    }

    /// Create any missing tier directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.episodic_dir(),
            self.semantic_dir(),
            self.procedural_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    /// Tier directories that are missing, for validation reporting.
    pub fn missing_dirs(&self) -> Vec<String> {
        [
            self.episodic_dir(),
            self.semantic_dir(),
            self.procedural_dir(),
        ]
        .iter()
        .filter(|d| !d.is_dir())
        .map(|d| d.display().to_string())
        .collect()
    }
}

/// Atomically replace `path` with `contents` (temp file + fsync + rename).
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("No parent directory for {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name in {}", path.display()))?;
    let tmp_path = parent.join(format!(".{}.tmp", file_name));

    let mut tmp = std::fs::File::create(&tmp_path)
        .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    tmp.sync_all()
        .with_context(|| format!("Failed to sync {}", tmp_path.display()))?;
    drop(tmp);

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to rename {} into place", tmp_path.display()))?;
    Ok(())
}
