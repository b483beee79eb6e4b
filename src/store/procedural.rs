//! Procedural tier - generated rule artifacts.
//!
//! One markdown file per category with YAML frontmatter between ---
//! delimiters, consumed by the host runtime as behavior-modifying
//! instructions:
//!
//! ```markdown
//! ---
//! category: preference
//! generated_at: 2026-08-29T12:00:00Z
//! source_patterns: [pat-a1b2c3d4e5f6]
//! ---
//! # User Preferences
//! ...
//! ```

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use super::{write_atomic, ProjectLayout};
use crate::types::Category;

/// Rule artifact frontmatter (YAML between --- delimiters)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFrontmatter {
    pub category: Category,
    pub generated_at: DateTime<Utc>,
    /// Pattern ids rendered into this artifact, for traceability.
    #[serde(default)]
    pub source_patterns: Vec<String>,
}

/// A parsed rule artifact
#[derive(Debug, Clone)]
pub struct RuleArtifact {
    pub frontmatter: ArtifactFrontmatter,
    pub body: String,
    pub file_path: PathBuf,
}

/// Persistent procedural tier for one project.
pub struct ProceduralStore {
    dir: PathBuf,
}

impl ProceduralStore {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            dir: layout.procedural_dir(),
        }
    }

    pub fn artifact_path(&self, category: Category) -> PathBuf {
        self.dir.join(category.artifact_file())
    }

    /// Render and atomically write one category's artifact.
    pub fn write_artifact(
        &self,
        frontmatter: &ArtifactFrontmatter,
        body: &str,
    ) -> Result<PathBuf> {
        let yaml = serde_yaml::to_string(frontmatter)
            .context("Failed to serialize artifact frontmatter")?;
        let content = format!("---\n{}---\n\n{}", yaml, body.trim_end());
        let path = self.artifact_path(frontmatter.category);
        write_atomic(&path, &(content + "\n"))?;
        debug!("Wrote rule artifact {}", path.display());
        Ok(path)
    }

    /// Parse one category's artifact; `Ok(None)` when it does not exist.
    pub fn load_artifact(&self, category: Category) -> Result<Option<RuleArtifact>> {
        let path = self.artifact_path(category);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(parse_artifact(&content, path)?))
    }

    /// Remove one category's artifact. Returns whether it existed.
    pub fn remove_artifact(&self, category: Category) -> Result<bool> {
        let path = self.artifact_path(category);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        Ok(true)
    }

    /// Categories that currently have an artifact on disk.
    pub fn existing_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.artifact_path(*c).exists())
            .collect()
    }
}

/// Parse artifact content into frontmatter + body.
fn parse_artifact(content: &str, file_path: PathBuf) -> Result<RuleArtifact> {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        bail!(
            "{}: rule artifact must start with '---' frontmatter delimiter",
            file_path.display()
        );
    }

    let after_first = &trimmed[3..];
    let second_delim = after_first.find("\n---").with_context(|| {
        format!(
            "{}: missing closing '---' frontmatter delimiter",
            file_path.display()
        )
    })?;

    let yaml_str = after_first[..second_delim].trim();
    let body = after_first[second_delim + 4..].trim().to_string();

    let frontmatter: ArtifactFrontmatter = serde_yaml::from_str(yaml_str)
        .with_context(|| format!("{}: failed to parse frontmatter YAML", file_path.display()))?;

    Ok(RuleArtifact {
        frontmatter,
        body,
        file_path,
    })
}
