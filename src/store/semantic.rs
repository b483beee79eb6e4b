//! Semantic tier - categorized pattern files plus an aggregate index.
//!
//! One JSON file per category (`preferences.json`, `code_patterns.json`,
//! `anti_patterns.json`) and a combined `patterns.json` carrying the
//! total count. Extraction rewrites the whole tier every run, so file
//! contents are a pure function of the episodic history and thresholds.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use super::{write_atomic, ProjectLayout};
use crate::types::{Category, Pattern};

/// Aggregate index file name.
pub const INDEX_FILE: &str = "patterns.json";

/// On-disk shape of one per-category pattern file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFile {
    pub category: Category,
    pub count: usize,
    pub patterns: Vec<Pattern>,
}

/// On-disk shape of the aggregate index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexFile {
    pub count: usize,
    pub patterns: Vec<Pattern>,
}

/// Persistent semantic tier for one project.
pub struct SemanticStore {
    dir: PathBuf,
}

impl SemanticStore {
    pub fn new(layout: &ProjectLayout) -> Self {
        Self {
            dir: layout.semantic_dir(),
        }
    }

    /// Overwrite the whole tier: three category files plus the index.
    ///
    /// Patterns are grouped in fixed category order and kept in the
    /// order given (cluster discovery order), so identical input
    /// produces byte-identical files.
    pub fn save_all(&self, patterns: &[Pattern]) -> Result<()> {
        let mut total = 0usize;
        let mut indexed: Vec<Pattern> = Vec::with_capacity(patterns.len());

        for category in Category::ALL {
            let in_category: Vec<Pattern> = patterns
                .iter()
                .filter(|p| p.category == category)
                .cloned()
                .collect();
            total += in_category.len();

            let file = CategoryFile {
                category,
                count: in_category.len(),
                patterns: in_category.clone(),
            };
            let json = serde_json::to_string_pretty(&file)
                .context("Failed to serialize category file")?;
            write_atomic(&self.dir.join(category.semantic_file()), &(json + "\n"))?;
            indexed.extend(in_category);
        }

        let index = IndexFile {
            count: total,
            patterns: indexed,
        };
        let json =
            serde_json::to_string_pretty(&index).context("Failed to serialize pattern index")?;
        write_atomic(&self.dir.join(INDEX_FILE), &(json + "\n"))?;

        debug!("Saved {} patterns to {}", total, self.dir.display());
        Ok(())
    }

    /// Load one category file; `Ok(None)` when it does not exist.
    pub fn load_category(&self, category: Category) -> Result<Option<CategoryFile>> {
        let path = self.dir.join(category.semantic_file());
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: CategoryFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(file))
    }

    /// Load every persisted pattern; empty when the tier is missing.
    pub fn load_all(&self) -> Result<Vec<Pattern>> {
        let mut patterns = Vec::new();
        for category in Category::ALL {
            if let Some(file) = self.load_category(category)? {
                patterns.extend(file.patterns);
            }
        }
        Ok(patterns)
    }

    /// Load the aggregate index; `Ok(None)` when it does not exist.
    pub fn load_index(&self) -> Result<Option<IndexFile>> {
        let path = self.dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let index: IndexFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(index))
    }

    /// Delete the whole semantic tier. Returns whether anything existed.
    pub fn delete(&self) -> Result<bool> {
        if !self.dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&self.dir)
            .with_context(|| format!("Failed to delete {}", self.dir.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{derive_pattern_id, Strength};
    use chrono::{TimeZone, Utc};

    fn pattern(category: Category, description: &str, occurrences: u32) -> Pattern {
        Pattern {
            pattern_id: derive_pattern_id(category, description),
            description: description.to_string(),
            category,
            strength: Strength::Strong,
            occurrences,
            evidence: (0..occurrences).map(|i| format!("s{}", i)).collect(),
            detected_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let store = SemanticStore::new(&layout);

        let patterns = vec![
            pattern(Category::Preference, "Use JWT for authentication", 3),
            pattern(Category::AntiPattern, "Avoid unwrap in handlers", 4),
        ];
        store.save_all(&patterns).unwrap();

        let prefs = store.load_category(Category::Preference).unwrap().unwrap();
        assert_eq!(prefs.count, 1);
        assert_eq!(prefs.patterns[0].description, "Use JWT for authentication");

        // Empty category still gets a file with count 0
        let code = store.load_category(Category::CodePattern).unwrap().unwrap();
        assert_eq!(code.count, 0);

        let index = store.load_index().unwrap().unwrap();
        assert_eq!(index.count, 2);
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn test_save_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let store = SemanticStore::new(&layout);

        let patterns = vec![
            pattern(Category::Preference, "Use JWT for authentication", 3),
            pattern(Category::CodePattern, "Builder pattern for configs", 2),
        ];

        store.save_all(&patterns).unwrap();
        let first = std::fs::read_to_string(layout.semantic_dir().join(INDEX_FILE)).unwrap();

        store.save_all(&patterns).unwrap();
        let second = std::fs::read_to_string(layout.semantic_dir().join(INDEX_FILE)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_tier_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path().join("nope"));
        let store = SemanticStore::new(&layout);

        assert!(store.load_all().unwrap().is_empty());
        assert!(store.load_index().unwrap().is_none());
        assert!(!store.delete().unwrap());
    }

    #[test]
    fn test_delete_removes_tier() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        let store = SemanticStore::new(&layout);

        store
            .save_all(&[pattern(Category::Preference, "x y z", 2)])
            .unwrap();
        assert!(store.delete().unwrap());
        assert!(store.load_all().unwrap().is_empty());
    }
}
