//! Core data model shared by all three memory tiers.
//!
//! Sessions (episodic) flow into patterns (semantic) which flow into
//! rule artifacts (procedural). Everything here is plain serde data;
//! the stores own persistence and the pipeline stages own mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Thresholds;

/// Observation category, one per semantic store file and rule artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Preference,
    CodePattern,
    AntiPattern,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Preference,
        Category::CodePattern,
        Category::AntiPattern,
    ];

    /// Semantic store file name for this category.
    pub fn semantic_file(&self) -> &'static str {
        match self {
            Category::Preference => "preferences.json",
            Category::CodePattern => "code_patterns.json",
            Category::AntiPattern => "anti_patterns.json",
        }
    }

    /// Procedural rule artifact file name for this category.
    pub fn artifact_file(&self) -> &'static str {
        match self {
            Category::Preference => "user-preferences.md",
            Category::CodePattern => "code-patterns.md",
            Category::AntiPattern => "anti-patterns.md",
        }
    }

    /// Heading used when rendering the category's rule artifact.
    pub fn artifact_title(&self) -> &'static str {
        match self {
            Category::Preference => "User Preferences",
            Category::CodePattern => "Code Patterns",
            Category::AntiPattern => "Anti-Patterns",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Preference => write!(f, "preference"),
            Category::CodePattern => write!(f, "code_pattern"),
            Category::AntiPattern => write!(f, "anti_pattern"),
        }
    }
}

/// Pattern strength tier, a pure function of occurrence count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Emerging,
    Strong,
    Critical,
}

impl Strength {
    /// Classify an occurrence count against the configured thresholds.
    ///
    /// Tier boundaries are inclusive on the lower bound; counts below
    /// the emerging threshold are not yet a pattern and return `None`.
    pub fn classify(occurrences: u32, thresholds: &Thresholds) -> Option<Strength> {
        if occurrences >= thresholds.critical_pattern {
            Some(Strength::Critical)
        } else if occurrences >= thresholds.strong_pattern {
            Some(Strength::Strong)
        } else if occurrences >= thresholds.emerging_pattern {
            Some(Strength::Emerging)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::Emerging => write!(f, "emerging"),
            Strength::Strong => write!(f, "strong"),
            Strength::Critical => write!(f, "critical"),
        }
    }
}

/// A single raw interaction session, written once by the external
/// encoder and never mutated by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub trigger: String,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub code_patterns: Vec<String>,
    #[serde(default)]
    pub anti_patterns: Vec<String>,
}

impl SessionRecord {
    /// Observation texts for one category.
    pub fn texts(&self, category: Category) -> &[String] {
        match category {
            Category::Preference => &self.preferences,
            Category::CodePattern => &self.code_patterns,
            Category::AntiPattern => &self.anti_patterns,
        }
    }
}

/// A deduplicated, counted, strength-classified recurring observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_id: String,
    pub description: String,
    pub category: Category,
    pub strength: Strength,
    pub occurrences: u32,
    /// Distinct supporting session ids, sorted.
    pub evidence: Vec<String>,
    /// Timestamp of the earliest contributing session. Derived, not
    /// wall-clock, so re-extraction over unchanged data is identical.
    pub detected_at: DateTime<Utc>,
}

/// Derive a stable pattern id from the category and the canonical
/// description, so repeated extraction runs do not fork identity.
pub fn derive_pattern_id(category: Category, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(category.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(normalize_text(description).as_bytes());
    let digest = hasher.finalize();
    format!("pat-{}", &hex::encode(digest)[..12])
}

/// Canonical form used for identity and similarity: lowercased,
/// trimmed, inner whitespace collapsed.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
