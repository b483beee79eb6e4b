//! Rule Synthesizer - the procedural tier builder.
//!
//! Filters semantic patterns at or above the rule-worthy strength
//! floor and renders one markdown artifact per qualifying category.
//! Synthesis is two-phase: `plan` computes the candidate rule set
//! without touching disk, `apply` writes it. `synthesize` glues the
//! two together behind the auto-approve flag so the host can show a
//! dry preview and confirm.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::store::procedural::{ArtifactFrontmatter, ProceduralStore};
use crate::store::semantic::SemanticStore;
use crate::store::ProjectLayout;
use crate::types::{Category, Pattern};

/// One candidate rule artifact, fully rendered but unwritten.
#[derive(Debug, Clone)]
pub struct PlannedArtifact {
    pub category: Category,
    pub path: PathBuf,
    pub pattern_ids: Vec<String>,
    pub body: String,
}

/// The full candidate rule set for one synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisPlan {
    pub generated_at: DateTime<Utc>,
    pub artifacts: Vec<PlannedArtifact>,
    /// Categories whose on-disk artifact has no qualifying patterns
    /// anymore and will be removed on apply.
    pub stale: Vec<Category>,
}

impl SynthesisPlan {
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty() && self.stale.is_empty()
    }
}

/// Result of one synthesis run.
#[derive(Debug)]
pub enum SynthesisOutcome {
    /// Nothing qualifies and nothing is stale; zero patterns found is
    /// a report, not an error.
    NoPatterns,
    /// Candidate rule set computed but not written (dry preview).
    Preview(SynthesisPlan),
    /// Artifacts written (and stale ones removed).
    Written { files: Vec<PathBuf> },
}

/// Compute the candidate rule set without writing anything.
pub fn plan(layout: &ProjectLayout, config: &PipelineConfig) -> Result<SynthesisPlan> {
    let patterns = SemanticStore::new(layout).load_all()?;
    let procedural = ProceduralStore::new(layout);
    let generated_at = Utc::now();

    let mut artifacts = Vec::new();
    let mut qualifying_categories = Vec::new();

    for category in Category::ALL {
        let mut qualifying: Vec<&Pattern> = patterns
            .iter()
            .filter(|p| p.category == category && p.strength >= config.rule_floor)
            .collect();
        if qualifying.is_empty() {
            continue;
        }
        qualifying_categories.push(category);

        // Most recurrent first; ties go to the most recently detected.
        qualifying.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| b.detected_at.cmp(&a.detected_at))
        });

        artifacts.push(PlannedArtifact {
            category,
            path: procedural.artifact_path(category),
            pattern_ids: qualifying.iter().map(|p| p.pattern_id.clone()).collect(),
            body: render_body(category, &qualifying),
        });
    }

    // Wholesale regeneration: artifacts for no-longer-qualifying
    // categories come off disk.
    let stale: Vec<Category> = procedural
        .existing_categories()
        .into_iter()
        .filter(|c| !qualifying_categories.contains(c))
        .collect();

    debug!(
        "Planned {} artifacts, {} stale removals (floor: {})",
        artifacts.len(),
        stale.len(),
        config.rule_floor
    );
    Ok(SynthesisPlan {
        generated_at,
        artifacts,
        stale,
    })
}

/// Write a previously computed plan: every artifact atomically, then
/// stale removals.
pub fn apply(layout: &ProjectLayout, plan: &SynthesisPlan) -> Result<Vec<PathBuf>> {
    let procedural = ProceduralStore::new(layout);
    let mut files = Vec::with_capacity(plan.artifacts.len());

    for artifact in &plan.artifacts {
        let frontmatter = ArtifactFrontmatter {
            category: artifact.category,
            generated_at: plan.generated_at,
            source_patterns: artifact.pattern_ids.clone(),
        };
        files.push(procedural.write_artifact(&frontmatter, &artifact.body)?);
    }

    for category in &plan.stale {
        if procedural.remove_artifact(*category)? {
            info!("Removed stale rule artifact for {}", category);
        }
    }

    info!("Wrote {} rule artifacts", files.len());
    Ok(files)
}

/// Run synthesis end to end. Without `auto_approve` the computed plan
/// is returned as a preview and nothing is written.
pub fn synthesize(
    layout: &ProjectLayout,
    config: &PipelineConfig,
    auto_approve: bool,
) -> Result<SynthesisOutcome> {
    let deadline = Instant::now() + Duration::from_secs(config.synthesize_timeout_secs);

    let plan = plan(layout, config)?;
    if plan.is_empty() {
        info!("Synthesis found no rule-worthy patterns");
        return Ok(SynthesisOutcome::NoPatterns);
    }

    if !auto_approve {
        return Ok(SynthesisOutcome::Preview(plan));
    }

    // Abort before the first write; partially written rule sets are
    // worse than stale ones.
    if Instant::now() >= deadline {
        bail!(
            "synthesis timeout ({}s) exceeded before writing; existing artifacts left untouched",
            config.synthesize_timeout_secs
        );
    }

    let files = apply(layout, &plan)?;
    Ok(SynthesisOutcome::Written { files })
}

fn render_body(category: Category, patterns: &[&Pattern]) -> String {
    let mut body = format!("# {}\n\n", category.artifact_title());
    for pattern in patterns {
        let sessions = if pattern.occurrences == 1 {
            "1 session".to_string()
        } else {
            format!("{} sessions", pattern.occurrences)
        };
        body.push_str(&format!(
            "- {} _(observed in {}, {})_\n",
            pattern.description, sessions, pattern.strength
        ));
    }
    body
}
