//! Recovery / Validator - structural integrity across the three tiers.
//!
//! `validate` walks the project layout and reports everything wrong as
//! plain strings; it never repairs anything in place. A corrupted
//! semantic tier is recovered with `rebuild_semantic`, which throws the
//! tier away and replays the full episodic history through the
//! extractor. Episodic data is read-only to both operations.

use anyhow::Result;
use std::collections::HashSet;
use tracing::info;

use crate::config::PipelineConfig;
use crate::extractor::{self, ExtractOutcome};
use crate::store::episodic::EpisodicStore;
use crate::store::procedural::ProceduralStore;
use crate::store::semantic::SemanticStore;
use crate::store::ProjectLayout;
use crate::types::{derive_pattern_id, Category, Strength};

/// Outcome of a validation pass.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
        }
    }
}

/// Check structural integrity of all three tiers.
pub fn validate(layout: &ProjectLayout, config: &PipelineConfig) -> Result<ValidationReport> {
    let mut errors = Vec::new();

    for dir in layout.missing_dirs() {
        errors.push(format!("missing directory: {}", dir));
    }

    let episodic_ids = EpisodicStore::new(layout).session_ids()?;
    let semantic = SemanticStore::new(layout);
    let mut known_pattern_ids: HashSet<String> = HashSet::new();
    let mut semantic_total = 0usize;

    for category in Category::ALL {
        let file = match semantic.load_category(category) {
            Ok(Some(file)) => file,
            Ok(None) => continue,
            Err(e) => {
                errors.push(format!("{}: {:#}", category.semantic_file(), e));
                continue;
            }
        };

        if file.category != category {
            errors.push(format!(
                "{}: declares category '{}' instead of '{}'",
                category.semantic_file(),
                file.category,
                category
            ));
        }
        if file.count != file.patterns.len() {
            errors.push(format!(
                "{}: count field is {} but holds {} patterns",
                category.semantic_file(),
                file.count,
                file.patterns.len()
            ));
        }
        semantic_total += file.patterns.len();

        for pattern in &file.patterns {
            validate_pattern(pattern, category, config, &episodic_ids, &mut errors);
            known_pattern_ids.insert(pattern.pattern_id.clone());
        }
    }

    match semantic.load_index() {
        Ok(Some(index)) => {
            if index.count != index.patterns.len() {
                errors.push(format!(
                    "patterns.json: count field is {} but holds {} patterns",
                    index.count,
                    index.patterns.len()
                ));
            }
            if index.patterns.len() != semantic_total {
                errors.push(format!(
                    "patterns.json: holds {} patterns but category files hold {}",
                    index.patterns.len(),
                    semantic_total
                ));
            }
        }
        Ok(None) => {
            if semantic_total > 0 {
                errors.push("patterns.json: missing while category files exist".to_string());
            }
        }
        Err(e) => errors.push(format!("patterns.json: {:#}", e)),
    }

    let procedural = ProceduralStore::new(layout);
    for category in procedural.existing_categories() {
        match procedural.load_artifact(category) {
            Ok(Some(artifact)) => {
                if artifact.frontmatter.category != category {
                    errors.push(format!(
                        "{}: declares category '{}' instead of '{}'",
                        category.artifact_file(),
                        artifact.frontmatter.category,
                        category
                    ));
                }
                for id in &artifact.frontmatter.source_patterns {
                    if !known_pattern_ids.contains(id) {
                        errors.push(format!(
                            "{}: source pattern '{}' not in semantic tier",
                            category.artifact_file(),
                            id
                        ));
                    }
                }
            }
            Ok(None) => {}
            Err(e) => errors.push(format!("{}: {:#}", category.artifact_file(), e)),
        }
    }

    let report = ValidationReport::from_errors(errors);
    info!(
        "Validation {}: {} errors",
        if report.ok { "passed" } else { "failed" },
        report.errors.len()
    );
    Ok(report)
}

fn validate_pattern(
    pattern: &crate::types::Pattern,
    category: Category,
    config: &PipelineConfig,
    episodic_ids: &HashSet<String>,
    errors: &mut Vec<String>,
) {
    let label = &pattern.pattern_id;

    if pattern.category != category {
        errors.push(format!(
            "{}: category '{}' filed under '{}'",
            label, pattern.category, category
        ));
    }

    let expected_id = derive_pattern_id(category, &pattern.description);
    if pattern.pattern_id != expected_id {
        errors.push(format!(
            "{}: pattern id does not match its description (expected {})",
            label, expected_id
        ));
    }

    let distinct: HashSet<&String> = pattern.evidence.iter().collect();
    if distinct.len() != pattern.evidence.len() {
        errors.push(format!("{}: duplicate session ids in evidence", label));
    }
    if pattern.occurrences as usize != distinct.len() {
        errors.push(format!(
            "{}: occurrences is {} but evidence holds {} distinct sessions",
            label,
            pattern.occurrences,
            distinct.len()
        ));
    }
    for session_id in &pattern.evidence {
        if !episodic_ids.contains(session_id) {
            errors.push(format!(
                "{}: evidence references unknown session '{}'",
                label, session_id
            ));
        }
    }

    match Strength::classify(pattern.occurrences, &config.thresholds) {
        Some(expected) if expected == pattern.strength => {}
        Some(expected) => errors.push(format!(
            "{}: strength '{}' inconsistent with {} occurrences (expected '{}')",
            label, pattern.strength, pattern.occurrences, expected
        )),
        None => errors.push(format!(
            "{}: {} occurrences is below the emerging threshold",
            label, pattern.occurrences
        )),
    }
}

/// Throw the semantic tier away and re-derive it from episodic history.
///
/// The same minimum-session floor as extraction applies: rebuild
/// cannot conjure patterns out of too little history. Episodic and
/// procedural data are never touched.
pub fn rebuild_semantic(
    layout: &ProjectLayout,
    config: &PipelineConfig,
) -> Result<ExtractOutcome> {
    if SemanticStore::new(layout).delete()? {
        info!("Deleted semantic tier for rebuild");
    }
    extractor::extract(layout, config)
}
