//! Pattern Extractor - the semantic tier builder.
//!
//! Reads the full episodic history, clusters near-duplicate
//! observations per category, counts distinct supporting sessions, and
//! classifies each surviving cluster into a strength tier. Every run
//! recomputes from scratch and overwrites the semantic tier, so
//! extraction is idempotent over unchanged episodic data.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::similarity::{ExactMatch, NormalizedLevenshtein, Similarity};
use crate::store::episodic::EpisodicStore;
use crate::store::semantic::SemanticStore;
use crate::store::ProjectLayout;
use crate::types::{derive_pattern_id, Category, Pattern, SessionRecord, Strength};

/// Result of one extraction run. Insufficiency is an explicit outcome,
/// not an error: the host carries on either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Extracted {
        patterns: usize,
        sessions: usize,
        /// True when the timeout forced frequency-only detection.
        degraded: bool,
    },
    InsufficientSessions {
        found: usize,
        required: usize,
    },
}

impl std::fmt::Display for ExtractOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractOutcome::Extracted {
                patterns,
                sessions,
                degraded,
            } => {
                write!(f, "extracted {} patterns from {} sessions", patterns, sessions)?;
                if *degraded {
                    write!(f, " (degraded to frequency-only detection)")?;
                }
                Ok(())
            }
            ExtractOutcome::InsufficientSessions { found, required } => {
                write!(f, "insufficient sessions ({}/{})", found, required)
            }
        }
    }
}

/// Run extraction for one project: episodic in, semantic out.
///
/// Refuses with [`ExtractOutcome::InsufficientSessions`] (no analysis,
/// no write) when the episodic history holds fewer distinct sessions
/// than `thresholds.min_sessions`.
pub fn extract(layout: &ProjectLayout, config: &PipelineConfig) -> Result<ExtractOutcome> {
    let sessions = EpisodicStore::new(layout).load_sessions()?;

    let required = config.thresholds.min_sessions as usize;
    if sessions.len() < required {
        info!(
            "Extraction refused: {} of {} required sessions",
            sessions.len(),
            required
        );
        return Ok(ExtractOutcome::InsufficientSessions {
            found: sessions.len(),
            required,
        });
    }

    let deadline = Instant::now() + Duration::from_secs(config.extract_timeout_secs);
    let (patterns, degraded) = detect_patterns(&sessions, config, deadline);

    SemanticStore::new(layout).save_all(&patterns)?;

    let outcome = ExtractOutcome::Extracted {
        patterns: patterns.len(),
        sessions: sessions.len(),
        degraded,
    };
    info!("{}", outcome);
    Ok(outcome)
}

/// One representative-based cluster of equivalent observations.
struct Cluster {
    /// Canonical description: the first text that founded the cluster.
    description: String,
    /// Distinct contributing session ids.
    evidence: BTreeSet<String>,
    /// Timestamp of the founding (earliest) session.
    first_seen: DateTime<Utc>,
}

/// Cluster and classify observations across all categories.
///
/// Sessions must be sorted chronologically; cluster discovery order is
/// therefore deterministic, which keeps descriptions and pattern ids
/// stable across runs. Once `deadline` passes, the remaining texts are
/// matched exactly instead of fuzzily (frequency-only detection) and
/// the degraded flag is set.
fn detect_patterns(
    sessions: &[SessionRecord],
    config: &PipelineConfig,
    deadline: Instant,
) -> (Vec<Pattern>, bool) {
    let fuzzy = NormalizedLevenshtein::new(config.dedup_threshold);
    let exact = ExactMatch;
    let mut degraded = false;

    let mut patterns = Vec::new();
    for category in Category::ALL {
        let mut clusters: Vec<Cluster> = Vec::new();

        for session in sessions {
            for text in session.texts(category) {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }

                if !degraded && Instant::now() >= deadline {
                    degraded = true;
                    warn!(
                        "Extraction timeout ({}s) exceeded; degrading to frequency-only detection",
                        config.extract_timeout_secs
                    );
                }
                let strategy: &dyn Similarity = if degraded { &exact } else { &fuzzy };

                // First matching representative wins, in discovery order.
                match clusters
                    .iter_mut()
                    .find(|c| strategy.similar(&c.description, text))
                {
                    Some(cluster) => {
                        cluster.evidence.insert(session.session_id.clone());
                    }
                    None => {
                        clusters.push(Cluster {
                            description: text.to_string(),
                            evidence: BTreeSet::from([session.session_id.clone()]),
                            first_seen: session.timestamp,
                        });
                    }
                }
            }
        }

        for cluster in clusters {
            let occurrences = cluster.evidence.len() as u32;
            // Below the emerging threshold it is not yet a pattern.
            let Some(strength) = Strength::classify(occurrences, &config.thresholds) else {
                debug!(
                    "Dropping sub-emerging {} cluster '{}' ({} sessions)",
                    category, cluster.description, occurrences
                );
                continue;
            };
            patterns.push(Pattern {
                pattern_id: derive_pattern_id(category, &cluster.description),
                description: cluster.description,
                category,
                strength,
                occurrences,
                evidence: cluster.evidence.into_iter().collect(),
                detected_at: cluster.first_seen,
            });
        }
    }

    (patterns, degraded)
}
