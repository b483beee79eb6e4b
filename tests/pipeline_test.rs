//! End-to-end pipeline scenarios: episodic fixtures in a tempdir,
//! extraction, synthesis, validation, and rebuild through the public
//! surface.

use chrono::{TimeZone, Utc};
use engram::config::PipelineConfig;
use engram::store::episodic::EpisodicFile;
use engram::store::semantic::SemanticStore;
use engram::{
    extract, rebuild_semantic, synthesize, validate, Category, ExtractOutcome, ProjectLayout,
    SessionRecord, Strength, SynthesisOutcome,
};

fn session(id: &str, ts: i64, prefs: &[&str], antis: &[&str]) -> SessionRecord {
    SessionRecord {
        session_id: id.to_string(),
        timestamp: Utc.timestamp_opt(ts, 0).unwrap(),
        trigger: "session_end".to_string(),
        preferences: prefs.iter().map(|s| s.to_string()).collect(),
        code_patterns: vec![],
        anti_patterns: antis.iter().map(|s| s.to_string()).collect(),
    }
}

fn write_month(layout: &ProjectLayout, month: &str, sessions: Vec<SessionRecord>) {
    layout.ensure_dirs().unwrap();
    let file = EpisodicFile { sessions };
    std::fs::write(
        layout.episodic_dir().join(format!("{}.json", month)),
        serde_json::to_string_pretty(&file).unwrap(),
    )
    .unwrap();
}

#[test]
fn jwt_preference_becomes_a_rule() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let config = PipelineConfig::default();

    write_month(
        &layout,
        "2026-08",
        vec![
            session("s1", 100, &["Use JWT for authentication"], &[]),
            session("s2", 200, &["use jwt for authentication"], &["avoid println debugging"]),
            session("s3", 300, &["Use JWT for authentication."], &[]),
        ],
    );

    let outcome = extract(&layout, &config).unwrap();
    assert_eq!(
        outcome,
        ExtractOutcome::Extracted {
            patterns: 1,
            sessions: 3,
            degraded: false
        }
    );

    let patterns = SemanticStore::new(&layout).load_all().unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].category, Category::Preference);
    assert_eq!(patterns[0].occurrences, 3);
    assert_eq!(patterns[0].strength, Strength::Strong);

    let outcome = synthesize(&layout, &config, true).unwrap();
    let SynthesisOutcome::Written { files } = outcome else {
        panic!("expected written artifacts");
    };
    assert_eq!(files.len(), 1);

    let prefs_path = layout.procedural_dir().join("user-preferences.md");
    let content = std::fs::read_to_string(&prefs_path).unwrap();
    assert!(content.contains("Use JWT for authentication"));
    assert!(content.contains("category: preference"));
    assert!(content.contains(&patterns[0].pattern_id));

    // The single anti-pattern observation never reached the floor.
    assert!(!layout.procedural_dir().join("anti-patterns.md").exists());
}

#[test]
fn two_sessions_is_insufficient() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let config = PipelineConfig::default();

    write_month(
        &layout,
        "2026-08",
        vec![
            session("s1", 100, &["Use JWT for authentication"], &[]),
            session("s2", 200, &["Use JWT for authentication"], &[]),
        ],
    );

    let outcome = extract(&layout, &config).unwrap();
    assert_eq!(outcome.to_string(), "insufficient sessions (2/3)");
    assert!(!layout.semantic_dir().join("patterns.json").exists());
}

#[test]
fn preview_then_approve() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let config = PipelineConfig::default();

    write_month(
        &layout,
        "2026-08",
        vec![
            session("s1", 100, &[], &["never commit secrets"]),
            session("s2", 200, &[], &["never commit secrets"]),
            session("s3", 300, &[], &["never commit secrets"]),
        ],
    );
    extract(&layout, &config).unwrap();

    // Dry preview: same plan, nothing on disk.
    let outcome = synthesize(&layout, &config, false).unwrap();
    let SynthesisOutcome::Preview(plan) = outcome else {
        panic!("expected preview");
    };
    assert_eq!(plan.artifacts.len(), 1);
    assert_eq!(plan.artifacts[0].category, Category::AntiPattern);
    assert!(!layout.procedural_dir().join("anti-patterns.md").exists());

    let outcome = synthesize(&layout, &config, true).unwrap();
    assert!(matches!(outcome, SynthesisOutcome::Written { .. }));
    assert!(layout.procedural_dir().join("anti-patterns.md").exists());
}

#[test]
fn rebuild_matches_original_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let config = PipelineConfig::default();

    write_month(
        &layout,
        "2026-07",
        vec![
            session("s1", 100, &["Use JWT for authentication"], &[]),
            session("s2", 200, &["prefer explicit error types"], &[]),
        ],
    );
    write_month(
        &layout,
        "2026-08",
        vec![
            session("s3", 300, &["Use JWT for authentication"], &[]),
            session("s4", 400, &["prefer explicit error types"], &[]),
            session("s5", 500, &["Use JWT for authentication"], &[]),
        ],
    );

    extract(&layout, &config).unwrap();
    let original = SemanticStore::new(&layout).load_all().unwrap();
    assert_eq!(original.len(), 2);

    // Simulate semantic-tier loss, then recover.
    std::fs::remove_dir_all(layout.semantic_dir()).unwrap();
    let outcome = rebuild_semantic(&layout, &config).unwrap();
    assert!(matches!(outcome, ExtractOutcome::Extracted { .. }));

    let rebuilt = SemanticStore::new(&layout).load_all().unwrap();
    assert_eq!(original, rebuilt);
}

#[test]
fn whole_pipeline_passes_validation() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let config = PipelineConfig::default();

    write_month(
        &layout,
        "2026-08",
        vec![
            session("s1", 100, &["Use JWT for authentication"], &["don't swallow errors"]),
            session("s2", 200, &["Use JWT for authentication"], &["don't swallow errors"]),
            session("s3", 300, &["Use JWT for authentication"], &["don't swallow errors"]),
            session("s4", 400, &[], &["don't swallow errors"]),
            session("s5", 500, &[], &["don't swallow errors"]),
        ],
    );

    extract(&layout, &config).unwrap();
    synthesize(&layout, &config, true).unwrap();

    let report = validate(&layout, &config).unwrap();
    assert!(report.ok, "unexpected errors: {:?}", report.errors);

    // Anti-pattern seen in 5 distinct sessions is critical.
    let patterns = SemanticStore::new(&layout).load_all().unwrap();
    let anti = patterns
        .iter()
        .find(|p| p.category == Category::AntiPattern)
        .unwrap();
    assert_eq!(anti.occurrences, 5);
    assert_eq!(anti.strength, Strength::Critical);

    // Corrupt the semantic tier and watch validation catch it.
    std::fs::write(layout.semantic_dir().join("anti_patterns.json"), "[]").unwrap();
    let report = validate(&layout, &config).unwrap();
    assert!(!report.ok);

    // Rebuild recovers a clean state.
    rebuild_semantic(&layout, &config).unwrap();
    let report = validate(&layout, &config).unwrap();
    assert!(report.ok, "rebuild left errors: {:?}", report.errors);
}

#[test]
fn custom_thresholds_change_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let mut config = PipelineConfig::default();
    config.thresholds.min_sessions = 2;
    config.thresholds.emerging_pattern = 1;
    config.thresholds.strong_pattern = 2;
    config.thresholds.critical_pattern = 2;

    write_month(
        &layout,
        "2026-08",
        vec![
            session("s1", 100, &["format with rustfmt"], &[]),
            session("s2", 200, &["format with rustfmt"], &[]),
        ],
    );

    extract(&layout, &config).unwrap();
    let patterns = SemanticStore::new(&layout).load_all().unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].strength, Strength::Critical);
}
