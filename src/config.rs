//! Pipeline configuration
//!
//! Thresholds, dedup similarity, timeouts, and the auto-approve flag.
//! Loaded once from `<project>/engram.toml` and passed explicitly into
//! every pipeline call; nothing reads ambient globals.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::Strength;

/// Config file name inside a project directory.
pub const CONFIG_FILE: &str = "engram.toml";

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Session-count thresholds for extraction and strength tiers
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Minimum text similarity for two observations to be one pattern
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f64,
    /// Minimum strength a pattern needs to be rendered into a rule
    #[serde(default = "default_rule_floor")]
    pub rule_floor: Strength,
    /// Wall-clock budget for extraction before degrading to
    /// frequency-only detection
    #[serde(default = "default_extract_timeout")]
    pub extract_timeout_secs: u64,
    /// Wall-clock budget for synthesis before aborting (pre-write)
    #[serde(default = "default_synthesize_timeout")]
    pub synthesize_timeout_secs: u64,
    /// Write rule artifacts without an explicit confirmation step
    #[serde(default)]
    pub auto_approve: bool,
}

/// Occurrence thresholds; must satisfy `emerging <= strong <= critical`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Sessions required before extraction runs at all
    #[serde(default = "default_min_sessions")]
    pub min_sessions: u32,
    /// Distinct sessions for a cluster to count as an emerging pattern
    #[serde(default = "default_emerging")]
    pub emerging_pattern: u32,
    /// Distinct sessions for a strong pattern
    #[serde(default = "default_strong")]
    pub strong_pattern: u32,
    /// Distinct sessions for a critical pattern
    #[serde(default = "default_critical")]
    pub critical_pattern: u32,
}

fn default_min_sessions() -> u32 {
    3
}

fn default_emerging() -> u32 {
    2
}

fn default_strong() -> u32 {
    3
}

fn default_critical() -> u32 {
    5
}

fn default_dedup_threshold() -> f64 {
    0.85
}

fn default_rule_floor() -> Strength {
    Strength::Strong
}

fn default_extract_timeout() -> u64 {
    30
}

fn default_synthesize_timeout() -> u64 {
    30
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_sessions: default_min_sessions(),
            emerging_pattern: default_emerging(),
            strong_pattern: default_strong(),
            critical_pattern: default_critical(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            dedup_threshold: default_dedup_threshold(),
            rule_floor: default_rule_floor(),
            extract_timeout_secs: default_extract_timeout(),
            synthesize_timeout_secs: default_synthesize_timeout(),
            auto_approve: false,
        }
    }
}

impl Thresholds {
    /// Reject threshold orderings the strength classifier can't honor.
    pub fn validate(&self) -> Result<()> {
        if self.emerging_pattern > self.strong_pattern {
            anyhow::bail!(
                "emerging_pattern ({}) must not exceed strong_pattern ({})",
                self.emerging_pattern,
                self.strong_pattern
            );
        }
        if self.strong_pattern > self.critical_pattern {
            anyhow::bail!(
                "strong_pattern ({}) must not exceed critical_pattern ({})",
                self.strong_pattern,
                self.critical_pattern
            );
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Load configuration from a project directory, writing defaults
    /// on first use.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str::<PipelineConfig>(&contents)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            let config = PipelineConfig::default();
            config.save(project_dir)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration into a project directory.
    pub fn save(&self, project_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(project_dir)
            .context("Failed to create project directory")?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(project_dir.join(CONFIG_FILE), contents)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if !(self.dedup_threshold > 0.0 && self.dedup_threshold <= 1.0) {
            anyhow::bail!(
                "dedup_threshold ({}) must be in (0, 1]",
                self.dedup_threshold
            );
        }
        Ok(())
    }
}
