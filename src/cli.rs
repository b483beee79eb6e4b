//! CLI interface for engram

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::store::ProjectLayout;
use crate::synthesizer::SynthesisOutcome;
use crate::{extractor, recovery, synthesizer};

#[derive(Parser)]
#[command(name = "engram")]
#[command(about = "Session-to-rule memory pipeline: episodic sessions, semantic patterns, procedural rules", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the project layout and a default config file
    Init {
        /// Project memory directory
        project: PathBuf,
    },
    /// Detect recurring patterns from the episodic session history
    Extract {
        /// Project memory directory
        project: PathBuf,
        /// Override the configured minimum session floor
        #[arg(long)]
        min_sessions: Option<u32>,
    },
    /// Generate rule artifacts from rule-worthy patterns
    Synthesize {
        /// Project memory directory
        project: PathBuf,
        /// Write artifacts without a confirmation preview
        #[arg(long)]
        auto_approve: bool,
    },
    /// Check structural integrity of all three memory tiers
    Validate {
        /// Project memory directory
        project: PathBuf,
    },
    /// Delete and re-derive the semantic tier from episodic history
    Rebuild {
        /// Project memory directory
        project: PathBuf,
    },
}

/// Parse arguments and run the chosen pipeline operation.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { project } => {
            let layout = ProjectLayout::new(&project);
            layout.ensure_dirs()?;
            PipelineConfig::load(&project)?;
            println!("Initialized project memory at {}", project.display());
        }
        Commands::Extract {
            project,
            min_sessions,
        } => {
            let layout = ProjectLayout::new(&project);
            let mut config = PipelineConfig::load(&project)?;
            if let Some(floor) = min_sessions {
                config.thresholds.min_sessions = floor;
            }
            let outcome = extractor::extract(&layout, &config)?;
            println!("{}", outcome);
        }
        Commands::Synthesize {
            project,
            auto_approve,
        } => {
            let layout = ProjectLayout::new(&project);
            let config = PipelineConfig::load(&project)?;
            let approve = auto_approve || config.auto_approve;
            match synthesizer::synthesize(&layout, &config, approve)? {
                SynthesisOutcome::NoPatterns => {
                    println!("No rule-worthy patterns found");
                }
                SynthesisOutcome::Preview(plan) => {
                    println!("Preview (no files written):");
                    for artifact in &plan.artifacts {
                        println!(
                            "  would write {} ({} patterns)",
                            artifact.path.display(),
                            artifact.pattern_ids.len()
                        );
                    }
                    for category in &plan.stale {
                        println!("  would remove stale {} artifact", category);
                    }
                    println!("Re-run with --auto-approve to apply");
                }
                SynthesisOutcome::Written { files } => {
                    for file in &files {
                        println!("  wrote {}", file.display());
                    }
                    println!("Wrote {} rule artifacts", files.len());
                }
            }
        }
        Commands::Validate { project } => {
            let layout = ProjectLayout::new(&project);
            let config = PipelineConfig::load(&project)?;
            let report = recovery::validate(&layout, &config)?;
            if report.ok {
                println!("Validation passed");
            } else {
                println!("Validation failed with {} errors:", report.errors.len());
                for error in &report.errors {
                    println!("  - {}", error);
                }
                std::process::exit(1);
            }
        }
        Commands::Rebuild { project } => {
            let layout = ProjectLayout::new(&project);
            let config = PipelineConfig::load(&project)?;
            let outcome = recovery::rebuild_semantic(&layout, &config)?;
            println!("{}", outcome);
        }
    }

    Ok(())
}
