//! Engram - three-tier memory pipeline
//!
//! Converts raw interaction session records into durable behavioral
//! rules through escalating memory tiers:
//! - Episodic: immutable monthly session files, written externally
//! - Semantic: deduplicated, counted, strength-classified patterns
//! - Procedural: generated markdown rule artifacts
//!
//! Data flows strictly upward (episodic → semantic → procedural); the
//! recovery layer can re-derive the semantic tier from episodic history
//! at any time.
//!
//! # Example
//!
//! ```ignore
//! use engram::config::PipelineConfig;
//! use engram::store::ProjectLayout;
//!
//! fn main() -> anyhow::Result<()> {
//!     let layout = ProjectLayout::new("/path/to/project-memory");
//!     let config = PipelineConfig::load(layout.root())?;
//!     let outcome = engram::extractor::extract(&layout, &config)?;
//!     println!("{}", outcome);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod extractor;
pub mod recovery;
pub mod similarity;
pub mod store;
pub mod synthesizer;
pub mod types;

// Re-export the pipeline surface consumed by the host.
pub use config::PipelineConfig;
pub use extractor::{extract, ExtractOutcome};
pub use recovery::{rebuild_semantic, validate, ValidationReport};
pub use store::ProjectLayout;
pub use synthesizer::{synthesize, SynthesisOutcome, SynthesisPlan};
pub use types::{Category, Pattern, SessionRecord, Strength};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
