//! # ai-usage
//!
//! Measures how much of a codebase's history was produced with AI coding
//! tools, judged from commit messages.
//!
//! ## Pipeline
//!
//! - [`git`] walks a repository's history lazily, oldest commit first.
//! - [`detection`] classifies each commit message against a signature table.
//! - [`analysis`] folds classified commits into an [`AnalysisResult`] and
//!   merges results across repositories.
//! - [`github`] lists team and organization repositories to analyze.
//! - [`report`] renders results as JSON, YAML or CSV.
//!
//! ## Quick Start
//!
//! ```rust
//! use ai_usage::detection::Classifier;
//!
//! let classifier = Classifier::default();
//! let detections = classifier.classify_message("Add parser (copilot)");
//! assert_eq!(detections[0].tool, "GitHub Copilot");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod git;
pub mod github;
pub mod report;
pub mod utils;

pub use crate::analysis::AnalysisResult;
pub use crate::cli::Cli;

/// The current version of ai-usage.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
