//! Aggregation of classified commits into usage statistics.

pub mod aggregator;
pub mod cancel;
pub mod merge;
pub mod pipeline;
pub mod result;

pub use aggregator::Aggregator;
pub use cancel::{CancelReason, Cancellation};
pub use pipeline::{
    analyze_many, analyze_repository, analyze_source, AnalysisOptions, RepoFailure, RepoTarget,
    TeamReport, DEFAULT_CONCURRENCY,
};
pub use result::{
    percentage, AiCommit, AnalysisResult, AnalysisScope, AuthorStat, ConfidenceSummary,
    Granularity, TimelineBucket, ToolStat,
};
