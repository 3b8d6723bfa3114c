//! Commit message classification.
//!
//! A [`SignatureTable`] holds the text patterns that identify AI tooling, a
//! [`TierThresholds`] maps numeric confidence onto coarse tiers, and the
//! [`Classifier`] combines both to turn one commit message into zero or more
//! [`Detection`]s.

pub mod classifier;
pub mod signatures;
pub mod tier;

pub use classifier::{overall_confidence, overall_tier, Classifier, Detection};
pub use signatures::{
    Signature, SignatureError, SignatureSpec, SignatureTable, SignatureTableBuilder,
    ToolSignatures, GENERIC_TOOL,
};
pub use tier::{ConfidenceTier, TierError, TierThreshold, TierThresholds};
