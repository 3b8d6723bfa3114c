//! Git operations: opening repositories, walking history, cloning remotes.

pub mod commit;
pub mod remote;
pub mod repository;
pub mod walker;

pub use commit::{CommitRecord, UNKNOWN_AUTHOR, UNKNOWN_EMAIL};
pub use remote::{MaterializedRepo, RepoSource};
pub use repository::GitRepository;
pub use walker::{CommitWalk, DateRange, WalkOptions};

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;
