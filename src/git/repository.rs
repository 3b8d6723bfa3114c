//! Local repository access.

use std::path::Path;

use git2::{BranchType, ErrorCode, Oid, Repository, Sort};
use tracing::debug;

use super::walker::{CommitWalk, WalkOptions};
use crate::error::RepositoryError;

/// Git repository wrapper.
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Opens the repository at `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|source| RepositoryError::NotARepository {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self { repo })
    }

    /// Path of the `.git` directory.
    pub fn path(&self) -> &Path {
        self.repo.path()
    }

    /// Working directory, if the repository is not bare.
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Access to the underlying git2 repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Short name derived from the working directory (or git dir for bare repositories).
    pub fn name(&self) -> String {
        let base = self.workdir().unwrap_or_else(|| self.path());
        let base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
        base.file_name()
            .map(|n| n.to_string_lossy().trim_end_matches(".git").to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| base.display().to_string())
    }

    /// Name HEAD points at: the branch shorthand, `HEAD` when detached, `None`
    /// when the repository has no commits yet.
    pub fn current_branch(&self) -> Option<String> {
        match self.repo.head() {
            Ok(head) => head.shorthand().map(ToString::to_string),
            Err(_) => self.unborn_branch_name(),
        }
    }

    fn unborn_branch_name(&self) -> Option<String> {
        let head = self.repo.find_reference("HEAD").ok()?;
        let target = head.symbolic_target()?;
        target.strip_prefix("refs/heads/").map(ToString::to_string)
    }

    /// Walks history from `options.branch` (or HEAD), oldest commit first.
    pub fn walk(&self, options: &WalkOptions) -> Result<CommitWalk<'_>, RepositoryError> {
        let Some(start) = self.resolve_start(options.branch.as_deref())? else {
            debug!("Repository has no commits; nothing to walk");
            return Ok(CommitWalk::empty(&self.repo));
        };

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::REVERSE)?;
        revwalk.push(start)?;

        Ok(CommitWalk::new(&self.repo, revwalk, options.range))
    }

    fn resolve_start(&self, branch: Option<&str>) -> Result<Option<Oid>, RepositoryError> {
        let Some(branch) = branch else {
            return match self.repo.head() {
                Ok(head) => Ok(Some(head.peel_to_commit()?.id())),
                Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            };
        };

        let candidates = [
            self.repo.find_branch(branch, BranchType::Local),
            self.repo.find_branch(branch, BranchType::Remote),
            self.repo
                .find_branch(&format!("origin/{branch}"), BranchType::Remote),
        ];
        if let Some(found) = candidates.into_iter().flatten().next() {
            return Ok(Some(found.get().peel_to_commit()?.id()));
        }

        match self
            .repo
            .revparse_single(branch)
            .and_then(|obj| obj.peel_to_commit())
        {
            Ok(commit) => Ok(Some(commit.id())),
            Err(_) => Err(RepositoryError::BranchNotFound(branch.to_string())),
        }
    }
}
