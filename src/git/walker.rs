//! Lazy, date-filtered history walks.

use chrono::{DateTime, NaiveDate, Utc};
use git2::{Repository, Revwalk};
use tracing::trace;

use super::CommitRecord;
use crate::analysis::{CancelReason, Cancellation};
use crate::error::RepositoryError;

/// Inclusive calendar-date window, evaluated on UTC committer dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a window; fails when `since` is after `until`.
    pub fn new(
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Self, RepositoryError> {
        if let (Some(since), Some(until)) = (since, until) {
            if since > until {
                return Err(RepositoryError::InvalidDateRange { since, until });
            }
        }
        Ok(Self { since, until })
    }

    /// Window with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Inclusive lower bound.
    pub fn since(&self) -> Option<NaiveDate> {
        self.since
    }

    /// Inclusive upper bound.
    pub fn until(&self) -> Option<NaiveDate> {
        self.until
    }

    /// Whether a timestamp's UTC date falls inside the window.
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let date = timestamp.date_naive();
        self.since.map_or(true, |since| date >= since)
            && self.until.map_or(true, |until| date <= until)
    }
}

/// What to walk.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Branch to start from; `None` walks from HEAD.
    pub branch: Option<String>,
    /// Date window applied before commits are yielded.
    pub range: DateRange,
}

/// Iterator over the commits reachable from a starting point, oldest first.
///
/// Commits outside the date window are skipped without being yielded. A
/// failure while reading the graph is yielded once as an `Err`.
///
/// With a [`Cancellation`] attached, the signal is checked before every
/// commit is read, including the ones skipped by the date window. A fired
/// signal ends the walk and is reported by [`stopped`](Self::stopped).
pub struct CommitWalk<'repo> {
    repo: &'repo Repository,
    revwalk: Option<Revwalk<'repo>>,
    range: DateRange,
    cancel: Option<Cancellation>,
    stopped: Option<CancelReason>,
    visited: u64,
}

impl<'repo> CommitWalk<'repo> {
    pub(crate) fn new(repo: &'repo Repository, revwalk: Revwalk<'repo>, range: DateRange) -> Self {
        Self {
            repo,
            revwalk: Some(revwalk),
            range,
            cancel: None,
            stopped: None,
            visited: 0,
        }
    }

    /// A walk that yields nothing, used for repositories without commits.
    pub(crate) fn empty(repo: &'repo Repository) -> Self {
        Self {
            repo,
            revwalk: None,
            range: DateRange::unbounded(),
            cancel: None,
            stopped: None,
            visited: 0,
        }
    }

    /// Stops the walk once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Why the walk ended early, if it did.
    pub fn stopped(&self) -> Option<CancelReason> {
        self.stopped
    }

    /// Commits read from the graph so far, in range or not.
    pub fn visited(&self) -> u64 {
        self.visited
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = Result<CommitRecord, RepositoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let revwalk = self.revwalk.as_mut()?;
            if let Some(reason) = self.cancel.as_ref().and_then(Cancellation::check) {
                self.stopped = Some(reason);
                self.revwalk = None;
                return None;
            }

            let Some(oid) = revwalk.next() else {
                self.revwalk = None;
                return None;
            };
            self.visited += 1;

            let record = oid
                .and_then(|oid| self.repo.find_commit(oid))
                .map(|commit| CommitRecord::from_git_commit(&commit));

            match record {
                Ok(record) if self.range.contains(&record.timestamp) => return Some(Ok(record)),
                Ok(record) => trace!(hash = %record.short_hash(), "Commit outside date range"),
                Err(e) => {
                    self.revwalk = None;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inverted_range_rejected() {
        let err = DateRange::new(Some(date(2024, 3, 2)), Some(date(2024, 3, 1))).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidDateRange { .. }));
    }

    #[test]
    fn single_day_range_covers_whole_day() {
        let range = DateRange::new(Some(date(2024, 3, 1)), Some(date(2024, 3, 1))).unwrap();
        assert!(range.contains(&Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert!(range.contains(&Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap()));
        assert!(!range.contains(&Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()));
        assert!(!range.contains(&Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()));
    }

    #[test]
    fn open_ended_ranges() {
        let ts = Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap();
        assert!(DateRange::unbounded().contains(&ts));
        assert!(DateRange::new(Some(date(2020, 6, 15)), None)
            .unwrap()
            .contains(&ts));
        assert!(!DateRange::new(None, Some(date(2020, 6, 14)))
            .unwrap()
            .contains(&ts));
    }
}
