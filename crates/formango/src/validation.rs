//! Revalidation bookkeeping.
//!
//! The driver remembers which document revision its issue list describes.
//! The form runs the schema whenever the document moved past that
//! revision; synchronous results land immediately, asynchronous ones are
//! parked until the form settles them.

use tracing::debug;

use crate::issue::Issue;
use crate::reactive::Revision;
use crate::schema::{LocalFuture, MaybeAsync};

type PendingPass = (Revision, LocalFuture<Vec<Issue>>);

#[derive(Default)]
pub(crate) struct ValidationDriver {
    issues: Vec<Issue>,
    revision: Revision,
    validated_at: Option<Revision>,
    pending: Option<PendingPass>,
}

impl ValidationDriver {
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Revision of the issue list itself.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Whether a pass must run for the document at `document`.
    pub fn is_stale(&self, document: Revision) -> bool {
        self.validated_at != Some(document)
    }

    /// Record the outcome of a pass started for `document`.
    ///
    /// A pending outcome replaces any older pass still in flight.
    pub fn apply(&mut self, document: Revision, outcome: MaybeAsync<Vec<Issue>>) {
        self.validated_at = Some(document);
        match outcome {
            MaybeAsync::Ready(issues) => {
                self.pending = None;
                self.replace(issues);
            }
            MaybeAsync::Pending(future) => {
                debug!(revision = document.get(), "validation pass pending");
                self.pending = Some((document, future));
            }
        }
    }

    pub fn take_pending(&mut self) -> Option<PendingPass> {
        self.pending.take()
    }

    /// Land the result of a pass started for `started`. Results for a
    /// document that has since moved are discarded.
    pub fn finish_pending(&mut self, started: Revision, current: Revision, issues: Vec<Issue>) -> bool {
        if started != current || self.validated_at != Some(started) {
            debug!(started = started.get(), current = current.get(), "discarding stale validation pass");
            return false;
        }
        self.replace(issues);
        true
    }

    /// Replace the issue list wholesale.
    pub fn replace(&mut self, issues: Vec<Issue>) {
        debug!(issues = issues.len(), "validation pass finished");
        self.issues = issues;
        self.revision.bump();
    }

    /// Add issues on top of the current list.
    pub fn append(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
        self.revision.bump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rev(n: u64) -> Revision {
        let mut revision = Revision::default();
        for _ in 0..n {
            revision.bump();
        }
        revision
    }

    #[test]
    fn test_ready_outcome_replaces_issues() {
        let mut driver = ValidationDriver::default();
        assert!(driver.is_stale(rev(0)));
        driver.apply(rev(0), MaybeAsync::Ready(vec![Issue::at("Required", "name")]));
        assert!(!driver.is_stale(rev(0)));
        assert_eq!(driver.issues().len(), 1);
        driver.append([Issue::new("Server")]);
        assert_eq!(driver.issues().len(), 2);
        driver.apply(rev(1), MaybeAsync::Ready(Vec::new()));
        assert!(driver.issues().is_empty());
    }

    #[test]
    fn test_stale_pending_result_is_discarded() {
        let mut driver = ValidationDriver::default();
        driver.apply(rev(1), MaybeAsync::pending(async { Vec::new() }));
        let (started, _future) = driver.take_pending().unwrap();
        assert!(!driver.finish_pending(started, rev(2), vec![Issue::new("late")]));
        assert!(driver.issues().is_empty());
        assert!(driver.finish_pending(started, rev(1), vec![Issue::new("on time")]));
        assert_eq!(driver.issues().len(), 1);
    }
}
