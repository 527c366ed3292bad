//! Minimal change tracking: revision counters, memoised derivations and
//! document watchers.
//!
//! Every piece of derived form state (field values, dirtiness, scoped
//! errors) is a function of three inputs: the document, the path table and
//! the issue list. Each input carries a [`Revision`] that moves on every
//! mutation; a [`Memo`] recomputes only when the revisions it was stamped
//! with have moved.

use serde_json::Value;

/// Monotonic mutation counter of one reactive input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Revision(u64);

impl Revision {
    pub fn bump(&mut self) {
        self.0 += 1;
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A cached derived value, valid for one stamp of input revisions.
#[derive(Debug)]
pub struct Memo<K, T> {
    entry: Option<(K, T)>,
}

impl<K: PartialEq, T> Memo<K, T> {
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// Return the cached value for `stamp`, recomputing it when the stamp moved.
    pub fn get_or_compute(&mut self, stamp: K, compute: impl FnOnce() -> T) -> &T {
        if let Some((cached, _)) = &self.entry {
            if *cached != stamp {
                self.entry = None;
            }
        }
        &self.entry.get_or_insert_with(|| (stamp, compute())).1
    }
}

impl<K: PartialEq, T> Default for Memo<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `Form::watch`, used to stop watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

type Watcher = Box<dyn FnMut(&Value)>;

/// Observers of deep document mutation.
///
/// Notification is driven by the form's batching: observers run once when
/// the outermost batch ends, and only when the document revision moved
/// since they were last notified.
#[derive(Default)]
pub(crate) struct Watchers {
    next_id: u64,
    entries: Vec<(WatchId, Watcher)>,
    /// Observers taken out by a notification round still in progress.
    in_flight: Vec<WatchId>,
    cancelled: Vec<WatchId>,
    notified: Revision,
}

impl Watchers {
    pub fn add(&mut self, watcher: Watcher) -> WatchId {
        let id = WatchId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, watcher));
        id
    }

    pub fn remove(&mut self, id: WatchId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        if self.entries.len() != before {
            return true;
        }
        if self.in_flight.contains(&id) && !self.cancelled.contains(&id) {
            self.cancelled.push(id);
            return true;
        }
        false
    }

    /// Take the observers out for notification, or `None` when the document
    /// has not moved since the last round.
    pub fn begin_notify(&mut self, revision: Revision) -> Option<Vec<(WatchId, Watcher)>> {
        if self.notified == revision {
            return None;
        }
        self.notified = revision;
        if self.entries.is_empty() {
            return None;
        }
        let taken = std::mem::take(&mut self.entries);
        self.in_flight = taken.iter().map(|(id, _)| *id).collect();
        Some(taken)
    }

    /// Put observers back after a notification round, keeping any added meanwhile.
    pub fn end_notify(&mut self, mut taken: Vec<(WatchId, Watcher)>) {
        self.in_flight.clear();
        let cancelled = std::mem::take(&mut self.cancelled);
        taken.retain(|(id, _)| !cancelled.contains(id));
        taken.append(&mut self.entries);
        self.entries = taken;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_memo_recomputes_on_new_stamp() {
        let calls = Cell::new(0);
        let mut memo: Memo<(u64, u64), u64> = Memo::new();
        let mut compute = |v: u64| {
            calls.set(calls.get() + 1);
            v
        };
        assert_eq!(*memo.get_or_compute((1, 1), || compute(10)), 10);
        assert_eq!(*memo.get_or_compute((1, 1), || compute(20)), 10);
        assert_eq!(*memo.get_or_compute((1, 2), || compute(30)), 30);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_watchers_notify_once_per_revision() {
        let seen = Rc::new(Cell::new(0));
        let mut watchers = Watchers::default();
        let counter = seen.clone();
        watchers.add(Box::new(move |_| counter.set(counter.get() + 1)));

        let mut revision = Revision::default();
        revision.bump();
        for _ in 0..2 {
            if let Some(mut taken) = watchers.begin_notify(revision) {
                for (_, watcher) in taken.iter_mut() {
                    watcher(&Value::Null);
                }
                watchers.end_notify(taken);
            }
        }
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_remove_during_notification() {
        let mut watchers = Watchers::default();
        let id = watchers.add(Box::new(|_| {}));
        let mut revision = Revision::default();
        revision.bump();
        let taken = watchers.begin_notify(revision).unwrap();
        assert!(watchers.remove(id));
        assert!(!watchers.remove(id));
        watchers.end_notify(taken);
        assert!(watchers.entries.is_empty());
        assert!(watchers.cancelled.is_empty());
    }

    #[test]
    fn test_remove_unknown_id_outside_notification() {
        let mut watchers = Watchers::default();
        let id = watchers.add(Box::new(|_| {}));
        assert!(watchers.remove(id));
        assert!(!watchers.remove(id));
        assert!(!watchers.remove(WatchId(99)));
        assert!(watchers.cancelled.is_empty());
    }
}
