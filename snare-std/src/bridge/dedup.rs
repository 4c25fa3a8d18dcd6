//! Idempotence for repeated host notifications.

use super::context::LoadKind;
use dashmap::DashSet;

/// Records which (identity, kind) pairs were already dispatched.
///
/// The record only grows. [`first_time`](Self::first_time) is an atomic
/// test-and-set, so two racing notifications for the same pair cannot
/// both pass.
#[derive(Default)]
pub struct LoadDeduplicator {
    seen: DashSet<(String, LoadKind)>,
}

impl LoadDeduplicator {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pair, returning `true` if it had not been seen before.
    pub fn first_time(&self, identity: &str, kind: LoadKind) -> bool {
        self.seen.insert((identity.to_string(), kind))
    }

    /// Whether the pair was already recorded.
    pub fn contains(&self, identity: &str, kind: LoadKind) -> bool {
        self.seen.contains(&(identity.to_string(), kind))
    }

    /// Number of recorded pairs.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub(crate) fn clear(&self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    #[test]
    fn pairs_are_recorded_once() {
        let dedup = LoadDeduplicator::new();
        assert!(dedup.first_time("app.example", LoadKind::PackageLoad));
        assert!(!dedup.first_time("app.example", LoadKind::PackageLoad));
        assert!(dedup.first_time("app.example", LoadKind::ResourcesInit));
        assert!(dedup.first_time("app.other", LoadKind::PackageLoad));
        assert!(dedup.contains("app.example", LoadKind::ResourcesInit));
        assert_eq!(dedup.len(), 3);
    }

    #[test]
    fn racing_notifications_pass_once() {
        let dedup = Arc::new(LoadDeduplicator::new());
        let passed = Arc::new(AtomicUsize::new(0));
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let dedup = dedup.clone();
                let passed = passed.clone();
                thread::spawn(move || {
                    if dedup.first_time("app.example", LoadKind::PackageLoad) {
                        passed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(passed.load(Ordering::SeqCst), 1);
    }
}
