use crate::fingerprint::Fingerprint;
use std::collections::HashSet;
use std::sync::Mutex;

/// Fingerprints seen during a single cleaning run.
///
/// Only ever grows. `insert` is the single check-then-insert point, so
/// concurrent workers can never both treat the same fingerprint as new.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: Mutex<HashSet<Fingerprint>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fingerprint, returning true if it had not been seen before
    pub fn insert(&self, fingerprint: Fingerprint) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
