//! Per-client request identifiers.
//!
//! Responses arrive on the same HTTP exchange that carried the command, so
//! ids exist for wire compliance only. Each client owns its own counter;
//! nothing is shared across instances.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RequestCounter {
    last: AtomicU64,
}

impl RequestCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next id. The first id is 1.
    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The most recently issued id, or 0 if none has been issued.
    #[must_use]
    pub fn last_id(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn ids_start_at_one_and_increase_by_one() {
        let counter = RequestCounter::new();
        assert_eq!(counter.last_id(), 0);
        assert_eq!(counter.next_id(), 1);
        assert_eq!(counter.next_id(), 2);
        assert_eq!(counter.last_id(), 2);
    }

    #[test]
    fn concurrent_callers_never_share_an_id() {
        let counter = Arc::new(RequestCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || (0..250).map(|_| counter.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("thread should not panic") {
                assert!(seen.insert(id), "id {id} issued twice");
            }
        }

        assert_eq!(seen.len(), 2_000);
        assert_eq!(counter.last_id(), 2_000);
        assert!(seen.iter().all(|id| (1..=2_000).contains(id)));
    }

    #[test]
    fn counters_are_independent() {
        let a = RequestCounter::new();
        let b = RequestCounter::new();
        a.next_id();
        a.next_id();
        assert_eq!(b.next_id(), 1);
        assert_eq!(a.last_id(), 2);
    }
}
