//! Scan-order no-repeat window for tile selection.
//!
//! Tracks the last K assigned tile ids. Ids inside the window are excluded
//! from selection for the current cell; the exclusion is waived by the
//! index search when no alternative exists, so the same id can legitimately
//! appear in the window more than once.

use crate::index::TileId;
use std::collections::{HashMap, HashSet, VecDeque};

/// Sliding window over the last K tile assignments in scan order.
#[derive(Debug)]
pub struct RepeatWindow {
    capacity: usize,
    order: VecDeque<TileId>,
    counts: HashMap<TileId, usize>,
    forbidden: HashSet<TileId>,
}

impl RepeatWindow {
    /// Creates a window holding up to `k` assignments. `k = 0` disables
    /// tracking entirely.
    pub fn new(k: usize) -> Self {
        Self {
            capacity: k,
            order: VecDeque::with_capacity(k),
            counts: HashMap::new(),
            forbidden: HashSet::new(),
        }
    }

    /// Records an assignment, evicting the oldest once the window is full.
    pub fn record(&mut self, id: TileId) {
        if self.capacity == 0 {
            return;
        }

        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                let count = self.counts.entry(evicted).or_insert(0);
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.counts.remove(&evicted);
                    self.forbidden.remove(&evicted);
                }
            }
        }

        self.order.push_back(id);
        *self.counts.entry(id).or_insert(0) += 1;
        self.forbidden.insert(id);
    }

    /// The set of ids currently excluded from selection.
    pub fn forbidden(&self) -> &HashSet<TileId> {
        &self.forbidden
    }

    /// Number of assignments currently tracked.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing is tracked yet.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> TileId {
        // TileId construction is crate-private; go through the public
        // ordinal mapping used by the index.
        crate::index::TileId::test_from_ordinal(n)
    }

    #[test]
    fn test_window_excludes_recent() {
        let mut window = RepeatWindow::new(2);
        window.record(id(1));
        window.record(id(2));

        assert!(window.forbidden().contains(&id(1)));
        assert!(window.forbidden().contains(&id(2)));
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut window = RepeatWindow::new(2);
        window.record(id(1));
        window.record(id(2));
        window.record(id(3));

        assert!(!window.forbidden().contains(&id(1)));
        assert!(window.forbidden().contains(&id(2)));
        assert!(window.forbidden().contains(&id(3)));
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_window_duplicate_survives_one_eviction() {
        // A waived constraint can put the same id in the window twice; one
        // eviction must not unforbid the newer occurrence.
        let mut window = RepeatWindow::new(3);
        window.record(id(7));
        window.record(id(7));
        window.record(id(8));
        window.record(id(9)); // evicts first 7

        assert!(window.forbidden().contains(&id(7)));

        window.record(id(10)); // evicts second 7
        assert!(!window.forbidden().contains(&id(7)));
    }

    #[test]
    fn test_zero_capacity_tracks_nothing() {
        let mut window = RepeatWindow::new(0);
        window.record(id(1));

        assert!(window.is_empty());
        assert!(window.forbidden().is_empty());
    }
}
