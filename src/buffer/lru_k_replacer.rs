use std::collections::{HashMap, VecDeque};

use crate::common::{PageId, Timestamp};

/// Last k access timestamps of one resident page (most recent at back)
#[derive(Debug, Default)]
struct AccessHistory {
    history: VecDeque<Timestamp>,
}

impl AccessHistory {
    fn record(&mut self, timestamp: Timestamp, k: usize) {
        self.history.push_back(timestamp);
        while self.history.len() > k {
            self.history.pop_front();
        }
    }

    /// Backward k-distance, or None (+inf) with fewer than k accesses.
    fn k_distance(&self, now: Timestamp, k: usize) -> Option<Timestamp> {
        if self.history.len() < k {
            None
        } else {
            Some(now - self.history[self.history.len() - k])
        }
    }

    fn earliest(&self) -> Timestamp {
        self.history.front().copied().unwrap_or(0)
    }
}

/// LRU-K replacement policy over resident pages.
///
/// The victim is the eligible page with the largest backward k-distance, the
/// time since its kth most recent access. Pages with fewer than k accesses
/// have +inf distance and go first; ties among them are broken by the
/// earliest recorded access.
///
/// Eligibility is decided by the caller at eviction time, since it depends on
/// lock and dirty state the replacer does not track. The replacer is owned by
/// the buffer pool's state and relies on its mutex.
#[derive(Debug)]
pub struct LruKReplacer {
    k: usize,
    /// Logical clock, advanced on every access
    now: Timestamp,
    pages: HashMap<PageId, AccessHistory>,
}

impl LruKReplacer {
    /// Creates a replacer; `k` is raised to at least 1.
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            now: 0,
            pages: HashMap::new(),
        }
    }

    /// Records an access to `page_id`, tracking it if new.
    pub fn record_access(&mut self, page_id: PageId) {
        let timestamp = self.now;
        self.now += 1;
        self.pages
            .entry(page_id)
            .or_default()
            .record(timestamp, self.k);
    }

    /// Chooses a victim among the pages for which `eligible` returns true and
    /// stops tracking it. Returns None if no tracked page is eligible.
    pub fn evict_where<F>(&mut self, mut eligible: F) -> Option<PageId>
    where
        F: FnMut(&PageId) -> bool,
    {
        let mut victim: Option<(PageId, Option<Timestamp>, Timestamp)> = None;

        for (page_id, history) in &self.pages {
            if !eligible(page_id) {
                continue;
            }
            let distance = history.k_distance(self.now, self.k);
            let earliest = history.earliest();

            let better = match &victim {
                None => true,
                Some((_, best_distance, best_earliest)) => match (best_distance, distance) {
                    (None, Some(_)) => false,
                    (Some(_), None) => true,
                    (None, None) => earliest < *best_earliest,
                    (Some(best), Some(candidate)) => {
                        candidate > *best || (candidate == *best && earliest < *best_earliest)
                    }
                },
            };

            if better {
                victim = Some((*page_id, distance, earliest));
            }
        }

        let (page_id, _, _) = victim?;
        self.pages.remove(&page_id);
        Some(page_id)
    }

    /// Stops tracking a page.
    pub fn remove(&mut self, page_id: &PageId) {
        self.pages.remove(page_id);
    }

    /// Returns the number of tracked pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true if no page is tracked.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns the k value of this replacer.
    pub fn k(&self) -> usize {
        self.k
    }
}
