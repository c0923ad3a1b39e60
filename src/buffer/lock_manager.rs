use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::{Condvar, Mutex};

use crate::common::{DbError, PageId, Result, TransactionId};

/// Page lock modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Shared,
    Exclusive,
}

#[derive(Debug, Default)]
struct LockTable {
    /// Current holders of each locked page
    holders: HashMap<PageId, HashMap<TransactionId, LockMode>>,
    /// Waiting transaction -> transactions it waits on
    waits_for: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl LockTable {
    /// Other transactions whose locks prevent `tid` from holding `mode`.
    fn blockers(&self, tid: TransactionId, page_id: PageId, mode: LockMode) -> HashSet<TransactionId> {
        let Some(holders) = self.holders.get(&page_id) else {
            return HashSet::new();
        };
        holders
            .iter()
            .filter(|(holder, held)| {
                **holder != tid && (mode == LockMode::Exclusive || **held == LockMode::Exclusive)
            })
            .map(|(holder, _)| *holder)
            .collect()
    }

    fn grant(&mut self, tid: TransactionId, page_id: PageId, mode: LockMode) {
        let held = self
            .holders
            .entry(page_id)
            .or_default()
            .entry(tid)
            .or_insert(mode);
        if mode == LockMode::Exclusive {
            *held = LockMode::Exclusive;
        }
    }

    /// Whether following wait-for edges from `start` leads back to it.
    fn in_cycle(&self, start: TransactionId) -> bool {
        let mut stack: Vec<TransactionId> = self
            .waits_for
            .get(&start)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        let mut visited = HashSet::new();

        while let Some(tid) = stack.pop() {
            if tid == start {
                return true;
            }
            if !visited.insert(tid) {
                continue;
            }
            if let Some(next) = self.waits_for.get(&tid) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }
}

/// Page-granularity lock manager for strict two-phase locking.
///
/// Shared locks are compatible with each other; an exclusive lock excludes
/// every other holder. A transaction that is the sole shared holder may
/// upgrade to exclusive. Locks are only released through [`release`] and
/// [`release_all`].
///
/// A blocked request records wait-for edges to the transactions holding
/// conflicting locks. If those edges close a cycle, or the wait outlasts the
/// configured timeout, the request fails with `TransactionAborted`.
///
/// [`release`]: LockManager::release
/// [`release_all`]: LockManager::release_all
pub struct LockManager {
    table: Mutex<LockTable>,
    released: Condvar,
    timeout: Duration,
}

impl LockManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            table: Mutex::new(LockTable::default()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Blocks until `tid` holds `mode` (or stronger) on `page_id`.
    pub fn acquire(&self, tid: TransactionId, page_id: PageId, mode: LockMode) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        let mut table = self.table.lock();

        loop {
            let blockers = table.blockers(tid, page_id, mode);
            if blockers.is_empty() {
                table.waits_for.remove(&tid);
                table.grant(tid, page_id, mode);
                return Ok(());
            }

            if Instant::now() >= deadline {
                table.waits_for.remove(&tid);
                warn!("{} timed out waiting for {:?} lock on {}", tid, mode, page_id);
                return Err(DbError::TransactionAborted(tid));
            }

            table.waits_for.insert(tid, blockers);
            if table.in_cycle(tid) {
                table.waits_for.remove(&tid);
                warn!("deadlock detected: aborting {} on {}", tid, page_id);
                return Err(DbError::TransactionAborted(tid));
            }

            debug!("{} waiting for {:?} lock on {}", tid, mode, page_id);
            self.released.wait_until(&mut table, deadline);
        }
    }

    /// Releases `tid`'s lock on one page.
    pub fn release(&self, tid: TransactionId, page_id: PageId) {
        let mut table = self.table.lock();
        if let Some(holders) = table.holders.get_mut(&page_id) {
            holders.remove(&tid);
            if holders.is_empty() {
                table.holders.remove(&page_id);
            }
        }
        drop(table);
        self.released.notify_all();
    }

    /// Releases every lock held by `tid`.
    pub fn release_all(&self, tid: TransactionId) {
        let mut table = self.table.lock();
        table.holders.retain(|_, holders| {
            holders.remove(&tid);
            !holders.is_empty()
        });
        table.waits_for.remove(&tid);
        for waiting_on in table.waits_for.values_mut() {
            waiting_on.remove(&tid);
        }
        drop(table);
        self.released.notify_all();
    }

    /// Returns the mode `tid` holds on `page_id`, if any.
    pub fn lock_mode(&self, tid: TransactionId, page_id: PageId) -> Option<LockMode> {
        self.table
            .lock()
            .holders
            .get(&page_id)
            .and_then(|holders| holders.get(&tid).copied())
    }

    pub fn holds_lock(&self, tid: TransactionId, page_id: PageId) -> bool {
        self.lock_mode(tid, page_id).is_some()
    }

    /// Returns true if any transaction holds a lock on `page_id`.
    pub fn is_locked(&self, page_id: PageId) -> bool {
        self.table.lock().holders.contains_key(&page_id)
    }

    /// Pages on which `tid` holds a lock.
    pub fn locked_pages(&self, tid: TransactionId) -> Vec<PageId> {
        self.table
            .lock()
            .holders
            .iter()
            .filter(|(_, holders)| holders.contains_key(&tid))
            .map(|(page_id, _)| *page_id)
            .collect()
    }
}
