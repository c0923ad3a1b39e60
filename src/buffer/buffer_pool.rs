use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::catalog::Catalog;
use crate::common::{DbConfig, DbError, PageId, Result, TableId, TransactionId};
use crate::storage::page::PageRef;
use crate::tuple::Tuple;

use super::{LockManager, LockMode, LruKReplacer};

/// Resident pages and their access history, guarded together
struct PoolState {
    /// Page table: resident pages by id
    pages: HashMap<PageId, PageRef>,
    /// LRU-K replacer for eviction decisions
    replacer: LruKReplacer,
}

/// BufferPool is the single path through which pages are read and written.
/// It caches at most `capacity` pages, takes page locks on behalf of
/// transactions, and implements commit and abort.
///
/// Recovery is no-steal/no-force: a dirty page is never written or evicted
/// before its transaction commits, so abort only has to drop the cached
/// copies. Commit writes the transaction's own dirty pages.
///
/// Lock order: the pool mutex may be taken before the lock manager's, never
/// after. Lock waits happen without the pool mutex held.
pub struct BufferPool {
    /// Maximum number of resident pages
    capacity: usize,
    /// Table lookup for loading and flushing pages
    catalog: Arc<dyn Catalog>,
    /// Page locks
    lock_manager: LockManager,
    /// Cached pages
    state: Mutex<PoolState>,
}

impl BufferPool {
    /// Creates a buffer pool holding up to `capacity` pages with LRU-`k`
    /// replacement and the given bound on lock waits.
    pub fn new(capacity: usize, k: usize, lock_timeout: Duration, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            capacity,
            catalog,
            lock_manager: LockManager::new(lock_timeout),
            state: Mutex::new(PoolState {
                pages: HashMap::with_capacity(capacity),
                replacer: LruKReplacer::new(k),
            }),
        }
    }

    pub fn from_config(config: &DbConfig, catalog: Arc<dyn Catalog>) -> Self {
        Self::new(
            config.buffer_pool_pages,
            config.lruk_k,
            config.lock_timeout,
            catalog,
        )
    }

    /// Returns the maximum number of resident pages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the catalog pages are resolved through.
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Returns the lock manager.
    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    /// Locks `page_id` for `tid` in `mode`, then returns the page, loading it
    /// from its heap file on a miss. Blocks while another transaction holds a
    /// conflicting lock.
    pub fn get_page(&self, tid: TransactionId, page_id: PageId, mode: LockMode) -> Result<PageRef> {
        self.lock_manager.acquire(tid, page_id, mode)?;

        let mut state = self.state.lock();
        if let Some(page) = state.pages.get(&page_id).cloned() {
            state.replacer.record_access(page_id);
            return Ok(page);
        }

        if state.pages.len() >= self.capacity {
            self.evict_page(&mut state)?;
        }

        let table = self.catalog.resolve_table(page_id.table_id)?;
        let page = Arc::new(RwLock::new(table.file.read_page(page_id)?));
        state.pages.insert(page_id, Arc::clone(&page));
        state.replacer.record_access(page_id);
        Ok(page)
    }

    /// Evicts one clean, unlocked page.
    fn evict_page(&self, state: &mut PoolState) -> Result<()> {
        let PoolState { pages, replacer } = state;
        let lock_manager = &self.lock_manager;

        let victim = replacer.evict_where(|page_id| {
            !lock_manager.is_locked(*page_id)
                && pages.get(page_id).is_some_and(|page| !page.read().is_dirty())
        });

        match victim {
            Some(page_id) => {
                pages.remove(&page_id);
                debug!("evicted {}", page_id);
                Ok(())
            }
            None => {
                warn!("buffer pool full: all {} resident pages are dirty or locked", pages.len());
                Err(DbError::BufferPoolFull)
            }
        }
    }

    /// Returns true if `tid` holds a lock on `page_id`.
    pub fn holds_lock(&self, tid: TransactionId, page_id: PageId) -> bool {
        self.lock_manager.holds_lock(tid, page_id)
    }

    /// Releases `tid`'s lock on a page before the transaction ends. This
    /// breaks two-phase locking and is only safe for a page the transaction
    /// has not read or modified.
    pub fn release_page(&self, tid: TransactionId, page_id: PageId) {
        self.lock_manager.release(tid, page_id);
    }

    /// Inserts a tuple into the given table on behalf of `tid`. Pages the
    /// table modified are marked dirty and kept resident.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: TableId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageRef>> {
        let table = self.catalog.resolve_table(table_id)?;
        let pages = table.file.insert_tuple(self, tid, tuple)?;
        self.mark_dirty(tid, &pages)?;
        Ok(pages)
    }

    /// Deletes a stored tuple on behalf of `tid`.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<Vec<PageRef>> {
        let record_id = tuple
            .record_id()
            .ok_or_else(|| DbError::record_not_found(None))?;
        let table = self.catalog.resolve_table(record_id.page_id.table_id)?;
        let pages = table.file.delete_tuple(self, tid, tuple)?;
        self.mark_dirty(tid, &pages)?;
        Ok(pages)
    }

    fn mark_dirty(&self, tid: TransactionId, pages: &[PageRef]) -> Result<()> {
        let mut state = self.state.lock();
        for page in pages {
            let page_id = {
                let mut guard = page.write();
                guard.mark_dirty(Some(tid));
                guard.page_id()
            };
            let resident = state
                .pages
                .get(&page_id)
                .is_some_and(|cached| Arc::ptr_eq(cached, page));
            if !resident {
                if !state.pages.contains_key(&page_id) && state.pages.len() >= self.capacity {
                    self.evict_page(&mut state)?;
                }
                state.pages.insert(page_id, Arc::clone(page));
                state.replacer.record_access(page_id);
            }
        }
        Ok(())
    }

    /// Writes a resident page to disk if it is dirty.
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let state = self.state.lock();
        self.flush_locked(&state, page_id)
    }

    fn flush_locked(&self, state: &PoolState, page_id: PageId) -> Result<()> {
        let Some(page) = state.pages.get(&page_id) else {
            return Ok(());
        };
        let mut guard = page.write();
        if guard.is_dirty() {
            let table = self.catalog.resolve_table(page_id.table_id)?;
            table.file.write_page(&guard)?;
            guard.mark_dirty(None);
        }
        Ok(())
    }

    /// Writes every dirty resident page to disk. Breaks no-steal if called
    /// while transactions are running.
    pub fn flush_all_pages(&self) -> Result<()> {
        let state = self.state.lock();
        let page_ids: Vec<PageId> = state.pages.keys().copied().collect();
        for page_id in page_ids {
            self.flush_locked(&state, page_id)?;
        }
        Ok(())
    }

    /// Writes the pages dirtied by `tid` to disk; returns how many.
    pub fn flush_pages(&self, tid: TransactionId) -> Result<usize> {
        let state = self.state.lock();
        let page_ids = Self::dirtied_by(&state, tid);
        for page_id in &page_ids {
            self.flush_locked(&state, *page_id)?;
        }
        Ok(page_ids.len())
    }

    fn dirtied_by(state: &PoolState, tid: TransactionId) -> Vec<PageId> {
        state
            .pages
            .iter()
            .filter(|(_, page)| page.read().dirtier() == Some(tid))
            .map(|(page_id, _)| *page_id)
            .collect()
    }

    /// Drops a page from the cache without writing it.
    pub fn discard_page(&self, page_id: PageId) {
        let mut state = self.state.lock();
        state.pages.remove(&page_id);
        state.replacer.remove(&page_id);
    }

    /// Ends a transaction. Commit flushes the pages it dirtied; abort
    /// discards them so the next access rereads the on-disk version. Either
    /// way every lock it holds is released, including when the flush fails.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> Result<()> {
        let result = if commit {
            self.flush_pages(tid).map(|flushed| {
                debug!("{} committed, flushed {} pages", tid, flushed);
            })
        } else {
            let mut state = self.state.lock();
            let discarded = Self::dirtied_by(&state, tid);
            for page_id in &discarded {
                state.pages.remove(page_id);
                state.replacer.remove(page_id);
            }
            info!("{} aborted, discarded {} pages", tid, discarded.len());
            Ok(())
        };

        self.lock_manager.release_all(tid);
        result
    }

    /// Returns the resident pages currently dirtied by `tid`.
    pub fn dirty_pages(&self, tid: TransactionId) -> Vec<PageId> {
        Self::dirtied_by(&self.state.lock(), tid)
    }

    /// Returns the ids of all resident pages.
    pub fn cached_pages(&self) -> Vec<PageId> {
        self.state.lock().pages.keys().copied().collect()
    }

    /// Returns true if the page is resident.
    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.state.lock().pages.contains_key(&page_id)
    }
}
