use std::time::Duration;

/// Default size of a page in bytes (4 KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default buffer pool capacity (number of resident pages)
pub const DEFAULT_BUFFER_POOL_PAGES: usize = 50;

/// Default payload length of a STRING column in bytes
pub const DEFAULT_STRING_LEN: u16 = 128;

/// Default K value for LRU-K replacement policy
pub const DEFAULT_LRUK_K: usize = 2;

/// Default upper bound on how long a lock request may wait
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2000;

/// Instance-wide settings shared by the buffer pool and every heap file
/// created through the same `Database`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Bytes per page, identical for every heap file
    pub page_size: usize,
    /// Maximum number of pages resident in the buffer pool
    pub buffer_pool_pages: usize,
    /// K for the LRU-K eviction policy
    pub lruk_k: usize,
    /// Bound on a single lock wait before the requester is aborted
    pub lock_timeout: Duration,
}

impl DbConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_buffer_pool_pages(mut self, pages: usize) -> Self {
        self.buffer_pool_pages = pages;
        self
    }

    pub fn with_lruk_k(mut self, k: usize) -> Self {
        self.lruk_k = k;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            buffer_pool_pages: DEFAULT_BUFFER_POOL_PAGES,
            lruk_k: DEFAULT_LRUK_K,
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}
