//! Wiring of catalog, buffer pool and heap files for one database instance.

use std::path::Path;
use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::catalog::{Catalog, MemoryCatalog};
use crate::common::{DbConfig, Result, TableId, TransactionId};
use crate::storage::disk::HeapFile;
use crate::tuple::Schema;

/// A database instance: one catalog and one buffer pool sharing a
/// configuration. Every table created through it uses the same page size.
pub struct Database {
    config: DbConfig,
    catalog: Arc<MemoryCatalog>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    pub fn new(config: DbConfig) -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        let buffer_pool = Arc::new(BufferPool::from_config(
            &config,
            Arc::clone(&catalog) as Arc<dyn Catalog>,
        ));
        Self {
            config,
            catalog,
            buffer_pool,
        }
    }

    /// Opens (or creates) the heap file at `path` and registers it as `name`.
    pub fn create_table<P: AsRef<Path>>(
        &self,
        path: P,
        schema: Arc<Schema>,
        name: &str,
    ) -> Result<TableId> {
        let file = HeapFile::open(path, schema, self.config.page_size)?;
        Ok(self.catalog.add_table(Arc::new(file), name))
    }

    /// Starts a transaction.
    pub fn begin(&self) -> TransactionId {
        TransactionId::next()
    }

    /// Commits `tid`, flushing its pages and releasing its locks.
    pub fn commit(&self, tid: TransactionId) -> Result<()> {
        self.buffer_pool.transaction_complete(tid, true)
    }

    /// Aborts `tid`, discarding its pages and releasing its locks.
    pub fn abort(&self, tid: TransactionId) -> Result<()> {
        self.buffer_pool.transaction_complete(tid, false)
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<MemoryCatalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DbConfig::default())
    }
}
