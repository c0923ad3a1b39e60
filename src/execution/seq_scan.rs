use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::catalog::TableInfo;
use crate::common::{Result, TableId, TransactionId};
use crate::storage::disk::HeapFileIterator;
use crate::tuple::{Schema, Tuple};

use super::{Cursor, OpIterator};

/// Sequential scan over every tuple of a table, read through the buffer pool
/// under one transaction. Output column names are `alias.column`.
pub struct SeqScan {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    table: TableInfo,
    alias: String,
    schema: Arc<Schema>,
    iter: Option<HeapFileIterator>,
    cursor: Cursor,
}

impl SeqScan {
    /// Creates a scan of `table_id` whose columns are prefixed by `alias`.
    pub fn new(
        pool: Arc<BufferPool>,
        tid: TransactionId,
        table_id: TableId,
        alias: impl Into<String>,
    ) -> Result<Self> {
        let table = pool.catalog().resolve_table(table_id)?;
        let alias = alias.into();
        let schema = Arc::new(table.schema.with_prefix(&alias));
        Ok(Self {
            pool,
            tid,
            table,
            alias,
            schema,
            iter: None,
            cursor: Cursor::default(),
        })
    }

    /// Creates a scan aliased by the table's registered name.
    pub fn with_table_name(pool: Arc<BufferPool>, tid: TransactionId, table_id: TableId) -> Result<Self> {
        let name = pool.catalog().resolve_table(table_id)?.name;
        Self::new(pool, tid, table_id, name)
    }

    pub fn table_name(&self) -> &str {
        &self.table.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> Result<()> {
        self.iter = Some(self.table.file.iter(Arc::clone(&self.pool), self.tid));
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.iter = None;
        self.cursor.close();
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let Some(iter) = self.iter.as_mut() else {
            return Ok(None);
        };
        let tuple = iter.next().transpose()?;
        Ok(tuple.map(|t| t.with_schema(Arc::clone(&self.schema))))
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}
