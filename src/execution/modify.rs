use std::sync::Arc;

use log::debug;

use crate::buffer::BufferPool;
use crate::common::{DbError, Result, TableId, TransactionId};
use crate::tuple::{DataType, Schema, Tuple, Value};

use super::{Cursor, OpIterator};

fn count_schema(name: &str) -> Arc<Schema> {
    Schema::builder().column(name, DataType::Integer).build_arc()
}

fn count_tuple(schema: &Arc<Schema>, count: usize) -> Result<Tuple> {
    let count = i32::try_from(count).map_err(|_| DbError::Overflow("tuple count"))?;
    Tuple::new(Arc::clone(schema), vec![Value::Integer(count)])
}

/// Inserts every child tuple into a table.
///
/// The first fetch drains the child and yields one `(Inserted)` tuple
/// holding the count. The child is drained at most once over the operator's
/// lifetime; reopening or rewinding does not insert again.
pub struct Insert {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    table_id: TableId,
    child: Box<dyn OpIterator>,
    schema: Arc<Schema>,
    done: bool,
    cursor: Cursor,
}

impl Insert {
    /// Fails with `SchemaMismatch` if the child's tuples don't fit the table.
    pub fn new(
        pool: Arc<BufferPool>,
        tid: TransactionId,
        child: Box<dyn OpIterator>,
        table_id: TableId,
    ) -> Result<Self> {
        let table = pool.catalog().resolve_table(table_id)?;
        if **child.schema() != *table.schema {
            return Err(DbError::SchemaMismatch {
                expected: table.schema.to_string(),
                found: child.schema().to_string(),
            });
        }
        Ok(Self {
            pool,
            tid,
            table_id,
            child,
            schema: count_schema("Inserted"),
            done: false,
            cursor: Cursor::default(),
        })
    }
}

impl OpIterator for Insert {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.cursor.close();
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        let mut count = 0;
        while self.child.has_next()? {
            let mut tuple = self.child.next()?;
            self.pool.insert_tuple(self.tid, self.table_id, &mut tuple)?;
            count += 1;
        }
        self.done = true;
        debug!("{} inserted {} tuples into {}", self.tid, count, self.table_id);
        count_tuple(&self.schema, count).map(Some)
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}

/// Deletes every child tuple from the table it was read from.
///
/// Mirrors [`Insert`]: one `(Deleted)` count tuple, child drained once.
pub struct Delete {
    pool: Arc<BufferPool>,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    schema: Arc<Schema>,
    done: bool,
    cursor: Cursor,
}

impl Delete {
    pub fn new(pool: Arc<BufferPool>, tid: TransactionId, child: Box<dyn OpIterator>) -> Self {
        Self {
            pool,
            tid,
            child,
            schema: count_schema("Deleted"),
            done: false,
            cursor: Cursor::default(),
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.cursor.close();
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        let mut count = 0;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.pool.delete_tuple(self.tid, &tuple)?;
            count += 1;
        }
        self.done = true;
        debug!("{} deleted {} tuples", self.tid, count);
        count_tuple(&self.schema, count).map(Some)
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}
