use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Schema, Tuple};

use super::{AggregateOp, Aggregator, Cursor, OpIterator};

/// Computes an aggregate over its child, optionally grouped by one field.
///
/// `open` drains the child into an [`Aggregator`] and buffers its results;
/// `rewind` replays the buffered results without touching the child.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    aggregator: Aggregator,
    results: Vec<Tuple>,
    position: usize,
    cursor: Cursor,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn OpIterator>,
        agg_field: usize,
        group_by: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self> {
        let aggregator = Aggregator::new(child.schema(), group_by, agg_field, op)?;
        Ok(Self {
            child,
            aggregator,
            results: Vec::new(),
            position: 0,
            cursor: Cursor::default(),
        })
    }

    pub fn group_field(&self) -> Option<usize> {
        self.aggregator.group_by()
    }

    pub fn group_field_name(&self) -> Option<&str> {
        self.group_field()
            .and_then(|g| self.child.schema().column_name(g))
    }

    pub fn aggregate_field(&self) -> usize {
        self.aggregator.agg_field()
    }

    pub fn aggregate_field_name(&self) -> Option<&str> {
        self.child.schema().column_name(self.aggregate_field())
    }

    pub fn aggregate_op(&self) -> AggregateOp {
        self.aggregator.op()
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.aggregator.clear();
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.aggregator.merge_tuple(&tuple)?;
        }
        self.results = self.aggregator.results()?;
        self.position = 0;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.results.clear();
        self.cursor.close();
    }

    fn rewind(&mut self) -> Result<()> {
        if !self.cursor.is_open() {
            return Err(DbError::IllegalState("operator is not open"));
        }
        self.position = 0;
        self.cursor.clear();
        Ok(())
    }

    fn schema(&self) -> &Arc<Schema> {
        self.aggregator.schema()
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let tuple = self.results.get(self.position).cloned();
        if tuple.is_some() {
            self.position += 1;
        }
        Ok(tuple)
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}
