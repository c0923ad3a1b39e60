use std::sync::Arc;

use crate::common::Result;
use crate::tuple::{Schema, Tuple};

use super::{Cursor, JoinPredicate, OpIterator};

/// Nested-loop join. For each left tuple the right child is rewound and
/// scanned in full; matching pairs are emitted as `left ++ right`.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    schema: Arc<Schema>,
    /// Left tuple currently being matched against the right child
    outer: Option<Tuple>,
    cursor: Cursor,
}

impl Join {
    pub fn new(predicate: JoinPredicate, left: Box<dyn OpIterator>, right: Box<dyn OpIterator>) -> Self {
        let schema = Arc::new(Schema::merge(left.schema(), right.schema()));
        Self {
            predicate,
            left,
            right,
            schema,
            outer: None,
            cursor: Cursor::default(),
        }
    }

    pub fn predicate(&self) -> &JoinPredicate {
        &self.predicate
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> Result<()> {
        self.left.open()?;
        self.right.open()?;
        self.outer = None;
        self.cursor.open();
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.outer = None;
        self.cursor.close();
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.outer.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.outer = Some(self.left.next()?);
            }

            if let Some(left) = self.outer.as_ref() {
                while self.right.has_next()? {
                    let right = self.right.next()?;
                    if self.predicate.filter(left, &right) {
                        return Ok(Some(Tuple::merge(Arc::clone(&self.schema), left, &right)));
                    }
                }
            }

            self.outer = None;
            self.right.rewind()?;
        }
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }
}
