use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Schema, Tuple};

/// Open flag and one-tuple lookahead shared by every operator.
#[derive(Debug, Default)]
pub struct Cursor {
    open: bool,
    lookahead: Option<Tuple>,
}

impl Cursor {
    pub fn open(&mut self) {
        self.open = true;
        self.lookahead = None;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.lookahead = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Drops a buffered tuple so production restarts cleanly.
    pub fn clear(&mut self) {
        self.lookahead = None;
    }
}

/// The pull-based iterator protocol implemented by every operator.
///
/// An operator starts closed. `open` prepares it (and its children), after
/// which `has_next`/`next` pull tuples one at a time; both fail with
/// `IllegalState` while the operator is closed. `rewind` restarts
/// production from the beginning and by default is `close` then `open`.
///
/// Implementors supply `fetch_next`, which returns the next tuple or None
/// when exhausted, and expose their `Cursor`; the provided methods handle
/// the lookahead so that `has_next` may be called repeatedly.
pub trait OpIterator: Send {
    fn open(&mut self) -> Result<()>;

    fn close(&mut self);

    /// Output schema, available whether or not the operator is open.
    fn schema(&self) -> &Arc<Schema>;

    /// Produces the next tuple from the operator's own logic.
    fn fetch_next(&mut self) -> Result<Option<Tuple>>;

    fn cursor_mut(&mut self) -> &mut Cursor;

    fn rewind(&mut self) -> Result<()> {
        self.close();
        self.open()
    }

    fn has_next(&mut self) -> Result<bool> {
        if !self.cursor_mut().is_open() {
            return Err(DbError::IllegalState("operator is not open"));
        }
        if self.cursor_mut().lookahead.is_none() {
            let next = self.fetch_next()?;
            self.cursor_mut().lookahead = next;
        }
        Ok(self.cursor_mut().lookahead.is_some())
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        self.cursor_mut()
            .lookahead
            .take()
            .ok_or(DbError::NoSuchElement)
    }
}

/// Drains an open operator into a vector.
pub fn collect_tuples(op: &mut dyn OpIterator) -> Result<Vec<Tuple>> {
    let mut tuples = Vec::new();
    while op.has_next()? {
        tuples.push(op.next()?);
    }
    Ok(tuples)
}
