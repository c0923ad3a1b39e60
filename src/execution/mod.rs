//! Pull-based query operators.
//!
//! Every operator implements [`OpIterator`] and owns its children as boxed
//! trait objects, so plans are built bottom-up:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use heapdb::buffer::BufferPool;
//! # use heapdb::common::{TableId, TransactionId};
//! use heapdb::execution::{Filter, OpIterator, Predicate, PredicateOp, SeqScan};
//!
//! # fn plan(pool: Arc<BufferPool>, tid: TransactionId, table: TableId) -> heapdb::Result<()> {
//! let scan = SeqScan::new(pool, tid, table, "t")?;
//! let mut filter = Filter::new(Predicate::new(0, PredicateOp::GreaterThan, 3), Box::new(scan));
//! filter.open()?;
//! while filter.has_next()? {
//!     println!("{}", filter.next()?);
//! }
//! filter.close();
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod aggregator;
mod filter;
mod join;
mod modify;
mod operator;
mod predicate;
mod seq_scan;
mod tuple_iterator;

pub use aggregate::Aggregate;
pub use aggregator::{AggregateOp, Aggregator};
pub use filter::Filter;
pub use join::Join;
pub use modify::{Delete, Insert};
pub use operator::{collect_tuples, Cursor, OpIterator};
pub use predicate::{JoinPredicate, Predicate, PredicateOp};
pub use seq_scan::SeqScan;
pub use tuple_iterator::TupleIterator;
