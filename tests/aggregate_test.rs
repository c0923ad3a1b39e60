//! Integration tests for grouped and ungrouped aggregation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use heapdb::common::{DbConfig, DbError, Result};
use heapdb::database::Database;
use heapdb::execution::{
    collect_tuples, Aggregate, AggregateOp, Cursor, Filter, OpIterator, Predicate, PredicateOp,
    SeqScan, TupleIterator,
};
use heapdb::tuple::{DataType, Schema, Tuple, TupleBuilder, Value};
use tempfile::TempDir;

fn scores() -> Arc<Schema> {
    Schema::builder()
        .column("name", DataType::VarChar(8))
        .column("score", DataType::Integer)
        .build_arc()
}

fn score(name: &str, v: i32) -> Tuple {
    TupleBuilder::new(scores()).value(name).value(v).build().unwrap()
}

fn sample() -> Vec<Tuple> {
    vec![score("A", 10), score("B", 5), score("A", 20)]
}

/// Wraps a child and counts how many rows it hands out.
struct Counting {
    inner: TupleIterator,
    pulled: Arc<AtomicUsize>,
}

impl OpIterator for Counting {
    fn open(&mut self) -> Result<()> {
        self.inner.open()
    }

    fn close(&mut self) {
        self.inner.close()
    }

    fn schema(&self) -> &Arc<Schema> {
        self.inner.schema()
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let next = self.inner.fetch_next()?;
        if next.is_some() {
            self.pulled.fetch_add(1, Ordering::SeqCst);
        }
        Ok(next)
    }

    fn cursor_mut(&mut self) -> &mut Cursor {
        self.inner.cursor_mut()
    }
}

fn rows(tuples: &[Tuple]) -> Vec<String> {
    tuples.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_avg_grouped_by_name() {
    let child = TupleIterator::new(scores(), sample());
    let mut agg = Aggregate::new(Box::new(child), 1, Some(0), AggregateOp::Avg).unwrap();
    assert_eq!(agg.schema().column_name(0), Some("name"));
    assert_eq!(agg.schema().column_name(1), Some("avg (score)"));
    assert_eq!(agg.group_field_name(), Some("name"));
    assert_eq!(agg.aggregate_field_name(), Some("score"));

    agg.open().unwrap();
    assert_eq!(rows(&collect_tuples(&mut agg).unwrap()), vec!["A\t15", "B\t5"]);
    agg.close();
}

#[test]
fn test_every_op_without_grouping() {
    let cases = [
        (AggregateOp::Min, 5),
        (AggregateOp::Max, 20),
        (AggregateOp::Sum, 35),
        (AggregateOp::Avg, 11),
        (AggregateOp::Count, 3),
    ];
    for (op, want) in cases {
        let child = TupleIterator::new(scores(), sample());
        let mut agg = Aggregate::new(Box::new(child), 1, None, op).unwrap();
        assert_eq!(agg.schema().column_count(), 1);
        agg.open().unwrap();
        let out = collect_tuples(&mut agg).unwrap();
        assert_eq!(out.len(), 1, "{}", op);
        assert_eq!(out[0].values(), &[Value::Integer(want)], "{}", op);
    }
}

#[test]
fn test_count_strings() {
    let child = TupleIterator::new(scores(), sample());
    let mut agg = Aggregate::new(Box::new(child), 0, None, AggregateOp::Count).unwrap();
    assert_eq!(agg.schema().column_name(0), Some("count (name)"));
    agg.open().unwrap();
    assert_eq!(agg.next().unwrap().values(), &[Value::Integer(3)]);

    let child = TupleIterator::new(scores(), sample());
    assert!(matches!(
        Aggregate::new(Box::new(child), 0, None, AggregateOp::Sum),
        Err(DbError::UnsupportedAggregate { .. })
    ));
}

#[test]
fn test_empty_input_yields_nothing() {
    let child = TupleIterator::new(scores(), Vec::new());
    let mut agg = Aggregate::new(Box::new(child), 1, None, AggregateOp::Count).unwrap();
    agg.open().unwrap();
    assert!(!agg.has_next().unwrap());
}

#[test]
fn test_rewind_replays_without_draining_child() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let child = Counting {
        inner: TupleIterator::new(scores(), sample()),
        pulled: Arc::clone(&pulled),
    };
    let mut agg = Aggregate::new(Box::new(child), 1, Some(0), AggregateOp::Sum).unwrap();
    assert!(matches!(agg.rewind(), Err(DbError::IllegalState(_))));

    agg.open().unwrap();
    let first = collect_tuples(&mut agg).unwrap();
    assert_eq!(pulled.load(Ordering::SeqCst), 3);

    agg.rewind().unwrap();
    let second = collect_tuples(&mut agg).unwrap();
    assert_eq!(first, second);
    assert_eq!(pulled.load(Ordering::SeqCst), 3);

    // reopening recomputes from scratch
    agg.close();
    agg.open().unwrap();
    assert_eq!(rows(&collect_tuples(&mut agg).unwrap()), vec!["A\t30", "B\t5"]);
    assert_eq!(pulled.load(Ordering::SeqCst), 6);
}

#[test]
fn test_aggregate_over_table_scan() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(DbConfig::default());
    let table = db
        .create_table(dir.path().join("scores.dat"), scores(), "scores")
        .unwrap();

    let tid = db.begin();
    for i in 0..300 {
        let name = if i % 3 == 0 { "fizz" } else { "other" };
        db.buffer_pool()
            .insert_tuple(tid, table, &mut score(name, i))
            .unwrap();
    }
    db.commit(tid).unwrap();

    let tid = db.begin();
    let scan = SeqScan::new(Arc::clone(db.buffer_pool()), tid, table, "s").unwrap();
    let filter = Filter::new(Predicate::new(1, PredicateOp::LessThan, 30), Box::new(scan));
    let mut agg = Aggregate::new(Box::new(filter), 1, Some(0), AggregateOp::Count).unwrap();
    assert_eq!(agg.schema().column_name(1), Some("count (s.score)"));

    agg.open().unwrap();
    assert_eq!(
        rows(&collect_tuples(&mut agg).unwrap()),
        vec!["fizz\t10", "other\t20"]
    );
    agg.close();
    db.commit(tid).unwrap();
}
