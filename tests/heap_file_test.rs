//! Integration tests for heap files driven through the buffer pool

use std::collections::HashSet;
use std::sync::Arc;

use heapdb::catalog::Catalog;
use heapdb::common::{DbConfig, DbError, PageId, TableId};
use heapdb::database::Database;
use heapdb::storage::disk::HeapFile;
use heapdb::tuple::{DataType, Schema, Tuple, TupleBuilder, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tempfile::TempDir;

fn int_schema() -> Arc<Schema> {
    Schema::builder().column("v", DataType::Integer).build_arc()
}

fn setup(pool_pages: usize) -> (Database, TableId, Arc<HeapFile>, TempDir) {
    let dir = TempDir::new().unwrap();
    let db = Database::new(
        DbConfig::default()
            .with_page_size(256)
            .with_buffer_pool_pages(pool_pages),
    );
    let table = db
        .create_table(dir.path().join("t.dat"), int_schema(), "t")
        .unwrap();
    let file = db.catalog().resolve_table(table).unwrap().file;
    (db, table, file, dir)
}

fn int(v: i32) -> Tuple {
    TupleBuilder::new(int_schema()).value(v).build().unwrap()
}

fn scan_values(db: &Database, file: &Arc<HeapFile>) -> Vec<i32> {
    let tid = db.begin();
    let values = file
        .iter(Arc::clone(db.buffer_pool()), tid)
        .map(|t| t.unwrap().value(0).and_then(Value::as_int).unwrap())
        .collect();
    db.commit(tid).unwrap();
    values
}

#[test]
fn test_insert_grows_file_instead_of_failing() {
    let (db, table, file, _dir) = setup(10);
    // 256 * 8 / 33 = 62 slots per page
    let tid = db.begin();
    for v in 0..130 {
        db.buffer_pool().insert_tuple(tid, table, &mut int(v)).unwrap();
    }
    db.commit(tid).unwrap();

    assert_eq!(file.num_pages(), 3);
    assert_eq!(scan_values(&db, &file), (0..130).collect::<Vec<_>>());
}

#[test]
fn test_record_ids_point_at_storage() {
    let (db, table, file, _dir) = setup(10);
    let tid = db.begin();
    let mut t = int(7);
    db.buffer_pool().insert_tuple(tid, table, &mut t).unwrap();
    db.commit(tid).unwrap();

    let rid = t.record_id().unwrap();
    assert_eq!(rid.page_id, PageId::new(file.id(), 0));

    let page = file.read_page(rid.page_id).unwrap();
    assert_eq!(page.tuple(rid.slot_id).and_then(|s| s.value(0)), Some(&Value::Integer(7)));
}

#[test]
fn test_delete_frees_slots_for_reuse() {
    let (db, table, file, _dir) = setup(10);
    let tid = db.begin();
    let mut stored = Vec::new();
    for v in 0..100 {
        let mut t = int(v);
        db.buffer_pool().insert_tuple(tid, table, &mut t).unwrap();
        stored.push(t);
    }
    db.commit(tid).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    stored.shuffle(&mut rng);
    let (gone, kept) = stored.split_at(40);

    let tid = db.begin();
    for t in gone {
        db.buffer_pool().delete_tuple(tid, t).unwrap();
    }
    db.commit(tid).unwrap();

    let expected: HashSet<i32> = kept.iter().map(|t| t.value(0).unwrap().as_int().unwrap()).collect();
    let actual: HashSet<i32> = scan_values(&db, &file).into_iter().collect();
    assert_eq!(actual, expected);

    // refilling uses the freed slots before growing the file
    let pages = file.num_pages();
    let tid = db.begin();
    for v in 0..40 {
        db.buffer_pool().insert_tuple(tid, table, &mut int(1000 + v)).unwrap();
    }
    db.commit(tid).unwrap();
    assert_eq!(file.num_pages(), pages);
}

#[test]
fn test_delete_twice_fails() {
    let (db, table, _file, _dir) = setup(10);
    let tid = db.begin();
    let mut t = int(1);
    db.buffer_pool().insert_tuple(tid, table, &mut t).unwrap();
    db.buffer_pool().delete_tuple(tid, &t).unwrap();
    assert!(matches!(
        db.buffer_pool().delete_tuple(tid, &t),
        Err(DbError::RecordNotFound(_))
    ));
    assert!(matches!(
        db.buffer_pool().delete_tuple(tid, &int(1)),
        Err(DbError::RecordNotFound(_))
    ));
    db.abort(tid).unwrap();
}

#[test]
fn test_insert_rejects_wrong_schema() {
    let (db, table, _file, _dir) = setup(10);
    let other = Schema::from_types(&[DataType::Integer, DataType::Integer]);
    let mut t = Tuple::new(Arc::new(other), vec![1.into(), 2.into()]).unwrap();
    let tid = db.begin();
    assert!(matches!(
        db.buffer_pool().insert_tuple(tid, table, &mut t),
        Err(DbError::SchemaMismatch { .. })
    ));
    db.abort(tid).unwrap();
}

#[test]
fn test_scan_larger_than_pool() {
    let (db, table, file, _dir) = setup(2);
    for chunk in 0..5 {
        let tid = db.begin();
        for v in 0..62 {
            db.buffer_pool()
                .insert_tuple(tid, table, &mut int(chunk * 62 + v))
                .unwrap();
        }
        db.commit(tid).unwrap();
    }
    assert_eq!(file.num_pages(), 5);

    // Shared locks pin every scanned page, so a two-page pool cannot hold
    // the whole table for one transaction
    let tid = db.begin();
    let result: Result<Vec<Tuple>, DbError> = file.iter(Arc::clone(db.buffer_pool()), tid).collect();
    assert!(matches!(result, Err(DbError::BufferPoolFull)));
    db.abort(tid).unwrap();
}

#[test]
fn test_iterator_rewind() {
    let (db, table, file, _dir) = setup(10);
    let tid = db.begin();
    for v in 0..70 {
        db.buffer_pool().insert_tuple(tid, table, &mut int(v)).unwrap();
    }

    let mut iter = file.iter(Arc::clone(db.buffer_pool()), tid);
    assert_eq!(iter.by_ref().take(65).count(), 65);
    iter.rewind();
    assert_eq!(iter.count(), 70);
    db.commit(tid).unwrap();
}

#[test]
fn test_scan_resumes_after_failed_fetch() {
    let (db, table, file, _dir) = setup(2);
    for chunk in 0..3 {
        let tid = db.begin();
        for v in 0..62 {
            db.buffer_pool()
                .insert_tuple(tid, table, &mut int(chunk * 62 + v))
                .unwrap();
        }
        db.commit(tid).unwrap();
    }
    assert_eq!(file.num_pages(), 3);

    let tid = db.begin();
    let mut iter = file.iter(Arc::clone(db.buffer_pool()), tid);
    assert_eq!(iter.by_ref().take(124).count(), 124);
    assert!(matches!(iter.next(), Some(Err(DbError::BufferPoolFull))));

    // free the pool and retry; page 2 must not be skipped
    for n in 0..2 {
        db.buffer_pool().release_page(tid, PageId::new(file.id(), n));
    }
    let rest: Vec<i32> = iter
        .map(|t| t.unwrap().value(0).and_then(Value::as_int).unwrap())
        .collect();
    assert_eq!(rest, (124..186).collect::<Vec<_>>());
    db.commit(tid).unwrap();
}

#[test]
fn test_zero_page_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(DbConfig::default().with_page_size(0));
    assert!(matches!(
        db.create_table(dir.path().join("t.dat"), int_schema(), "t"),
        Err(DbError::InvalidPageSize { page_size: 0, .. })
    ));
}
