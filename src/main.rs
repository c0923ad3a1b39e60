use std::sync::Arc;

use heapdb::common::DbConfig;
use heapdb::database::Database;
use heapdb::execution::{
    Aggregate, AggregateOp, Filter, Insert, OpIterator, Predicate, PredicateOp, SeqScan,
    TupleIterator,
};
use heapdb::tuple::{DataType, Schema, Tuple, TupleBuilder};

fn main() -> heapdb::Result<()> {
    println!("HeapDB - a page-oriented storage engine in Rust");
    println!("===============================================\n");

    let db_path = "demo.dat";
    let db = Database::new(DbConfig::default().with_buffer_pool_pages(10));

    let schema = Schema::builder()
        .column("id", DataType::Integer)
        .column("dept", DataType::VarChar(16))
        .column("salary", DataType::Integer)
        .build_arc();
    let table = db.create_table(db_path, Arc::clone(&schema), "employees")?;
    println!("Created table 'employees' as {}", table);

    // Load rows through an Insert operator
    let rows = [
        (1, "eng", 120),
        (2, "sales", 80),
        (3, "eng", 100),
        (4, "ops", 70),
        (5, "sales", 90),
    ];
    let tuples = rows
        .iter()
        .map(|(id, dept, salary)| {
            TupleBuilder::new(Arc::clone(&schema))
                .value(*id)
                .value(*dept)
                .value(*salary)
                .build()
        })
        .collect::<heapdb::Result<Vec<Tuple>>>()?;

    let tid = db.begin();
    let source = TupleIterator::new(Arc::clone(&schema), tuples);
    let mut insert = Insert::new(Arc::clone(db.buffer_pool()), tid, Box::new(source), table)?;
    insert.open()?;
    let inserted = insert.next()?;
    insert.close();
    db.commit(tid)?;
    println!("Inserted {} rows\n", inserted);

    // SELECT * FROM employees WHERE salary > 85
    let tid = db.begin();
    let scan = SeqScan::new(Arc::clone(db.buffer_pool()), tid, table, "e")?;
    let mut filter = Filter::new(Predicate::new(2, PredicateOp::GreaterThan, 85), Box::new(scan));
    println!("{}", filter.schema());
    filter.open()?;
    while filter.has_next()? {
        println!("  {}", filter.next()?);
    }
    filter.close();

    // SELECT dept, AVG(salary) FROM employees GROUP BY dept
    let scan = SeqScan::new(Arc::clone(db.buffer_pool()), tid, table, "e")?;
    let mut agg = Aggregate::new(Box::new(scan), 2, Some(1), AggregateOp::Avg)?;
    println!("\n{}", agg.schema());
    agg.open()?;
    while agg.has_next()? {
        println!("  {}", agg.next()?);
    }
    agg.close();
    db.commit(tid)?;

    std::fs::remove_file(db_path).ok();
    println!("\nDemo completed successfully!");
    Ok(())
}
