//! HeapDB - a page-oriented storage and query engine in Rust
//!
//! Tables are stored as heap files of fixed-size pages, cached in a bounded
//! buffer pool that takes page-level locks on behalf of transactions, and
//! queried through a tree of pull-based operators.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//!
//! - **Tuples** (`tuple`): Field types, schemas and fixed-width records
//!
//! - **Storage Layer** (`storage`): Page layout and file I/O
//!   - `HeapPage`: Slot bitmap plus fixed-width record slots
//!   - `HeapFile`: One table as a sequence of heap pages in a single file
//!
//! - **Buffer Pool** (`buffer`): Page cache, locking and recovery
//!   - `BufferPool`: Bounded cache, commit and abort under no-steal/no-force
//!   - `LockManager`: Shared/exclusive page locks with deadlock detection
//!   - `LruKReplacer`: LRU-K choice among clean, unlocked pages
//!
//! - **Catalog** (`catalog`): Table id to heap file and schema lookup
//!
//! - **Execution** (`execution`): Scan, filter, join, aggregate, insert and
//!   delete operators
//!
//! - **Optimizer** (`optimizer`): Selectivity histograms
//!
//! # Example
//!
//! ```rust,no_run
//! use heapdb::common::DbConfig;
//! use heapdb::database::Database;
//! use heapdb::tuple::{DataType, Schema, TupleBuilder};
//!
//! let db = Database::new(DbConfig::default());
//! let schema = Schema::builder()
//!     .column("id", DataType::Integer)
//!     .column("name", DataType::string())
//!     .build_arc();
//! let table = db.create_table("users.dat", schema.clone(), "users").unwrap();
//!
//! let tid = db.begin();
//! let mut tuple = TupleBuilder::new(schema).value(1).value("Alice").build().unwrap();
//! db.buffer_pool().insert_tuple(tid, table, &mut tuple).unwrap();
//! db.commit(tid).unwrap();
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod database;
pub mod execution;
pub mod optimizer;
pub mod storage;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{DbError, PageId, RecordId, Result, SlotId, TableId, TransactionId};
