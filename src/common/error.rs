use thiserror::Error;

use super::types::{PageId, RecordId, TableId, TransactionId};

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page {0} is full")]
    PageFull(PageId),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Buffer pool is full, no evictable pages available")]
    BufferPoolFull,

    #[error("Transaction {0} aborted")]
    TransactionAborted(TransactionId),

    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    #[error("No more tuples")]
    NoSuchElement,

    #[error("Table {0} not found")]
    TableNotFound(TableId),

    #[error("Schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Field index {0} out of range")]
    InvalidField(usize),

    #[error("String of {len} bytes exceeds column width {max}")]
    ValueTooLong { len: usize, max: usize },

    #[error("Aggregate {op} is not supported over {data_type}")]
    UnsupportedAggregate { op: String, data_type: String },

    #[error("Integer overflow computing {0}")]
    Overflow(&'static str),

    #[error("Page {0} is corrupted")]
    CorruptPage(PageId),

    #[error("Page size {page_size} cannot hold a record of {record_size} bytes")]
    InvalidPageSize { page_size: usize, record_size: usize },
}

impl DbError {
    pub(crate) fn record_not_found(rid: Option<RecordId>) -> Self {
        match rid {
            Some(rid) => DbError::RecordNotFound(rid.to_string()),
            None => DbError::RecordNotFound("tuple has no record id".to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
