mod heap_page;

use std::sync::Arc;

use parking_lot::RwLock;

pub use heap_page::*;

/// A resident page shared between the buffer pool and its users
pub type PageRef = Arc<RwLock<HeapPage>>;
