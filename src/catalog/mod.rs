//! Table lookup for the buffer pool and the scan operator.

use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use parking_lot::RwLock;

use crate::common::{DbError, Result, TableId};
use crate::storage::disk::HeapFile;
use crate::tuple::Schema;

/// Everything the engine needs to know about one table
#[derive(Clone)]
pub struct TableInfo {
    pub file: Arc<HeapFile>,
    pub schema: Arc<Schema>,
    pub name: String,
}

/// Resolves table ids to their heap files.
pub trait Catalog: Send + Sync {
    fn resolve_table(&self, table_id: TableId) -> Result<TableInfo>;
}

#[derive(Default)]
struct Tables {
    by_id: HashMap<TableId, TableInfo>,
    by_name: HashMap<String, TableId>,
}

/// In-memory catalog. Registering a table under a name or id already in use
/// replaces the previous entry.
#[derive(Default)]
pub struct MemoryCatalog {
    tables: RwLock<Tables>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a heap file under `name` and returns its table id.
    pub fn add_table(&self, file: Arc<HeapFile>, name: impl Into<String>) -> TableId {
        let name = name.into();
        let table_id = file.id();
        let mut tables = self.tables.write();

        if let Some(old) = tables.by_id.remove(&table_id) {
            tables.by_name.remove(&old.name);
        }
        if let Some(old_id) = tables.by_name.remove(&name) {
            tables.by_id.remove(&old_id);
        }

        info!("registered table {} as {}", name, table_id);
        tables.by_name.insert(name.clone(), table_id);
        tables.by_id.insert(
            table_id,
            TableInfo {
                schema: Arc::clone(file.schema()),
                file,
                name,
            },
        );
        table_id
    }

    /// Looks up a table id by name.
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.tables.read().by_name.get(name).copied()
    }

    /// Returns the ids of all registered tables.
    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.read().by_id.keys().copied().collect()
    }
}

impl Catalog for MemoryCatalog {
    fn resolve_table(&self, table_id: TableId) -> Result<TableInfo> {
        self.tables
            .read()
            .by_id
            .get(&table_id)
            .cloned()
            .ok_or(DbError::TableNotFound(table_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::DataType;
    use tempfile::TempDir;

    fn open(dir: &TempDir, file: &str) -> Arc<HeapFile> {
        let schema = Arc::new(Schema::from_types(&[DataType::Integer]));
        Arc::new(HeapFile::open(dir.path().join(file), schema, 512).unwrap())
    }

    #[test]
    fn test_add_and_resolve() {
        let dir = TempDir::new().unwrap();
        let catalog = MemoryCatalog::new();
        let id = catalog.add_table(open(&dir, "a.dat"), "a");

        let info = catalog.resolve_table(id).unwrap();
        assert_eq!(info.name, "a");
        assert_eq!(info.file.id(), id);
        assert_eq!(catalog.table_id("a"), Some(id));
        assert!(matches!(
            catalog.resolve_table(TableId::new(id.as_u32().wrapping_add(1))),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_name_reuse_replaces_table() {
        let dir = TempDir::new().unwrap();
        let catalog = MemoryCatalog::new();
        let first = catalog.add_table(open(&dir, "a.dat"), "t");
        let second = catalog.add_table(open(&dir, "b.dat"), "t");

        assert_ne!(first, second);
        assert_eq!(catalog.table_id("t"), Some(second));
        assert_eq!(catalog.table_ids(), vec![second]);
    }
}
