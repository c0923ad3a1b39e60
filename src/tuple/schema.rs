use std::fmt;
use std::sync::Arc;

use super::DataType;

/// Represents a single column in a schema: a type and an optional name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name, absent for anonymous fields
    name: Option<String>,

    /// Column data type
    data_type: DataType,
}

impl Column {
    /// Creates a named column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: Some(name.into()),
            data_type,
        }
    }

    /// Creates an anonymous column.
    pub fn unnamed(data_type: DataType) -> Self {
        Self {
            name: None,
            data_type,
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the column data type.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Returns the number of bytes this column occupies in a record.
    pub fn size(&self) -> usize {
        self.data_type.size()
    }
}

/// The schema of a record: an ordered, immutable sequence of columns.
///
/// Two schemas are equal when their column types match positionally; column
/// names do not take part in the comparison.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Ordered list of columns
    columns: Vec<Column>,

    /// Sum of all column widths
    byte_size: usize,
}

impl Schema {
    /// Creates a new schema from a list of columns.
    pub fn new(columns: Vec<Column>) -> Self {
        let byte_size = columns.iter().map(Column::size).sum();
        Self { columns, byte_size }
    }

    /// Creates a schema of anonymous columns with the given types.
    pub fn from_types(types: &[DataType]) -> Self {
        Self::new(types.iter().copied().map(Column::unnamed).collect())
    }

    /// Creates a schema builder for fluent construction.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Returns the number of columns in the schema.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the column at the given index.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the type of the column at the given index.
    pub fn data_type(&self, index: usize) -> Option<&DataType> {
        self.columns.get(index).map(Column::data_type)
    }

    /// Returns the name of the column at the given index.
    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).and_then(Column::name)
    }

    /// Returns the index of the first column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == Some(name))
    }

    /// Returns an iterator over all columns.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Returns the size in bytes of every record bound to this schema.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Concatenates two schemas, left columns first.
    pub fn merge(left: &Schema, right: &Schema) -> Schema {
        Schema::new(left.columns.iter().chain(&right.columns).cloned().collect())
    }

    /// Returns a copy of this schema with every column name prefixed by
    /// `alias.`; anonymous columns become `alias.null`.
    pub fn with_prefix(&self, alias: &str) -> Schema {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let name = format!("{}.{}", alias, c.name().unwrap_or("null"));
                Column::new(name, c.data_type)
            })
            .collect();
        Schema::new(columns)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.data_type == b.data_type)
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}({})", col.data_type, col.name().unwrap_or("null"))?;
        }
        Ok(())
    }
}

/// Builder for constructing schemas fluently.
pub struct SchemaBuilder {
    columns: Vec<Column>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Adds a named column.
    pub fn column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(Column::new(name, data_type));
        self
    }

    /// Adds an anonymous column.
    pub fn unnamed_column(mut self, data_type: DataType) -> Self {
        self.columns.push(Column::unnamed(data_type));
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        Schema::new(self.columns)
    }

    /// Builds the schema wrapped in an Arc for shared ownership.
    pub fn build_arc(self) -> Arc<Schema> {
        Arc::new(self.build())
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
