use std::fmt;
use std::sync::Arc;

use bytes::{Buf, BufMut};

use crate::common::{DbError, RecordId, Result};

use super::{Schema, Value};

/// Represents a single row/tuple.
///
/// A tuple holds one value per schema column and, once persisted, the
/// `RecordId` of the slot it lives in. Tuples that were never stored
/// (aggregate results, counts from Insert/Delete) carry no record id.
///
/// ## Tuple Binary Format
///
/// ```text
/// +-----------+-----------+-----+-----------+
/// | Field 0   | Field 1   | ... | Field n-1 |
/// +-----------+-----------+-----+-----------+
/// ```
///
/// Every field is written at its type's fixed width, so a serialized tuple is
/// always exactly `schema.byte_size()` bytes.
#[derive(Debug, Clone)]
pub struct Tuple {
    /// The schema defining the structure of this tuple
    schema: Arc<Schema>,

    /// The values for each column (in schema order)
    values: Vec<Value>,

    /// Location on disk, if the tuple has been stored
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a new tuple with the given schema and values.
    ///
    /// Fails if the value count differs from the column count or a value does
    /// not fit its column.
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.column_count() {
            return Err(DbError::SchemaMismatch {
                expected: schema.to_string(),
                found: format!("{} values", values.len()),
            });
        }
        for (value, col) in values.iter().zip(schema.columns()) {
            value.check(col.data_type())?;
        }
        Ok(Self {
            schema,
            values,
            record_id: None,
        })
    }

    /// Builds a tuple from `schema.byte_size()` bytes.
    pub fn from_bytes<B: Buf>(schema: Arc<Schema>, buf: &mut B) -> Option<Self> {
        let values = schema
            .columns()
            .map(|col| Value::read_from(buf, col.data_type()))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            schema,
            values,
            record_id: None,
        })
    }

    /// Writes exactly `schema.byte_size()` bytes.
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        for (value, col) in self.values.iter().zip(self.schema.columns()) {
            value.write_to(buf, col.data_type());
        }
    }

    /// Returns the schema of this tuple.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the value at the given column index.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns all values in this tuple.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Replaces the value at the given column index.
    pub fn set_value(&mut self, index: usize, value: Value) -> Result<()> {
        let data_type = self
            .schema
            .data_type(index)
            .ok_or(DbError::InvalidField(index))?;
        value.check(data_type)?;
        self.values[index] = value;
        Ok(())
    }

    /// Returns the record id, if the tuple has been stored.
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// Sets or clears the record id.
    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Rebinds the tuple to an equal schema, keeping values and record id.
    pub(crate) fn with_schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = schema;
        self
    }

    /// Returns the number of columns/values in this tuple.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this tuple has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Concatenates two tuples under a pre-merged schema.
    pub fn merge(schema: Arc<Schema>, left: &Tuple, right: &Tuple) -> Tuple {
        let values = left.values.iter().chain(&right.values).cloned().collect();
        Tuple {
            schema,
            values,
            record_id: None,
        }
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        *self.schema == *other.schema && self.values == other.values
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

/// Builder for constructing tuples fluently.
pub struct TupleBuilder {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl TupleBuilder {
    /// Creates a new tuple builder for the given schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        let count = schema.column_count();
        Self {
            schema,
            values: Vec::with_capacity(count),
        }
    }

    /// Appends the value for the next column.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Builds the tuple, validating it against the schema.
    pub fn build(self) -> Result<Tuple> {
        Tuple::new(self.schema, self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::DataType;
    use bytes::BytesMut;

    fn create_test_schema() -> Arc<Schema> {
        Schema::builder()
            .column("id", DataType::Integer)
            .column("name", DataType::VarChar(16))
            .build_arc()
    }

    #[test]
    fn test_tuple_creation() {
        let schema = create_test_schema();
        let tuple = Tuple::new(schema, vec![Value::Integer(1), Value::from("Alice")]).unwrap();

        assert_eq!(tuple.len(), 2);
        assert_eq!(tuple.value(0), Some(&Value::Integer(1)));
        assert_eq!(tuple.value(1), Some(&Value::from("Alice")));
        assert_eq!(tuple.record_id(), None);
    }

    #[test]
    fn test_tuple_rejects_bad_values() {
        let schema = create_test_schema();
        assert!(matches!(
            Tuple::new(schema.clone(), vec![Value::Integer(1)]),
            Err(DbError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            Tuple::new(schema.clone(), vec![Value::from("x"), Value::from("y")]),
            Err(DbError::TypeMismatch { .. })
        ));
        assert!(matches!(
            Tuple::new(schema, vec![Value::Integer(1), Value::from("a".repeat(17))]),
            Err(DbError::ValueTooLong { .. })
        ));
    }

    #[test]
    fn test_tuple_builder() {
        let tuple = TupleBuilder::new(create_test_schema())
            .value(42)
            .value("Bob")
            .build()
            .unwrap();

        assert_eq!(tuple.value(0), Some(&Value::Integer(42)));
        assert_eq!(tuple.value(1), Some(&Value::from("Bob")));
    }

    #[test]
    fn test_set_value() {
        let mut tuple = TupleBuilder::new(create_test_schema())
            .value(1)
            .value("a")
            .build()
            .unwrap();

        tuple.set_value(0, Value::Integer(7)).unwrap();
        assert_eq!(tuple.value(0), Some(&Value::Integer(7)));
        assert!(tuple.set_value(0, Value::from("x")).is_err());
        assert!(matches!(
            tuple.set_value(5, Value::Integer(1)),
            Err(DbError::InvalidField(5))
        ));
    }

    #[test]
    fn test_encoded_size_matches_schema() {
        let schema = create_test_schema();
        let tuple = TupleBuilder::new(schema.clone())
            .value(-3)
            .value("Test User")
            .build()
            .unwrap();

        let mut buf = BytesMut::new();
        tuple.write_to(&mut buf);
        assert_eq!(buf.len(), schema.byte_size());

        let recovered = Tuple::from_bytes(schema, &mut buf.freeze()).unwrap();
        assert_eq!(tuple, recovered);
    }

    #[test]
    fn test_merge_and_display() {
        let left = create_test_schema();
        let right = Schema::builder().column("n", DataType::Integer).build_arc();
        let merged_schema = Arc::new(Schema::merge(&left, &right));

        let l = TupleBuilder::new(left).value(1).value("a").build().unwrap();
        let r = TupleBuilder::new(right).value(9).build().unwrap();
        let merged = Tuple::merge(merged_schema, &l, &r);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged.to_string(), "1\ta\t9");
    }
}
