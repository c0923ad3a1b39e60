use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Column, DataType, Schema, Tuple, Value};

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        };
        write!(f, "{}", name)
    }
}

/// Running state for one group. AVG keeps the sum and count and divides only
/// when results are read.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: i64,
    sum: i64,
    min: i64,
    max: i64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            count: 0,
            sum: 0,
            min: i64::MAX,
            max: i64::MIN,
        }
    }

    fn add(&mut self, value: Option<i32>) {
        self.count += 1;
        if let Some(v) = value {
            let v = v as i64;
            self.sum += v;
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
    }

    fn result(&self, op: AggregateOp) -> Result<i32> {
        let (value, what) = match op {
            AggregateOp::Count => (self.count, "count"),
            AggregateOp::Sum => (self.sum, "sum"),
            AggregateOp::Avg => (self.sum / self.count.max(1), "avg"),
            AggregateOp::Min => (self.min, "min"),
            AggregateOp::Max => (self.max, "max"),
        };
        i32::try_from(value).map_err(|_| DbError::Overflow(what))
    }
}

/// Grouped accumulation of one column.
///
/// With a group-by field there is one result per distinct group value,
/// `(group, aggregate)`; without one there is a single `(aggregate)` result
/// once at least one tuple was merged. Groups are reported in the order they
/// were first seen. String columns support only COUNT.
pub struct Aggregator {
    group_by: Option<usize>,
    agg_field: usize,
    op: AggregateOp,
    schema: Arc<Schema>,
    /// Group keys in first-seen order
    keys: Vec<Option<Value>>,
    slots: HashMap<Option<Value>, usize>,
    accumulators: Vec<Accumulator>,
}

impl Aggregator {
    /// Creates an aggregator over tuples of `input`.
    pub fn new(
        input: &Schema,
        group_by: Option<usize>,
        agg_field: usize,
        op: AggregateOp,
    ) -> Result<Self> {
        let agg_column = input.column(agg_field).ok_or(DbError::InvalidField(agg_field))?;
        if agg_column.data_type().is_textual() && op != AggregateOp::Count {
            return Err(DbError::UnsupportedAggregate {
                op: op.to_string(),
                data_type: agg_column.data_type().to_string(),
            });
        }

        let agg_name = format!("{} ({})", op, agg_column.name().unwrap_or("null"));
        let mut columns = Vec::with_capacity(2);
        if let Some(g) = group_by {
            let group_column = input.column(g).ok_or(DbError::InvalidField(g))?;
            columns.push(group_column.clone());
        }
        columns.push(Column::new(agg_name, DataType::Integer));

        Ok(Self {
            group_by,
            agg_field,
            op,
            schema: Arc::new(Schema::new(columns)),
            keys: Vec::new(),
            slots: HashMap::new(),
            accumulators: Vec::new(),
        })
    }

    /// Output schema of the result tuples.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn group_by(&self) -> Option<usize> {
        self.group_by
    }

    pub fn agg_field(&self) -> usize {
        self.agg_field
    }

    pub fn op(&self) -> AggregateOp {
        self.op
    }

    /// Folds one tuple into its group.
    pub fn merge_tuple(&mut self, tuple: &Tuple) -> Result<()> {
        let key = match self.group_by {
            Some(g) => Some(tuple.value(g).cloned().ok_or(DbError::InvalidField(g))?),
            None => None,
        };
        let value = tuple
            .value(self.agg_field)
            .ok_or(DbError::InvalidField(self.agg_field))?
            .as_int();

        let slot = match self.slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.accumulators.len();
                self.slots.insert(key.clone(), slot);
                self.keys.push(key);
                self.accumulators.push(Accumulator::new());
                slot
            }
        };
        self.accumulators[slot].add(value);
        Ok(())
    }

    /// Returns one result tuple per group.
    pub fn results(&self) -> Result<Vec<Tuple>> {
        self.keys
            .iter()
            .zip(&self.accumulators)
            .map(|(key, acc)| {
                let mut values = Vec::with_capacity(2);
                if let Some(key) = key {
                    values.push(key.clone());
                }
                values.push(Value::Integer(acc.result(self.op)?));
                Tuple::new(Arc::clone(&self.schema), values)
            })
            .collect()
    }

    /// Forgets every group.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.slots.clear();
        self.accumulators.clear();
    }
}
