use std::fmt;

use crate::tuple::{Tuple, Value};

/// Comparison operators usable in predicates and selectivity estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateOp {
    Equals,
    GreaterThan,
    LessThan,
    LessThanOrEq,
    GreaterThanOrEq,
    /// Substring containment on strings, equality on integers
    Like,
    NotEquals,
}

impl PredicateOp {
    /// Applies `left op right`. Values of different types never match.
    pub fn apply(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Integer(_), Value::Integer(_)) | (Value::String(_), Value::String(_)) => {}
            _ => return false,
        }

        match self {
            PredicateOp::Equals => left == right,
            PredicateOp::NotEquals => left != right,
            PredicateOp::GreaterThan => left > right,
            PredicateOp::LessThan => left < right,
            PredicateOp::LessThanOrEq => left <= right,
            PredicateOp::GreaterThanOrEq => left >= right,
            PredicateOp::Like => match (left, right) {
                (Value::String(l), Value::String(r)) => l.contains(r.as_str()),
                _ => left == right,
            },
        }
    }
}

impl fmt::Display for PredicateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PredicateOp::Equals => "=",
            PredicateOp::GreaterThan => ">",
            PredicateOp::LessThan => "<",
            PredicateOp::LessThanOrEq => "<=",
            PredicateOp::GreaterThanOrEq => ">=",
            PredicateOp::Like => "LIKE",
            PredicateOp::NotEquals => "<>",
        };
        write!(f, "{}", s)
    }
}

/// Compares one field of a tuple against a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    field: usize,
    op: PredicateOp,
    operand: Value,
}

impl Predicate {
    pub fn new(field: usize, op: PredicateOp, operand: impl Into<Value>) -> Self {
        Self {
            field,
            op,
            operand: operand.into(),
        }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> PredicateOp {
        self.op
    }

    pub fn operand(&self) -> &Value {
        &self.operand
    }

    /// Returns true if `tuple[field] op operand` holds.
    pub fn filter(&self, tuple: &Tuple) -> bool {
        tuple
            .value(self.field)
            .is_some_and(|value| self.op.apply(value, &self.operand))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}

/// Compares a field of one tuple against a field of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPredicate {
    left_field: usize,
    op: PredicateOp,
    right_field: usize,
}

impl JoinPredicate {
    pub fn new(left_field: usize, op: PredicateOp, right_field: usize) -> Self {
        Self {
            left_field,
            op,
            right_field,
        }
    }

    pub fn left_field(&self) -> usize {
        self.left_field
    }

    pub fn right_field(&self) -> usize {
        self.right_field
    }

    pub fn op(&self) -> PredicateOp {
        self.op
    }

    /// Returns true if `left[left_field] op right[right_field]` holds.
    pub fn filter(&self, left: &Tuple, right: &Tuple) -> bool {
        match (left.value(self.left_field), right.value(self.right_field)) {
            (Some(l), Some(r)) => self.op.apply(l, r),
            _ => false,
        }
    }
}
