use std::fmt;

use crate::execution::PredicateOp;

/// Fixed-width histogram over one integer column.
///
/// The range `[min, max]` is split into `buckets` buckets of width
/// `ceil((max - min + 1) / buckets)`; each bucket counts the values that fell
/// into it. Memory use is independent of the number of values added.
#[derive(Debug, Clone)]
pub struct IntHistogram {
    buckets: Vec<u64>,
    min: i32,
    max: i32,
    width: i64,
    total: u64,
}

impl IntHistogram {
    /// Creates an empty histogram; `buckets` is raised to at least 1 and the
    /// bounds are swapped if given out of order.
    pub fn new(buckets: usize, min: i32, max: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let buckets = buckets.max(1);
        let range = max as i64 - min as i64 + 1;
        let width = ((range + buckets as i64 - 1) / buckets as i64).max(1);
        Self {
            buckets: vec![0; buckets],
            min,
            max,
            width,
            total: 0,
        }
    }

    fn bucket_of(&self, v: i32) -> usize {
        let clamped = v.clamp(self.min, self.max);
        let index = (clamped as i64 - self.min as i64) / self.width;
        (index as usize).min(self.buckets.len() - 1)
    }

    /// Records one value. Values outside `[min, max]` count toward the
    /// nearest edge bucket.
    pub fn add_value(&mut self, v: i32) {
        let bucket = self.bucket_of(v);
        self.buckets[bucket] += 1;
        self.total += 1;
    }

    /// Number of values added.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Estimates the fraction of added values `x` for which `x op v` holds.
    pub fn estimate_selectivity(&self, op: PredicateOp, v: i32) -> f64 {
        if self.total == 0 {
            return match op {
                PredicateOp::NotEquals => 1.0,
                _ => 0.0,
            };
        }

        let selectivity = match op {
            PredicateOp::Equals | PredicateOp::Like => self.equals(v),
            PredicateOp::NotEquals => 1.0 - self.equals(v),
            PredicateOp::GreaterThan => self.greater_than(v),
            PredicateOp::LessThan => self.less_than(v),
            PredicateOp::GreaterThanOrEq => self.greater_than(v) + self.equals(v),
            PredicateOp::LessThanOrEq => self.less_than(v) + self.equals(v),
        };
        selectivity.clamp(0.0, 1.0)
    }

    fn equals(&self, v: i32) -> f64 {
        if v < self.min || v > self.max {
            return 0.0;
        }
        let height = self.buckets[self.bucket_of(v)] as f64;
        (height / self.width as f64) / self.total as f64
    }

    fn greater_than(&self, v: i32) -> f64 {
        if v < self.min {
            return 1.0;
        }
        if v >= self.max {
            return 0.0;
        }

        let b = self.bucket_of(v);
        let bucket_right = self.min as i64 + (b as i64 + 1) * self.width - 1;
        let fraction = (bucket_right - v as i64) as f64 / self.width as f64;
        let beyond: u64 = self.buckets[b + 1..].iter().sum();

        (self.buckets[b] as f64 * fraction + beyond as f64) / self.total as f64
    }

    fn less_than(&self, v: i32) -> f64 {
        if v <= self.min {
            return 0.0;
        }
        if v > self.max {
            return 1.0;
        }

        let b = self.bucket_of(v);
        let bucket_left = self.min as i64 + b as i64 * self.width;
        let fraction = (v as i64 - bucket_left) as f64 / self.width as f64;
        let below: u64 = self.buckets[..b].iter().sum();

        (self.buckets[b] as f64 * fraction + below as f64) / self.total as f64
    }

    /// Average selectivity of an equality predicate against a uniformly
    /// chosen value in range.
    pub fn avg_selectivity(&self) -> f64 {
        let range = self.max as i64 - self.min as i64 + 1;
        1.0 / range as f64
    }
}

impl fmt::Display for IntHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, count) in self.buckets.iter().enumerate() {
            let low = self.min as i64 + i as i64 * self.width;
            let high = (low + self.width - 1).min(self.max as i64);
            writeln!(f, "bucket {} [{}, {}]: {}", i, low, high, "|".repeat(*count as usize))?;
        }
        Ok(())
    }
}
