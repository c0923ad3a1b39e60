//! Statistics consumed by query planning.

mod histogram;

pub use histogram::IntHistogram;
