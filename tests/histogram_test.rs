//! Selectivity estimates over randomly generated columns

use heapdb::execution::PredicateOp;
use heapdb::optimizer::IntHistogram;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPS: f64 = 1e-9;

fn random_histogram(rng: &mut StdRng, buckets: usize, min: i32, max: i32, n: usize) -> IntHistogram {
    let mut h = IntHistogram::new(buckets, min, max);
    for _ in 0..n {
        h.add_value(rng.gen_range(min..=max));
    }
    h
}

#[test]
fn test_equal_and_not_equal_are_complements() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..20 {
        let min = rng.gen_range(-500..500);
        let max = min + rng.gen_range(0..2000);
        let buckets = rng.gen_range(1..64);
        let h = random_histogram(&mut rng, buckets, min, max, 1000);

        for _ in 0..50 {
            let v = rng.gen_range(min - 100..=max + 100);
            let eq = h.estimate_selectivity(PredicateOp::Equals, v);
            let ne = h.estimate_selectivity(PredicateOp::NotEquals, v);
            assert!((0.0..=1.0).contains(&eq));
            assert!((eq + ne - 1.0).abs() < EPS, "v={} eq={} ne={}", v, eq, ne);
        }
    }
}

#[test]
fn test_ranges_partition_the_column() {
    let mut rng = StdRng::seed_from_u64(99);
    let h = random_histogram(&mut rng, 16, 0, 999, 5000);

    for v in (0..999).step_by(7) {
        let lt = h.estimate_selectivity(PredicateOp::LessThan, v);
        let eq = h.estimate_selectivity(PredicateOp::Equals, v);
        let gt = h.estimate_selectivity(PredicateOp::GreaterThan, v);
        assert!((lt + eq + gt - 1.0).abs() < EPS, "v={}", v);

        let ge = h.estimate_selectivity(PredicateOp::GreaterThanOrEq, v);
        let le = h.estimate_selectivity(PredicateOp::LessThanOrEq, v);
        assert!((ge - (gt + eq)).abs() < EPS);
        assert!((le - (lt + eq)).abs() < EPS);
    }
}

#[test]
fn test_less_than_is_monotonic() {
    let mut rng = StdRng::seed_from_u64(5);
    let h = random_histogram(&mut rng, 7, -50, 50, 400);

    let mut last = 0.0;
    for v in -60..=60 {
        let lt = h.estimate_selectivity(PredicateOp::LessThan, v);
        assert!(lt + EPS >= last, "v={} {} < {}", v, lt, last);
        last = lt;
    }
    assert_eq!(last, 1.0);
}

#[test]
fn test_estimates_track_actual_counts() {
    let mut rng = StdRng::seed_from_u64(17);
    let values: Vec<i32> = (0..10_000).map(|_| rng.gen_range(0..1000)).collect();
    let mut h = IntHistogram::new(100, 0, 999);
    for &v in &values {
        h.add_value(v);
    }
    assert_eq!(h.total(), 10_000);

    for v in [100, 250, 500, 900] {
        let actual = values.iter().filter(|&&x| x > v).count() as f64 / values.len() as f64;
        let estimate = h.estimate_selectivity(PredicateOp::GreaterThan, v);
        assert!((actual - estimate).abs() < 0.02, "v={} {} vs {}", v, actual, estimate);
    }
}

#[test]
fn test_display_lists_buckets() {
    let mut h = IntHistogram::new(2, 0, 9);
    h.add_value(1);
    h.add_value(2);
    h.add_value(7);
    assert_eq!(h.to_string(), "bucket 0 [0, 4]: ||\nbucket 1 [5, 9]: |\n");
    assert!((h.avg_selectivity() - 0.1).abs() < EPS);
}
