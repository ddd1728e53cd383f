#![allow(dead_code)]

use centered_interval_tree::{Interval, IntervalTree};
use tracing_subscriber::EnvFilter;

pub type Tree = IntervalTree<i32, &'static str>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn iv(start: i32, stop: i32, name: &'static str) -> Interval<i32, &'static str> {
    Interval::new(start, stop, name).unwrap()
}

/// Ten named blocks spread over `[0, 30)`: two nested clusters, a pair of
/// adjacent blocks at 19 and a tail at 25.
pub fn make_test_intervals() -> Vec<Interval<i32, &'static str>> {
    vec![
        iv(0, 3, "a"),
        iv(5, 13, "b"),
        iv(6, 10, "c"),
        iv(8, 9, "d"),
        iv(15, 23, "e"),
        iv(16, 21, "f"),
        iv(17, 19, "g"),
        iv(19, 20, "h"),
        iv(25, 30, "i"),
        iv(26, 29, "j"),
    ]
}

/// Builds the tree holding exactly the fixture intervals named in `names`.
pub fn named(names: &[&str]) -> Tree {
    make_test_intervals()
        .into_iter()
        .filter(|interval| names.contains(interval.payload()))
        .collect()
}

/// Every cyclic rotation of `intervals`.
pub fn rotations<T: Clone>(intervals: &[T]) -> Vec<Vec<T>> {
    (0..intervals.len().max(1))
        .map(|shift| {
            let mut rotated = intervals.to_vec();
            rotated.rotate_left(shift.min(intervals.len()));
            rotated
        })
        .collect()
}
