mod common;

use common::{init_tracing, iv, make_test_intervals, rotations, Tree};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Every query over every offset of interest, as a list of result trees.
fn query_matrix(tree: &Tree) -> Vec<Tree> {
    let mut results = Vec::new();
    for offset in -1..=31 {
        results.push(tree.find_intervals_starting_at_offset(&offset));
        results.push(tree.find_intervals_stopping_at_offset(&offset));
        results.push(tree.find_intervals_starting_or_stopping_at_offset(&offset));
        results.push(tree.find_intervals_overlapping_offset(&offset));
        results.push(tree.find_intervals_starting_before_offset(&offset));
        results.push(tree.find_intervals_starting_after_offset(&offset));
        results.push(tree.find_intervals_stopping_before_offset(&offset));
        results.push(tree.find_intervals_stopping_after_offset(&offset));
        for width in [1, 4, 11] {
            let hi = offset + width;
            results.push(tree.find_intervals_overlapping_range(&offset, &hi));
            results.push(tree.find_intervals_starting_within_range(&offset, &hi));
            results.push(tree.find_intervals_stopping_within_range(&offset, &hi));
        }
    }
    results
}

#[test]
fn rotations_build_equal_trees() {
    init_tracing();
    let reference = Tree::new(make_test_intervals());
    let expected = query_matrix(&reference);

    for rotated in rotations(&make_test_intervals()) {
        let tree = Tree::new(rotated);
        assert_eq!(tree, reference);
        assert_eq!(query_matrix(&tree), expected);
    }
}

#[test]
fn rotations_start_offset_queries() {
    for rotated in rotations(&make_test_intervals()) {
        let tree = Tree::new(rotated);
        for (offset, expected) in [
            (0, vec!["a"]),
            (9, vec![]),
            (14, vec![]),
            (19, vec!["h"]),
            (26, vec!["j"]),
            (30, vec![]),
        ] {
            let names: Vec<_> = tree
                .find_intervals_starting_at_offset(&offset)
                .iter()
                .map(|interval| *interval.payload())
                .collect();
            assert_eq!(names, expected, "offset {}", offset);
        }
    }
}

#[test]
fn shuffled_orders_build_equal_trees() {
    let reference = Tree::new(make_test_intervals());
    let expected = query_matrix(&reference);

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut intervals = make_test_intervals();
    for _ in 0..64 {
        intervals.shuffle(&mut rng);
        let tree = Tree::new(intervals.clone());
        assert_eq!(tree, reference);
        assert_eq!(query_matrix(&tree), expected);
    }
}

#[test]
fn incremental_insertion_matches_bulk_construction() {
    let reference = Tree::new(make_test_intervals());
    let expected = query_matrix(&reference);

    for rotated in rotations(&make_test_intervals()) {
        let mut tree = Tree::default();
        for interval in rotated {
            assert!(tree.insert(interval));
        }
        assert_eq!(tree, reference);
        assert_eq!(query_matrix(&tree), expected);
    }
}

#[test]
fn mixed_insert_and_remove_matches_bulk_construction() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut intervals = make_test_intervals();
    intervals.shuffle(&mut rng);

    let (kept, dropped) = intervals.split_at(6);
    let mut tree = Tree::new(dropped.to_vec());
    tree.extend(kept.iter().cloned());
    for interval in dropped {
        assert!(tree.remove(interval));
    }

    let reference = Tree::new(kept.to_vec());
    assert_eq!(tree, reference);
    assert_eq!(query_matrix(&tree), query_matrix(&reference));
}

#[test]
fn rotations_iterate_shared_spans_identically() {
    let intervals = vec![
        iv(0, 3, "z"),
        iv(0, 3, "a"),
        iv(0, 3, "m"),
        iv(2, 2, "tick"),
        iv(2, 2, "tock"),
        iv(5, 13, "b"),
    ];
    let reference = Tree::new(intervals.clone());
    let expected: Vec<_> = reference.iter().cloned().collect();
    let starts_at_zero = vec!["a", "m", "z"];

    for rotated in rotations(&intervals) {
        let tree = Tree::new(rotated);
        assert_eq!(tree.iter().cloned().collect::<Vec<_>>(), expected);
        assert_eq!(format!("{:?}", tree), format!("{:?}", reference));

        let names: Vec<_> = tree
            .find_intervals_starting_at_offset(&0)
            .iter()
            .map(|interval| *interval.payload())
            .collect();
        assert_eq!(names, starts_at_zero);
    }
}
