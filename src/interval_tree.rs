use std::fmt;
use std::slice;
use std::vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, trace};

use crate::error::IntervalError;
use crate::interval::Interval;
use crate::node::{cmp_bucket, cmp_endpoints, place, Node, Placement};

/// Number of `log2(len)` levels an insert may reach before the tree is
/// rebuilt around fresh center points.
pub const HEIGHT_FACTOR: usize = 2;

/// A centered interval tree holding a set of [`Interval`]s.
///
/// Every node stores a center point `c` and the intervals that contain it;
/// intervals entirely left of `c` go to the left subtree, intervals starting
/// after `c` go to the right subtree. Nodes live in an arena and refer to
/// their children by index. Each node also tracks the lowest start and
/// highest stop of its subtree, which lets queries skip whole subtrees.
///
/// Center points are the lower median of the distinct endpoints being
/// bucketed, and each node keeps its intervals sorted by start, stop and
/// payload. A bulk-built tree therefore only depends on its contents, so
/// iteration, `Debug` and query results never depend on the order the
/// intervals arrived in. Equality is set equality and holds across
/// incrementally built trees too.
///
/// ```
/// use centered_interval_tree::{Interval, IntervalTree};
///
/// let tree: IntervalTree<i32, &str> =
///     IntervalTree::from_records(vec![(0, 3, "a"), (2, 8, "b"), (8, 9, "c")])?;
///
/// let hits = tree.find_intervals_overlapping_offset(&2);
/// assert_eq!(hits.len(), 2);
/// assert!(hits.contains(&Interval::new(0, 3, "a")?));
/// assert!(tree.find_intervals_starting_at_offset(&5).is_empty());
/// # Ok::<(), centered_interval_tree::IntervalError>(())
/// ```
#[derive(Clone)]
pub struct IntervalTree<K, V> {
    nodes: Vec<Node<K, V>>,
    root: Option<usize>,
    len: usize,
    // Unlinked arena slots, left behind by removals.
    vacant: usize,
}

impl<K, V> Default for IntervalTree<K, V> {
    fn default() -> Self {
        IntervalTree {
            nodes: Vec::new(),
            root: None,
            len: 0,
            vacant: 0,
        }
    }
}

impl<K, V> IntervalTree<K, V> {
    /// Number of distinct intervals in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Iterates over the intervals from the leftmost node to the rightmost.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            nodes: &self.nodes,
            stack: Vec::new(),
            bucket: [].iter(),
            remaining: self.len,
        };
        iter.descend(self.root);
        iter
    }

    /// Consumes the tree, returning its intervals in no particular order.
    pub fn into_vec(self) -> Vec<Interval<K, V>> {
        self.nodes.into_iter().flat_map(|node| node.intervals).collect()
    }

    /// Height of the tree; zero when empty.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(usize, usize)> = self.root.map(|root| (root, 1)).into_iter().collect();
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            let node = &self.nodes[index];
            stack.extend(node.left.map(|child| (child, depth + 1)));
            stack.extend(node.right.map(|child| (child, depth + 1)));
        }
        deepest
    }

    /// Smallest start among all intervals.
    pub fn earliest_start(&self) -> Option<&K> {
        self.root.map(|root| &self.nodes[root].low)
    }

    /// Largest stop among all intervals.
    pub fn latest_stop(&self) -> Option<&K> {
        self.root.map(|root| &self.nodes[root].high)
    }
}

impl<K, V> IntervalTree<K, V>
where
    K: PartialOrd,
    V: PartialEq,
{
    /// Whether an interval equal to `interval` (bounds and payload) is stored.
    pub fn contains(&self, interval: &Interval<K, V>) -> bool {
        let mut current = self.root;
        while let Some(index) = current {
            let node = &self.nodes[index];
            current = match place(interval, &node.center) {
                Placement::Left => node.left,
                Placement::Right => node.right,
                Placement::Center => {
                    return node
                        .intervals
                        .iter()
                        .any(|stored| stored == interval)
                }
            };
        }
        false
    }

    /// Collects the intervals satisfying `matches`, visiting only the
    /// subtrees whose bounds pass `within` and the children `toward` selects
    /// from a node's center point (`(left, right)`).
    fn select<W, T, M>(&self, within: W, toward: T, matches: M) -> Vec<&Interval<K, V>>
    where
        W: Fn(&K, &K) -> bool,
        T: Fn(&K) -> (bool, bool),
        M: Fn(&Interval<K, V>) -> bool,
    {
        let mut found = Vec::new();
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !within(&node.low, &node.high) {
                continue;
            }
            found.extend(node.intervals.iter().filter(|interval| matches(*interval)));

            let (left, right) = toward(&node.center);
            if right {
                stack.extend(node.right);
            }
            if left {
                stack.extend(node.left);
            }
        }
        found
    }
}

impl<K, V> IntervalTree<K, V>
where
    K: PartialOrd + Clone,
    V: Ord,
{
    /// Builds a balanced tree holding `intervals` as a set.
    ///
    /// Identical intervals are stored once. An empty input gives an empty tree.
    pub fn new<I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = Interval<K, V>>,
    {
        let tree = Self::build(intervals.into_iter().collect());
        debug!(
            intervals = tree.len,
            nodes = tree.nodes.len(),
            depth = tree.depth(),
            "built interval tree"
        );
        tree
    }

    /// Builds a tree from raw records such as `(start, stop, payload)`
    /// tuples. The first record that fails validation aborts the whole build.
    ///
    /// ```
    /// use centered_interval_tree::{IntervalError, IntervalTree};
    ///
    /// let err = IntervalTree::<i32, &str>::from_records(vec![(0, 3, "a"), (9, 4, "b")])
    ///     .unwrap_err();
    /// assert!(matches!(err, IntervalError::InvalidRecord { index: 1, .. }));
    /// ```
    pub fn from_records<I, T>(records: I) -> Result<Self, IntervalError>
    where
        I: IntoIterator<Item = T>,
        T: TryInto<Interval<K, V>, Error = IntervalError>,
    {
        let intervals = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                record
                    .try_into()
                    .map_err(|source| IntervalError::InvalidRecord {
                        index,
                        source: Box::new(source),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(intervals))
    }

    fn build(intervals: Vec<Interval<K, V>>) -> Self {
        let mut tree = Self::default();
        tree.root = tree.build_subtree(intervals);
        tree.len = tree.nodes.iter().map(|node| node.intervals.len()).sum();
        tree
    }

    fn build_subtree(&mut self, intervals: Vec<Interval<K, V>>) -> Option<usize> {
        let center = lower_median(&intervals)?;

        let mut left = Vec::new();
        let mut bucket = Vec::new();
        let mut right = Vec::new();
        for interval in intervals {
            match place(&interval, &center) {
                Placement::Left => left.push(interval),
                Placement::Center => bucket.push(interval),
                Placement::Right => right.push(interval),
            }
        }

        let index = self.nodes.len();
        self.nodes.push(Node::new(center, bucket));
        let left = self.build_subtree(left);
        let right = self.build_subtree(right);

        let node = &mut self.nodes[index];
        node.left = left;
        node.right = right;
        self.refresh_bounds(index);
        Some(index)
    }

    fn refresh_bounds(&mut self, index: usize) {
        let node = &self.nodes[index];
        let children: Vec<(K, K)> = [node.left, node.right]
            .into_iter()
            .flatten()
            .map(|child| (self.nodes[child].low.clone(), self.nodes[child].high.clone()))
            .collect();
        self.nodes[index].refresh(children);
    }

    fn push_leaf(&mut self, interval: Interval<K, V>) -> usize {
        let index = self.nodes.len();
        trace!(index, "attaching leaf");
        self.nodes.push(Node::new(interval.start().clone(), vec![interval]));
        index
    }

    fn rebuild(&mut self) {
        let intervals = std::mem::take(self).into_vec();
        *self = Self::build(intervals);
    }

    /// Inserts `interval`, returning `false` if an identical one is already
    /// stored.
    ///
    /// The tree is rebuilt when the insert leaves it deeper than
    /// `HEIGHT_FACTOR * (log2(len) + 1) + 1`.
    pub fn insert(&mut self, interval: Interval<K, V>) -> bool {
        let (start, stop) = (interval.start().clone(), interval.stop().clone());

        let Some(mut index) = self.root else {
            self.root = Some(self.push_leaf(interval));
            self.len = 1;
            return true;
        };

        let mut path = vec![index];
        loop {
            let node = &self.nodes[index];
            let next = match node.place(&interval) {
                Placement::Center => match node.position(&interval) {
                    Ok(_) => return false,
                    Err(at) => {
                        self.nodes[index].intervals.insert(at, interval);
                        break;
                    }
                },
                Placement::Left => node.left.ok_or(Placement::Left),
                Placement::Right => node.right.ok_or(Placement::Right),
            };

            match next {
                Ok(child) => {
                    index = child;
                    path.push(child);
                }
                Err(side) => {
                    let leaf = self.push_leaf(interval);
                    let node = &mut self.nodes[index];
                    if side == Placement::Left {
                        node.left = Some(leaf);
                    } else {
                        node.right = Some(leaf);
                    }
                    path.push(leaf);
                    break;
                }
            }
        }

        for &index in &path {
            self.nodes[index].maybe_widen(&start, &stop);
        }
        self.len += 1;

        let limit = height_limit(self.len);
        if path.len() > limit {
            debug!(depth = path.len(), limit, "rebalancing interval tree");
            self.rebuild();
        }
        true
    }

    /// Removes `interval`, returning whether it was present.
    pub fn remove(&mut self, interval: &Interval<K, V>) -> bool {
        let mut path = Vec::new();
        let mut current = self.root;
        let mut found = false;
        while let Some(index) = current {
            path.push(index);
            let node = &mut self.nodes[index];
            current = match node.place(interval) {
                Placement::Left => node.left,
                Placement::Right => node.right,
                Placement::Center => {
                    if let Ok(at) = node.position(interval) {
                        node.intervals.remove(at);
                        found = true;
                    }
                    None
                }
            };
        }
        if !found {
            return false;
        }
        self.len -= 1;

        // Unlink emptied nodes bottom-up and tighten the bounds of the rest.
        for depth in (0..path.len()).rev() {
            let index = path[depth];
            if self.nodes[index].is_vacant() {
                match depth.checked_sub(1) {
                    Some(parent) => self.nodes[path[parent]].detach(index),
                    None => self.root = None,
                }
                self.vacant += 1;
            } else {
                self.refresh_bounds(index);
            }
        }

        if self.len == 0 {
            self.clear();
        } else if self.vacant > self.nodes.len() - self.vacant {
            debug!(
                vacant = self.vacant,
                nodes = self.nodes.len(),
                "compacting interval tree"
            );
            self.rebuild();
        }
        true
    }
}

impl<K, V> IntervalTree<K, V>
where
    K: PartialOrd + Clone,
    V: Ord + Clone,
{
    fn subset(found: Vec<&Interval<K, V>>) -> Self {
        Self::build(found.into_iter().cloned().collect())
    }

    /// Intervals with `start == offset`.
    pub fn find_intervals_starting_at_offset(&self, offset: &K) -> Self {
        Self::subset(self.select(
            |low, high| low <= offset && offset <= high,
            |center| (offset < center, offset > center),
            |interval| interval.start() == offset,
        ))
    }

    /// Intervals with `stop == offset`.
    pub fn find_intervals_stopping_at_offset(&self, offset: &K) -> Self {
        Self::subset(self.select(
            |low, high| low <= offset && offset <= high,
            |center| (offset <= center, offset > center),
            |interval| interval.stop() == offset,
        ))
    }

    /// Intervals with `start == offset` or `stop == offset`.
    pub fn find_intervals_starting_or_stopping_at_offset(&self, offset: &K) -> Self {
        Self::subset(self.select(
            |low, high| low <= offset && offset <= high,
            |center| (offset <= center, offset > center),
            |interval| interval.start() == offset || interval.stop() == offset,
        ))
    }

    /// Intervals containing `offset` (see [`Interval::contains_offset`]).
    pub fn find_intervals_overlapping_offset(&self, offset: &K) -> Self {
        Self::subset(self.select(
            |low, high| low <= offset && offset <= high,
            |center| (offset < center, offset > center),
            |interval| interval.contains_offset(offset),
        ))
    }

    /// Intervals intersecting `[lo, hi)` (see [`Interval::overlaps_range`]).
    /// An inverted range yields an empty tree.
    pub fn find_intervals_overlapping_range(&self, lo: &K, hi: &K) -> Self {
        if lo == hi {
            return self.find_intervals_overlapping_offset(lo);
        }
        Self::subset(self.select(
            |low, high| low < hi && lo <= high,
            |center| (lo < center, hi > center),
            |interval| interval.overlaps_range(lo, hi),
        ))
    }

    /// Intervals with `start < offset`.
    pub fn find_intervals_starting_before_offset(&self, offset: &K) -> Self {
        Self::subset(self.select(
            |low, _| low < offset,
            |center| (true, offset > center),
            |interval| interval.start() < offset,
        ))
    }

    /// Intervals with `start > offset`.
    pub fn find_intervals_starting_after_offset(&self, offset: &K) -> Self {
        Self::subset(self.select(
            |_, high| high > offset,
            |center| (offset < center, true),
            |interval| interval.start() > offset,
        ))
    }

    /// Intervals with `stop < offset`.
    pub fn find_intervals_stopping_before_offset(&self, offset: &K) -> Self {
        Self::subset(self.select(
            |low, _| low < offset,
            |center| (true, offset > center),
            |interval| interval.stop() < offset,
        ))
    }

    /// Intervals with `stop > offset`.
    pub fn find_intervals_stopping_after_offset(&self, offset: &K) -> Self {
        Self::subset(self.select(
            |_, high| high > offset,
            |center| (offset < center, true),
            |interval| interval.stop() > offset,
        ))
    }

    /// Intervals with `lo <= start < hi`.
    pub fn find_intervals_starting_within_range(&self, lo: &K, hi: &K) -> Self {
        Self::subset(self.select(
            |low, high| low < hi && lo <= high,
            |center| (lo < center, hi > center),
            |interval| lo <= interval.start() && interval.start() < hi,
        ))
    }

    /// Intervals with `lo <= stop < hi`.
    pub fn find_intervals_stopping_within_range(&self, lo: &K, hi: &K) -> Self {
        Self::subset(self.select(
            |low, high| low < hi && lo <= high,
            |center| (lo <= center, hi > center),
            |interval| lo <= interval.stop() && interval.stop() < hi,
        ))
    }
}

/// Lower median of the distinct endpoints of `intervals`.
fn lower_median<K, V>(intervals: &[Interval<K, V>]) -> Option<K>
where
    K: PartialOrd + Clone,
{
    let mut points: Vec<&K> = intervals
        .iter()
        .flat_map(|interval| [interval.start(), interval.stop()])
        .collect();
    points.sort_by(|a, b| cmp_endpoints(*a, *b));
    points.dedup_by(|a, b| a == b);

    points
        .get(points.len().checked_sub(1)? / 2)
        .map(|&point| point.clone())
}

fn height_limit(len: usize) -> usize {
    HEIGHT_FACTOR * (len.max(1).ilog2() as usize + 1) + 1
}

/// In-order iterator over the intervals of an [`IntervalTree`].
pub struct Iter<'a, K, V> {
    nodes: &'a [Node<K, V>],
    stack: Vec<usize>,
    bucket: slice::Iter<'a, Interval<K, V>>,
    remaining: usize,
}

impl<K, V> Iter<'_, K, V> {
    fn descend(&mut self, mut index: Option<usize>) {
        while let Some(current) = index {
            self.stack.push(current);
            index = self.nodes[current].left;
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Interval<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(interval) = self.bucket.next() {
                self.remaining -= 1;
                return Some(interval);
            }
            let nodes = self.nodes;
            let node = &nodes[self.stack.pop()?];
            self.bucket = node.intervals.iter();
            self.descend(node.right);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a IntervalTree<K, V> {
    type Item = &'a Interval<K, V>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for IntervalTree<K, V> {
    type Item = Interval<K, V>;
    type IntoIter = vec::IntoIter<Interval<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl<K, V> FromIterator<Interval<K, V>> for IntervalTree<K, V>
where
    K: PartialOrd + Clone,
    V: Ord,
{
    fn from_iter<I: IntoIterator<Item = Interval<K, V>>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<K, V> From<Vec<Interval<K, V>>> for IntervalTree<K, V>
where
    K: PartialOrd + Clone,
    V: Ord,
{
    fn from(intervals: Vec<Interval<K, V>>) -> Self {
        Self::new(intervals)
    }
}

impl<K, V> Extend<Interval<K, V>> for IntervalTree<K, V>
where
    K: PartialOrd + Clone,
    V: Ord,
{
    fn extend<I: IntoIterator<Item = Interval<K, V>>>(&mut self, iter: I) {
        for interval in iter {
            self.insert(interval);
        }
    }
}

impl<K, V> IntervalTree<K, V>
where
    K: PartialOrd,
    V: Ord,
{
    /// The intervals sorted by start, stop and payload, whatever the shape
    /// of the tree.
    fn sorted(&self) -> Vec<&Interval<K, V>> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| cmp_bucket(a, b));
        sorted
    }
}

/// Set equality: same intervals, whatever the shape of either tree.
impl<K, V> PartialEq for IntervalTree<K, V>
where
    K: PartialOrd,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|interval| other.contains(interval))
    }
}

impl<K, V> Eq for IntervalTree<K, V>
where
    K: Eq + PartialOrd,
    V: Eq,
{
}

impl<K, V> fmt::Debug for IntervalTree<K, V>
where
    K: PartialOrd + fmt::Debug,
    V: Ord + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.sorted()).finish()
    }
}

impl<K, V> fmt::Display for IntervalTree<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.root {
            Some(root) => self.write_node(f, root, 0),
            None => write!(f, "empty"),
        }
    }
}

impl<K, V> IntervalTree<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn write_node(&self, f: &mut fmt::Formatter, index: usize, depth: usize) -> fmt::Result {
        let node = &self.nodes[index];
        writeln!(f, "{:indent$}{}", "", node, indent = depth * 2)?;
        if let Some(left) = node.left {
            self.write_node(f, left, depth + 1)?;
        }
        if let Some(right) = node.right {
            self.write_node(f, right, depth + 1)?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl<K, V> Serialize for IntervalTree<K, V>
where
    K: Serialize + PartialOrd,
    V: Serialize + Ord,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.sorted())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> Deserialize<'de> for IntervalTree<K, V>
where
    K: Deserialize<'de> + PartialOrd + Clone + fmt::Debug,
    V: Deserialize<'de> + Ord,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<Interval<K, V>>::deserialize(deserializer).map(Self::new)
    }
}
