use std::cmp::Ordering;
use std::fmt;

use crate::interval::Interval;

/// Total order over endpoints. Validated intervals never hold endpoints
/// without an order, so the fallback is unreachable for stored values.
pub(crate) fn cmp_endpoints<K: PartialOrd>(a: &K, b: &K) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Bucket order: by span, then by payload.
pub(crate) fn cmp_bucket<K, V>(a: &Interval<K, V>, b: &Interval<K, V>) -> Ordering
where
    K: PartialOrd,
    V: Ord,
{
    cmp_endpoints(a.start(), b.start())
        .then_with(|| cmp_endpoints(a.stop(), b.stop()))
        .then_with(|| a.payload().cmp(b.payload()))
}

/// Which part of a node an interval belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// `stop <= center`, excluding a zero-length interval at `center`.
    Left,
    /// `start <= center < stop`, or `start == stop == center`.
    Center,
    /// `start > center`.
    Right,
}

pub(crate) fn place<K: PartialOrd, V>(interval: &Interval<K, V>, center: &K) -> Placement {
    match (
        cmp_endpoints(interval.start(), center),
        cmp_endpoints(interval.stop(), center),
    ) {
        (Ordering::Greater, _) => Placement::Right,
        (_, Ordering::Greater) => Placement::Center,
        (Ordering::Equal, Ordering::Equal) => Placement::Center,
        _ => Placement::Left,
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub center: K,
    pub intervals: Vec<Interval<K, V>>, // Sorted by (start, stop, payload).
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub low: K,  // Min start-point in the subtree.
    pub high: K, // Max stop-point in the subtree.
}

impl<K, V> fmt::Display for Node<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "center {} ({}..{})", self.center, self.low, self.high)?;
        for interval in &self.intervals {
            write!(f, " {}", interval)?;
        }
        Ok(())
    }
}

impl<K, V> Node<K, V> {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// A node with nothing left to hold.
    pub fn is_vacant(&self) -> bool {
        self.intervals.is_empty() && self.is_leaf()
    }

    pub fn detach(&mut self, child: usize) {
        if self.left == Some(child) {
            self.left = None;
        }
        if self.right == Some(child) {
            self.right = None;
        }
    }
}

impl<K, V> Node<K, V>
where
    K: PartialOrd + Clone,
    V: Ord,
{
    /// Builds a childless node. Identical intervals are stored once.
    pub fn new(center: K, mut intervals: Vec<Interval<K, V>>) -> Node<K, V> {
        intervals.sort_by(cmp_bucket);
        intervals.dedup_by(|a, b| cmp_bucket(a, b) == Ordering::Equal);
        debug_assert!(intervals
            .iter()
            .all(|interval| place(interval, &center) == Placement::Center));

        let mut node = Node {
            low: center.clone(),
            high: center.clone(),
            center,
            intervals,
            left: None,
            right: None,
        };
        node.refresh([]);
        node
    }

    pub fn place(&self, interval: &Interval<K, V>) -> Placement {
        place(interval, &self.center)
    }

    /// Locates `interval` in the center bucket: `Ok` with its index, or `Err`
    /// with the index that keeps the bucket sorted.
    pub fn position(&self, interval: &Interval<K, V>) -> Result<usize, usize> {
        self.intervals.binary_search_by(|stored| cmp_bucket(stored, interval))
    }

    pub fn maybe_widen(&mut self, start: &K, stop: &K) {
        if *start < self.low {
            self.low = start.clone();
        }
        if *stop > self.high {
            self.high = stop.clone();
        }
    }

    /// Recomputes `low`/`high` from the bucket and the given child bounds.
    /// A node holding nothing keeps its previous bounds.
    pub fn refresh<I>(&mut self, children: I)
    where
        I: IntoIterator<Item = (K, K)>,
    {
        let mut bounds: Option<(K, K)> = None;
        let spans = self
            .intervals
            .iter()
            .map(|i| (i.start().clone(), i.stop().clone()))
            .chain(children);

        for (start, stop) in spans {
            bounds = Some(match bounds {
                None => (start, stop),
                Some((low, high)) => (
                    if start < low { start } else { low },
                    if stop > high { stop } else { high },
                ),
            });
        }

        if let Some((low, high)) = bounds {
            self.low = low;
            self.high = high;
        }
    }
}
