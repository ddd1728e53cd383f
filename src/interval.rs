use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::IntervalError;

/// A half-open interval `[start, stop)` carrying an opaque payload.
///
/// Intervals are validated on construction and cannot be modified afterwards.
/// A zero-length interval (`start == stop`) is allowed and stands for an
/// instantaneous event at `start`.
///
/// Two intervals are equal iff their start, stop and payload are all equal.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Interval<K, V> {
    start: K,
    stop: K,
    payload: V,
}

impl<K, V> Interval<K, V> {
    /// Creates an interval, rejecting `start > stop` and endpoints without a
    /// defined order (such as `f64::NAN`).
    ///
    /// ```
    /// use centered_interval_tree::{Interval, IntervalError};
    ///
    /// let note = Interval::new(0, 4, "c#").unwrap();
    /// assert_eq!((*note.start(), *note.stop()), (0, 4));
    ///
    /// assert!(matches!(
    ///     Interval::new(4, 0, "c#"),
    ///     Err(IntervalError::InvertedBounds { .. })
    /// ));
    /// ```
    pub fn new(start: K, stop: K, payload: V) -> Result<Self, IntervalError>
    where
        K: PartialOrd + fmt::Debug,
    {
        match start.partial_cmp(&stop) {
            Some(Ordering::Greater) => Err(IntervalError::InvertedBounds {
                start: format!("{:?}", start),
                stop: format!("{:?}", stop),
            }),
            Some(_) => Ok(Interval {
                start,
                stop,
                payload,
            }),
            None => Err(IntervalError::incomparable(&start, &stop)),
        }
    }

    pub fn start(&self) -> &K {
        &self.start
    }

    pub fn stop(&self) -> &K {
        &self.stop
    }

    pub fn payload(&self) -> &V {
        &self.payload
    }

    pub fn into_parts(self) -> (K, K, V) {
        (self.start, self.stop, self.payload)
    }

    /// Whether the interval has zero length.
    pub fn is_instant(&self) -> bool
    where
        K: PartialEq,
    {
        self.start == self.stop
    }

    /// Point containment: `start <= offset < stop`, or, for a zero-length
    /// interval, `offset == start`.
    pub fn contains_offset(&self, offset: &K) -> bool
    where
        K: PartialOrd,
    {
        if self.is_instant() {
            self.start == *offset
        } else {
            self.start <= *offset && *offset < self.stop
        }
    }

    /// Whether the interval intersects the half-open range `[lo, hi)`.
    ///
    /// A zero-length range behaves like [`Interval::contains_offset`]; a
    /// zero-length interval matches when its point lies inside the range.
    /// An inverted range never matches.
    pub fn overlaps_range(&self, lo: &K, hi: &K) -> bool
    where
        K: PartialOrd,
    {
        if lo == hi {
            self.contains_offset(lo)
        } else if lo.partial_cmp(hi) != Some(Ordering::Less) {
            false
        } else if self.is_instant() {
            *lo <= self.start && self.start < *hi
        } else {
            self.start < *hi && *lo < self.stop
        }
    }
}

impl<K, V> TryFrom<(K, K, V)> for Interval<K, V>
where
    K: PartialOrd + fmt::Debug,
{
    type Error = IntervalError;

    fn try_from((start, stop, payload): (K, K, V)) -> Result<Self, Self::Error> {
        Interval::new(start, stop, payload)
    }
}

impl<K, V> fmt::Display for Interval<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}): {}", self.start, self.stop, self.payload)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawInterval<K, V> {
    start: K,
    stop: K,
    #[serde(alias = "name")]
    payload: V,
}

#[cfg(feature = "serde")]
impl<'de, K, V> Deserialize<'de> for Interval<K, V>
where
    K: Deserialize<'de> + PartialOrd + fmt::Debug,
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawInterval::deserialize(deserializer)?;
        Interval::new(raw.start, raw.stop, raw.payload).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        let err = Interval::new(5, 2, ()).unwrap_err();
        assert_eq!(
            err,
            IntervalError::InvertedBounds {
                start: "5".into(),
                stop: "2".into()
            }
        );
    }

    #[test]
    fn rejects_nan() {
        assert!(matches!(
            Interval::new(f64::NAN, 1.0, ()),
            Err(IntervalError::IncomparableBounds { .. })
        ));
        assert!(matches!(
            Interval::new(0.0, f64::NAN, ()),
            Err(IntervalError::IncomparableBounds { .. })
        ));
    }

    #[test]
    fn accepts_zero_length() {
        let i = Interval::new(3, 3, "tick").unwrap();
        assert!(i.is_instant());
        assert!(i.contains_offset(&3));
        assert!(!i.contains_offset(&4));
        assert!(!i.contains_offset(&2));
    }

    #[test]
    fn contains_offset_is_half_open() {
        let i = Interval::new(0, 10, ()).unwrap();
        assert!(i.contains_offset(&0));
        assert!(i.contains_offset(&9));
        assert!(!i.contains_offset(&10));
        assert!(!i.contains_offset(&-1));
    }

    #[test]
    fn overlaps_range_edges() {
        let i = Interval::new(5, 10, ()).unwrap();
        assert!(i.overlaps_range(&0, &6));
        assert!(i.overlaps_range(&9, &20));
        assert!(i.overlaps_range(&6, &7));
        assert!(!i.overlaps_range(&0, &5));
        assert!(!i.overlaps_range(&10, &20));
        // Zero-length query behaves like a point.
        assert!(i.overlaps_range(&5, &5));
        assert!(!i.overlaps_range(&10, &10));
        // Inverted.
        assert!(!i.overlaps_range(&8, &6));

        let tick = Interval::new(5, 5, ()).unwrap();
        assert!(tick.overlaps_range(&5, &6));
        assert!(tick.overlaps_range(&0, &6));
        assert!(!tick.overlaps_range(&0, &5));
        assert!(tick.overlaps_range(&5, &5));
    }

    #[test]
    fn equality_includes_payload() {
        let a = Interval::new(0, 1, "a").unwrap();
        let b = Interval::new(0, 1, "b").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, Interval::try_from((0, 1, "a")).unwrap());
    }

    #[test]
    fn display() {
        let i = Interval::new(1, 5, "value").unwrap();
        assert_eq!(i.to_string(), "[1, 5): value");
        assert_eq!(i.into_parts(), (1, 5, "value"));
    }
}
