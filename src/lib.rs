//! Implementation of a centered interval tree ([`interval_tree::IntervalTree`]) over
//! half-open intervals `[start, stop)` carrying arbitrary payloads. Every node keys
//! its intervals by a center point chosen as the median of their endpoints, so the
//! tree stays balanced however the intervals are ordered on the way in. It provides
//! point and range overlap queries, lookups of intervals starting or stopping at an
//! exact offset, and set equality that ignores how either tree was built.
//!
//! Any endpoint type satisfying [`PartialOrd`] can be stored, as long as values that
//! pass [`Interval::new`] are mutually comparable (integers, non-NaN floats, rationals).
//! Payloads must be [`Ord`]: intervals sharing a span are kept ordered by payload, so
//! iteration follows the contents of a tree rather than the order it was filled in.

/// Validated half-open intervals.
pub mod interval;
/// A centered interval tree with arena-allocated nodes.
pub mod interval_tree;
mod error;
mod node;

pub use error::IntervalError;
pub use interval::Interval;
pub use interval_tree::IntervalTree;
