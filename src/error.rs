use thiserror::Error;

/// An error raised while validating an interval or building a tree.
///
/// Endpoints are rendered with their [`Debug`] representation at the point
/// of failure, so the error type does not carry the endpoint type around.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    /// The interval starts after it stops.
    #[error("interval start {start} is greater than its stop {stop}")]
    InvertedBounds { start: String, stop: String },

    /// Two endpoints have no defined order relative to each other (e.g. NaN).
    #[error("endpoints {left} and {right} cannot be compared")]
    IncomparableBounds { left: String, right: String },

    /// A record handed to [`crate::IntervalTree::from_records`] was rejected.
    #[error("invalid interval record at position {index}: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: Box<IntervalError>,
    },
}

impl IntervalError {
    pub(crate) fn incomparable<K: std::fmt::Debug>(left: &K, right: &K) -> Self {
        IntervalError::IncomparableBounds {
            left: format!("{:?}", left),
            right: format!("{:?}", right),
        }
    }
}
