use thiserror::Error;

/// Errors raised while building a [`LiveMetricsFeed`](crate::metrics::LiveMetricsFeed).
///
/// Only construction can fail; a feed that exists is always usable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("invalid feed configuration: {0}")]
    InvalidConfiguration(String),

    #[error("live metrics feed must be created inside a Tokio runtime")]
    NoRuntime,
}
