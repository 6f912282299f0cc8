//! Errors reported by table operations

use thiserror::Error;

/// Errors returned by the fallible table operations.
///
/// A duplicate insert or the removal of an absent key is not an error: those report
/// `false` and `0` respectively.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// A bucket index at or past the bucket count was requested.
    #[error("bucket index {index} is out of range for {bucket_count} buckets")]
    OutOfRange {
        /// The requested bucket index
        index: usize,
        /// The bucket count at the time of the request
        bucket_count: usize,
    },
    /// A setter was given a value outside its accepted range.
    #[error("invalid {name}: {value}")]
    InvalidArgument {
        /// Name of the rejected parameter
        name: &'static str,
        /// The rejected value
        value: f64,
    },
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;
