//! Result type alias for sfkit operations

use crate::Error;

/// Result type alias for sfkit operations
pub type Result<T> = std::result::Result<T, Error>;
