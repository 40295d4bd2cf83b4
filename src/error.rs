//! Error type shared by construction and insertion.

use core::fmt;

/// Failures reported by [`ChainedHashMap`](crate::ChainedHashMap).
///
/// Lookups and removals never fail; a miss is reported as `None`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TableError {
    /// Construction parameters were rejected; no table was created.
    InvalidArgument { reason: &'static str },
    /// Inserting a new key would push the size past the configured maximum.
    /// The table is left unchanged, but it cannot accept further new keys.
    CapacityExceeded { max: usize },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            TableError::CapacityExceeded { max } => {
                write!(f, "capacity exceeded: table cannot hold more than {max} entries")
            }
        }
    }
}

impl std::error::Error for TableError {}
