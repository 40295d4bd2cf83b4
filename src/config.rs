//! Construction parameters for `ChainedHashMap`.

use crate::error::TableError;

/// Bucket count used when no capacity is given.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Load factor used when none is given.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.7;

/// Hard ceiling on both the bucket count and the number of entries.
pub const MAX_CAPACITY: usize = 1 << 30;

/// Parameters fixed at construction.
///
/// `initial_capacity` is rounded up to the next power of two. `max_capacity`
/// bounds growth: once the bucket array reaches it, chains grow instead, and a
/// new key that would push the size past it is rejected with
/// [`TableError::CapacityExceeded`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    pub initial_capacity: usize,
    pub load_factor: f64,
    pub max_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            max_capacity: MAX_CAPACITY,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Check every parameter; nothing is allocated on failure.
    pub fn validate(&self) -> Result<(), TableError> {
        if !self.max_capacity.is_power_of_two() || self.max_capacity > MAX_CAPACITY {
            return Err(TableError::InvalidArgument {
                reason: "max capacity must be a power of two no larger than 2^30",
            });
        }
        if self.initial_capacity == 0 {
            return Err(TableError::InvalidArgument {
                reason: "initial capacity must be positive",
            });
        }
        if self.initial_capacity > self.max_capacity {
            return Err(TableError::InvalidArgument {
                reason: "initial capacity exceeds max capacity",
            });
        }
        // Also rejects NaN.
        if !(self.load_factor > 0.0) || !self.load_factor.is_finite() {
            return Err(TableError::InvalidArgument {
                reason: "load factor must be positive and finite",
            });
        }
        Ok(())
    }

    /// Bucket count a table built from this config starts with.
    pub(crate) fn effective_capacity(&self) -> usize {
        self.initial_capacity.next_power_of_two()
    }
}

/// `floor(capacity * load_factor)`, saturating at `usize::MAX`.
pub(crate) fn threshold_for(capacity: usize, load_factor: f64) -> usize {
    // `as` saturates for out-of-range floats.
    (capacity as f64 * load_factor).floor() as usize
}
