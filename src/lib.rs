//! chained-hashmap: a single-threaded hash map that resolves collisions by
//! chaining, supports one absent (null) key, and grows by doubling.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small table whose hashing, collision and growth rules are
//!   explicit and testable layer by layer.
//! - Layers:
//!   - Bucket / Entry: one collision chain as a `Vec` of entries. Keys are
//!     `Option<K>`; the absent key matches only itself. Overwrite and
//!     detach work by index into the chain.
//!   - BucketArray: `Vec<Option<Bucket>>` plus size, load factor and
//!     threshold. Places entries at `hash & (capacity - 1)` and doubles
//!     the array once size exceeds the threshold. Never hashes keys.
//!   - ChainedHashMap<K, V, S>: public API. Hashes keys through `S`,
//!     routes the absent key to bucket 0, builds snapshot views, and
//!     renders itself for debugging.
//!
//! Constraints
//! - Single-threaded: the map is `!Sync`; there is no internal locking.
//! - Capacity is a power of two in `[next_pow2(initial), max_capacity]`
//!   and never shrinks; removing the last entry of a bucket releases it.
//! - `threshold == floor(capacity * load_factor)` after every resize.
//! - At most one entry per key, counting the absent key once.
//!
//! Hasher and rehashing invariants
//! - Each entry stores the `u64` hash computed at insertion (0 for the
//!   absent key). Resizing re-indexes from the stored hash, so `K: Hash`
//!   is never invoked after insertion.
//!
//! Reentrancy policy
//! - Entry points that call user code (`K: Hash`, `K: Eq`, `V: PartialEq`,
//!   `Clone`) hold a debug-only reentrancy check. Calling back into the
//!   same map from that code panics in debug builds. `remove` drops the
//!   removed key only after the check is released.
//!
//! Errors
//! - `TableError::InvalidArgument`: rejected construction parameters.
//! - `TableError::CapacityExceeded`: a new key would push the size past
//!   `max_capacity`; the map is left unchanged.
//! - Misses are not errors and come back as `None`.
//!
//! Notes and non-goals
//! - `remove` of a missing key never changes `len()`.
//! - Views (`key_set`, `values`, `node_set`) are owned `hashbrown`
//!   sets with no ordering guarantee.
//! - No open addressing, no shrinking, no concurrent access.
//! - Logging goes through the `log` facade; the crate never installs a
//!   logger.

mod bucket;
mod bucket_array;
pub mod chained_hash_map;
mod chained_hash_map_proptest;
pub mod config;
mod error;
mod reentrancy;
pub mod views;

// Public surface
pub use chained_hash_map::{ChainedHashMap, Iter};
pub use config::{TableConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, MAX_CAPACITY};
pub use error::TableError;
pub use views::Node;
