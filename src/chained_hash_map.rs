//! ChainedHashMap: public separate-chaining map with an absent (null) key.

use crate::bucket::{Bucket, Entry, ABSENT_HASH};
use crate::bucket_array::BucketArray;
use crate::config::TableConfig;
use crate::error::TableError;
use crate::reentrancy::ReentrancyCheck;
use crate::views::Node;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use hashbrown::HashSet;
use std::collections::hash_map::RandomState;

/// A hash map resolving collisions by chaining, with one optional entry for
/// the absent key.
///
/// Keys are placed at `hash(key) & (capacity - 1)`; the absent key always
/// lives in bucket 0. After an insertion pushes `len()` above
/// `threshold()`, the bucket array doubles and every entry is
/// redistributed. Capacity never shrinks.
///
/// Present keys go through [`put`](Self::put), [`get`](Self::get) and
/// [`remove`](Self::remove); the absent key has its own `*_absent`
/// counterparts. Views ([`key_set`](Self::key_set),
/// [`values`](Self::values), [`node_set`](Self::node_set)) are owned
/// snapshots and represent the absent key as `None`.
pub struct ChainedHashMap<K, V, S = RandomState> {
    hasher: S,
    table: BucketArray<K, V>,
    reentrancy: ReentrancyCheck,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty map with 16 buckets and load factor 0.7.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_capacity(initial_capacity: usize) -> Result<Self, TableError> {
        Self::with_config(TableConfig::new().with_initial_capacity(initial_capacity))
    }

    /// Fails with [`TableError::InvalidArgument`] if `initial_capacity` is
    /// zero or above [`MAX_CAPACITY`](crate::MAX_CAPACITY), or if
    /// `load_factor` is not a positive finite number.
    pub fn with_capacity_and_load_factor(
        initial_capacity: usize,
        load_factor: f64,
    ) -> Result<Self, TableError> {
        Self::with_config(
            TableConfig::new()
                .with_initial_capacity(initial_capacity)
                .with_load_factor(load_factor),
        )
    }

    pub fn with_config(config: TableConfig) -> Result<Self, TableError> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> Default for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

// Accessors that never touch keys or values.
impl<K, V, S> ChainedHashMap<K, V, S> {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Current number of buckets; always a power of two.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Size above which the next insertion of a new key doubles capacity.
    pub fn threshold(&self) -> usize {
        self.table.threshold()
    }

    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    pub fn max_capacity(&self) -> usize {
        self.table.max_capacity()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Borrowing iterator over `(key, value)`; the absent key yields `None`.
    /// Order follows the bucket array and changes after a resize.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.table.slots().iter(),
            chain: <&[_]>::default().iter(),
            remaining: self.table.len(),
        }
    }

    /// Remove every entry. Capacity is kept.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    #[cfg(test)]
    pub(crate) fn raw_table(&self) -> &BucketArray<K, V> {
        &self.table
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Empty map with default capacity and load factor.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            table: BucketArray::from_validated(&TableConfig::default()),
            reentrancy: ReentrancyCheck::new(),
        }
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self, TableError> {
        let table = BucketArray::try_new(&config)?;
        Ok(Self {
            hasher,
            table,
            reentrancy: ReentrancyCheck::new(),
        })
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Insert `value` under `key`, returning the value it replaced.
    ///
    /// Overwriting keeps `len()` unchanged. A new key that would push
    /// `len()` past `max_capacity()` is rejected with
    /// [`TableError::CapacityExceeded`] and the map is left untouched.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        let _g = self.reentrancy.enter("put");
        let hash = self.make_hash(&key);
        self.table.insert(Entry::present(key, value, hash))
    }

    /// [`put`](Self::put) for the absent key.
    pub fn put_absent(&mut self, value: V) -> Result<Option<V>, TableError> {
        let _g = self.reentrancy.enter("put_absent");
        self.table.insert(Entry::absent(value))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get");
        let hash = self.make_hash(key);
        self.table.find(hash, Some(key)).map(|e| &e.value)
    }

    pub fn get_absent(&self) -> Option<&V> {
        self.table.find::<K>(ABSENT_HASH, None).map(|e| &e.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_mut");
        let hash = self.make_hash(key);
        self.table.find_mut(hash, Some(key)).map(|e| &mut e.value)
    }

    pub fn get_absent_mut(&mut self) -> Option<&mut V> {
        self.table
            .find_mut::<K>(ABSENT_HASH, None)
            .map(|e| &mut e.value)
    }

    /// Remove `key` and return its value. A miss returns `None` and leaves
    /// `len()` unchanged.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let entry = {
            let _g = self.reentrancy.enter("remove");
            let hash = self.make_hash(key);
            self.table.remove(hash, Some(key))?
        };
        // The key drops here, once the table is consistent again.
        Some(entry.value)
    }

    pub fn remove_absent(&mut self) -> Option<V> {
        self.table
            .remove::<K>(ABSENT_HASH, None)
            .map(|e| e.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("contains_key");
        let hash = self.make_hash(key);
        self.table.find(hash, Some(key)).is_some()
    }

    pub fn contains_absent_key(&self) -> bool {
        self.table.find::<K>(ABSENT_HASH, None).is_some()
    }

    /// Linear in `len()`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        let _g = self.reentrancy.enter("contains_value");
        self.table.entries().any(|e| e.value == *value)
    }

    /// Snapshot of every key; the absent key appears as `None`.
    pub fn key_set(&self) -> HashSet<Option<K>>
    where
        K: Clone,
    {
        let _g = self.reentrancy.enter("key_set");
        self.table.entries().map(|e| e.key.clone()).collect()
    }

    /// Snapshot of the stored values. Equal values collapse into one.
    pub fn values(&self) -> HashSet<V>
    where
        V: Clone + Hash + Eq,
    {
        let _g = self.reentrancy.enter("values");
        self.table.entries().map(|e| e.value.clone()).collect()
    }

    /// Snapshot of every key/value association.
    pub fn node_set(&self) -> HashSet<Node<K, V>>
    where
        K: Clone,
        V: Clone + Eq,
    {
        let _g = self.reentrancy.enter("node_set");
        self.table
            .entries()
            .map(|e| Node::new(e.key.clone(), e.value.clone()))
            .collect()
    }
}

impl<K, V, S> Clone for ChainedHashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    /// Entries keep their cached hashes, so the clone shares the hasher state.
    fn clone(&self) -> Self {
        let _g = self.reentrancy.enter("clone");
        Self {
            hasher: self.hasher.clone(),
            table: self.table.clone(),
            reentrancy: ReentrancyCheck::new(),
        }
    }
}

/// Concatenates the non-empty buckets in array order, each as
/// `{k1=v1, k2=v2}`. Meant for debugging; the layout is not stable across
/// resizes.
impl<K: fmt::Display, V: fmt::Display, S> fmt::Display for ChainedHashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bucket in self.table.buckets() {
            write!(f, "{}", bucket)?;
        }
        Ok(())
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ChainedHashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over `(Option<&K>, &V)` in bucket-array order.
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Option<Bucket<K, V>>>,
    chain: core::slice::Iter<'a, Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Option<&'a K>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(e) = self.chain.next() {
                self.remaining -= 1;
                return Some((e.key.as_ref(), &e.value));
            }
            if let Some(bucket) = self.slots.next()? {
                self.chain = bucket.entries().iter();
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (Option<&'a K>, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    // Hashes a u64 key to itself so bucket placement is predictable.
    #[derive(Clone, Default)]
    struct IdentityBuildHasher;
    struct IdentityHasher(u64);
    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for b in bytes {
                self.0 = (self.0 << 8) | u64::from(*b);
            }
        }
        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in bucket 0, alongside the absent key
    }

    fn identity_map() -> ChainedHashMap<u64, &'static str, IdentityBuildHasher> {
        ChainedHashMap::with_hasher(IdentityBuildHasher)
    }

    /// Invariant: borrowed lookup works (store `String`, query with `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
        m.put("hello".to_string(), 1).unwrap();
        assert_eq!(m.get("hello"), Some(&1));
        assert!(m.contains_key("hello"));
        assert!(!m.contains_key("world"));
        assert_eq!(m.remove("hello"), Some(1));
        assert!(m.is_empty());
    }

    /// Invariant: the absent key is stored once, next to colliding present
    /// keys, and never confused with them.
    #[test]
    fn absent_key_shares_bucket_zero_without_aliasing() {
        let mut m: ChainedHashMap<String, i32, ConstBuildHasher> =
            ChainedHashMap::with_hasher(ConstBuildHasher);
        m.put("a".to_string(), 1).unwrap();
        assert_eq!(m.put_absent(2).unwrap(), None);
        m.put("b".to_string(), 3).unwrap();
        assert_eq!(m.put_absent(4).unwrap(), Some(2));
        assert_eq!(m.len(), 3);

        assert_eq!(m.get_absent(), Some(&4));
        assert_eq!(m.get("a"), Some(&1));
        assert_eq!(m.get("b"), Some(&3));
        assert!(m.contains_absent_key());

        assert_eq!(m.remove_absent(), Some(4));
        assert_eq!(m.remove_absent(), None);
        assert!(!m.contains_absent_key());
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("a"), Some(&1));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut m: ChainedHashMap<&'static str, Vec<u8>> = ChainedHashMap::new();
        m.put("k", vec![1]).unwrap();
        m.get_mut("k").expect("present").push(2);
        assert_eq!(m.get("k"), Some(&vec![1, 2]));
        assert!(m.get_mut("missing").is_none());

        assert!(m.get_absent_mut().is_none());
        m.put_absent(vec![]).unwrap();
        m.get_absent_mut().expect("present").push(9);
        assert_eq!(m.get_absent(), Some(&vec![9]));
        assert_eq!(m.len(), 2);
    }

    /// Invariant: `Display` walks buckets in array order and chains in
    /// insertion order.
    #[test]
    fn display_follows_bucket_layout() {
        let mut m = identity_map();
        m.put(17, "a").unwrap();
        m.put(1, "b").unwrap();
        m.put(2, "c").unwrap();
        assert_eq!(m.to_string(), "{17=a, 1=b}{2=c}");

        let empty = identity_map();
        assert_eq!(empty.to_string(), "");
    }

    #[test]
    fn display_renders_absent_key_first() {
        let mut m = identity_map();
        m.put(3, "three").unwrap();
        m.put_absent("none").unwrap();
        m.put(16, "sixteen").unwrap();
        assert_eq!(m.to_string(), "{null=none, 16=sixteen}{3=three}");
    }

    #[test]
    fn debug_renders_as_map() {
        let mut m = identity_map();
        m.put(5, "five").unwrap();
        assert_eq!(format!("{:?}", m), r#"{Some(5): "five"}"#);
    }

    /// Invariant: iteration yields each live entry exactly once and reports
    /// an exact length.
    #[test]
    fn iter_visits_every_entry_once() {
        let mut m = identity_map();
        for k in 0..40u64 {
            m.put(k, "v").unwrap();
        }
        m.put_absent("null").unwrap();
        m.remove(&7);

        let it = m.iter();
        assert_eq!(it.len(), 40);
        let keys: Vec<Option<u64>> = it.map(|(k, _)| k.copied()).collect();
        let unique: BTreeSet<_> = keys.iter().copied().collect();
        assert_eq!(keys.len(), unique.len());
        assert!(unique.contains(&None));
        assert!(!unique.contains(&Some(7)));

        let via_into_iter = (&m).into_iter().count();
        assert_eq!(via_into_iter, m.len());
    }

    #[test]
    fn clear_empties_but_keeps_capacity() {
        let mut m = identity_map();
        for k in 0..20 {
            m.put(k, "v").unwrap();
        }
        m.put_absent("n").unwrap();
        let cap = m.capacity();
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), cap);
        assert_eq!(m.get(&3), None);
        assert_eq!(m.get_absent(), None);
        assert_eq!(m.iter().count(), 0);
    }

    /// Invariant: a clone is independent of the original.
    #[test]
    fn clone_is_independent() {
        let mut m = identity_map();
        m.put(1, "one").unwrap();
        let mut c = m.clone();
        c.put(2, "two").unwrap();
        c.put(1, "uno").unwrap();
        assert_eq!(m.get(&1), Some(&"one"));
        assert_eq!(m.get(&2), None);
        assert_eq!(c.get(&1), Some(&"uno"));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn default_uses_default_parameters() {
        let m: ChainedHashMap<u64, u64, IdentityBuildHasher> = ChainedHashMap::default();
        assert_eq!(m.capacity(), 16);
        assert_eq!(m.threshold(), 11);
        assert_eq!(m.load_factor(), 0.7);
        assert_eq!(m.max_capacity(), crate::MAX_CAPACITY);
    }

    /// Invariant (debug-only): re-entering the map from `K: Eq` during a
    /// bucket scan panics; in release builds this test is skipped.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_get() {
        struct ReentryKey {
            id: &'static str,
            map: *const ChainedHashMap<ReentryKey, i32, ConstBuildHasher>,
            trigger: bool,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if other.trigger {
                    // Attempt to re-enter the same map during the scan.
                    unsafe {
                        let m = &*other.map;
                        let _ = m.contains_key(self.id);
                    }
                }
                false
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
        impl Borrow<str> for ReentryKey {
            fn borrow(&self) -> &str {
                self.id
            }
        }

        let mut m: ChainedHashMap<ReentryKey, i32, ConstBuildHasher> =
            ChainedHashMap::with_hasher(ConstBuildHasher);
        m.put(
            ReentryKey {
                id: "a",
                map: core::ptr::null(),
                trigger: false,
            },
            1,
        )
        .unwrap();

        let query = ReentryKey {
            id: "b",
            map: &m as *const _,
            trigger: true,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = m.get(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");

        // The guard was released during unwinding.
        assert!(m.contains_key("a"));
    }
}
