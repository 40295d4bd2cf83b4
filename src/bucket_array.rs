//! BucketArray: owns the bucket slots plus size/threshold bookkeeping.
//!
//! This layer never hashes keys. Callers hand it entries carrying their
//! precomputed hash, and probes carry the hash of the key being looked up.
//! Indexing is `hash & (capacity - 1)`, which relies on the capacity always
//! being a power of two.

use crate::bucket::{Bucket, Entry};
use crate::config::{threshold_for, TableConfig};
use crate::error::TableError;
use core::borrow::Borrow;
use core::mem;
use log::{debug, trace, warn};

#[derive(Clone)]
pub(crate) struct BucketArray<K, V> {
    // len() is the capacity; a slot is None until something hashes there.
    slots: Vec<Option<Bucket<K, V>>>,
    len: usize,
    load_factor: f64,
    threshold: usize,
    max_capacity: usize,
}

fn empty_slots<K, V>(capacity: usize) -> Vec<Option<Bucket<K, V>>> {
    core::iter::repeat_with(|| None).take(capacity).collect()
}

/// Put `entry` into the chain at `index`, creating the bucket if needed.
fn place<K, V>(slots: &mut [Option<Bucket<K, V>>], index: usize, entry: Entry<K, V>) {
    match &mut slots[index] {
        Some(bucket) => bucket.push(entry),
        slot @ None => *slot = Some(Bucket::new(entry)),
    }
}

impl<K, V> BucketArray<K, V> {
    /// Build from a config that has already passed `validate`.
    pub(crate) fn from_validated(config: &TableConfig) -> Self {
        let capacity = config.effective_capacity();
        let threshold = threshold_for(capacity, config.load_factor);
        trace!(
            "new bucket array: capacity {}, load factor {}, threshold {}",
            capacity,
            config.load_factor,
            threshold
        );
        Self {
            slots: empty_slots(capacity),
            len: 0,
            load_factor: config.load_factor,
            threshold,
            max_capacity: config.max_capacity,
        }
    }

    pub(crate) fn try_new(config: &TableConfig) -> Result<Self, TableError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn threshold(&self) -> usize {
        self.threshold
    }

    pub(crate) fn load_factor(&self) -> f64 {
        self.load_factor
    }

    pub(crate) fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    #[inline]
    fn index_for(&self, hash: u64) -> usize {
        (hash as usize) & (self.capacity() - 1)
    }

    /// Slots in array order, including empty ones.
    pub(crate) fn slots(&self) -> &[Option<Bucket<K, V>>] {
        &self.slots
    }

    /// Present buckets in array order.
    pub(crate) fn buckets(&self) -> impl Iterator<Item = &Bucket<K, V>> {
        self.slots.iter().flatten()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.buckets().flat_map(|b| b.entries().iter())
    }

    pub(crate) fn find<Q>(&self, hash: u64, probe: Option<&Q>) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.slots[self.index_for(hash)].as_ref()?.find(probe)
    }

    pub(crate) fn find_mut<Q>(&mut self, hash: u64, probe: Option<&Q>) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let index = self.index_for(hash);
        self.slots[index].as_mut()?.find_mut(probe)
    }

    /// Insert or overwrite. Returns the previous value when the key was
    /// already present; a new key may trigger a resize afterwards.
    pub(crate) fn insert(&mut self, entry: Entry<K, V>) -> Result<Option<V>, TableError>
    where
        K: Eq,
    {
        let index = self.index_for(entry.hash);
        if let Some(bucket) = self.slots[index].as_mut() {
            if let Some(existing) = bucket.find_mut(entry.key.as_ref()) {
                return Ok(Some(mem::replace(&mut existing.value, entry.value)));
            }
        }

        if self.len >= self.max_capacity {
            warn!(
                "rejecting new key: table already holds {} entries (max {})",
                self.len, self.max_capacity
            );
            return Err(TableError::CapacityExceeded {
                max: self.max_capacity,
            });
        }

        place(&mut self.slots, index, entry);
        self.len += 1;

        if self.len > self.threshold {
            self.resize();
        }
        Ok(None)
    }

    /// Detach the matching entry. A miss leaves `len` untouched.
    pub(crate) fn remove<Q>(&mut self, hash: u64, probe: Option<&Q>) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let index = self.index_for(hash);
        let slot = &mut self.slots[index];
        let removed = slot.as_mut()?.remove(probe)?;
        if slot.as_ref().is_some_and(Bucket::is_empty) {
            *slot = None;
        }
        self.len -= 1;
        Some(removed)
    }

    /// Drop every entry; capacity and threshold stay as they are.
    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.len = 0;
    }

    /// Double the bucket count and redistribute every entry by its cached
    /// hash. At `max_capacity` the array stays as is and chains grow.
    fn resize(&mut self) {
        let old_capacity = self.capacity();
        if old_capacity >= self.max_capacity {
            trace!(
                "bucket array at max capacity {}; {} entries chained",
                old_capacity,
                self.len
            );
            return;
        }

        let new_capacity = old_capacity * 2;
        let mask = new_capacity - 1;
        let mut fresh = empty_slots(new_capacity);
        for bucket in mem::take(&mut self.slots).into_iter().flatten() {
            for entry in bucket.into_entries() {
                let index = (entry.hash as usize) & mask;
                place(&mut fresh, index, entry);
            }
        }
        self.slots = fresh;
        self.threshold = threshold_for(new_capacity, self.load_factor);

        debug!(
            "resized bucket array: {} -> {} buckets, {} entries, threshold {}",
            old_capacity, new_capacity, self.len, self.threshold
        );
    }
}

#[cfg(test)]
impl<K, V> BucketArray<K, V> {
    /// Panics if a structural invariant does not hold.
    pub(crate) fn assert_consistent(&self) {
        let capacity = self.capacity();
        assert!(capacity.is_power_of_two(), "capacity {capacity} not a power of two");
        assert!(capacity <= self.max_capacity);
        assert_eq!(self.threshold, threshold_for(capacity, self.load_factor));
        let mut total = 0;
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(b) = slot {
                assert!(!b.is_empty(), "empty bucket left in slot {i}");
                for e in b.entries() {
                    assert_eq!((e.hash as usize) & (capacity - 1), i, "entry in wrong bucket");
                    if e.key.is_none() {
                        assert_eq!(i, 0, "absent key outside bucket 0");
                    }
                }
                total += b.entries().len();
            }
        }
        assert_eq!(self.len, total, "len does not match stored entries");
        assert!(self.entries().filter(|e| e.key.is_none()).count() <= 1);
    }
}
