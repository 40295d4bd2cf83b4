//! Bucket: one collision chain of entries sharing a bucket index.

use core::borrow::Borrow;
use core::fmt;

/// Hash recorded for the absent key. Masks to bucket 0 at every capacity.
pub(crate) const ABSENT_HASH: u64 = 0;

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: Option<K>,
    pub(crate) value: V,
    // Cached at insertion; rehashing never calls `K: Hash` again.
    pub(crate) hash: u64,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn present(key: K, value: V, hash: u64) -> Self {
        Self {
            key: Some(key),
            value,
            hash,
        }
    }

    pub(crate) fn absent(value: V) -> Self {
        Self {
            key: None,
            value,
            hash: ABSENT_HASH,
        }
    }

    /// Null-aware key match: absent matches only absent, present keys
    /// compare by `Eq` through `Borrow`.
    #[inline]
    pub(crate) fn matches<Q>(&self, probe: Option<&Q>) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        match (&self.key, probe) {
            (None, None) => true,
            (Some(k), Some(q)) => k.borrow() == q,
            _ => false,
        }
    }
}

/// Ordered chain of entries. Insertion order is kept until the next resize.
#[derive(Clone, Debug)]
pub(crate) struct Bucket<K, V> {
    entries: Vec<Entry<K, V>>,
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn new(entry: Entry<K, V>) -> Self {
        Self {
            entries: vec![entry],
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position<Q>(&self, probe: Option<&Q>) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries.iter().position(|e| e.matches(probe))
    }

    pub(crate) fn find<Q>(&self, probe: Option<&Q>) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries.iter().find(|e| e.matches(probe))
    }

    pub(crate) fn find_mut<Q>(&mut self, probe: Option<&Q>) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries.iter_mut().find(|e| e.matches(probe))
    }

    /// Append without checking for an equal key; callers have already
    /// established the key is new to this bucket.
    pub(crate) fn push(&mut self, entry: Entry<K, V>) {
        self.entries.push(entry);
    }

    /// Detach the matching entry, keeping the order of the remaining ones.
    pub(crate) fn remove<Q>(&mut self, probe: Option<&Q>) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let idx = self.position(probe)?;
        Some(self.entries.remove(idx))
    }

    pub(crate) fn entries(&self) -> &[Entry<K, V>] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<Entry<K, V>> {
        self.entries
    }
}

/// Renders `{k1=v1, k2=v2}` in chain order; the absent key renders as `null`.
impl<K: fmt::Display, V: fmt::Display> fmt::Display for Bucket<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, e) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &e.key {
                Some(k) => write!(f, "{}={}", k, e.value)?,
                None => write!(f, "null={}", e.value)?,
            }
        }
        f.write_str("}")
    }
}
