//! Owned snapshot types returned by the map's view methods.

use core::fmt;
use core::hash::{Hash, Hasher};

/// An owned copy of one key/value association, as returned by
/// [`ChainedHashMap::node_set`](crate::ChainedHashMap::node_set).
///
/// A `None` key is the map's absent key. Nodes hash by key only and compare
/// equal when both key and value are equal, so a set of nodes can be checked
/// against expected pairs directly.
#[derive(Clone, Debug)]
pub struct Node<K, V> {
    key: Option<K>,
    value: V,
}

impl<K, V> Node<K, V> {
    pub fn new(key: Option<K>, value: V) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_parts(self) -> (Option<K>, V) {
        (self.key, self.value)
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for Node<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl<K: Eq, V: Eq> Eq for Node<K, V> {}

impl<K: Hash, V> Hash for Node<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Node<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(k) => write!(f, "{}={}", k, self.value),
            None => write!(f, "null={}", self.value),
        }
    }
}
