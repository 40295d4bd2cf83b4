#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can check
// bucket-array invariants after every step.

use crate::chained_hash_map::ChainedHashMap;
use crate::config::TableConfig;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking. `None` picks the absent key.
#[derive(Clone, Debug)]
enum Op {
    Put(Option<usize>, i32),
    Get(Option<usize>),
    Remove(Option<usize>),
    Contains(String),
    Mutate(usize, i32),
    Views,
    Clear,
}

fn key_from(pool: &[String], i: Option<usize>) -> Option<Key> {
    i.map(|i| Key(pool[i].clone()))
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let slot = || proptest::option::weighted(0.9, idx.clone());
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (slot(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            3 => slot().prop_map(Op::Get),
            3 => slot().prop_map(Op::Remove),
            2 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Views),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_config() -> impl Strategy<Value = TableConfig> {
    (1usize..=8, prop_oneof![Just(0.25), Just(0.5), Just(0.7), Just(1.0), Just(3.0)]).prop_map(
        |(cap, lf)| {
            TableConfig::new()
                .with_initial_capacity(cap)
                .with_load_factor(lf)
        },
    )
}

// Drives one scenario against `std::collections::HashMap<Option<Key>, i32>`.
// Invariants exercised after every op:
// - put returns the model's previous value; overwrite leaves len unchanged.
// - get/contains_key parity, including the absent key and borrowed `&str`.
// - remove of a missing key returns None and does not change len.
// - views equal the model's keys, values and pairs.
// - capacity never shrinks; bucket-array structure stays consistent.
fn run_scenario<S: BuildHasher>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Option<Key>, i32> = HashMap::new();
    let mut last_capacity = sut.capacity();

    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = key_from(&pool, i);
                let expected = model.insert(k.clone(), v);
                let got = match k {
                    Some(k) => sut.put(k, v),
                    None => sut.put_absent(v),
                };
                prop_assert_eq!(got, Ok(expected));
            }
            Op::Get(i) => {
                let k = key_from(&pool, i);
                let got = match &k {
                    Some(k) => sut.get(k),
                    None => sut.get_absent(),
                };
                prop_assert_eq!(got, model.get(&k));
            }
            Op::Remove(i) => {
                let k = key_from(&pool, i);
                let before = sut.len();
                let got = match &k {
                    Some(k) => sut.remove(k),
                    None => sut.remove_absent(),
                };
                let expected = model.remove(&k);
                prop_assert_eq!(got, expected);
                let delta = usize::from(expected.is_some());
                prop_assert_eq!(sut.len(), before - delta);
            }
            Op::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.contains_key(&Some(Key(s)));
                prop_assert_eq!(has, has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(&pool, Some(i));
                if let Some(k) = k {
                    match (sut.get_mut(&k), model.get_mut(&Some(k.clone()))) {
                        (Some(sv), Some(mv)) => {
                            *sv = sv.saturating_add(d);
                            *mv = mv.saturating_add(d);
                        }
                        (None, None) => {}
                        _ => prop_assert!(false, "get_mut disagrees with model for {:?}", k),
                    }
                }
            }
            Op::Views => {
                let keys: BTreeSet<Option<Key>> = sut.key_set().into_iter().collect();
                let m_keys: BTreeSet<Option<Key>> = model.keys().cloned().collect();
                prop_assert_eq!(keys, m_keys);

                let values: BTreeSet<i32> = sut.values().into_iter().collect();
                let m_values: BTreeSet<i32> = model.values().copied().collect();
                prop_assert_eq!(values, m_values);

                let nodes: BTreeSet<(Option<Key>, i32)> =
                    sut.node_set().into_iter().map(|n| n.into_parts()).collect();
                let m_nodes: BTreeSet<(Option<Key>, i32)> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(nodes, m_nodes);

                for v in model.values() {
                    prop_assert!(sut.contains_value(v));
                }
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.contains_absent_key(), model.contains_key(&None));
        prop_assert!(sut.capacity() >= last_capacity, "capacity shrank");
        last_capacity = sut.capacity();
        sut.raw_table().assert_consistent();
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut: ChainedHashMap<Key, i32> = ChainedHashMap::with_config(config).unwrap();
        run_scenario(sut, pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares bucket 0
// with the absent key, so equality alone resolves lookups.
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
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut: ChainedHashMap<Key, i32, ConstBuildHasher> =
            ChainedHashMap::with_config_and_hasher(config, ConstBuildHasher).unwrap();
        run_scenario(sut, pool, ops)?;
    }
}
