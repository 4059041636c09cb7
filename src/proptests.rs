use super::*;
use crate::storage::tests::CollidingState;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, BTreeSet, HashSet};

// =============================================================================
// Ordered dictionary
// =============================================================================

/// Reference model: a plain vector of pairs in logical order.
#[derive(Clone, Default)]
struct PairModel(Vec<(u64, u64)>);

impl PairModel {
    fn position(&self, key: u64) -> Option<usize> {
        self.0.iter().position(|&(k, _)| k == key)
    }

    fn insert_at(&mut self, index: usize, key: u64, value: u64) -> bool {
        if self.position(key).is_some() {
            return false;
        }
        self.0.insert(index, (key, value));
        true
    }

    fn update(&mut self, key: u64, value: u64) -> Option<u64> {
        match self.position(key) {
            Some(i) => Some(std::mem::replace(&mut self.0[i].1, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    fn remove(&mut self, key: u64) -> Option<u64> {
        let i = self.position(key)?;
        Some(self.0.remove(i).1)
    }
}

fn pairs<S>(d: &OrderedDictionary<u64, u64, S>) -> Vec<(u64, u64)> {
    d.iter().map(|(k, v)| (*k, *v)).collect()
}

#[derive(Clone, Debug)]
enum DictOp {
    Append(u64, u64),
    InsertAt(usize, u64, u64),
    InsertContents(usize, Vec<(u64, u64)>),
    Update(u64, u64),
    Remove(u64),
    RemoveAt(usize),
    RemoveSubrange(usize, usize),
    Get(u64),
    Snapshot,
}

fn dict_ops_strategy() -> impl Strategy<Value = Vec<DictOp>> {
    let key = 0u64..48;
    let op = prop_oneof![
        30 => (key.clone(), any::<u64>()).prop_map(|(k, v)| DictOp::Append(k, v)),
        15 => (any::<usize>(), key.clone(), any::<u64>())
            .prop_map(|(i, k, v)| DictOp::InsertAt(i, k, v)),
        3 => (any::<usize>(), prop::collection::vec((key.clone(), any::<u64>()), 0..12))
            .prop_map(|(i, elements)| DictOp::InsertContents(i, elements)),
        10 => (key.clone(), any::<u64>()).prop_map(|(k, v)| DictOp::Update(k, v)),
        15 => key.clone().prop_map(DictOp::Remove),
        10 => any::<usize>().prop_map(DictOp::RemoveAt),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| DictOp::RemoveSubrange(a, b)),
        14 => key.clone().prop_map(DictOp::Get),
        1 => Just(DictOp::Snapshot),
    ];
    prop::collection::vec(op, 0..=400)
}

fn run_dict_ops<S>(
    mut d: OrderedDictionary<u64, u64, S>,
    ops: Vec<DictOp>,
) -> Result<(), TestCaseError>
where
    S: std::hash::BuildHasher + Clone,
{
    let mut m = PairModel::default();
    let mut snapshots: Vec<(OrderedDictionary<u64, u64, S>, Vec<(u64, u64)>)> = Vec::new();

    for op in ops {
        match op {
            DictOp::Append(k, v) => {
                prop_assert_eq!(d.append(k, v), m.insert_at(m.0.len(), k, v));
            }
            DictOp::InsertAt(i, k, v) => {
                let i = i % (m.0.len() + 1);
                prop_assert_eq!(d.insert_at(i, k, v), m.insert_at(i, k, v));
            }
            DictOp::InsertContents(i, elements) => {
                let i = i % (m.0.len() + 1);
                let mut inserted = 0;
                for &(k, v) in &elements {
                    if m.insert_at(i + inserted, k, v) {
                        inserted += 1;
                    }
                }
                prop_assert_eq!(d.insert_contents_of(elements, i), inserted);
            }
            DictOp::Update(k, v) => {
                prop_assert_eq!(d.update_value(k, v), m.update(k, v));
            }
            DictOp::Remove(k) => {
                prop_assert_eq!(d.remove_value(&k), m.remove(k));
            }
            DictOp::RemoveAt(i) => {
                if !m.0.is_empty() {
                    let i = i % m.0.len();
                    prop_assert_eq!(d.remove_at(i), m.0.remove(i));
                }
            }
            DictOp::RemoveSubrange(a, b) => {
                let (a, b) = (a % (m.0.len() + 1), b % (m.0.len() + 1));
                let range = a.min(b)..a.max(b);
                d.remove_subrange(range.clone());
                m.0.drain(range);
            }
            DictOp::Get(k) => {
                let expected = m.position(k).map(|i| m.0[i].1);
                prop_assert_eq!(d.get(&k).copied(), expected);
                prop_assert_eq!(d.index_of(&k), m.position(k));
            }
            DictOp::Snapshot => snapshots.push((d.clone(), m.0.clone())),
        }
        prop_assert_eq!(d.len(), m.0.len());
    }

    d.validate();
    prop_assert_eq!(pairs(&d), m.0);
    for (snapshot, expected) in snapshots {
        snapshot.validate();
        prop_assert_eq!(pairs(&snapshot), expected);
    }
    Ok(())
}

// =============================================================================
// Interval map
// =============================================================================

/// Builds an interval over even bounds so odd probes land strictly between
/// two bound values.
fn doubled_interval(
    a: i32,
    b: i32,
    lower_closed: bool,
    upper_closed: bool,
) -> Option<Interval<i32>> {
    let kind = |closed| if closed { EndpointKind::Closed } else { EndpointKind::Open };
    let (a, b) = (a.min(b), a.max(b));
    Interval::try_new(2 * a, kind(lower_closed), 2 * b, kind(upper_closed)).ok()
}

/// Integer probes covered by `interval`.
fn probes(interval: &Interval<i32>) -> std::ops::RangeInclusive<i32> {
    let start = interval.lower_bound() + i32::from(!interval.lower().is_closed());
    let end = interval.upper_bound() - i32::from(!interval.upper().is_closed());
    start..=end
}

const PROBE_SPAN: std::ops::RangeInclusive<i32> = -4..=44;

fn count_runs(points: &BTreeSet<i32>) -> usize {
    let mut runs = 0;
    let mut prev: Option<i32> = None;
    for &p in points {
        if prev.map_or(true, |q| q + 1 != p) {
            runs += 1;
        }
        prev = Some(p);
    }
    runs
}

fn check_interval_map(map: &IntervalMap<i32>, model: &BTreeSet<i32>) -> Result<(), TestCaseError> {
    map.validate();
    for p in PROBE_SPAN {
        prop_assert_eq!(map.contains(&p), model.contains(&p), "probe {}", p);
    }
    prop_assert_eq!(map.len(), count_runs(model));
    Ok(())
}

fn interval_strategy() -> impl Strategy<Value = Option<Interval<i32>>> {
    (0i32..=20, 0i32..=20, any::<bool>(), any::<bool>())
        .prop_map(|(a, b, lc, uc)| doubled_interval(a, b, lc, uc))
}

#[derive(Clone, Debug)]
enum IntervalOp {
    Insert(Option<Interval<i32>>),
    Remove(Option<Interval<i32>>),
}

fn interval_ops_strategy() -> impl Strategy<Value = Vec<IntervalOp>> {
    let op = prop_oneof![
        3 => interval_strategy().prop_map(IntervalOp::Insert),
        2 => interval_strategy().prop_map(IntervalOp::Remove),
    ];
    prop::collection::vec(op, 0..=120)
}

fn model_of(intervals: &[Option<Interval<i32>>]) -> BTreeSet<i32> {
    intervals.iter().flatten().flat_map(probes).collect()
}

// =============================================================================
// Countable range map
// =============================================================================

#[derive(Clone, Debug)]
enum RangeOp {
    Insert(i16),
    InsertRange(i16, i16),
    Remove(i16),
    RemoveRange(i16, i16),
}

fn range_ops_strategy() -> impl Strategy<Value = Vec<RangeOp>> {
    let value = -50i16..50;
    let op = prop_oneof![
        4 => value.clone().prop_map(RangeOp::Insert),
        2 => (value.clone(), value.clone())
            .prop_map(|(a, b)| RangeOp::InsertRange(a.min(b), a.max(b))),
        3 => value.clone().prop_map(RangeOp::Remove),
        1 => (value.clone(), value.clone())
            .prop_map(|(a, b)| RangeOp::RemoveRange(a.min(b), a.max(b))),
    ];
    prop::collection::vec(op, 0..=300)
}

// =============================================================================
// Ordered set
// =============================================================================

#[derive(Clone, Debug, Arbitrary)]
enum SetOp {
    Insert(#[proptest(strategy = "0u16..40")] u16),
    InsertAt(usize, #[proptest(strategy = "0u16..40")] u16),
    Remove(#[proptest(strategy = "0u16..40")] u16),
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_dictionary_matches_model(ops in dict_ops_strategy()) {
        run_dict_ops(OrderedDictionary::with_hasher(RandomState::new()), ops)?;
    }

    #[test]
    fn prop_dictionary_matches_model_under_collisions(ops in dict_ops_strategy()) {
        // Few distinct hashes: long chains that wrap around the table.
        run_dict_ops(OrderedDictionary::with_hasher(CollidingState { modulus: 5 }), ops)?;
    }

    #[test]
    fn prop_sorted_dictionary_matches_btreemap(
        ops in prop::collection::vec((0u8..4, 0u32..64, any::<u32>()), 0..=400)
    ) {
        let mut d: SortedDictionary<u32, u32> = SortedDictionary::new();
        let mut m: BTreeMap<u32, u32> = BTreeMap::new();
        for (kind, k, v) in ops {
            match kind {
                0 => {
                    let fresh = !m.contains_key(&k);
                    m.entry(k).or_insert(v);
                    prop_assert_eq!(d.insert(k, v), fresh);
                }
                1 => prop_assert_eq!(d.update_value(k, v), m.insert(k, v)),
                2 => prop_assert_eq!(d.remove_value(&k), m.remove(&k)),
                _ => {
                    if !m.is_empty() {
                        let i = v as usize % m.len();
                        let expected = m.iter().nth(i).map(|(k, v)| (*k, *v));
                        let removed = d.remove_at(i);
                        m.remove(&removed.0);
                        prop_assert_eq!(Some(removed), expected);
                    }
                }
            }
            prop_assert_eq!(d.len(), m.len());
        }
        d.validate();
        let got: Vec<(u32, u32)> = d.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u32, u32)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_set_matches_model(ops in prop::collection::vec(any::<SetOp>(), 0..=300)) {
        let mut s: OrderedSet<u16> = OrderedSet::new();
        let mut m: Vec<u16> = Vec::new();
        for op in ops {
            match op {
                SetOp::Insert(x) => {
                    let fresh = !m.contains(&x);
                    if fresh {
                        m.push(x);
                    }
                    prop_assert_eq!(s.insert(x), fresh);
                }
                SetOp::InsertAt(i, x) => {
                    let i = i % (m.len() + 1);
                    let fresh = !m.contains(&x);
                    if fresh {
                        m.insert(i, x);
                    }
                    prop_assert_eq!(s.insert_at(i, x), fresh);
                }
                SetOp::Remove(x) => {
                    let expected = m.iter().position(|&y| y == x).map(|i| m.remove(i));
                    prop_assert_eq!(s.remove(&x), expected);
                }
            }
        }
        prop_assert_eq!(s.iter().copied().collect::<Vec<_>>(), m);
    }

    #[test]
    fn prop_interval_map_matches_point_model(ops in interval_ops_strategy()) {
        let mut map = IntervalMap::new();
        let mut model = BTreeSet::new();
        for op in ops {
            match op {
                IntervalOp::Insert(Some(interval)) => {
                    model.extend(probes(&interval));
                    map.insert(interval);
                }
                IntervalOp::Remove(Some(interval)) => {
                    for p in probes(&interval) {
                        model.remove(&p);
                    }
                    map.remove(&interval);
                }
                IntervalOp::Insert(None) | IntervalOp::Remove(None) => {}
            }
            check_interval_map(&map, &model)?;
        }

        let coverage = Interval::closed(-2, 42);
        let inverted = map.inverted(&coverage);
        inverted.validate();
        for p in -2..=42 {
            prop_assert_eq!(inverted.contains(&p), !model.contains(&p));
        }
        prop_assert_eq!(inverted.inverted(&coverage), map);
    }

    #[test]
    fn prop_interval_bulk_construction_matches_insertion(
        intervals in prop::collection::vec(interval_strategy(), 0..=60)
    ) {
        let built: IntervalMap<i32> = intervals.iter().flatten().copied().collect();
        let mut inserted = IntervalMap::new();
        for interval in intervals.iter().flatten() {
            inserted.insert(*interval);
        }
        built.validate();
        prop_assert_eq!(&built, &inserted);
        check_interval_map(&built, &model_of(&intervals))?;
    }

    #[test]
    fn prop_interval_set_algebra(
        a in prop::collection::vec(interval_strategy(), 0..=20),
        b in prop::collection::vec(interval_strategy(), 0..=20),
    ) {
        let (ma, mb) = (model_of(&a), model_of(&b));
        let a: IntervalMap<i32> = a.into_iter().flatten().collect();
        let b: IntervalMap<i32> = b.into_iter().flatten().collect();

        let union: BTreeSet<i32> = ma.union(&mb).copied().collect();
        let difference: BTreeSet<i32> = ma.difference(&mb).copied().collect();
        let intersection: BTreeSet<i32> = ma.intersection(&mb).copied().collect();
        check_interval_map(&a.union(&b), &union)?;
        check_interval_map(&a.subtracting(&b), &difference)?;
        check_interval_map(&a.intersection(&b), &intersection)?;
    }

    #[test]
    fn prop_range_map_matches_btreeset(ops in range_ops_strategy()) {
        let mut map: CountableRangeMap<i16> = CountableRangeMap::new();
        let mut model: BTreeSet<i16> = BTreeSet::new();
        let snapshot = map.clone();
        for op in ops {
            match op {
                RangeOp::Insert(v) => {
                    model.insert(v);
                    let index = map.insert(v);
                    prop_assert_eq!(map.index_of(v), Some(index));
                }
                RangeOp::InsertRange(a, b) => {
                    model.extend(a..=b);
                    let index = map.insert_range(a..=b);
                    prop_assert_eq!(map.index_of(a), Some(index));
                }
                RangeOp::Remove(v) => {
                    model.remove(&v);
                    map.remove(v);
                }
                RangeOp::RemoveRange(a, b) => {
                    for v in a..=b {
                        model.remove(&v);
                    }
                    map.remove_range(a..=b);
                }
            }
            map.validate();
        }

        for v in -52i16..=52 {
            prop_assert_eq!(map.contains(v), model.contains(&v), "value {}", v);
        }
        let model_runs: BTreeSet<i32> = model.iter().map(|&v| i32::from(v)).collect();
        prop_assert_eq!(map.len(), count_runs(&model_runs));
        prop_assert_eq!(
            map.values().collect::<Vec<_>>(),
            model.iter().copied().collect::<Vec<_>>()
        );
        prop_assert_eq!(map.covered_count(), model.len() as u128);
        prop_assert_eq!(&CountableRangeMap::from_values(model.iter().copied()), &map);
        prop_assert!(snapshot.is_empty());

        let inverted = map.inverted(-60..=60);
        inverted.validate();
        prop_assert_eq!(inverted.covered_count() + map.covered_count(), 121);
        prop_assert_eq!(inverted.inverted(-60..=60), map);
    }
}

// =============================================================================
// Exhaustive hole patching
// =============================================================================

/// Calls `f` once per ordering of `keys`, swapping in place (Heap's algorithm).
fn for_each_key_order(keys: &[u64], mut f: impl FnMut(&[u64])) {
    let mut order = keys.to_vec();
    let mut counters = vec![0usize; order.len()];
    f(&order);
    let mut i = 1;
    while i < order.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            order.swap(j, i);
            f(&order);
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
}

/// Hashes 6, 7, 6, 7, 6, 0 in an 8-bucket table: one chain that wraps past
/// the end and interleaves with a key whose home is bucket 0.
const WRAPPING_KEYS: [u64; 6] = [6, 7, 14, 15, 22, 0];

fn wrapping_dictionary(order: &[u64]) -> OrderedDictionary<u64, u64, CollidingState> {
    let mut d = OrderedDictionary::with_capacity_and_hasher(6, CollidingState { modulus: 8 });
    for &k in order {
        assert!(d.append(k, k * 10));
    }
    assert_eq!(d.capacity(), 6, "table must not grow");
    d
}

#[test]
fn exhaustive_insert_order_wrapping_chain() {
    let mut orders = HashSet::new();
    for_each_key_order(&WRAPPING_KEYS, |order| {
        let d = wrapping_dictionary(order);
        d.validate();
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), order);
        for &k in &WRAPPING_KEYS {
            assert_eq!(d.get(&k), Some(&(k * 10)));
        }
        orders.insert(order.to_vec());
    });
    assert_eq!(orders.len(), 720);
}

#[test]
fn exhaustive_remove_order_wrapping_chain() {
    let base = wrapping_dictionary(&WRAPPING_KEYS);

    for_each_key_order(&WRAPPING_KEYS, |order| {
        let mut d = base.clone();
        let mut remaining: Vec<u64> = WRAPPING_KEYS.to_vec();
        for &k in order {
            assert_eq!(d.remove_value(&k), Some(k * 10));
            remaining.retain(|&r| r != k);
            d.validate();
            assert_eq!(d.keys().copied().collect::<Vec<_>>(), remaining);
            for &r in &remaining {
                assert_eq!(d.get(&r), Some(&(r * 10)), "key {r} lost after removing {k}");
            }
        }
        assert!(d.is_empty());
    });
    assert_eq!(base.len(), WRAPPING_KEYS.len());
}

// =============================================================================
// Seeded stress
// =============================================================================

#[test]
fn randomized_dictionary_with_clones() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0001);
    let mut d: OrderedDictionary<u32, u32> = OrderedDictionary::new();
    let mut m = PairModel::default();
    let mut shadow: Option<(OrderedDictionary<u32, u32>, Vec<(u64, u64)>)> = None;

    for step in 0..20_000u32 {
        let key = rng.gen_range(0..2_000u32);
        match rng.gen_range(0..10) {
            0..=4 => {
                assert_eq!(d.append(key, step), m.insert_at(m.0.len(), key.into(), step.into()));
            }
            5 | 6 => {
                assert_eq!(
                    d.remove_value(&key).map(u64::from),
                    m.remove(key.into())
                );
            }
            7 => {
                assert_eq!(
                    d.update_value(key, step).map(u64::from),
                    m.update(key.into(), step.into())
                );
            }
            8 => {
                if !m.0.is_empty() {
                    let i = rng.gen_range(0..m.0.len());
                    let (k, v) = d.remove_at(i);
                    assert_eq!((u64::from(k), u64::from(v)), m.0.remove(i));
                }
            }
            _ => shadow = Some((d.clone(), m.0.clone())),
        }
        assert_eq!(d.len(), m.0.len());
    }

    d.validate();
    let got: Vec<(u64, u64)> = d.iter().map(|(k, v)| (u64::from(*k), u64::from(*v))).collect();
    assert_eq!(got, m.0);
    if let Some((snapshot, expected)) = shadow {
        let got: Vec<(u64, u64)> =
            snapshot.iter().map(|(k, v)| (u64::from(*k), u64::from(*v))).collect();
        assert_eq!(got, expected);
    }
}

#[test]
fn randomized_range_map_against_bitmap() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0002);
    let mut map: CountableRangeMap<u8> = CountableRangeMap::new();
    let mut bits = [false; 256];

    for _ in 0..5_000 {
        let a: u8 = rng.gen();
        let b: u8 = rng.gen_range(a..=u8::MAX);
        if rng.gen_bool(0.5) {
            map.insert_range(a..=b);
            bits[usize::from(a)..=usize::from(b)].fill(true);
        } else {
            map.remove_range(a..=b);
            bits[usize::from(a)..=usize::from(b)].fill(false);
        }
        map.validate();
    }

    for v in 0..=u8::MAX {
        assert_eq!(map.contains(v), bits[usize::from(v)], "value {v}");
    }
    let set = bits.iter().filter(|&&b| b).count();
    assert_eq!(map.covered_count(), set as u128);
}
