use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    // A narrow alphabet and short lengths, so keys repeat and the same
    // probe chains get churned by adds and removes. Zero bytes included.
    prop::collection::vec(0u8..4, 0..=6)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Add(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 20)]
    Contains(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    /// Remove every key whose first byte matches, through `each`.
    #[proptest(weight = 3)]
    EachRemove(u8),
    #[proptest(weight = 1)]
    Clear,
    #[proptest(weight = 1)]
    Shrink,
}

fn sorted_keys<S>(s: &BlobSet<S>) -> Vec<Vec<u8>> {
    let mut keys: Vec<Vec<u8>> = s.iter().map(<[u8]>::to_vec).collect();
    keys.sort();
    keys
}

fn apply(s: &mut BlobSet, m: &mut BTreeSet<Vec<u8>>, op: Op) -> Result<(), TestCaseError> {
    match op {
        Op::Add(key) => {
            let added = s.add(&key);
            prop_assert_eq!(added, m.insert(key));
        }
        Op::Remove(key) => {
            prop_assert_eq!(s.remove(&key), m.remove(&key));
        }
        Op::Contains(key) => {
            prop_assert_eq!(s.contains(&key), m.contains(&key));
        }
        Op::EachRemove(first) => {
            let first = first % 4;
            let removed = s.each(|key| {
                if key.first() == Some(&first) {
                    SetAction::Remove
                } else {
                    SetAction::Next
                }
            });
            let before = m.len();
            m.retain(|key| key.first() != Some(&first));
            prop_assert_eq!(removed, before - m.len());
        }
        Op::Clear => {
            s.clear();
            m.clear();
        }
        Op::Shrink => {
            prop_assert!(s.shrink_to_fit().is_ok());
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=2000)) {
        let mut s = BlobSet::new();
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();

        for op in ops {
            apply(&mut s, &mut m, op)?;
            prop_assert_eq!(s.len(), m.len());
        }

        let issues = s.verify();
        prop_assert!(issues.is_empty(), "{:?}", issues);
        let expected: Vec<Vec<u8>> = m.into_iter().collect();
        prop_assert_eq!(sorted_keys(&s), expected);
    }

    #[test]
    fn prop_view_matches_each(keys in prop::collection::vec(key_strategy(), 0..200)) {
        let mut s: BlobSet = keys.iter().collect();

        let mut from_each = Vec::new();
        s.each(|key| {
            from_each.push(key.to_vec());
            SetAction::Next
        });

        let mut from_view = Vec::new();
        let mut v = s.view();
        while v.is_valid() {
            from_view.push(v.key().unwrap_or_default().to_vec());
            v.advance();
        }
        prop_assert_eq!(&from_view, &from_each);

        let mut from_cursor = Vec::new();
        let mut c = s.cursor();
        while !c.is_done(&s) {
            if let Some(key) = c.key(&s).unwrap() {
                from_cursor.push(key.to_vec());
            }
            c.advance(&s).unwrap();
        }
        prop_assert_eq!(&from_cursor, &from_each);
    }

    #[test]
    fn prop_drain_in_one_pass(keys in prop::collection::vec(key_strategy(), 0..300)) {
        let mut s: BlobSet = keys.iter().collect();
        let expected = s.len();
        let mut seen = BTreeSet::new();
        let removed = s.each(|key| {
            assert!(seen.insert(key.to_vec()), "key visited twice");
            SetAction::Remove
        });
        prop_assert_eq!(removed, expected);
        prop_assert_eq!(seen.len(), expected);
        prop_assert!(s.is_empty());
        prop_assert!(s.verify().is_empty());
    }

    #[test]
    fn prop_compare_symmetric(
        a in prop::collection::btree_set(key_strategy(), 0..40),
        b in prop::collection::btree_set(key_strategy(), 0..40),
    ) {
        let sa: BlobSet = a.iter().collect();
        let sb: BlobSet = b.iter().rev().collect();
        prop_assert_eq!(sa.compare(&sb), a == b);
        prop_assert_eq!(sa.compare(&sb), sb.compare(&sa));

        let sa2: BlobSet = a.iter().rev().collect();
        prop_assert!(sa.compare(&sa2));
    }
}

#[test]
fn exhaustive_remove_order_small_set() {
    fn for_each_permutation<T: Clone>(items: &[T], f: &mut impl FnMut(Vec<T>)) {
        fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
            if out.len() == items.len() {
                f(out.clone());
                return;
            }
            for i in 0..items.len() {
                if used[i] {
                    continue;
                }
                used[i] = true;
                out.push(items[i].clone());
                rec(items, used, out, f);
                out.pop();
                used[i] = false;
            }
        }

        let mut used = vec![false; items.len()];
        let mut out = Vec::with_capacity(items.len());
        rec(items, &mut used, &mut out, f);
    }

    // All keys share one chain, so every removal order exercises a
    // different tombstone layout.
    let keys: Vec<Vec<u8>> = vec![
        b"".to_vec(),
        b"\0".to_vec(),
        b"a".to_vec(),
        b"aa".to_vec(),
        b"a\0".to_vec(),
        b"b".to_vec(),
    ];

    let mut base = BlobSet::with_hasher(testutil::Collide);
    for k in &keys {
        assert!(base.add(k));
    }

    for_each_permutation(&keys, &mut |perm| {
        let mut s = base.clone();
        for (i, k) in perm.iter().enumerate() {
            assert!(s.remove(k));
            assert_eq!(s.len(), keys.len() - i - 1);
            for (j, rest) in perm.iter().enumerate() {
                assert_eq!(s.contains(rest), j > i, "after removing {i} keys");
            }
            assert!(s.verify().is_empty(), "{:?}", s.verify());
        }
        assert!(s.is_empty());
    });
}
