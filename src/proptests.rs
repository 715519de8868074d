use super::*;

use proptest::prelude::*;

fn member_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A tiny alphabet (NUL included) so members share prefixes and collide
    // on unique-character positions often. Lengths straddle the 16-byte slot.
    prop::collection::vec(prop::sample::select(vec![0u8, b'a', b'b', b'c']), 1..=40)
}

fn members_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(member_strategy(), 1..=STRINGS_PER_TABLE)
}

/// Members plus a search string built by extending one of them (or not).
fn table_and_search() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<u8>)> {
    members_strategy().prop_flat_map(|members| {
        let n = members.len();
        let tail =
            prop::collection::vec(prop::sample::select(vec![0u8, b'a', b'b', b'c', b'z']), 0..=24);
        (Just(members), 0..n, any::<bool>(), tail).prop_map(|(members, pick, extend, tail)| {
            let mut search = if extend { members[pick].clone() } else { Vec::new() };
            search.extend_from_slice(&tail);
            (members, search)
        })
    })
}

fn build(members: &[Vec<u8>], config: TableConfig) -> SlotTable {
    SlotTable::build_with(StringSet::from_strings(members).unwrap(), config).unwrap()
}

fn policies() -> [TableConfig; 2] {
    [
        TableConfig::default(),
        TableConfig::default().with_match_policy(MatchPolicy::Longest),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        max_shrink_iters: 20_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_vector_equals_scalar((members, search) in table_and_search()) {
        for config in policies() {
            let t = build(&members, config);
            prop_assert_eq!(t.find_prefix(&search), t.find_prefix_scalar(&search));
        }
    }

    #[test]
    fn prop_result_is_a_prefix((members, search) in table_and_search()) {
        for config in policies() {
            let t = build(&members, config);
            if let Some(m) = t.find_prefix(&search) {
                prop_assert!(m.matched >= 1);
                prop_assert_eq!(m.matched, m.string.len());
                prop_assert_eq!(m.string.as_bytes(), &members[m.index][..]);
                prop_assert!(search.starts_with(m.string.as_bytes()));
            }
        }
    }

    #[test]
    fn prop_completeness((members, search) in table_and_search()) {
        let t = build(&members, TableConfig::default());
        let first = members.iter().position(|m| search.starts_with(m));
        prop_assert_eq!(t.find_prefix(&search).map(|m| m.index), first);

        let t = build(&members, TableConfig::default().with_match_policy(MatchPolicy::Longest));
        let longest = members
            .iter()
            .enumerate()
            .filter(|(_, m)| search.starts_with(m))
            .fold(None::<(usize, usize)>, |best, (i, m)| match best {
                Some((_, len)) if len >= m.len() => best,
                _ => Some((i, m.len())),
            });
        prop_assert_eq!(t.find_prefix(&search).map(|m| (m.index, m.matched)), longest);
    }

    #[test]
    fn prop_candidates_cover_every_prefix((members, search) in table_and_search()) {
        let t = build(&members, TableConfig::default());
        let candidates = t.candidates(&search);
        for (i, m) in members.iter().enumerate() {
            if search.starts_with(m) {
                prop_assert!(candidates & (1 << i) != 0, "slot {} filtered out", i);
            }
        }
    }

    #[test]
    fn prop_idempotent((members, search) in table_and_search()) {
        let t = build(&members, TableConfig::default());
        prop_assert_eq!(t.find_prefix(&search), t.find_prefix(&search));
        let u = t.clone();
        prop_assert_eq!(t.find_prefix(&search), u.find_prefix(&search));
    }

    #[test]
    fn prop_every_member_finds_itself(members in members_strategy()) {
        let t = build(&members, TableConfig::default());
        for (i, m) in members.iter().enumerate() {
            let found = t.find_prefix(m);
            prop_assert!(found.is_some());
            // First policy: the lowest-index member that is a prefix of `m`
            let expected = members.iter().position(|x| m.starts_with(x));
            prop_assert_eq!(found.map(|f| f.index), expected);
            prop_assert!(expected.unwrap_or(usize::MAX) <= i);
        }
    }

    #[test]
    fn prop_delimited_round_trip(members in members_strategy()) {
        // ';' is outside the member alphabet
        let joined = members.join(&b';');
        let set = StringSet::from_delimited(&joined, b';').unwrap();
        prop_assert_eq!(set.len(), members.len());
        for (view, m) in set.iter().zip(&members) {
            prop_assert_eq!(view.as_bytes(), &m[..]);
        }
        prop_assert_eq!(set.min_len(), members.iter().map(Vec::len).min().unwrap());
        prop_assert_eq!(set.max_len(), members.iter().map(Vec::len).max().unwrap());

        let t = SlotTable::build(set).unwrap();
        prop_assert_eq!(usize::from(t.occupied_count()), members.len());
        for (i, m) in members.iter().enumerate() {
            prop_assert_eq!(t.get(i).unwrap().as_bytes(), &m[..]);
            let slot = t.slot(i).unwrap();
            let n = m.len().min(16);
            prop_assert_eq!(&slot[..n], &m[..n]);
            prop_assert!(slot[n..].iter().all(|&b| b == 0));
            prop_assert_eq!(usize::from(t.lengths()[i]), n);
            prop_assert_eq!(t.continuation_bitmap() & (1 << i) != 0, m.len() > 16);
        }
    }

    #[test]
    fn prop_unique_pairs((members, _search) in table_and_search()) {
        let t = build(&members, TableConfig::default());
        let mut seen = std::collections::HashSet::new();
        for (i, m) in members.iter().enumerate() {
            if t.degenerate_bitmap() & (1 << i) != 0 {
                prop_assert_eq!(t.unique_index()[i], 0x80);
                continue;
            }
            let pos = usize::from(t.unique_index()[i]);
            prop_assert!(pos < m.len().min(16));
            prop_assert_eq!(m[pos], t.unique_chars()[i]);
            prop_assert!(seen.insert((pos, m[pos])));
        }
    }

    #[test]
    fn prop_find_prefix_in_occupied_agrees((members, search) in table_and_search()) {
        for config in policies() {
            let t = build(&members, config);
            prop_assert_eq!(t.find_prefix_in(&search, t.occupied_bitmap()), t.find_prefix(&search));
        }
    }

    #[test]
    fn prop_string_set_scan_agrees((members, search) in table_and_search()) {
        let t = build(&members, TableConfig::default());
        prop_assert_eq!(t.string_set().find_prefix(&search), t.find_prefix(&search));
    }

    #[test]
    fn prop_scalar_backend_agrees((members, search) in table_and_search()) {
        for config in policies() {
            let vector = build(&members, config);
            let scalar = build(&members, config.with_backend(Backend::Scalar));
            prop_assert_eq!(vector.candidates(&search), scalar.candidates(&search));
            prop_assert_eq!(vector.find_prefix(&search), scalar.find_prefix(&search));
        }
    }

    #[test]
    fn prop_compare_overflow(
        target in prop::collection::vec(any::<u8>(), 17..=80),
        extra in prop::collection::vec(any::<u8>(), 0..=8),
        flip in any::<prop::sample::Index>(),
    ) {
        let mut search = target.clone();
        search.extend_from_slice(&extra);
        prop_assert_eq!(compare_overflow(&search, &target, 16), Some(target.len() - 16));

        let pos = 16 + flip.index(target.len() - 16);
        search[pos] ^= 0x01;
        prop_assert_eq!(compare_overflow(&search, &target, 16), None);
        prop_assert_eq!(compare_overflow(&target[..target.len() - 1], &target, 16), None);
    }
}
