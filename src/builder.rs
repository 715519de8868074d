//! Unique-character assignment.
//!
//! Each occupied slot gets one (position, byte) pair that no shorter member
//! already claimed. At query time a slot can only be a candidate if the
//! search string has that byte at that position.
//!
//! Slots are processed by ascending length, ties by slot index. For each
//! slot the first position (from 0) whose byte is still unclaimed at that
//! position wins. Positions are limited to the slot width, `min(len, 16)`,
//! so a gathered byte is always one the slot itself holds.

use crate::config::DegeneratePolicy;
use crate::error::{Error, Result};
use crate::simd::{Block, ALWAYS_PASS_INDEX, LANES};

/// Output of [`assign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Assignment {
    pub(crate) unique_chars: Block,
    pub(crate) unique_index: Block,
    /// Slots with no distinguishing pair; they always pass the filter.
    pub(crate) degenerate: u16,
}

/// One 256-bit set of claimed byte values per position.
struct ClaimedBytes([[u64; 4]; LANES]);

impl ClaimedBytes {
    fn new() -> Self {
        Self([[0; 4]; LANES])
    }

    /// Claim `byte` at `position`. Returns false if it was already taken.
    #[inline]
    fn claim(&mut self, position: usize, byte: u8) -> bool {
        let word = &mut self.0[position][usize::from(byte >> 6)];
        let bit = 1u64 << (byte & 63);
        if *word & bit != 0 {
            return false;
        }
        *word |= bit;
        true
    }
}

/// Assign a unique (position, byte) pair to each of `slots`, whose true
/// member lengths are `lengths`.
///
/// Unoccupied lanes are left as zero; the length lane keeps them out of
/// every candidate set.
pub(crate) fn assign(
    slots: &[Block],
    lengths: &[usize],
    policy: DegeneratePolicy,
) -> Result<Assignment> {
    debug_assert_eq!(slots.len(), lengths.len());
    debug_assert!(slots.len() <= LANES);

    let mut order: [usize; LANES] = std::array::from_fn(|i| i);
    let order = &mut order[..slots.len()];
    order.sort_by_key(|&slot| (lengths[slot], slot));

    let mut claimed = ClaimedBytes::new();
    let mut out = Assignment {
        unique_chars: Block::default(),
        unique_index: Block::default(),
        degenerate: 0,
    };

    for &slot in order.iter() {
        let width = lengths[slot].min(LANES);
        let bytes = &slots[slot].0;
        let pick = (0..width).find(|&position| claimed.claim(position, bytes[position]));

        match pick {
            Some(position) => {
                out.unique_chars.0[slot] = bytes[position];
                out.unique_index.0[slot] = position as u8;
            }
            None => match policy {
                DegeneratePolicy::AlwaysCompare => {
                    tracing::warn!(
                        slot,
                        len = lengths[slot],
                        "no distinguishing byte for slot; it will always be compared"
                    );
                    out.unique_chars.0[slot] = 0;
                    out.unique_index.0[slot] = ALWAYS_PASS_INDEX;
                    out.degenerate |= 1 << slot;
                }
                DegeneratePolicy::Reject => {
                    return Err(Error::DegenerateUniqueAssignment { slot });
                }
            },
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots_of(members: &[&[u8]]) -> (Vec<Block>, Vec<usize>) {
        let slots = members.iter().map(|m| Block::load_prefix(m)).collect();
        let lengths = members.iter().map(|m| m.len()).collect();
        (slots, lengths)
    }

    fn run(members: &[&[u8]], policy: DegeneratePolicy) -> Result<Assignment> {
        let (slots, lengths) = slots_of(members);
        assign(&slots, &lengths, policy)
    }

    #[test]
    fn test_distinct_first_bytes() {
        let a = run(&[b"one", b"two", b"three"], DegeneratePolicy::AlwaysCompare).unwrap();
        // "one" and "two" go first (length 3), "three" finds 't' taken at 0
        assert_eq!(&a.unique_chars.0[..3], b"oth");
        assert_eq!(&a.unique_index.0[..3], &[0, 0, 1]);
        assert_eq!(a.degenerate, 0);
    }

    #[test]
    fn test_shorter_members_claim_first() {
        let a = run(&[b"abc", b"ab", b"a"], DegeneratePolicy::AlwaysCompare).unwrap();
        assert_eq!(a.unique_index.0[2], 0);
        assert_eq!(a.unique_chars.0[2], b'a');
        assert_eq!(a.unique_index.0[1], 1);
        assert_eq!(a.unique_chars.0[1], b'b');
        assert_eq!(a.unique_index.0[0], 2);
        assert_eq!(a.unique_chars.0[0], b'c');
    }

    #[test]
    fn test_equal_lengths_tie_break_by_index() {
        let a = run(&[b"xa", b"xb"], DegeneratePolicy::AlwaysCompare).unwrap();
        assert_eq!((a.unique_index.0[0], a.unique_chars.0[0]), (0, b'x'));
        assert_eq!((a.unique_index.0[1], a.unique_chars.0[1]), (1, b'b'));
    }

    #[test]
    fn test_pairs_are_unique() {
        let members: [&[u8]; 6] = [b"aa", b"ab", b"ba", b"bb", b"aab", b"abab"];
        let a = run(&members, DegeneratePolicy::AlwaysCompare).unwrap();
        let mut seen = std::collections::HashSet::new();
        for (slot, member) in members.iter().enumerate() {
            if a.degenerate & (1 << slot) != 0 {
                continue;
            }
            let pos = usize::from(a.unique_index.0[slot]);
            assert!(pos < member.len().min(LANES));
            assert_eq!(member[pos], a.unique_chars.0[slot]);
            assert!(seen.insert((pos, a.unique_chars.0[slot])));
        }
    }

    #[test]
    fn test_degenerate_always_compare() {
        let a = run(&[b"a", b"a"], DegeneratePolicy::AlwaysCompare).unwrap();
        assert_eq!(a.degenerate, 0b10);
        assert_eq!(a.unique_index.0[1], ALWAYS_PASS_INDEX);
        assert_eq!(a.unique_chars.0[1], 0);

        // a duplicate of length two still finds its second byte free
        let a = run(&[b"ab", b"ab"], DegeneratePolicy::AlwaysCompare).unwrap();
        assert_eq!(a.degenerate, 0);
        let a = run(&[b"ab", b"ab", b"ab"], DegeneratePolicy::AlwaysCompare).unwrap();
        assert_eq!(a.degenerate, 0b100);
    }

    #[test]
    fn test_degenerate_reject() {
        let err = run(&[b"a", b"b", b"a"], DegeneratePolicy::Reject).unwrap_err();
        assert_eq!(err, Error::DegenerateUniqueAssignment { slot: 2 });
    }

    #[test]
    fn test_long_members_only_use_slot_width() {
        let long = [b'q'; 40];
        let members: [&[u8]; 2] = [&long[..20], &long[..30]];
        let a = run(&members, DegeneratePolicy::AlwaysCompare).unwrap();
        assert_eq!(a.unique_index.0[0], 0);
        assert_eq!(a.unique_index.0[1], 1);

        // sixteen equal long members take one position each
        let members: Vec<&[u8]> = (0..LANES).map(|_| &long[..20]).collect();
        let (slots, lengths) = slots_of(&members);
        let a = assign(&slots, &lengths, DegeneratePolicy::AlwaysCompare).unwrap();
        assert_eq!(a.degenerate, 0);
        assert!(a.unique_index.0.iter().all(|&i| usize::from(i) < LANES));
    }
}
