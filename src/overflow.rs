//! Comparison of the bytes of a long member that lie past its slot.

use crate::simd::{self, Block, ALL_LANES, LANES};

/// Compare `target[offset..]` against `search[offset..]`.
///
/// The caller has already verified the first `offset` bytes. Returns the
/// number of additional bytes matched (`target.len() - offset`) when all of
/// `target` from `offset` on is present in `search`, and `None` when
/// `target` is longer than `search` or any byte differs.
///
/// Whole 16-byte chunks are compared in place. The final partial chunk of
/// each side is copied into a zeroed block first, so neither buffer is read
/// past its end.
pub fn compare_overflow(search: &[u8], target: &[u8], offset: usize) -> Option<usize> {
    if target.len() > search.len() {
        return None;
    }
    let offset = offset.min(target.len());

    let mut a = &search[offset..target.len()];
    let mut b = &target[offset..];
    while let (Some((chunk_a, rest_a)), Some((chunk_b, rest_b))) =
        (a.split_first_chunk::<LANES>(), b.split_first_chunk::<LANES>())
    {
        if simd::eq_mask(chunk_a, chunk_b) != ALL_LANES {
            return None;
        }
        a = rest_a;
        b = rest_b;
    }

    if !b.is_empty() {
        let tail_a = Block::load_prefix(a);
        let tail_b = Block::load_prefix(b);
        if simd::eq_mask(&tail_a.0, &tail_b.0) != ALL_LANES {
            return None;
        }
    }

    Some(target.len() - offset)
}
