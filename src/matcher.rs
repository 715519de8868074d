//! Candidate verification and the scalar reference matcher.

use crate::config::MatchPolicy;
use crate::overflow::compare_overflow;
use crate::simd::{self, low_lanes, Block, LANES};
use crate::string_set::StringView;
use crate::table::SlotTable;

/// A member that is a prefix of the search string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchResult<'a> {
    /// Slot (insertion) index of the member
    pub index: usize,
    /// Bytes of the search string consumed; always the member's full length
    pub matched: usize,
    /// The member itself
    pub string: StringView<'a>,
}

/// A search string staged for lane comparison.
pub(crate) struct Search<'s> {
    pub(crate) bytes: &'s [u8],
    /// First `width` bytes, zero-padded
    pub(crate) block: Block,
    /// `min(bytes.len(), 16)`
    pub(crate) width: u8,
}

impl<'s> Search<'s> {
    #[inline]
    pub(crate) fn new(bytes: &'s [u8]) -> Self {
        Self {
            bytes,
            block: Block::load_prefix(bytes),
            width: bytes.len().min(LANES) as u8,
        }
    }
}

/// Running choice between successful candidates.
struct Selection<'t> {
    policy: MatchPolicy,
    best: Option<MatchResult<'t>>,
}

impl<'t> Selection<'t> {
    fn new(policy: MatchPolicy) -> Self {
        Self { policy, best: None }
    }

    /// Offer a match from a slot higher than any offered before. Returns
    /// true once no later offer can change the outcome.
    #[inline]
    fn offer(&mut self, found: MatchResult<'t>) -> bool {
        match self.policy {
            MatchPolicy::First => {
                self.best = Some(found);
                true
            }
            MatchPolicy::Longest => {
                if self.best.map_or(true, |best| found.matched > best.matched) {
                    self.best = Some(found);
                }
                false
            }
        }
    }
}

/// Verify the slots in `candidates` in ascending order.
pub(crate) fn verify<'t>(
    table: &'t SlotTable,
    search: &Search<'_>,
    candidates: u16,
    policy: MatchPolicy,
) -> Option<MatchResult<'t>> {
    let mut selection = Selection::new(policy);
    let mut bits = candidates;
    while bits != 0 {
        let index = bits.trailing_zeros() as usize;
        bits &= bits - 1;
        if let Some(found) = verify_slot(table, search, index) {
            if selection.offer(found) {
                break;
            }
        }
    }
    selection.best
}

/// Full comparison of one slot against the search string.
///
/// Only the slot's own width is checked against the staged search block;
/// padding lanes are ignored, so a search holding a NUL where the slot's
/// padding is cannot produce a false match.
#[inline]
fn verify_slot<'t>(table: &'t SlotTable, search: &Search<'_>, index: usize) -> Option<MatchResult<'t>> {
    let member = table.get(index)?;
    let width = member.len().min(LANES);
    if width > usize::from(search.width) {
        return None;
    }

    let want = low_lanes(width);
    if simd::eq_mask(&table.slot_block(index).0, &search.block.0) & want != want {
        return None;
    }

    let matched = if table.continuation_bitmap() & (1 << index) != 0 {
        LANES + compare_overflow(search.bytes, member.as_bytes(), LANES)?
    } else {
        member.len()
    };

    Some(MatchResult {
        index,
        matched,
        string: member,
    })
}

/// Linear byte-by-byte scan over every occupied slot, honoring `policy`.
/// No vector instructions; this is the reference the vector path must
/// agree with.
pub(crate) fn find_scalar<'t>(
    table: &'t SlotTable,
    search: &[u8],
    policy: MatchPolicy,
) -> Option<MatchResult<'t>> {
    let mut selection = Selection::new(policy);
    for (index, member) in table.string_set().iter().enumerate() {
        if member.len() > search.len() {
            continue;
        }
        let common = member
            .iter()
            .zip(search)
            .take_while(|(a, b)| a == b)
            .count();
        if common != member.len() {
            continue;
        }
        let found = MatchResult {
            index,
            matched: common,
            string: member,
        };
        if selection.offer(found) {
            break;
        }
    }
    selection.best
}
