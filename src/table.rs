//! The 16-slot prefix table.

use std::fmt;

use crate::builder;
use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::matcher::{self, MatchResult, Search};
use crate::simd::{self, low_lanes, Block, FilterLanes, LANES};
use crate::string_set::{StringSet, StringView, STRINGS_PER_TABLE};

/// Length lane value of an unoccupied slot. Larger than any search width,
/// so the length test always rejects it.
pub const EMPTY_SLOT_LENGTH: u8 = 127;

// =============================================================================
// SlotTable
// =============================================================================

/// Up to 16 byte strings laid out for vector prefix queries.
///
/// Each member occupies one slot holding its first 16 bytes, zero-padded.
/// Members longer than 16 bytes are "continuation" slots: the rest of the
/// member is compared from the owned [`StringSet`] after the slot matches.
///
/// A query gathers one distinguishing byte per slot from the search string
/// with a single shuffle, drops slots whose byte or length rules them out,
/// and fully compares only the survivors.
///
/// The table is immutable after construction and can be shared between
/// threads without locking.
#[derive(Clone)]
pub struct SlotTable {
    filter: FilterLanes,
    slots: [Block; STRINGS_PER_TABLE],
    occupied: u16,
    continuation: u16,
    degenerate: u16,
    config: TableConfig,
    strings: StringSet,
}

impl SlotTable {
    /// Build a table over `strings` with the default configuration.
    pub fn build(strings: StringSet) -> Result<Self> {
        Self::build_with(strings, TableConfig::default())
    }

    /// Build a table over `strings`.
    ///
    /// Fails with [`Error::TooManyElements`] for more than 16 members and,
    /// under [`DegeneratePolicy::Reject`](crate::DegeneratePolicy::Reject),
    /// with [`Error::DegenerateUniqueAssignment`] when some member cannot be
    /// given a distinguishing byte.
    pub fn build_with(strings: StringSet, config: TableConfig) -> Result<Self> {
        let count = strings.len();
        if count > STRINGS_PER_TABLE {
            return Err(Error::TooManyElements {
                count,
                max: STRINGS_PER_TABLE,
            });
        }
        if count == 0 {
            return Err(Error::invalid_input("cannot build a table from an empty set"));
        }

        let mut slots = [Block::default(); STRINGS_PER_TABLE];
        let mut lengths = Block::splat(EMPTY_SLOT_LENGTH);
        let mut true_lengths = [0usize; STRINGS_PER_TABLE];
        let mut continuation = 0u16;

        for (slot, member) in strings.iter().enumerate() {
            slots[slot] = Block(strings.block(slot));
            true_lengths[slot] = member.len();
            lengths.0[slot] = member.len().min(LANES) as u8;
            if member.len() > LANES {
                continuation |= 1 << slot;
            }
        }

        let assignment = builder::assign(
            &slots[..count],
            &true_lengths[..count],
            config.degenerate_policy,
        )?;

        let table = Self {
            filter: FilterLanes {
                unique_chars: assignment.unique_chars,
                unique_index: assignment.unique_index,
                lengths,
            },
            slots,
            occupied: low_lanes(count),
            continuation,
            degenerate: assignment.degenerate,
            config,
            strings,
        };

        tracing::debug!(
            count,
            continuation = format_args!("{:#06x}", table.continuation),
            degenerate = format_args!("{:#06x}", table.degenerate),
            match_policy = %config.match_policy,
            backend = simd::backend_name(config.backend),
            "built slot table"
        );
        Ok(table)
    }

    /// Split `buffer` on `delimiter` and build a table with the default
    /// configuration.
    ///
    /// ```
    /// use slot_table::SlotTable;
    ///
    /// let table = SlotTable::from_delimited(b"GET;POST;PUT", b';').unwrap();
    /// let m = table.find_prefix(b"POST /index.html").unwrap();
    /// assert_eq!(m.index, 1);
    /// assert_eq!(m.matched, 4);
    /// ```
    pub fn from_delimited(buffer: &[u8], delimiter: u8) -> Result<Self> {
        Self::build(StringSet::from_delimited(buffer, delimiter)?)
    }

    /// Build from a delimited environment variable, with the configuration
    /// taken from `SLOT_TABLE_*`.
    pub fn from_env(name: &str, delimiter: u8) -> Result<Self> {
        let config = TableConfig::from_env()?;
        Self::build_with(StringSet::from_env(name, delimiter)?, config)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Find a member that is a prefix of `search`, chosen by the table's
    /// [`MatchPolicy`](crate::MatchPolicy).
    ///
    /// An empty search never matches (the empty string is never a member).
    #[inline]
    pub fn find_prefix(&self, search: &[u8]) -> Option<MatchResult<'_>> {
        if search.is_empty() {
            return None;
        }
        let search = Search::new(search);
        let candidates =
            simd::filter_mask(&self.filter, &search.block, search.width, self.config.backend)
                & self.occupied;
        matcher::verify(self, &search, candidates, self.config.match_policy)
    }

    /// Verify exactly the slots whose bit is set in `slots`, without the
    /// vector filters. Bits past the occupied range are ignored.
    ///
    /// With `slots == self.occupied_bitmap()` this gives the same answer as
    /// [`find_prefix`](Self::find_prefix).
    pub fn find_prefix_in(&self, search: &[u8], slots: u16) -> Option<MatchResult<'_>> {
        let slots = slots & self.occupied;
        if search.is_empty() || slots == 0 {
            return None;
        }
        matcher::verify(self, &Search::new(search), slots, self.config.match_policy)
    }

    /// Slots that survive the unique-character and length filters for
    /// `search`. Every member that is a prefix of `search` is in this set;
    /// other slots may be too.
    pub fn candidates(&self, search: &[u8]) -> u16 {
        if search.is_empty() {
            return 0;
        }
        let search = Search::new(search);
        simd::filter_mask(&self.filter, &search.block, search.width, self.config.backend)
            & self.occupied
    }

    /// Linear byte-by-byte scan with the same policy as
    /// [`find_prefix`](Self::find_prefix). Always agrees with it.
    pub fn find_prefix_scalar(&self, search: &[u8]) -> Option<MatchResult<'_>> {
        matcher::find_scalar(self, search, self.config.match_policy)
    }

    /// True iff some member is a prefix of `search`.
    #[inline]
    pub fn is_prefix_match(&self, search: &[u8]) -> bool {
        self.find_prefix(search).is_some()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.occupied.count_ones() as usize
    }

    /// Number of occupied slots, 1 to 16.
    #[inline]
    pub fn occupied_count(&self) -> u8 {
        self.occupied.count_ones() as u8
    }

    /// Always false for a successfully built table.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Bit `i` set iff slot `i` holds a member. Always the low
    /// [`len`](Self::len) bits.
    #[inline]
    pub fn occupied_bitmap(&self) -> u16 {
        self.occupied
    }

    /// Bit `i` set iff member `i` is longer than 16 bytes.
    #[inline]
    pub fn continuation_bitmap(&self) -> u16 {
        self.continuation
    }

    /// Bit `i` set iff slot `i` got no distinguishing byte and is always
    /// compared.
    #[inline]
    pub fn degenerate_bitmap(&self) -> u16 {
        self.degenerate
    }

    /// Distinguishing byte per slot.
    pub fn unique_chars(&self) -> &[u8; LANES] {
        &self.filter.unique_chars.0
    }

    /// Position of the distinguishing byte per slot; `0x80` for a slot that
    /// always passes.
    pub fn unique_index(&self) -> &[u8; LANES] {
        &self.filter.unique_index.0
    }

    /// `min(len, 16)` per occupied slot, [`EMPTY_SLOT_LENGTH`] elsewhere.
    /// The true length of a member is `self.get(i).len()`.
    pub fn lengths(&self) -> &[u8; LANES] {
        &self.filter.lengths.0
    }

    /// First 16 bytes of slot `index`, zero-padded.
    pub fn slot(&self, index: usize) -> Option<&[u8; LANES]> {
        if index < self.len() {
            Some(&self.slots[index].0)
        } else {
            None
        }
    }

    /// Member in slot `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<StringView<'_>> {
        self.strings.get(index)
    }

    pub fn string_set(&self) -> &StringSet {
        &self.strings
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Give back the owned members.
    pub fn into_string_set(self) -> StringSet {
        self.strings
    }

    /// Name of the filter implementation queries run on.
    pub fn backend_name(&self) -> &'static str {
        simd::backend_name(self.config.backend)
    }

    /// Same members, different configuration. The unique-character
    /// assignment is only redone when the degenerate policy changes.
    pub fn reconfigure(self, config: TableConfig) -> Result<Self> {
        if config.degenerate_policy == self.config.degenerate_policy {
            return Ok(Self { config, ..self });
        }
        Self::build_with(self.strings, config)
    }

    #[inline]
    pub(crate) fn slot_block(&self, index: usize) -> &Block {
        &self.slots[index]
    }
}

impl fmt::Debug for SlotTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotTable")
            .field("strings", &self.strings)
            .field("occupied", &format_args!("{:#06x}", self.occupied))
            .field("continuation", &format_args!("{:#06x}", self.continuation))
            .field("unique_chars", &self.filter.unique_chars)
            .field("unique_index", &self.filter.unique_index)
            .field("lengths", &self.filter.lengths)
            .field("config", &self.config)
            .finish()
    }
}
