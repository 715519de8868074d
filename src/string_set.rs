//! Owned, flattened collections of short byte strings.
//!
//! A [`StringSet`] copies every member into one zeroed buffer. Each member
//! starts at a 16-byte boundary of that buffer and owns a whole number of
//! 16-byte blocks, so the first block of any member can be read as a full,
//! zero-padded `[u8; 16]` without looking past the allocation.

use std::fmt;
use std::ops::Deref;

use crate::alloc::{try_reserve, ByteAllocator, GlobalAllocator};
use crate::error::{Error, Result};
use crate::matcher::MatchResult;

/// Longest member a set accepts.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Members per [`SlotTable`](crate::SlotTable).
pub const STRINGS_PER_TABLE: usize = 16;

const BLOCK: usize = 16;

// =============================================================================
// StringView
// =============================================================================

/// Borrowed view of one member (or any caller buffer) with an explicit
/// length.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringView<'a> {
    bytes: &'a [u8],
}

impl<'a> StringView<'a> {
    /// Wrap `bytes`, rejecting buffers longer than [`MAX_STRING_LEN`].
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() > MAX_STRING_LEN {
            return Err(Error::invalid_input(format!(
                "string of {} bytes exceeds the {MAX_STRING_LEN} byte limit",
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Deref for StringView<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.bytes
    }
}

impl AsRef<[u8]> for StringView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl fmt::Debug for StringView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.bytes.escape_ascii())
    }
}

// =============================================================================
// Delimiter splitting
// =============================================================================

/// Non-empty pieces of `buffer` between occurrences of `delimiter`.
#[derive(Clone)]
struct Delimited<'a> {
    rest: &'a [u8],
    delimiter: u8,
    done: bool,
}

impl<'a> Delimited<'a> {
    fn new(buffer: &'a [u8], delimiter: u8) -> Self {
        Self {
            rest: buffer,
            delimiter,
            done: false,
        }
    }
}

impl<'a> Iterator for Delimited<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        while !self.done {
            let piece = match memchr::memchr(self.delimiter, self.rest) {
                Some(i) => {
                    let piece = &self.rest[..i];
                    self.rest = &self.rest[i + 1..];
                    piece
                }
                None => {
                    self.done = true;
                    self.rest
                }
            };
            if !piece.is_empty() {
                return Some(piece);
            }
        }
        None
    }
}

// =============================================================================
// StringSet
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Span {
    /// Byte offset into `buffer`; always a multiple of 16.
    offset: usize,
    len: u16,
}

/// Ordered, immutable collection of non-empty byte strings.
///
/// Insertion order is preserved and becomes slot order when the set is
/// turned into a [`SlotTable`](crate::SlotTable). `Clone` is a deep copy.
#[derive(Clone, PartialEq, Eq)]
pub struct StringSet {
    buffer: Vec<u8>,
    spans: Vec<Span>,
    min_len: u16,
    max_len: u16,
}

impl StringSet {
    /// Split `buffer` on `delimiter` and copy every non-empty piece.
    ///
    /// Runs of delimiters collapse, and leading or trailing delimiters
    /// produce nothing. An input with no content is
    /// [`Error::InvalidInput`].
    ///
    /// ```
    /// use slot_table::StringSet;
    ///
    /// let set = StringSet::from_delimited(b";Mft;;MftMirr;Data;", b';').unwrap();
    /// assert_eq!(set.len(), 3);
    /// assert_eq!(set.get(1).unwrap().as_bytes(), b"MftMirr");
    /// ```
    pub fn from_delimited(buffer: &[u8], delimiter: u8) -> Result<Self> {
        Self::from_delimited_in(buffer, delimiter, &GlobalAllocator)
    }

    /// [`from_delimited`](Self::from_delimited) with an explicit allocator.
    pub fn from_delimited_in<A: ByteAllocator>(
        buffer: &[u8],
        delimiter: u8,
        allocator: &A,
    ) -> Result<Self> {
        Self::copy_from(Delimited::new(buffer, delimiter), allocator)
    }

    /// Deep-copy an explicit list. Empty items are skipped.
    pub fn from_strings<S: AsRef<[u8]>>(items: &[S]) -> Result<Self> {
        Self::from_strings_in(items, &GlobalAllocator)
    }

    /// [`from_strings`](Self::from_strings) with an explicit allocator.
    pub fn from_strings_in<S: AsRef<[u8]>, A: ByteAllocator>(
        items: &[S],
        allocator: &A,
    ) -> Result<Self> {
        let pieces = items.iter().map(|s| s.as_ref()).filter(|s| !s.is_empty());
        Self::copy_from(pieces, allocator)
    }

    /// Read the environment variable `name` and split its value on
    /// `delimiter`.
    pub fn from_env(name: &str, delimiter: u8) -> Result<Self> {
        let value = std::env::var_os(name).ok_or_else(|| {
            Error::invalid_input(format!("environment variable {name} is not set"))
        })?;
        Self::from_delimited(&value.into_encoded_bytes(), delimiter)
    }

    fn copy_from<'s, I, A>(pieces: I, allocator: &A) -> Result<Self>
    where
        I: Iterator<Item = &'s [u8]> + Clone,
        A: ByteAllocator,
    {
        // Sizing pass.
        let mut count = 0usize;
        let mut total = 0usize;
        let mut min_len = u16::MAX;
        let mut max_len = 0u16;
        for piece in pieces.clone() {
            let len = u16::try_from(piece.len()).map_err(|_| {
                Error::invalid_input(format!(
                    "element {count} is {} bytes; the limit is {MAX_STRING_LEN}",
                    piece.len()
                ))
            })?;
            total = total
                .checked_add(padded_len(piece.len()))
                .ok_or(Error::AllocationFailure { size: usize::MAX })?;
            min_len = min_len.min(len);
            max_len = max_len.max(len);
            count += 1;
        }

        if count == 0 {
            return Err(Error::invalid_input("no non-empty elements"));
        }

        let mut buffer = allocator.allocate(total)?;
        let mut spans = Vec::new();
        try_reserve(&mut spans, count)?;

        // Copy pass.
        let mut offset = 0usize;
        for piece in pieces {
            buffer[offset..offset + piece.len()].copy_from_slice(piece);
            spans.push(Span {
                offset,
                len: piece.len() as u16,
            });
            offset += padded_len(piece.len());
        }
        debug_assert_eq!(offset, total);

        tracing::debug!(count, min_len, max_len, bytes = total, "built string set");

        Ok(Self {
            buffer,
            spans,
            min_len,
            max_len,
        })
    }

    /// Number of members; never zero.
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Always false: construction rejects empty sets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    #[inline]
    pub fn min_len(&self) -> usize {
        usize::from(self.min_len)
    }

    #[inline]
    pub fn max_len(&self) -> usize {
        usize::from(self.max_len)
    }

    /// Number of 16-slot tables needed to hold every member.
    pub fn required_table_count(&self) -> usize {
        self.len().div_ceil(STRINGS_PER_TABLE)
    }

    /// Member `index`, if present.
    #[inline]
    pub fn get(&self, index: usize) -> Option<StringView<'_>> {
        self.spans.get(index).map(|span| self.view(*span))
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = StringView<'_>> + '_ {
        self.spans.iter().map(|span| self.view(*span))
    }

    /// First member (in insertion order) that is a prefix of `search`.
    ///
    /// Linear scan with no size limit; for sets of up to 16 members it
    /// agrees with a [`MatchPolicy::First`](crate::MatchPolicy::First)
    /// table built from the same set.
    pub fn find_prefix(&self, search: &[u8]) -> Option<MatchResult<'_>> {
        self.iter()
            .enumerate()
            .find(|(_, member)| search.starts_with(member))
            .map(|(index, string)| MatchResult {
                index,
                matched: string.len(),
                string,
            })
    }

    /// First 16 bytes of member `index`, zero-padded.
    #[inline]
    pub(crate) fn block(&self, index: usize) -> [u8; BLOCK] {
        let offset = self.spans[index].offset;
        let mut out = [0u8; BLOCK];
        out.copy_from_slice(&self.buffer[offset..offset + BLOCK]);
        out
    }

    #[inline]
    fn view(&self, span: Span) -> StringView<'_> {
        StringView {
            bytes: &self.buffer[span.offset..span.offset + usize::from(span.len)],
        }
    }
}

#[inline]
fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK) * BLOCK
}

impl fmt::Debug for StringSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
