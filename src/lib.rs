//! # slot-table
//!
//! Prefix matching against a small, fixed set of byte strings using 16-lane
//! vector instructions.
//!
//! A [`SlotTable`] holds up to 16 members, one per vector lane. Each member
//! is given a (position, byte) pair that no shorter member claimed first.
//! A query gathers the byte at every member's position from the search
//! string with one shuffle, compares all 16 at once, drops members longer
//! than the search, and only then compares the few survivors in full.
//! Members longer than 16 bytes keep their tail in the owned
//! [`StringSet`] and are finished with a chunked compare.
//!
//! On x86_64 the filter uses SSSE3 when the CPU has it; on aarch64 it uses
//! NEON. Every other target, and [`Backend::Scalar`], runs a portable filter
//! that gives identical results.
//!
//! ## Example
//!
//! ```rust
//! use slot_table::{MatchPolicy, SlotTable, StringSet, TableConfig};
//!
//! let set = StringSet::from_delimited(b"a;ab;abc", b';').unwrap();
//!
//! let first = SlotTable::build(set.clone()).unwrap();
//! let m = first.find_prefix(b"abcd").unwrap();
//! assert_eq!((m.index, m.matched), (0, 1));
//!
//! let config = TableConfig::default().with_match_policy(MatchPolicy::Longest);
//! let longest = SlotTable::build_with(set, config).unwrap();
//! let m = longest.find_prefix(b"abcd").unwrap();
//! assert_eq!(m.string.as_bytes(), b"abc");
//!
//! assert!(longest.find_prefix(b"xyz").is_none());
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

mod alloc;
mod builder;
mod config;
mod error;
mod matcher;
mod overflow;
mod simd;
mod string_set;
mod table;

pub use alloc::{AllocError, ByteAllocator, GlobalAllocator};
pub use config::{Backend, DegeneratePolicy, MatchPolicy, TableConfig, DEFAULT_ENV_PREFIX};
pub use error::{Error, Result};
pub use matcher::MatchResult;
pub use overflow::compare_overflow;
pub use simd::backend_name;
pub use string_set::{StringSet, StringView, MAX_STRING_LEN, STRINGS_PER_TABLE};
pub use table::{SlotTable, EMPTY_SLOT_LENGTH};

#[cfg(test)]
mod proptests;
