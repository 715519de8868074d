//! Error type shared by every construction path.
//!
//! Queries never fail: "no match" is `None`, not an error.

use thiserror::Error;

/// Errors returned while building a [`StringSet`](crate::StringSet) or a
/// [`SlotTable`](crate::SlotTable), or while loading a
/// [`TableConfig`](crate::TableConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The source was empty, all delimiters, or otherwise malformed.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// More members than a single table can hold.
    #[error("too many elements for a single table: {count} (maximum {max})")]
    TooManyElements {
        /// Number of members presented
        count: usize,
        /// Table capacity
        max: usize,
    },

    /// The allocator refused a request.
    #[error("allocation failed: requested {size} bytes")]
    AllocationFailure {
        /// Number of bytes requested
        size: usize,
    },

    /// No unclaimed byte/position pair could be found for a slot and the
    /// table was configured to reject such slots.
    #[error("no distinguishing byte could be assigned to slot {slot}")]
    DegenerateUniqueAssignment {
        /// Slot that could not be distinguished
        slot: usize,
    },

    /// A configuration value could not be parsed.
    #[error("invalid configuration value {value:?} for {key}")]
    InvalidConfig {
        /// Environment variable or option name
        key: String,
        /// The rejected value
        value: String,
    },
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
