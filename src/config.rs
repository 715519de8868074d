//! Table configuration.
//!
//! Defaults are what almost every caller wants. The environment loader
//! exists so a host process can flip policies without a rebuild.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default environment variable prefix for [`TableConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "SLOT_TABLE_";

/// Which surviving candidate a query reports when several members are
/// prefixes of the search string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchPolicy {
    /// First satisfying slot in ascending slot (insertion) order.
    #[default]
    First,
    /// Satisfying slot with the most matched characters; ties go to the
    /// lowest slot.
    Longest,
}

/// What the builder does with a slot whose every byte/position pair was
/// already claimed by a shorter member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DegeneratePolicy {
    /// Let the slot pass the unique-character filter unconditionally and
    /// rely on the full comparison.
    #[default]
    AlwaysCompare,
    /// Fail the build with [`Error::DegenerateUniqueAssignment`].
    Reject,
}

/// Candidate filter implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Best vector path for the running CPU.
    #[default]
    Auto,
    /// Portable lane-by-lane filter.
    Scalar,
}

/// Options for [`SlotTable::build_with`](crate::SlotTable::build_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TableConfig {
    /// Tie-break between multiple matching members
    pub match_policy: MatchPolicy,
    /// Handling of slots with no distinguishing byte
    pub degenerate_policy: DegeneratePolicy,
    /// Filter implementation
    pub backend: Backend,
}

impl TableConfig {
    /// Builder-style setter for the match policy.
    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    /// Builder-style setter for the degenerate-slot policy.
    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }

    /// Builder-style setter for the filter backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Load from `SLOT_TABLE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Load from `<prefix>MATCH_POLICY`, `<prefix>DEGENERATE` and
    /// `<prefix>SIMD`. Unset variables keep their defaults.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = env_value(prefix, "MATCH_POLICY")? {
            config.match_policy = value.parse()?;
        }
        if let Some(value) = env_value(prefix, "DEGENERATE")? {
            config.degenerate_policy = value.parse()?;
        }
        let simd_key = format!("{prefix}SIMD");
        if let Some(value) = env_value(prefix, "SIMD")? {
            config.backend = if parse_bool(&simd_key, &value)? {
                Backend::Auto
            } else {
                Backend::Scalar
            };
        }

        tracing::debug!(
            prefix,
            match_policy = %config.match_policy,
            degenerate_policy = %config.degenerate_policy,
            backend = ?config.backend,
            "loaded table config from environment"
        );
        Ok(config)
    }
}

fn env_value(prefix: &str, name: &str) -> Result<Option<String>> {
    let key = format!("{prefix}{name}");
    match std::env::var(&key) {
        Ok(v) => Ok(Some(v.trim().to_owned())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(raw)) => {
            Err(Error::invalid_config(key, raw.to_string_lossy()))
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::invalid_config(key, value)),
    }
}

impl FromStr for MatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "longest" => Ok(Self::Longest),
            _ => Err(Error::invalid_config("match_policy", s)),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "first",
            Self::Longest => "longest",
        })
    }
}

impl FromStr for DegeneratePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compare" | "always-compare" => Ok(Self::AlwaysCompare),
            "reject" => Ok(Self::Reject),
            _ => Err(Error::invalid_config("degenerate_policy", s)),
        }
    }
}

impl fmt::Display for DegeneratePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlwaysCompare => "compare",
            Self::Reject => "reject",
        })
    }
}
