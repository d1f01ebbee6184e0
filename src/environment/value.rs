//! Candidate values bound to an environment variable

use std::fmt;
use std::str::FromStr;

use pep440_rs::{Version, VersionSpecifier};
use regex::{Regex, RegexBuilder};

use crate::error::{MarkerError, Result};
use crate::marker::Comparator;

// Flag bits as exposed by Python's `re.Pattern.flags`
pub const RE_IGNORECASE: u32 = 2;
pub const RE_MULTILINE: u32 = 8;
pub const RE_DOTALL: u32 = 16;
/// Always set on `str` patterns; the `regex` crate is Unicode-aware by default
pub const RE_UNICODE: u32 = 32;
pub const RE_VERBOSE: u32 = 64;

const RE_SUPPORTED: u32 = RE_IGNORECASE | RE_MULTILINE | RE_DOTALL | RE_UNICODE | RE_VERBOSE;

/// One candidate value for a variable
///
/// A variable may be bound to several candidates of mixed kinds; each kind
/// only decides the comparators it understands.
#[derive(Debug, Clone)]
pub enum EnvValue {
    /// Exact string, decides `==` and `!=`
    Exact(String),
    /// Compiled pattern, decides `==` (matches) and `!=` (does not match)
    Pattern(Regex),
    /// Parsed PEP 440 version, decides anything expressible as a specifier
    Version(Version),
}

impl EnvValue {
    /// Compare this candidate against `rhs`
    ///
    /// Returns `None` when this kind of candidate cannot decide the
    /// comparator.
    pub fn compare(&self, comparator: Comparator, rhs: &str) -> Option<bool> {
        match self {
            EnvValue::Exact(value) => match comparator {
                Comparator::Equal => Some(value == rhs),
                Comparator::NotEqual => Some(value != rhs),
                _ => None,
            },
            EnvValue::Pattern(pattern) => match comparator {
                Comparator::Equal => Some(pattern.is_match(rhs)),
                Comparator::NotEqual => Some(!pattern.is_match(rhs)),
                _ => None,
            },
            EnvValue::Version(version) => {
                let specifier = format!("{} {}", comparator, rhs);
                VersionSpecifier::from_str(&specifier)
                    .ok()
                    .map(|spec| spec.contains(version))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EnvValue::Exact(_) => "exact",
            EnvValue::Pattern(_) => "pattern",
            EnvValue::Version(_) => "version",
        }
    }
}

/// Compile a pattern candidate for `key`
///
/// `flags` uses Python's `re` bit values. Bits with no `regex` equivalent
/// (`LOCALE`, `ASCII`, `DEBUG`) are rejected instead of ignored.
pub fn compile_pattern(key: &str, pattern: &str, flags: u32) -> Result<Regex> {
    let unsupported = flags & !RE_SUPPORTED;
    if unsupported != 0 {
        return Err(MarkerError::InvalidEnvironment(format!(
            "Unsupported pattern flags {:#x} for {}",
            unsupported, key
        )));
    }

    RegexBuilder::new(pattern)
        .case_insensitive(flags & RE_IGNORECASE != 0)
        .multi_line(flags & RE_MULTILINE != 0)
        .dot_matches_new_line(flags & RE_DOTALL != 0)
        .ignore_whitespace(flags & RE_VERBOSE != 0)
        .build()
        .map_err(|e| {
            MarkerError::InvalidEnvironment(format!("Invalid pattern for {}: {}", key, e))
        })
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Exact(value) => f.write_str(value),
            EnvValue::Pattern(pattern) => f.write_str(pattern.as_str()),
            EnvValue::Version(version) => write!(f, "{}", version),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::Exact(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        EnvValue::Exact(value)
    }
}

impl From<Regex> for EnvValue {
    fn from(pattern: Regex) -> Self {
        EnvValue::Pattern(pattern)
    }
}

impl From<Version> for EnvValue {
    fn from(version: Version) -> Self {
        EnvValue::Version(version)
    }
}
