//! Serde form of an environment
//!
//! Expected JSON format:
//! `{"os_name": "posix", "python_version": [{"version": "3.8"}], "sys_platform": [{"pattern": "^linux"}]}`
//!
//! A pattern object may carry `"flags"` using Python's `re` bit values,
//! e.g. `{"pattern": "^win", "flags": 2}` for a case-insensitive match.

use std::collections::HashMap;
use std::str::FromStr;

use pep440_rs::Version;
use serde::Deserialize;

use super::{compile_pattern, EnvValue, Environment};
use crate::error::{MarkerError, Result};

/// Environment as read from configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentConfig {
    pub variables: HashMap<String, CandidateList>,
}

/// A single candidate or a list of them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CandidateList {
    One(CandidateConfig),
    Many(Vec<CandidateConfig>),
}

/// Uncompiled candidate value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CandidateConfig {
    /// Plain string, compared exactly
    Exact(String),
    /// `{"pattern": "...", "flags": 0}`
    Pattern(PatternConfig),
    /// `{"version": "..."}`
    Version(VersionConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    pub pattern: String,
    /// Python `re` flag bits
    #[serde(default)]
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionConfig {
    pub version: String,
}

impl CandidateList {
    fn into_vec(self) -> Vec<CandidateConfig> {
        match self {
            CandidateList::One(candidate) => vec![candidate],
            CandidateList::Many(candidates) => candidates,
        }
    }
}

impl CandidateConfig {
    /// Compile into an evaluable candidate
    pub fn compile(&self, key: &str) -> Result<EnvValue> {
        match self {
            CandidateConfig::Exact(value) => Ok(EnvValue::Exact(value.clone())),
            CandidateConfig::Pattern(PatternConfig { pattern, flags }) => {
                compile_pattern(key, pattern, *flags).map(EnvValue::Pattern)
            }
            CandidateConfig::Version(VersionConfig { version }) => Version::from_str(version)
                .map(EnvValue::Version)
                .map_err(|e| {
                    MarkerError::InvalidEnvironment(format!(
                        "Invalid version for {}: {}",
                        key, e
                    ))
                }),
        }
    }
}

impl EnvironmentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MarkerError::InvalidEnvironment(e.to_string()))
    }
}

impl TryFrom<EnvironmentConfig> for Environment {
    type Error = MarkerError;

    fn try_from(config: EnvironmentConfig) -> Result<Self> {
        let mut env = Environment::new();
        for (key, candidates) in config.variables {
            let compiled = candidates
                .into_vec()
                .iter()
                .map(|candidate| candidate.compile(&key))
                .collect::<Result<Vec<EnvValue>>>()?;
            env.insert(key, compiled);
        }
        Ok(env)
    }
}

impl Environment {
    /// Load and compile an environment from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        EnvironmentConfig::from_json(json)?.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::Comparator;

    #[test]
    fn test_from_json_mixed_kinds() {
        let env = Environment::from_json(
            r#"{
                "os_name": "posix",
                "sys_platform": [{"pattern": "^linux"}, "darwin"],
                "python_version": [{"version": "3.8"}]
            }"#,
        )
        .unwrap();

        assert_eq!(env.len(), 3);

        let os_name = env.get("os_name").unwrap();
        assert_eq!(os_name.len(), 1);
        assert_eq!(os_name[0].kind(), "exact");

        let platform = env.get("sys_platform").unwrap();
        assert_eq!(platform[0].kind(), "pattern");
        assert_eq!(platform[1].kind(), "exact");
        assert_eq!(platform[0].compare(Comparator::Equal, "linux2"), Some(true));

        let version = env.get("python_version").unwrap();
        assert_eq!(version[0].kind(), "version");
        assert_eq!(version[0].compare(Comparator::GreaterEqual, "3.7"), Some(true));
    }

    #[test]
    fn test_empty_list_is_bound() {
        let env = Environment::from_json(r#"{"extra": []}"#).unwrap();
        assert!(env.contains_key("extra"));
        assert_eq!(env.get("extra").map(|v| v.len()), Some(0));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Environment::from_json(r#"{"sys_platform": {"pattern": "("}}"#).unwrap_err();
        match err {
            MarkerError::InvalidEnvironment(msg) => assert!(msg.contains("sys_platform")),
            other => panic!("Expected InvalidEnvironment, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_version() {
        let err = Environment::from_json(r#"{"python_version": {"version": "three"}}"#);
        assert!(matches!(err, Err(MarkerError::InvalidEnvironment(_))));
    }

    #[test]
    fn test_pattern_flags() {
        let env = Environment::from_json(r#"{"sys_platform": {"pattern": "^WIN", "flags": 2}}"#)
            .unwrap();
        let platform = env.get("sys_platform").unwrap();
        assert_eq!(platform[0].compare(Comparator::Equal, "win32"), Some(true));

        let err = Environment::from_json(r#"{"sys_platform": {"pattern": "^win", "flags": 256}}"#);
        assert!(matches!(err, Err(MarkerError::InvalidEnvironment(_))));
    }

    #[test]
    fn test_ambiguous_candidate_rejected() {
        for json in [
            r#"{"python_version": {"pattern": "a", "version": "3.8"}}"#,
            r#"{"python_version": [{"version": "3.8", "pattern": "a"}]}"#,
            r#"{"python_version": {"version": "3.8", "extra": true}}"#,
        ] {
            assert!(
                matches!(Environment::from_json(json), Err(MarkerError::InvalidEnvironment(_))),
                "Expected error for: {}",
                json
            );
        }
    }

    #[test]
    fn test_candidate_config_shapes() {
        let config = EnvironmentConfig::from_json(
            r#"{"a": "x", "b": {"pattern": "^y"}, "c": {"version": "1.0"}}"#,
        )
        .unwrap();
        let candidates = |key: &str| config.variables[key].clone().into_vec();

        assert_eq!(candidates("a"), vec![CandidateConfig::Exact("x".into())]);
        assert_eq!(
            candidates("b"),
            vec![CandidateConfig::Pattern(PatternConfig {
                pattern: "^y".into(),
                flags: 0
            })]
        );
        assert_eq!(
            candidates("c"),
            vec![CandidateConfig::Version(VersionConfig {
                version: "1.0".into()
            })]
        );
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Environment::from_json("{\"os_name\": 3}"),
            Err(MarkerError::InvalidEnvironment(_))
        ));
        assert!(matches!(
            Environment::from_json("not json"),
            Err(MarkerError::InvalidEnvironment(_))
        ));
    }
}
