//! Evaluation environment
//!
//! Maps marker variable names to an ordered list of candidate values. A name
//! missing from the environment is a free variable and keeps its comparisons
//! symbolic during evaluation.

mod config;
mod value;

pub use config::*;
pub use value::*;

use ahash::AHashMap;

/// Candidate values keyed by variable name
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: AHashMap<String, Vec<EnvValue>>,
}

impl Environment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with<I, V>(mut self, key: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<EnvValue>,
    {
        self.insert(key, candidates);
        self
    }

    /// Bind `key` to `candidates`, replacing any previous binding
    pub fn insert<I, V>(&mut self, key: impl Into<String>, candidates: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<EnvValue>,
    {
        self.values
            .insert(key.into(), candidates.into_iter().map(Into::into).collect());
    }

    /// Append one candidate to the binding for `key`
    pub fn push(&mut self, key: impl Into<String>, candidate: impl Into<EnvValue>) {
        self.values
            .entry(key.into())
            .or_default()
            .push(candidate.into());
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&[EnvValue]> {
        self.values.get(key).map(Vec::as_slice)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<EnvValue>> {
        self.values.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, Vec<V>)> for Environment
where
    K: Into<String>,
    V: Into<EnvValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, Vec<V>)>>(iter: T) -> Self {
        let mut env = Environment::new();
        for (key, candidates) in iter {
            env.insert(key, candidates);
        }
        env
    }
}
