//! Python bindings for marker trees
//!
//! The `Node` class wraps a Rust tree. Trees are immutable on both sides of
//! the boundary, so the class is frozen and evaluation returns a new object.

use pyo3::prelude::*;
use pyo3::types::{PyAny, PyDict, PyList};

use crate::environment::{CandidateConfig, Environment, PatternConfig, VersionConfig};
use crate::marker::{self, Node};

/// Python-facing marker tree
#[pyclass(name = "Node", frozen)]
#[derive(Debug, Clone)]
pub struct PyNode {
    inner: Node,
}

impl From<Node> for PyNode {
    fn from(inner: Node) -> Self {
        Self { inner }
    }
}

#[pymethods]
impl PyNode {
    /// Textual form of the tree
    fn value(&self) -> String {
        self.inner.value()
    }

    /// "BooleanNode", "ExpressionNode" or "OperatorNode"
    #[getter]
    fn variant(&self) -> &'static str {
        self.inner.variant_name()
    }

    /// Partially evaluate against `{name: [str | re.Pattern | Version, ...]}`
    fn evaluate(&self, environment: &Bound<'_, PyDict>) -> PyResult<PyNode> {
        let env = extract_environment(environment)?;
        Ok(self.inner.evaluate(&env).into())
    }

    fn __contains__(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    fn __bool__(&self) -> PyResult<bool> {
        Ok(self.inner.as_bool()?)
    }

    fn __eq__(&self, other: PyRef<'_, PyNode>) -> bool {
        self.inner == other.inner
    }

    fn __str__(&self) -> String {
        self.inner.value()
    }

    fn __repr__(&self) -> String {
        format!("<{} {}>", self.inner.variant_name(), self.inner.value())
    }
}

/// Build an `Environment` from a Python dict of candidate lists
///
/// `str` candidates compare exactly, objects with a `pattern` attribute
/// (compiled `re` patterns) are recompiled with the `regex` crate along with
/// their flags, anything else is read through `str()` as a PEP 440 version.
fn extract_environment(dict: &Bound<'_, PyDict>) -> PyResult<Environment> {
    let mut env = Environment::new();
    for (key, value) in dict.iter() {
        let name: String = key.extract()?;
        let list = value.cast::<PyList>()?;
        let mut candidates = Vec::with_capacity(list.len());
        for item in list.iter() {
            candidates.push(extract_candidate(&item)?.compile(&name)?);
        }
        env.insert(name, candidates);
    }
    Ok(env)
}

fn extract_candidate(item: &Bound<'_, PyAny>) -> PyResult<CandidateConfig> {
    if let Ok(text) = item.extract::<String>() {
        return Ok(CandidateConfig::Exact(text));
    }

    if let Ok(pattern) = item.getattr("pattern") {
        let flags = match item.getattr("flags") {
            Ok(flags) => flags.extract::<u32>()?,
            Err(_) => 0,
        };
        return Ok(CandidateConfig::Pattern(PatternConfig {
            pattern: pattern.extract()?,
            flags,
        }));
    }

    Ok(CandidateConfig::Version(VersionConfig {
        version: item.str()?.to_string(),
    }))
}

/// Parse a PEP 508 marker string into a Node
#[pyfunction]
pub fn parse(marker: &str) -> PyResult<PyNode> {
    Ok(marker::get_or_parse(marker)?.into())
}

/// Partially evaluate a Node against an environment
#[pyfunction]
pub fn evaluate(node: PyRef<'_, PyNode>, environment: &Bound<'_, PyDict>) -> PyResult<PyNode> {
    node.evaluate(environment)
}

/// Number of cached marker parses
#[pyfunction]
pub fn cache_size() -> usize {
    marker::cache_size()
}

/// Drop all cached marker parses
#[pyfunction]
pub fn clear_cache() {
    marker::clear_cache()
}
