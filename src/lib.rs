//! Markerpry Core - Partial evaluation of PEP 508 environment markers
//!
//! This crate parses markers such as `python_version >= "3.8" and os_name == "nt"`
//! into expression trees and folds them against a (possibly partial)
//! environment. Whatever the environment cannot decide stays symbolic.
//!
//! Python bindings via PyO3 are available behind the `python` feature.

pub mod environment;
pub mod error;
pub mod marker;

#[cfg(feature = "python")]
mod bindings;

pub use environment::{EnvValue, Environment, EnvironmentConfig};
pub use error::{MarkerError, Result};
pub use marker::{
    build, evaluate, evaluate_marker, get_or_parse, parse, tokenize, BoolOp, BooleanNode,
    Comparator, ExpressionNode, MarkerItem, Node, OperatorNode, FALSE, TRUE,
};

// ============================================================================
// Python Module Definition
// ============================================================================

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn markerpry_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(bindings::parse, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::evaluate, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::cache_size, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::clear_cache, m)?)?;
    m.add_class::<bindings::PyNode>()?;
    m.add("TRUE", bindings::PyNode::from(TRUE))?;
    m.add("FALSE", bindings::PyNode::from(FALSE))?;
    Ok(())
}
