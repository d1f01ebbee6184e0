//! Error types for marker parsing and evaluation

use thiserror::Error;

/// Main error type for marker parsing and evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    /// The token structure (or raw marker string) has no valid tree shape.
    #[error("Invalid marker: {0}")]
    InvalidMarker(String),

    /// A node other than `BooleanNode` was used as a plain boolean.
    #[error("Cannot coerce {variant} to bool; the marker still depends on unbound variables")]
    IncoercibleNode { variant: &'static str },

    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
}

#[cfg(feature = "python")]
impl From<MarkerError> for pyo3::PyErr {
    fn from(err: MarkerError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyTypeError, PyValueError};

        match err {
            MarkerError::InvalidMarker(_) | MarkerError::InvalidEnvironment(_) => {
                PyValueError::new_err(err.to_string())
            }
            MarkerError::IncoercibleNode { .. } => PyTypeError::new_err(err.to_string()),
        }
    }
}

/// Result type alias for marker operations
pub type Result<T> = std::result::Result<T, MarkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoercible_message_names_variant() {
        let err = MarkerError::IncoercibleNode {
            variant: "OperatorNode",
        };
        assert!(err.to_string().contains("OperatorNode"));
    }

    #[test]
    fn test_invalid_marker_message_keeps_fragment() {
        let err = MarkerError::InvalidMarker("os_name = 'nt'".to_string());
        assert_eq!(err.to_string(), "Invalid marker: os_name = 'nt'");
    }
}
