/*!
# Unified Error Type

This module provides a unified error enum that consolidates all Evoclus error types
for better ergonomics and error handling consistency.

Recoverable input and state problems are reported through [`EvoclusError`]; violations
of internal invariants (for example popping an empty graph hierarchy) indicate bugs and
abort with a descriptive message instead.
*/

use std::error::Error;
use std::fmt;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, EvoclusError>;

/// Unified error type for all Evoclus operations.
#[derive(Debug)]
pub enum EvoclusError {
    /// General-purpose error
    Generic(String),

    /// The input graph is not a valid CSR structure (non-monotone offsets,
    /// out-of-range targets, negative weights)
    BadGraph(String),

    /// Invalid argument or parameter
    InvalidArgument(String),

    /// Algorithm terminated unexpectedly
    AlgorithmError(String),

    /// I/O error
    IoError(String),

    /// Serialization/deserialization error
    SerializationError(String),
}

impl EvoclusError {
    /// Creates a generic error with the given message.
    pub fn generic(message: impl Into<String>) -> Self {
        EvoclusError::Generic(message.into())
    }

    /// Creates a bad graph error.
    pub fn bad_graph(message: impl Into<String>) -> Self {
        EvoclusError::BadGraph(message.into())
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        EvoclusError::InvalidArgument(message.into())
    }

    /// Creates an algorithm error.
    pub fn algorithm_error(message: impl Into<String>) -> Self {
        EvoclusError::AlgorithmError(message.into())
    }
}

impl fmt::Display for EvoclusError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvoclusError::Generic(msg) => write!(f, "Evoclus error: {}", msg),
            EvoclusError::BadGraph(msg) => write!(f, "Bad graph: {}", msg),
            EvoclusError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            EvoclusError::AlgorithmError(msg) => write!(f, "Algorithm error: {}", msg),
            EvoclusError::IoError(msg) => write!(f, "I/O error: {}", msg),
            EvoclusError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl Error for EvoclusError {}

impl From<std::io::Error> for EvoclusError {
    fn from(e: std::io::Error) -> Self {
        EvoclusError::IoError(e.to_string())
    }
}

impl From<serde_json::Error> for EvoclusError {
    fn from(e: serde_json::Error) -> Self {
        EvoclusError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvoclusError::generic("test error");
        assert_eq!(format!("{}", err), "Evoclus error: test error");

        let err = EvoclusError::bad_graph("xadj is not monotone");
        assert_eq!(format!("{}", err), "Bad graph: xadj is not monotone");

        let err = EvoclusError::invalid_argument("islands must be positive");
        assert_eq!(format!("{}", err), "Invalid argument: islands must be positive");
    }

    #[test]
    fn test_error_conversions() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: EvoclusError = io_err.into();
        assert!(matches!(err, EvoclusError::IoError(_)));
    }
}
