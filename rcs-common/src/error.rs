//! Error handling for the Reduced-C SPARC emitter
//!
//! The emitter itself only fails when its output sink fails or when the
//! driving front end hands it inconsistent input. Both are reported through
//! `CompilerError` and treated as fatal by the driver.

use thiserror::Error;

/// Main error type shared by every crate of the emitter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Invalid descriptor '{name}': {message}")]
    InvalidDescriptor { name: String, message: String },

    #[error("'{construct}' used outside of a loop")]
    NoEnclosingLoop { construct: String },

    #[error("Unbalanced construct: {message}")]
    UnbalancedConstruct { message: String },

    #[error("Too many arguments for '{function}': {count} (maximum: {max})")]
    TooManyArguments {
        function: String,
        count: usize,
        max: usize,
    },

    #[error("Operator '{op}' is not supported for {operand_type} operands")]
    UnsupportedOperator { op: String, operand_type: String },

    #[error("Invalid cast from {from} to {to}")]
    InvalidCast { from: String, to: String },

    #[error("Script error: {message}")]
    ScriptError { message: String },

    #[error("Internal emitter error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create a descriptor consistency error
    pub fn invalid_descriptor(name: &str, message: impl Into<String>) -> Self {
        CompilerError::InvalidDescriptor {
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// Create an unbalanced construct error
    pub fn unbalanced(message: impl Into<String>) -> Self {
        CompilerError::UnbalancedConstruct {
            message: message.into(),
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Convert from serde_json::Error (emission scripts)
impl From<serde_json::Error> for CompilerError {
    fn from(err: serde_json::Error) -> Self {
        CompilerError::ScriptError {
            message: err.to_string(),
        }
    }
}

/// Convert from String (for simple error cases)
impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::InternalError { message }
    }
}
