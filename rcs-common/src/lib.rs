//! Reduced-C SPARC Emitter - Common Types and Descriptors
//! 
//! This crate contains the resolved descriptors the emitter consumes, the
//! type system, label numbering and the shared error type.

pub mod error;
pub mod labels;
pub mod symbols;
pub mod types;

pub use error::CompilerError;
pub use labels::{LabelCounters, LabelId};
pub use symbols::*;
pub use types::*;
