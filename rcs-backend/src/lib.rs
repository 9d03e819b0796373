//! Reduced-C SPARC Emitter - Backend
//! 
//! This crate turns already-resolved descriptors and construct selectors
//! into SPARC assembly text. It performs no analysis of its own: every
//! `do_*` operation of the `Emitter` expands a fixed instruction template
//! against the descriptors it is handed.

pub mod emitter;
pub mod ops;

pub use emitter::{DtorCell, Emitter};
pub use ops::{BinaryOp, IncDec, LogicalOp, UnaryOp};
pub use rcs_common::CompilerError;

/// Options for emission
#[derive(Debug, Clone)]
pub struct EmitterOptions {
    /// Name shown in the generated file header
    pub unit_name: String,
    /// Call `.$$.arrCheck` before every array element access
    pub bounds_checks: bool,
    /// Call `.$$.ptrCheck` before every pointer dereference
    pub null_checks: bool,
    /// Emit `!` comments naming the source construct
    pub emit_comments: bool,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            unit_name: "rc.s".to_string(),
            bounds_checks: true,
            null_checks: true,
            emit_comments: true,
        }
    }
}
