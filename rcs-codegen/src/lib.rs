//! Reduced-C SPARC Emitter - Assembly Model and Writer
//! 
//! This crate holds the target side of the emitter:
//! 
//! - SPARC register and instruction definitions
//! - The indented line writer with scoped output capture

pub mod asm;
pub mod writer;

pub use asm::{escape_asciz, AsmInst, Cond, FCond, Mem, Operand, Reg, Section};
pub use writer::{AsmWriter, SEPARATOR};
