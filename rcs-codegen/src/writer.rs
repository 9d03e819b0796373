//! Indented assembly text writer
//!
//! `AsmWriter` is the single write primitive of the emitter. It prefixes
//! every line with the current indentation and appends it to the sink, or
//! to the innermost open capture buffer when one is active.

use crate::asm::AsmInst;
use log::trace;
use rcs_common::CompilerError;
use std::fmt::{self, Write as _};
use std::io::Write;

/// Indentation separator
pub const SEPARATOR: &str = "\t";

/// Line-oriented assembly writer
pub struct AsmWriter<W: Write> {
    sink: W,
    indent: usize,
    /// Open capture buffers, innermost last
    captures: Vec<String>,
}

impl<W: Write> AsmWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            indent: 0,
            captures: Vec::new(),
        }
    }

    pub fn increase_indent(&mut self) {
        self.indent += 1;
    }

    /// Callers must balance every increase with a decrease
    pub fn decrease_indent(&mut self) {
        debug_assert!(self.indent > 0, "decrease_indent below zero");
        self.indent = self.indent.saturating_sub(1);
    }

    /// Write one line: indentation, the formatted arguments, newline
    pub fn write_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), CompilerError> {
        let mut line = SEPARATOR.repeat(self.indent);
        line.write_fmt(args)
            .map_err(|e| CompilerError::InternalError { message: e.to_string() })?;
        line.push('\n');
        self.put(&line)
    }

    /// Substitute `operands` into the `{}` placeholders of `template` in
    /// order, then write the result as one line like `write_line`.
    pub fn write_template(
        &mut self,
        template: &str,
        operands: &[&dyn fmt::Display],
    ) -> Result<(), CompilerError> {
        let text = fill_template(template, operands)?;
        self.write_line(format_args!("{text}"))
    }

    /// Write one instruction; labels at the current level, everything
    /// else one level deeper.
    pub fn emit(&mut self, inst: &AsmInst) -> Result<(), CompilerError> {
        match inst {
            AsmInst::Blank => self.put("\n"),
            AsmInst::Label(_) => self.write_line(format_args!("{inst}")),
            _ => {
                self.increase_indent();
                let result = self.write_line(format_args!("{inst}"));
                self.decrease_indent();
                result
            }
        }
    }

    pub fn emit_all(&mut self, insts: &[AsmInst]) -> Result<(), CompilerError> {
        for inst in insts {
            self.emit(inst)?;
        }
        Ok(())
    }

    /// Write previously captured text verbatim
    pub fn write_raw(&mut self, text: &str) -> Result<(), CompilerError> {
        self.put(text)
    }

    /// Start redirecting writes into a fresh buffer
    pub fn begin_capture(&mut self) {
        trace!("begin capture (depth {})", self.captures.len() + 1);
        self.captures.push(String::new());
    }

    /// Stop the innermost capture and return its text
    pub fn end_capture(&mut self) -> Result<String, CompilerError> {
        let text = self
            .captures
            .pop()
            .ok_or_else(|| CompilerError::unbalanced("end_capture without begin_capture"))?;
        trace!("end capture: {} bytes held", text.len());
        Ok(text)
    }

    /// Flush and hand back the sink
    pub fn finish(mut self) -> Result<W, CompilerError> {
        if !self.captures.is_empty() {
            return Err(CompilerError::unbalanced(format!(
                "{} capture buffer(s) still open",
                self.captures.len()
            )));
        }
        self.sink.flush()?;
        Ok(self.sink)
    }

    fn put(&mut self, text: &str) -> Result<(), CompilerError> {
        match self.captures.last_mut() {
            Some(buffer) => buffer.push_str(text),
            None => self.sink.write_all(text.as_bytes())?,
        }
        Ok(())
    }
}

/// Positional `{}` substitution
fn fill_template(template: &str, operands: &[&dyn fmt::Display]) -> Result<String, CompilerError> {
    let mut out = String::with_capacity(template.len());
    let mut pieces = template.split("{}");
    let mut operands = operands.iter();
    if let Some(first) = pieces.next() {
        out.push_str(first);
    }
    for piece in pieces {
        let operand = operands.next().ok_or_else(|| CompilerError::InternalError {
            message: format!("template '{template}' has more placeholders than operands"),
        })?;
        write!(out, "{operand}").map_err(|e| CompilerError::InternalError { message: e.to_string() })?;
        out.push_str(piece);
    }
    Ok(out)
}
