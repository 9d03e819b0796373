//! SPARC emitter
//!
//! `Emitter` is the accumulator the front end drives while it walks a
//! program. Every operation expands into a `Vec<AsmInst>` which is written
//! through the shared `AsmWriter`; label ids come from `LabelCounters` and
//! nested constructs keep their ids on explicit stacks.
//!
//! ## Layout
//!
//! - `runtime.rs` - file header, format strings and runtime check routines
//! - `operand.rs` - load/store of descriptors, literal pools, promotion
//! - `decls.rs` - global, local and static declarations
//! - `assign.rs` - assignment forms
//! - `expr.rs` - binary, logical, unary and increment operators
//! - `control_flow.rs` - if/else, while, foreach, break/continue
//! - `function.rs` - prologue, epilogue, returns and calls
//! - `access.rs` - array, struct, pointer and heap access
//! - `io.rs` - print and read intrinsics
//! - `objects.rs` - constructor calls and destructor cells
//! - `cast.rs` - type casts

mod access;
mod assign;
mod cast;
mod control_flow;
mod decls;
mod expr;
mod function;
mod io;
mod objects;
mod operand;
mod runtime;


use crate::EmitterOptions;
use log::debug;
use rcs_codegen::{AsmInst, AsmWriter, Reg, Section};
use rcs_common::{CompilerError, FuncSto, LabelCounters, LabelId};
use std::io::Write;

/// Integer value registers
pub(crate) const LHS: Reg = Reg::O0;
pub(crate) const RHS: Reg = Reg::O1;
/// Float value registers
pub(crate) const FLHS: Reg = Reg::F0;
pub(crate) const FRHS: Reg = Reg::F1;
/// Address scratch for loads
pub(crate) const LOAD_SCRATCH: Reg = Reg::L7;
/// Address scratch for stores
pub(crate) const STORE_SCRATCH: Reg = Reg::L6;
/// Integer staging register for int/float transfers
pub(crate) const PROMOTE_SCRATCH: Reg = Reg::L(5);

/// Maximum number of register arguments (`%o0-%o5`)
pub const MAX_REGISTER_ARGS: usize = 6;

/// Minimum frame of a SPARC function: register window save area, hidden
/// struct return word and the six argument home slots
pub const MIN_FRAME: u32 = 92;

/// Destructor cell: two `.bss` words holding the destructor address and
/// the object address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtorCell {
    pub id: LabelId,
    /// Name of the object, used in comments
    pub object: String,
}

impl DtorCell {
    pub fn label(&self) -> String {
        format!(".$$.dtor.{}", self.id)
    }

    pub fn skip_label(&self) -> String {
        format!(".$$.dtor.{}.skip", self.id)
    }
}

#[derive(Debug, Clone, Copy)]
struct IfFrame {
    id: LabelId,
    has_else: bool,
}

/// Function being emitted
#[derive(Debug, Clone)]
struct FunctionContext {
    func: FuncSto,
    local_dtors: Vec<DtorCell>,
}

/// SPARC assembly emitter
pub struct Emitter<W: Write> {
    out: AsmWriter<W>,
    options: EmitterOptions,
    labels: LabelCounters,
    section: Section,
    if_stack: Vec<IfFrame>,
    loop_stack: Vec<LabelId>,
    and_or_stack: Vec<LabelId>,
    guard_stack: Vec<LabelId>,
    function: Option<FunctionContext>,
    /// Non-constant global initializers, flushed at the start of `main`
    pending_global_init: String,
    global_dtors: Vec<DtorCell>,
}

impl<W: Write> Emitter<W> {
    pub fn new(sink: W, options: EmitterOptions) -> Self {
        Self {
            out: AsmWriter::new(sink),
            options,
            labels: LabelCounters::default(),
            section: Section::Text,
            if_stack: Vec::new(),
            loop_stack: Vec::new(),
            and_or_stack: Vec::new(),
            guard_stack: Vec::new(),
            function: None,
            pending_global_init: String::new(),
            global_dtors: Vec::new(),
        }
    }

    /// Name of the function being emitted, if any
    pub fn current_function(&self) -> Option<&FuncSto> {
        self.function.as_ref().map(|ctx| &ctx.func)
    }

    pub fn loop_depth(&self) -> usize {
        self.loop_stack.len()
    }

    /// Run `f` with its output held back. Returns the result of `f` and the
    /// captured text, which the caller may later pass to `flush_captured`.
    pub fn capture<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, CompilerError>,
    ) -> Result<(R, String), CompilerError> {
        self.out.begin_capture();
        let result = f(self);
        let text = self.out.end_capture()?;
        result.map(|r| (r, text))
    }

    /// Write text obtained from `capture`
    pub fn flush_captured(&mut self, text: &str) -> Result<(), CompilerError> {
        self.out.write_raw(text)
    }

    /// Check that every construct is closed, tear down global objects and
    /// hand back the sink.
    pub fn finish(mut self) -> Result<W, CompilerError> {
        if let Some(ctx) = &self.function {
            return Err(CompilerError::unbalanced(format!(
                "function '{}' was never closed",
                ctx.func.name
            )));
        }
        self.check_stacks_empty()?;
        if !self.pending_global_init.is_empty() {
            return Err(CompilerError::unbalanced(
                "deferred global initializers were never flushed (no main)",
            ));
        }

        if !self.global_dtors.is_empty() {
            debug!("tearing down {} global object(s) at exit", self.global_dtors.len());
            let cells = std::mem::take(&mut self.global_dtors);
            let mut insts = Vec::new();
            self.switch_section(&mut insts, Section::Fini);
            for cell in cells.iter().rev() {
                self.teardown_cell(&mut insts, cell);
            }
            self.switch_section(&mut insts, Section::Text);
            self.emit_all(&insts)?;
        }

        self.out.finish()
    }

    fn check_stacks_empty(&self) -> Result<(), CompilerError> {
        let open = [
            ("if", self.if_stack.len()),
            ("loop", self.loop_stack.len()),
            ("logical operator", self.and_or_stack.len()),
            ("static guard", self.guard_stack.len()),
        ];
        for (construct, depth) in open {
            if depth > 0 {
                return Err(CompilerError::unbalanced(format!(
                    "{depth} {construct} construct(s) still open"
                )));
            }
        }
        Ok(())
    }

    fn emit_all(&mut self, insts: &[AsmInst]) -> Result<(), CompilerError> {
        self.out.emit_all(insts)
    }

    /// Push a source-level comment when comments are enabled
    fn comment(&self, insts: &mut Vec<AsmInst>, text: impl Into<String>) {
        if self.options.emit_comments {
            insts.push(AsmInst::Comment(text.into()));
        }
    }

    /// Switch sections, keeping 4-byte alignment
    fn switch_section(&mut self, insts: &mut Vec<AsmInst>, section: Section) {
        insts.push(AsmInst::Section(section));
        insts.push(AsmInst::Align(4));
        self.section = section;
    }

    /// Emit data into `section` and come back to the current section
    fn in_section(
        &mut self,
        insts: &mut Vec<AsmInst>,
        section: Section,
        data: impl FnOnce(&mut Vec<AsmInst>),
    ) {
        let previous = self.section;
        self.switch_section(insts, section);
        data(insts);
        self.switch_section(insts, previous);
    }

    fn function_context(&self) -> Result<&FunctionContext, CompilerError> {
        self.function
            .as_ref()
            .ok_or_else(|| CompilerError::unbalanced("no function is open"))
    }
}
