//! Variable declarations
//!
//! Globals and statics get their own labelled storage in `.bss` (zeroed)
//! or `.data` (literal-initialized). Non-constant initializers cannot be
//! folded into data, so their code is either deferred to the start of
//! `main` (globals) or wrapped in a run-once guard (function statics).

use super::Emitter;
use log::debug;
use rcs_codegen::{AsmInst, Cond, Mem, Operand, Reg, Section};
use rcs_common::{CompilerError, Displacement, LabelId, Literal, Sto, Type};
use std::io::Write;

/// Guard word of a function-local static
fn guard_label(id: LabelId) -> String {
    format!(".$$.static.{id}")
}

fn guard_done_label(id: LabelId) -> String {
    format!(".$$.static.{id}.done")
}

impl<W: Write> Emitter<W> {
    /// Reserve storage for a global or static variable. `.global` is only
    /// emitted for non-static variables.
    pub fn do_global_var_decl(
        &mut self,
        sto: &Sto,
        init: Option<&Literal>,
        is_static: bool,
    ) -> Result<(), CompilerError> {
        sto.check()?;
        let symbol = match sto.memory().map(|address| &address.offset) {
            Some(Displacement::Symbol(symbol)) => symbol.clone(),
            _ => {
                return Err(CompilerError::invalid_descriptor(
                    &sto.name,
                    "global storage must be addressed by symbol",
                ))
            }
        };
        debug!("global {} {} ({} bytes, static: {is_static})", sto.ty, symbol, sto.ty.size());

        let data = global_data(sto, init)?;
        let section = if init.is_some() { Section::Data } else { Section::Bss };

        let mut insts = Vec::new();
        self.switch_section(&mut insts, section);
        if !is_static {
            insts.push(AsmInst::Global(symbol.clone()));
        }
        insts.push(AsmInst::Label(symbol));
        insts.push(data);
        insts.push(AsmInst::Blank);
        self.switch_section(&mut insts, Section::Text);
        self.emit_all(&insts)
    }

    /// Declare a frame variable; only a literal initializer produces code
    pub fn do_local_var_decl(&mut self, sto: &Sto, init: Option<&Literal>) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} {} @ {}", sto.ty, sto.name, sto.address()));
        self.emit_all(&insts)?;
        match init {
            Some(literal) => self.do_const_assign(sto, literal),
            None => Ok(()),
        }
    }

    /// Open the run-once guard around a static local's initializer
    pub fn do_static_guard_start(&mut self, sto: &Sto) -> Result<LabelId, CompilerError> {
        let id = self.labels.next_static_guard();
        self.guard_stack.push(id);
        debug!("static guard {id} for '{}'", sto.name);

        let guard = guard_label(id);
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("static {} initialization", sto.name));
        self.in_section(&mut insts, Section::Bss, |insts| {
            insts.push(AsmInst::Label(guard.clone()));
            insts.push(AsmInst::Skip(4));
        });
        insts.push(AsmInst::Set(Operand::Label(guard), Reg::L0));
        insts.push(AsmInst::Ld(Mem::at(Reg::L0), Reg::L1));
        insts.push(AsmInst::Cmp(Reg::L1, Operand::Reg(Reg::G0)));
        insts.push(AsmInst::Branch(Cond::NotEqual, guard_done_label(id)));
        insts.push(AsmInst::Nop);
        self.emit_all(&insts)?;
        self.out.increase_indent();
        Ok(id)
    }

    /// Mark the innermost static as initialized and close its guard
    pub fn do_static_guard_end(&mut self) -> Result<(), CompilerError> {
        let id = self
            .guard_stack
            .pop()
            .ok_or_else(|| CompilerError::unbalanced("static guard end without a start"))?;
        self.out.decrease_indent();

        let insts = [
            AsmInst::Set(Operand::Label(guard_label(id)), Reg::L0),
            AsmInst::Set(Operand::Imm(1), Reg::L1),
            AsmInst::St(Reg::L1, Mem::at(Reg::L0)),
            AsmInst::Label(guard_done_label(id)),
        ];
        self.emit_all(&insts)
    }

    /// Capture the code of a non-constant global initializer. It is written
    /// at the start of `main`, after the parameters are stored.
    pub fn defer_global_init(
        &mut self,
        init: impl FnOnce(&mut Self) -> Result<(), CompilerError>,
    ) -> Result<(), CompilerError> {
        let ((), text) = self.capture(init)?;
        debug!("deferred {} bytes of global initialization", text.len());
        self.pending_global_init.push_str(&text);
        Ok(())
    }

    pub(super) fn flush_global_init(&mut self) -> Result<(), CompilerError> {
        if self.pending_global_init.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending_global_init);
        let mut insts = Vec::new();
        self.comment(&mut insts, "global initializers");
        self.emit_all(&insts)?;
        self.flush_captured(&text)
    }
}

/// Storage directive for a global
fn global_data(sto: &Sto, init: Option<&Literal>) -> Result<AsmInst, CompilerError> {
    match (init, &sto.ty) {
        (None, ty) => match ty.size() {
            0 => Err(CompilerError::invalid_descriptor(&sto.name, "type has no size")),
            size => Ok(AsmInst::Skip(size)),
        },
        (Some(Literal::Float(value)), _) => Ok(AsmInst::Single(*value)),
        (Some(Literal::Int(value)), Type::Float) => Ok(AsmInst::Single(*value as f32)),
        (Some(Literal::Str(_)), _) => Err(CompilerError::invalid_descriptor(
            &sto.name,
            "string constants cannot initialize variables",
        )),
        (Some(literal), _) => Ok(AsmInst::Word(literal.as_word().unwrap_or_default())),
    }
}
