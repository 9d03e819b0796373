//! Constructor calls and destructor cells
//!
//! Every object with a destructor gets a two-word `.bss` cell holding the
//! destructor's address and the object's address. Teardown calls through
//! the cell and clears it, so a cell that was never filled, or was already
//! torn down, is skipped.

use super::{DtorCell, Emitter, LHS, RHS};
use log::debug;
use rcs_codegen::{AsmInst, Cond, Mem, Operand, Reg, Section};
use rcs_common::{CompilerError, FuncSto, LabelId, Sto};
use std::io::Write;

impl<W: Write> Emitter<W> {
    /// Call `ctor` on `obj`
    pub fn do_ctor_call(&mut self, obj: &Sto, ctor: &FuncSto, args: &[Sto]) -> Result<(), CompilerError> {
        self.do_func_call(ctor, Some(obj), args, None)
    }

    /// Register `obj` for destruction by `dtor`. Objects addressed by
    /// symbol are torn down at program exit, frame objects when the
    /// current function returns.
    pub fn do_dtor_register(&mut self, obj: &Sto, dtor: &FuncSto) -> Result<LabelId, CompilerError> {
        let cell = DtorCell {
            id: self.labels.next_object_cell(),
            object: obj.name.clone(),
        };
        let global = obj.memory().is_some_and(|address| address.is_global());
        debug!("destructor cell {} for '{}' (global: {global})", cell.id, obj.name);

        let mut insts = Vec::new();
        self.comment(&mut insts, format!("register {} for {}", dtor.label(), obj.name));
        self.in_section(&mut insts, Section::Bss, |insts| {
            insts.push(AsmInst::Label(cell.label()));
            insts.push(AsmInst::Skip(8));
        });
        insts.push(AsmInst::Set(Operand::Label(dtor.label()), LHS));
        insts.push(AsmInst::Set(Operand::Label(cell.label()), RHS));
        insts.push(AsmInst::St(LHS, Mem::at(RHS)));
        self.load_address(&mut insts, obj, LHS)?;
        insts.push(AsmInst::St(LHS, Mem::offset(RHS, 4)));
        self.emit_all(&insts)?;

        let id = cell.id;
        match &mut self.function {
            Some(ctx) if !global => ctx.local_dtors.push(cell),
            _ => self.global_dtors.push(cell),
        }
        Ok(id)
    }

    /// Run `construct` with its output placed in the `.init` section
    pub fn do_global_ctor(
        &mut self,
        construct: impl FnOnce(&mut Self) -> Result<(), CompilerError>,
    ) -> Result<(), CompilerError> {
        let previous = self.section;
        let mut insts = Vec::new();
        self.switch_section(&mut insts, Section::Init);
        self.emit_all(&insts)?;

        construct(self)?;

        let mut insts = Vec::new();
        self.switch_section(&mut insts, previous);
        self.emit_all(&insts)
    }

    /// Call the destructor stored in `cell`, then clear the cell
    pub(super) fn teardown_cell(&self, insts: &mut Vec<AsmInst>, cell: &DtorCell) {
        self.comment(insts, format!("destroy {}", cell.object));
        insts.push(AsmInst::Set(Operand::Label(cell.label()), Reg::L0));
        insts.push(AsmInst::Ld(Mem::at(Reg::L0), Reg::L1));
        insts.push(AsmInst::Cmp(Reg::L1, Operand::Reg(Reg::G0)));
        insts.push(AsmInst::Branch(Cond::Equal, cell.skip_label()));
        insts.push(AsmInst::Nop);
        insts.push(AsmInst::Ld(Mem::offset(Reg::L0, 4), Reg::O0));
        insts.push(AsmInst::CallReg(Reg::L1));
        insts.push(AsmInst::Nop);
        insts.push(AsmInst::St(Reg::G0, Mem::at(Reg::L0)));
        insts.push(AsmInst::Label(cell.skip_label()));
    }
}
