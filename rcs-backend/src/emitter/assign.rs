//! Assignment

use super::{Emitter, FLHS, LHS};
use rcs_codegen::{AsmInst, Operand, Reg};
use rcs_common::{CompilerError, Literal, Sto, Type};
use std::io::Write;

impl<W: Write> Emitter<W> {
    /// `dest = src`, dispatching on the destination type
    pub fn do_assign(&mut self, dest: &Sto, src: &Sto) -> Result<(), CompilerError> {
        match &dest.ty {
            Type::Struct { .. } | Type::Array(_) => self.do_struct_assign(dest, src),
            Type::Float => self.do_float_assign(dest, src),
            _ => self.do_var_assign(dest, src),
        }
    }

    /// Word copy for int, bool and pointer destinations
    pub fn do_var_assign(&mut self, dest: &Sto, src: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = {}", dest.name, src.name));
        self.load_value(&mut insts, src, LHS)?;
        self.store_value(&mut insts, LHS, dest)?;
        self.emit_all(&insts)
    }

    /// Float destination; int sources are promoted
    pub fn do_float_assign(&mut self, dest: &Sto, src: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = {}", dest.name, src.name));
        self.load_float(&mut insts, src, FLHS)?;
        self.store_value(&mut insts, FLHS, dest)?;
        self.emit_all(&insts)
    }

    pub fn do_const_assign(&mut self, dest: &Sto, literal: &Literal) -> Result<(), CompilerError> {
        self.do_assign(dest, &Sto::literal(literal.clone()))
    }

    /// Block copy of `dest.ty.size()` bytes through `memmove`
    pub fn do_struct_assign(&mut self, dest: &Sto, src: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = {} ({} bytes)", dest.name, src.name, dest.ty.size()));
        self.load_address(&mut insts, dest, Reg::O0)?;
        self.load_address(&mut insts, src, Reg::O1)?;
        insts.push(AsmInst::Set(Operand::Imm(dest.ty.size() as i32), Reg::O2));
        insts.push(AsmInst::Call("memmove".to_string()));
        insts.push(AsmInst::Nop);
        self.emit_all(&insts)
    }
}
