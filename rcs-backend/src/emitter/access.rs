//! Array, struct and pointer access
//!
//! Access expressions never load the accessed value. They compute its
//! address and bind it to an indirect result slot, so the same result can
//! be read from or assigned to by the operations that follow.

use super::runtime::{ARR_CHECK, PTR_CHECK};
use super::{Emitter, LHS, RHS};
use log::trace;
use rcs_codegen::{AsmInst, Operand, Reg};
use rcs_common::{CompilerError, Indirection, Storage, Sto, Type};
use std::io::Write;

/// Holds a base address across `.mul`
const BASE_HOLD: Reg = Reg::L0;

fn call(insts: &mut Vec<AsmInst>, target: &str) {
    insts.push(AsmInst::Call(target.to_string()));
    insts.push(AsmInst::Nop);
}

fn require_indirect(result: &Sto) -> Result<(), CompilerError> {
    if result.is_indirect() {
        Ok(())
    } else {
        Err(CompilerError::invalid_descriptor(
            &result.name,
            "access results must be indirect slots",
        ))
    }
}

fn field_offset(result: &Sto) -> Result<i32, CompilerError> {
    match &result.storage {
        Storage::Indirect(Indirection::StructField { offset, .. }) => Ok(*offset as i32),
        _ => Err(CompilerError::invalid_descriptor(
            &result.name,
            "field access result carries no field offset",
        )),
    }
}

fn pointee_size(ptr: &Sto) -> Result<i32, CompilerError> {
    ptr.ty
        .pointer_target()
        .map(|target| target.size() as i32)
        .ok_or_else(|| CompilerError::invalid_descriptor(&ptr.name, "not a pointer"))
}

impl<W: Write> Emitter<W> {
    /// `%o0` must hold a pointer; exits the program when it is null
    fn null_check(&self, insts: &mut Vec<AsmInst>) {
        if self.options.null_checks {
            call(insts, PTR_CHECK);
        }
    }

    /// `array[index]` for arrays and pointers
    pub fn do_array_index(&mut self, array: &Sto, index: &Sto, result: &Sto) -> Result<(), CompilerError> {
        require_indirect(result)?;
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = &{}[{}]", result.name, array.name, index.name));

        match &array.ty {
            Type::Array(array_ty) => {
                trace!("index {} of length {}", array.name, array_ty.length);
                self.load_value(&mut insts, index, LHS)?;
                if self.options.bounds_checks {
                    insts.push(AsmInst::Set(Operand::Imm(array_ty.length as i32), RHS));
                    call(&mut insts, ARR_CHECK);
                }
                insts.push(AsmInst::Set(Operand::Imm(array_ty.element_size() as i32), RHS));
                call(&mut insts, ".mul");
                self.load_address(&mut insts, array, RHS)?;
                insts.push(AsmInst::Add(RHS, Operand::Reg(LHS), LHS));
            }
            Type::Pointer(_) => {
                let size = pointee_size(array)?;
                self.load_value(&mut insts, array, LHS)?;
                self.null_check(&mut insts);
                insts.push(AsmInst::Mov(Operand::Reg(LHS), BASE_HOLD));
                self.load_value(&mut insts, index, LHS)?;
                insts.push(AsmInst::Set(Operand::Imm(size), RHS));
                call(&mut insts, ".mul");
                insts.push(AsmInst::Add(BASE_HOLD, Operand::Reg(LHS), LHS));
            }
            other => {
                return Err(CompilerError::invalid_descriptor(
                    &array.name,
                    format!("cannot index a value of type {other}"),
                ))
            }
        }

        self.store_slot(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }

    /// `base.field`; the offset comes from the result slot
    pub fn do_struct_field(&mut self, base: &Sto, result: &Sto) -> Result<(), CompilerError> {
        let offset = field_offset(result)?;
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = &{} (+{offset})", result.name, base.name));
        self.load_address(&mut insts, base, LHS)?;
        insts.push(AsmInst::Add(LHS, Operand::Imm(offset), LHS));
        self.store_slot(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }

    /// `*ptr`
    pub fn do_deref(&mut self, ptr: &Sto, result: &Sto) -> Result<(), CompilerError> {
        require_indirect(result)?;
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = *{}", result.name, ptr.name));
        self.load_value(&mut insts, ptr, LHS)?;
        self.null_check(&mut insts);
        self.store_slot(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }

    /// `ptr->field`
    pub fn do_arrow(&mut self, ptr: &Sto, result: &Sto) -> Result<(), CompilerError> {
        let offset = field_offset(result)?;
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = {} (+{offset})", result.name, ptr.name));
        self.load_value(&mut insts, ptr, LHS)?;
        self.null_check(&mut insts);
        insts.push(AsmInst::Add(LHS, Operand::Imm(offset), LHS));
        self.store_slot(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }

    /// `&var`
    pub fn do_address_of(&mut self, var: &Sto, result: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = &{}", result.name, var.name));
        self.load_address(&mut insts, var, LHS)?;
        self.store_value(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }

    /// `new ptr`: zeroed heap storage for one pointee
    pub fn do_new(&mut self, ptr: &Sto) -> Result<(), CompilerError> {
        let size = pointee_size(ptr)?;
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("new {}", ptr.name));
        insts.push(AsmInst::Set(Operand::Imm(1), LHS));
        insts.push(AsmInst::Set(Operand::Imm(size), RHS));
        call(&mut insts, "calloc");
        self.store_value(&mut insts, LHS, ptr)?;
        self.emit_all(&insts)
    }

    /// `delete ptr`: free the pointee and reset the pointer to null
    pub fn do_delete(&mut self, ptr: &Sto) -> Result<(), CompilerError> {
        pointee_size(ptr)?;
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("delete {}", ptr.name));
        self.load_value(&mut insts, ptr, LHS)?;
        self.null_check(&mut insts);
        call(&mut insts, "free");
        self.store_value(&mut insts, Reg::G0, ptr)?;
        self.emit_all(&insts)
    }
}
