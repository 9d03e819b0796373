//! Type casts
//!
//! Each conversion pair has its own expansion. Conversions between the
//! integer and float register files go through the `.$$.fltTmp` scratch
//! word.

use super::operand::transfer_bits;
use super::{Emitter, FLHS, FRHS, LHS};
use log::trace;
use rcs_codegen::{AsmInst, Cond, FCond, Operand, Reg};
use rcs_common::{CompilerError, Sto, Type};
use std::io::Write;

impl<W: Write> Emitter<W> {
    /// `(target) src` into `result`
    pub fn do_type_cast(&mut self, src: &Sto, target: &Type, result: &Sto) -> Result<(), CompilerError> {
        trace!("cast {} from {} to {target}", src.name, src.ty);
        match (&src.ty, target) {
            (Type::Int, Type::Float) => self.do_int_to_float(src, result),
            (Type::Bool, Type::Float) => self.do_bool_to_float(src, result),
            (Type::Float, Type::Int) => self.do_float_to_int(src, result),
            (Type::Float, Type::Bool) => self.do_float_to_bool(src, result),
            (Type::Int, Type::Bool) | (Type::Bool, Type::Int) => self.do_int_and_bool(src, result),
            (from, to) if is_bit_preserving(from, to) => self.do_same_and_pointer(src, result),
            (from, to) => Err(CompilerError::InvalidCast {
                from: from.name(),
                to: to.name(),
            }),
        }
    }

    pub fn do_int_to_float(&mut self, src: &Sto, result: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = (float) {}", result.name, src.name));
        self.load_float(&mut insts, src, FLHS)?;
        self.store_value(&mut insts, FLHS, result)?;
        self.emit_all(&insts)
    }

    /// Bools are 0 or 1, so they convert like ints
    pub fn do_bool_to_float(&mut self, src: &Sto, result: &Sto) -> Result<(), CompilerError> {
        self.do_int_to_float(src, result)
    }

    /// Truncating conversion
    pub fn do_float_to_int(&mut self, src: &Sto, result: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = (int) {}", result.name, src.name));
        self.load_value(&mut insts, src, FLHS)?;
        insts.push(AsmInst::Fstoi(FLHS, FLHS));
        self.store_value(&mut insts, FLHS, result)?;
        self.emit_all(&insts)
    }

    /// Int to bool and bool to int, both as a compare against zero
    pub fn do_int_and_bool(&mut self, src: &Sto, result: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = ({}) {}", result.name, result.ty, src.name));
        self.load_value(&mut insts, src, LHS)?;
        insts.push(AsmInst::Cmp(LHS, Operand::Reg(Reg::G0)));
        self.materialize(&mut insts, |label| AsmInst::Branch(Cond::Equal, label));
        self.store_value(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }

    /// Nonzero floats are true
    pub fn do_float_to_bool(&mut self, src: &Sto, result: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = (bool) {}", result.name, src.name));
        self.load_value(&mut insts, src, FLHS)?;
        transfer_bits(&mut insts, Reg::G0, FRHS);
        insts.push(AsmInst::Fcmps(FLHS, FRHS));
        insts.push(AsmInst::Nop);
        self.materialize(&mut insts, |label| AsmInst::FBranch(FCond::Equal, label));
        self.store_value(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }

    /// Same-type and pointer conversions copy the word unchanged
    pub fn do_same_and_pointer(&mut self, src: &Sto, result: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = ({}) {}", result.name, result.ty, src.name));
        self.load_value(&mut insts, src, LHS)?;
        self.store_value(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }
}

fn is_bit_preserving(from: &Type, to: &Type) -> bool {
    match (from, to) {
        (a, b) if a.is_scalar() && a == b => true,
        (Type::Pointer(_) | Type::Null, Type::Pointer(_)) => true,
        (Type::Pointer(_), Type::Int) | (Type::Int, Type::Pointer(_)) => true,
        _ => false,
    }
}
