//! Structured control flow
//!
//! Each construct takes a fresh id from its counter and keeps it on a stack
//! until the construct closes, so nested constructs never share labels and
//! `break`/`continue` always see the innermost loop.

use super::operand::transfer_bits;
use super::{Emitter, IfFrame, FLHS, LHS, PROMOTE_SCRATCH, RHS};
use log::debug;
use rcs_codegen::{AsmInst, Cond, Mem, Operand, Reg};
use rcs_common::{CompilerError, LabelId, Sto, Type};
use std::io::Write;

fn else_label(id: LabelId) -> String {
    format!(".$$.else.{id}")
}

fn endif_label(id: LabelId) -> String {
    format!(".$$.endif.{id}")
}

fn loop_check_label(id: LabelId) -> String {
    format!(".$$.loopCheck.{id}")
}

fn loop_end_label(id: LabelId) -> String {
    format!(".$$.loopEnd.{id}")
}

impl<W: Write> Emitter<W> {
    pub fn do_if_cond(&mut self, cond: &Sto) -> Result<LabelId, CompilerError> {
        match cond.literal_value().and_then(|literal| literal.as_word()) {
            Some(word) => self.do_if_lit_cond(word != 0),
            None => self.do_if_expr_cond(cond),
        }
    }

    /// Condition known at compile time: a false condition jumps straight
    /// to the else branch
    pub fn do_if_lit_cond(&mut self, value: bool) -> Result<LabelId, CompilerError> {
        let id = self.open_if();
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("if ({value})"));
        if !value {
            insts.push(AsmInst::Branch(Cond::Always, else_label(id)));
            insts.push(AsmInst::Nop);
        }
        self.emit_all(&insts)?;
        self.out.increase_indent();
        Ok(id)
    }

    pub fn do_if_expr_cond(&mut self, cond: &Sto) -> Result<LabelId, CompilerError> {
        let id = self.open_if();
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("if ({})", cond.name));
        self.load_value(&mut insts, cond, LHS)?;
        insts.push(AsmInst::Cmp(LHS, Operand::Reg(Reg::G0)));
        insts.push(AsmInst::Branch(Cond::Equal, else_label(id)));
        insts.push(AsmInst::Nop);
        self.emit_all(&insts)?;
        self.out.increase_indent();
        Ok(id)
    }

    fn open_if(&mut self) -> LabelId {
        let id = self.labels.next_if();
        debug!("if {id} opened");
        self.if_stack.push(IfFrame { id, has_else: false });
        id
    }

    pub fn do_else(&mut self) -> Result<(), CompilerError> {
        let frame = self
            .if_stack
            .last_mut()
            .ok_or_else(|| CompilerError::unbalanced("else without an open if"))?;
        if frame.has_else {
            return Err(CompilerError::unbalanced(format!("if {} already has an else", frame.id)));
        }
        frame.has_else = true;
        let id = frame.id;

        self.out.decrease_indent();
        let mut insts = vec![
            AsmInst::Branch(Cond::Always, endif_label(id)),
            AsmInst::Nop,
        ];
        self.comment(&mut insts, "else");
        insts.push(AsmInst::Label(else_label(id)));
        self.emit_all(&insts)?;
        self.out.increase_indent();
        Ok(())
    }

    pub fn do_end_if(&mut self) -> Result<(), CompilerError> {
        let frame = self
            .if_stack
            .pop()
            .ok_or_else(|| CompilerError::unbalanced("end if without an open if"))?;
        debug!("if {} closed", frame.id);
        self.out.decrease_indent();

        let mut insts = Vec::new();
        if !frame.has_else {
            insts.push(AsmInst::Label(else_label(frame.id)));
        }
        insts.push(AsmInst::Label(endif_label(frame.id)));
        self.emit_all(&insts)
    }

    /// Open a while loop; the condition follows with `do_while_expr_cond`
    pub fn do_while_open_loop(&mut self) -> Result<LabelId, CompilerError> {
        let id = self.labels.next_loop();
        debug!("loop {id} opened");
        self.loop_stack.push(id);
        self.emit_all(&[AsmInst::Label(loop_check_label(id))])?;
        self.out.increase_indent();
        Ok(id)
    }

    pub fn do_while_expr_cond(&mut self, cond: &Sto) -> Result<(), CompilerError> {
        let id = self.innermost_loop("while condition")?;
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("while ({})", cond.name));
        self.load_value(&mut insts, cond, LHS)?;
        insts.push(AsmInst::Cmp(LHS, Operand::Reg(Reg::G0)));
        insts.push(AsmInst::Branch(Cond::Equal, loop_end_label(id)));
        insts.push(AsmInst::Nop);
        self.emit_all(&insts)
    }

    pub fn do_while_close_loop(&mut self) -> Result<(), CompilerError> {
        let id = self
            .loop_stack
            .pop()
            .ok_or_else(|| CompilerError::unbalanced("loop close without an open loop"))?;
        debug!("loop {id} closed");
        self.emit_all(&[AsmInst::Branch(Cond::Always, loop_check_label(id)), AsmInst::Nop])?;
        self.out.decrease_indent();
        self.emit_all(&[AsmInst::Label(loop_end_label(id))])
    }

    /// Open `foreach (iter : array)`. `cursor` is a pointer temporary that
    /// walks the array; it starts one element before the first one and is
    /// advanced at the top of every iteration.
    pub fn do_foreach_open(&mut self, iter: &Sto, array: &Sto, cursor: &Sto) -> Result<LabelId, CompilerError> {
        let Type::Array(array_ty) = &array.ty else {
            return Err(CompilerError::invalid_descriptor(&array.name, "foreach needs an array"));
        };
        let element = array_ty
            .next()
            .cloned()
            .ok_or_else(|| CompilerError::invalid_descriptor(&array.name, "array type is incomplete"))?;
        let element_size = array_ty.element_size() as i32;
        let total_size = array_ty.total_size() as i32;

        let mut insts = Vec::new();
        self.comment(&mut insts, format!("foreach ({} : {})", iter.name, array.name));
        self.load_address(&mut insts, array, LHS)?;
        insts.push(AsmInst::Sub(LHS, Operand::Imm(element_size), LHS));
        self.store_value(&mut insts, LHS, cursor)?;
        self.emit_all(&insts)?;

        let id = self.do_while_open_loop()?;

        let mut insts = Vec::new();
        self.load_value(&mut insts, cursor, LHS)?;
        insts.push(AsmInst::Add(LHS, Operand::Imm(element_size), LHS));
        self.store_value(&mut insts, LHS, cursor)?;
        self.load_address(&mut insts, array, RHS)?;
        insts.push(AsmInst::Set(Operand::Imm(total_size), Reg::O2));
        insts.push(AsmInst::Add(RHS, Operand::Reg(Reg::O2), RHS));
        insts.push(AsmInst::Cmp(LHS, Operand::Reg(RHS)));
        insts.push(AsmInst::Branch(Cond::GreaterEqualUnsigned, loop_end_label(id)));
        insts.push(AsmInst::Nop);
        self.bind_iteration(&mut insts, iter, &element)?;
        self.emit_all(&insts)?;
        Ok(id)
    }

    /// Bind the element `%o0` points at to the iteration variable
    fn bind_iteration(&self, insts: &mut Vec<AsmInst>, iter: &Sto, element: &Type) -> Result<(), CompilerError> {
        if iter.is_indirect() {
            return self.store_slot(insts, LHS, iter);
        }
        match &iter.ty {
            Type::Float if !element.is_float() => {
                insts.push(AsmInst::Ld(Mem::at(LHS), PROMOTE_SCRATCH));
                transfer_bits(insts, PROMOTE_SCRATCH, FLHS);
                insts.push(AsmInst::Fitos(FLHS, FLHS));
                self.store_value(insts, FLHS, iter)
            }
            Type::Struct { .. } | Type::Array(_) => {
                insts.push(AsmInst::Mov(Operand::Reg(LHS), Reg::O1));
                self.load_address(insts, iter, Reg::O0)?;
                insts.push(AsmInst::Set(Operand::Imm(iter.ty.size() as i32), Reg::O2));
                insts.push(AsmInst::Call("memmove".to_string()));
                insts.push(AsmInst::Nop);
                Ok(())
            }
            _ => {
                insts.push(AsmInst::Ld(Mem::at(LHS), RHS));
                self.store_value(insts, RHS, iter)
            }
        }
    }

    pub fn do_foreach_close(&mut self) -> Result<(), CompilerError> {
        self.do_while_close_loop()
    }

    pub fn do_break(&mut self) -> Result<(), CompilerError> {
        let id = self.innermost_loop("break")?;
        self.emit_all(&[AsmInst::Branch(Cond::Always, loop_end_label(id)), AsmInst::Nop])
    }

    pub fn do_continue(&mut self) -> Result<(), CompilerError> {
        let id = self.innermost_loop("continue")?;
        self.emit_all(&[AsmInst::Branch(Cond::Always, loop_check_label(id)), AsmInst::Nop])
    }

    fn innermost_loop(&self, construct: &str) -> Result<LabelId, CompilerError> {
        self.loop_stack.last().copied().ok_or_else(|| CompilerError::NoEnclosingLoop {
            construct: construct.to_string(),
        })
    }
}
