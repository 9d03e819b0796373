//! Expressions
//!
//! Operands are loaded into `%o0`/`%o1` (or `%f0`/`%f1`), combined, and the
//! result is stored into the temporary the front end allocated for it.
//! Comparisons produce 0 or 1: `%o0` is cleared, and `inc` is skipped by a
//! branch on the inverse condition.

use super::{Emitter, FLHS, FRHS, LHS, LOAD_SCRATCH, RHS};
use crate::ops::{BinaryOp, IncDec, LogicalOp, UnaryOp};
use log::trace;
use rcs_codegen::{AsmInst, Cond, FCond, Mem, Operand, Reg};
use rcs_common::{CompilerError, LabelId, Sto, Type};
use std::io::Write;

fn and_or_skip_label(id: LabelId) -> String {
    format!(".$$.andorSkip.{id}")
}

fn and_or_end_label(id: LabelId) -> String {
    format!(".$$.andorEnd.{id}")
}

impl<W: Write> Emitter<W> {
    /// Integer (and bool equality) operators
    pub fn do_binary_int(
        &mut self,
        op: BinaryOp,
        lhs: &Sto,
        rhs: &Sto,
        result: &Sto,
    ) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = {} {op} {}", result.name, lhs.name, rhs.name));
        self.load_value(&mut insts, lhs, LHS)?;
        self.load_value(&mut insts, rhs, RHS)?;

        let rhs_op = Operand::Reg(RHS);
        match op {
            BinaryOp::Add => insts.push(AsmInst::Add(LHS, rhs_op, LHS)),
            BinaryOp::Sub => insts.push(AsmInst::Sub(LHS, rhs_op, LHS)),
            BinaryOp::BitAnd => insts.push(AsmInst::And(LHS, rhs_op, LHS)),
            BinaryOp::BitOr => insts.push(AsmInst::Or(LHS, rhs_op, LHS)),
            BinaryOp::BitXor => insts.push(AsmInst::Xor(LHS, rhs_op, LHS)),
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                // Operands are already in %o0/%o1, the result comes back in %o0
                let routine = op.runtime_routine().unwrap_or(".mul");
                insts.push(AsmInst::Call(routine.to_string()));
                insts.push(AsmInst::Nop);
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne => {
                insts.push(AsmInst::Cmp(LHS, rhs_op));
                let cond = op.cond().unwrap_or(Cond::Equal);
                self.materialize(&mut insts, |label| AsmInst::Branch(cond.inverse(), label));
            }
        }

        self.store_value(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }

    /// Float operators; int operands are promoted first
    pub fn do_binary_float(
        &mut self,
        op: BinaryOp,
        lhs: &Sto,
        rhs: &Sto,
        result: &Sto,
    ) -> Result<(), CompilerError> {
        if matches!(op, BinaryOp::Mod | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor) {
            return Err(CompilerError::UnsupportedOperator {
                op: op.to_string(),
                operand_type: Type::Float.name(),
            });
        }

        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = {} {op} {}", result.name, lhs.name, rhs.name));
        self.load_float(&mut insts, lhs, FLHS)?;
        self.load_float(&mut insts, rhs, FRHS)?;

        match op.fcond() {
            Some(fcond) => {
                insts.push(AsmInst::Fcmps(FLHS, FRHS));
                // A float compare may not be directly followed by a float branch
                insts.push(AsmInst::Nop);
                self.materialize(&mut insts, |label| AsmInst::FBranch(fcond.inverse(), label));
                self.store_value(&mut insts, LHS, result)?;
            }
            None => {
                let inst = match op {
                    BinaryOp::Add => AsmInst::Fadds(FLHS, FRHS, FLHS),
                    BinaryOp::Sub => AsmInst::Fsubs(FLHS, FRHS, FLHS),
                    BinaryOp::Mul => AsmInst::Fmuls(FLHS, FRHS, FLHS),
                    _ => AsmInst::Fdivs(FLHS, FRHS, FLHS),
                };
                insts.push(inst);
                self.store_value(&mut insts, FLHS, result)?;
            }
        }
        self.emit_all(&insts)
    }

    /// 0/1 into `%o0` from condition codes already set. `skip` builds the
    /// branch that jumps over the increment when the condition is false.
    pub(super) fn materialize(&mut self, insts: &mut Vec<AsmInst>, skip: impl FnOnce(String) -> AsmInst) {
        let label = format!(".$$.cmp.{}", self.labels.next_comparison());
        trace!("comparison label {label}");
        insts.push(AsmInst::Set(Operand::Imm(0), LHS));
        insts.push(skip(label.clone()));
        insts.push(AsmInst::Nop);
        insts.push(AsmInst::Inc(LHS));
        insts.push(AsmInst::Label(label));
    }

    /// Left operand of `&&`/`||`: skip the right operand when the result is
    /// already decided. Returns the label id shared with the right half.
    pub fn do_binary_bool_lhs(&mut self, op: LogicalOp, lhs: &Sto) -> Result<LabelId, CompilerError> {
        let id = self.labels.next_and_or();
        self.and_or_stack.push(id);
        trace!("{op} {id} opened");

        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} {op} ...", lhs.name));
        self.load_value(&mut insts, lhs, LHS)?;
        insts.push(AsmInst::Cmp(LHS, Operand::Reg(Reg::G0)));
        insts.push(AsmInst::Branch(op.short_circuit(), and_or_skip_label(id)));
        insts.push(AsmInst::Nop);
        self.emit_all(&insts)?;
        Ok(id)
    }

    /// Right operand of the innermost open `&&`/`||`; writes 0/1 into `result`
    pub fn do_binary_bool_rhs(&mut self, op: LogicalOp, rhs: &Sto, result: &Sto) -> Result<(), CompilerError> {
        let id = self
            .and_or_stack
            .pop()
            .ok_or_else(|| CompilerError::unbalanced(format!("right operand of '{op}' without a left operand")))?;
        trace!("{op} {id} closed");

        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = ... {op} {}", result.name, rhs.name));
        self.load_value(&mut insts, rhs, LHS)?;
        insts.push(AsmInst::Cmp(LHS, Operand::Reg(Reg::G0)));
        insts.push(AsmInst::Branch(op.short_circuit(), and_or_skip_label(id)));
        insts.push(AsmInst::Nop);
        insts.push(AsmInst::Set(Operand::Imm(op.fallthrough_value()), LHS));
        insts.push(AsmInst::Branch(Cond::Always, and_or_end_label(id)));
        insts.push(AsmInst::Nop);
        insts.push(AsmInst::Label(and_or_skip_label(id)));
        insts.push(AsmInst::Set(Operand::Imm(1 - op.fallthrough_value()), LHS));
        insts.push(AsmInst::Label(and_or_end_label(id)));
        self.store_value(&mut insts, LHS, result)?;
        self.emit_all(&insts)
    }

    pub fn do_unary(&mut self, op: UnaryOp, operand: &Sto, result: &Sto) -> Result<(), CompilerError> {
        if op == UnaryOp::Plus {
            return self.do_assign(result, operand);
        }

        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{} = {op}{}", result.name, operand.name));
        match (op, operand.ty.is_float()) {
            (UnaryOp::Neg, true) => {
                self.load_value(&mut insts, operand, FLHS)?;
                insts.push(AsmInst::Fnegs(FLHS, FLHS));
                self.store_value(&mut insts, FLHS, result)?;
            }
            (UnaryOp::Neg, false) => {
                self.load_value(&mut insts, operand, LHS)?;
                insts.push(AsmInst::Neg(LHS, LHS));
                self.store_value(&mut insts, LHS, result)?;
            }
            (UnaryOp::Not, false) => {
                self.load_value(&mut insts, operand, LHS)?;
                insts.push(AsmInst::Xor(LHS, Operand::Imm(1), LHS));
                self.store_value(&mut insts, LHS, result)?;
            }
            _ => {
                return Err(CompilerError::UnsupportedOperator {
                    op: op.to_string(),
                    operand_type: operand.ty.name(),
                })
            }
        }
        self.emit_all(&insts)
    }

    /// `++`/`--` on int, float and pointer variables. `result`, when
    /// present, receives the new value for prefix and the old value for
    /// postfix forms.
    pub fn do_inc_dec(&mut self, kind: IncDec, var: &Sto, result: Option<&Sto>) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("{kind}{}", var.name));

        match &var.ty {
            Type::Float => {
                let new = Reg::F(2);
                self.load_value(&mut insts, var, FLHS)?;
                let one = self.float_constant(&mut insts, 1.0);
                insts.push(AsmInst::Set(Operand::Label(one), LOAD_SCRATCH));
                insts.push(AsmInst::Ld(Mem::at(LOAD_SCRATCH), FRHS));
                insts.push(if kind.is_increment() {
                    AsmInst::Fadds(FLHS, FRHS, new)
                } else {
                    AsmInst::Fsubs(FLHS, FRHS, new)
                });
                self.store_value(&mut insts, new, var)?;
                if let Some(result) = result {
                    let value = if kind.is_prefix() { new } else { FLHS };
                    self.store_value(&mut insts, value, result)?;
                }
            }
            Type::Int | Type::Pointer(_) => {
                let step = match var.ty.pointer_target() {
                    Some(target) => target.size() as i32,
                    None => 1,
                };
                self.load_value(&mut insts, var, LHS)?;
                insts.push(if kind.is_increment() {
                    AsmInst::Add(LHS, Operand::Imm(step), RHS)
                } else {
                    AsmInst::Sub(LHS, Operand::Imm(step), RHS)
                });
                self.store_value(&mut insts, RHS, var)?;
                if let Some(result) = result {
                    let value = if kind.is_prefix() { RHS } else { LHS };
                    self.store_value(&mut insts, value, result)?;
                }
            }
            other => {
                return Err(CompilerError::UnsupportedOperator {
                    op: kind.to_string(),
                    operand_type: other.name(),
                })
            }
        }
        self.emit_all(&insts)
    }
}
