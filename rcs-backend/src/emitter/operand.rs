//! Operand access
//!
//! All descriptor traffic goes through these helpers. A memory operand is
//! addressed by forming `base + offset` in a scratch register; indirect
//! slots hold a pointer and need one more load before the value is reached.
//! Literals never touch memory except floats, which live in a `.rodata`
//! pool because SPARC has no float immediates.

use super::runtime::FLOAT_TMP;
use super::{Emitter, LOAD_SCRATCH, PROMOTE_SCRATCH, STORE_SCRATCH};
use log::trace;
use rcs_codegen::{AsmInst, Mem, Operand, Reg, Section};
use rcs_common::{Base, CompilerError, Displacement, Literal, Location, Sto, Type};
use std::io::Write;

pub(crate) fn base_reg(base: Base) -> Reg {
    match base {
        Base::G0 => Reg::G0,
        Base::Fp => Reg::Fp,
        Base::Sp => Reg::Sp,
    }
}

/// Copy the bits of `src` into `dest` through the scratch word. SPARC has
/// no direct move between the integer and float register files.
pub(crate) fn transfer_bits(insts: &mut Vec<AsmInst>, src: Reg, dest: Reg) {
    insts.push(AsmInst::Set(Operand::Label(FLOAT_TMP.to_string()), LOAD_SCRATCH));
    insts.push(AsmInst::St(src, Mem::at(LOAD_SCRATCH)));
    insts.push(AsmInst::Ld(Mem::at(LOAD_SCRATCH), dest));
}

impl<W: Write> Emitter<W> {
    /// Add `value` to the float pool and return its label
    pub(super) fn float_constant(&mut self, insts: &mut Vec<AsmInst>, value: f32) -> String {
        let name = format!(".$$.float.{}", self.labels.next_float());
        trace!("pooled float {value:?} as {name}");
        self.in_section(insts, Section::Rodata, |insts| {
            insts.push(AsmInst::Label(name.clone()));
            insts.push(AsmInst::Single(value));
        });
        name
    }

    /// Add `text` to the string pool and return its label
    pub(super) fn string_constant(&mut self, insts: &mut Vec<AsmInst>, text: &str) -> String {
        let name = format!(".$$.str.{}", self.labels.next_string());
        trace!("pooled string {text:?} as {name}");
        self.in_section(insts, Section::Rodata, |insts| {
            insts.push(AsmInst::Label(name.clone()));
            insts.push(AsmInst::Asciz(text.to_string()));
        });
        name
    }

    /// Address of the slot itself, ignoring indirection
    pub(super) fn slot_address(
        &self,
        insts: &mut Vec<AsmInst>,
        sto: &Sto,
        reg: Reg,
    ) -> Result<(), CompilerError> {
        sto.check()?;
        let address = sto
            .memory()
            .ok_or_else(|| CompilerError::invalid_descriptor(&sto.name, "a literal has no address"))?;
        let offset = match &address.offset {
            Displacement::Const(n) => Operand::Imm(*n),
            Displacement::Symbol(symbol) => Operand::Label(symbol.clone()),
        };
        insts.push(AsmInst::Set(offset, reg));
        insts.push(AsmInst::Add(base_reg(address.base), Operand::Reg(reg), reg));
        Ok(())
    }

    /// Address of the value `sto` designates
    pub(super) fn load_address(
        &self,
        insts: &mut Vec<AsmInst>,
        sto: &Sto,
        reg: Reg,
    ) -> Result<(), CompilerError> {
        self.slot_address(insts, sto, reg)?;
        if sto.is_indirect() {
            insts.push(AsmInst::Ld(Mem::at(reg), reg));
        }
        Ok(())
    }

    /// Value of `sto` in `reg`. Float registers receive the raw word, so
    /// an int loaded into a float register is not converted (see
    /// `load_float`). Arrays decay to their address.
    pub(super) fn load_value(
        &mut self,
        insts: &mut Vec<AsmInst>,
        sto: &Sto,
        reg: Reg,
    ) -> Result<(), CompilerError> {
        sto.check()?;
        match &sto.location {
            Location::Literal(literal) => self.load_literal(insts, sto, literal, reg),
            Location::Memory(_) => match &sto.ty {
                Type::Array(_) => self.load_address(insts, sto, reg),
                Type::Struct { .. } => Err(CompilerError::invalid_descriptor(
                    &sto.name,
                    "struct values are copied by address",
                )),
                _ => {
                    self.load_address(insts, sto, LOAD_SCRATCH)?;
                    insts.push(AsmInst::Ld(Mem::at(LOAD_SCRATCH), reg));
                    Ok(())
                }
            },
            Location::Unallocated => Err(CompilerError::invalid_descriptor(
                &sto.name,
                "storage has not been allocated",
            )),
        }
    }

    fn load_literal(
        &mut self,
        insts: &mut Vec<AsmInst>,
        sto: &Sto,
        literal: &Literal,
        reg: Reg,
    ) -> Result<(), CompilerError> {
        match literal {
            Literal::Int(_) | Literal::Bool(_) => {
                let word = literal.as_word().unwrap_or_default();
                if reg.is_float() {
                    insts.push(AsmInst::Set(Operand::Imm(word), PROMOTE_SCRATCH));
                    transfer_bits(insts, PROMOTE_SCRATCH, reg);
                } else {
                    insts.push(AsmInst::Set(Operand::Imm(word), reg));
                }
            }
            Literal::Float(value) => {
                let label = self.float_constant(insts, *value);
                insts.push(AsmInst::Set(Operand::Label(label), LOAD_SCRATCH));
                insts.push(AsmInst::Ld(Mem::at(LOAD_SCRATCH), reg));
            }
            Literal::Str(_) => {
                return Err(CompilerError::invalid_descriptor(
                    &sto.name,
                    "string constants can only be printed",
                ))
            }
        }
        Ok(())
    }

    /// Float value of `sto` in `freg`, converting int and bool operands
    pub(super) fn load_float(
        &mut self,
        insts: &mut Vec<AsmInst>,
        sto: &Sto,
        freg: Reg,
    ) -> Result<(), CompilerError> {
        if let Some(literal) = sto.literal_value() {
            if let Some(word) = literal.as_word() {
                // Pool the converted constant instead of converting at runtime
                let label = self.float_constant(insts, word as f32);
                insts.push(AsmInst::Set(Operand::Label(label), LOAD_SCRATCH));
                insts.push(AsmInst::Ld(Mem::at(LOAD_SCRATCH), freg));
                return Ok(());
            }
        }
        if sto.ty.is_float() {
            return self.load_value(insts, sto, freg);
        }
        self.load_value(insts, sto, PROMOTE_SCRATCH)?;
        transfer_bits(insts, PROMOTE_SCRATCH, freg);
        insts.push(AsmInst::Fitos(freg, freg));
        Ok(())
    }

    /// Store `reg` into the value `sto` designates
    pub(super) fn store_value(
        &self,
        insts: &mut Vec<AsmInst>,
        reg: Reg,
        sto: &Sto,
    ) -> Result<(), CompilerError> {
        if sto.literal_value().is_some() {
            return Err(CompilerError::invalid_descriptor(&sto.name, "cannot store into a literal"));
        }
        self.load_address(insts, sto, STORE_SCRATCH)?;
        insts.push(AsmInst::St(reg, Mem::at(STORE_SCRATCH)));
        Ok(())
    }

    /// Store `reg` into the slot of `sto` itself. Used to bind an address to
    /// an indirect slot and to spill incoming parameters.
    pub(super) fn store_slot(
        &self,
        insts: &mut Vec<AsmInst>,
        reg: Reg,
        sto: &Sto,
    ) -> Result<(), CompilerError> {
        self.slot_address(insts, sto, STORE_SCRATCH)?;
        insts.push(AsmInst::St(reg, Mem::at(STORE_SCRATCH)));
        Ok(())
    }
}
