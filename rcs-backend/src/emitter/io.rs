//! Print and read intrinsics

use super::runtime::{INT_FMT, PRINT_BOOL, STR_ENDL, STR_FMT};
use super::{Emitter, FLHS, LHS, RHS};
use rcs_codegen::{AsmInst, Operand, Reg};
use rcs_common::{CompilerError, Literal, Sto, Type};
use std::io::Write;

fn call(insts: &mut Vec<AsmInst>, target: &str) {
    insts.push(AsmInst::Call(target.to_string()));
    insts.push(AsmInst::Nop);
}

fn set_label(insts: &mut Vec<AsmInst>, label: &str, reg: Reg) {
    insts.push(AsmInst::Set(Operand::Label(label.to_string()), reg));
}

impl<W: Write> Emitter<W> {
    /// `cout << sto`
    pub fn do_print(&mut self, sto: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        if let Some(Literal::Str(text)) = sto.literal_value() {
            let label = self.string_constant(&mut insts, text);
            self.comment(&mut insts, format!("cout << {:?}", text));
            set_label(&mut insts, STR_FMT, LHS);
            set_label(&mut insts, &label, RHS);
            call(&mut insts, "printf");
            return self.emit_all(&insts);
        }

        self.comment(&mut insts, format!("cout << {}", sto.name));
        match &sto.ty {
            Type::Int | Type::Pointer(_) | Type::Null => {
                set_label(&mut insts, INT_FMT, LHS);
                self.load_value(&mut insts, sto, RHS)?;
                call(&mut insts, "printf");
            }
            Type::Bool => {
                self.load_value(&mut insts, sto, LHS)?;
                call(&mut insts, PRINT_BOOL);
            }
            Type::Float => {
                self.load_float(&mut insts, sto, FLHS)?;
                call(&mut insts, "printFloat");
            }
            other => {
                return Err(CompilerError::invalid_descriptor(
                    &sto.name,
                    format!("cannot print a value of type {other}"),
                ))
            }
        }
        self.emit_all(&insts)
    }

    /// `cout << endl`
    pub fn do_print_endl(&mut self) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        set_label(&mut insts, STR_ENDL, LHS);
        call(&mut insts, "printf");
        self.emit_all(&insts)
    }

    /// `cin >> sto`
    pub fn do_read(&mut self, sto: &Sto) -> Result<(), CompilerError> {
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("cin >> {}", sto.name));
        match &sto.ty {
            Type::Int => {
                call(&mut insts, "inputInt");
                self.store_value(&mut insts, LHS, sto)?;
            }
            Type::Float => {
                call(&mut insts, "inputFloat");
                self.store_value(&mut insts, FLHS, sto)?;
            }
            other => {
                return Err(CompilerError::invalid_descriptor(
                    &sto.name,
                    format!("cannot read a value of type {other}"),
                ))
            }
        }
        self.emit_all(&insts)
    }
}
