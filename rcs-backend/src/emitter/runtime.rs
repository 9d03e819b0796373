//! File header and runtime support routines
//!
//! Every emitted unit starts with the same preamble: the format strings used
//! by the print intrinsics, a scratch word for moving bits between the
//! integer and float register files, and three small subroutines the
//! generated code calls for printing bools and checking array bounds and
//! null pointers.

use super::Emitter;
use rcs_codegen::{AsmInst, Cond, Operand, Reg, Section};
use rcs_common::CompilerError;
use log::debug;
use std::io::Write;

pub(crate) const INT_FMT: &str = ".$$.intFmt";
pub(crate) const STR_FMT: &str = ".$$.strFmt";
pub(crate) const STR_TF: &str = ".$$.strTF";
pub(crate) const STR_ENDL: &str = ".$$.strEndl";
pub(crate) const STR_ARR_BOUND: &str = ".$$.strArrBound";
pub(crate) const STR_NULL_PTR: &str = ".$$.strNullPtr";
pub(crate) const FLOAT_TMP: &str = ".$$.fltTmp";
pub(crate) const PRINT_BOOL: &str = ".$$.printBool";
pub(crate) const ARR_CHECK: &str = ".$$.arrCheck";
pub(crate) const PTR_CHECK: &str = ".$$.ptrCheck";

/// "false" padded to 8 bytes, then "true"
const TRUE_FALSE: &str = "false\0\0\0true";
const TRUE_OFFSET: i32 = 8;

const HEADER: [&str; 2] = ["! {}", "! SPARC assembly generated by rcs {}"];

fn label(name: &str) -> AsmInst {
    AsmInst::Label(name.to_string())
}

fn call(target: &str) -> [AsmInst; 2] {
    [AsmInst::Call(target.to_string()), AsmInst::Nop]
}

impl<W: Write> Emitter<W> {
    /// Emit the file preamble. Call once, before any declaration.
    pub fn format_header(&mut self) -> Result<(), CompilerError> {
        debug!("emitting runtime header for '{}'", self.options.unit_name);
        let unit = self.options.unit_name.clone();
        self.out.write_template(HEADER[0], &[&unit])?;
        self.out.write_template(HEADER[1], &[&env!("CARGO_PKG_VERSION")])?;
        self.out.emit(&AsmInst::Blank)?;

        let mut insts = Vec::new();

        self.switch_section(&mut insts, Section::Rodata);
        for (name, text) in [
            (INT_FMT, "%d"),
            (STR_FMT, "%s"),
            (STR_TF, TRUE_FALSE),
            (STR_ENDL, "\n"),
            (STR_ARR_BOUND, "Index value of %d is outside legal range [0,%d).\n"),
            (STR_NULL_PTR, "Attempt to dereference NULL pointer.\n"),
        ] {
            insts.push(label(name));
            insts.push(AsmInst::Asciz(text.to_string()));
        }
        insts.push(AsmInst::Blank);

        self.switch_section(&mut insts, Section::Bss);
        insts.push(label(FLOAT_TMP));
        insts.push(AsmInst::Skip(4));
        insts.push(AsmInst::Blank);

        self.switch_section(&mut insts, Section::Text);
        print_bool(&mut insts);
        arr_check(&mut insts);
        ptr_check(&mut insts);

        self.emit_all(&insts)
    }
}

fn save_minimal(insts: &mut Vec<AsmInst>) {
    insts.push(AsmInst::Save(Reg::Sp, Operand::Imm(-96), Reg::Sp));
}

fn ret(insts: &mut Vec<AsmInst>) {
    insts.push(AsmInst::Ret);
    insts.push(AsmInst::Restore);
}

/// Print "true" or "false" for the bool in `%o0`
fn print_bool(insts: &mut Vec<AsmInst>) {
    let print = format!("{PRINT_BOOL}2");
    insts.push(label(PRINT_BOOL));
    save_minimal(insts);
    insts.push(AsmInst::Set(Operand::Label(STR_TF.to_string()), Reg::O0));
    insts.push(AsmInst::Cmp(Reg::G0, Operand::Reg(Reg::I0)));
    insts.push(AsmInst::Branch(Cond::Equal, print.clone()));
    insts.push(AsmInst::Nop);
    insts.push(AsmInst::Add(Reg::O0, Operand::Imm(TRUE_OFFSET), Reg::O0));
    insts.push(label(&print));
    insts.extend(call("printf"));
    ret(insts);
    insts.push(AsmInst::Blank);
}

/// Exit with status 1 unless `0 <= %o0 < %o1`
fn arr_check(insts: &mut Vec<AsmInst>) {
    let fail = format!("{ARR_CHECK}.fail");
    insts.push(label(ARR_CHECK));
    save_minimal(insts);
    insts.push(AsmInst::Cmp(Reg::I0, Operand::Reg(Reg::G0)));
    insts.push(AsmInst::Branch(Cond::Less, fail.clone()));
    insts.push(AsmInst::Nop);
    insts.push(AsmInst::Cmp(Reg::I0, Operand::Reg(Reg::I(1))));
    insts.push(AsmInst::Branch(Cond::GreaterEqual, fail.clone()));
    insts.push(AsmInst::Nop);
    ret(insts);
    insts.push(label(&fail));
    insts.push(AsmInst::Set(Operand::Label(STR_ARR_BOUND.to_string()), Reg::O0));
    insts.push(AsmInst::Mov(Operand::Reg(Reg::I0), Reg::O1));
    insts.push(AsmInst::Mov(Operand::Reg(Reg::I(1)), Reg::O2));
    insts.extend(call("printf"));
    exit_failure(insts);
    insts.push(AsmInst::Blank);
}

/// Exit with status 1 when `%o0` is null
fn ptr_check(insts: &mut Vec<AsmInst>) {
    let ok = format!("{PTR_CHECK}.ok");
    insts.push(label(PTR_CHECK));
    save_minimal(insts);
    insts.push(AsmInst::Cmp(Reg::I0, Operand::Reg(Reg::G0)));
    insts.push(AsmInst::Branch(Cond::NotEqual, ok.clone()));
    insts.push(AsmInst::Nop);
    insts.push(AsmInst::Set(Operand::Label(STR_NULL_PTR.to_string()), Reg::O0));
    insts.extend(call("printf"));
    exit_failure(insts);
    insts.push(label(&ok));
    ret(insts);
    insts.push(AsmInst::Blank);
}

fn exit_failure(insts: &mut Vec<AsmInst>) {
    insts.push(AsmInst::Set(Operand::Imm(1), Reg::O0));
    insts.extend(call("exit"));
}
