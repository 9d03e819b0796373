//! SPARC Assembly Instruction Definitions
//!
//! This module defines the register model and the subset of the SPARC V8
//! instruction set and assembler directives that the emitter produces.
//! Every instruction renders through `Display` as `mnemonic<TAB>operands`.

use std::fmt;

/// SPARC register
///
/// Integer registers are grouped in the register window the usual way:
/// globals `%g0-%g7`, outs `%o0-%o7`, locals `%l0-%l7`, ins `%i0-%i7`.
/// `%o6` and `%i6` are spelled `%sp` and `%fp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    G(u8),
    O(u8),
    L(u8),
    I(u8),
    /// Single-precision float register `%f0-%f31`
    F(u8),
    Sp,
    Fp,
}

impl Reg {
    pub const G0: Reg = Reg::G(0);
    pub const G1: Reg = Reg::G(1);
    pub const O0: Reg = Reg::O(0);
    pub const O1: Reg = Reg::O(1);
    pub const O2: Reg = Reg::O(2);
    pub const L0: Reg = Reg::L(0);
    pub const L1: Reg = Reg::L(1);
    pub const L6: Reg = Reg::L(6);
    pub const L7: Reg = Reg::L(7);
    pub const I0: Reg = Reg::I(0);
    pub const F0: Reg = Reg::F(0);
    pub const F1: Reg = Reg::F(1);

    pub fn is_float(&self) -> bool {
        matches!(self, Reg::F(_))
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::G(n) => write!(f, "%g{n}"),
            Reg::O(n) => write!(f, "%o{n}"),
            Reg::L(n) => write!(f, "%l{n}"),
            Reg::I(n) => write!(f, "%i{n}"),
            Reg::F(n) => write!(f, "%f{n}"),
            Reg::Sp => write!(f, "%sp"),
            Reg::Fp => write!(f, "%fp"),
        }
    }
}

/// Second source operand: register, immediate or symbol
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Reg(Reg),
    Imm(i32),
    Label(String),
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

impl From<i32> for Operand {
    fn from(imm: i32) -> Self {
        Operand::Imm(imm)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{reg}"),
            Operand::Imm(imm) => write!(f, "{imm}"),
            Operand::Label(label) => write!(f, "{label}"),
        }
    }
}

/// `[reg + disp]` memory reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mem {
    pub base: Reg,
    pub disp: i32,
}

impl Mem {
    pub fn at(base: Reg) -> Self {
        Self { base, disp: 0 }
    }

    pub fn offset(base: Reg, disp: i32) -> Self {
        Self { base, disp }
    }
}

impl fmt::Display for Mem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.disp {
            0 => write!(f, "[{}]", self.base),
            d if d < 0 => write!(f, "[{}{}]", self.base, d),
            d => write!(f, "[{}+{}]", self.base, d),
        }
    }
}

/// Integer condition codes for `b<cond>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Always,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LessUnsigned,
    GreaterEqualUnsigned,
}

impl Cond {
    /// Condition that holds exactly when `self` does not
    pub fn inverse(self) -> Cond {
        match self {
            Cond::Always => Cond::Always,
            Cond::Equal => Cond::NotEqual,
            Cond::NotEqual => Cond::Equal,
            Cond::Less => Cond::GreaterEqual,
            Cond::LessEqual => Cond::Greater,
            Cond::Greater => Cond::LessEqual,
            Cond::GreaterEqual => Cond::Less,
            Cond::LessUnsigned => Cond::GreaterEqualUnsigned,
            Cond::GreaterEqualUnsigned => Cond::LessUnsigned,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Cond::Always => "ba",
            Cond::Equal => "be",
            Cond::NotEqual => "bne",
            Cond::Less => "bl",
            Cond::LessEqual => "ble",
            Cond::Greater => "bg",
            Cond::GreaterEqual => "bge",
            Cond::LessUnsigned => "blu",
            Cond::GreaterEqualUnsigned => "bgeu",
        }
    }
}

/// Float condition codes for `fb<cond>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FCond {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// Unordered or less
    UnorderedLess,
    UnorderedLessEqual,
    UnorderedGreater,
    UnorderedGreaterEqual,
}

impl FCond {
    /// Condition taken exactly when `self` is not, unordered results included
    pub fn inverse(self) -> FCond {
        match self {
            // fbne is also taken on unordered
            FCond::Equal => FCond::NotEqual,
            FCond::NotEqual => FCond::Equal,
            FCond::Less => FCond::UnorderedGreaterEqual,
            FCond::LessEqual => FCond::UnorderedGreater,
            FCond::Greater => FCond::UnorderedLessEqual,
            FCond::GreaterEqual => FCond::UnorderedLess,
            FCond::UnorderedLess => FCond::GreaterEqual,
            FCond::UnorderedLessEqual => FCond::Greater,
            FCond::UnorderedGreater => FCond::LessEqual,
            FCond::UnorderedGreaterEqual => FCond::Less,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            FCond::Equal => "fbe",
            FCond::NotEqual => "fbne",
            FCond::Less => "fbl",
            FCond::LessEqual => "fble",
            FCond::Greater => "fbg",
            FCond::GreaterEqual => "fbge",
            FCond::UnorderedLess => "fbul",
            FCond::UnorderedLessEqual => "fbule",
            FCond::UnorderedGreater => "fbug",
            FCond::UnorderedGreaterEqual => "fbuge",
        }
    }
}

/// Object file sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Text,
    Data,
    Bss,
    Rodata,
    Init,
    Fini,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Text => write!(f, "\".text\""),
            Section::Data => write!(f, "\".data\""),
            Section::Bss => write!(f, "\".bss\""),
            Section::Rodata => write!(f, "\".rodata\""),
            Section::Init => write!(f, "\".init\""),
            Section::Fini => write!(f, "\".fini\""),
        }
    }
}

/// SPARC assembly instructions and directives
#[derive(Debug, Clone, PartialEq)]
pub enum AsmInst {
    // Data movement
    Set(Operand, Reg),            // rd = imm or symbol address
    Ld(Mem, Reg),                 // rd = memory[mem]
    St(Reg, Mem),                 // memory[mem] = rs
    Mov(Operand, Reg),            // rd = op

    // Integer arithmetic and logic
    Add(Reg, Operand, Reg),       // rd = rs + op
    Sub(Reg, Operand, Reg),       // rd = rs - op
    And(Reg, Operand, Reg),       // rd = rs & op
    Or(Reg, Operand, Reg),        // rd = rs | op
    Xor(Reg, Operand, Reg),       // rd = rs ^ op
    Neg(Reg, Reg),                // rd = -rs
    Inc(Reg),                     // rd = rd + 1
    Dec(Reg),                     // rd = rd - 1
    Cmp(Reg, Operand),            // set condition codes from rs - op

    // Float unit
    Fitos(Reg, Reg),              // int bits -> float
    Fstoi(Reg, Reg),              // float -> int bits
    Fadds(Reg, Reg, Reg),
    Fsubs(Reg, Reg, Reg),
    Fmuls(Reg, Reg, Reg),
    Fdivs(Reg, Reg, Reg),
    Fnegs(Reg, Reg),
    Fmovs(Reg, Reg),
    Fcmps(Reg, Reg),

    // Control flow
    Branch(Cond, String),
    FBranch(FCond, String),
    Call(String),
    CallReg(Reg),                 // call through a register
    Nop,
    Save(Reg, Operand, Reg),
    Ret,
    Restore,

    // Assembler directives
    Section(Section),
    Align(u32),
    Global(String),
    Skip(u32),
    Word(i32),
    Single(f32),
    Asciz(String),
    Equate(String, String),       // SYM = expr

    // Pseudo
    Label(String),
    Comment(String),
    Blank,
}

/// Escape a string for an `.asciz` directive
pub fn escape_asciz(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\0' => escaped.push_str("\\0"),
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl fmt::Display for AsmInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Data movement
            AsmInst::Set(op, rd) => write!(f, "set\t{op}, {rd}"),
            AsmInst::Ld(mem, rd) => write!(f, "ld\t{mem}, {rd}"),
            AsmInst::St(rs, mem) => write!(f, "st\t{rs}, {mem}"),
            AsmInst::Mov(op, rd) => write!(f, "mov\t{op}, {rd}"),

            // Integer
            AsmInst::Add(rs, op, rd) => write!(f, "add\t{rs}, {op}, {rd}"),
            AsmInst::Sub(rs, op, rd) => write!(f, "sub\t{rs}, {op}, {rd}"),
            AsmInst::And(rs, op, rd) => write!(f, "and\t{rs}, {op}, {rd}"),
            AsmInst::Or(rs, op, rd) => write!(f, "or\t{rs}, {op}, {rd}"),
            AsmInst::Xor(rs, op, rd) => write!(f, "xor\t{rs}, {op}, {rd}"),
            AsmInst::Neg(rs, rd) => write!(f, "neg\t{rs}, {rd}"),
            AsmInst::Inc(rd) => write!(f, "inc\t{rd}"),
            AsmInst::Dec(rd) => write!(f, "dec\t{rd}"),
            AsmInst::Cmp(rs, op) => write!(f, "cmp\t{rs}, {op}"),

            // Float
            AsmInst::Fitos(rs, rd) => write!(f, "fitos\t{rs}, {rd}"),
            AsmInst::Fstoi(rs, rd) => write!(f, "fstoi\t{rs}, {rd}"),
            AsmInst::Fadds(a, b, rd) => write!(f, "fadds\t{a}, {b}, {rd}"),
            AsmInst::Fsubs(a, b, rd) => write!(f, "fsubs\t{a}, {b}, {rd}"),
            AsmInst::Fmuls(a, b, rd) => write!(f, "fmuls\t{a}, {b}, {rd}"),
            AsmInst::Fdivs(a, b, rd) => write!(f, "fdivs\t{a}, {b}, {rd}"),
            AsmInst::Fnegs(rs, rd) => write!(f, "fnegs\t{rs}, {rd}"),
            AsmInst::Fmovs(rs, rd) => write!(f, "fmovs\t{rs}, {rd}"),
            AsmInst::Fcmps(a, b) => write!(f, "fcmps\t{a}, {b}"),

            // Control flow
            AsmInst::Branch(cond, label) => write!(f, "{}\t{}", cond.mnemonic(), label),
            AsmInst::FBranch(cond, label) => write!(f, "{}\t{}", cond.mnemonic(), label),
            AsmInst::Call(label) => write!(f, "call\t{label}"),
            AsmInst::CallReg(reg) => write!(f, "call\t{reg}"),
            AsmInst::Nop => write!(f, "nop"),
            AsmInst::Save(rs, op, rd) => write!(f, "save\t{rs}, {op}, {rd}"),
            AsmInst::Ret => write!(f, "ret"),
            AsmInst::Restore => write!(f, "restore"),

            // Directives
            AsmInst::Section(section) => write!(f, ".section\t{section}"),
            AsmInst::Align(n) => write!(f, ".align\t{n}"),
            AsmInst::Global(name) => write!(f, ".global\t{name}"),
            AsmInst::Skip(n) => write!(f, ".skip\t{n}"),
            AsmInst::Word(n) => write!(f, ".word\t{n}"),
            AsmInst::Single(v) => write!(f, ".single\t0r{v:?}"),
            AsmInst::Asciz(text) => write!(f, ".asciz\t\"{}\"", escape_asciz(text)),
            AsmInst::Equate(sym, expr) => write!(f, "{sym} = {expr}"),

            // Pseudo
            AsmInst::Label(label) => write!(f, "{label}:"),
            AsmInst::Comment(text) => write!(f, "! {text}"),
            AsmInst::Blank => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_display() {
        assert_eq!(format!("{}", Reg::G0), "%g0");
        assert_eq!(format!("{}", Reg::O(5)), "%o5");
        assert_eq!(format!("{}", Reg::L7), "%l7");
        assert_eq!(format!("{}", Reg::I0), "%i0");
        assert_eq!(format!("{}", Reg::F(31)), "%f31");
        assert_eq!(format!("{}", Reg::Sp), "%sp");
        assert_eq!(format!("{}", Reg::Fp), "%fp");
    }

    #[test]
    fn test_instruction_display() {
        assert_eq!(format!("{}", AsmInst::Set(Operand::Imm(4095), Reg::L0)), "set\t4095, %l0");
        assert_eq!(
            format!("{}", AsmInst::Add(Reg::O0, Operand::Reg(Reg::O1), Reg::O0)),
            "add\t%o0, %o1, %o0"
        );
        assert_eq!(format!("{}", AsmInst::Ld(Mem::at(Reg::L7), Reg::F0)), "ld\t[%l7], %f0");
        assert_eq!(format!("{}", AsmInst::St(Reg::I0, Mem::offset(Reg::Fp, 68))), "st\t%i0, [%fp+68]");
        assert_eq!(format!("{}", AsmInst::St(Reg::G0, Mem::offset(Reg::Fp, -8))), "st\t%g0, [%fp-8]");
        assert_eq!(format!("{}", AsmInst::Save(Reg::Sp, Operand::Imm(-96), Reg::Sp)), "save\t%sp, -96, %sp");
        assert_eq!(format!("{}", AsmInst::Label("main".to_string())), "main:");
        assert_eq!(format!("{}", AsmInst::Comment("Store params".to_string())), "! Store params");
    }

    #[test]
    fn test_directive_display() {
        assert_eq!(format!("{}", AsmInst::Section(Section::Bss)), ".section\t\".bss\"");
        assert_eq!(format!("{}", AsmInst::Single(1.5)), ".single\t0r1.5");
        assert_eq!(format!("{}", AsmInst::Single(2.0)), ".single\t0r2.0");
        assert_eq!(format!("{}", AsmInst::Asciz("a\"b\n".to_string())), ".asciz\t\"a\\\"b\\n\"");
        assert_eq!(
            format!("{}", AsmInst::Equate("SAVE.main.void".to_string(), "-(92 + 8) & -8".to_string())),
            "SAVE.main.void = -(92 + 8) & -8"
        );
    }

    #[test]
    fn test_condition_inverse() {
        assert_eq!(Cond::Less.inverse(), Cond::GreaterEqual);
        assert_eq!(Cond::Equal.inverse().inverse(), Cond::Equal);
        assert_eq!(FCond::Greater.inverse(), FCond::UnorderedLessEqual);
        assert_eq!(format!("{}", AsmInst::Branch(Cond::GreaterEqualUnsigned, "L".to_string())), "bgeu\tL");
        assert_eq!(format!("{}", AsmInst::FBranch(FCond::NotEqual, "L".to_string())), "fbne\tL");
    }

    #[test]
    fn test_float_inverse_covers_unordered() {
        let all = [
            FCond::Equal,
            FCond::NotEqual,
            FCond::Less,
            FCond::LessEqual,
            FCond::Greater,
            FCond::GreaterEqual,
            FCond::UnorderedLess,
            FCond::UnorderedLessEqual,
            FCond::UnorderedGreater,
            FCond::UnorderedGreaterEqual,
        ];
        for cond in all {
            assert_eq!(cond.inverse().inverse(), cond);
        }
        assert_eq!(FCond::Less.inverse().mnemonic(), "fbuge");
        assert_eq!(FCond::LessEqual.inverse().mnemonic(), "fbug");
        assert_eq!(FCond::Greater.inverse().mnemonic(), "fbule");
        assert_eq!(FCond::GreaterEqual.inverse().mnemonic(), "fbul");
    }
}
