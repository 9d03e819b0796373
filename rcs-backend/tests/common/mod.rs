//! Interpreter for the SPARC subset the emitter produces
//!
//! Good enough to run emitted integer code: register windows, `.bss` and
//! `.data` storage, the condition codes of `cmp`, calls into emitted labels
//! and a handful of runtime routines (`printf`, `exit`, `.mul`, `.div`,
//! `.rem`, `calloc`, `free`). Branch delay slots are always `nop` in
//! emitted code, so branches jump immediately.

#![allow(dead_code)]

use std::collections::HashMap;

const DATA_BASE: i64 = 0x1000;
const TEXT_BASE: i64 = 0x10_0000;
const HEAP_BASE: i64 = 0x20_0000;
const STACK_TOP: i64 = 0x80_0000;
const STEP_LIMIT: usize = 200_000;

#[derive(Debug, Clone)]
struct Inst {
    op: String,
    args: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct Window {
    o: [i64; 8],
    l: [i64; 8],
    i: [i64; 8],
}

pub struct Machine {
    program: Vec<Inst>,
    /// Text labels to instruction index
    labels: HashMap<String, usize>,
    /// Data labels and equates to values
    symbols: HashMap<String, i64>,
    strings: HashMap<i64, String>,
    memory: HashMap<i64, i64>,
    globals: [i64; 8],
    windows: Vec<Window>,
    cc: (i64, i64),
    heap: i64,
    pub stdout: String,
    pub calls: Vec<String>,
    pub exit_code: Option<i64>,
}

fn unescape(text: &str) -> String {
    let mut out = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// `-(92 + N) & -8`
fn eval_equate(expr: &str) -> i64 {
    let inner = expr
        .trim()
        .trim_start_matches("-(")
        .split(')')
        .next()
        .unwrap_or("0");
    let sum: i64 = inner.split('+').map(|n| n.trim().parse::<i64>().unwrap()).sum();
    -sum & -8
}

impl Machine {
    /// Load assembly text. Panics on text outside the supported subset.
    pub fn load(asm: &str) -> Self {
        let mut machine = Machine {
            program: Vec::new(),
            labels: HashMap::new(),
            symbols: HashMap::new(),
            strings: HashMap::new(),
            memory: HashMap::new(),
            globals: [0; 8],
            windows: vec![Window::default()],
            cc: (0, 0),
            heap: HEAP_BASE,
            stdout: String::new(),
            calls: Vec::new(),
            exit_code: None,
        };
        machine.windows[0].o[6] = STACK_TOP;
        machine.windows[0].i[6] = STACK_TOP;

        let mut section = "\".text\"".to_string();
        let mut cursor = DATA_BASE;
        for raw in asm.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('!') {
                continue;
            }
            if let Some((symbol, expr)) = line.split_once(" = ") {
                machine.symbols.insert(symbol.to_string(), eval_equate(expr));
                continue;
            }
            if let Some(label) = line.strip_suffix(':') {
                let is_code = matches!(section.as_str(), "\".text\"" | "\".init\"" | "\".fini\"");
                if is_code {
                    machine.labels.insert(label.to_string(), machine.program.len());
                } else {
                    machine.symbols.insert(label.to_string(), cursor);
                }
                continue;
            }
            let (op, rest) = line.split_once('\t').unwrap_or((line, ""));
            match op {
                ".section" => section = rest.to_string(),
                ".align" | ".global" => {}
                ".skip" => cursor += rest.parse::<i64>().unwrap(),
                ".word" => {
                    machine.memory.insert(cursor, rest.parse().unwrap());
                    cursor += 4;
                }
                ".single" => {
                    let value: f32 = rest.trim_start_matches("0r").parse().unwrap();
                    machine.memory.insert(cursor, value.to_bits() as i32 as i64);
                    cursor += 4;
                }
                ".asciz" => {
                    let text = unescape(rest.trim_matches('"'));
                    let mut offset = 0;
                    for piece in text.split('\0') {
                        machine.strings.insert(cursor + offset, piece.to_string());
                        offset += piece.len() as i64 + 1;
                    }
                    cursor += (text.len() as i64 + 1 + 3) & !3;
                }
                _ => machine.program.push(Inst {
                    op: op.to_string(),
                    args: rest.split(", ").filter(|a| !a.is_empty()).map(str::to_string).collect(),
                }),
            }
        }
        machine
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains_key(label)
    }

    /// Value of a data symbol
    pub fn address_of(&self, symbol: &str) -> i64 {
        self.symbols[symbol]
    }

    pub fn word(&self, address: i64) -> i64 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    pub fn global(&self, symbol: &str) -> i64 {
        self.word(self.address_of(symbol))
    }

    pub fn set_global(&mut self, symbol: &str, value: i64) {
        let address = self.address_of(symbol);
        self.memory.insert(address, value);
    }

    /// Run from `entry` until its outermost `ret` or a call to `exit`
    pub fn run(&mut self, entry: &str) {
        let mut pc = self.labels[entry];
        let mut returns: Vec<usize> = Vec::new();
        for _ in 0..STEP_LIMIT {
            let inst = self.program[pc].clone();
            let args = &inst.args;
            let mut next = pc + 1;
            match inst.op.as_str() {
                "nop" => {}
                "set" | "mov" => {
                    let value = self.operand(&args[0]);
                    self.write(&args[1], value);
                }
                "ld" => {
                    let value = self.word(self.address(&args[0]));
                    self.write(&args[1], value);
                }
                "st" => {
                    let address = self.address(&args[1]);
                    let value = self.read(&args[0]);
                    self.memory.insert(address, value);
                }
                "add" | "sub" | "and" | "or" | "xor" => {
                    let a = self.read(&args[0]);
                    let b = self.operand(&args[1]);
                    let value = match inst.op.as_str() {
                        "add" => a + b,
                        "sub" => a - b,
                        "and" => a & b,
                        "or" => a | b,
                        _ => a ^ b,
                    };
                    self.write(&args[2], value as i32 as i64);
                }
                "neg" => {
                    let value = -self.read(&args[0]);
                    self.write(&args[1], value);
                }
                "inc" | "dec" => {
                    let step = if inst.op == "inc" { 1 } else { -1 };
                    let value = self.read(&args[0]) + step;
                    self.write(&args[0], value);
                }
                "cmp" => self.cc = (self.read(&args[0]), self.operand(&args[1])),
                "ba" | "be" | "bne" | "bl" | "ble" | "bg" | "bge" | "blu" | "bgeu" => {
                    if self.condition(&inst.op) {
                        next = self.labels[&args[0]];
                    }
                }
                "call" => {
                    let target = if args[0].starts_with('%') {
                        let address = self.read(&args[0]);
                        let index = ((address - TEXT_BASE) / 4) as usize;
                        self.labels
                            .iter()
                            .find(|(_, i)| **i == index)
                            .map(|(name, _)| name.clone())
                            .expect("indirect call to unknown address")
                    } else {
                        args[0].clone()
                    };
                    self.calls.push(target.clone());
                    if let Some(&entry) = self.labels.get(&target) {
                        returns.push(pc + 2);
                        next = entry;
                    } else {
                        self.runtime(&target);
                        if self.exit_code.is_some() {
                            return;
                        }
                    }
                }
                "save" => {
                    let sp = self.read(&args[0]) + self.operand(&args[1]);
                    let caller = self.windows.last().cloned().unwrap_or_default();
                    let mut window = Window { i: caller.o, ..Window::default() };
                    window.o[6] = sp;
                    self.windows.push(window);
                }
                "restore" => self.restore(),
                "ret" => {
                    // the delay slot is always `restore`
                    self.restore();
                    match returns.pop() {
                        Some(target) => next = target,
                        None => return,
                    }
                }
                other => panic!("unsupported instruction '{other}'"),
            }
            pc = next;
        }
        panic!("step limit exceeded");
    }

    fn restore(&mut self) {
        if self.windows.len() > 1 {
            let callee = self.windows.pop().unwrap_or_default();
            if let Some(caller) = self.windows.last_mut() {
                caller.o = callee.i;
            }
        }
    }

    fn runtime(&mut self, routine: &str) {
        let o0 = self.read("%o0");
        let o1 = self.read("%o1");
        let result = match routine {
            ".mul" => o0 * o1,
            ".div" => o0 / o1,
            ".rem" => o0 % o1,
            "calloc" => {
                let address = self.heap;
                self.heap += (o0 * o1 + 7) & !7;
                address
            }
            "printf" => {
                let format = self.strings.get(&o0).cloned().unwrap_or_default();
                let text = match format.as_str() {
                    "%d" => o1.to_string(),
                    "%s" => self.strings.get(&o1).cloned().unwrap_or_default(),
                    _ => format,
                };
                self.stdout.push_str(&text);
                o0
            }
            "exit" => {
                self.exit_code = Some(o0);
                o0
            }
            _ => o0,
        };
        self.write("%o0", result as i32 as i64);
    }

    fn condition(&self, op: &str) -> bool {
        let (a, b) = self.cc;
        let (ua, ub) = (a as u32, b as u32);
        match op {
            "ba" => true,
            "be" => a == b,
            "bne" => a != b,
            "bl" => a < b,
            "ble" => a <= b,
            "bg" => a > b,
            "bge" => a >= b,
            "blu" => ua < ub,
            _ => ua >= ub,
        }
    }

    fn operand(&self, text: &str) -> i64 {
        if text.starts_with('%') {
            return self.read(text);
        }
        if let Ok(value) = text.parse::<i64>() {
            return value;
        }
        if let Some(&index) = self.labels.get(text) {
            return TEXT_BASE + index as i64 * 4;
        }
        *self.symbols.get(text).unwrap_or_else(|| panic!("unknown symbol '{text}'"))
    }

    fn address(&self, text: &str) -> i64 {
        let inner = text.trim_start_matches('[').trim_end_matches(']');
        if let Some((base, disp)) = inner.split_once('+') {
            return self.read(base) + disp.parse::<i64>().unwrap();
        }
        if let Some((base, disp)) = inner.split_once('-') {
            return self.read(base) - disp.parse::<i64>().unwrap();
        }
        self.read(inner)
    }

    fn read(&self, reg: &str) -> i64 {
        let window = self.windows.last().expect("register window");
        match reg {
            "%sp" => window.o[6],
            "%fp" => window.i[6],
            _ => {
                let index = reg[2..].parse::<usize>().unwrap_or_else(|_| panic!("bad register '{reg}'"));
                match &reg[..2] {
                    "%g" if index == 0 => 0,
                    "%g" => self.globals[index],
                    "%o" => window.o[index],
                    "%l" => window.l[index],
                    "%i" => window.i[index],
                    _ => panic!("unsupported register '{reg}'"),
                }
            }
        }
    }

    fn write(&mut self, reg: &str, value: i64) {
        let window = self.windows.last_mut().expect("register window");
        match reg {
            "%sp" => window.o[6] = value,
            "%fp" => window.i[6] = value,
            _ => {
                let index = reg[2..].parse::<usize>().unwrap_or_else(|_| panic!("bad register '{reg}'"));
                match &reg[..2] {
                    "%g" if index == 0 => {}
                    "%g" => self.globals[index] = value,
                    "%o" => window.o[index] = value,
                    "%l" => window.l[index] = value,
                    "%i" => window.i[index] = value,
                    _ => panic!("unsupported register '{reg}'"),
                }
            }
        }
    }
}

use rcs_backend::{CompilerError, Emitter, EmitterOptions};

/// Emit a complete unit: header, then whatever `body` emits
pub fn compile(
    body: impl FnOnce(&mut Emitter<Vec<u8>>) -> Result<(), CompilerError>,
) -> String {
    let mut emitter = Emitter::new(Vec::new(), EmitterOptions::default());
    emitter.format_header().unwrap();
    body(&mut emitter).unwrap();
    String::from_utf8(emitter.finish().unwrap()).unwrap()
}
