//! JSON emission scripts
//!
//! A script is the sequence of emitter calls a front end would make,
//! written down as data. Descriptors are given inline in their serde form:
//!
//! ```json
//! {
//!   "unit": "answer.rc",
//!   "ops": [
//!     { "op": "func_start", "func": { "name": "main", "return_type": "Int" } },
//!     { "op": "print", "value": { "name": "42", "ty": "Int", "location": { "Literal": { "Int": 42 } } } },
//!     { "op": "print_endl" },
//!     { "op": "return_lit", "value": { "Int": 0 } },
//!     { "op": "func_end", "frame_size": 0 }
//!   ]
//! }
//! ```
//!
//! Operations that wrap a region of code (deferred global initializers,
//! global constructors) carry it as a nested `body`.

use log::{debug, trace};
use rcs_backend::{BinaryOp, Emitter, IncDec, LogicalOp, UnaryOp};
use rcs_common::{CompilerError, FuncSto, Literal, Sto, Type};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Name shown in the file header; the script path when absent
    #[serde(default)]
    pub unit: Option<String>,
    pub ops: Vec<Op>,
}

/// One emitter operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    GlobalVar {
        sto: Sto,
        #[serde(default)]
        init: Option<Literal>,
        #[serde(default)]
        is_static: bool,
    },
    LocalVar {
        sto: Sto,
        #[serde(default)]
        init: Option<Literal>,
    },
    StaticGuardStart {
        sto: Sto,
    },
    StaticGuardEnd,
    DeferGlobalInit {
        body: Vec<Op>,
    },

    Assign {
        dest: Sto,
        src: Sto,
    },
    ConstAssign {
        dest: Sto,
        value: Literal,
    },

    /// Float arithmetic when either operand is a float
    Binary {
        operator: BinaryOp,
        lhs: Sto,
        rhs: Sto,
        result: Sto,
    },
    LogicalLhs {
        operator: LogicalOp,
        lhs: Sto,
    },
    LogicalRhs {
        operator: LogicalOp,
        rhs: Sto,
        result: Sto,
    },
    Unary {
        operator: UnaryOp,
        operand: Sto,
        result: Sto,
    },
    IncDec {
        kind: IncDec,
        var: Sto,
        #[serde(default)]
        result: Option<Sto>,
    },
    Cast {
        src: Sto,
        target: Type,
        result: Sto,
    },

    If {
        cond: Sto,
    },
    Else,
    EndIf,
    WhileOpen,
    WhileCond {
        cond: Sto,
    },
    WhileClose,
    ForeachOpen {
        iter: Sto,
        array: Sto,
        cursor: Sto,
    },
    ForeachClose,
    Break,
    Continue,

    FuncStart {
        func: FuncSto,
    },
    FuncEnd {
        frame_size: u32,
    },
    ReturnVoid,
    ReturnLit {
        value: Literal,
    },
    Return {
        value: Sto,
    },
    Call {
        func: FuncSto,
        #[serde(default)]
        receiver: Option<Sto>,
        #[serde(default)]
        args: Vec<Sto>,
        #[serde(default)]
        result: Option<Sto>,
    },

    ArrayIndex {
        array: Sto,
        index: Sto,
        result: Sto,
    },
    Field {
        base: Sto,
        result: Sto,
    },
    Deref {
        ptr: Sto,
        result: Sto,
    },
    Arrow {
        ptr: Sto,
        result: Sto,
    },
    AddressOf {
        var: Sto,
        result: Sto,
    },
    New {
        ptr: Sto,
    },
    Delete {
        ptr: Sto,
    },

    Print {
        value: Sto,
    },
    PrintEndl,
    Read {
        var: Sto,
    },

    CtorCall {
        obj: Sto,
        ctor: FuncSto,
        #[serde(default)]
        args: Vec<Sto>,
    },
    DtorRegister {
        obj: Sto,
        dtor: FuncSto,
    },
    GlobalCtor {
        body: Vec<Op>,
    },
}

pub fn parse(text: &str) -> Result<Script, CompilerError> {
    let script: Script = serde_json::from_str(text)?;
    debug!("script with {} top-level operation(s)", script.ops.len());
    Ok(script)
}

/// Replay `ops` in order, stopping at the first failure
pub fn replay<W: Write>(e: &mut Emitter<W>, ops: &[Op]) -> Result<(), CompilerError> {
    for (position, op) in ops.iter().enumerate() {
        trace!("op {position} (loop depth {}): {op:?}", e.loop_depth());
        if let Err(err) = apply(e, op) {
            return Err(match err {
                CompilerError::ScriptError { .. } => err,
                other => {
                    let place = match e.current_function() {
                        Some(func) => format!("operation {position} in {}", func.label()),
                        None => format!("operation {position}"),
                    };
                    CompilerError::ScriptError { message: format!("{place}: {other}") }
                }
            });
        }
    }
    Ok(())
}

fn apply<W: Write>(e: &mut Emitter<W>, op: &Op) -> Result<(), CompilerError> {
    match op {
        Op::GlobalVar { sto, init, is_static } => e.do_global_var_decl(sto, init.as_ref(), *is_static),
        Op::LocalVar { sto, init } => e.do_local_var_decl(sto, init.as_ref()),
        Op::StaticGuardStart { sto } => e.do_static_guard_start(sto).map(drop),
        Op::StaticGuardEnd => e.do_static_guard_end(),
        Op::DeferGlobalInit { body } => e.defer_global_init(|e| replay(e, body)),

        Op::Assign { dest, src } => e.do_assign(dest, src),
        Op::ConstAssign { dest, value } => e.do_const_assign(dest, value),

        Op::Binary { operator, lhs, rhs, result } => {
            if lhs.ty.is_float() || rhs.ty.is_float() {
                e.do_binary_float(*operator, lhs, rhs, result)
            } else {
                e.do_binary_int(*operator, lhs, rhs, result)
            }
        }
        Op::LogicalLhs { operator, lhs } => e.do_binary_bool_lhs(*operator, lhs).map(drop),
        Op::LogicalRhs { operator, rhs, result } => e.do_binary_bool_rhs(*operator, rhs, result),
        Op::Unary { operator, operand, result } => e.do_unary(*operator, operand, result),
        Op::IncDec { kind, var, result } => e.do_inc_dec(*kind, var, result.as_ref()),
        Op::Cast { src, target, result } => e.do_type_cast(src, target, result),

        Op::If { cond } => e.do_if_cond(cond).map(drop),
        Op::Else => e.do_else(),
        Op::EndIf => e.do_end_if(),
        Op::WhileOpen => e.do_while_open_loop().map(drop),
        Op::WhileCond { cond } => e.do_while_expr_cond(cond),
        Op::WhileClose => e.do_while_close_loop(),
        Op::ForeachOpen { iter, array, cursor } => e.do_foreach_open(iter, array, cursor).map(drop),
        Op::ForeachClose => e.do_foreach_close(),
        Op::Break => e.do_break(),
        Op::Continue => e.do_continue(),

        Op::FuncStart { func } => e.do_func_start(func),
        Op::FuncEnd { frame_size } => e.do_func_end(*frame_size),
        Op::ReturnVoid => e.do_return_void(),
        Op::ReturnLit { value } => e.do_return_lit(value),
        Op::Return { value } => e.do_return_non_void(value),
        Op::Call { func, receiver, args, result } => e.do_func_call(func, receiver.as_ref(), args, result.as_ref()),

        Op::ArrayIndex { array, index, result } => e.do_array_index(array, index, result),
        Op::Field { base, result } => e.do_struct_field(base, result),
        Op::Deref { ptr, result } => e.do_deref(ptr, result),
        Op::Arrow { ptr, result } => e.do_arrow(ptr, result),
        Op::AddressOf { var, result } => e.do_address_of(var, result),
        Op::New { ptr } => e.do_new(ptr),
        Op::Delete { ptr } => e.do_delete(ptr),

        Op::Print { value } => e.do_print(value),
        Op::PrintEndl => e.do_print_endl(),
        Op::Read { var } => e.do_read(var),

        Op::CtorCall { obj, ctor, args } => e.do_ctor_call(obj, ctor, args),
        Op::DtorRegister { obj, dtor } => e.do_dtor_register(obj, dtor).map(drop),
        Op::GlobalCtor { body } => e.do_global_ctor(|e| replay(e, body)),
    }
}
