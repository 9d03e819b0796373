//! Functions, returns and calls
//!
//! Frame layout follows the SPARC ABI: `save` reserves
//! `MIN_FRAME + locals` bytes rounded to a multiple of 8, incoming arguments
//! arrive in `%i0-%i5` and are spilled to their home slots at `%fp+68`
//! onwards. The frame size is only known after the body is emitted, so the
//! prologue references a `SAVE.<label>` symbol that `do_func_end` defines.
//!
//! Every return path calls the function's `.fini` trampoline first, which
//! runs the destructors of the objects registered in this frame.

use super::operand::transfer_bits;
use super::{Emitter, FunctionContext, FLHS, LHS, MAX_REGISTER_ARGS, MIN_FRAME};
use log::{debug, info};
use rcs_codegen::{AsmInst, Mem, Operand, Reg, Section};
use rcs_common::{CompilerError, FuncSto, Literal, Sto};
use std::io::Write;

/// Offset of the first argument home slot from `%fp`
const ARG_HOME: i32 = 68;

fn epilogue(insts: &mut Vec<AsmInst>, fini: String) {
    insts.push(AsmInst::Call(fini));
    insts.push(AsmInst::Nop);
    insts.push(AsmInst::Ret);
    insts.push(AsmInst::Restore);
}

fn too_many_arguments(func: &FuncSto, count: usize) -> CompilerError {
    CompilerError::TooManyArguments {
        function: func.label(),
        count,
        max: MAX_REGISTER_ARGS,
    }
}

impl<W: Write> Emitter<W> {
    pub fn do_func_start(&mut self, func: &FuncSto) -> Result<(), CompilerError> {
        if let Some(ctx) = &self.function {
            return Err(CompilerError::unbalanced(format!(
                "function '{}' started inside '{}'",
                func.name, ctx.func.name
            )));
        }
        let first_param = usize::from(func.is_method());
        if first_param + func.params.len() > MAX_REGISTER_ARGS {
            return Err(too_many_arguments(func, first_param + func.params.len()));
        }

        let label = func.label();
        info!("function {} -> {label}", func.name);

        let mut insts = vec![AsmInst::Blank];
        self.switch_section(&mut insts, Section::Text);
        // Plain functions are also reachable under their source name
        if !func.overloaded && !func.is_method() && label != func.name {
            insts.push(AsmInst::Global(func.name.clone()));
            insts.push(AsmInst::Label(func.name.clone()));
        }
        insts.push(AsmInst::Global(label.clone()));
        insts.push(AsmInst::Label(label));
        insts.push(AsmInst::Set(Operand::Label(func.save_symbol()), Reg::G1));
        insts.push(AsmInst::Save(Reg::Sp, Operand::Reg(Reg::G1), Reg::Sp));

        if func.is_method() || !func.params.is_empty() {
            insts.push(AsmInst::Blank);
            self.comment(&mut insts, "store params");
        }
        if func.is_method() {
            insts.push(AsmInst::St(Reg::I0, Mem::offset(Reg::Fp, ARG_HOME)));
        }
        for (i, param) in func.params.iter().enumerate() {
            let incoming = Reg::I((first_param + i) as u8);
            self.store_slot(&mut insts, incoming, param)?;
        }
        self.emit_all(&insts)?;

        if func.is_main() {
            self.flush_global_init()?;
        }

        self.function = Some(FunctionContext {
            func: func.clone(),
            local_dtors: Vec::new(),
        });
        Ok(())
    }

    /// Close the current function. `frame_size` is the byte size of its
    /// locals and temporaries.
    pub fn do_func_end(&mut self, frame_size: u32) -> Result<(), CompilerError> {
        if self.function.is_none() {
            return Err(CompilerError::unbalanced("function end without a start"));
        }
        self.check_stacks_empty()?;
        let ctx = self
            .function
            .take()
            .ok_or_else(|| CompilerError::unbalanced("function end without a start"))?;
        let func = &ctx.func;
        debug!(
            "function {} closed: {frame_size} bytes of locals, {} destructor cell(s)",
            func.name,
            ctx.local_dtors.len()
        );

        let mut insts = vec![AsmInst::Blank];
        self.comment(&mut insts, format!("end of {}", func.name));
        epilogue(&mut insts, func.fini_label());
        insts.push(AsmInst::Equate(
            func.save_symbol(),
            format!("-({MIN_FRAME} + {frame_size}) & -8"),
        ));
        insts.push(AsmInst::Blank);

        insts.push(AsmInst::Label(func.fini_label()));
        insts.push(AsmInst::Save(Reg::Sp, Operand::Imm(-96), Reg::Sp));
        for cell in ctx.local_dtors.iter().rev() {
            self.teardown_cell(&mut insts, cell);
        }
        insts.push(AsmInst::Ret);
        insts.push(AsmInst::Restore);
        self.emit_all(&insts)
    }

    pub fn do_return_void(&mut self) -> Result<(), CompilerError> {
        let fini = self.function_context()?.func.fini_label();
        let mut insts = Vec::new();
        self.comment(&mut insts, "return");
        epilogue(&mut insts, fini);
        self.emit_all(&insts)
    }

    pub fn do_return_lit(&mut self, literal: &Literal) -> Result<(), CompilerError> {
        self.do_return_non_void(&Sto::literal(literal.clone()))
    }

    /// Return `value` in `%i0`, `%f0` for floats, or its address for
    /// reference-returning functions
    pub fn do_return_non_void(&mut self, value: &Sto) -> Result<(), CompilerError> {
        let func = self.function_context()?.func.clone();
        let mut insts = Vec::new();
        self.comment(&mut insts, format!("return {}", value.name));

        if func.returns_ref {
            self.load_address(&mut insts, value, Reg::I0)?;
            epilogue(&mut insts, func.fini_label());
        } else if func.return_type.is_float() {
            // Read before teardown; %i0 survives the trampoline's window,
            // the float registers do not
            self.load_float(&mut insts, value, FLHS)?;
            transfer_bits(&mut insts, FLHS, Reg::I0);
            insts.push(AsmInst::Call(func.fini_label()));
            insts.push(AsmInst::Nop);
            transfer_bits(&mut insts, Reg::I0, FLHS);
            insts.push(AsmInst::Ret);
            insts.push(AsmInst::Restore);
        } else if func.return_type.is_struct() || func.return_type.is_array() {
            return Err(CompilerError::invalid_descriptor(
                &func.name,
                "aggregates are returned by reference",
            ));
        } else {
            self.load_value(&mut insts, value, Reg::I0)?;
            epilogue(&mut insts, func.fini_label());
        }
        self.emit_all(&insts)
    }

    /// Marshal argument `index` of a call to `func` into its out register
    pub fn do_func_call_param(&mut self, func: &FuncSto, index: usize, arg: &Sto) -> Result<(), CompilerError> {
        let slot = index + usize::from(func.is_method());
        if slot >= MAX_REGISTER_ARGS {
            return Err(too_many_arguments(func, slot + 1));
        }
        let target = Reg::O(slot as u8);

        let mut insts = Vec::new();
        self.comment(&mut insts, format!("arg {index}: {}", arg.name));
        match func.params.get(index) {
            Some(param) if param.is_indirect() || param.ty.is_struct() => {
                self.load_address(&mut insts, arg, target)?;
            }
            Some(param) if param.ty.is_float() && !arg.ty.is_float() => {
                self.load_float(&mut insts, arg, FLHS)?;
                transfer_bits(&mut insts, FLHS, target);
            }
            _ if arg.ty.is_struct() => self.load_address(&mut insts, arg, target)?,
            // Floats travel as raw bits in the integer registers
            _ => self.load_value(&mut insts, arg, target)?,
        }
        self.emit_all(&insts)
    }

    /// Call `func`. Methods take the address of `receiver` as `this` in
    /// `%o0`. The return register is stored into `result` when given.
    pub fn do_func_call(
        &mut self,
        func: &FuncSto,
        receiver: Option<&Sto>,
        args: &[Sto],
        result: Option<&Sto>,
    ) -> Result<(), CompilerError> {
        let count = args.len() + usize::from(func.is_method());
        if count > MAX_REGISTER_ARGS {
            return Err(too_many_arguments(func, count));
        }
        let label = func.label();
        debug!("call {label} with {count} argument(s)");

        let mut insts = Vec::new();
        self.comment(&mut insts, format!("call {}", func.name));
        if func.is_method() {
            let receiver = receiver.ok_or_else(|| {
                CompilerError::invalid_descriptor(&func.name, "method call without a receiver")
            })?;
            self.load_address(&mut insts, receiver, Reg::O0)?;
        }
        self.emit_all(&insts)?;

        for (index, arg) in args.iter().enumerate() {
            self.do_func_call_param(func, index, arg)?;
        }

        let mut insts = vec![AsmInst::Call(label), AsmInst::Nop];
        if let Some(result) = result {
            if func.returns_ref {
                self.store_slot(&mut insts, LHS, result)?;
            } else if func.return_type.is_float() {
                self.store_value(&mut insts, FLHS, result)?;
            } else {
                self.store_value(&mut insts, LHS, result)?;
            }
        }
        self.emit_all(&insts)
    }
}
