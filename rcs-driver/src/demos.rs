//! Built-in demo programs
//!
//! Each demo drives the emitter the way a front end would for a small
//! Reduced-C program, shown in the doc comment of its function.

use clap::ValueEnum;
use rcs_backend::{BinaryOp, Emitter, IncDec, UnaryOp};
use rcs_common::{ArrayType, CompilerError, FuncSto, Indirection, Literal, Storage, Sto, Type};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// Globals, statics and deferred global initialization
    Globals,
    /// while and foreach with break and continue
    Loops,
    /// Constructors, destructors and heap objects
    Objects,
    /// Conversions between int, float and bool
    Casts,
}

impl Demo {
    pub fn emit<W: Write>(self, e: &mut Emitter<W>) -> Result<(), CompilerError> {
        match self {
            Demo::Globals => globals(e),
            Demo::Loops => loops(e),
            Demo::Objects => objects(e),
            Demo::Casts => casts(e),
        }
    }
}

fn main_fn() -> FuncSto {
    FuncSto::new("main", Type::Int)
}

/// ```text
/// int counter = 5;
/// float scale = 2.5;
/// static bool ready = true;
/// int total = counter * 2;
///
/// void bump() {
///     static int first = counter;
///     counter++;
/// }
///
/// int main() {
///     bump(); bump();
///     cout << counter << " " << total << " " << scale << endl;
///     return 0;
/// }
/// ```
fn globals<W: Write>(e: &mut Emitter<W>) -> Result<(), CompilerError> {
    let counter = Sto::global("counter", Type::Int);
    let scale = Sto::global("scale", Type::Float);
    let ready = Sto::global("ready", Type::Bool);
    let total = Sto::global("total", Type::Int);
    let first = Sto::global("bump.first", Type::Int);

    e.do_global_var_decl(&counter, Some(&Literal::Int(5)), false)?;
    e.do_global_var_decl(&scale, Some(&Literal::Float(2.5)), false)?;
    e.do_global_var_decl(&ready, Some(&Literal::Bool(true)), true)?;
    e.do_global_var_decl(&total, None, false)?;
    e.defer_global_init(|e| e.do_binary_int(BinaryOp::Mul, &counter, &Sto::int(2), &total))?;

    let bump = FuncSto::new("bump", Type::Void);
    e.do_global_var_decl(&first, None, true)?;
    e.do_func_start(&bump)?;
    e.do_static_guard_start(&first)?;
    e.do_var_assign(&first, &counter)?;
    e.do_static_guard_end()?;
    e.do_inc_dec(IncDec::PostInc, &counter, None)?;
    e.do_return_void()?;
    e.do_func_end(0)?;

    e.do_func_start(&main_fn())?;
    e.do_func_call(&bump, None, &[], None)?;
    e.do_func_call(&bump, None, &[], None)?;
    for value in [&counter, &Sto::string(" "), &total, &Sto::string(" "), &scale] {
        e.do_print(value)?;
    }
    e.do_print_endl()?;
    e.do_return_lit(&Literal::Int(0))?;
    e.do_func_end(0)
}

/// ```text
/// int main() {
///     int i = 0;
///     int sum = 0;
///     int data[5];
///     while (i < 5) {
///         data[i] = i * i;
///         i++;
///     }
///     foreach (int x : data) {
///         if (x == 9) continue;
///         sum = sum + x;
///         if (sum > 20) break;
///     }
///     cout << sum << endl;
///     return 0;
/// }
/// ```
fn loops<W: Write>(e: &mut Emitter<W>) -> Result<(), CompilerError> {
    let i = Sto::local("i", Type::Int, -4);
    let sum = Sto::local("sum", Type::Int, -8);
    let data = Sto::local("data", Type::Array(ArrayType::with_dimensions(&[5], Type::Int)), -28);
    let in_range = Sto::temp("i < 5", Type::Bool, -32);
    let element = Sto::temp("data[i]", Type::Int, -36).with_storage(Storage::Indirect(Indirection::ArrayElement));
    let x = Sto::local("x", Type::Int, -40);
    let cursor = Sto::temp("cursor", Type::pointer_to(Type::Int), -44);
    let skip = Sto::temp("x == 9", Type::Bool, -48);
    let done = Sto::temp("sum > 20", Type::Bool, -52);

    e.do_func_start(&main_fn())?;
    e.do_local_var_decl(&i, Some(&Literal::Int(0)))?;
    e.do_local_var_decl(&sum, Some(&Literal::Int(0)))?;

    e.do_while_open_loop()?;
    e.do_binary_int(BinaryOp::Lt, &i, &Sto::int(5), &in_range)?;
    e.do_while_expr_cond(&in_range)?;
    e.do_array_index(&data, &i, &element)?;
    e.do_binary_int(BinaryOp::Mul, &i, &i, &element)?;
    e.do_inc_dec(IncDec::PostInc, &i, None)?;
    e.do_while_close_loop()?;

    e.do_foreach_open(&x, &data, &cursor)?;
    e.do_binary_int(BinaryOp::Eq, &x, &Sto::int(9), &skip)?;
    e.do_if_cond(&skip)?;
    e.do_continue()?;
    e.do_end_if()?;
    e.do_binary_int(BinaryOp::Add, &sum, &x, &sum)?;
    e.do_binary_int(BinaryOp::Gt, &sum, &Sto::int(20), &done)?;
    e.do_if_cond(&done)?;
    e.do_break()?;
    e.do_end_if()?;
    e.do_foreach_close()?;

    e.do_print(&sum)?;
    e.do_print_endl()?;
    e.do_return_lit(&Literal::Int(0))?;
    e.do_func_end(52)
}

/// ```text
/// struct Counter {
///     int count;
///     function : Counter(int start) { this->count = start; }
///     function : ~Counter() { cout << "bye " << this->count << endl; }
///     function : void bump() { this->count++; }
/// };
///
/// Counter shared(10);
///
/// int main() {
///     Counter local(1);
///     local.bump();
///     int* p;
///     new p;
///     *p = 7;
///     cout << *p << endl;
///     delete p;
///     return 0;
/// }
/// ```
fn objects<W: Write>(e: &mut Emitter<W>) -> Result<(), CompilerError> {
    let counter_ty = Type::Struct { name: "Counter".to_string(), size: 4 };
    let this = Sto::local("this", Type::pointer_to(counter_ty.clone()), 68);
    let count = Sto::temp("this->count", Type::Int, -4).with_storage(Storage::Indirect(Indirection::StructField {
        struct_name: "Counter".to_string(),
        offset: 0,
    }));

    let ctor = FuncSto::new("Counter", Type::Void)
        .with_param(Sto::local("start", Type::Int, 72))
        .method_of("Counter");
    let dtor = FuncSto::new("~Counter", Type::Void).method_of("Counter");
    let bump = FuncSto::new("bump", Type::Void).method_of("Counter");

    e.do_func_start(&ctor)?;
    e.do_arrow(&this, &count)?;
    e.do_assign(&count, &ctor.params[0])?;
    e.do_return_void()?;
    e.do_func_end(4)?;

    e.do_func_start(&dtor)?;
    e.do_arrow(&this, &count)?;
    e.do_print(&Sto::string("bye "))?;
    e.do_print(&count)?;
    e.do_print_endl()?;
    e.do_return_void()?;
    e.do_func_end(4)?;

    e.do_func_start(&bump)?;
    e.do_arrow(&this, &count)?;
    e.do_inc_dec(IncDec::PostInc, &count, None)?;
    e.do_return_void()?;
    e.do_func_end(4)?;

    let shared = Sto::global("shared", counter_ty.clone());
    e.do_global_var_decl(&shared, None, false)?;
    e.do_global_ctor(|e| {
        e.do_ctor_call(&shared, &ctor, &[Sto::int(10)])?;
        e.do_dtor_register(&shared, &dtor).map(|_| ())
    })?;

    let local = Sto::local("local", counter_ty, -4);
    let p = Sto::local("p", Type::pointer_to(Type::Int), -8);
    let target = Sto::temp("*p", Type::Int, -12).with_storage(Storage::Indirect(Indirection::Deref));

    e.do_func_start(&main_fn())?;
    e.do_ctor_call(&local, &ctor, &[Sto::int(1)])?;
    e.do_dtor_register(&local, &dtor)?;
    e.do_func_call(&bump, Some(&local), &[], None)?;
    e.do_new(&p)?;
    e.do_deref(&p, &target)?;
    e.do_const_assign(&target, &Literal::Int(7))?;
    e.do_print(&target)?;
    e.do_print_endl()?;
    e.do_delete(&p)?;
    e.do_return_lit(&Literal::Int(0))?;
    e.do_func_end(12)
}

/// ```text
/// float f = 3.75;
/// int i;
/// bool b;
/// float g;
///
/// int main() {
///     i = (int) f;
///     b = (bool) i;
///     g = (float) b;
///     float h = -(i + f);
///     cout << i << " " << b << " " << g << " " << h << endl;
///     return 0;
/// }
/// ```
fn casts<W: Write>(e: &mut Emitter<W>) -> Result<(), CompilerError> {
    let f = Sto::global("f", Type::Float);
    let i = Sto::global("i", Type::Int);
    let b = Sto::global("b", Type::Bool);
    let g = Sto::global("g", Type::Float);
    let h = Sto::local("h", Type::Float, -4);
    let sum = Sto::temp("i + f", Type::Float, -8);

    e.do_global_var_decl(&f, Some(&Literal::Float(3.75)), false)?;
    e.do_global_var_decl(&i, None, false)?;
    e.do_global_var_decl(&b, None, false)?;
    e.do_global_var_decl(&g, None, false)?;

    e.do_func_start(&main_fn())?;
    e.do_type_cast(&f, &Type::Int, &i)?;
    e.do_type_cast(&i, &Type::Bool, &b)?;
    e.do_type_cast(&b, &Type::Float, &g)?;
    e.do_binary_float(BinaryOp::Add, &i, &f, &sum)?;
    e.do_unary(UnaryOp::Neg, &sum, &h)?;
    for value in [&i, &Sto::string(" "), &b, &Sto::string(" "), &g, &Sto::string(" "), &h] {
        e.do_print(value)?;
    }
    e.do_print_endl()?;
    e.do_return_lit(&Literal::Int(0))?;
    e.do_func_end(8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use rcs_backend::EmitterOptions;

    fn emit(demo: Demo) -> String {
        compile(EmitterOptions::default(), |e| demo.emit(e)).unwrap()
    }

    #[test]
    fn test_every_demo_emits() {
        for demo in Demo::value_variants() {
            let asm = emit(*demo);
            assert!(asm.contains("main.void:"), "{demo:?} has no main");
            assert!(asm.contains("SAVE.main.void = "), "{demo:?} main frame not closed");
        }
    }

    #[test]
    fn test_globals_demo_layout() {
        let asm = emit(Demo::Globals);
        assert!(asm.contains("\t.global\tcounter\n"));
        assert!(!asm.contains(".global\tready"), "static globals stay local");
        assert!(asm.contains(".$$.static.1:"));
        // deferred initializer lands inside main
        let main = asm.find("main.void:").unwrap();
        let mul = asm.rfind("call\t.mul").unwrap();
        assert!(mul > main);
    }

    #[test]
    fn test_objects_demo_registers_destructors() {
        let asm = emit(Demo::Objects);
        assert!(asm.contains(".section\t\".init\""));
        assert!(asm.contains(".$$.dtor.1:"));
        assert!(asm.contains(".$$.dtor.2:"));
        assert!(asm.contains(".section\t\".fini\""));
        assert!(asm.contains("call\tcalloc"));
        assert!(asm.contains("call\tfree"));
    }

    #[test]
    fn test_checks_can_be_disabled() {
        let options = EmitterOptions {
            bounds_checks: false,
            null_checks: false,
            ..EmitterOptions::default()
        };
        let loops = compile(options.clone(), |e| Demo::Loops.emit(e)).unwrap();
        assert!(!loops.contains("call\t.$$.arrCheck"));
        let objects = compile(options, |e| Demo::Objects.emit(e)).unwrap();
        assert!(!objects.contains("call\t.$$.ptrCheck"));
    }
}
