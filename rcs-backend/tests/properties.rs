//! Structural properties of the emitted text

mod common;

use pretty_assertions::assert_eq;
use rcs_backend::{BinaryOp, CompilerError, Emitter, EmitterOptions};
use rcs_codegen::AsmWriter;
use rcs_common::{ArrayType, FuncSto, Sto, Type};
use std::collections::HashMap;

fn quiet() -> Emitter<Vec<u8>> {
    Emitter::new(
        Vec::new(),
        EmitterOptions {
            emit_comments: false,
            ..EmitterOptions::default()
        },
    )
}

fn text(e: Emitter<Vec<u8>>) -> String {
    String::from_utf8(e.finish().unwrap()).unwrap()
}

#[test]
fn indentation_prefix_equals_indent_level() {
    let mut w = AsmWriter::new(Vec::new());
    for level in 0..4 {
        w.write_line(format_args!("line{level}")).unwrap();
        w.increase_indent();
    }
    for _ in 0..4 {
        w.decrease_indent();
    }
    let out = String::from_utf8(w.finish().unwrap()).unwrap();
    for (level, line) in out.lines().enumerate() {
        assert_eq!(line, format!("{}line{level}", "\t".repeat(level)));
    }
}

#[test]
fn break_and_continue_target_innermost_loop() {
    let mut e = quiet();
    let outer = e.do_while_open_loop().unwrap();
    e.do_break().unwrap();
    let inner = e.do_while_open_loop().unwrap();
    e.do_break().unwrap();
    e.do_continue().unwrap();
    e.do_while_close_loop().unwrap();
    e.do_continue().unwrap();
    e.do_while_close_loop().unwrap();
    assert_eq!(e.loop_depth(), 0);

    let branches: Vec<String> = text(e)
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ba\t"))
        .map(|l| l.trim_start_matches("ba\t").to_string())
        .collect();
    assert_eq!(
        branches,
        vec![
            format!(".$$.loopEnd.{outer}"),
            format!(".$$.loopEnd.{inner}"),
            format!(".$$.loopCheck.{inner}"),
            format!(".$$.loopCheck.{inner}"),
            format!(".$$.loopCheck.{outer}"),
            format!(".$$.loopCheck.{outer}"),
        ]
    );
}

#[test]
fn break_outside_loop_is_an_error() {
    let mut e = quiet();
    let id = e.do_while_open_loop().unwrap();
    assert_eq!(id, 1);
    e.do_while_close_loop().unwrap();
    assert_eq!(
        e.do_break(),
        Err(CompilerError::NoEnclosingLoop { construct: "break".to_string() })
    );
}

#[test]
fn label_suffixes_strictly_increase() {
    let mut e = quiet();
    let a = Sto::local("a", Type::Int, -4);
    let t = Sto::temp("t", Type::Bool, -8);
    for _ in 0..3 {
        e.do_while_open_loop().unwrap();
        e.do_binary_int(BinaryOp::Lt, &a, &Sto::int(10), &t).unwrap();
        e.do_while_expr_cond(&t).unwrap();
        e.do_if_cond(&t).unwrap();
        e.do_print(&Sto::string("x")).unwrap();
        e.do_print(&Sto::float(1.0)).unwrap();
        e.do_else().unwrap();
        e.do_end_if().unwrap();
        e.do_while_close_loop().unwrap();
    }
    let out = text(e);

    // family -> suffixes in order of definition
    let mut families: HashMap<String, Vec<u32>> = HashMap::new();
    for line in out.lines().map(str::trim).filter(|l| l.starts_with(".$$.") && l.ends_with(':')) {
        let label = line.trim_end_matches(':');
        let (family, suffix) = label.rsplit_once('.').unwrap();
        families.entry(family.to_string()).or_default().push(suffix.parse().unwrap());
    }
    for family in [".$$.loopCheck", ".$$.loopEnd", ".$$.else", ".$$.endif", ".$$.cmp", ".$$.str", ".$$.float"] {
        assert_eq!(families[family], vec![1, 2, 3], "{family}");
    }
}

#[test]
fn static_guard_short_circuits_to_done() {
    let mut e = quiet();
    let s = Sto::global("s", Type::Int);
    let id = e.do_static_guard_start(&s).unwrap();
    e.do_var_assign(&s, &Sto::int(9)).unwrap();
    e.do_static_guard_end().unwrap();
    let out = text(e);
    let lines: Vec<&str> = out.lines().map(str::trim).collect();
    let test = lines.iter().position(|l| *l == format!("set\t.$$.static.{id}, %l0")).unwrap();
    assert_eq!(
        lines[test..test + 5],
        [
            format!("set\t.$$.static.{id}, %l0").as_str(),
            "ld\t[%l0], %l1",
            "cmp\t%l1, %g0",
            format!("bne\t.$$.static.{id}.done").as_str(),
            "nop",
        ]
    );
    assert!(out.ends_with(&format!("st\t%l1, [%l0]\n.$$.static.{id}.done:\n")));
}

#[test]
fn int_matrix_total_size() {
    let mut matrix = ArrayType::new(3, 2);
    matrix.add_next(Type::Array(ArrayType::new(4, 1)));
    matrix.add_next(Type::Int);
    assert_eq!(matrix.total_size(), 48);
}

#[test]
fn assembly_names() {
    assert_eq!(FuncSto::new("f", Type::Void).assembly_name(), "void");
    let f = FuncSto::new("f", Type::Void)
        .with_param(Sto::local("a", Type::Int, 68))
        .with_param(Sto::local("b", Type::Float, 72));
    assert_eq!(f.assembly_name(), "int.float");
}

#[test]
fn global_uninitialized_int_layout() {
    let mut e = quiet();
    e.do_global_var_decl(&Sto::global("x", Type::Int), None, false).unwrap();
    assert_eq!(
        text(e),
        "\t.section\t\".bss\"\n\
         \t.align\t4\n\
         \t.global\tx\n\
         x:\n\
         \t.skip\t4\n\
         \n\
         \t.section\t\".text\"\n\
         \t.align\t4\n"
    );
}

#[test]
fn header_declares_runtime() {
    let out = common::compile(|_| Ok(()));
    assert!(out.starts_with("! rc.s\n"));
    for label in [
        ".$$.intFmt:",
        ".$$.strFmt:",
        ".$$.strTF:",
        ".$$.strEndl:",
        ".$$.strArrBound:",
        ".$$.strNullPtr:",
        ".$$.fltTmp:",
        ".$$.printBool:",
        ".$$.arrCheck:",
        ".$$.ptrCheck:",
    ] {
        assert!(out.contains(&format!("\n{label}\n")), "{label}");
    }
    assert!(out.contains(".asciz\t\"false\\0\\0\\0true\""));
    assert!(out.contains("be\t.$$.printBool2"));
}
