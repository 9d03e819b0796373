//! End-to-end runs of the `rcs` binary

use std::fs;
use std::process::Command;

fn rcs() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rcs"))
}

#[test]
fn demo_goes_to_stdout() {
    let out = rcs().args(["demo", "globals"]).output().unwrap();
    assert!(out.status.success());
    let asm = String::from_utf8(out.stdout).unwrap();
    assert!(asm.starts_with("! globals.rc\n"));
    assert!(asm.contains("main.void:"));
}

#[test]
fn no_comments_strips_construct_comments() {
    let out = rcs().args(["demo", "loops", "--no-comments"]).output().unwrap();
    let asm = String::from_utf8(out.stdout).unwrap();
    assert!(!asm.contains("! foreach"));

    let out = rcs().args(["demo", "loops"]).output().unwrap();
    let asm = String::from_utf8(out.stdout).unwrap();
    assert!(asm.contains("! foreach (x : data)"));
}

#[test]
fn demo_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("objects.s");
    let status = rcs()
        .args(["demo", "objects", "-o"])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(fs::read_to_string(&path).unwrap().contains("Counter.Counter.int:"));
}

#[test]
fn failing_script_exits_with_status_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{ "ops": [ { "op": "end_if" } ] }"#).unwrap();

    let out = rcs().arg("script").arg(&path).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.starts_with("Error: Script error: operation 0:"), "{stderr}");
}
