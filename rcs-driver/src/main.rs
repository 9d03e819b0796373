//! Reduced-C SPARC Emitter Driver
//!
//! Command-line front door to the emitter. Without a Reduced-C front end
//! in this workspace the driver feeds the emitter either one of the
//! built-in demo programs or a JSON emission script.

mod demos;
mod script;

use clap::{Args, Parser, Subcommand};
use demos::Demo;
use log::info;
use rcs_backend::{Emitter, EmitterOptions};
use rcs_common::CompilerError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rcs")]
#[command(about = "Reduced-C SPARC assembly emitter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    flags: Flags,
}

#[derive(Args, Debug, Clone, Default)]
struct Flags {
    /// Do not emit array bounds checks
    #[arg(long, global = true)]
    no_bounds_checks: bool,

    /// Do not emit null pointer checks
    #[arg(long, global = true)]
    no_null_checks: bool,

    /// Do not emit source comments
    #[arg(long, global = true)]
    no_comments: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit one of the built-in demo programs
    Demo {
        /// Which demo to emit
        #[arg(value_enum)]
        name: Demo,

        /// Output assembly file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay a JSON emission script
    Script {
        /// Input script
        path: PathBuf,

        /// Output assembly file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Flags {
    fn options(&self, unit_name: String) -> EmitterOptions {
        EmitterOptions {
            unit_name,
            bounds_checks: !self.no_bounds_checks,
            null_checks: !self.no_null_checks,
            emit_comments: !self.no_comments,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CompilerError> {
    match cli.command {
        Commands::Demo { name, output } => {
            let unit = format!("{}.rc", format!("{name:?}").to_lowercase());
            info!("emitting demo {unit}");
            let asm = compile(cli.flags.options(unit), |e| name.emit(e))?;
            write_output(&asm, output.as_deref())
        }
        Commands::Script { path, output } => {
            let text = fs::read_to_string(&path)?;
            let script = script::parse(&text)?;
            let unit = script
                .unit
                .clone()
                .unwrap_or_else(|| path.display().to_string());
            info!("replaying {} ({} operations)", unit, script.ops.len());
            let asm = compile(cli.flags.options(unit), |e| script::replay(e, &script.ops))?;
            write_output(&asm, output.as_deref())
        }
    }
}

/// Header, body, then the closing checks and `.fini` section
fn compile(
    options: EmitterOptions,
    body: impl FnOnce(&mut Emitter<Vec<u8>>) -> Result<(), CompilerError>,
) -> Result<String, CompilerError> {
    let mut emitter = Emitter::new(Vec::new(), options);
    emitter.format_header()?;
    body(&mut emitter)?;
    let bytes = emitter.finish()?;
    String::from_utf8(bytes).map_err(|e| CompilerError::InternalError { message: e.to_string() })
}

fn write_output(asm: &str, path: Option<&Path>) -> Result<(), CompilerError> {
    match path {
        Some(path) => {
            fs::write(path, asm)?;
            info!("assembly written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(asm.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flags_map_to_options() {
        let flags = Flags { no_bounds_checks: true, no_null_checks: false, no_comments: true };
        let options = flags.options("t.rc".to_string());
        assert_eq!(options.unit_name, "t.rc");
        assert!(!options.bounds_checks);
        assert!(options.null_checks);
        assert!(!options.emit_comments);
    }

    #[test]
    fn test_cli_parses_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["rcs", "demo", "loops", "--no-comments", "-o", "out.s"]).unwrap();
        assert!(cli.flags.no_comments);
        match cli.command {
            Commands::Demo { name, output } => {
                assert_eq!(name, Demo::Loops);
                assert_eq!(output, Some(PathBuf::from("out.s")));
            }
            Commands::Script { .. } => panic!("expected demo"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_demo() {
        assert!(Cli::try_parse_from(["rcs", "demo", "nope"]).is_err());
    }

    #[test]
    fn test_header_carries_unit_name() {
        let asm = compile(Flags::default().options("casts.rc".to_string()), |e| Demo::Casts.emit(e)).unwrap();
        assert!(asm.starts_with("! casts.rc\n"));
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.s");
        write_output("\tnop\n", Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "\tnop\n");
    }

    #[test]
    fn test_script_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("prog.json");
        let output = dir.path().join("prog.s");
        fs::write(
            &input,
            r#"{ "ops": [
                { "op": "func_start", "func": { "name": "main", "return_type": "Int" } },
                { "op": "return_lit", "value": { "Int": 0 } },
                { "op": "func_end", "frame_size": 0 }
            ] }"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "rcs",
            "script",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        run(cli).unwrap();

        let asm = fs::read_to_string(&output).unwrap();
        assert!(asm.starts_with(&format!("! {}\n", input.display())));
        assert!(asm.contains("main.void:"));
    }

    #[test]
    fn test_missing_script_is_an_io_error() {
        let cli = Cli::try_parse_from(["rcs", "script", "/nonexistent/prog.json"]).unwrap();
        assert!(matches!(run(cli), Err(CompilerError::IoError { .. })));
    }
}
