//! CLI entry point for the MICRO II assembler, disassembler and runner.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use micro2_asm::{assemble_file, AssembledProgram};
use micro2_core::{
    disassemble, ConsoleOutput, Machine, ProgramImage, RunPolicy, StopReason, BANK_SIZE,
    CONSOLE_OUTPUT_SLOT,
};
use thiserror as _;
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;

const USAGE_TEXT: &str = "\
Usage: micro2 <command> [options]

Commands:
  build  <input> [-o <output>] [--verbose]           Assemble source to a bank image
  disasm <input>                                     Disassemble a bank image
  run    <input> [--max-steps <n>] [--switches <n>]  Assemble and run until halt

Options:
  -o, --output <file>  Output file path (default: input stem + .bin)
  -v, --verbose        Print listing to stderr (build only)
  --max-steps <n>      Stop after n instructions (run only)
  --switches <n>       Data switch setting 0..=255 (run only)
  -h, --help           Show this help message

Examples:
  micro2 build hello.m2
  micro2 build hello.m2 -o hello.bin
  micro2 disasm hello.bin
  micro2 run hello.m2 --max-steps 1000
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Build(BuildArgs),
    Disasm(DisasmArgs),
    Run(RunArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct BuildArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct DisasmArgs {
    input: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    max_steps: Option<u64>,
    switches: u8,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "build" => parse_build_args(args)
            .map(Command::Build)
            .map(ParseResult::Command),
        "disasm" => parse_disasm_args(args)
            .map(Command::Disasm)
            .map(ParseResult::Command),
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_build_args(mut args: impl Iterator<Item = OsString>) -> Result<BuildArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -o".to_string())?;
            output = Some(PathBuf::from(value));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(BuildArgs {
        input,
        output,
        verbose,
    })
}

fn parse_disasm_args(args: impl Iterator<Item = OsString>) -> Result<DisasmArgs, String> {
    let mut input: Option<PathBuf> = None;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(DisasmArgs { input })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut max_steps: Option<u64> = None;
    let mut switches = 0;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--max-steps" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --max-steps".to_string())?;
            let value = value.to_string_lossy();
            max_steps = Some(
                value
                    .parse()
                    .map_err(|_| format!("invalid step count: {value}"))?,
            );
            continue;
        }

        if arg == "--switches" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --switches".to_string())?;
            let value = value.to_string_lossy();
            switches = value
                .parse()
                .map_err(|_| format!("invalid switch setting: {value}"))?;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs {
        input,
        max_steps,
        switches,
    })
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("out");

    let parent = input.parent().unwrap_or_else(|| Path::new(""));

    parent.join(format!("{stem}.bin"))
}

fn assemble_or_report(input: &Path) -> Result<AssembledProgram, i32> {
    assemble_file(input).map_err(|errors| {
        eprintln!("{}", errors.format_for_file(input));
        1
    })
}

fn run_build(args: BuildArgs) -> Result<(), i32> {
    let program = assemble_or_report(&args.input)?;

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));

    let bank = program.image.to_bank();
    if let Err(e) = fs::write(&output_path, &bank) {
        eprintln!("error: failed to write output: {e}");
        return Err(1);
    }

    if args.verbose {
        print_listing(&program);
    }

    println!(
        "Assembled {} ({} words) -> {}",
        args.input.display(),
        program.image.len(),
        output_path.display()
    );

    Ok(())
}

fn print_listing(program: &AssembledProgram) {
    for entry in &program.listing {
        eprintln!(
            "{:03}: {:02X}  {:<20} ; line {}",
            entry.address, entry.word, entry.source, entry.line
        );
    }
}

/// Image from a flat bank file, with trailing zero words dropped.
fn image_from_bank(bytes: &[u8]) -> Option<ProgramImage> {
    let used = bytes.iter().rposition(|word| *word != 0).map_or(0, |last| last + 1);
    ProgramImage::from_block(0, &bytes[..used])
}

fn run_disasm(args: &DisasmArgs) -> Result<(), i32> {
    let bytes = match fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{}: error: failed to read input: {e}", args.input.display());
            return Err(1);
        }
    };

    if bytes.len() > BANK_SIZE {
        eprintln!(
            "{}: error: image is {} bytes (a bank holds {BANK_SIZE})",
            args.input.display(),
            bytes.len()
        );
        return Err(1);
    }

    let Some(image) = image_from_bank(&bytes) else {
        eprintln!("{}: error: image does not fit in one bank", args.input.display());
        return Err(1);
    };
    print!("{}", disassemble(&image, None));
    Ok(())
}

fn run_program(args: &RunArgs) -> Result<(), i32> {
    let program = assemble_or_report(&args.input)?;

    let mut machine = Machine::with_standard_devices();
    machine.load(&program.image);
    machine.set_switches(args.switches);

    let policy = args.max_steps.map_or(RunPolicy::UntilHalt, RunPolicy::MaxSteps);
    let result = machine.run(policy);

    if let Some(console) = machine.device_as::<ConsoleOutput>(CONSOLE_OUTPUT_SLOT) {
        let text = console.text();
        if !text.is_empty() {
            println!("{text}");
        }
    }

    let registers = machine.registers();
    println!(
        "AC={} PC={} IR={} MAR={} MDR={} MSR={} OVERFLOW={}",
        registers.ac,
        registers.pc,
        registers.ir,
        registers.mar,
        registers.mdr,
        registers.msr,
        u8::from(registers.overflow)
    );

    match result.stop {
        StopReason::Halted => {
            println!("Halted after {} steps", result.steps);
            Ok(())
        }
        StopReason::StepLimit => {
            println!("Stopped after {} steps (step limit)", result.steps);
            Ok(())
        }
        StopReason::Faulted(fault) => {
            eprintln!("error: machine fault at PC {}: {fault}", result.pc);
            Err(1)
        }
        StopReason::Breakpoint(_) | StopReason::Stopped => Ok(()),
    }
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Build(args))) => match run_build(args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Ok(ParseResult::Command(Command::Disasm(args))) => match run_disasm(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Ok(ParseResult::Command(Command::Run(args))) => match run_program(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    #[test]
    fn parses_build_command() {
        let result = parse_build_args(
            [
                OsString::from("program.m2"),
                OsString::from("-o"),
                OsString::from("out.bin"),
                OsString::from("--verbose"),
            ]
            .into_iter(),
        )
        .expect("valid build args should parse");

        assert_eq!(
            result,
            BuildArgs {
                input: PathBuf::from("program.m2"),
                output: Some(PathBuf::from("out.bin")),
                verbose: true,
            }
        );
    }

    #[test]
    fn parses_disasm_command() {
        let result = parse_disasm_args([OsString::from("program.bin")].into_iter())
            .expect("valid disasm args should parse");

        assert_eq!(
            result,
            DisasmArgs {
                input: PathBuf::from("program.bin"),
            }
        );
    }

    #[test]
    fn parses_run_command() {
        let result = parse_run_args(
            [
                OsString::from("program.m2"),
                OsString::from("--max-steps"),
                OsString::from("500"),
                OsString::from("--switches"),
                OsString::from("7"),
            ]
            .into_iter(),
        )
        .expect("valid run args should parse");

        assert_eq!(
            result,
            RunArgs {
                input: PathBuf::from("program.m2"),
                max_steps: Some(500),
                switches: 7,
            }
        );
    }

    #[test]
    fn run_rejects_bad_switches() {
        let error = parse_run_args(
            [
                OsString::from("program.m2"),
                OsString::from("--switches"),
                OsString::from("300"),
            ]
            .into_iter(),
        )
        .expect_err("switches must fit a word");
        assert!(error.contains("invalid switch setting"));
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args([OsString::from("--help")].into_iter())
            .expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args([OsString::from("unknown")].into_iter())
            .expect_err("unknown command should fail parse");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn default_output_path_simple() {
        let output = default_output_path(&PathBuf::from("program.m2"));
        assert_eq!(output, PathBuf::from("program.bin"));
    }

    #[test]
    fn default_output_path_with_dir() {
        let output = default_output_path(&PathBuf::from("src/program.m2"));
        assert_eq!(output, PathBuf::from("src/program.bin"));
    }

    #[test]
    fn default_output_path_no_extension() {
        let output = default_output_path(&PathBuf::from("program"));
        assert_eq!(output, PathBuf::from("program.bin"));
    }

    #[test]
    fn parse_build_missing_input() {
        let error = parse_build_args(std::iter::empty()).expect_err("missing input should fail");
        assert!(error.contains("missing input"));
    }

    #[test]
    fn parse_disasm_rejects_options() {
        let error = parse_disasm_args([OsString::from("--verbose")].into_iter())
            .expect_err("disasm should reject options");
        assert!(error.contains("unknown option"));
    }

    #[test]
    fn bank_image_trims_trailing_zeros() {
        let mut bank = vec![0_u8; 256];
        bank[0] = 0xC0;
        bank[2] = 0xC6;
        let image = image_from_bank(&bank).expect("fits");
        assert_eq!(image.iter().collect::<Vec<_>>(), vec![(0, 0xC0), (1, 0), (2, 0xC6)]);

        let empty = image_from_bank(&[0; 16]).expect("fits");
        assert!(empty.is_empty());
    }
}
