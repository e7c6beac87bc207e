//! Integration tests for the micro2 CLI.

use micro2_asm as _;
use micro2_core as _;
use proptest as _;
use rstest as _;
use thiserror as _;

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("micro2")
}

fn create_temp_file(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

const HELLO: &str = "\
# prints HI
        CLR
        ADD 20
        OUT 2
        CLR
        ADD 21
        OUT 2
        HLT
        ORG 20
        DATA 72
        DATA 73
";

#[test]
fn build_writes_flat_bank_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "hello.m2", HELLO);
    let output = temp_dir.path().join("hello.bin");

    let status = Command::new(binary_path())
        .args([
            "build",
            source.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .status()
        .expect("failed to run micro2");

    assert!(status.success());
    let binary = fs::read(&output).unwrap();
    assert_eq!(binary.len(), 256);
    assert_eq!(&binary[0..7], &[0xC0, 0x94, 0xF2, 0xC0, 0x95, 0xF2, 0xC6]);
    assert_eq!(&binary[20..22], &[72, 73]);
    assert!(binary[22..].iter().all(|word| *word == 0));
}

#[test]
fn build_with_default_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "test.m2", "NOP\nHLT\n");

    let expected_output = temp_dir.path().join("test.bin");

    let status = Command::new(binary_path())
        .args(["build", source.to_str().unwrap()])
        .current_dir(temp_dir.path())
        .status()
        .expect("failed to run micro2");

    assert!(status.success());
    assert!(expected_output.exists());
}

#[test]
fn build_verbose_prints_listing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "listing.m2", "START: CLR\nHLT\n");
    let output = temp_dir.path().join("listing.bin");

    let result = Command::new(binary_path())
        .args([
            "build",
            source.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-v",
        ])
        .output()
        .expect("failed to run micro2");

    assert!(result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("000: C0"));
    assert!(stderr.contains("START: CLR"));
    assert!(stderr.contains("001: C6"));
}

#[test]
fn build_reports_every_pass_two_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "bad.m2", "FOO\nJMP NOWHERE\nHLT\n");
    let output = temp_dir.path().join("bad.bin");

    let result = Command::new(binary_path())
        .args([
            "build",
            source.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run micro2");

    assert!(!result.status.success());
    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("bad.m2:1: error: unknown mnemonic 'FOO'"));
    assert!(stderr.contains("bad.m2:2: error: unresolved label 'NOWHERE'"));
    assert!(!output.exists());
}

#[test]
fn build_missing_file_fails() {
    let status = Command::new(binary_path())
        .args(["build", "/nonexistent/file.m2"])
        .status()
        .expect("failed to run micro2");

    assert!(!status.success());
}

#[test]
fn disasm_prints_source_that_reassembles() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "hello.m2", HELLO);
    let binary = temp_dir.path().join("hello.bin");

    let status = Command::new(binary_path())
        .args([
            "build",
            source.to_str().unwrap(),
            "-o",
            binary.to_str().unwrap(),
        ])
        .status()
        .expect("failed to run micro2");
    assert!(status.success());

    let result = Command::new(binary_path())
        .args(["disasm", binary.to_str().unwrap()])
        .output()
        .expect("failed to run micro2");

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.starts_with("ORG 0\n    CLR\n    ADD 20\n    OUT 2\n"));
    assert!(stdout.contains("    HLT\n"));

    let round_trip = create_temp_file(temp_dir.path(), "again.m2", &stdout);
    let rebuilt = temp_dir.path().join("again.bin");
    let status = Command::new(binary_path())
        .args([
            "build",
            round_trip.to_str().unwrap(),
            "-o",
            rebuilt.to_str().unwrap(),
        ])
        .status()
        .expect("failed to run micro2");
    assert!(status.success());
    assert_eq!(fs::read(&rebuilt).unwrap(), fs::read(&binary).unwrap());
}

#[test]
fn disasm_rejects_oversized_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("big.bin");
    fs::write(&path, vec![0xC5_u8; 300]).unwrap();

    let result = Command::new(binary_path())
        .args(["disasm", path.to_str().unwrap()])
        .output()
        .expect("failed to run micro2");

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("a bank holds 256"));
}

#[test]
fn run_prints_console_output_and_registers() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "hello.m2", HELLO);

    let result = Command::new(binary_path())
        .args(["run", source.to_str().unwrap()])
        .output()
        .expect("failed to run micro2");

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("HI\n"));
    assert!(stdout.contains("AC=73"));
    assert!(stdout.contains("Halted after 7 steps"));
}

#[test]
fn run_respects_step_limit() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "spin.m2", "LOOP: JMP LOOP\n");

    let result = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "--max-steps", "25"])
        .output()
        .expect("failed to run micro2");

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Stopped after 25 steps"));
}

#[test]
fn run_ors_reads_switches() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = create_temp_file(temp_dir.path(), "switches.m2", "CLR\nORS\nHLT\n");

    let result = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "--switches", "0x0"])
        .output()
        .expect("failed to run micro2");
    assert!(!result.status.success());

    let result = Command::new(binary_path())
        .args(["run", source.to_str().unwrap(), "--switches", "37"])
        .output()
        .expect("failed to run micro2");
    assert!(result.status.success());
    assert!(String::from_utf8_lossy(&result.stdout).contains("AC=37"));
}

#[test]
fn help_flag_shows_usage() {
    let output = Command::new(binary_path())
        .arg("--help")
        .output()
        .expect("failed to run micro2");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("disasm"));
}

#[test]
fn unknown_command_shows_error() {
    let output = Command::new(binary_path())
        .arg("frobnicate")
        .output()
        .expect("failed to run micro2");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown command"));
}
