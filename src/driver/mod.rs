// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Child-process orchestration around the translation engine.
//!
//! The tool is invoked in place of the assembler. The input file named in
//! the assembler command decides the upstream step: `.c` compiles to
//! assembly with `-S`, `.s`/`.S` runs through the C preprocessor with
//! `-E` (plain `cpp` for armasm), and probe-only invocations exec the
//! child untouched. Translated output is piped to the assembler's stdin,
//! or written to a temporary `.asm` file for armasm.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::core::arch::{Arch, Dialect};
use crate::core::error::{PpError, PpErrorKind};
use crate::translator::cli::Config;
use crate::translator::Translator;

const PROBE_FLAGS: &[&str] = &["-v", "--version", "-h", "-dumpversion"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    CSource(usize),
    Assembly(usize),
    Probe,
}

/// Run one full preprocess-translate-assemble cycle. Returns the exit
/// code to propagate.
pub fn run(config: &Config) -> Result<i32, PpError> {
    let kind = classify_input(&config.command)?;

    if kind == InputKind::Probe {
        return exec_inherited(config, &config.command);
    }

    let arch = resolve_arch(config)?;
    let source = run_upstream(config, kind, arch)?;

    let mut translator = Translator::new(config.translate_options(arch));
    let translated = translator.translate(&source)?;

    if config.debug_to_stdout {
        print!("{translated}");
        return Ok(0);
    }

    let input_idx = match kind {
        InputKind::CSource(idx) | InputKind::Assembly(idx) => idx,
        InputKind::Probe => unreachable!("probe handled above"),
    };
    if config.dialect == Dialect::Armasm {
        run_armasm(config, input_idx, &translated)
    } else {
        run_assembler_stdin(config, input_idx, &translated)
    }
}

/// Locate the input file in the assembler command, skipping `-o` values.
fn classify_input(command: &[String]) -> Result<InputKind, PpError> {
    let mut skip_next = false;
    for (idx, arg) in command.iter().enumerate().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "-o" {
            skip_next = true;
            continue;
        }
        if arg.ends_with(".c") {
            return Ok(InputKind::CSource(idx));
        }
        if arg.ends_with(".s") || arg.ends_with(".S") {
            return Ok(InputKind::Assembly(idx));
        }
    }
    if command
        .iter()
        .skip(1)
        .any(|arg| PROBE_FLAGS.contains(&arg.as_str()))
    {
        return Ok(InputKind::Probe);
    }
    Err(PpError::new(
        PpErrorKind::Config,
        "Unable to classify the input file in the assembler command",
        None,
    ))
}

fn resolve_arch(config: &Config) -> Result<Arch, PpError> {
    if let Some(arch) = config.arch {
        return Ok(arch);
    }
    let command = &config.command;
    for (idx, arg) in command.iter().enumerate() {
        if arg == "-arch" {
            if let Some(name) = command.get(idx + 1) {
                return Arch::parse(name);
            }
        }
        if let Some(name) = arg.strip_prefix("-march=") {
            return Arch::parse(name);
        }
    }
    if let Some(program) = command.first() {
        let base = Path::new(program)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        for prefix in ["aarch64", "arm64", "armv7", "arm", "powerpc64", "powerpc", "ppc"] {
            if base.starts_with(prefix) {
                return Arch::parse(prefix);
            }
        }
    }
    Err(PpError::new(
        PpErrorKind::Config,
        "Unable to determine the target architecture; pass --arch",
        None,
    ))
}

fn log_command(config: &Config, args: &[String]) {
    if config.verbose {
        eprintln!("gaspp: running {}", args.join(" "));
    }
}

fn exec_inherited(config: &Config, args: &[String]) -> Result<i32, PpError> {
    log_command(config, args);
    let status = Command::new(&args[0])
        .args(&args[1..])
        .status()
        .map_err(|err| child_error(&args[0], &err.to_string()))?;
    Ok(status.code().unwrap_or(1))
}

/// Obtain preprocessed assembly text from the upstream tool.
fn run_upstream(config: &Config, kind: InputKind, _arch: Arch) -> Result<String, PpError> {
    let args = match kind {
        InputKind::CSource(_) => {
            let mut args = strip_output_args(&config.command);
            for arg in args.iter_mut() {
                if arg == "-c" {
                    *arg = "-S".to_string();
                }
            }
            if !args.iter().any(|arg| arg == "-S") {
                args.push("-S".to_string());
            }
            args.extend(["-o".to_string(), "-".to_string()]);
            args
        }
        InputKind::Assembly(idx) => {
            if config.dialect == Dialect::Armasm {
                vec![
                    "cpp".to_string(),
                    "-undef".to_string(),
                    "-D_WIN32".to_string(),
                    config.command[idx].clone(),
                ]
            } else {
                let mut args = strip_output_args(&config.command);
                args.retain(|arg| arg != "-c");
                args.push("-E".to_string());
                args.extend(["-o".to_string(), "-".to_string()]);
                args
            }
        }
        InputKind::Probe => unreachable!("probe handled by the caller"),
    };

    log_command(config, &args);
    let output = Command::new(&args[0])
        .args(&args[1..])
        .stderr(Stdio::inherit())
        .output()
        .map_err(|err| child_error(&args[0], &err.to_string()))?;
    if !output.status.success() {
        return Err(child_error(&args[0], "preprocessing failed"));
    }
    String::from_utf8(output.stdout)
        .map_err(|_| child_error(&args[0], "preprocessed output is not valid UTF-8"))
}

fn strip_output_args(command: &[String]) -> Vec<String> {
    let mut args = Vec::with_capacity(command.len());
    let mut skip_next = false;
    for arg in command {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "-o" {
            skip_next = true;
            continue;
        }
        args.push(arg.clone());
    }
    args
}

/// Pipe translated assembly into the downstream assembler's stdin.
fn run_assembler_stdin(
    config: &Config,
    input_idx: usize,
    translated: &str,
) -> Result<i32, PpError> {
    let mut args = config.command.clone();
    args[input_idx] = "-".to_string();
    let dash_idx = input_idx;
    args.insert(dash_idx, "assembler".to_string());
    args.insert(dash_idx, "-x".to_string());

    log_command(config, &args);
    let mut child = Command::new(&args[0])
        .args(&args[1..])
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|err| child_error(&args[0], &err.to_string()))?;
    {
        let stdin = child.stdin.as_mut().expect("stdin is piped");
        stdin
            .write_all(translated.as_bytes())
            .map_err(|err| child_error(&args[0], &err.to_string()))?;
    }
    let status = child
        .wait()
        .map_err(|err| child_error(&args[0], &err.to_string()))?;
    Ok(status.code().unwrap_or(1))
}

/// armasm reads a real file; write next to the object file and clean up
/// on every exit path.
fn run_armasm(config: &Config, input_idx: usize, translated: &str) -> Result<i32, PpError> {
    let object = object_path(&config.command)
        .unwrap_or_else(|| PathBuf::from(&config.command[input_idx]));
    let temp_path = object.with_extension("asm");
    fs::write(&temp_path, translated).map_err(|err| {
        PpError::new(
            PpErrorKind::Io,
            "Unable to write temporary armasm input",
            Some(&err.to_string()),
        )
    })?;
    let _guard = TempFile(temp_path.clone());

    let mut args = config.command.clone();
    args[input_idx] = temp_path.to_string_lossy().to_string();
    log_command(config, &args);
    let status = Command::new(&args[0])
        .args(&args[1..])
        .status()
        .map_err(|err| child_error(&args[0], &err.to_string()))?;
    Ok(status.code().unwrap_or(1))
}

fn object_path(command: &[String]) -> Option<PathBuf> {
    command
        .iter()
        .position(|arg| arg == "-o")
        .and_then(|idx| command.get(idx + 1))
        .map(PathBuf::from)
}

fn child_error(program: &str, detail: &str) -> PpError {
    PpError::new(PpErrorKind::Child, program, Some(detail))
}

struct TempFile(PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn classify_finds_c_and_asm_inputs() {
        assert_eq!(
            classify_input(&cmd(&["cc", "-c", "foo.c", "-o", "foo.o"])).unwrap(),
            InputKind::CSource(2)
        );
        assert_eq!(
            classify_input(&cmd(&["cc", "-c", "foo.S", "-o", "foo.o"])).unwrap(),
            InputKind::Assembly(2)
        );
    }

    #[test]
    fn classify_skips_output_names() {
        // The object file must not be mistaken for the input.
        assert_eq!(
            classify_input(&cmd(&["cc", "-o", "out.s", "foo.c"])).unwrap(),
            InputKind::CSource(3)
        );
    }

    #[test]
    fn classify_detects_probe_invocations() {
        assert_eq!(
            classify_input(&cmd(&["cc", "--version"])).unwrap(),
            InputKind::Probe
        );
        assert!(classify_input(&cmd(&["cc", "foo.txt"])).is_err());
    }

    #[test]
    fn arch_is_taken_from_the_child_command() {
        use clap::Parser;
        let cli = crate::translator::cli::Cli::parse_from([
            "gaspp", "--", "cc", "-arch", "arm64", "-c", "x.S",
        ]);
        let config = crate::translator::cli::validate_cli(&cli).expect("validate");
        assert_eq!(resolve_arch(&config).unwrap(), Arch::Aarch64);
    }

    #[test]
    fn object_path_follows_dash_o() {
        assert_eq!(
            object_path(&cmd(&["armasm64", "-o", "out.obj", "in.S"])),
            Some(PathBuf::from("out.obj"))
        );
        assert_eq!(object_path(&cmd(&["armasm64", "in.S"])), None);
    }
}
