// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::env;

use clap::{ArgAction, Parser, ValueEnum};

use crate::core::arch::{Arch, Dialect};
use crate::core::error::{PpError, PpErrorKind};
use crate::translator::TranslateOptions;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LONG_ABOUT: &str = "\
gas-syntax preprocessor for assemblers that cannot digest modern GNU as input.

The tool is invoked in place of the assembler: everything after -- is the
real assembler command line. Input assembly is read through the C
preprocessor, translated to the dialect selected with --as-type, and piped
to the assembler (or written to a temporary file for armasm).";

#[derive(Parser, Debug)]
#[command(
    name = "gaspp",
    version = VERSION,
    about = "Preprocess gas-syntax assembly for Apple gas, Clang or armasm back ends",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        short = 'a',
        long = "arch",
        value_name = "NAME",
        long_help = "Force the input architecture (arm, aarch64/arm64, powerpc/ppc \
                     and their aliases). When omitted, the architecture is taken \
                     from an -arch or -march= flag in the assembler command."
    )]
    pub arch: Option<String>,
    #[arg(
        short = 't',
        long = "as-type",
        value_enum,
        default_value_t = Dialect::AppleGas,
        long_help = "Output dialect of the downstream assembler."
    )]
    pub as_type: Dialect,
    #[arg(
        long = "fix-unreq",
        action = ArgAction::SetTrue,
        conflicts_with = "no_fix_unreq",
        long_help = "Emit every .unreq twice, lowercased and uppercased, to clear \
                     both spellings old gas records on .req. Default on macOS hosts."
    )]
    pub fix_unreq: bool,
    #[arg(
        long = "no-fix-unreq",
        action = ArgAction::SetTrue,
        long_help = "Disable the dual-case .unreq emission."
    )]
    pub no_fix_unreq: bool,
    #[arg(
        long = "force-thumb",
        action = ArgAction::SetTrue,
        long_help = "Assemble for Thumb even when the source says .arm, lowering \
                     ARM-only idioms to Thumb-safe sequences."
    )]
    pub force_thumb: bool,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::SetTrue,
        long_help = "Log child-process command lines to stderr."
    )]
    pub verbose: bool,
    #[arg(
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Text,
        long_help = "Diagnostic output format. text is default; json emits one \
                     machine-readable object per error."
    )]
    pub format: OutputFormat,
    #[arg(
        last = true,
        value_name = "ASSEMBLER",
        long_help = "The real assembler command line, given after --."
    )]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Validated configuration for one run.
#[derive(Debug)]
pub struct Config {
    pub arch: Option<Arch>,
    pub dialect: Dialect,
    pub fix_unreq: bool,
    pub force_thumb: bool,
    pub verbose: bool,
    pub format: OutputFormat,
    pub debug_to_stdout: bool,
    pub fix_xcode5: bool,
    pub armasm64_skip_neg_offset: bool,
    pub armasm64_skip_prfum: bool,
    pub armasm64_invert_scale: bool,
    pub command: Vec<String>,
}

impl Config {
    /// Options for the translation engine once the architecture is known.
    pub fn translate_options(&self, arch: Arch) -> TranslateOptions {
        TranslateOptions {
            arch,
            dialect: self.dialect,
            fix_unreq: self.fix_unreq,
            force_thumb: self.force_thumb,
            fix_xcode5: self.fix_xcode5,
            armasm64_skip_neg_offset: self.armasm64_skip_neg_offset,
            armasm64_skip_prfum: self.armasm64_skip_prfum,
            armasm64_invert_scale: self.armasm64_invert_scale,
        }
    }
}

/// Environment flags count as set unless they spell an explicit false.
fn parse_env_flag(var_name: &str) -> bool {
    let Some(raw) = env::var_os(var_name) else {
        return false;
    };
    let value = raw.to_string_lossy().trim().to_ascii_lowercase();
    !matches!(value.as_str(), "0" | "false" | "no" | "off" | "")
}

/// Validate CLI arguments and environment into a typed configuration.
pub fn validate_cli(cli: &Cli) -> Result<Config, PpError> {
    let arch = cli
        .arch
        .as_deref()
        .map(Arch::parse)
        .transpose()?;

    if cli.command.is_empty() {
        return Err(PpError::new(
            PpErrorKind::Config,
            "No assembler command given; pass it after --",
            None,
        ));
    }

    let fix_unreq = if cli.fix_unreq {
        true
    } else if cli.no_fix_unreq {
        false
    } else {
        cfg!(target_os = "macos")
    };

    Ok(Config {
        arch,
        dialect: cli.as_type,
        fix_unreq,
        force_thumb: cli.force_thumb,
        verbose: cli.verbose,
        format: cli.format,
        debug_to_stdout: parse_env_flag("GASPP_DEBUG"),
        fix_xcode5: parse_env_flag("GASPP_FIX_XCODE5"),
        armasm64_skip_neg_offset: parse_env_flag("GASPP_ARMASM64_SKIP_NEG_OFFSET"),
        armasm64_skip_prfum: parse_env_flag("GASPP_ARMASM64_SKIP_PRFUM"),
        armasm64_invert_scale: parse_env_flag("GASPP_ARMASM64_INVERT_SCALE"),
        command: cli.command.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_parses_translation_options_and_command() {
        let cli = Cli::parse_from([
            "gaspp",
            "--arch",
            "arm64",
            "--as-type",
            "armasm",
            "--force-thumb",
            "-v",
            "--",
            "armasm64",
            "-o",
            "out.obj",
            "input.S",
        ]);
        assert_eq!(cli.arch.as_deref(), Some("arm64"));
        assert_eq!(cli.as_type, Dialect::Armasm);
        assert!(cli.force_thumb);
        assert!(cli.verbose);
        assert_eq!(cli.command, vec!["armasm64", "-o", "out.obj", "input.S"]);
    }

    #[test]
    fn cli_defaults_to_apple_gas() {
        let cli = Cli::parse_from(["gaspp", "--", "as", "input.S"]);
        assert_eq!(cli.as_type, Dialect::AppleGas);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn cli_accepts_llvm_gcc_spelling() {
        let cli = Cli::parse_from(["gaspp", "--as-type", "llvm_gcc", "--", "as", "x.S"]);
        assert_eq!(cli.as_type, Dialect::LlvmGcc);
    }

    #[test]
    fn validate_cli_resolves_arch_aliases() {
        let cli = Cli::parse_from(["gaspp", "--arch", "arm64", "--", "as", "x.S"]);
        let config = validate_cli(&cli).expect("validate cli");
        assert_eq!(config.arch, Some(Arch::Aarch64));
    }

    #[test]
    fn validate_cli_rejects_unknown_arch() {
        let cli = Cli::parse_from(["gaspp", "--arch", "mips", "--", "as", "x.S"]);
        assert!(validate_cli(&cli).is_err());
    }

    #[test]
    fn validate_cli_requires_a_command() {
        let cli = Cli::parse_from(["gaspp"]);
        let err = validate_cli(&cli).unwrap_err();
        assert_eq!(err.to_string(), "No assembler command given; pass it after --");
    }

    #[test]
    fn fix_unreq_flags_override_the_host_default() {
        let cli = Cli::parse_from(["gaspp", "--fix-unreq", "--", "as", "x.S"]);
        assert!(validate_cli(&cli).expect("validate").fix_unreq);
        let cli = Cli::parse_from(["gaspp", "--no-fix-unreq", "--", "as", "x.S"]);
        assert!(!validate_cli(&cli).expect("validate").fix_unreq);
    }
}
