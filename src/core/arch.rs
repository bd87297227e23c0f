// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Architecture and output-dialect tags.
//!
//! The architecture selects the comment character and the literal word
//! directive and gates which rewrite families run. The dialect selects the
//! output directive vocabulary and the bug-compatibility shims. The two are
//! orthogonal.

use clap::ValueEnum;

use crate::core::error::{PpError, PpErrorKind};

/// Target architecture of the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Arm,
    Aarch64,
    PowerPc,
}

impl Arch {
    /// Canonicalize an architecture name or alias.
    pub fn parse(name: &str) -> Result<Self, PpError> {
        match name.to_ascii_lowercase().as_str() {
            "arm" | "armv5" | "armv6" | "armv7" | "thumb" => Ok(Self::Arm),
            "aarch64" | "arm64" | "armv8" => Ok(Self::Aarch64),
            "powerpc" | "ppc" | "powerpc64" | "ppc64" => Ok(Self::PowerPc),
            _ => Err(PpError::new(
                PpErrorKind::Config,
                "Unknown architecture",
                Some(name),
            )),
        }
    }

    /// The comment introducer for this architecture's gas flavour.
    pub fn comment_token(self) -> &'static str {
        match self {
            Self::Arm => "@",
            Self::Aarch64 => "//",
            Self::PowerPc => "#",
        }
    }

    /// Directive used to emit one literal-pool word.
    pub fn word_directive(self) -> &'static str {
        match self {
            Self::Aarch64 => ".quad",
            _ => ".word",
        }
    }
}

/// Output dialect of the downstream assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Dialect {
    Gas,
    #[default]
    AppleGas,
    Clang,
    AppleClang,
    #[value(name = "llvm_gcc", alias = "llvm-gcc")]
    LlvmGcc,
    Armasm,
}

impl Dialect {
    /// Dialects that emit Mach-O flavoured assembly.
    pub fn is_apple(self) -> bool {
        matches!(self, Self::AppleGas | Self::AppleClang | Self::LlvmGcc)
    }

    pub fn features(self) -> &'static DialectFeatures {
        match self {
            Self::Gas => &GAS_FEATURES,
            Self::AppleGas => &APPLE_GAS_FEATURES,
            Self::Clang => &CLANG_FEATURES,
            Self::AppleClang => &APPLE_CLANG_FEATURES,
            Self::LlvmGcc => &LLVM_GCC_FEATURES,
            Self::Armasm => &ARMASM_FEATURES,
        }
    }
}

/// Per-dialect output behaviour, kept as data so adding a dialect is a
/// table change rather than new control flow.
#[derive(Debug)]
pub struct DialectFeatures {
    /// Strip the leading dot from `.L`-prefixed local labels.
    pub strip_dot_labels: bool,
    /// Rename `.global`/`.rodata`/`.int`/`.float` to the Mach-O spellings.
    pub apple_renames: bool,
    /// Tag thumb-mode functions with `.thumb_func`.
    pub thumb_func_tagging: bool,
    /// Directives the downstream assembler rejects; emitted commented out.
    pub commented_directives: &'static [&'static str],
}

static GAS_FEATURES: DialectFeatures = DialectFeatures {
    strip_dot_labels: false,
    apple_renames: false,
    thumb_func_tagging: false,
    commented_directives: &[],
};

static APPLE_GAS_FEATURES: DialectFeatures = DialectFeatures {
    strip_dot_labels: true,
    apple_renames: true,
    thumb_func_tagging: true,
    commented_directives: &[
        ".type",
        ".endfunc",
        ".size",
        ".fpu",
        ".arch",
        ".object_arch",
        ".note.GNU-stack",
    ],
};

static CLANG_FEATURES: DialectFeatures = DialectFeatures {
    strip_dot_labels: false,
    apple_renames: false,
    thumb_func_tagging: false,
    commented_directives: &[".func", ".endfunc", ".fpu", ".object_arch"],
};

static APPLE_CLANG_FEATURES: DialectFeatures = DialectFeatures {
    strip_dot_labels: true,
    apple_renames: true,
    thumb_func_tagging: true,
    commented_directives: &[
        ".type",
        ".endfunc",
        ".size",
        ".fpu",
        ".arch",
        ".object_arch",
        ".note.GNU-stack",
    ],
};

static LLVM_GCC_FEATURES: DialectFeatures = DialectFeatures {
    strip_dot_labels: true,
    apple_renames: true,
    thumb_func_tagging: true,
    commented_directives: &[
        ".type",
        ".endfunc",
        ".size",
        ".fpu",
        ".note.GNU-stack",
    ],
};

static ARMASM_FEATURES: DialectFeatures = DialectFeatures {
    strip_dot_labels: true,
    apple_renames: false,
    thumb_func_tagging: false,
    // armasm translation rewrites directives wholesale; nothing is merely
    // commented out.
    commented_directives: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_aliases_canonicalize() {
        assert_eq!(Arch::parse("arm64").unwrap(), Arch::Aarch64);
        assert_eq!(Arch::parse("ARMV7").unwrap(), Arch::Arm);
        assert_eq!(Arch::parse("ppc64").unwrap(), Arch::PowerPc);
        assert!(Arch::parse("mips").is_err());
    }

    #[test]
    fn comment_tokens_per_arch() {
        assert_eq!(Arch::Arm.comment_token(), "@");
        assert_eq!(Arch::Aarch64.comment_token(), "//");
        assert_eq!(Arch::PowerPc.comment_token(), "#");
    }

    #[test]
    fn word_directive_widens_on_aarch64() {
        assert_eq!(Arch::Arm.word_directive(), ".word");
        assert_eq!(Arch::Aarch64.word_directive(), ".quad");
    }

    #[test]
    fn apple_dialects_strip_dot_labels() {
        assert!(Dialect::AppleGas.features().strip_dot_labels);
        assert!(Dialect::Armasm.features().strip_dot_labels);
        assert!(!Dialect::Gas.features().strip_dot_labels);
    }
}
