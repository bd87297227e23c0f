// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The syntactic translation engine.
//!
//! One `Translator` instance owns every piece of stream state and drives a
//! single forward pass: reader output feeds the conditional stack, the
//! macro/repetition engine re-enters the pipeline for expanded lines, and
//! every surviving line runs through the per-architecture and per-dialect
//! rewriters before emission.

pub mod cli;
mod engine;
mod line_directives;
mod line_rewrite;
mod output;
mod rewrite_aarch64;
mod rewrite_apple;
mod rewrite_arm;
mod rewrite_armasm;
mod rewrite_ppc;
mod rewrite_thumb;
#[cfg(test)]
mod tests;

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::core::arch::{Arch, Dialect};
use crate::core::conditional::CondStack;
use crate::core::error::{PpError, PpErrorKind};
use crate::core::expr;
use crate::core::literal_pool::LiteralPool;
use crate::core::local_labels::LocalLabels;
use crate::core::macros::{
    bind_macro_args, parse_invocation_args, parse_macro_header, substitute_line, MacroDef,
    MacroParam, MacroTable,
};
use crate::core::reader;
use crate::core::symbols::{NeonAliasTable, RegisterAliases, SymbolTable};
use crate::core::text_utils::{
    find_word, first_word, replace_word, split_label, split_operands, split_stmt,
};

pub use engine::{TranslateOptions, Translator};
pub(crate) use engine::{Capture, PendingMov32, RepeatKind};

/// ARM condition codes recognized when peeling a condition suffix from a
/// branch mnemonic. `bic` stays `bic` because `ic` is not in this set.
pub(crate) const COND_CODES: &[&str] = &[
    "eq", "ne", "cs", "cc", "mi", "pl", "vs", "vc", "hi", "ls", "ge", "lt", "gt", "le", "al",
    "hs", "lo",
];

/// Translate one preprocessed source stream with fresh engine state.
pub fn translate(source: &str, opts: TranslateOptions) -> Result<String, PpError> {
    let mut translator = Translator::new(opts);
    translator.translate(source)
}
