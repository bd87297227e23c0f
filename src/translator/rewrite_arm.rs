// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

impl Translator {
    /// Replace NEON `.dn`/`.qn` aliases on `v…`-instruction lines. The
    /// first alias that carries a datatype also types the mnemonic.
    pub(crate) fn apply_neon_aliases(&mut self, line: &str) -> String {
        if self.neon.is_empty() {
            return line.to_string();
        }
        let Some((indent, mnemonic, operands)) = split_stmt(line) else {
            return line.to_string();
        };
        if !mnemonic.starts_with('v') {
            return line.to_string();
        }

        let mut mnemonic = mnemonic.to_string();
        let mut operands = operands.to_string();
        let mut typed = mnemonic.contains('.');
        for alias in self.neon.by_length() {
            if find_word(&operands, &alias.name).is_none() {
                continue;
            }
            operands = replace_word(&operands, &alias.name, &alias.register);
            if !typed {
                if let Some(dtype) = &alias.datatype {
                    mnemonic.push('.');
                    mnemonic.push_str(dtype);
                    typed = true;
                }
            }
        }
        format!("{indent}{mnemonic} {operands}")
    }

    /// `ldr Rd, =EXPR` → literal-pool load (non-armasm ARM).
    pub(crate) fn rewrite_arm_literal_load(&mut self, line: &str) -> String {
        let Some((indent, mnemonic, operands)) = split_stmt(line) else {
            return line.to_string();
        };
        if !mnemonic.starts_with("ldr") {
            return line.to_string();
        }
        let Some((reg, rest)) = operands.split_once(',') else {
            return line.to_string();
        };
        let rest = rest.trim();
        let Some(expr_text) = rest.strip_prefix('=') else {
            return line.to_string();
        };
        let label = self.literals.label_for(expr_text);
        format!("{indent}{mnemonic} {}, {label}", reg.trim())
    }

    /// Thumb cannot encode narrow `add`/`sub` with immediates over 255;
    /// force the wide encoding.
    pub(crate) fn rewrite_thumb_wide_imm(&mut self, line: &str) -> String {
        let Some((indent, mnemonic, operands)) = split_stmt(line) else {
            return line.to_string();
        };
        if !matches!(mnemonic, "add" | "sub") {
            return line.to_string();
        }
        let Some(imm_pos) = operands.rfind('#') else {
            return line.to_string();
        };
        let imm_text = operands[imm_pos + 1..].trim();
        if self.eval_tolerant(imm_text) > 255 {
            return format!("{indent}{mnemonic}.w {operands}");
        }
        line.to_string()
    }
}
