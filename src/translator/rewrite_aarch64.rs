// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

impl Translator {
    /// AArch64 operand and mnemonic fixes shared by all non-armasm
    /// dialects; the armasm emitter applies its own set on top.
    pub(crate) fn rewrite_aarch64_line(&mut self, line: &str) -> String {
        let mut line = line.to_string();

        if self.opts.dialect.features().apple_renames {
            line = rewrite_apple_page_refs(&line);
        }
        if self.opts.fix_xcode5 {
            line = rewrite_xcode5_shims(&line);
        }
        if matches!(self.opts.dialect, Dialect::Clang | Dialect::Armasm) {
            line = self.rewrite_wide_page_imm(&line);
        }
        line
    }

    /// `add`/`sub` with a 4096-multiple immediate over 4095 must spell the
    /// shift explicitly for clang and armasm.
    fn rewrite_wide_page_imm(&mut self, line: &str) -> String {
        let Some((indent, mnemonic, operands)) = split_stmt(line) else {
            return line.to_string();
        };
        if !matches!(mnemonic, "add" | "adds" | "sub" | "subs") {
            return line.to_string();
        }
        let Some(imm_pos) = operands.rfind('#') else {
            return line.to_string();
        };
        let imm_text = operands[imm_pos + 1..].trim();
        let Ok(imm) = expr::eval(imm_text, &self.symbols) else {
            return line.to_string();
        };
        if imm > 4095 && imm % 4096 == 0 {
            let head = &operands[..imm_pos];
            return format!("{indent}{mnemonic} {head}#{}, lsl #12", imm >> 12);
        }
        line.to_string()
    }
}

/// Apple's assemblers spell PC-relative page references as `@PAGE` and
/// `@PAGEOFF` rather than the ELF relocation operators.
pub(crate) fn rewrite_apple_page_refs(line: &str) -> String {
    let mut out = line.to_string();
    if let Some(pos) = out.find("#:pg_hi21:") {
        let sym_start = pos + "#:pg_hi21:".len();
        let sym_end = sym_end_offset(&out, sym_start);
        let sym = out[sym_start..sym_end].to_string();
        out.replace_range(pos..sym_end, &format!("{sym}@PAGE"));
    }
    for marker in ["#:lo12:", ":lo12:"] {
        if let Some(pos) = out.find(marker) {
            let sym_start = pos + marker.len();
            let sym_end = sym_end_offset(&out, sym_start);
            let sym = out[sym_start..sym_end].to_string();
            out.replace_range(pos..sym_end, &format!("{sym}@PAGEOFF"));
            break;
        }
    }
    out
}

fn sym_end_offset(line: &str, start: usize) -> usize {
    line[start..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$'))
        .map_or(line.len(), |off| start + off)
}

/// Syntax shims for the Xcode 5 integrated assembler.
pub(crate) fn rewrite_xcode5_shims(line: &str) -> String {
    let Some((indent, mnemonic, operands)) = split_stmt(line) else {
        return line.to_string();
    };

    // Vector-to-vector mov is missing; spell it as orr with a repeated
    // source.
    if mnemonic == "mov" {
        let parts = split_operands(operands);
        if parts.len() == 2 && parts[0].starts_with('v') && parts[1].starts_with('v') {
            let dst = parts[0];
            let src = parts[1];
            if dst.contains('.') && src.contains('.') && !src.contains('[') {
                return format!("{indent}orr {dst}, {src}, {src}");
            }
        }
    }

    // movi on 2h/4h/8h/2s/4s vectors needs an explicit shift.
    if mnemonic == "movi" {
        let parts = split_operands(operands);
        if parts.len() == 2 && parts[1].starts_with('#') {
            let shaped = ["2h", "4h", "8h", "2s", "4s"]
                .iter()
                .any(|shape| parts[0].ends_with(shape));
            if shaped {
                return format!("{indent}movi {operands}, lsl #0");
            }
        }
    }

    // uxtl/sxtl aliases are missing; use the shift-left-long forms.
    for (alias, shll) in [
        ("uxtl2", "ushll2"),
        ("sxtl2", "sshll2"),
        ("uxtl", "ushll"),
        ("sxtl", "sshll"),
    ] {
        if mnemonic == alias {
            return format!("{indent}{shll} {operands}, #0");
        }
    }

    line.to_string()
}
