// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::rewrite_apple::{is_branch_mnemonic, is_call_symbol, strip_local_label_dots};
use super::*;

impl Translator {
    /// Emission path for armasm/armasm64: symbol values substitute
    /// textually, labels move to column 0 without colons, numeric local
    /// labels get synthesized names, and the directive vocabulary is
    /// rewritten wholesale.
    pub(crate) fn armasm_emit(&mut self, line: &str) -> Result<(), PpError> {
        let mut text = if self.symbols.is_empty() {
            line.to_string()
        } else {
            self.symbols.substitute_all(line)
        };
        text = strip_local_label_dots(&text);

        let mut rest = text.as_str();
        loop {
            let (label, tail) = split_label(rest);
            let Some(label) = label else { break };
            self.flush_pending_movw();
            if label.chars().all(|c| c.is_ascii_digit()) {
                let label = label.to_string();
                for name in self.locals.define(&label) {
                    self.emit(&name);
                }
            } else {
                let name = label.to_string();
                self.labels_seen.insert(name.clone());
                if self.thumb {
                    self.thumb_labels.insert(name.clone());
                }
                self.emit(&name);
            }
            rest = tail.trim_start();
        }

        if rest.trim().is_empty() {
            return Ok(());
        }
        if rest.trim_start().starts_with('.') {
            let rest = rest.trim().to_string();
            self.flush_pending_movw();
            return self.armasm_directive(&rest);
        }
        let rest = rest.trim().to_string();
        self.armasm_instruction(&rest)
    }

    pub(crate) fn flush_pending_movw(&mut self) {
        if let Some(pending) = self.pending_movw.take() {
            let raw = format!("\t{}", pending.raw.trim());
            self.emit(&raw);
        }
    }

    fn armasm_directive(&mut self, text: &str) -> Result<(), PpError> {
        let word = first_word(text).unwrap_or(text);
        let args = text[word.len()..].trim();

        match word {
            ".align" | ".p2align" => {
                let n = self.eval_tolerant(args.split(',').next().unwrap_or("0"));
                let bytes = 1i64 << n.clamp(0, 31);
                let align = format!("\tALIGN {bytes}");
                self.emit(&align);
                Ok(())
            }
            ".thumb_func" => Ok(()),
            ".int" | ".long" | ".word" => self.emit_data("dcd", args),
            ".short" | ".hword" => self.emit_data("dcw", args),
            ".byte" | ".ascii" => self.emit_data("dcb", args),
            ".asciz" => {
                let with_nul = format!("{args},0");
                self.emit_data("dcb", &with_nul)
            }
            ".quad" | ".xword" | ".dword" => self.emit_data("dcq", args),
            ".float" => self.emit_data("dcfs", args),
            _ => {
                // armasm has no equivalent; leave the directive visible as
                // a comment.
                let commented = format!("; {text}");
                self.emit(&commented);
                Ok(())
            }
        }
    }

    fn emit_data(&mut self, directive: &str, args: &str) -> Result<(), PpError> {
        let rewritten: Vec<String> = split_operands(args)
            .into_iter()
            .map(|op| self.rewrite_local_ref(op))
            .collect();
        let fixed = armasm_fix_text(&rewritten.join(", "));
        let line = format!("\t{directive} {fixed}");
        self.emit(&line);
        Ok(())
    }

    /// Rewrite one `Nb`/`Nf` operand to its synthesized label.
    fn rewrite_local_ref(&mut self, op: &str) -> String {
        let trimmed = op.trim();
        if let Some(num) = local_ref_number(trimmed) {
            if trimmed.ends_with('b') {
                if let Some(name) = self.locals.backward(num) {
                    return name.to_string();
                }
            } else {
                return self.locals.forward(num);
            }
        }
        trimmed.to_string()
    }

    fn armasm_instruction(&mut self, text: &str) -> Result<(), PpError> {
        let Some((_, mnemonic, operand_text)) = split_stmt(text) else {
            return Ok(());
        };
        let mut mnemonic = mnemonic.to_string();
        let mut ops: Vec<String> = if operand_text.is_empty() {
            Vec::new()
        } else {
            split_operands(operand_text)
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        if self.opts.arch == Arch::Arm {
            // armasm inserts IT blocks implicitly.
            if is_it_mnemonic(&mnemonic) {
                self.flush_pending_movw();
                return Ok(());
            }
            if mnemonic == "movw" && ops.len() == 2 {
                if let Some(sym) = ops[1].strip_prefix("#:lower16:") {
                    self.flush_pending_movw();
                    self.pending_movw = Some(PendingMov32 {
                        reg: ops[0].clone(),
                        sym: sym.to_string(),
                        raw: text.to_string(),
                    });
                    return Ok(());
                }
            }
            if mnemonic == "movt" && ops.len() == 2 {
                if let Some(sym) = ops[1].strip_prefix("#:upper16:") {
                    if let Some(pending) = self.pending_movw.take() {
                        if pending.reg == ops[0] && pending.sym == sym {
                            self.import_symbols.insert(sym.to_string());
                            let mov32 = format!("\tmov32 {}, {sym}", ops[0]);
                            self.emit(&mov32);
                            return Ok(());
                        }
                        self.pending_movw = Some(pending);
                    }
                }
            }
            self.flush_pending_movw();
            // armasm cannot parse untyped single-precision scalar forms.
            if matches!(mnemonic.as_str(), "vmov" | "vadd")
                && ops.first().is_some_and(|op| is_single_scalar(op))
            {
                mnemonic.push_str(".f32");
            }
            // armasm resolves ldr-equals loads itself, but the referenced
            // data symbol still needs an IMPORT.
            if mnemonic.starts_with("ldr") && ops.len() == 2 {
                if let Some(expr_text) = ops[1].strip_prefix('=') {
                    let (sym, _) = split_symbol_offset(expr_text);
                    if is_call_symbol(sym) {
                        self.import_symbols.insert(sym.to_string());
                    }
                }
            }
        }

        if self.opts.arch == Arch::Aarch64 {
            if let Some(cond) = mnemonic.strip_prefix("b.") {
                if COND_CODES.contains(&cond) {
                    mnemonic = format!("b{cond}");
                }
            }
            if mnemonic == "ext" {
                mnemonic = "ext8".to_string();
            }
            if mnemonic == "prfum" && self.opts.armasm64_skip_prfum {
                return Ok(());
            }
            if mnemonic == "mov"
                && ops.len() == 2
                && is_vector_element(&ops[1])
            {
                mnemonic = "umov".to_string();
            }
            if matches!(
                mnemonic.as_str(),
                "ccmp" | "ccmn" | "csel" | "cinc" | "cset" | "cinv" | "cneg" | "csinc" | "csinv"
            ) {
                if let Some(last) = ops.last() {
                    if COND_CODES.contains(&last.as_str()) {
                        let cond = ops.pop().expect("cond operand").to_ascii_uppercase();
                        mnemonic.push_str(&cond);
                    }
                }
            }
            if mnemonic.starts_with("ldr") && ops.len() == 2 && ops[1].starts_with('=') {
                return self.armasm_literal_address(&mnemonic, &ops);
            }
            if mnemonic == "adrp" && ops.len() == 2 {
                return self.armasm_adrp(&ops);
            }
            if mnemonic == "add" && ops.iter().any(|op| op.contains(":lo12:")) {
                return self.armasm_page_offset_add(&ops);
            }
            if matches!(mnemonic.as_str(), "tbz" | "tbnz") {
                if let Some(first) = ops.first_mut() {
                    let widened = first
                        .strip_prefix('w')
                        .filter(|num| !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()))
                        .map(|num| format!("x{num}"));
                    if let Some(widened) = widened {
                        *first = widened;
                    }
                }
            }
            if matches!(
                mnemonic.as_str(),
                "ldr" | "ldrb" | "ldrh" | "str" | "strb" | "strh"
            ) && ops.len() == 2
                && is_negative_plain_offset(&ops[1])
            {
                mnemonic = format!("{}u{}", &mnemonic[..2], &mnemonic[2..]);
            }
            if self.opts.armasm64_invert_scale
                && matches!(mnemonic.as_str(), "fcvtzs" | "scvtf")
            {
                if let Some(last) = ops.last_mut() {
                    let inverted = last
                        .strip_prefix('#')
                        .and_then(|scale| scale.trim().parse::<i64>().ok())
                        .map(|scale| format!("#{}", 64 - scale));
                    if let Some(inverted) = inverted {
                        *last = inverted;
                    }
                }
            }
            for op in ops.iter_mut() {
                if op.contains('{') && op.contains('-') {
                    let expanded = expand_register_range(op);
                    *op = expanded;
                }
            }
        }

        // Numeric local-label references on branches, adr and compares.
        let lookup = mnemonic.strip_suffix(".w").unwrap_or(&mnemonic);
        if let Some(idx) = local_target_index(lookup, ops.len()) {
            let target = ops[idx].clone();
            if local_ref_number(&target).is_some() {
                ops[idx] = self.rewrite_local_ref(&target);
            } else if is_call_symbol(&target) && !self.labels_seen.contains(target.as_str()) {
                self.call_targets.insert(target);
            }
        }

        let mut line = if ops.is_empty() {
            format!("\t{mnemonic}")
        } else {
            format!("\t{mnemonic} {}", ops.join(", "))
        };
        line = append_extend_shift(&line);
        line = armasm_fix_text(&line);
        self.emit(&line);
        Ok(())
    }

    /// `ldr Xd, =SYM[+off]`: record the symbol for IMPORT; optionally
    /// split a negative offset into an explicit subtract.
    fn armasm_literal_address(
        &mut self,
        mnemonic: &str,
        ops: &[String],
    ) -> Result<(), PpError> {
        let expr_text = ops[1].trim_start_matches('=');
        let (sym, offset) = split_symbol_offset(expr_text);
        if is_call_symbol(sym) {
            self.import_symbols.insert(sym.to_string());
        }
        if self.opts.armasm64_skip_neg_offset && offset < 0 {
            let load = format!("\t{mnemonic} {}, ={sym}", ops[0]);
            let sub = format!("\tsub {0}, {0}, #{1}", ops[0], -offset);
            self.emit(&load);
            self.emit(&sub);
            return Ok(());
        }
        let line = format!("\t{mnemonic} {}, {}", ops[0], ops[1]);
        self.emit(&line);
        Ok(())
    }

    /// `adrp Rd, SYM+off`: armasm64 cannot carry the addend on the page
    /// calculation, so strip it; the matching `:lo12:` add re-applies it.
    fn armasm_adrp(&mut self, ops: &[String]) -> Result<(), PpError> {
        let (sym, offset) = split_symbol_offset(&ops[1]);
        let sym = sym.to_string();
        if is_call_symbol(&sym) {
            self.import_symbols.insert(sym.clone());
        }
        if offset != 0 {
            self.adrp_offset.insert(ops[0].clone(), offset);
        }
        let line = format!("\tadrp {}, {sym}", ops[0]);
        self.emit(&line);
        Ok(())
    }

    /// `add Rd, Rn, :lo12:SYM+off` → `add Rd, Rn, SYM`, with the addend
    /// re-applied afterwards when positive.
    fn armasm_page_offset_add(&mut self, ops: &[String]) -> Result<(), PpError> {
        let lo12 = ops
            .iter()
            .position(|op| op.contains(":lo12:"))
            .expect("lo12 operand");
        let expr_text = ops[lo12]
            .trim_start_matches('#')
            .trim_start_matches(":lo12:");
        let (sym, mut offset) = split_symbol_offset(expr_text);
        let sym = sym.to_string();
        if is_call_symbol(&sym) {
            self.import_symbols.insert(sym.clone());
        }
        let rn = if lo12 >= 2 { ops[1].as_str() } else { ops[0].as_str() };
        let rn = rn.to_string();
        if offset == 0 {
            if let Some(stripped) = self.adrp_offset.remove(&rn) {
                offset = stripped;
            }
        } else {
            self.adrp_offset.remove(&rn);
        }
        let line = format!("\tadd {}, {rn}, {sym}", ops[0]);
        self.emit(&line);
        if offset > 0 {
            let add = format!("\tadd {}, {rn}, #{offset}", ops[0]);
            self.emit(&add);
        }
        Ok(())
    }
}

/// Split `SYM+off`/`SYM-off` into the symbol and a signed addend. Text
/// without a numeric tail keeps a zero addend.
fn split_symbol_offset(text: &str) -> (&str, i64) {
    let text = text.trim();
    if let Some(pos) = text.rfind(['+', '-']) {
        if pos > 0 {
            let (sym, off_text) = text.split_at(pos);
            if let Ok(off) = off_text.replace(' ', "").parse::<i64>() {
                return (sym.trim(), off);
            }
        }
    }
    (text, 0)
}

fn is_it_mnemonic(mnemonic: &str) -> bool {
    let Some(tail) = mnemonic.strip_prefix("it") else {
        return false;
    };
    tail.len() <= 3 && tail.chars().all(|c| c == 't' || c == 'e')
}

fn is_single_scalar(op: &str) -> bool {
    let Some(rest) = op.strip_prefix('s') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

fn is_vector_element(op: &str) -> bool {
    op.starts_with('v') && op.contains('.') && op.ends_with(']') && op.contains('[')
}

/// `1b`/`1f` style reference → the numeric part.
fn local_ref_number(op: &str) -> Option<&str> {
    let num = op.strip_suffix(['b', 'f'])?;
    if num.is_empty() || !num.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(num)
}

/// Operand index holding the branch target for local-label rewriting.
fn local_target_index(mnemonic: &str, op_count: usize) -> Option<usize> {
    if is_branch_mnemonic(mnemonic) && op_count >= 1 {
        return Some(0);
    }
    match mnemonic {
        "cbz" | "cbnz" | "adr" if op_count >= 2 => Some(1),
        "tbz" | "tbnz" if op_count >= 3 => Some(2),
        _ => None,
    }
}

/// `{v1.4h-v3.4h}` → `{v1.4h,v2.4h,v3.4h}`.
fn expand_register_range(op: &str) -> String {
    let Some(open) = op.find('{') else {
        return op.to_string();
    };
    let Some(close) = op.rfind('}') else {
        return op.to_string();
    };
    let inner = &op[open + 1..close];
    let Some((start, end)) = inner.split_once('-') else {
        return op.to_string();
    };
    let Some((start_num, shape)) = parse_vreg(start.trim()) else {
        return op.to_string();
    };
    let Some((end_num, end_shape)) = parse_vreg(end.trim()) else {
        return op.to_string();
    };
    if end_shape != shape || end_num < start_num {
        return op.to_string();
    }
    let list: Vec<String> = (start_num..=end_num)
        .map(|n| format!("v{n}{shape}"))
        .collect();
    format!("{}{{{}}}{}", &op[..open], list.join(","), &op[close + 1..])
}

fn parse_vreg(text: &str) -> Option<(u32, String)> {
    let rest = text.strip_prefix('v')?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let num = rest[..digits_end].parse().ok()?;
    Some((num, rest[digits_end..].to_string()))
}

/// `[Xn, #-imm]` with no writeback, the unscaled-load shape.
fn is_negative_plain_offset(op: &str) -> bool {
    op.starts_with('[') && op.ends_with(']') && op.contains(", #-")
}

/// A trailing register-extend without a shift amount needs an explicit
/// `#0` for armasm64.
fn append_extend_shift(line: &str) -> String {
    for extend in ["uxtw", "uxth", "uxtb", "sxtw", "sxth", "sxtb"] {
        if let Some(head) = line.strip_suffix(&format!(", {extend}]")) {
            return format!("{head}, {extend} #0]");
        }
        if let Some(head) = line.strip_suffix(&format!(", {extend}")) {
            return format!("{head}, {extend} #0");
        }
    }
    line.to_string()
}

/// Textual cleanups armasm needs: gas alignment specifiers, spacing
/// around `&`, and folding of trivial `!n` and `(a<b)` expressions.
pub(crate) fn armasm_fix_text(line: &str) -> String {
    let mut out = rewrite_alignment_specs(line);
    out = out.replace("&0x", "& 0x");
    out = fold_logical_not(&out);
    out = fold_numeric_comparisons(&out);
    out
}

/// `[Rn, :128]` → `[Rn@128]`.
fn rewrite_alignment_specs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(pos) = rest.find(", :") {
        let digits = &rest[pos + 3..];
        let digits_end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        if digits_end > 0 && digits[digits_end..].starts_with(']') {
            out.push_str(&rest[..pos]);
            out.push('@');
            out.push_str(&digits[..digits_end]);
            rest = &digits[digits_end..];
        } else {
            out.push_str(&rest[..pos + 3]);
            rest = &rest[pos + 3..];
        }
    }
    out.push_str(rest);
    out
}

/// `!<number>` → `0`/`1`.
fn fold_logical_not(line: &str) -> String {
    let bytes = line.as_bytes();
    let mut out = String::with_capacity(line.len());
    let mut idx = 0;
    while idx < line.len() {
        if bytes[idx] == b'!'
            && idx + 1 < bytes.len()
            && bytes[idx + 1].is_ascii_digit()
            && (idx == 0 || bytes[idx - 1] != b'=')
        {
            let digits_end = line[idx + 1..]
                .find(|c: char| !c.is_ascii_digit())
                .map_or(line.len(), |off| idx + 1 + off);
            let value: i64 = line[idx + 1..digits_end].parse().unwrap_or(0);
            out.push(if value == 0 { '1' } else { '0' });
            idx = digits_end;
            continue;
        }
        let c = line[idx..].chars().next().expect("in-bounds char");
        out.push(c);
        idx += c.len_utf8();
    }
    out
}

/// `(a<b)` and `(a>b)` with plain numbers → `0`/`1`. Anything more
/// complex is left for the assembler.
fn fold_numeric_comparisons(line: &str) -> String {
    let mut out = line.to_string();
    loop {
        let Some((start, end, value)) = find_foldable_comparison(&out) else {
            return out;
        };
        out.replace_range(start..end, if value { "1" } else { "0" });
    }
}

fn find_foldable_comparison(line: &str) -> Option<(usize, usize, bool)> {
    let bytes = line.as_bytes();
    for (start, _) in line.char_indices().filter(|(_, c)| *c == '(') {
        let close = match line[start..].find(')') {
            Some(off) => start + off,
            None => continue,
        };
        let inner = &line[start + 1..close];
        let op_pos = match inner.find(['<', '>']) {
            Some(pos) => pos,
            None => continue,
        };
        let lhs = inner[..op_pos].trim();
        let rhs = inner[op_pos + 1..].trim();
        let both_numeric = !lhs.is_empty()
            && !rhs.is_empty()
            && lhs.chars().all(|c| c.is_ascii_digit())
            && rhs.chars().all(|c| c.is_ascii_digit());
        if !both_numeric {
            continue;
        }
        let lhs: i64 = lhs.parse().ok()?;
        let rhs: i64 = rhs.parse().ok()?;
        let value = if bytes[start + 1 + op_pos] == b'<' {
            lhs < rhs
        } else {
            lhs > rhs
        };
        return Some((start, close + 1, value));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_mnemonics_are_recognized() {
        assert!(is_it_mnemonic("it"));
        assert!(is_it_mnemonic("ite"));
        assert!(is_it_mnemonic("ittee"));
        assert!(!is_it_mnemonic("itttt"));
        assert!(!is_it_mnemonic("its"));
    }

    #[test]
    fn register_ranges_expand() {
        assert_eq!(
            expand_register_range("{v1.4h-v3.4h}"),
            "{v1.4h,v2.4h,v3.4h}"
        );
        assert_eq!(expand_register_range("{v3.4h-v1.4h}"), "{v3.4h-v1.4h}");
    }

    #[test]
    fn alignment_specs_use_at_signs() {
        assert_eq!(
            rewrite_alignment_specs("vld1.8 {d0}, [r1, :128]"),
            "vld1.8 {d0}, [r1@128]"
        );
        assert_eq!(rewrite_alignment_specs("[r1, :x]"), "[r1, :x]");
    }

    #[test]
    fn trivial_expressions_fold() {
        assert_eq!(fold_logical_not("mov r0, #!0"), "mov r0, #1");
        assert_eq!(fold_logical_not("mov r0, #!7"), "mov r0, #0");
        assert_eq!(fold_numeric_comparisons("dcd (3<5)"), "dcd 1");
        assert_eq!(fold_numeric_comparisons("dcd (3>5)"), "dcd 0");
        assert_eq!(fold_numeric_comparisons("dcd (a<5)"), "dcd (a<5)");
    }

    #[test]
    fn extends_gain_explicit_shift() {
        assert_eq!(
            append_extend_shift("\tldr x0, [x1, w2, uxtw]"),
            "\tldr x0, [x1, w2, uxtw #0]"
        );
        assert_eq!(
            append_extend_shift("\tadd x0, x1, w2, sxtw"),
            "\tadd x0, x1, w2, sxtw #0"
        );
        assert_eq!(
            append_extend_shift("\tldr x0, [x1, w2, uxtw #1]"),
            "\tldr x0, [x1, w2, uxtw #1]"
        );
    }

    #[test]
    fn negative_plain_offsets_detected() {
        assert!(is_negative_plain_offset("[x1, #-8]"));
        assert!(!is_negative_plain_offset("[x1, #8]"));
        assert!(!is_negative_plain_offset("[x1, #-8]!"));
    }
}
