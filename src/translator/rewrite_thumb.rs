// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

impl Translator {
    /// Rewrites applied only under `-force-thumb`: ARM-mode idioms that
    /// have no Thumb encoding are lowered to equivalent sequences.
    ///
    /// Returns true when this function emitted replacement lines itself.
    pub(crate) fn force_thumb_rewrite(&mut self, line: &str) -> Result<bool, PpError> {
        let Some((indent, mnemonic, operand_text)) = split_stmt(line) else {
            return Ok(false);
        };
        let indent = indent.to_string();
        let operands: Vec<String> = split_operands(operand_text)
            .into_iter()
            .map(str::to_string)
            .collect();

        // mov pc, lr has no Thumb encoding; interworking return does.
        if mnemonic == "mov" && operands.len() == 2 && operands[0] == "pc" && operands[1] == "lr"
        {
            let bx = format!("{indent}bx lr");
            self.gas_emit(&bx)?;
            return Ok(true);
        }

        // Post-indexed register offset: ldr/str Rd, [Rn], Rm.
        if (mnemonic == "ldr" || mnemonic == "str") && operands.len() == 3 {
            let base = operands[1].as_str();
            let offset = operands[2].as_str();
            if base.starts_with('[')
                && base.ends_with(']')
                && !offset.starts_with('#')
                && !offset.ends_with(']')
            {
                let base_reg = base.trim_matches(['[', ']']);
                let mem = format!("{indent}{mnemonic} {}, [{base_reg}]", operands[0]);
                let add = format!("{indent}add {base_reg}, {base_reg}, {offset}");
                self.gas_emit(&mem)?;
                self.gas_emit(&add)?;
                return Ok(true);
            }
        }

        // Single-register push/pop spelled as block transfers.
        if matches!(mnemonic, "stmdb" | "stmfd") && operands.len() == 2 && operands[0] == "sp!" {
            if let Some(reg) = single_register_set(&operands[1]) {
                let store = format!("{indent}str {reg}, [sp, #-4]!");
                self.gas_emit(&store)?;
                return Ok(true);
            }
        }
        if matches!(mnemonic, "ldmia" | "ldmfd" | "ldm") && operands.len() == 2
            && operands[0] == "sp!"
        {
            if let Some(reg) = single_register_set(&operands[1]) {
                let load = format!("{indent}ldr {reg}, [sp], #4");
                self.gas_emit(&load)?;
                return Ok(true);
            }
        }

        // muls is flag-setting; recover the flags with an explicit compare.
        if mnemonic == "muls" && operands.len() == 3 {
            let mul = format!(
                "{indent}mul {}, {}, {}",
                operands[0], operands[1], operands[2]
            );
            let cmp = format!("{indent}cmp {}, #0", operands[0]);
            self.gas_emit(&mul)?;
            self.gas_emit(&cmp)?;
            return Ok(true);
        }

        // and with sp as the first source operand.
        if mnemonic == "and" && operands.len() == 3 && operands[1] == "sp" {
            let mov = format!("{indent}mov {}, sp", operands[0]);
            let and = format!("{indent}and {0}, {0}, {1}", operands[0], operands[2]);
            self.gas_emit(&mov)?;
            self.gas_emit(&and)?;
            return Ok(true);
        }

        // Same-register scaled load with a shift Thumb cannot encode.
        if mnemonic == "ldr" && operands.len() == 2 {
            if let Some(seq) = split_scaled_same_reg_load(&indent, &operands[0], &operands[1]) {
                for out_line in seq {
                    self.gas_emit(&out_line)?;
                }
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// `{rN}` → `rN` when the set holds exactly one register.
fn single_register_set(set: &str) -> Option<&str> {
    let inner = set.strip_prefix('{')?.strip_suffix('}')?.trim();
    if inner.is_empty() || inner.contains(',') || inner.contains('-') {
        return None;
    }
    Some(inner)
}

/// `ldr Rd, [Rd, Rm, lsl #n]` with n > 3 → `add Rd, Rd, Rm, lsl #n` +
/// `ldr Rd, [Rd]`.
fn split_scaled_same_reg_load(indent: &str, dest: &str, mem: &str) -> Option<Vec<String>> {
    let inner = mem.strip_prefix('[')?.strip_suffix(']')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 || parts[0] != dest {
        return None;
    }
    let shift = parts[2].strip_prefix("lsl")?.trim().strip_prefix('#')?;
    let amount: u32 = shift.trim().parse().ok()?;
    if amount <= 3 {
        return None;
    }
    Some(vec![
        format!("{indent}add {dest}, {dest}, {}, lsl #{amount}", parts[1]),
        format!("{indent}ldr {dest}, [{dest}]"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_register_sets_are_detected() {
        assert_eq!(single_register_set("{r4}"), Some("r4"));
        assert_eq!(single_register_set("{r4, r5}"), None);
        assert_eq!(single_register_set("{r4-r6}"), None);
    }

    #[test]
    fn scaled_same_reg_load_splits() {
        let seq = split_scaled_same_reg_load("\t", "r0", "[r0, r1, lsl #4]").unwrap();
        assert_eq!(seq[0], "\tadd r0, r0, r1, lsl #4");
        assert_eq!(seq[1], "\tldr r0, [r0]");
        assert!(split_scaled_same_reg_load("\t", "r0", "[r0, r1, lsl #2]").is_none());
        assert!(split_scaled_same_reg_load("\t", "r0", "[r2, r1, lsl #4]").is_none());
    }
}
