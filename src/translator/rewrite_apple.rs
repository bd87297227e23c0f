// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

impl Translator {
    /// Emission path for every gas-family dialect (everything but armasm):
    /// Mach-O label and directive spellings, thumb-function tagging, and
    /// the per-dialect comment-out table.
    pub(crate) fn gas_emit(&mut self, line: &str) -> Result<(), PpError> {
        let features = self.opts.dialect.features();
        let mut line = line.to_string();

        if features.strip_dot_labels {
            line = strip_local_label_dots(&line);
        }

        if let (Some(label), _) = split_label(&line) {
            let name = label.to_string();
            self.labels_seen.insert(name.clone());
            if self.thumb {
                self.thumb_labels.insert(name);
            }
        }

        if features.apple_renames {
            line = self.apply_apple_renames(&line);
        }

        if let Some((_, mnemonic, _)) = split_stmt(&line) {
            if features.commented_directives.contains(&mnemonic) {
                let commented =
                    format!("{} {}", self.opts.arch.comment_token(), line.trim_start());
                self.emit(&commented);
                return Ok(());
            }
        }

        if features.thumb_func_tagging {
            if let Some(target) = branch_target(&line) {
                if self.thumb_labels.contains(target) {
                    let marker = format!("\t.thumb_func {target}");
                    self.emit(&marker);
                } else if is_call_symbol(target) && !self.labels_seen.contains(target) {
                    self.call_targets.insert(target.to_string());
                }
            }
        }

        self.emit(&line);
        Ok(())
    }

    fn apply_apple_renames(&self, line: &str) -> String {
        let Some((indent, mnemonic, operands)) = split_stmt(line) else {
            return line.to_string();
        };
        let renamed = match mnemonic {
            ".int" => ".long",
            ".float" => ".single",
            _ => mnemonic,
        };
        if renamed != mnemonic {
            return format!("{indent}{renamed} {operands}");
        }
        // Old Apple gas lacks the UAL spelling of the flag transfer.
        if self.opts.dialect == Dialect::AppleGas
            && self.opts.arch == Arch::Arm
            && mnemonic == "vmrs"
        {
            if let Some(rest) = operands.strip_prefix("APSR_nzcv") {
                return format!("{indent}fmrx r15{rest}");
            }
        }
        line.to_string()
    }
}

/// Strip the leading dot from `.L`-prefixed local labels, both at
/// definitions and at every use.
pub(crate) fn strip_local_label_dots(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut idx = 0;
    let mut prev_ident = false;
    while idx < line.len() {
        let c = line[idx..].chars().next().expect("in-bounds char");
        if c == '.' && !prev_ident && line[idx..].starts_with(".L") {
            idx += 1;
            prev_ident = false;
            continue;
        }
        out.push(c);
        idx += c.len_utf8();
        prev_ident = c.is_ascii_alphanumeric() || c == '_' || c == '$';
    }
    out
}

/// Extract the target of a branch or call, peeling an optional condition
/// code and `.w` width suffix. `bic` and friends never match because their
/// tails are not condition codes.
pub(crate) fn branch_target(line: &str) -> Option<&str> {
    let (_, rest) = split_label(line);
    let (_, mnemonic, operands) = split_stmt(rest)?;
    let mnemonic = mnemonic.strip_suffix(".w").unwrap_or(mnemonic);
    if !is_branch_mnemonic(mnemonic) {
        return None;
    }
    let target = operands.split(|c: char| c == ',' || c.is_whitespace()).next()?;
    if target.is_empty() {
        return None;
    }
    Some(target)
}

pub(crate) fn is_branch_mnemonic(mnemonic: &str) -> bool {
    for base in ["blx", "bl", "bx", "b"] {
        if mnemonic == base {
            return true;
        }
        if let Some(cond) = mnemonic.strip_prefix(base) {
            if COND_CODES.contains(&cond) {
                return true;
            }
        }
    }
    false
}

/// A symbol worth tracking as a call target: an identifier that is not a
/// register.
pub(crate) fn is_call_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.') {
        return false;
    }
    !is_register_name(name)
}

pub(crate) fn is_register_name(name: &str) -> bool {
    if matches!(name, "lr" | "pc" | "sp" | "fp" | "ip" | "wzr" | "xzr" | "wsp") {
        return true;
    }
    let mut chars = name.chars();
    let prefix = chars.next().unwrap_or('\0');
    if !matches!(prefix, 'r' | 'x' | 'w' | 'v' | 'q' | 'd' | 's' | 'h' | 'b') {
        return false;
    }
    let rest: String = chars.collect();
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_labels_lose_the_dot() {
        assert_eq!(strip_local_label_dots(".Lloop:"), "Lloop:");
        assert_eq!(strip_local_label_dots("\tbne .Lloop"), "\tbne Lloop");
        // Directives and qualified names are untouched.
        assert_eq!(strip_local_label_dots("\t.long 1"), "\t.long 1");
        assert_eq!(strip_local_label_dots("a.Lx"), "a.Lx");
    }

    #[test]
    fn branch_targets_are_extracted() {
        assert_eq!(branch_target("\tbl func"), Some("func"));
        assert_eq!(branch_target("\tbeq.w other"), Some("other"));
        assert_eq!(branch_target("\tbhs done"), Some("done"));
    }

    #[test]
    fn bic_is_not_a_branch() {
        assert_eq!(branch_target("\tbic r0, r1, #3"), None);
        assert!(!is_branch_mnemonic("bic"));
        assert!(is_branch_mnemonic("blt"));
    }

    #[test]
    fn registers_are_not_call_symbols() {
        assert!(!is_call_symbol("lr"));
        assert!(!is_call_symbol("r12"));
        assert!(is_call_symbol("my_func"));
        assert!(!is_call_symbol("1f"));
    }
}
