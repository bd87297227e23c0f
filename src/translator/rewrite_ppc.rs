// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

/// Special-purpose registers addressed by mnemonic in gas but by number in
/// the `mtspr`/`mfspr` forms Apple's assembler expects.
const SPR_NUMBERS: &[(&str, u32)] = &[("xer", 1), ("lr", 8), ("ctr", 9), ("vrsave", 256)];

/// PowerPC operand rewrites for Apple-flavoured output: `@l`/`@ha`
/// relocation suffixes become `lo16()`/`ha16()` and SPR moves become
/// numbered `mtspr`/`mfspr`.
pub(crate) fn rewrite_ppc_line(line: &str) -> String {
    let line = rewrite_reloc_suffixes(line);

    let Some((indent, mnemonic, operands)) = split_stmt(&line) else {
        return line;
    };
    if let Some(spr) = mnemonic.strip_prefix("mt") {
        if let Some(num) = spr_number(spr) {
            return format!("{indent}mtspr {num}, {operands}");
        }
    }
    if let Some(spr) = mnemonic.strip_prefix("mf") {
        if let Some(num) = spr_number(spr) {
            return format!("{indent}mfspr {operands}, {num}");
        }
    }
    line
}

fn spr_number(name: &str) -> Option<u32> {
    SPR_NUMBERS
        .iter()
        .find(|(spr, _)| *spr == name)
        .map(|(_, num)| *num)
}

fn rewrite_reloc_suffixes(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(pos) = rest.find('@') {
        let (head, tail) = rest.split_at(pos);
        let (wrapper, suffix_len) = if tail.starts_with("@ha") {
            ("ha16", 3)
        } else if tail.starts_with("@l") {
            ("lo16", 2)
        } else {
            out.push_str(head);
            out.push('@');
            rest = &tail[1..];
            continue;
        };
        let sym_start = head
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .map_or(0, |idx| idx + 1);
        out.push_str(&head[..sym_start]);
        out.push_str(wrapper);
        out.push('(');
        out.push_str(&head[sym_start..]);
        out.push(')');
        rest = &tail[suffix_len..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reloc_suffixes_become_wrappers() {
        assert_eq!(
            rewrite_ppc_line("\tlis r3, sym@ha"),
            "\tlis r3, ha16(sym)"
        );
        assert_eq!(
            rewrite_ppc_line("\taddi r3, r3, sym@l"),
            "\taddi r3, r3, lo16(sym)"
        );
    }

    #[test]
    fn known_sprs_become_numbered_moves() {
        assert_eq!(rewrite_ppc_line("\tmtctr r3"), "\tmtspr 9, r3");
        assert_eq!(rewrite_ppc_line("\tmfvrsave r4"), "\tmfspr r4, 256");
    }

    #[test]
    fn unknown_sprs_pass_through() {
        assert_eq!(rewrite_ppc_line("\tmtmsr r3"), "\tmtmsr r3");
        assert_eq!(rewrite_ppc_line("\tadd r3, r4, r5"), "\tadd r3, r4, r5");
    }
}
