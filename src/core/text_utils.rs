// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Small text helpers shared by the reader and the rewriters.

/// True for characters that may appear inside an identifier.
pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$'
}

/// First whitespace-delimited word of `s`, if any.
pub fn first_word(s: &str) -> Option<&str> {
    s.split_whitespace().next()
}

/// Split `line` into an optional leading `label:` and the remainder.
///
/// The label must start the line (after indentation) and consist of
/// identifier characters only. Numeric local labels (`1:`) count.
pub fn split_label(line: &str) -> (Option<&str>, &str) {
    let trimmed = line.trim_start();
    let mut end = 0;
    for (idx, c) in trimmed.char_indices() {
        if c == ':' {
            end = idx;
            break;
        }
        if !is_ident_char(c) {
            return (None, line);
        }
    }
    if end == 0 {
        return (None, line);
    }
    let label = &trimmed[..end];
    let rest = &trimmed[end + 1..];
    (Some(label), rest)
}

/// Replace every word-bounded occurrence of `from` in `line` with `to`.
pub fn replace_word(line: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        match rest.find(from) {
            Some(pos) => {
                let before_ok = out
                    .chars()
                    .chain(rest[..pos].chars())
                    .last()
                    .map_or(true, |c| !is_ident_char(c));
                let after = rest[pos + from.len()..].chars().next();
                let after_ok = after.map_or(true, |c| !is_ident_char(c));
                out.push_str(&rest[..pos]);
                if before_ok && after_ok {
                    out.push_str(to);
                } else {
                    out.push_str(from);
                }
                rest = &rest[pos + from.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Find the byte offset of a word-bounded occurrence of `word` in `line`.
pub fn find_word(line: &str, word: &str) -> Option<usize> {
    let mut start = 0;
    while let Some(pos) = line[start..].find(word) {
        let abs = start + pos;
        let before_ok = line[..abs].chars().last().map_or(true, |c| !is_ident_char(c));
        let after_ok = line[abs + word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident_char(c));
        if before_ok && after_ok {
            return Some(abs);
        }
        start = abs + word.len().max(1);
    }
    None
}

/// Split a statement into (indent, mnemonic, operand text).
///
/// Returns `None` for blank lines.
pub fn split_stmt(line: &str) -> Option<(&str, &str, &str)> {
    let body_start = line.len() - line.trim_start().len();
    let indent = &line[..body_start];
    let body = &line[body_start..];
    if body.is_empty() {
        return None;
    }
    let mn_end = body
        .find(|c: char| c.is_whitespace())
        .unwrap_or(body.len());
    let mnemonic = &body[..mn_end];
    let operands = body[mn_end..].trim_start();
    Some((indent, mnemonic, operands))
}

/// Split `s` on top-level commas, honouring (), [], {} nesting and quotes.
pub fn split_operands(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_str = false;
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        match c {
            '"' => in_str = !in_str,
            '(' | '[' | '{' if !in_str => depth += 1,
            ')' | ']' | '}' if !in_str => depth -= 1,
            ',' if !in_str && depth == 0 => {
                parts.push(s[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_label_plain() {
        let (label, rest) = split_label("foo: mov r0, r1");
        assert_eq!(label, Some("foo"));
        assert_eq!(rest.trim(), "mov r0, r1");
    }

    #[test]
    fn split_label_numeric_and_none() {
        assert_eq!(split_label("1:").0, Some("1"));
        assert_eq!(split_label("  mov r0, r1").0, None);
        assert_eq!(split_label("mov r0, [r1]").0, None);
    }

    #[test]
    fn replace_word_respects_boundaries() {
        assert_eq!(replace_word("add foo, foobar", "foo", "r0"), "add r0, foobar");
        assert_eq!(replace_word("bic r0, r1", "b", "x"), "bic r0, r1");
    }

    #[test]
    fn split_stmt_separates_mnemonic() {
        let (indent, mn, ops) = split_stmt("\tadd r0, r1, #2").unwrap();
        assert_eq!(indent, "\t");
        assert_eq!(mn, "add");
        assert_eq!(ops, "r0, r1, #2");
    }

    #[test]
    fn split_operands_honours_nesting() {
        assert_eq!(
            split_operands("r0, [r1, #4], {v0.8b, v1.8b}"),
            vec!["r0", "[r1, #4]", "{v0.8b, v1.8b}"]
        );
    }
}
