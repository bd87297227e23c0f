// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Line reader for the already-C-preprocessed input stream.
//!
//! Normalization order: drop `#`-led linemarker/comment lines, strip
//! trailing comments at the architecture's comment token (except
//! `\`-escaped occurrences), drop carriage returns, join `\`-continued
//! lines, and split on `;` into sub-lines. String literals are opaque to
//! both comment stripping and `;` splitting.

/// Strip a trailing comment introduced by `comment`, ignoring occurrences
/// inside string literals and occurrences escaped with `\`.
pub fn strip_comment<'a>(line: &'a str, comment: &str) -> &'a str {
    let bytes = line.as_bytes();
    let mut in_str = false;
    let mut idx = 0;
    while idx < bytes.len() {
        let c = bytes[idx];
        if c == b'"' {
            in_str = !in_str;
            idx += 1;
            continue;
        }
        if !in_str && line[idx..].starts_with(comment) {
            let escaped = idx > 0 && bytes[idx - 1] == b'\\';
            if !escaped {
                return &line[..idx];
            }
        }
        idx += 1;
    }
    line
}

/// Split a joined physical line on `;` outside string literals.
fn split_sublines(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_str = false;
    let mut start = 0;
    for (idx, c) in line.char_indices() {
        match c {
            '"' => in_str = !in_str,
            ';' if !in_str => {
                parts.push(&line[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&line[start..]);
    parts
}

/// Produce the stream of logical lines from raw preprocessed source.
pub fn logical_lines(source: &str, comment: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = String::new();

    for raw in source.lines() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(head) = raw.strip_suffix('\\') {
            pending.push_str(head);
            continue;
        }
        pending.push_str(raw);
        let joined = std::mem::take(&mut pending);

        if joined.trim_start().starts_with('#') {
            continue;
        }
        let stripped = strip_comment(&joined, comment);
        for part in split_sublines(stripped) {
            out.push(part.to_string());
        }
    }
    if !pending.is_empty() {
        let joined = pending;
        if !joined.trim_start().starts_with('#') {
            let stripped = strip_comment(&joined, comment);
            for part in split_sublines(stripped) {
                out.push(part.to_string());
            }
        }
    }
    out
}
