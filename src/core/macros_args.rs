// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Invocation-argument parsing and body-line substitution for the macro
// table. Split out of macros.rs to keep the capture/definition side small.

use super::{MacroDef, MacroParam};
use crate::core::error::{PpError, PpErrorKind};
use crate::core::expr;
use crate::core::symbols::SymbolTable;

/// One call-site argument with the separator that preceded it, so
/// `:vararg` expansion can reproduce the original spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgToken {
    pub sep: &'static str,
    pub text: String,
}

/// Tokenize a macro invocation's argument text.
///
/// Commas and whitespace both separate arguments; brackets, braces,
/// parentheses and string literals keep their contents together.
pub fn parse_invocation_args(args: &str) -> Vec<ArgToken> {
    let mut tokens: Vec<ArgToken> = Vec::new();
    let mut current = String::new();
    let mut pending_sep: &'static str = "";
    let mut depth = 0i32;
    let mut in_str = false;

    let mut flush = |current: &mut String, sep: &'static str, tokens: &mut Vec<ArgToken>| {
        if !current.is_empty() {
            tokens.push(ArgToken {
                sep,
                text: std::mem::take(current),
            });
        }
    };

    for c in args.chars() {
        match c {
            '"' => {
                in_str = !in_str;
                current.push(c);
            }
            '(' | '[' | '{' if !in_str => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' if !in_str => {
                depth -= 1;
                current.push(c);
            }
            ',' if !in_str && depth == 0 => {
                flush(&mut current, pending_sep, &mut tokens);
                pending_sep = ", ";
            }
            c if c.is_whitespace() && !in_str && depth == 0 => {
                if !current.is_empty() {
                    flush(&mut current, pending_sep, &mut tokens);
                    pending_sep = " ";
                }
            }
            _ => current.push(c),
        }
    }
    flush(&mut current, pending_sep, &mut tokens);
    tokens
}

/// Bind call-site tokens to a definition's parameters.
///
/// Named `key=value` tokens bind first; remaining tokens fill the earliest
/// unbound parameters in declaration order. A `:vararg` final parameter
/// absorbs everything left over with the recorded separators; excess
/// arguments without one are an error. Defaults fill whatever stays
/// unbound.
pub fn bind_macro_args(
    def: &MacroDef,
    tokens: &[ArgToken],
) -> Result<Vec<(String, String)>, PpError> {
    let params = &def.params;
    let mut values: Vec<Option<String>> = vec![None; params.len()];
    let mut positional: Vec<&ArgToken> = Vec::new();

    for token in tokens {
        if let Some((key, value)) = token.text.split_once('=') {
            if let Some(idx) = params.iter().position(|p| p.name == key) {
                values[idx] = Some(value.to_string());
                continue;
            }
        }
        positional.push(token);
    }

    let mut next_token = 0;
    for (idx, param) in params.iter().enumerate() {
        if values[idx].is_some() {
            continue;
        }
        if next_token >= positional.len() {
            break;
        }
        if param.vararg {
            let mut text = positional[next_token].text.clone();
            for token in &positional[next_token + 1..] {
                text.push_str(if token.sep.is_empty() { " " } else { token.sep });
                text.push_str(&token.text);
            }
            values[idx] = Some(text);
            next_token = positional.len();
        } else {
            values[idx] = Some(positional[next_token].text.clone());
            next_token += 1;
        }
    }

    if next_token < positional.len() {
        return Err(PpError::new(
            PpErrorKind::Macro,
            "Too many arguments in macro invocation",
            Some(&positional[next_token].text),
        ));
    }

    Ok(params
        .iter()
        .zip(values)
        .map(|(param, value)| {
            let value = value
                .or_else(|| param.default.clone())
                .unwrap_or_default();
            (param.name.clone(), value)
        })
        .collect())
}

/// Substitute one macro body line.
///
/// `\PARAM` is replaced with its bound value (longest parameter name
/// first), `\@` with the invocation counter, `\()` with nothing. Under
/// altmacro, bare word-bounded parameter names substitute too and `%EXPR`
/// evaluates through the expression evaluator when the text parses.
pub fn substitute_line(
    line: &str,
    bindings: &[(String, String)],
    counter: Option<u32>,
    altmacro: bool,
    symbols: &SymbolTable,
) -> String {
    let mut by_length: Vec<&(String, String)> = bindings.iter().collect();
    by_length.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    let mut out = String::with_capacity(line.len());
    let mut idx = 0;
    let mut prev_ident = false;

    while idx < line.len() {
        let c = line[idx..].chars().next().expect("in-bounds char");

        if c == '\\' && idx + 1 < line.len() {
            let rest = &line[idx + 1..];
            if rest.starts_with('@') {
                if let Some(counter) = counter {
                    out.push_str(&counter.to_string());
                    idx += 2;
                    prev_ident = true;
                    continue;
                }
            }
            if rest.starts_with("()") {
                idx += 3;
                prev_ident = false;
                continue;
            }
            if let Some((name, value)) = match_param(rest, &by_length) {
                out.push_str(value);
                idx += 1 + name.len();
                prev_ident = true;
                continue;
            }
            out.push('\\');
            idx += 1;
            prev_ident = false;
            continue;
        }

        if altmacro && !prev_ident && (c.is_ascii_alphabetic() || c == '_') {
            let end = line[idx..]
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                .map_or(line.len(), |off| idx + off);
            let word = &line[idx..end];
            if let Some((_, value)) = by_length.iter().find(|(name, _)| name == word) {
                out.push_str(value);
                idx = end;
                prev_ident = true;
                continue;
            }
            out.push_str(word);
            idx = end;
            prev_ident = true;
            continue;
        }

        if altmacro && c == '%' {
            let candidate = expression_candidate(&line[idx + 1..]);
            if !candidate.is_empty() {
                if let Ok(value) = expr::eval(candidate, symbols) {
                    out.push_str(&value.to_string());
                    idx += 1 + candidate.len();
                    prev_ident = true;
                    continue;
                }
            }
        }

        out.push(c);
        idx += c.len_utf8();
        prev_ident = c.is_ascii_alphanumeric() || c == '_';
    }

    out
}

fn match_param<'a>(
    rest: &str,
    by_length: &[&'a (String, String)],
) -> Option<(&'a str, &'a str)> {
    for (name, value) in by_length {
        if rest.starts_with(name.as_str()) {
            let boundary = rest[name.len()..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
            if boundary {
                return Some((name, value));
            }
        }
    }
    None
}

/// Longest run after `%` that can form an expression: identifier, number,
/// operator and parenthesis characters up to the first comma, bracket or
/// whitespace at depth zero.
fn expression_candidate(text: &str) -> &str {
    let mut depth = 0i32;
    for (idx, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return &text[..idx];
                }
                depth -= 1;
            }
            ',' | ';' | ']' | '[' | '}' | '{' if depth == 0 => return &text[..idx],
            c if c.is_whitespace() && depth == 0 => return &text[..idx],
            _ => {}
        }
    }
    text
}
