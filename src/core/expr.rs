// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Integer expression evaluation.
//!
//! Shared evaluator used by the conditional directives (`.if*`), repetition
//! counts (`.rept`), the immediate heuristics of the rewriters, and the
//! armasm comparison simplifier. Identifiers resolve through the symbol
//! table; an unresolved identifier is an error, which tolerant call sites
//! treat as a zero/false result.

use crate::core::symbols::SymbolTable;

/// Error returned from expression evaluation.
#[derive(Debug, Clone)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Evaluate `expr` to an integer with C-like operator precedence.
pub fn eval(expr: &str, symbols: &SymbolTable) -> Result<i64, EvalError> {
    let mut p = Parser {
        src: expr.as_bytes(),
        pos: 0,
        symbols,
    };
    p.skip_ws();
    if p.pos >= p.src.len() {
        return Err(EvalError::new("Empty expression"));
    }
    let val = p.parse_logical_or()?;
    p.skip_ws();
    if p.pos < p.src.len() {
        return Err(EvalError::new(format!(
            "Trailing characters in expression: {}",
            expr
        )));
    }
    Ok(val)
}

/// Recursive-descent parser over the expression bytes.
///
/// Precedence (lowest to highest): `||`, `&&`, `|`, `^`, `&`, `== !=`,
/// `< > <= >=`, `<< >>`, `+ -`, `* / %`, unary `! - ~ +`, atoms.
struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    symbols: &'a SymbolTable,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn eat2(&mut self, c1: u8, c2: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(c1) && self.peek2() == Some(c2) {
            self.pos += 2;
            true
        } else {
            false
        }
    }

    fn eat1_not(&mut self, c: u8, not_followed_by: &[u8]) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            if let Some(next) = self.peek2() {
                if not_followed_by.contains(&next) {
                    return false;
                }
            }
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_logical_or(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_logical_and()?;
        while self.eat2(b'|', b'|') {
            let r = self.parse_logical_and()?;
            v = i64::from(v != 0 || r != 0);
        }
        Ok(v)
    }

    fn parse_logical_and(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_bit_or()?;
        while self.eat2(b'&', b'&') {
            let r = self.parse_bit_or()?;
            v = i64::from(v != 0 && r != 0);
        }
        Ok(v)
    }

    fn parse_bit_or(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_bit_xor()?;
        while self.eat1_not(b'|', b"|") {
            v |= self.parse_bit_xor()?;
        }
        Ok(v)
    }

    fn parse_bit_xor(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_bit_and()?;
        while self.eat1_not(b'^', b"") {
            v ^= self.parse_bit_and()?;
        }
        Ok(v)
    }

    fn parse_bit_and(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_equality()?;
        while self.eat1_not(b'&', b"&") {
            v &= self.parse_equality()?;
        }
        Ok(v)
    }

    fn parse_equality(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_relational()?;
        loop {
            if self.eat2(b'=', b'=') {
                let r = self.parse_relational()?;
                v = i64::from(v == r);
            } else if self.eat2(b'!', b'=') {
                let r = self.parse_relational()?;
                v = i64::from(v != r);
            } else if self.eat2(b'<', b'>') {
                let r = self.parse_relational()?;
                v = i64::from(v != r);
            } else {
                return Ok(v);
            }
        }
    }

    fn parse_relational(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_shift()?;
        loop {
            if self.eat2(b'<', b'=') {
                let r = self.parse_shift()?;
                v = i64::from(v <= r);
            } else if self.eat2(b'>', b'=') {
                let r = self.parse_shift()?;
                v = i64::from(v >= r);
            } else if self.eat1_not(b'<', b"<=>") {
                let r = self.parse_shift()?;
                v = i64::from(v < r);
            } else if self.eat1_not(b'>', b">=") {
                let r = self.parse_shift()?;
                v = i64::from(v > r);
            } else {
                return Ok(v);
            }
        }
    }

    fn parse_shift(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_additive()?;
        loop {
            if self.eat2(b'<', b'<') {
                let r = self.parse_additive()?;
                v = if (0..64).contains(&r) {
                    v.wrapping_shl(r as u32)
                } else {
                    0
                };
            } else if self.eat2(b'>', b'>') {
                let r = self.parse_additive()?;
                v = if (0..64).contains(&r) {
                    v.wrapping_shr(r as u32)
                } else {
                    0
                };
            } else {
                return Ok(v);
            }
        }
    }

    fn parse_additive(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_multiplicative()?;
        loop {
            if self.eat1_not(b'+', b"") {
                v = v.wrapping_add(self.parse_multiplicative()?);
            } else if self.eat1_not(b'-', b"") {
                v = v.wrapping_sub(self.parse_multiplicative()?);
            } else {
                return Ok(v);
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<i64, EvalError> {
        let mut v = self.parse_unary()?;
        loop {
            if self.eat1_not(b'*', b"") {
                v = v.wrapping_mul(self.parse_unary()?);
            } else if self.eat1_not(b'/', b"") {
                let r = self.parse_unary()?;
                if r == 0 {
                    return Err(EvalError::new("Division by zero"));
                }
                v /= r;
            } else if self.eat1_not(b'%', b"") {
                let r = self.parse_unary()?;
                if r == 0 {
                    return Err(EvalError::new("Division by zero"));
                }
                v %= r;
            } else {
                return Ok(v);
            }
        }
    }

    fn parse_unary(&mut self) -> Result<i64, EvalError> {
        self.skip_ws();
        match self.peek() {
            Some(b'!') if self.peek2() != Some(b'=') => {
                self.pos += 1;
                Ok(i64::from(self.parse_unary()? == 0))
            }
            Some(b'-') => {
                self.pos += 1;
                Ok(self.parse_unary()?.wrapping_neg())
            }
            Some(b'+') => {
                self.pos += 1;
                self.parse_unary()
            }
            Some(b'~') => {
                self.pos += 1;
                Ok(!self.parse_unary()?)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<i64, EvalError> {
        self.skip_ws();
        let ch = self
            .peek()
            .ok_or_else(|| EvalError::new("Unexpected end of expression"))?;

        if ch == b'(' {
            self.pos += 1;
            let v = self.parse_logical_or()?;
            self.skip_ws();
            if self.peek() != Some(b')') {
                return Err(EvalError::new("Missing closing parenthesis"));
            }
            self.pos += 1;
            return Ok(v);
        }

        if ch.is_ascii_digit() {
            return self.parse_number();
        }

        if ch == b'\'' {
            if let (Some(c), Some(b'\'')) = (self.peek2(), self.src.get(self.pos + 2).copied()) {
                self.pos += 3;
                return Ok(c as i64);
            }
            return Err(EvalError::new("Malformed character literal"));
        }

        if ch.is_ascii_alphabetic() || ch == b'_' || ch == b'.' {
            let start = self.pos;
            while self.pos < self.src.len() {
                let c = self.src[self.pos];
                if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            let name = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
            return self
                .symbols
                .get(name)
                .ok_or_else(|| EvalError::new(format!("Undefined symbol: {name}")));
        }

        Err(EvalError::new(format!(
            "Unexpected character in expression: {}",
            ch as char
        )))
    }

    fn parse_number(&mut self) -> Result<i64, EvalError> {
        if self.peek() == Some(b'0') {
            match self.peek2() {
                Some(b'x') | Some(b'X') => {
                    self.pos += 2;
                    return self.parse_radix(16, |c| c.is_ascii_hexdigit());
                }
                Some(b'b') | Some(b'B') => {
                    self.pos += 2;
                    return self.parse_radix(2, |c| matches!(c, b'0' | b'1'));
                }
                _ => {}
            }
        }
        self.parse_radix(10, |c| c.is_ascii_digit())
    }

    fn parse_radix(&mut self, radix: u32, digit: fn(u8) -> bool) -> Result<i64, EvalError> {
        let start = self.pos;
        while self.pos < self.src.len() && digit(self.src[self.pos]) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(EvalError::new("Malformed number"));
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("0");
        i64::from_str_radix(text, radix)
            .map_err(|_| EvalError::new(format!("Number out of range: {text}")))
    }
}
