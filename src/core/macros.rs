// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Macro table implementing gas-style .macro/.endm definitions with
// positional, named, default and :vararg parameters.

use std::collections::HashMap;

use crate::core::error::{PpError, PpErrorKind};

#[path = "macros_args.rs"]
mod macros_args;
pub use macros_args::{bind_macro_args, parse_invocation_args, substitute_line, ArgToken};

/// One macro parameter.
#[derive(Debug, Clone)]
pub struct MacroParam {
    pub name: String,
    pub default: Option<String>,
    pub vararg: bool,
}

/// A captured macro definition.
#[derive(Debug, Clone)]
pub struct MacroDef {
    pub params: Vec<MacroParam>,
    pub body: Vec<String>,
}

/// Table of defined macros.
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<String, MacroDef>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Insert or replace a definition. Redefinition is allowed; the last
    /// definition wins.
    pub fn define(&mut self, name: &str, def: MacroDef) {
        self.macros.insert(name.to_string(), def);
    }

    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    pub fn purge(&mut self, name: &str) -> Result<(), PpError> {
        match self.macros.remove(name) {
            Some(_) => Ok(()),
            None => Err(PpError::new(
                PpErrorKind::Macro,
                ".purgem of undefined macro",
                Some(name),
            )),
        }
    }
}

/// Parse the remainder of a `.macro` line into (name, parameters).
///
/// Parameters are separated by whitespace and/or commas. Each may carry a
/// `=default` and the last may carry `:vararg` (with an optional default
/// after it).
pub fn parse_macro_header(rest: &str) -> Result<(String, Vec<MacroParam>), PpError> {
    let rest = rest.trim();
    let name_end = rest
        .find(|c: char| c.is_whitespace() || c == ',')
        .unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        return Err(PpError::new(
            PpErrorKind::Macro,
            ".macro directive requires a name",
            None,
        ));
    }

    let mut params = Vec::new();
    for part in rest[name_end..]
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
    {
        params.push(parse_param(part)?);
    }

    if params
        .iter()
        .rev()
        .skip(1)
        .any(|p| p.vararg)
    {
        return Err(PpError::new(
            PpErrorKind::Macro,
            "Only the last macro parameter may be :vararg",
            Some(name),
        ));
    }

    Ok((name.to_string(), params))
}

fn parse_param(part: &str) -> Result<MacroParam, PpError> {
    let (head, default) = match part.split_once('=') {
        Some((head, default)) => (head, Some(default.to_string())),
        None => (part, None),
    };
    let (name, vararg) = match head.split_once(':') {
        Some((name, "vararg")) => (name, true),
        Some((_, qualifier)) => {
            return Err(PpError::new(
                PpErrorKind::Macro,
                "Unknown macro parameter qualifier",
                Some(qualifier),
            ));
        }
        None => (head, false),
    };
    if name.is_empty() {
        return Err(PpError::new(
            PpErrorKind::Macro,
            "Empty macro parameter name",
            Some(part),
        ));
    }
    Ok(MacroParam {
        name: name.to_string(),
        default,
        vararg,
    })
}
