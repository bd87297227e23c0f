// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Symbol and register-alias tables.
//!
//! Symbols come from `.set`/`.equ` and feed the expression evaluator; for
//! armasm output their values are also substituted textually into every
//! line. Register aliases come from `.req`/`.unreq` (general registers,
//! resolved transitively) and from the NEON `.dn`/`.qn` directives
//! (alias plus optional datatype).

use std::collections::HashMap;

use crate::core::text_utils::replace_word;

/// Integer symbols defined with `.set`/`.equ`.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<String, i64>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: i64) {
        self.entries.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Substitute every known symbol into `line`, word-bounded, longest
    /// name first so that a symbol never captures a prefix of another.
    pub fn substitute_all(&self, line: &str) -> String {
        if self.entries.is_empty() {
            return line.to_string();
        }
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let mut out = line.to_string();
        for name in names {
            if out.contains(name.as_str()) {
                out = replace_word(&out, name, &self.entries[name].to_string());
            }
        }
        out
    }
}

/// General register aliases from `.req`, resolved to their fixed point.
#[derive(Debug, Default)]
pub struct RegisterAliases {
    map: HashMap<String, String>,
}

impl RegisterAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, alias: &str, target: &str) {
        self.map.insert(alias.to_string(), target.to_string());
    }

    pub fn remove(&mut self, alias: &str) {
        self.map.remove(alias);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Resolve an alias chain (`b .req a`, `c .req b`) to the final
    /// register. Cycles are cut by bounding the walk at the table size.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        for _ in 0..=self.map.len() {
            match self.map.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Replace every aliased register in `line` with its resolution.
    pub fn apply(&self, line: &str) -> String {
        if self.map.is_empty() {
            return line.to_string();
        }
        let mut names: Vec<&String> = self.map.keys().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let mut out = line.to_string();
        for name in names {
            if out.contains(name.as_str()) {
                out = replace_word(&out, name, self.resolve(name));
            }
        }
        out
    }
}

/// One NEON alias from `.dn`/`.qn`: a register token and an optional
/// datatype suffix injected into the mnemonic at first use.
#[derive(Debug, Clone)]
pub struct NeonAlias {
    pub name: String,
    pub register: String,
    pub datatype: Option<String>,
}

/// Table of NEON `.dn`/`.qn` aliases.
#[derive(Debug, Default)]
pub struct NeonAliasTable {
    aliases: Vec<NeonAlias>,
}

impl NeonAliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn define(&mut self, name: &str, register: &str, datatype: Option<&str>) {
        self.aliases.retain(|a| a.name != name);
        self.aliases.push(NeonAlias {
            name: name.to_string(),
            register: register.to_string(),
            datatype: datatype.map(|d| d.to_string()),
        });
    }

    /// Aliases in longest-name-first order for safe substitution.
    pub fn by_length(&self) -> Vec<&NeonAlias> {
        let mut out: Vec<&NeonAlias> = self.aliases.iter().collect();
        out.sort_by(|a, b| b.name.len().cmp(&a.name.len()).then_with(|| a.name.cmp(&b.name)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_all_prefers_longest_symbol() {
        let mut syms = SymbolTable::new();
        syms.set("SIZE", 4);
        syms.set("SIZE_LOG2", 2);
        assert_eq!(
            syms.substitute_all("mov r0, #SIZE_LOG2 + SIZE"),
            "mov r0, #2 + 4"
        );
    }

    #[test]
    fn substitute_all_is_word_bounded() {
        let mut syms = SymbolTable::new();
        syms.set("N", 3);
        assert_eq!(syms.substitute_all("ldr rN, NEXT"), "ldr rN, NEXT");
        assert_eq!(syms.substitute_all("mov r0, #N"), "mov r0, #3");
    }

    #[test]
    fn req_aliases_resolve_transitively() {
        let mut req = RegisterAliases::new();
        req.define("base", "x0");
        req.define("src", "base");
        assert_eq!(req.resolve("src"), "x0");
        assert_eq!(req.apply("ldr x1, [src]"), "ldr x1, [x0]");
        req.remove("src");
        assert_eq!(req.resolve("src"), "src");
    }

    #[test]
    fn req_alias_cycle_terminates() {
        let mut req = RegisterAliases::new();
        req.define("a", "b");
        req.define("b", "a");
        // Either side of the cycle is acceptable; the walk must stop.
        let resolved = req.resolve("a");
        assert!(resolved == "a" || resolved == "b");
    }

    #[test]
    fn neon_alias_redefinition_replaces() {
        let mut neon = NeonAliasTable::new();
        neon.define("acc", "d0", Some("s16"));
        neon.define("acc", "d1", None);
        let aliases = neon.by_length();
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].register, "d1");
        assert!(aliases[0].datatype.is_none());
    }
}
