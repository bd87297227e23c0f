// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

impl Translator {
    /// Handle the conditional-assembly directives. These are processed even
    /// while output is suppressed so nesting stays balanced.
    pub(crate) fn handle_conditional_directive(
        &mut self,
        trimmed: &str,
    ) -> Result<bool, PpError> {
        let Some(word) = first_word(trimmed) else {
            return Ok(false);
        };
        let rest = trimmed[word.len()..].trim();

        match word {
            ".endif" => {
                self.cond
                    .handle_endif()
                    .map_err(|err| err.with_line(self.line_num))?;
                Ok(true)
            }
            ".else" => {
                self.cond
                    .handle_else()
                    .map_err(|err| err.with_line(self.line_num))?;
                Ok(true)
            }
            ".elseif" => {
                let taken = self.eval_tolerant(rest) != 0;
                self.cond
                    .handle_elseif(|| taken)
                    .map_err(|err| err.with_line(self.line_num))?;
                Ok(true)
            }
            _ if word.starts_with(".if") => {
                let taken = if self.cond.active() {
                    self.evaluate_if_variant(&word[3..], rest)?
                } else {
                    false
                };
                self.cond.push_if(taken);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn evaluate_if_variant(&self, suffix: &str, rest: &str) -> Result<bool, PpError> {
        let (negated, variant) = match suffix.strip_prefix('n') {
            // .ifnc/.ifnb/.ifn; note .ifne is not a negated .ife.
            Some(tail) if matches!(tail, "" | "b" | "c") => (true, tail),
            _ => (false, suffix),
        };
        let base = match variant {
            "" => self.eval_tolerant(rest) != 0,
            "b" => rest.is_empty(),
            "c" => {
                let Some((a, b)) = rest.split_once(',') else {
                    return Err(self.fail(
                        PpErrorKind::Directive,
                        ".ifc requires two comma-separated operands",
                        Some(rest),
                    ));
                };
                a.trim() == b.trim()
            }
            "eq" => self.eval_tolerant(rest) == 0,
            "lt" => self.eval_tolerant(rest) < 0,
            _ => {
                return Err(self.fail(
                    PpErrorKind::Directive,
                    "Unknown .if variant",
                    Some(variant),
                ));
            }
        };
        Ok(base != negated)
    }

    /// Handle state-changing directives. Returns true when the line was
    /// consumed; lines that only need rewriting flow onwards.
    pub(crate) fn handle_directive(
        &mut self,
        line: &str,
        trimmed: &str,
    ) -> Result<bool, PpError> {
        // Alias directives carry the directive in second position.
        let mut words = trimmed.split_whitespace();
        let first = words.next().unwrap_or("");
        let second = words.next().unwrap_or("");
        match second {
            ".req" => return self.handle_req(line, first, words.next().unwrap_or("")),
            ".dn" | ".qn" => {
                let target = trimmed[trimmed.find(second).expect("second word") + second.len()..]
                    .trim();
                return self.handle_neon_alias(first, target);
            }
            _ => {}
        }

        if !first.starts_with('.') {
            return Ok(false);
        }
        let rest = trimmed[first.len()..].trim();

        match first {
            ".macro" => {
                let (name, params) =
                    parse_macro_header(rest).map_err(|err| err.with_line(self.line_num))?;
                self.capture = Some(Capture::Macro {
                    name,
                    params,
                    depth: 1,
                    body: Vec::new(),
                });
                Ok(true)
            }
            ".endm" => Err(self.fail(
                PpErrorKind::Directive,
                ".endm found without matching .macro",
                None,
            )),
            ".endr" => Err(self.fail(
                PpErrorKind::Directive,
                ".endr found without matching .rept",
                None,
            )),
            ".purgem" => {
                self.macros
                    .purge(rest)
                    .map_err(|err| err.with_line(self.line_num))?;
                Ok(true)
            }
            ".rept" => {
                let (count, extra) = self.parse_rept_count(rest)?;
                let mut body = Vec::new();
                if !extra.is_empty() {
                    body.push(extra.to_string());
                }
                self.capture = Some(Capture::Repeat {
                    kind: RepeatKind::Rept { count },
                    depth: 1,
                    body,
                });
                Ok(true)
            }
            ".irp" => {
                let (param, values) = split_irp_header(rest);
                let values = values
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect();
                self.capture = Some(Capture::Repeat {
                    kind: RepeatKind::Irp {
                        param: param.to_string(),
                        values,
                    },
                    depth: 1,
                    body: Vec::new(),
                });
                Ok(true)
            }
            ".irpc" => {
                let (param, values) = split_irp_header(rest);
                let chars = values.trim_matches('"').to_string();
                self.capture = Some(Capture::Repeat {
                    kind: RepeatKind::Irpc {
                        param: param.to_string(),
                        chars,
                    },
                    depth: 1,
                    body: Vec::new(),
                });
                Ok(true)
            }
            ".altmacro" => {
                self.altmacro = true;
                Ok(true)
            }
            ".noaltmacro" => {
                self.altmacro = false;
                Ok(true)
            }
            ".set" | ".equ" => {
                if let Some((name, value)) = rest.split_once(',') {
                    if let Ok(value) = expr::eval(value.trim(), &self.symbols) {
                        self.symbols.set(name.trim(), value);
                    }
                }
                // armasm sees substituted values instead of the directive.
                Ok(self.opts.dialect == Dialect::Armasm)
            }
            ".unreq" => self.handle_unreq(rest),
            ".ltorg" => {
                if self.opts.dialect == Dialect::Armasm {
                    self.emit("\tLTORG");
                } else {
                    self.flush_literals();
                }
                Ok(true)
            }
            ".code" => {
                match rest {
                    "16" => self.thumb = true,
                    "32" => self.thumb = self.opts.force_thumb,
                    _ => {}
                }
                match self.opts.dialect {
                    Dialect::Armasm => {
                        self.emit(if self.thumb { "\tTHUMB" } else { "\tARM" });
                    }
                    _ => self.emit(line),
                }
                Ok(true)
            }
            ".thumb" => {
                self.thumb = true;
                match self.opts.dialect {
                    Dialect::Armasm => self.emit("\tTHUMB"),
                    _ => self.emit(line),
                }
                Ok(true)
            }
            ".arm" => {
                if self.opts.force_thumb {
                    self.thumb = true;
                    self.emit("\t.thumb");
                    return Ok(true);
                }
                self.thumb = false;
                match self.opts.dialect {
                    Dialect::Armasm => self.emit("\tARM"),
                    _ => self.emit(line),
                }
                Ok(true)
            }
            ".text" | ".data" | ".rodata" | ".const_data" | ".bss" | ".section" => {
                self.enter_section(trimmed)?;
                Ok(true)
            }
            ".previous" => {
                if self.section_stack.len() < 2 {
                    return Err(self.fail(
                        PpErrorKind::Directive,
                        ".previous found without a prior section",
                        None,
                    ));
                }
                self.section_stack.pop();
                let prev = self.section_stack.last().cloned().expect("prior section");
                self.emit_section_directive(&prev)?;
                Ok(true)
            }
            ".global" | ".globl" => self.handle_global(line, rest),
            ".extern" => {
                match self.opts.dialect {
                    Dialect::Armasm => {
                        self.labels_seen.insert(rest.to_string());
                        let import = format!("\tIMPORT {rest}");
                        self.emit(&import);
                    }
                    _ => self.emit(line),
                }
                Ok(true)
            }
            ".func" => self.handle_func(rest),
            ".endfunc" => {
                match self.opts.dialect {
                    Dialect::Armasm => self.emit("\tENDP"),
                    _ => return Ok(false),
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn parse_rept_count<'a>(&self, rest: &'a str) -> Result<(i64, &'a str), PpError> {
        if rest.is_empty() {
            return Err(self.fail(
                PpErrorKind::Directive,
                ".rept requires a repeat count",
                None,
            ));
        }
        if let Ok(count) = expr::eval(rest, &self.symbols) {
            return Ok((count, ""));
        }
        // A directive may follow the count on the same line; take the
        // longest prefix that evaluates and treat the tail as body.
        let boundaries: Vec<usize> = rest
            .char_indices()
            .filter(|(_, c)| c.is_whitespace())
            .map(|(idx, _)| idx)
            .collect();
        for idx in boundaries.into_iter().rev() {
            if let Ok(count) = expr::eval(&rest[..idx], &self.symbols) {
                return Ok((count, rest[idx..].trim()));
            }
        }
        Err(self.fail(
            PpErrorKind::Expression,
            "Invalid .rept count",
            Some(rest),
        ))
    }

    fn handle_req(&mut self, line: &str, alias: &str, target: &str) -> Result<bool, PpError> {
        let track = self.opts.arch == Arch::Aarch64 || self.opts.dialect == Dialect::Armasm;
        if !track {
            return Ok(false);
        }
        if alias.is_empty() || target.is_empty() {
            return Err(self.fail(
                PpErrorKind::Directive,
                ".req requires an alias and a register",
                Some(line.trim()),
            ));
        }
        self.req_aliases.define(alias, target);
        if self.opts.dialect != Dialect::Armasm {
            self.emit(line);
        }
        Ok(true)
    }

    fn handle_unreq(&mut self, alias: &str) -> Result<bool, PpError> {
        self.req_aliases.remove(alias);
        match self.opts.dialect {
            Dialect::Armasm => {}
            _ if self.opts.fix_unreq => {
                // Old gas kept both spellings on .req; drop them both.
                let lower = format!("\t.unreq {}", alias.to_ascii_lowercase());
                let upper = format!("\t.unreq {}", alias.to_ascii_uppercase());
                self.emit(&lower);
                self.emit(&upper);
            }
            _ => {
                let raw = format!("\t.unreq {alias}");
                self.emit(&raw);
            }
        }
        Ok(true)
    }

    fn handle_neon_alias(&mut self, name: &str, target: &str) -> Result<bool, PpError> {
        if self.opts.arch != Arch::Arm {
            return Ok(false);
        }
        if name.is_empty() || target.is_empty() {
            return Err(self.fail(
                PpErrorKind::Directive,
                ".dn/.qn requires an alias and a register",
                None,
            ));
        }
        let (register, datatype) = match target.split_once('.') {
            Some((reg, tail)) => {
                let (dtype, index) = match tail.find('[') {
                    Some(pos) => (&tail[..pos], &tail[pos..]),
                    None => (tail, ""),
                };
                (format!("{reg}{index}"), Some(dtype))
            }
            None => (target.to_string(), None),
        };
        self.neon.define(name, &register, datatype);
        Ok(true)
    }

    fn handle_global(&mut self, line: &str, name: &str) -> Result<bool, PpError> {
        match self.opts.dialect {
            Dialect::Armasm => {
                self.labels_seen.insert(name.to_string());
                let export = format!("\tEXPORT {name}");
                self.emit(&export);
            }
            dialect if dialect.features().apple_renames => {
                if dialect.features().thumb_func_tagging {
                    if self.thumb_labels.contains(name) {
                        let marker = format!("\t.thumb_func {name}");
                        self.emit(&marker);
                    } else {
                        self.call_targets.insert(name.to_string());
                    }
                }
                let globl = format!("\t.globl {name}");
                self.emit(&globl);
            }
            _ => self.emit(line),
        }
        Ok(true)
    }

    fn handle_func(&mut self, name: &str) -> Result<bool, PpError> {
        match self.opts.dialect {
            Dialect::Armasm => {
                let name = first_word(name).unwrap_or(name);
                if name.is_empty() {
                    return Err(self.fail(
                        PpErrorKind::Directive,
                        ".func requires a name for PROC",
                        None,
                    ));
                }
                self.labels_seen.insert(name.to_string());
                let proc = format!("{name} PROC");
                self.emit(&proc);
                Ok(true)
            }
            dialect if dialect.features().thumb_func_tagging => {
                self.emit("\t.thumb_func");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Record a section directive and emit its dialect translation.
    pub(crate) fn enter_section(&mut self, directive: &str) -> Result<(), PpError> {
        self.section_stack.push(directive.to_string());
        let directive = directive.to_string();
        self.emit_section_directive(&directive)
    }

    pub(crate) fn emit_section_directive(&mut self, directive: &str) -> Result<(), PpError> {
        if self.opts.dialect == Dialect::Armasm {
            let area = armasm_area(directive);
            self.emit(&area);
            return Ok(());
        }
        let word = first_word(directive).unwrap_or(directive);
        let rest = directive[word.len()..].trim();
        if self.opts.dialect.features().apple_renames {
            if word == ".rodata" {
                self.emit("\t.const_data");
                return Ok(());
            }
            if word == ".section" {
                if rest.starts_with(".note.GNU-stack") {
                    let commented =
                        format!("{} {}", self.opts.arch.comment_token(), directive);
                    self.emit(&commented);
                    return Ok(());
                }
                let mach_o = rest.contains("__");
                if !mach_o {
                    return Err(self.fail(
                        PpErrorKind::Config,
                        "Section name is not expressible in Mach-O",
                        Some(rest),
                    ));
                }
            }
        }
        let line = format!("\t{directive}");
        self.emit(&line);
        Ok(())
    }

    /// Emit the alignment directive and pending literals for `.ltorg` and
    /// the end-of-stream epilogue.
    pub(crate) fn flush_literals(&mut self) {
        if self.literals.is_empty() {
            return;
        }
        let align = match self.opts.arch {
            Arch::Aarch64 => "\t.align 3",
            _ => "\t.align 2",
        };
        self.emit(align);
        let word = self.opts.arch.word_directive();
        for line in self.literals.flush(word) {
            self.emit(&line);
        }
    }
}

fn split_irp_header(rest: &str) -> (&str, &str) {
    match rest.split_once(',') {
        Some((param, values)) => (param.trim(), values.trim()),
        None => (rest.trim(), ""),
    }
}

/// Translate a gas section directive to an armasm `AREA` line.
fn armasm_area(directive: &str) -> String {
    let word = first_word(directive).unwrap_or(directive);
    match word {
        ".text" => "\tAREA |.text|, CODE, READONLY, ALIGN=4, CODEALIGN".to_string(),
        ".data" | ".bss" => "\tAREA |.data|, DATA, READWRITE, ALIGN=4".to_string(),
        ".rodata" | ".const_data" => "\tAREA |.rodata|, DATA, READONLY, ALIGN=4".to_string(),
        ".section" => {
            let rest = directive[word.len()..].trim();
            let name = rest.split(|c: char| c == ',' || c.is_whitespace()).next();
            let name = name.filter(|n| !n.is_empty()).unwrap_or(".text");
            if rest.contains("rodata") || rest.contains("const") {
                format!("\tAREA |{name}|, DATA, READONLY, ALIGN=4")
            } else if rest.contains("data") || rest.contains("bss") {
                format!("\tAREA |{name}|, DATA, READWRITE, ALIGN=4")
            } else {
                format!("\tAREA |{name}|, CODE, READONLY, ALIGN=4, CODEALIGN")
            }
        }
        _ => "\tAREA |.text|, CODE, READONLY, ALIGN=4, CODEALIGN".to_string(),
    }
}
