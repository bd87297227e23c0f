// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

const MAX_EXPAND_DEPTH: usize = 100;

/// Options that influence translation semantics.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    pub arch: Arch,
    pub dialect: Dialect,
    pub fix_unreq: bool,
    pub force_thumb: bool,
    pub fix_xcode5: bool,
    pub armasm64_skip_neg_offset: bool,
    pub armasm64_skip_prfum: bool,
    pub armasm64_invert_scale: bool,
}

impl TranslateOptions {
    pub fn new(arch: Arch, dialect: Dialect) -> Self {
        Self {
            arch,
            dialect,
            fix_unreq: cfg!(target_os = "macos"),
            force_thumb: false,
            fix_xcode5: false,
            armasm64_skip_neg_offset: false,
            armasm64_skip_prfum: false,
            armasm64_invert_scale: false,
        }
    }
}

/// Repetition flavour captured by `.rept`/`.irp`/`.irpc`.
#[derive(Debug)]
pub(crate) enum RepeatKind {
    Rept { count: i64 },
    Irp { param: String, values: Vec<String> },
    Irpc { param: String, chars: String },
}

/// Open capture block. While one is active no directive is evaluated;
/// lines are stored verbatim and openers/closers only counted.
#[derive(Debug)]
pub(crate) enum Capture {
    Macro {
        name: String,
        params: Vec<MacroParam>,
        depth: usize,
        body: Vec<String>,
    },
    Repeat {
        kind: RepeatKind,
        depth: usize,
        body: Vec<String>,
    },
}

/// A fused `movw #:lower16:` waiting for its `movt` partner (armasm, ARM).
#[derive(Debug)]
pub(crate) struct PendingMov32 {
    pub reg: String,
    pub sym: String,
    pub raw: String,
}

/// The translation engine. One instance owns all stream state and is
/// driven line by line; macro and repetition expansion re-enter `feed`.
pub struct Translator {
    pub(crate) opts: TranslateOptions,
    pub(crate) symbols: SymbolTable,
    pub(crate) macros: MacroTable,
    pub(crate) cond: CondStack,
    pub(crate) capture: Option<Capture>,
    pub(crate) altmacro: bool,
    pub(crate) thumb: bool,
    pub(crate) macro_count: u32,
    pub(crate) expand_depth: usize,
    pub(crate) line_num: u32,
    pub(crate) section_stack: Vec<String>,
    pub(crate) literals: LiteralPool,
    pub(crate) locals: LocalLabels,
    pub(crate) req_aliases: RegisterAliases,
    pub(crate) neon: NeonAliasTable,
    pub(crate) thumb_labels: HashSet<String>,
    pub(crate) call_targets: BTreeSet<String>,
    pub(crate) import_symbols: BTreeSet<String>,
    pub(crate) labels_seen: HashSet<String>,
    pub(crate) pending_movw: Option<PendingMov32>,
    pub(crate) adrp_offset: HashMap<String, i64>,
    pub(crate) out: Vec<String>,
}

impl Translator {
    pub fn new(opts: TranslateOptions) -> Self {
        let thumb = opts.force_thumb;
        Self {
            opts,
            symbols: SymbolTable::new(),
            macros: MacroTable::new(),
            cond: CondStack::new(),
            capture: None,
            altmacro: false,
            thumb,
            macro_count: 0,
            expand_depth: 0,
            line_num: 0,
            section_stack: Vec::new(),
            literals: LiteralPool::new(),
            locals: LocalLabels::new(),
            req_aliases: RegisterAliases::new(),
            neon: NeonAliasTable::new(),
            thumb_labels: HashSet::new(),
            call_targets: BTreeSet::new(),
            import_symbols: BTreeSet::new(),
            labels_seen: HashSet::new(),
            pending_movw: None,
            adrp_offset: HashMap::new(),
            out: Vec::new(),
        }
    }

    /// Translate a whole preprocessed source stream, including the
    /// end-of-stream epilogue.
    pub fn translate(&mut self, source: &str) -> Result<String, PpError> {
        let comment = self.opts.arch.comment_token();
        for line in reader::logical_lines(source, comment) {
            self.line_num += 1;
            self.feed(&line)?;
        }
        self.finish()
    }

    pub(crate) fn fail(&self, kind: PpErrorKind, msg: &str, param: Option<&str>) -> PpError {
        PpError::new(kind, msg, param).with_line(self.line_num)
    }

    /// Process one logical line. Re-entered for every line produced by
    /// macro or repetition expansion.
    pub(crate) fn feed(&mut self, line: &str) -> Result<(), PpError> {
        if self.capture.is_some() {
            return self.capture_line(line);
        }

        let trimmed = line.trim();

        if self.handle_conditional_directive(trimmed)? {
            return Ok(());
        }
        if !self.cond.active() {
            return Ok(());
        }
        if trimmed.is_empty() {
            return Ok(());
        }
        if self.handle_directive(line, trimmed)? {
            return Ok(());
        }
        if self.try_invoke_macro(line)? {
            return Ok(());
        }
        self.rewrite_and_emit(line)
    }

    /// Store one line into the open capture block, tracking nesting.
    fn capture_line(&mut self, line: &str) -> Result<(), PpError> {
        let trimmed = line.trim();
        let word = first_word(trimmed).unwrap_or("");

        if word == ".endr"
            && trimmed != ".endr"
            && matches!(self.capture, Some(Capture::Repeat { .. }))
        {
            return Err(self.fail(
                PpErrorKind::Directive,
                ".endr must stand alone on its line",
                Some(trimmed),
            ));
        }

        let finished = match self.capture.as_mut().expect("capture is open") {
            Capture::Macro { depth, body, .. } => {
                if word == ".macro" {
                    *depth += 1;
                    body.push(line.to_string());
                    false
                } else if word == ".endm" {
                    *depth -= 1;
                    if *depth > 0 {
                        body.push(line.to_string());
                    }
                    *depth == 0
                } else {
                    body.push(line.to_string());
                    false
                }
            }
            Capture::Repeat { depth, body, .. } => {
                if matches!(word, ".rept" | ".irp" | ".irpc") {
                    *depth += 1;
                    body.push(line.to_string());
                    false
                } else if word == ".endr" {
                    *depth -= 1;
                    if *depth > 0 {
                        body.push(line.to_string());
                    }
                    *depth == 0
                } else {
                    body.push(line.to_string());
                    false
                }
            }
        };

        if finished {
            match self.capture.take().expect("capture is open") {
                Capture::Macro {
                    name, params, body, ..
                } => {
                    self.macros.define(&name, MacroDef { params, body });
                }
                Capture::Repeat { kind, body, .. } => {
                    self.expand_repeat(kind, body)?;
                }
            }
        }
        Ok(())
    }

    fn expand_repeat(&mut self, kind: RepeatKind, body: Vec<String>) -> Result<(), PpError> {
        self.enter_expansion()?;
        let result: Result<(), PpError> = (|| match kind {
            RepeatKind::Rept { count } => {
                for _ in 0..count.max(0) {
                    for line in &body {
                        self.feed(line)?;
                    }
                }
                Ok(())
            }
            RepeatKind::Irp { param, values } => {
                for value in &values {
                    let binding = [(param.clone(), value.clone())];
                    for line in &body {
                        let substituted =
                            substitute_line(line, &binding, None, self.altmacro, &self.symbols);
                        self.feed(&substituted)?;
                    }
                }
                Ok(())
            }
            RepeatKind::Irpc { param, chars } => {
                for ch in chars.chars() {
                    let binding = [(param.clone(), ch.to_string())];
                    for line in &body {
                        let substituted =
                            substitute_line(line, &binding, None, self.altmacro, &self.symbols);
                        self.feed(&substituted)?;
                    }
                }
                Ok(())
            }
        })();
        self.expand_depth -= 1;
        result
    }

    /// Expand a macro invocation, if the line's mnemonic names one.
    fn try_invoke_macro(&mut self, line: &str) -> Result<bool, PpError> {
        if self.macros.is_empty() {
            return Ok(false);
        }
        let (label, rest) = split_label(line);
        let rest = rest.trim_start();
        let name_end = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        let Some(def) = self.macros.get(name).cloned() else {
            return Ok(false);
        };

        let tokens = parse_invocation_args(&rest[name_end..]);
        let bindings =
            bind_macro_args(&def, &tokens).map_err(|err| err.with_line(self.line_num))?;
        let counter = self.macro_count;
        self.macro_count += 1;

        self.enter_expansion()?;
        let result: Result<(), PpError> = (|| {
            if let Some(label) = label {
                self.feed(&format!("{label}:"))?;
            }
            for body_line in &def.body {
                let substituted = substitute_line(
                    body_line,
                    &bindings,
                    Some(counter),
                    self.altmacro,
                    &self.symbols,
                );
                self.feed(&substituted)?;
            }
            Ok(())
        })();
        self.expand_depth -= 1;
        result.map(|()| true)
    }

    fn enter_expansion(&mut self) -> Result<(), PpError> {
        self.expand_depth += 1;
        if self.expand_depth > MAX_EXPAND_DEPTH {
            self.expand_depth -= 1;
            return Err(self.fail(
                PpErrorKind::Macro,
                "Macro or repetition expansion exceeded maximum depth",
                None,
            ));
        }
        Ok(())
    }

    /// Evaluate an expression, mapping failures to zero for the tolerant
    /// conditional contexts.
    pub(crate) fn eval_tolerant(&self, text: &str) -> i64 {
        expr::eval(text, &self.symbols).unwrap_or(0)
    }
}
