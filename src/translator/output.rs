// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

impl Translator {
    /// Emit one output line. Trailing whitespace is normalized away;
    /// nothing else about the line is touched.
    pub(crate) fn emit(&mut self, line: &str) {
        self.out.push(line.trim_end().to_string());
    }

    /// Validate stream-structure invariants and emit the epilogue.
    pub(crate) fn finish(&mut self) -> Result<String, PpError> {
        match self.capture.take() {
            Some(Capture::Macro { name, .. }) => {
                return Err(self.fail(
                    PpErrorKind::Directive,
                    "Found .macro without .endm",
                    Some(&name),
                ));
            }
            Some(Capture::Repeat { .. }) => {
                return Err(self.fail(
                    PpErrorKind::Directive,
                    "Found .rept/.irp without .endr",
                    None,
                ));
            }
            None => {}
        }
        if !self.cond.is_empty() {
            return Err(self.fail(
                PpErrorKind::Conditional,
                "Found .if without .endif at end of input",
                None,
            ));
        }

        if self.opts.dialect == Dialect::Armasm {
            self.flush_pending_movw();
            let mut imports: Vec<String> = self
                .call_targets
                .iter()
                .chain(self.import_symbols.iter())
                .filter(|name| !self.labels_seen.contains(name.as_str()))
                .cloned()
                .collect();
            imports.sort();
            imports.dedup();
            for name in imports {
                let import = format!("\tIMPORT {name}");
                self.emit(&import);
            }
            self.emit("\tEND");
        } else {
            if !self.literals.is_empty() {
                self.emit("\t.text");
                self.flush_literals();
            }
            if self.opts.dialect.features().thumb_func_tagging {
                let late_thumb_funcs: Vec<String> = self
                    .call_targets
                    .iter()
                    .filter(|name| self.thumb_labels.contains(name.as_str()))
                    .cloned()
                    .collect();
                for name in late_thumb_funcs {
                    let marker = format!("\t.thumb_func {name}");
                    self.emit(&marker);
                }
            }
        }

        let mut text = self.out.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        Ok(text)
    }
}
