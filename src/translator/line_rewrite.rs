// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::rewrite_ppc;
use super::*;

impl Translator {
    /// Apply the rewrite pipeline to one fully expanded, condition-true
    /// line and emit the result. Rule order is load-bearing: operand-level
    /// architecture fixes run before the dialect emission decides the
    /// final spelling.
    pub(crate) fn rewrite_and_emit(&mut self, line: &str) -> Result<(), PpError> {
        let mut line = line.to_string();

        match self.opts.arch {
            Arch::Arm => {
                line = self.apply_neon_aliases(&line);
                if self.opts.dialect == Dialect::Armasm {
                    line = self.req_aliases.apply(&line);
                } else {
                    line = self.rewrite_arm_literal_load(&line);
                    if self.thumb {
                        line = self.rewrite_thumb_wide_imm(&line);
                    }
                }
            }
            Arch::Aarch64 => {
                line = self.req_aliases.apply(&line);
                line = self.rewrite_aarch64_line(&line);
            }
            Arch::PowerPc => {
                if self.opts.dialect.features().apple_renames {
                    line = rewrite_ppc::rewrite_ppc_line(&line);
                }
            }
        }

        if self.opts.dialect == Dialect::Armasm {
            return self.armasm_emit(&line);
        }
        if self.opts.force_thumb && self.force_thumb_rewrite(&line)? {
            return Ok(());
        }
        self.gas_emit(&line)
    }
}
