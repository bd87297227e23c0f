// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;
use proptest::prelude::*;

fn options(arch: Arch, dialect: Dialect) -> TranslateOptions {
    let mut opts = TranslateOptions::new(arch, dialect);
    // Pin the host-dependent default so tests behave the same everywhere.
    opts.fix_unreq = false;
    opts
}

fn run(arch: Arch, dialect: Dialect, source: &str) -> String {
    translate(source, options(arch, dialect)).expect("translate")
}

fn run_lines(arch: Arch, dialect: Dialect, source: &str) -> Vec<String> {
    run(arch, dialect, source)
        .lines()
        .map(str::to_string)
        .collect()
}

// === Transparency ===

#[test]
fn plain_instructions_pass_through_unchanged() {
    let source = "\tmov r0, r1\n\teor r2, r3, r4\n";
    assert_eq!(run(Arch::Arm, Dialect::AppleGas, source), source);
}

#[test]
fn trailing_whitespace_is_normalized() {
    let out = run(Arch::Arm, Dialect::Gas, "\tmov r0, r1   \n");
    assert_eq!(out, "\tmov r0, r1\n");
}

// === Repetition ===

#[test]
fn rept_repeats_the_body() {
    let out = run_lines(Arch::Arm, Dialect::Gas, ".rept 3\n\tnop\n.endr\n");
    assert_eq!(out, vec!["\tnop", "\tnop", "\tnop"]);
}

#[test]
fn rept_count_may_be_an_expression() {
    let out = run_lines(Arch::Arm, Dialect::Gas, ".rept 1+1\n\tnop\n.endr\n");
    assert_eq!(out.len(), 2);
}

#[test]
fn nested_rept_multiplies() {
    let source = ".rept 2\n.rept 3\n\tnop\n.endr\n.endr\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out.len(), 6);
}

#[test]
fn irp_substitutes_each_value() {
    let source = ".irp reg, r0 r1 r2\n\tmov \\reg, #0\n.endr\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tmov r0, #0", "\tmov r1, #0", "\tmov r2, #0"]);
}

#[test]
fn irpc_iterates_characters() {
    let source = ".irpc n, 012\n\t.byte \\n\n.endr\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\t.byte 0", "\t.byte 1", "\t.byte 2"]);
}

#[test]
fn endr_with_trailing_content_is_an_error() {
    let err = translate(
        ".rept 2\n\tnop\n.endr nop\n",
        options(Arch::Arm, Dialect::Gas),
    )
    .unwrap_err();
    assert!(err.to_string().contains(".endr"));
}

// === Conditionals ===

#[test]
fn if_true_selects_then_branch() {
    let source = ".if 1\n\tmov r0, #1\n.else\n\tmov r0, #2\n.endif\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tmov r0, #1"]);
}

#[test]
fn if_false_selects_else_branch() {
    let source = ".if 0\n\tmov r0, #1\n.else\n\tmov r0, #2\n.endif\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tmov r0, #2"]);
}

#[test]
fn elseif_selects_the_first_true_branch_only() {
    let source = "\
.if 0
\tmov r0, #1
.elseif 1
\tmov r0, #2
.elseif 1
\tmov r0, #3
.else
\tmov r0, #4
.endif
";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tmov r0, #2"]);
}

#[test]
fn ifc_and_ifb_variants() {
    let out = run_lines(
        Arch::Arm,
        Dialect::Gas,
        ".ifc abc,abc\n\tnop\n.endif\n.ifnb arg\n\tmov r0, r1\n.endif\n.ifb\n\tmov r2, r3\n.endif\n",
    );
    assert_eq!(out, vec!["\tnop", "\tmov r0, r1", "\tmov r2, r3"]);
}

#[test]
fn ifeq_and_iflt_test_against_zero() {
    let out = run_lines(
        Arch::Arm,
        Dialect::Gas,
        ".ifeq 3-3\n\tnop\n.endif\n.iflt -1\n\tmov r0, r1\n.endif\n",
    );
    assert_eq!(out, vec!["\tnop", "\tmov r0, r1"]);
}

#[test]
fn set_symbols_feed_conditionals() {
    let source = ".set WIDTH, 8\n.if WIDTH == 8\n\tnop\n.endif\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec![".set WIDTH, 8", "\tnop"]);
}

#[test]
fn undefined_symbols_in_if_count_as_false() {
    let source = ".if MYSTERY\n\tnop\n.endif\n\tmov r0, r1\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tmov r0, r1"]);
}

#[test]
fn unmatched_closers_are_fatal() {
    assert!(translate(".endif\n", options(Arch::Arm, Dialect::Gas)).is_err());
    assert!(translate(".endm\n", options(Arch::Arm, Dialect::Gas)).is_err());
    assert!(translate(".endr\n", options(Arch::Arm, Dialect::Gas)).is_err());
}

#[test]
fn unterminated_blocks_are_fatal() {
    assert!(translate(".if 1\n\tnop\n", options(Arch::Arm, Dialect::Gas)).is_err());
    assert!(translate(".macro m\n\tnop\n", options(Arch::Arm, Dialect::Gas)).is_err());
    assert!(translate(".rept 2\n\tnop\n", options(Arch::Arm, Dialect::Gas)).is_err());
}

// === Macros ===

#[test]
fn macro_with_default_and_vararg() {
    let source = "\
.macro op, name, args:vararg=r0
\t\\name \\args
.endm
op mov
op mov, r1, r2
";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tmov r0", "\tmov r1, r2"]);
}

#[test]
fn macro_label_prefix_is_preserved() {
    let source = ".macro pad\n\tnop\n.endm\nentry: pad\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["entry:", "\tnop"]);
}

#[test]
fn macro_counter_is_stable_within_one_invocation() {
    let source = "\
.macro pair
lbl\\@:
\tb lbl\\@
.endm
pair
pair
";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out[0], "lbl0:");
    assert_eq!(out[1], "\tb lbl0");
    assert_eq!(out[2], "lbl1:");
    assert_eq!(out[3], "\tb lbl1");
}

#[test]
fn paste_marker_vanishes() {
    let source = ".macro join a\n\tldr r0, tab\\a\\()_end\n.endm\njoin 4\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tldr r0, tab4_end"]);
}

#[test]
fn arguments_do_not_bite_into_identifiers() {
    let source = ".macro m, r\n\tmov \\r, rext\n.endm\nm r5\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tmov r5, rext"]);
}

#[test]
fn named_arguments_bind_by_name() {
    let source = ".macro st, rd, rn\n\tstr \\rd, [\\rn]\n.endm\nst rn=r1, rd=r0\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tstr r0, [r1]"]);
}

#[test]
fn conditionals_inside_macros_evaluate_on_expansion() {
    let source = "\
.macro choose val
.if \\val
\tmov r0, #1
.else
\tmov r0, #2
.endif
.endm
choose 0
choose 1
";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tmov r0, #2", "\tmov r0, #1"]);
}

#[test]
fn purgem_removes_the_definition() {
    let source = ".macro w\n\tnop\n.endm\nw\n.purgem w\nw\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    // After .purgem the invocation is an ordinary (unknown) instruction.
    assert_eq!(out, vec!["\tnop", "w"]);
}

#[test]
fn nested_macro_definitions_capture() {
    let source = "\
.macro outer
.macro inner
\tnop
.endm
.endm
outer
inner
";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tnop"]);
}

#[test]
fn excess_arguments_without_vararg_fail() {
    let source = ".macro one a\n\tnop\n.endm\none x, y\n";
    assert!(translate(source, options(Arch::Arm, Dialect::Gas)).is_err());
}

#[test]
fn recursive_macros_hit_the_depth_limit() {
    let source = ".macro loop\nloop\n.endm\nloop\n";
    let err = translate(source, options(Arch::Arm, Dialect::Gas)).unwrap_err();
    assert!(err.to_string().contains("depth"));
}

#[test]
fn altmacro_substitutes_bare_names() {
    let source = "\
.altmacro
.macro fill n
\t.byte n
.endm
fill 7
.noaltmacro
";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\t.byte 7"]);
}

// === Literal pool ===

#[test]
fn literal_pool_shares_and_flushes() {
    let source = "\
ldr r0, =0x12345678
ldr r1, =0x12345678
ldr r2, =other
.ltorg
";
    let out = run_lines(Arch::Arm, Dialect::AppleGas, source);
    assert_eq!(out[0], "ldr r0, Literal_0");
    assert_eq!(out[1], "ldr r1, Literal_0");
    assert_eq!(out[2], "ldr r2, Literal_1");
    assert_eq!(out[3], "\t.align 2");
    assert_eq!(out[4], "Literal_0:");
    assert_eq!(out[5], "\t.word 0x12345678");
    assert_eq!(out[6], "Literal_1:");
    assert_eq!(out[7], "\t.word other");
}

#[test]
fn literal_pool_epochs_do_not_share_labels() {
    let source = "ldr r0, =123\n.ltorg\nldr r1, =123\n";
    let out = run_lines(Arch::Arm, Dialect::AppleGas, source);
    assert_eq!(out[0], "ldr r0, Literal_0");
    // After the flush the same expression gets a fresh label, and the
    // epilogue emits the second pool.
    assert_eq!(out[4], "ldr r1, Literal_1");
    assert!(out.contains(&"\t.text".to_string()));
    assert!(out.contains(&"Literal_1:".to_string()));
}

// === Sections ===

#[test]
fn previous_restores_the_prior_section() {
    let source = ".section __TEXT,__text\n.section __DATA,__data\n.previous\n";
    let out = run_lines(Arch::Arm, Dialect::AppleGas, source);
    assert_eq!(
        out,
        vec![
            "\t.section __TEXT,__text",
            "\t.section __DATA,__data",
            "\t.section __TEXT,__text",
        ]
    );
}

#[test]
fn previous_without_prior_section_is_fatal() {
    assert!(translate(".text\n.previous\n", options(Arch::Arm, Dialect::Gas)).is_err());
    let source = ".section __TEXT,__text\n.previous\n";
    assert!(translate(source, options(Arch::Arm, Dialect::AppleGas)).is_err());
}

#[test]
fn apple_rejects_non_mach_o_sections() {
    let source = ".section .fancy.name,\"aw\"\n";
    assert!(translate(source, options(Arch::Arm, Dialect::AppleGas)).is_err());
    // Plain gas passes the same line through.
    assert!(translate(source, options(Arch::Arm, Dialect::Gas)).is_ok());
}

#[test]
fn rodata_becomes_const_data_on_apple() {
    let out = run_lines(Arch::Arm, Dialect::AppleGas, ".rodata\n");
    assert_eq!(out, vec!["\t.const_data"]);
}

// === Apple dialect ===

#[test]
fn apple_adrp_page_spellings() {
    let source = "\tadrp x0, #:pg_hi21:foo\n\tadd x0, x0, #:lo12:foo\n";
    let out = run_lines(Arch::Aarch64, Dialect::AppleClang, source);
    assert_eq!(out, vec!["\tadrp x0, foo@PAGE", "\tadd x0, x0, foo@PAGEOFF"]);
}

#[test]
fn apple_renames_and_comment_table() {
    let source = ".global sym\n\t.int 5\n\t.fpu neon\n\t.float 1.5\n";
    let out = run_lines(Arch::Arm, Dialect::AppleGas, source);
    assert_eq!(
        out,
        vec!["\t.globl sym", "\t.long 5", "@ .fpu neon", "\t.single 1.5"]
    );
}

#[test]
fn dot_l_labels_lose_their_dot_on_apple() {
    let source = ".Lloop:\n\tbne .Lloop\n";
    let out = run_lines(Arch::Arm, Dialect::AppleGas, source);
    assert_eq!(out, vec!["Lloop:", "\tbne Lloop"]);
}

#[test]
fn vmrs_spelling_for_apple_gas() {
    let out = run_lines(Arch::Arm, Dialect::AppleGas, "\tvmrs APSR_nzcv, fpscr\n");
    assert_eq!(out, vec!["\tfmrx r15, fpscr"]);
}

#[test]
fn thumb_calls_get_thumb_func_markers() {
    let source = ".thumb\nfunc1:\n\tbx lr\n\tbl func1\n";
    let out = run_lines(Arch::Arm, Dialect::AppleGas, source);
    assert_eq!(
        out,
        vec![".thumb", "func1:", "\tbx lr", "\t.thumb_func func1", "\tbl func1"]
    );
}

#[test]
fn late_thumb_labels_get_epilogue_markers() {
    let source = ".thumb\n\tbl later\nlater:\n\tbx lr\n";
    let out = run_lines(Arch::Arm, Dialect::AppleGas, source);
    assert_eq!(out.last().unwrap(), "\t.thumb_func later");
}

#[test]
fn bic_is_not_tagged_as_a_branch() {
    let source = ".thumb\nic:\n\tbic r0, r1, #3\n";
    let out = run_lines(Arch::Arm, Dialect::AppleGas, source);
    assert_eq!(out, vec![".thumb", "ic:", "\tbic r0, r1, #3"]);
}

// === Register aliases ===

#[test]
fn req_aliases_resolve_transitively_on_aarch64() {
    let source = "base .req x0\nsrc .req base\n\tldr x1, [src]\n.unreq src\n";
    let out = run_lines(Arch::Aarch64, Dialect::Gas, source);
    assert_eq!(out[0], "base .req x0");
    assert_eq!(out[1], "src .req base");
    assert_eq!(out[2], "\tldr x1, [x0]");
    assert_eq!(out[3], "\t.unreq src");
}

#[test]
fn fix_unreq_emits_both_spellings() {
    let mut opts = options(Arch::Aarch64, Dialect::AppleGas);
    opts.fix_unreq = true;
    let out = translate("Width .req x0\n.unreq Width\n", opts).expect("translate");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], "\t.unreq width");
    assert_eq!(lines[2], "\t.unreq WIDTH");
}

#[test]
fn neon_aliases_substitute_and_type_the_mnemonic() {
    let source = "coeff .dn d0.s16\n\tvmul coeff, d1, d2\n";
    let out = run_lines(Arch::Arm, Dialect::AppleGas, source);
    assert_eq!(out, vec!["\tvmul.s16 d0, d1, d2"]);
}

// === Thumb immediates and force-thumb ===

#[test]
fn thumb_large_immediates_force_wide_encoding() {
    let source = ".thumb\n\tadd r0, r1, #500\n\tadd r0, r1, #12\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out[1], "\tadd.w r0, r1, #500");
    assert_eq!(out[2], "\tadd r0, r1, #12");
}

#[test]
fn force_thumb_lowers_arm_idioms() {
    let mut opts = options(Arch::Arm, Dialect::Gas);
    opts.force_thumb = true;
    let source = "\tmov pc, lr\n\tstmdb sp!, {r4}\n\tldr r0, [r1], r2\n.arm\n";
    let out = translate(source, opts).expect("translate");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "\tbx lr");
    assert_eq!(lines[1], "\tstr r4, [sp, #-4]!");
    assert_eq!(lines[2], "\tldr r0, [r1]");
    assert_eq!(lines[3], "\tadd r1, r1, r2");
    assert_eq!(lines[4], "\t.thumb");
}

// === AArch64 shims ===

#[test]
fn wide_page_immediates_split_for_clang() {
    let out = run_lines(Arch::Aarch64, Dialect::Clang, "\tadd x0, x1, #8192\n");
    assert_eq!(out, vec!["\tadd x0, x1, #2, lsl #12"]);
    // Non-multiples stay as written.
    let out = run_lines(Arch::Aarch64, Dialect::Clang, "\tadd x0, x1, #8200\n");
    assert_eq!(out, vec!["\tadd x0, x1, #8200"]);
}

#[test]
fn xcode5_shims_are_gated_by_the_flag() {
    let source = "\tuxtl v0.8h, v1.8b\n";
    let plain = run(Arch::Aarch64, Dialect::AppleClang, source);
    assert_eq!(plain, "\tuxtl v0.8h, v1.8b\n");
    let mut opts = options(Arch::Aarch64, Dialect::AppleClang);
    opts.fix_xcode5 = true;
    let shimmed = translate(source, opts).expect("translate");
    assert_eq!(shimmed, "\tushll v0.8h, v1.8b, #0\n");
}

// === armasm ===

#[test]
fn armasm_local_labels_synthesize_names() {
    let source = "\tb.eq 1f\n\tb.eq 1f\n1:\n\tnop\n\tb 1b\n";
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, source);
    assert_eq!(out[0], "\tbeq temp_label_0");
    assert_eq!(out[1], "\tbeq temp_label_0");
    assert_eq!(out[2], "temp_label_0");
    assert_eq!(out[3], "temp_label_1");
    assert_eq!(out[4], "\tnop");
    assert_eq!(out[5], "\tb temp_label_1");
}

#[test]
fn armasm_data_directives_rename() {
    let source = "\t.word 5\n\t.hword 2\n\t.byte 1\n\t.asciz \"hi\"\n\t.quad 9\n";
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, source);
    assert_eq!(out[0], "\tdcd 5");
    assert_eq!(out[1], "\tdcw 2");
    assert_eq!(out[2], "\tdcb 1");
    assert_eq!(out[3], "\tdcb \"hi\", 0");
    assert_eq!(out[4], "\tdcq 9");
}

#[test]
fn armasm_alignment_is_power_of_two() {
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, "\t.align 3\n");
    assert_eq!(out[0], "\tALIGN 8");
}

#[test]
fn armasm_sections_become_areas() {
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, ".text\n");
    assert_eq!(out[0], "\tAREA |.text|, CODE, READONLY, ALIGN=4, CODEALIGN");
}

#[test]
fn armasm_imports_undefined_call_targets() {
    let source = "local:\n\tbl local\n\tbl external\n";
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, source);
    assert!(out.contains(&"\tIMPORT external".to_string()));
    assert!(!out.iter().any(|l| l == "\tIMPORT local"));
    assert_eq!(out.last().unwrap(), "\tEND");
}

#[test]
fn armasm_labels_move_to_column_zero() {
    let source = "start: mov x0, x1\n";
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, source);
    assert_eq!(out, vec!["start", "\tmov x0, x1", "\tEND"]);
}

#[test]
fn armasm_substitutes_symbol_values() {
    let source = ".set COUNT, 4\n\tmov x0, #COUNT\n";
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, source);
    assert_eq!(out[0], "\tmov x0, #4");
}

#[test]
fn armasm_mov32_fusion_and_import() {
    let source = "\tmovw r0, #:lower16:table\n\tmovt r0, #:upper16:table\n";
    let out = run_lines(Arch::Arm, Dialect::Armasm, source);
    assert_eq!(out[0], "\tmov32 r0, table");
    assert!(out.contains(&"\tIMPORT table".to_string()));
}

#[test]
fn armasm_filters_it_blocks() {
    let source = "\tite eq\n\tmoveq r0, #1\n";
    let out = run_lines(Arch::Arm, Dialect::Armasm, source);
    assert_eq!(out[0], "\tmoveq r0, #1");
}

#[test]
fn armasm_types_scalar_float_forms() {
    let out = run_lines(Arch::Arm, Dialect::Armasm, "\tvadd s0, s1, s2\n");
    assert_eq!(out[0], "\tvadd.f32 s0, s1, s2");
}

#[test]
fn armasm64_tbz_widens_w_registers() {
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, "\ttbz w3, #5, 1f\n1:\n");
    assert_eq!(out[0], "\ttbz x3, #5, temp_label_0");
}

#[test]
fn armasm64_condition_codes_fuse() {
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, "\tcsel x0, x1, x2, eq\n");
    assert_eq!(out[0], "\tcselEQ x0, x1, x2");
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, "\tccmp x0, x1, #0, ne\n");
    assert_eq!(out[0], "\tccmpNE x0, x1, #0");
}

#[test]
fn armasm64_unscaled_negative_offsets() {
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, "\tldrb w0, [x1, #-1]\n");
    assert_eq!(out[0], "\tldurb w0, [x1, #-1]");
    // Writeback forms keep the scaled mnemonic.
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, "\tldr x0, [x1, #-16]!\n");
    assert_eq!(out[0], "\tldr x0, [x1, #-16]!");
}

#[test]
fn armasm64_adrp_offsets_reapply_on_the_add() {
    let source = "\tadrp x0, buf+16\n\tadd x0, x0, :lo12:buf+16\n";
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, source);
    assert_eq!(out[0], "\tadrp x0, buf");
    assert_eq!(out[1], "\tadd x0, x0, buf");
    assert_eq!(out[2], "\tadd x0, x0, #16");
    assert!(out.contains(&"\tIMPORT buf".to_string()));
}

#[test]
fn armasm64_negative_ldr_offset_splits_when_configured() {
    let mut opts = options(Arch::Aarch64, Dialect::Armasm);
    opts.armasm64_skip_neg_offset = true;
    let out = translate("\tldr x0, =sym-8\n", opts).expect("translate");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "\tldr x0, =sym");
    assert_eq!(lines[1], "\tsub x0, x0, #8");
}

#[test]
fn armasm64_register_ranges_expand() {
    let out = run_lines(
        Arch::Aarch64,
        Dialect::Armasm,
        "\tld1 {v1.4h-v3.4h}, [x0]\n",
    );
    assert_eq!(out[0], "\tld1 {v1.4h,v2.4h,v3.4h}, [x0]");
}

#[test]
fn armasm64_ext_and_b_cond_rename() {
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, "\text v0.16b, v1.16b, v2.16b, #8\n");
    assert_eq!(out[0], "\text8 v0.16b, v1.16b, v2.16b, #8");
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, "\tb.hs 2f\n2:\n");
    assert_eq!(out[0], "\tbhs temp_label_0");
}

#[test]
fn armasm_unknown_directives_become_comments() {
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, "\t.type fn, %function\n");
    assert_eq!(out[0], "; .type fn, %function");
}

// === Local-label isolation ===

#[test]
fn forward_and_backward_references_stay_distinct() {
    let source = "1:\n\tb 1f\n\tb 1b\n\tb 1f\n1:\n";
    let out = run_lines(Arch::Aarch64, Dialect::Armasm, source);
    // 1b resolves to the first definition, both 1f to the second.
    assert_eq!(out[0], "temp_label_0");
    assert_eq!(out[1], "\tb temp_label_1");
    assert_eq!(out[2], "\tb temp_label_0");
    assert_eq!(out[3], "\tb temp_label_1");
    assert_eq!(out[4], "temp_label_1");
    assert_eq!(out[5], "temp_label_2");
}

// === PowerPC ===

#[test]
fn ppc_reloc_and_spr_rewrites_for_apple() {
    let source = "\tlis r3, var@ha\n\tmtctr r4\n";
    let out = run_lines(Arch::PowerPc, Dialect::AppleGas, source);
    assert_eq!(out, vec!["\tlis r3, ha16(var)", "\tmtspr 9, r4"]);
    // Plain gas output is untouched.
    let out = run_lines(Arch::PowerPc, Dialect::Gas, source);
    assert_eq!(out, vec!["\tlis r3, var@ha", "\tmtctr r4"]);
}

// === Reader behaviour through the engine ===

#[test]
fn semicolons_and_comments_split_and_strip() {
    let source = "\tmov r0, r1; mov r2, r3 @ trailing\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tmov r0, r1", " mov r2, r3"]);
}

#[test]
fn preprocessor_linemarkers_are_invisible() {
    let source = "# 12 \"file.S\"\n\tnop\n";
    let out = run_lines(Arch::Arm, Dialect::Gas, source);
    assert_eq!(out, vec!["\tnop"]);
}

// === Properties ===

proptest! {
    #[test]
    fn transparency_for_untriggered_instructions(
        mnemonic in prop::sample::select(vec!["mov", "eor", "orr", "cmp", "tst"]),
        a in 0u8..13,
        b in 0u8..13,
    ) {
        let source = format!("\t{mnemonic} r{a}, r{b}\n");
        let out = run(Arch::Arm, Dialect::Gas, &source);
        prop_assert_eq!(out, source);
    }

    #[test]
    fn macro_counters_differ_across_invocations(count in 2usize..6) {
        let mut source = String::from(".macro u\n\t.byte \\@\n.endm\n");
        for _ in 0..count {
            source.push_str("u\n");
        }
        let out = run(Arch::Arm, Dialect::Gas, &source);
        let mut seen: Vec<&str> = out.lines().collect();
        let before = seen.len();
        seen.dedup();
        prop_assert_eq!(seen.len(), before);
    }

    #[test]
    fn literal_pool_labels_are_unique_per_expression(values in prop::collection::btree_set(0u32..1000, 1..6)) {
        let mut source = String::new();
        for (idx, value) in values.iter().enumerate() {
            source.push_str(&format!("ldr r{}, =0x{value:x}\n", idx % 8));
        }
        source.push_str(".ltorg\n");
        let out = run(Arch::Arm, Dialect::AppleGas, &source);
        let labels: Vec<&str> = out
            .lines()
            .filter(|line| line.starts_with("Literal_") && line.ends_with(':'))
            .collect();
        prop_assert_eq!(labels.len(), values.len());
    }
}
