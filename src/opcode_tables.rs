//! Opcode shape tables: separate from the engine's dispatch, this answers
//! "how is this instruction built" (operand count, name, whether it stores
//! a result, branches, or carries inline text) so both the decoder and a
//! human-readable disassembler can share one source of truth.

use lazy_static::lazy_static;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandCountTag {
    Op0,
    Op1,
    Op2,
    Var,
    Ext,
}

#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    pub name: &'static str,
    pub stores_result: bool,
    pub has_branch: bool,
    pub has_text: bool,
}

fn info(name: &'static str, stores_result: bool, has_branch: bool, has_text: bool) -> OpcodeInfo {
    OpcodeInfo {
        name,
        stores_result,
        has_branch,
        has_text,
    }
}

lazy_static! {
    static ref TABLE: HashMap<(OperandCountTag, u8), OpcodeInfo> = {
        use OperandCountTag::*;
        let mut m = HashMap::new();
        let mut add = |tag, num, i: OpcodeInfo| {
            m.insert((tag, num), i);
        };

        // 2OP
        add(Op2, 1, info("je", false, true, false));
        add(Op2, 2, info("jl", false, true, false));
        add(Op2, 3, info("jg", false, true, false));
        add(Op2, 4, info("dec_chk", false, true, false));
        add(Op2, 5, info("inc_chk", false, true, false));
        add(Op2, 6, info("jin", false, true, false));
        add(Op2, 7, info("test", false, true, false));
        add(Op2, 8, info("or", true, false, false));
        add(Op2, 9, info("and", true, false, false));
        add(Op2, 10, info("test_attr", false, true, false));
        add(Op2, 11, info("set_attr", false, false, false));
        add(Op2, 12, info("clear_attr", false, false, false));
        add(Op2, 13, info("store", false, false, false));
        add(Op2, 14, info("insert_obj", false, false, false));
        add(Op2, 15, info("loadw", true, false, false));
        add(Op2, 16, info("loadb", true, false, false));
        add(Op2, 17, info("get_prop", true, false, false));
        add(Op2, 18, info("get_prop_addr", true, false, false));
        add(Op2, 19, info("get_next_prop", true, false, false));
        add(Op2, 20, info("add", true, false, false));
        add(Op2, 21, info("sub", true, false, false));
        add(Op2, 22, info("mul", true, false, false));
        add(Op2, 23, info("div", true, false, false));
        add(Op2, 24, info("mod", true, false, false));
        add(Op2, 25, info("call_2s", true, false, false));
        add(Op2, 26, info("call_2n", false, false, false));
        add(Op2, 27, info("set_colour", false, false, false));
        add(Op2, 28, info("throw", false, false, false));

        // 1OP
        add(Op1, 0, info("jz", false, true, false));
        add(Op1, 1, info("get_sibling", true, true, false));
        add(Op1, 2, info("get_child", true, true, false));
        add(Op1, 3, info("get_parent", true, false, false));
        add(Op1, 4, info("get_prop_len", true, false, false));
        add(Op1, 5, info("inc", false, false, false));
        add(Op1, 6, info("dec", false, false, false));
        add(Op1, 7, info("print_addr", false, false, false));
        add(Op1, 8, info("call_1s", true, false, false));
        add(Op1, 9, info("remove_obj", false, false, false));
        add(Op1, 10, info("print_obj", false, false, false));
        add(Op1, 11, info("ret", false, false, false));
        add(Op1, 12, info("jump", false, false, false));
        add(Op1, 13, info("print_paddr", false, false, false));
        add(Op1, 14, info("load", true, false, false));
        add(Op1, 15, info("not_or_call_1n", true, false, false));

        // 0OP
        add(Op0, 0, info("rtrue", false, false, false));
        add(Op0, 1, info("rfalse", false, false, false));
        add(Op0, 2, info("print", false, false, true));
        add(Op0, 3, info("print_ret", false, false, true));
        add(Op0, 4, info("nop", false, false, false));
        add(Op0, 5, info("save", true, true, false));
        add(Op0, 6, info("restore", true, true, false));
        add(Op0, 7, info("restart", false, false, false));
        add(Op0, 8, info("ret_popped", false, false, false));
        add(Op0, 9, info("pop_or_catch", true, false, false));
        add(Op0, 10, info("quit", false, false, false));
        add(Op0, 11, info("new_line", false, false, false));
        add(Op0, 12, info("show_status", false, false, false));
        add(Op0, 13, info("verify", false, true, false));
        add(Op0, 14, info("extended", false, false, false));
        add(Op0, 15, info("piracy", false, true, false));

        // VAR
        add(Var, 0, info("call_vs", true, false, false));
        add(Var, 1, info("storew", false, false, false));
        add(Var, 2, info("storeb", false, false, false));
        add(Var, 3, info("put_prop", false, false, false));
        add(Var, 4, info("sread_or_aread", true, false, false));
        add(Var, 5, info("print_char", false, false, false));
        add(Var, 6, info("print_num", false, false, false));
        add(Var, 7, info("random", true, false, false));
        add(Var, 8, info("push", false, false, false));
        add(Var, 9, info("pull", false, false, false));
        add(Var, 10, info("split_window", false, false, false));
        add(Var, 11, info("set_window", false, false, false));
        add(Var, 12, info("call_vs2", true, false, false));
        add(Var, 13, info("erase_window", false, false, false));
        add(Var, 14, info("erase_line", false, false, false));
        add(Var, 15, info("set_cursor", false, false, false));
        add(Var, 16, info("get_cursor", false, false, false));
        add(Var, 17, info("set_text_style", false, false, false));
        add(Var, 18, info("buffer_mode", false, false, false));
        add(Var, 19, info("output_stream", false, false, false));
        add(Var, 20, info("input_stream", false, false, false));
        add(Var, 21, info("sound_effect", false, false, false));
        add(Var, 22, info("read_char", true, false, false));
        add(Var, 23, info("scan_table", true, true, false));
        add(Var, 24, info("not", true, false, false));
        add(Var, 25, info("call_vn", false, false, false));
        add(Var, 26, info("call_vn2", false, false, false));
        add(Var, 27, info("tokenise", false, false, false));
        add(Var, 28, info("encode_text", false, false, false));
        add(Var, 29, info("copy_table", false, false, false));
        add(Var, 30, info("print_table", false, false, false));
        add(Var, 31, info("check_arg_count", false, true, false));

        // EXT
        add(Ext, 0, info("ext_save", true, false, false));
        add(Ext, 1, info("ext_restore", true, false, false));
        add(Ext, 2, info("log_shift", true, false, false));
        add(Ext, 3, info("art_shift", true, false, false));
        add(Ext, 4, info("set_font", true, false, false));
        add(Ext, 5, info("draw_picture", false, false, false));
        add(Ext, 6, info("picture_data", false, true, false));
        add(Ext, 7, info("erase_picture", false, false, false));
        add(Ext, 8, info("set_margins", false, false, false));
        add(Ext, 9, info("save_undo", true, false, false));
        add(Ext, 10, info("restore_undo", true, false, false));
        add(Ext, 11, info("print_unicode", false, false, false));
        add(Ext, 12, info("check_unicode", true, false, false));
        add(Ext, 13, info("set_true_colour", false, false, false));
        add(Ext, 16, info("move_window", false, false, false));
        add(Ext, 17, info("window_size", false, false, false));
        add(Ext, 18, info("window_style", false, false, false));
        add(Ext, 19, info("get_wind_prop", true, false, false));
        add(Ext, 20, info("scroll_window", false, false, false));
        add(Ext, 21, info("pop_stack", false, false, false));
        add(Ext, 22, info("read_mouse", false, false, false));
        add(Ext, 23, info("mouse_window", false, false, false));
        add(Ext, 24, info("push_stack", false, true, false));
        add(Ext, 25, info("put_wind_prop", false, false, false));
        add(Ext, 26, info("print_form", false, false, false));
        add(Ext, 27, info("make_menu", false, true, false));
        add(Ext, 28, info("picture_table", false, false, false));
        add(Ext, 29, info("buffer_screen", true, false, false));

        m
    };
}

/// Look up shape metadata, resolving the version-dependent 1OP:15 and
/// 0OP:9 dual meanings to their concrete name.
pub fn lookup(tag: OperandCountTag, opcode_number: u8, version: u8) -> Option<OpcodeInfo> {
    let mut found = TABLE.get(&(tag, opcode_number)).copied()?;
    if tag == OperandCountTag::Op1 && opcode_number == 15 {
        found.name = if version >= 5 { "call_1n" } else { "not" };
        found.stores_result = version < 5;
    }
    if tag == OperandCountTag::Op0 && opcode_number == 9 {
        found.name = if version >= 5 { "catch" } else { "pop" };
        found.stores_result = version >= 5;
    }
    if tag == OperandCountTag::Op0 && (opcode_number == 5 || opcode_number == 6) {
        found.stores_result = version >= 4;
        found.has_branch = version < 4;
    }
    if tag == OperandCountTag::Var && opcode_number == 4 {
        // sread (v1-4) discards; aread (v5+) stores the terminating character.
        found.stores_result = version >= 5;
    }
    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn je_branches_and_does_not_store() {
        let i = lookup(OperandCountTag::Op2, 1, 3).unwrap();
        assert_eq!(i.name, "je");
        assert!(i.has_branch);
        assert!(!i.stores_result);
    }

    #[test]
    fn op1_15_resolves_by_version() {
        let v3 = lookup(OperandCountTag::Op1, 15, 3).unwrap();
        assert_eq!(v3.name, "not");
        let v5 = lookup(OperandCountTag::Op1, 15, 5).unwrap();
        assert_eq!(v5.name, "call_1n");
        assert!(!v5.stores_result);
    }

    #[test]
    fn save_is_branch_pre_v4_and_store_v4_plus() {
        let v3 = lookup(OperandCountTag::Op0, 5, 3).unwrap();
        assert!(v3.has_branch && !v3.stores_result);
        let v4 = lookup(OperandCountTag::Op0, 5, 4).unwrap();
        assert!(!v4.has_branch && v4.stores_result);
    }

    #[test]
    fn sread_does_not_store_but_aread_does() {
        let v3 = lookup(OperandCountTag::Var, 4, 3).unwrap();
        assert!(!v3.stores_result);
        let v5 = lookup(OperandCountTag::Var, 4, 5).unwrap();
        assert!(v5.stores_result);
    }
}
