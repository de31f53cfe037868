//! Opcode execution, grouped by category. [`execute`] is the engine's only
//! entry point; everything else here is `pub(crate)` plumbing shared across
//! the category modules.

pub mod calls;
pub mod io;
pub mod math;
pub mod objects;
pub mod system;
pub mod variables;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::instruction::{Instruction, Operand};

pub fn execute(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    match instr.name {
        // Arithmetic / bitwise / comparison
        "add" | "sub" | "mul" | "div" | "mod" | "or" | "and" | "not" => {
            math::execute_arithmetic(engine, instr)
        }
        "log_shift" | "art_shift" => math::execute_shift(engine, instr),
        "random" => math::execute_random(engine, instr),
        "je" | "jl" | "jg" | "jz" | "dec_chk" | "inc_chk" | "test" => {
            math::execute_compare(engine, instr)
        }

        // Object tree / properties
        "jin" | "test_attr" | "set_attr" | "clear_attr" | "insert_obj" | "remove_obj"
        | "get_sibling" | "get_child" | "get_parent" | "get_prop" | "get_prop_addr"
        | "get_prop_len" | "get_next_prop" | "put_prop" | "print_obj" => {
            objects::execute(engine, instr)
        }

        // Calls / returns / control flow
        "call_vs" | "call_2s" | "call_1s" | "call_vs2" | "call_2n" | "call_vn" | "call_vn2"
        | "call_1n" | "ret" | "rtrue" | "rfalse" | "ret_popped" | "jump" | "catch" | "pop"
        | "throw" | "check_arg_count" => calls::execute(engine, instr),

        // Text / screen / streams / input
        "print" | "print_ret" | "print_addr" | "print_paddr" | "print_char" | "print_num"
        | "new_line" | "sread_or_aread" | "read_char" | "output_stream" | "input_stream"
        | "buffer_mode" | "set_text_style" | "set_window" | "split_window" | "erase_window"
        | "erase_line" | "set_cursor" | "get_cursor" | "set_colour" | "show_status"
        | "tokenise" | "encode_text" | "scan_table" | "copy_table" | "print_table"
        | "sound_effect" => io::execute(engine, instr),

        // Memory/variable access and system control
        "loadw" | "loadb" | "storew" | "storeb" | "store" | "load" | "push" | "pull"
        | "inc" | "dec" => math::execute_memory(engine, instr),
        "save" | "restore" | "ext_save" | "ext_restore" | "save_undo" | "restore_undo"
        | "restart" | "quit" | "verify" | "piracy" | "nop" => system::execute(engine, instr),

        other => {
            let site = format!("unimplemented-opcode/{other}");
            engine
                .warnings
                .warn_once(&site, format!("opcode {other} is not implemented"));
            Ok(())
        }
    }
}

/// Resolve an operand to its numeric value, reading through a variable
/// reference when necessary.
pub(crate) fn value_of(engine: &mut Engine, operand: &Operand) -> u16 {
    match operand {
        Operand::Constant(v) => *v,
        Operand::Variable(v) => engine.read_variable(*v),
    }
}

pub(crate) fn signed(value: u16) -> i16 {
    value as i16
}

/// Store a result into the instruction's store variable, if it has one.
pub(crate) fn store_result(engine: &mut Engine, instr: &Instruction, value: u16) {
    if let Some(var) = instr.store_var {
        engine.write_variable(var, value);
    }
}

/// Evaluate a branch given the instruction's condition result: jumps,
/// returns false/true, or falls through to the next instruction.
pub(crate) fn take_branch(engine: &mut Engine, instr: &Instruction, condition: bool) {
    apply_branch(engine, instr.branch, condition);
}

/// Like [`take_branch`], but for callers (save/restore's resume path) that no
/// longer have the originating `Instruction` in scope and must carry the
/// branch forward across a blocking host round-trip instead.
pub(crate) fn apply_branch(engine: &mut Engine, branch: Option<crate::instruction::Branch>, condition: bool) {
    let Some(branch) = branch else { return };
    if condition != branch.on_true {
        return;
    }
    if branch.is_return_false() {
        calls::do_return(engine, 0);
    } else if branch.is_return_true() {
        calls::do_return(engine, 1);
    } else {
        engine.pc = (engine.pc as i32 + branch.offset as i32 - 2) as u32;
    }
}
