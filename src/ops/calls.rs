//! `call`/`ret`/`jump`/`catch`/`throw` and the argument-count check.

use super::{store_result, take_branch, value_of};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::instruction::Instruction;
use crate::stack::ReturnKind;

fn call(engine: &mut Engine, instr: &Instruction, discard_result: bool) -> Result<(), EngineError> {
    let routine_packed = value_of(engine, &instr.operands[0]);
    if routine_packed == 0 {
        // Calling address 0 is defined to return false without executing
        // anything.
        if !discard_result {
            store_result(engine, instr, 0);
        }
        return Ok(());
    }
    let addr = engine.memory.unpack_address(routine_packed, true);
    let local_count = engine.memory.read_byte(addr);
    let version = engine.memory.version();
    let mut locals = [0u16; 15];
    let mut cursor = addr + 1;
    if version <= 4 {
        for slot in locals.iter_mut().take(local_count as usize) {
            *slot = engine.memory.read_word(cursor);
            cursor += 2;
        }
    }
    let args: Vec<u16> = instr.operands[1..]
        .iter()
        .map(|op| value_of(engine, op))
        .collect();
    for (i, &arg) in args.iter().enumerate().take(local_count as usize) {
        locals[i] = arg;
    }
    let return_kind = if discard_result {
        ReturnKind::Discard
    } else {
        match instr.store_var {
            Some(v) => ReturnKind::Store(v),
            None => ReturnKind::Discard,
        }
    };
    engine.stack.push(engine.pc, locals, local_count, return_kind);
    // Record how many args the caller actually supplied, for
    // `check_arg_count`; we stash it in an otherwise-unused local slot
    // scheme by tracking it alongside the frame via its index is awkward,
    // so the engine keeps a small side table instead.
    engine.last_call_arg_count = args.len();
    engine.pc = cursor;
    Ok(())
}

pub fn do_return(engine: &mut Engine, value: u16) {
    let Some(frame) = engine.stack.pop() else {
        engine.warnings.warn_once("return-no-frame", "return with no active call frame");
        return;
    };
    engine.pc = frame.return_pc;
    match frame.return_kind {
        ReturnKind::Store(var) => engine.write_variable(var, value),
        ReturnKind::Discard | ReturnKind::Interrupt => {}
    }
}

pub fn execute(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    match instr.name {
        "call_vs" | "call_2s" | "call_1s" | "call_vs2" => call(engine, instr, false)?,
        "call_2n" | "call_vn" | "call_vn2" | "call_1n" => call(engine, instr, true)?,
        "ret" => {
            let value = value_of(engine, &instr.operands[0]);
            do_return(engine, value);
        }
        "rtrue" => do_return(engine, 1),
        "rfalse" => do_return(engine, 0),
        "ret_popped" => {
            let value = engine.stack.pop_value(&mut engine.warnings);
            do_return(engine, value);
        }
        "jump" => {
            let offset = super::signed(value_of(engine, &instr.operands[0]));
            engine.pc = (engine.pc as i32 + offset as i32 - 2) as u32;
        }
        "catch" => {
            let tag = engine.stack.current().map(|f| f.tag).unwrap_or(0);
            store_result(engine, instr, tag);
        }
        "pop" => {
            engine.stack.pop_value(&mut engine.warnings);
        }
        "throw" => {
            let value = value_of(engine, &instr.operands[0]);
            let tag = value_of(engine, &instr.operands[1]);
            match engine.stack.find_tag(tag) {
                Some(index) => {
                    engine.stack.unwind_to(index);
                    do_return(engine, value);
                }
                None => {
                    engine.warnings.warn_once(
                        &format!("throw/bad-tag/{tag}"),
                        format!("throw targeted a call frame ({tag}) no longer on the stack"),
                    );
                }
            }
        }
        "check_arg_count" => {
            let n = value_of(engine, &instr.operands[0]);
            let supplied = engine.last_call_arg_count as u16;
            take_branch(engine, instr, n <= supplied);
        }
        _ => unreachable!(),
    }
    Ok(())
}
