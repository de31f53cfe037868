//! Arithmetic, bitwise, comparison, and direct memory/variable opcodes.

use super::{signed, store_result, take_branch, value_of};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::instruction::Instruction;
use crate::ops::variables;

pub fn execute_arithmetic(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    let a = value_of(engine, &instr.operands[0]);
    match instr.name {
        "not" => {
            store_result(engine, instr, !a);
            return Ok(());
        }
        _ => {}
    }
    let b = value_of(engine, &instr.operands[1]);
    let result = match instr.name {
        "add" => (signed(a).wrapping_add(signed(b))) as u16,
        "sub" => (signed(a).wrapping_sub(signed(b))) as u16,
        "mul" => (signed(a).wrapping_mul(signed(b))) as u16,
        "div" => {
            if signed(b) == 0 {
                return Err(EngineError::Fatal("division by zero".to_string()));
            }
            (signed(a).wrapping_div(signed(b))) as u16
        }
        "mod" => {
            if signed(b) == 0 {
                return Err(EngineError::Fatal("division by zero in mod".to_string()));
            }
            (signed(a).wrapping_rem(signed(b))) as u16
        }
        "or" => a | b,
        "and" => a & b,
        _ => unreachable!(),
    };
    store_result(engine, instr, result);
    Ok(())
}

pub fn execute_shift(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    let value = value_of(engine, &instr.operands[0]);
    let places = signed(value_of(engine, &instr.operands[1]));
    let result = match (instr.name, places.cmp(&0)) {
        (_, std::cmp::Ordering::Equal) => value,
        ("log_shift", std::cmp::Ordering::Greater) => value.wrapping_shl(places as u32),
        ("log_shift", std::cmp::Ordering::Less) => value.wrapping_shr((-places) as u32),
        ("art_shift", std::cmp::Ordering::Greater) => (signed(value) << places) as u16,
        ("art_shift", std::cmp::Ordering::Less) => (signed(value) >> (-places)) as u16,
        _ => unreachable!(),
    };
    store_result(engine, instr, result);
    Ok(())
}

pub fn execute_random(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    let range = signed(value_of(engine, &instr.operands[0]));
    let result = engine.random.random(range) as u16;
    store_result(engine, instr, result);
    Ok(())
}

pub fn execute_compare(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    let condition = match instr.name {
        "je" => {
            let a = value_of(engine, &instr.operands[0]);
            instr.operands[1..]
                .iter()
                .any(|op| value_of(engine, op) == a)
        }
        "jl" => signed(value_of(engine, &instr.operands[0])) < signed(value_of(engine, &instr.operands[1])),
        "jg" => signed(value_of(engine, &instr.operands[0])) > signed(value_of(engine, &instr.operands[1])),
        "jz" => value_of(engine, &instr.operands[0]) == 0,
        "test" => {
            let bitmap = value_of(engine, &instr.operands[0]);
            let flags = value_of(engine, &instr.operands[1]);
            bitmap & flags == flags
        }
        "dec_chk" => {
            let var = value_of(engine, &instr.operands[0]) as u8;
            let bound = signed(value_of(engine, &instr.operands[1]));
            let current = signed(variables::peek_in_place(engine, var));
            let updated = current.wrapping_sub(1);
            variables::write_in_place(engine, var, updated as u16);
            updated < bound
        }
        "inc_chk" => {
            let var = value_of(engine, &instr.operands[0]) as u8;
            let bound = signed(value_of(engine, &instr.operands[1]));
            let current = signed(variables::peek_in_place(engine, var));
            let updated = current.wrapping_add(1);
            variables::write_in_place(engine, var, updated as u16);
            updated > bound
        }
        _ => unreachable!(),
    };
    take_branch(engine, instr, condition);
    Ok(())
}

pub fn execute_memory(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    match instr.name {
        "loadw" => {
            let base = value_of(engine, &instr.operands[0]) as u32;
            let index = signed(value_of(engine, &instr.operands[1])) as i32;
            let addr = (base as i32 + index * 2) as u32;
            let value = engine.memory.read_word(addr);
            store_result(engine, instr, value);
        }
        "loadb" => {
            let base = value_of(engine, &instr.operands[0]) as u32;
            let index = signed(value_of(engine, &instr.operands[1])) as i32;
            let addr = (base as i32 + index) as u32;
            let value = engine.memory.read_byte(addr) as u16;
            store_result(engine, instr, value);
        }
        "storew" => {
            let base = value_of(engine, &instr.operands[0]) as u32;
            let index = signed(value_of(engine, &instr.operands[1])) as i32;
            let value = value_of(engine, &instr.operands[2]);
            let addr = (base as i32 + index * 2) as u32;
            let _ = engine.memory.write_word(addr, value);
        }
        "storeb" => {
            let base = value_of(engine, &instr.operands[0]) as u32;
            let index = signed(value_of(engine, &instr.operands[1])) as i32;
            let value = value_of(engine, &instr.operands[2]) as u8;
            let addr = (base as i32 + index) as u32;
            let _ = engine.memory.write_byte(addr, value);
        }
        "store" => {
            let var = value_of(engine, &instr.operands[0]) as u8;
            let value = value_of(engine, &instr.operands[1]);
            variables::write_in_place(engine, var, value);
        }
        "load" => {
            let var = value_of(engine, &instr.operands[0]) as u8;
            let value = variables::peek_in_place(engine, var);
            store_result(engine, instr, value);
        }
        "push" => {
            let value = value_of(engine, &instr.operands[0]);
            engine.stack.push_value(value, &mut engine.warnings);
        }
        "pull" => {
            let var = value_of(engine, &instr.operands[0]) as u8;
            let value = engine.stack.pop_value(&mut engine.warnings);
            variables::write_in_place(engine, var, value);
        }
        "inc" => {
            let var = value_of(engine, &instr.operands[0]) as u8;
            let value = signed(variables::peek_in_place(engine, var)).wrapping_add(1);
            variables::write_in_place(engine, var, value as u16);
        }
        "dec" => {
            let var = value_of(engine, &instr.operands[0]) as u8;
            let value = signed(variables::peek_in_place(engine, var)).wrapping_sub(1);
            variables::write_in_place(engine, var, value as u16);
        }
        _ => unreachable!(),
    }
    Ok(())
}
