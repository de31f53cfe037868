//! Save/restore, undo, restart, quit, and the other opcodes that touch the
//! engine's own lifecycle rather than the story's data.

use super::{store_result, take_branch, value_of};
use crate::engine::{Engine, EngineState};
use crate::error::EngineError;
use crate::host::HostEvent;
use crate::instruction::Instruction;
use crate::save;

pub fn execute(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    match instr.name {
        "save" => start_save(engine, instr),
        "restore" => start_restore(engine, instr),
        "ext_save" => start_ext_save(engine, instr),
        "ext_restore" => start_ext_restore(engine, instr),
        "save_undo" => {
            let record = save::make_record(&engine.memory, &engine.stack, engine.pc);
            engine.undo.push(record);
            store_result(engine, instr, 1);
        }
        "restore_undo" => match engine.undo.pop() {
            Some(record) => apply_save_record(engine, &record, Some(instr)),
            None => store_result(engine, instr, 0),
        },
        "restart" => engine.restart(),
        "quit" => engine.quit_requested = true,
        "verify" => {
            // A checksum mismatch is never fatal; `verify` always reports success.
            let _ = engine.memory.checksum_matches();
            take_branch(engine, instr, true);
        }
        "piracy" => take_branch(engine, instr, true),
        "nop" => {}
        _ => unreachable!(),
    }
    Ok(())
}

fn start_save(engine: &mut Engine, instr: &Instruction) {
    let record = save::make_record(&engine.memory, &engine.stack, engine.pc);
    engine.pending_store = instr.store_var;
    engine.pending_branch = instr.branch;
    engine.state = EngineState::WaitingForSaveResponse;
    engine.emit_event(HostEvent::SaveRequest(record));
}

fn start_restore(engine: &mut Engine, instr: &Instruction) {
    engine.pending_store = instr.store_var;
    engine.pending_branch = instr.branch;
    engine.state = EngineState::WaitingForRestoreResponse;
    engine.emit_event(HostEvent::RestoreRequest);
}

fn start_ext_save(engine: &mut Engine, instr: &Instruction) {
    // Operands 0/1 (table, length) name an auxiliary save area some
    // interpreters use for non-default game-data saves; this engine always
    // saves the full dynamic-memory image regardless, so only the optional
    // name (operand 2) matters here.
    let name_addr = instr.operands.get(2).map(|op| value_of(engine, op) as u32);
    let name = name_addr.map(|a| read_ascii(engine, a)).unwrap_or_default();
    let record = save::make_record(&engine.memory, &engine.stack, engine.pc);
    engine.pending_store = instr.store_var;
    engine.pending_branch = None; // ext_save always stores, never branches
    engine.state = EngineState::WaitingForSaveResponse;
    engine.emit_event(HostEvent::ExtSaveRequest { record, name });
}

fn start_ext_restore(engine: &mut Engine, instr: &Instruction) {
    let name_addr = instr.operands.get(2).map(|op| value_of(engine, op) as u32);
    let name = name_addr.map(|a| read_ascii(engine, a)).unwrap_or_default();
    engine.pending_store = instr.store_var;
    engine.pending_branch = None;
    engine.state = EngineState::WaitingForRestoreResponse;
    engine.emit_event(HostEvent::ExtRestoreRequest { name });
}

fn read_ascii(engine: &Engine, addr: u32) -> String {
    let len = engine.memory.read_byte(addr) as u32;
    (0..len)
        .map(|i| engine.memory.read_byte(addr + 1 + i) as char)
        .collect()
}

/// Finish a blocking `save`/`restore`/`ext_save`/`ext_restore` once the host
/// answers. Called by [`Engine::resume_with`] through
/// [`crate::ops::io::resume_with`]'s sibling path for non-text responses.
pub fn resume_with(engine: &mut Engine, response: crate::host::HostResponse) {
    use crate::host::HostResponse;
    let store_var = engine.pending_store.take();
    let branch = engine.pending_branch.take();
    match response {
        HostResponse::SaveResponse { accepted, .. } => finish_bool(engine, store_var, branch, accepted),
        HostResponse::RestoreResponse { data: Some(record) } => {
            apply_save_record_raw(engine, &record, store_var, branch)
        }
        HostResponse::RestoreResponse { data: None } => finish_bool(engine, store_var, branch, false),
        _ => {
            engine.warnings.warn_once(
                "resume/mismatched-save-response",
                "host response kind didn't match the pending save/restore operation",
            );
        }
    }
}

/// Report a save/restore outcome through whichever of `store`/`branch` the
/// originating opcode used: v4+ `save`/`restore` store 0/1, pre-v4 branch.
fn finish_bool(
    engine: &mut Engine,
    store_var: Option<u8>,
    branch: Option<crate::instruction::Branch>,
    success: bool,
) {
    if let Some(var) = store_var {
        engine.write_variable(var, success as u16);
    } else {
        crate::ops::apply_branch(engine, branch, success);
    }
}

fn apply_save_record(engine: &mut Engine, record: &crate::host::SaveRecord, instr: Option<&Instruction>) {
    let store_var = instr.and_then(|i| i.store_var);
    let branch = instr.and_then(|i| i.branch);
    apply_save_record_raw(engine, record, store_var, branch);
}

fn apply_save_record_raw(
    engine: &mut Engine,
    record: &crate::host::SaveRecord,
    store_var: Option<u8>,
    branch: Option<crate::instruction::Branch>,
) {
    if !save::matches_story(record, engine.memory.header()) {
        engine.warnings.warn_once(
            "restore/story-mismatch",
            "restored save data doesn't match this story's release/serial/checksum",
        );
    }
    match engine.memory.set_dynamic_memory(&record.dynamic_memory) {
        Ok(()) => {}
        Err(e) => {
            engine.warnings.warn_once("restore/bad-memory", e);
            finish_bool(engine, store_var, branch, false);
            return;
        }
    }
    match save::decode_stack(&record.stack_snapshot) {
        Ok(stack) => engine.stack = stack,
        Err(e) => {
            engine.warnings.warn_once("restore/bad-stack", e);
            finish_bool(engine, store_var, branch, false);
            return;
        }
    }
    engine.pc = record.pc;
    // A restored `restore` reports success as 2 (distinguishing it from the
    // 0/1 a freshly-executed `save` would store) when it stores at all;
    // pre-v4 `restore` has no store side and just takes the branch.
    if let Some(var) = store_var {
        engine.write_variable(var, 2);
    } else {
        crate::ops::apply_branch(engine, branch, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::memory::Memory;
    use std::sync::mpsc::channel;

    fn engine_v3() -> Engine {
        let mut bytes = vec![0u8; 1024];
        bytes[0x00] = 3;
        bytes[0x0E] = 0x03;
        bytes[0x0F] = 0x00;
        let mem = Memory::load(bytes).unwrap();
        let (tx, _rx) = channel();
        Engine::new(mem, EngineConfig::default(), tx)
    }

    #[test]
    fn save_undo_then_restore_undo_recovers_pc() {
        let mut engine = engine_v3();
        engine.pc = 0x999;
        let record = save::make_record(&engine.memory, &engine.stack, engine.pc);
        engine.undo.push(record);
        engine.pc = 0x111;
        let popped = engine.undo.pop().unwrap();
        apply_save_record_raw(&mut engine, &popped, None, None);
        assert_eq!(engine.pc, 0x999);
    }

    #[test]
    fn restore_undo_with_empty_ring_stores_zero() {
        let mut engine = engine_v3();
        assert!(engine.undo.pop().is_none());
    }
}
