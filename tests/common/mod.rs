//! Shared helpers for assembling minimal story-file images byte-by-byte.
//!
//! These tests exercise the engine the way a host actually would: build a
//! handful of real instructions into a synthetic image, drive `Engine`
//! through the channel-based host protocol, and assert on the resulting
//! memory/events. Nothing here decodes or re-implements an opcode; it only
//! emits the bytes for ones already covered by `src/opcode_tables.rs`.

use std::sync::mpsc::{channel, Receiver};

use zengine::{Engine, EngineConfig, HostEvent, Memory};

/// A blank story image of `len` bytes with the header fields a test usually
/// needs to set: version, static-memory base (everything below it is
/// writable dynamic memory), and the initial program counter.
pub fn blank_story(version: u8, len: usize, static_base: u16, initial_pc: u16) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    bytes[0x00] = version;
    bytes[0x0E] = (static_base >> 8) as u8;
    bytes[0x0F] = (static_base & 0xFF) as u8;
    bytes[0x06] = (initial_pc >> 8) as u8;
    bytes[0x07] = (initial_pc & 0xFF) as u8;
    bytes
}

pub fn set_globals_addr(bytes: &mut [u8], addr: u16) {
    bytes[0x0C] = (addr >> 8) as u8;
    bytes[0x0D] = (addr & 0xFF) as u8;
}

pub fn set_object_table_addr(bytes: &mut [u8], addr: u16) {
    bytes[0x0A] = (addr >> 8) as u8;
    bytes[0x0B] = (addr & 0xFF) as u8;
}

/// Build an `Engine` from a raw image, playing the host's role: the
/// engine's events arrive on the returned `Receiver<HostEvent>`. Host
/// responses are handed back by calling `Engine::resume_with` directly.
pub fn make_engine(bytes: Vec<u8>) -> (Engine, Receiver<HostEvent>) {
    let memory = Memory::load(bytes).expect("valid story image");
    let (events_tx, events_rx) = channel();
    let engine = Engine::new(memory, EngineConfig::default(), events_tx);
    (engine, events_rx)
}

/// Write a short-form 0OP instruction (`rtrue`, `quit`, `new_line`, ...) with
/// no operands. Returns the address right after it.
pub fn write_op0(bytes: &mut [u8], addr: usize, opcode_number: u8) -> usize {
    bytes[addr] = 0xB0 | opcode_number;
    addr + 1
}

/// Write an inline-text 0OP instruction (`print`/`print_ret`, opcode numbers
/// 2/3). Returns the address right after it.
pub fn write_print(bytes: &mut Vec<u8>, addr: usize, opcode_number: u8, text: &str, version: u8) -> usize {
    bytes[addr] = 0xB0 | opcode_number;
    let words = zengine::zstring::encode(text, version, None);
    let mut cursor = addr + 1;
    for w in words {
        bytes[cursor] = (w >> 8) as u8;
        bytes[cursor + 1] = (w & 0xFF) as u8;
        cursor += 2;
    }
    cursor
}

/// Write `store` (2OP:13, long form, two small constants): `globals[var] =
/// value`. `var` is the raw variable number (16+ for globals).
pub fn write_store_const(bytes: &mut [u8], addr: usize, var: u8, value: u8) -> usize {
    bytes[addr] = 0x0D;
    bytes[addr + 1] = var;
    bytes[addr + 2] = value;
    addr + 3
}

/// Write `insert_obj` (2OP:14, long form, two small constants).
pub fn write_insert_obj(bytes: &mut [u8], addr: usize, obj: u8, dest: u8) -> usize {
    bytes[addr] = 0x0E;
    bytes[addr + 1] = obj;
    bytes[addr + 2] = dest;
    addr + 3
}

/// Write `div` (2OP:23, long form, two small constants), storing into `var`.
pub fn write_div(bytes: &mut [u8], addr: usize, a: u8, b: u8, var: u8) -> usize {
    bytes[addr] = 0x17;
    bytes[addr + 1] = a;
    bytes[addr + 2] = b;
    bytes[addr + 3] = var;
    addr + 4
}

/// Write `save`/`restore` (0OP:5/6) with a one-byte forward branch, for
/// pre-v4 stories where these branch on success instead of storing a
/// result. `skip_bytes` is the size of the instruction the branch jumps
/// over when the condition succeeds.
pub fn write_branching_save_or_restore(bytes: &mut [u8], addr: usize, opcode_number: u8, skip_bytes: u8) -> usize {
    bytes[addr] = 0xB0 | opcode_number;
    // One-byte branch form: bit7 = on_true, bit6 = one-byte, bits0-5 = offset.
    bytes[addr + 1] = 0x80 | 0x40 | (skip_bytes + 2);
    addr + 2
}

/// Write `save`/`restore` (0OP:5/6) storing into `var`, for v4+ stories.
pub fn write_storing_save_or_restore(bytes: &mut [u8], addr: usize, opcode_number: u8, var: u8) -> usize {
    bytes[addr] = 0xB0 | opcode_number;
    bytes[addr + 1] = var;
    addr + 2
}

/// Write `save_undo`/`restore_undo` (EXT:9/10), always storing into `var`.
pub fn write_ext_store(bytes: &mut [u8], addr: usize, ext_number: u8, var: u8) -> usize {
    bytes[addr] = 0xBE;
    bytes[addr + 1] = ext_number;
    bytes[addr + 2] = 0xFF; // all four operand slots omitted
    bytes[addr + 3] = var;
    addr + 4
}

/// Write `sread`/`aread` (VAR:4) with a two-byte text-buffer address operand
/// and no parse buffer. Storing a terminator only happens on v5+; see
/// `opcode_tables::lookup`'s `Var, 4` special case.
pub fn write_sread(bytes: &mut [u8], addr: usize, text_buffer: u16, store_var: Option<u8>) -> usize {
    bytes[addr] = 0xE4; // variable form, VAR category, opcode 4
    bytes[addr + 1] = 0x3F; // Large, Omitted, Omitted, Omitted
    bytes[addr + 2] = (text_buffer >> 8) as u8;
    bytes[addr + 3] = (text_buffer & 0xFF) as u8;
    let mut cursor = addr + 4;
    if let Some(v) = store_var {
        bytes[cursor] = v;
        cursor += 1;
    }
    cursor
}

/// Write `read_char` (VAR:22) with no operands, storing into `var`.
pub fn write_read_char(bytes: &mut [u8], addr: usize, var: u8) -> usize {
    bytes[addr] = 0xF6; // variable form, VAR category, opcode 22
    bytes[addr + 1] = 0xFF; // all operand slots omitted
    bytes[addr + 2] = var;
    addr + 3
}

/// Build a v1-3 object table with `obj_count` objects at `table_addr`,
/// each with a zero-length short name, starting fully detached (no
/// parent/sibling/child).
pub fn write_object_table_v3(bytes: &mut [u8], table_addr: u16, obj_count: u16) {
    let defaults_size = 31 * 2;
    let entries_base = table_addr as u32 + defaults_size;
    let entry_size = 9;
    for i in 0..obj_count {
        let addr = entries_base + i as u32 * entry_size;
        let props_addr = table_addr as u32 + 400 + i as u32 * 10;
        bytes[addr as usize + 7] = (props_addr >> 8) as u8;
        bytes[addr as usize + 8] = (props_addr & 0xFF) as u8;
        bytes[props_addr as usize] = 0; // zero-length short name
    }
}

/// Drain whatever events are currently queued on `rx` without blocking.
pub fn drain(rx: &Receiver<HostEvent>) -> Vec<HostEvent> {
    rx.try_iter().collect()
}
