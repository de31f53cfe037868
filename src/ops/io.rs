//! Text, screen, stream, and input opcodes: the engine's only boundary with
//! whatever presents output and gathers input. Anything that would need a
//! real terminal (cursor position, window geometry, line buffering) is
//! reported to the host as an event rather than tracked here.

use super::{signed, store_result, take_branch, value_of};
use crate::dictionary::Dictionary;
use crate::engine::{Engine, EngineState};
use crate::error::EngineError;
use crate::host::{HostEvent, HostResponse, ScreenModel, StatusBar, StatusRight, TextStyle};
use crate::instruction::Instruction;
use crate::table_ops;
use crate::tokenizer;

/// What a blocking `WaitingFor*` state needs in order to finish once the
/// host answers. `ReadLine`/`ReadChar` carry the store variable from the
/// originating instruction (`aread` stores a terminator, v1-4 `sread`
/// doesn't; `read_char` always stores).
#[derive(Debug, Clone)]
pub enum PendingOp {
    None,
    ReadLine {
        text_buffer: u32,
        parse_buffer: u32,
        store_var: Option<u8>,
    },
    ReadChar {
        store_var: Option<u8>,
    },
}

pub fn execute(engine: &mut Engine, instr: &Instruction) -> Result<(), EngineError> {
    match instr.name {
        "print" => engine.emit_text(instr.text.clone().unwrap_or_default()),
        "print_ret" => {
            let mut text = instr.text.clone().unwrap_or_default();
            text.push('\n');
            engine.emit_text(text);
            crate::ops::calls::do_return(engine, 1);
        }
        "print_addr" => {
            let addr = value_of(engine, &instr.operands[0]) as u32;
            print_at(engine, addr);
        }
        "print_paddr" => {
            let packed = value_of(engine, &instr.operands[0]);
            let addr = engine.memory.unpack_address(packed, false);
            print_at(engine, addr);
        }
        "print_char" => {
            let zscii = value_of(engine, &instr.operands[0]);
            let unicode_table = engine.memory.unicode_table();
            engine.emit_text(crate::zstring::code_to_char(zscii, unicode_table.as_deref()).to_string());
        }
        "print_num" => {
            let value = signed(value_of(engine, &instr.operands[0]));
            engine.emit_text(value.to_string());
        }
        "new_line" => engine.emit_text("\n".to_string()),
        "sread_or_aread" => start_read(engine, instr),
        "read_char" => start_read_char(engine, instr),
        "output_stream" => select_output_stream(engine, instr),
        "input_stream" => {
            let which = value_of(engine, &instr.operands[0]);
            engine.streams.command = which != 0;
        }
        "buffer_mode" => {
            // Line-buffering is a host presentation concern; nothing for
            // the engine to toggle.
        }
        "set_text_style" => {
            let bits = value_of(engine, &instr.operands[0]);
            let styles = if bits == 0 {
                vec![TextStyle::Roman]
            } else {
                let mut v = Vec::new();
                if bits & 1 != 0 {
                    v.push(TextStyle::Reverse);
                }
                if bits & 2 != 0 {
                    v.push(TextStyle::Bold);
                }
                if bits & 4 != 0 {
                    v.push(TextStyle::Italic);
                }
                if bits & 8 != 0 {
                    v.push(TextStyle::FixedPitch);
                }
                v
            };
            engine.emit_event(HostEvent::SetStyle(styles));
        }
        "set_window" => {
            let window = signed(value_of(engine, &instr.operands[0]));
            engine.emit_event(HostEvent::ScreenModel(ScreenModel {
                upper_window_lines: 0,
                split_active: window != 0,
            }));
        }
        "split_window" => {
            let lines = value_of(engine, &instr.operands[0]);
            engine.emit_event(HostEvent::ScreenModel(ScreenModel {
                upper_window_lines: lines,
                split_active: lines > 0,
            }));
        }
        "erase_window" => {
            let window = signed(value_of(engine, &instr.operands[0]));
            engine.emit_event(HostEvent::EraseWindowRequest { window });
        }
        "erase_line" => engine.emit_event(HostEvent::EraseLineRequest),
        "set_cursor" => {
            // v6 windowing's per-window cursor placement has no counterpart
            // here; the host owns cursor state entirely.
        }
        "get_cursor" => {
            let addr = value_of(engine, &instr.operands[0]) as u32;
            let _ = engine.memory.write_word(addr, 1);
            let _ = engine.memory.write_word(addr + 2, 1);
        }
        "set_colour" => {
            let foreground = value_of(engine, &instr.operands[0]) as u8;
            let background = value_of(engine, &instr.operands[1]) as u8;
            engine.emit_event(HostEvent::SetColour { foreground, background });
        }
        "show_status" => show_status(engine),
        "tokenise" => {
            let text_buffer = value_of(engine, &instr.operands[0]) as u32;
            let parse_buffer = value_of(engine, &instr.operands[1]) as u32;
            let dict_addr = if instr.operands.len() > 2 {
                let addr = value_of(engine, &instr.operands[2]);
                if addr == 0 {
                    engine.memory.header().dictionary as u32
                } else {
                    addr as u32
                }
            } else {
                engine.memory.header().dictionary as u32
            };
            let preserve_unmatched = instr
                .operands
                .get(3)
                .map(|op| value_of(engine, op) != 0)
                .unwrap_or(false);
            let dict = Dictionary::parse(&engine.memory, dict_addr);
            if let Err(e) = tokenizer::tokenise(&mut engine.memory, text_buffer, parse_buffer, &dict, preserve_unmatched) {
                engine.warnings.warn_once("tokenise/fail", e);
            }
        }
        "encode_text" => encode_text(engine, instr),
        "scan_table" => {
            let value = value_of(engine, &instr.operands[0]);
            let addr = value_of(engine, &instr.operands[1]) as u32;
            let len = value_of(engine, &instr.operands[2]);
            let flags = instr.operands.get(3).map(|op| value_of(engine, op)).unwrap_or(0x82);
            let form_is_word = flags & 0x80 != 0;
            let entry_size = (flags & 0x7F).max(1);
            let found = table_ops::scan_table(&engine.memory, addr, len, value, form_is_word, entry_size);
            store_result(engine, instr, found.unwrap_or(0) as u16);
            take_branch(engine, instr, found.is_some());
        }
        "copy_table" => {
            let src = value_of(engine, &instr.operands[0]) as u32;
            let dst = value_of(engine, &instr.operands[1]) as u32;
            let size = signed(value_of(engine, &instr.operands[2]));
            if let Err(e) = table_ops::copy_table(&mut engine.memory, src, dst, size) {
                engine.warnings.warn_once("copy_table/fail", e);
            }
        }
        "print_table" => {
            let addr = value_of(engine, &instr.operands[0]) as u32;
            let width = value_of(engine, &instr.operands[1]);
            let height = instr.operands.get(2).map(|op| value_of(engine, op)).unwrap_or(1);
            let skip = instr.operands.get(3).map(|op| value_of(engine, op)).unwrap_or(0);
            let text = table_ops::print_table(&engine.memory, addr, width, height, skip);
            engine.emit_text(text);
        }
        "sound_effect" => {
            engine
                .warnings
                .warn_once("sound_effect", "sound playback is not implemented");
        }
        _ => unreachable!(),
    }
    Ok(())
}

fn print_at(engine: &mut Engine, addr: u32) {
    let abbrev = engine.memory.header().abbrev_table;
    let unicode_table = engine.memory.unicode_table();
    let (text, _) = crate::zstring::decode(
        &engine.memory,
        addr,
        engine.memory.len() as u32,
        abbrev,
        unicode_table.as_deref(),
    );
    engine.emit_text(text);
}

fn show_status(engine: &mut Engine) {
    let location_obj = engine.read_variable(16);
    let name_addr = engine.store.short_name_addr(&engine.memory, location_obj);
    let abbrev = engine.memory.header().abbrev_table;
    let unicode_table = engine.memory.unicode_table();
    let (location, _) = crate::zstring::decode(
        &engine.memory,
        name_addr,
        engine.memory.len() as u32,
        abbrev,
        unicode_table.as_deref(),
    );
    let g1 = signed(engine.read_variable(17));
    let g2 = engine.read_variable(18);
    // Flags1 bit 1 distinguishes a time game from a score game in v3.
    let is_time_game = engine.memory.header().flags1 & 0x02 != 0;
    let right = if is_time_game {
        StatusRight::Time {
            hours: (g1.rem_euclid(24)) as u8,
            minutes: g2 as u8,
        }
    } else {
        StatusRight::Score { score: g1, moves: g2 }
    };
    engine.emit_event(HostEvent::StatusBar(StatusBar { location, right }));
}

fn select_output_stream(engine: &mut Engine, instr: &Instruction) {
    let selector = signed(value_of(engine, &instr.operands[0]));
    match selector {
        1 => engine.streams.screen = true,
        -1 => engine.streams.screen = false,
        2 => engine.streams.transcript = true,
        -2 => engine.streams.transcript = false,
        3 => {
            let addr = instr
                .operands
                .get(1)
                .map(|op| value_of(engine, op) as u32)
                .unwrap_or(0);
            // Reserve the length-prefix word; writes begin two bytes in.
            let _ = engine.memory.write_word(addr, 0);
            engine.streams.memory_table = Some((addr, 0));
        }
        -3 => engine.streams.memory_table = None,
        4 => engine.streams.command = true,
        -4 => engine.streams.command = false,
        _ => {}
    }
}

fn encode_text(engine: &mut Engine, instr: &Instruction) {
    let zscii_buffer = value_of(engine, &instr.operands[0]) as u32;
    let length = value_of(engine, &instr.operands[1]) as usize;
    let from = value_of(engine, &instr.operands[2]) as u32;
    let coded_buffer = value_of(engine, &instr.operands[3]) as u32;
    let text: String = (0..length)
        .map(|i| engine.memory.read_byte(zscii_buffer + from + i as u32) as char)
        .collect();
    let version = engine.memory.version();
    let unicode_table = engine.memory.unicode_table();
    let words = crate::zstring::encode(&text, version, unicode_table.as_deref());
    for (i, w) in words.iter().enumerate() {
        let _ = engine.memory.write_word(coded_buffer + i as u32 * 2, *w);
    }
}

fn start_read(engine: &mut Engine, instr: &Instruction) {
    let text_buffer = value_of(engine, &instr.operands[0]) as u32;
    let parse_buffer = instr
        .operands
        .get(1)
        .map(|op| value_of(engine, op) as u32)
        .unwrap_or(0);
    let max_len = engine.memory.read_byte(text_buffer);
    engine.pending_op = PendingOp::ReadLine {
        text_buffer,
        parse_buffer,
        store_var: instr.store_var,
    };
    engine.state = EngineState::WaitingForInput;
    engine.emit_event(HostEvent::InputRequest {
        max_len,
        time_limit_tenths: 0,
    });
}

fn start_read_char(engine: &mut Engine, instr: &Instruction) {
    engine.pending_op = PendingOp::ReadChar {
        store_var: instr.store_var,
    };
    engine.state = EngineState::WaitingForCharacter;
    engine.emit_event(HostEvent::WaitForCharacter { time_limit_tenths: 0 });
}

/// Finish whatever `WaitingFor*` operation is pending, consuming `response`.
/// Called by [`Engine::resume_with`] before it sets the state back to
/// `Running` and resumes the decode loop.
pub fn resume_with(engine: &mut Engine, response: HostResponse) -> Result<(), EngineError> {
    match (std::mem::replace(&mut engine.pending_op, PendingOp::None), response) {
        (
            PendingOp::ReadLine {
                text_buffer,
                parse_buffer,
                store_var,
            },
            HostResponse::InputResponse { text, terminator },
        ) => finish_read_line(engine, text_buffer, parse_buffer, store_var, &text, terminator),
        (PendingOp::ReadChar { store_var }, HostResponse::CharacterResponse { zscii }) => {
            if let Some(var) = store_var {
                engine.write_variable(var, zscii);
            }
        }
        (PendingOp::None, _) => {
            engine
                .warnings
                .warn_once("resume/no-pending-op", "host response arrived with no pending operation");
        }
        _ => {
            engine
                .warnings
                .warn_once("resume/mismatched-response", "host response kind didn't match the pending operation");
        }
    }
    Ok(())
}

fn finish_read_line(
    engine: &mut Engine,
    text_buffer: u32,
    parse_buffer: u32,
    store_var: Option<u8>,
    text: &str,
    terminator: u16,
) {
    let version = engine.memory.version();
    let lowercase = text.to_ascii_lowercase();
    if version >= 5 {
        let capacity = engine.memory.read_byte(text_buffer) as usize;
        let bytes: Vec<u8> = lowercase.bytes().take(capacity).collect();
        let _ = engine.memory.write_byte(text_buffer + 1, bytes.len() as u8);
        for (i, &b) in bytes.iter().enumerate() {
            let _ = engine.memory.write_byte(text_buffer + 2 + i as u32, b);
        }
    } else {
        let capacity = engine.memory.read_byte(text_buffer) as usize;
        let bytes: Vec<u8> = lowercase.bytes().take(capacity.saturating_sub(1)).collect();
        for (i, &b) in bytes.iter().enumerate() {
            let _ = engine.memory.write_byte(text_buffer + 1 + i as u32, b);
        }
        let _ = engine.memory.write_byte(text_buffer + 1 + bytes.len() as u32, 0);
    }

    if parse_buffer != 0 {
        let dict_addr = engine.memory.header().dictionary as u32;
        let dict = Dictionary::parse(&engine.memory, dict_addr);
        if let Err(e) = tokenizer::tokenise(&mut engine.memory, text_buffer, parse_buffer, &dict, false) {
            engine.warnings.warn_once("sread/tokenise-fail", e);
        }
    }

    if let Some(var) = store_var {
        engine.write_variable(var, terminator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::memory::Memory;
    use std::sync::mpsc::channel;

    fn engine_with_version(version: u8) -> Engine {
        let mut bytes = vec![0u8; 1024];
        bytes[0x00] = version;
        bytes[0x0E] = 0x03;
        bytes[0x0F] = 0x00;
        let mem = Memory::load(bytes).unwrap();
        let (tx, _rx) = channel();
        Engine::new(mem, EngineConfig::default(), tx)
    }

    #[test]
    fn output_stream_three_redirects_to_memory_table() {
        let mut engine = engine_with_version(3);
        let _ = engine.memory.write_byte(0x200, 0); // within dynamic memory
        let addr_operand = crate::instruction::Operand::Constant(3);
        let table_operand = crate::instruction::Operand::Constant(0x200);
        let instr = Instruction {
            addr: 0,
            opcode_number: 19,
            tag: crate::opcode_tables::OperandCountTag::Var,
            name: "output_stream",
            operands: vec![addr_operand, table_operand],
            store_var: None,
            branch: None,
            text: None,
            next_addr: 0,
        };
        select_output_stream(&mut engine, &instr);
        assert_eq!(engine.streams.memory_table, Some((0x200, 0)));
        engine.emit_text("hi".to_string());
        assert_eq!(engine.memory.read_word(0x200), 2);
        assert_eq!(engine.memory.read_byte(0x202), b'h');
        engine.emit_text("!".to_string());
        assert_eq!(engine.memory.read_word(0x200), 3); // running total, not overwritten
        assert_eq!(engine.memory.read_byte(0x205), b'!'); // appended after "hi"
    }

    #[test]
    fn finish_read_line_writes_lowercase_and_terminator() {
        let mut engine = engine_with_version(3);
        let text_buffer = 0x100u32;
        let _ = engine.memory.write_byte(text_buffer, 20);
        finish_read_line(&mut engine, text_buffer, 0, Some(0x10), "LOOK", 13);
        assert_eq!(engine.memory.read_byte(text_buffer + 1), b'l');
        assert_eq!(engine.memory.read_byte(text_buffer + 5), 0);
    }
}
