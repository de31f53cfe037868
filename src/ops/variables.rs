//! Variable read/write: the stack-top pseudo-variable 0, locals 1-15, and
//! globals 16-255.

use crate::engine::Engine;

pub fn read(engine: &mut Engine, var: u8) -> u16 {
    match var {
        0 => engine.stack.pop_value(&mut engine.warnings),
        1..=15 => {
            let idx = (var - 1) as usize;
            match engine.stack.current() {
                Some(frame) if idx < frame.local_count as usize => frame.locals[idx],
                Some(_) => {
                    engine.warnings.warn_once(
                        &format!("read-local-oob/{var}"),
                        format!("read of local {var} beyond this routine's declared count"),
                    );
                    0
                }
                None => {
                    engine
                        .warnings
                        .warn_once("read-local-no-frame", "local variable read with no active call frame");
                    0
                }
            }
        }
        _ => {
            let addr = global_addr(engine, var);
            engine.memory.read_word(addr)
        }
    }
}

pub fn write(engine: &mut Engine, var: u8, value: u16) {
    match var {
        0 => engine.stack.push_value(value, &mut engine.warnings),
        1..=15 => {
            let idx = (var - 1) as usize;
            if let Some(frame) = engine.stack.current_mut() {
                if idx < frame.local_count as usize {
                    frame.locals[idx] = value;
                }
            }
        }
        _ => {
            let addr = global_addr(engine, var);
            let _ = engine.memory.write_word(addr, value);
        }
    }
}

/// Read variable 0 in place without popping it — used by `inc`/`dec` and
/// indirect variable references that must not consume the stack top.
pub fn peek_in_place(engine: &mut Engine, var: u8) -> u16 {
    if var == 0 {
        engine.stack.peek_value().unwrap_or(0)
    } else {
        read(engine, var)
    }
}

pub fn write_in_place(engine: &mut Engine, var: u8, value: u16) {
    if var == 0 {
        engine.stack.set_top_value(value);
    } else {
        write(engine, var, value);
    }
}

fn global_addr(engine: &Engine, var: u8) -> u32 {
    engine.memory.header().globals_addr as u32 + (var as u32 - 16) * 2
}
