//! A minimal `print` + `quit` program run end to end through the public
//! `Engine` API, the way a host's boot sequence would.

mod common;

use zengine::host::OutputStream;
use zengine::{EngineState, HostEvent};

#[test]
fn print_then_quit_emits_text_then_quit_and_halts() {
    let mut bytes = common::blank_story(3, 0x400, 0x10, 0x10);
    let addr = common::write_print(&mut bytes, 0x10, 2, "hello", 3);
    common::write_op0(&mut bytes, addr, 10); // quit

    let (mut engine, events_rx) = common::make_engine(bytes);
    engine.run().expect("no fatal error");

    assert_eq!(engine.state(), EngineState::Halted);
    let events = common::drain(&events_rx);
    assert_eq!(
        events,
        vec![
            HostEvent::Text {
                stream: OutputStream::Screen,
                text: "hello".to_string(),
            },
            HostEvent::Quit,
        ]
    );
}

#[test]
fn unresolved_channel_text_goes_to_stream_three_when_redirected() {
    // output_stream selector 3 (VAR:19) with a two-byte table address
    // operand, followed by print/quit, confirms the memory-table
    // redirection takes over screen output entirely.
    let mut bytes = common::blank_story(3, 0x400, 0x10, 0x10);
    let table_addr: u16 = 0x20;
    let mut addr = 0x10usize;
    bytes[addr] = 0xF3; // variable form, VAR category, opcode 19 == output_stream
    bytes[addr + 1] = 0x4F; // Small, Large, Omitted, Omitted
    bytes[addr + 2] = 3; // selector = 3 (small constant)
    bytes[addr + 3] = (table_addr >> 8) as u8;
    bytes[addr + 4] = (table_addr & 0xFF) as u8;
    addr += 5;
    addr = common::write_print(&mut bytes, addr, 2, "hi", 3);
    common::write_op0(&mut bytes, addr, 10);

    let (mut engine, events_rx) = common::make_engine(bytes);
    engine.run().expect("no fatal error");

    assert_eq!(engine.memory().read_word(table_addr as u32), 2);
    assert_eq!(engine.memory().read_byte(table_addr as u32 + 2), b'h');
    let events = common::drain(&events_rx);
    // No Text event reached the screen; only Quit made it out.
    assert_eq!(events, vec![HostEvent::Quit]);
}
