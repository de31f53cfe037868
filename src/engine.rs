//! Execution engine: decode/dispatch loop, blocking suspension points, and
//! the state machine that tracks what kind of host response is pending.

use std::collections::VecDeque;
use std::sync::mpsc::Sender;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::host::{HostEvent, HostResponse};
use crate::instruction::{self, Instruction};
use crate::memory::Memory;
use crate::object::{self, ObjectStore};
use crate::random::ZRandom;
use crate::save::UndoRing;
use crate::stack::CallStack;
use crate::warnings::Warnings;

const INSTRUCTION_LOG_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    WaitingForInput,
    WaitingForCharacter,
    WaitingForSaveResponse,
    WaitingForRestoreResponse,
    Halted,
}

/// Which output streams are currently selected; `screen` and `transcript`
/// can be active simultaneously, memory-table redirection takes over
/// entirely while active.
pub struct StreamState {
    pub screen: bool,
    pub transcript: bool,
    /// `(table base address, bytes written so far)`. The length word at
    /// `base` is rewritten on every write to reflect the running total;
    /// text itself accumulates starting at `base + 2`.
    pub memory_table: Option<(u32, u16)>,
    pub command: bool,
}

impl Default for StreamState {
    fn default() -> Self {
        StreamState {
            screen: true,
            transcript: false,
            memory_table: None,
            command: false,
        }
    }
}

pub struct Engine {
    pub(crate) memory: Memory,
    pub(crate) store: Box<dyn ObjectStore>,
    pub(crate) stack: CallStack,
    pub(crate) warnings: Warnings,
    pub(crate) config: EngineConfig,
    pub(crate) random: ZRandom,
    pub(crate) undo: UndoRing,
    pub(crate) pc: u32,
    pub(crate) state: EngineState,
    pub(crate) streams: StreamState,
    pub(crate) events_out: Sender<HostEvent>,
    pub(crate) instruction_log: VecDeque<String>,
    pub(crate) pending_store: Option<u8>,
    /// Set instead of `pending_store` by pre-v4 `save`/`restore`, which
    /// branch on success rather than storing a result.
    pub(crate) pending_branch: Option<crate::instruction::Branch>,
    pub(crate) quit_requested: bool,
    /// Argument count of the most recent `call*`, consulted by
    /// `check_arg_count`.
    pub(crate) last_call_arg_count: usize,
    /// What a `WaitingFor*` state is waiting to complete.
    pub(crate) pending_op: crate::ops::io::PendingOp,
}

impl Engine {
    /// `events_out` is the engine's only outbound channel; host responses
    /// come back in through [`Engine::resume_with`]'s argument rather than a
    /// paired inbound channel, so the caller decides how (and on what
    /// thread) to wait for one.
    pub fn new(memory: Memory, config: EngineConfig, events_out: Sender<HostEvent>) -> Self {
        let version = memory.version();
        let store = object::store_for_version(version);
        let initial_pc = if version == 6 {
            memory.unpack_address(memory.header().initial_pc, true)
        } else {
            memory.header().initial_pc as u32
        };
        let undo_depth = config.undo_depth;
        Engine {
            memory,
            store,
            stack: CallStack::new(),
            warnings: Warnings::new(),
            config,
            random: ZRandom::new(),
            undo: UndoRing::new(undo_depth),
            pc: initial_pc,
            state: EngineState::Running,
            streams: StreamState::default(),
            events_out,
            instruction_log: VecDeque::with_capacity(INSTRUCTION_LOG_DEPTH),
            pending_store: None,
            pending_branch: None,
            quit_requested: false,
            last_call_arg_count: 0,
            pending_op: crate::ops::io::PendingOp::None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Read-only access to the story's memory image, for hosts that want to
    /// inspect globals or object state (e.g. a debugger or a test harness)
    /// without routing everything through opcodes.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    fn abbrev_table_addr(&self) -> u16 {
        self.memory.header().abbrev_table
    }

    fn emit(&self, event: HostEvent) {
        // The host is the single consumer; a closed channel means the host
        // went away, which the engine can't do anything about beyond
        // stopping further sends.
        let _ = self.events_out.send(event);
    }

    fn log_instruction(&mut self, instr: &Instruction) {
        if self.instruction_log.len() >= INSTRUCTION_LOG_DEPTH {
            self.instruction_log.pop_front();
        }
        self.instruction_log
            .push_back(format!("{:#06x}: {}", instr.addr, instr.name));
        log::trace!("{:#06x}: {}", instr.addr, instr.name);
    }

    /// Last instructions executed, oldest first, for crash diagnostics.
    pub fn recent_instructions(&self) -> Vec<String> {
        self.instruction_log.iter().cloned().collect()
    }

    /// Run instructions until the engine halts, quits, or reaches a
    /// blocking suspension point (read/read_char/save/restore).
    pub fn run(&mut self) -> Result<(), EngineError> {
        loop {
            match self.state {
                EngineState::Halted => return Ok(()),
                EngineState::Running => self.step()?,
                _ => return Ok(()), // caller must supply a HostResponse first
            }
            if self.quit_requested {
                self.state = EngineState::Halted;
                self.emit(HostEvent::Quit);
                return Ok(());
            }
        }
    }

    /// Decode and execute exactly one instruction. When
    /// `unknown_opcode_is_fatal` is false, a decode failure is logged as a
    /// warning and skipped by advancing past the offending byte, instead of
    /// aborting the run.
    fn step(&mut self) -> Result<(), EngineError> {
        let abbrev_addr = self.abbrev_table_addr();
        match instruction::decode(&self.memory, self.pc, abbrev_addr) {
            Ok(instr) => {
                self.log_instruction(&instr);
                self.pc = instr.next_addr;
                crate::ops::execute(self, &instr)
            }
            Err(e) if self.config.unknown_opcode_is_fatal => Err(EngineError::Fatal(e)),
            Err(e) => {
                self.warnings.warn_once(&format!("decode@{:#06x}", self.pc), e);
                self.pc += 1;
                Ok(())
            }
        }
    }

    /// Feed a host response back in after a blocking event, then resume
    /// running (the only path by which `WaitingFor*` states clear).
    pub fn resume_with(&mut self, response: HostResponse) -> Result<(), EngineError> {
        match response {
            HostResponse::InputResponse { .. } | HostResponse::CharacterResponse { .. } => {
                crate::ops::io::resume_with(self, response)?;
            }
            HostResponse::SaveResponse { .. } | HostResponse::RestoreResponse { .. } => {
                crate::ops::system::resume_with(self, response);
            }
        }
        self.state = EngineState::Running;
        self.run()
    }

    pub fn restart(&mut self) {
        self.memory.restart();
        self.stack = CallStack::new();
        let version = self.memory.version();
        self.pc = if version == 6 {
            self.memory.unpack_address(self.memory.header().initial_pc, true)
        } else {
            self.memory.header().initial_pc as u32
        };
        self.state = EngineState::Running;
        self.quit_requested = false;
    }

    pub(crate) fn emit_event(&self, event: HostEvent) {
        self.emit(event);
    }

    /// Route text through the currently selected output streams. Redirect
    /// to stream 3's memory table takes over entirely while active;
    /// otherwise screen and transcript both receive it when selected.
    pub(crate) fn emit_text(&mut self, text: String) {
        if let Some((base, written)) = self.streams.memory_table {
            let mut cursor = base + 2 + written as u32;
            let mut total = written;
            for byte in text.bytes() {
                let _ = self.memory.write_byte(cursor, byte);
                cursor += 1;
                total += 1;
            }
            let _ = self.memory.write_word(base, total);
            self.streams.memory_table = Some((base, total));
            return;
        }
        if self.streams.screen {
            self.emit(crate::host::HostEvent::Text {
                stream: crate::host::OutputStream::Screen,
                text: text.clone(),
            });
        }
        if self.streams.transcript {
            self.emit(crate::host::HostEvent::Text {
                stream: crate::host::OutputStream::Transcript,
                text,
            });
        }
    }

    pub(crate) fn read_variable(&mut self, var: u8) -> u16 {
        crate::ops::variables::read(self, var)
    }

    pub(crate) fn write_variable(&mut self, var: u8, value: u16) {
        crate::ops::variables::write(self, var, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    fn image_with_version(version: u8) -> Memory {
        let mut bytes = vec![0u8; 1024];
        bytes[0x00] = version;
        bytes[0x0E] = 0x03;
        bytes[0x0F] = 0x00;
        bytes[0x06] = 0x04; // initial_pc
        bytes[0x07] = 0x00;
        Memory::load(bytes).unwrap()
    }

    #[test]
    fn new_engine_starts_running_at_initial_pc() {
        let mem = image_with_version(3);
        let (tx, _rx) = channel();
        let engine = Engine::new(mem, EngineConfig::default(), tx);
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.pc, 0x0400);
    }

    #[test]
    fn restart_resets_pc_and_stack_depth() {
        let mem = image_with_version(3);
        let (tx, _rx) = channel();
        let mut engine = Engine::new(mem, EngineConfig::default(), tx);
        engine.stack.push(0, [0; 15], 0, crate::stack::ReturnKind::Discard);
        engine.restart();
        assert_eq!(engine.stack.depth(), 0);
        assert_eq!(engine.pc, 0x0400);
    }
}
