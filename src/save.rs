//! Save-state encoding and the in-memory undo ring.
//!
//! This is a custom full-image format ("GOZM"), not Quetzal: rather than
//! diff-encoding dynamic memory against the original story file, it stores
//! the whole dynamic-memory region plus the call stack verbatim. Simpler to
//! get right, at the cost of larger save files — an acceptable trade for an
//! engine that doesn't need to interoperate with other interpreters' saves.

use crate::header::Header;
use crate::host::SaveRecord;
use crate::memory::Memory;
use crate::stack::{CallFrame, CallStack, ReturnKind};

const MAGIC: &[u8; 4] = b"GOZM";
const VERSION: u8 = 1;

pub fn make_record(memory: &Memory, stack: &CallStack, pc: u32) -> SaveRecord {
    SaveRecord {
        dynamic_memory: memory.dynamic_memory().to_vec(),
        stack_snapshot: encode_stack(stack),
        pc,
        release: memory.header().release,
        serial: memory.header().serial,
        checksum: memory.header().checksum_file,
    }
}

/// Serialize a full record to bytes, for hosts that persist saves as files.
pub fn encode(record: &SaveRecord) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&record.release.to_be_bytes());
    out.extend_from_slice(&record.serial);
    out.extend_from_slice(&record.checksum.to_be_bytes());
    out.extend_from_slice(&record.pc.to_be_bytes());
    out.extend_from_slice(&(record.dynamic_memory.len() as u32).to_be_bytes());
    out.extend_from_slice(&record.dynamic_memory);
    out.extend_from_slice(&(record.stack_snapshot.len() as u32).to_be_bytes());
    out.extend_from_slice(&record.stack_snapshot);
    out
}

pub fn decode(bytes: &[u8]) -> Result<SaveRecord, String> {
    if bytes.len() < 4 || &bytes[0..4] != MAGIC {
        return Err("not a recognized save file".to_string());
    }
    let mut cursor = 4usize;
    let _version = read_u8(bytes, &mut cursor)?;
    let release = read_u16(bytes, &mut cursor)?;
    let serial = read_bytes(bytes, &mut cursor, 6)?;
    let checksum = read_u16(bytes, &mut cursor)?;
    let pc = read_u32(bytes, &mut cursor)?;
    let mem_len = read_u32(bytes, &mut cursor)? as usize;
    let dynamic_memory = read_bytes(bytes, &mut cursor, mem_len)?;
    let stack_len = read_u32(bytes, &mut cursor)? as usize;
    let stack_snapshot = read_bytes(bytes, &mut cursor, stack_len)?;
    let mut serial_arr = [0u8; 6];
    serial_arr.copy_from_slice(&serial);
    Ok(SaveRecord {
        dynamic_memory,
        stack_snapshot,
        pc,
        release,
        serial: serial_arr,
        checksum,
    })
}

/// Whether `record` plausibly belongs to `header`'s story (release, serial
/// and checksum all match). A mismatch is a warning-grade anomaly, not
/// fatal; the caller decides whether to accept anyway.
pub fn matches_story(record: &SaveRecord, header: &Header) -> bool {
    record.release == header.release
        && record.serial == header.serial
        && record.checksum == header.checksum_file
}

fn encode_stack(stack: &CallStack) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(stack.depth() as u32).to_be_bytes());
    for frame in stack.frames_for_save() {
        out.extend_from_slice(&frame.return_pc.to_be_bytes());
        out.push(frame.local_count);
        for i in 0..frame.local_count as usize {
            out.extend_from_slice(&frame.locals[i].to_be_bytes());
        }
        let kind = match frame.return_kind {
            ReturnKind::Discard => 0u8,
            ReturnKind::Store(v) => {
                out.push(1);
                out.push(v);
                continue;
            }
            ReturnKind::Interrupt => 2,
        };
        out.push(kind);
        out.extend_from_slice(&frame.tag.to_be_bytes());
        out.extend_from_slice(&(frame.eval_stack.len() as u32).to_be_bytes());
        for v in &frame.eval_stack {
            out.extend_from_slice(&v.to_be_bytes());
        }
    }
    out
}

pub fn decode_stack(bytes: &[u8]) -> Result<CallStack, String> {
    let mut cursor = 0usize;
    let count = read_u32(bytes, &mut cursor)?;
    let mut stack = CallStack::new();
    for _ in 0..count {
        let return_pc = read_u32(bytes, &mut cursor)?;
        let local_count = read_u8(bytes, &mut cursor)?;
        let mut locals = [0u16; 15];
        for slot in locals.iter_mut().take(local_count as usize) {
            *slot = read_u16(bytes, &mut cursor)?;
        }
        let kind_tag = read_u8(bytes, &mut cursor)?;
        let return_kind = match kind_tag {
            0 => ReturnKind::Discard,
            1 => ReturnKind::Store(read_u8(bytes, &mut cursor)?),
            _ => ReturnKind::Interrupt,
        };
        let tag = read_u16(bytes, &mut cursor)?;
        let eval_len = read_u32(bytes, &mut cursor)?;
        let mut eval_stack = Vec::with_capacity(eval_len as usize);
        for _ in 0..eval_len {
            eval_stack.push(read_u16(bytes, &mut cursor)?);
        }
        stack.push_frame(CallFrame {
            return_pc,
            locals,
            local_count,
            eval_stack,
            return_kind,
            tag,
        });
    }
    Ok(stack)
}

fn read_u8(bytes: &[u8], cursor: &mut usize) -> Result<u8, String> {
    let v = *bytes.get(*cursor).ok_or("truncated save data")?;
    *cursor += 1;
    Ok(v)
}

fn read_u16(bytes: &[u8], cursor: &mut usize) -> Result<u16, String> {
    let hi = read_u8(bytes, cursor)?;
    let lo = read_u8(bytes, cursor)?;
    Ok(((hi as u16) << 8) | lo as u16)
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32, String> {
    let mut v = 0u32;
    for _ in 0..4 {
        v = (v << 8) | read_u8(bytes, cursor)? as u32;
    }
    Ok(v)
}

fn read_bytes(bytes: &[u8], cursor: &mut usize, len: usize) -> Result<Vec<u8>, String> {
    let end = *cursor + len;
    if end > bytes.len() {
        return Err("truncated save data".to_string());
    }
    let slice = bytes[*cursor..end].to_vec();
    *cursor = end;
    Ok(slice)
}

/// Fixed-depth LIFO of save snapshots for `save_undo`/`restore_undo`.
pub struct UndoRing {
    entries: Vec<SaveRecord>,
    depth: usize,
}

impl UndoRing {
    pub fn new(depth: usize) -> Self {
        UndoRing {
            entries: Vec::new(),
            depth,
        }
    }

    pub fn push(&mut self, record: SaveRecord) {
        if self.depth == 0 {
            return;
        }
        if self.entries.len() >= self.depth {
            self.entries.remove(0);
        }
        self.entries.push(record);
    }

    pub fn pop(&mut self) -> Option<SaveRecord> {
        self.entries.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> SaveRecord {
        SaveRecord {
            dynamic_memory: vec![1, 2, 3, 4],
            stack_snapshot: vec![0, 0, 0, 0],
            pc: 0x1234,
            release: 7,
            serial: *b"990101",
            checksum: 0xBEEF,
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let record = sample_record();
        let bytes = encode(&record);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.pc, record.pc);
        assert_eq!(decoded.dynamic_memory, record.dynamic_memory);
        assert_eq!(decoded.serial, record.serial);
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(decode(b"NOPE").is_err());
    }

    #[test]
    fn undo_ring_respects_depth_cap() {
        let mut ring = UndoRing::new(2);
        ring.push(sample_record());
        ring.push(sample_record());
        ring.push(sample_record());
        assert!(ring.pop().is_some());
        assert!(ring.pop().is_some());
        assert!(ring.pop().is_none());
    }
}
