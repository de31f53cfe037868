//! Byte buffer + header model.
//!
//! `Memory` owns the story image and is the only component allowed to touch
//! the raw bytes directly; everything else (objects, strings, the call
//! stack's global-variable access) goes through its read/write methods so
//! bounds checks and the dynamic/static write boundary live in one place.

use crate::header::Header;

/// Default interpreter identity written into header bytes 0x1E/0x1F when
/// the story doesn't already specify one worth keeping.
const DEFAULT_INTERPRETER_NUMBER: u8 = 6; // IBM PC, per the Z-Machine standard's interpreter table
const DEFAULT_INTERPRETER_VERSION: u8 = b'C';
const DEFAULT_SCREEN_WIDTH: u8 = 80;
const DEFAULT_SCREEN_HEIGHT: u8 = 25;

pub struct Memory {
    bytes: Vec<u8>,
    header: Header,
    /// Unmodified copy of the loaded image, used to compute the checksum
    /// and to restart from a pristine state.
    original: Vec<u8>,
}

impl Memory {
    /// Load a story file image, validating its size and priming header
    /// fields the interpreter is responsible for.
    pub fn load(bytes: Vec<u8>) -> Result<Memory, String> {
        if bytes.len() < 64 {
            return Err("story file too small for header".to_string());
        }
        let header = Header::parse(&bytes)?;
        let original = bytes.clone();
        let mut mem = Memory {
            bytes,
            header,
            original,
        };
        mem.set_interpreter_defaults();
        mem.set_capability_flags();
        Ok(mem)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn version(&self) -> u8 {
        self.header.version
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn set_interpreter_defaults(&mut self) {
        if self.bytes[0x1E] == 0 {
            self.bytes[0x1E] = DEFAULT_INTERPRETER_NUMBER;
        }
        if self.bytes[0x1F] == 0 {
            self.bytes[0x1F] = DEFAULT_INTERPRETER_VERSION;
        }
        if self.header.version >= 4 {
            self.bytes[0x20] = DEFAULT_SCREEN_HEIGHT;
            self.bytes[0x21] = DEFAULT_SCREEN_WIDTH;
            self.bytes[0x22] = 0;
            self.bytes[0x23] = DEFAULT_SCREEN_WIDTH;
            self.bytes[0x24] = 0;
            self.bytes[0x25] = DEFAULT_SCREEN_HEIGHT;
        }
        self.header = Header::parse(&self.bytes).expect("header stayed the same size");
    }

    fn set_capability_flags(&mut self) {
        match self.header.version {
            3 => {
                // Bit 4 must be clear (status line available); bit 5 set (split
                // window available); bit 6 clear (variable-pitch not default).
                self.bytes[0x01] &= !crate::header::FLAGS1_STATUS_LINE_NOT_AVAILABLE;
                self.bytes[0x01] |= crate::header::FLAGS1_SCREEN_SPLIT_AVAILABLE;
            }
            v if v >= 4 => {
                self.bytes[0x01] |= crate::header::FLAGS1_BOLD_AVAILABLE
                    | crate::header::FLAGS1_ITALIC_AVAILABLE;
                if v >= 5 {
                    self.bytes[0x01] |= crate::header::FLAGS1_COLOURS_AVAILABLE;
                }
            }
            _ => {}
        }
        self.header = Header::parse(&self.bytes).expect("header stayed the same size");
    }

    /// Reset dynamic memory and header bytes to the pristine loaded image.
    pub fn restart(&mut self) {
        self.bytes.copy_from_slice(&self.original);
        self.set_interpreter_defaults();
        self.set_capability_flags();
    }

    pub fn read_byte(&self, addr: u32) -> u8 {
        self.bytes.get(addr as usize).copied().unwrap_or(0)
    }

    pub fn read_word(&self, addr: u32) -> u16 {
        ((self.read_byte(addr) as u16) << 8) | self.read_byte(addr + 1) as u16
    }

    pub fn read_slice(&self, addr: u32, len: usize) -> &[u8] {
        let start = addr as usize;
        let end = (start + len).min(self.bytes.len());
        if start >= self.bytes.len() {
            &[]
        } else {
            &self.bytes[start..end]
        }
    }

    /// Parse the story's custom Unicode translation table, if its header
    /// declares one via the extension table's third entry: a byte count
    /// followed by that many ZSCII-155+ codepoints, in order.
    pub fn unicode_table(&self) -> Option<Vec<u16>> {
        let ext_addr = self.header.extension_table as u32;
        if ext_addr == 0 {
            return None;
        }
        let ext_len = self.read_word(ext_addr);
        if ext_len < 3 {
            return None;
        }
        let table_addr = self.read_word(ext_addr + 3 * 2) as u32;
        if table_addr == 0 {
            return None;
        }
        let count = self.read_byte(table_addr) as u32;
        let mut table = Vec::with_capacity(count as usize);
        for i in 0..count {
            table.push(self.read_word(table_addr + 1 + i * 2));
        }
        Some(table)
    }

    /// Dynamic memory extends from 0 to `base_static_mem` (exclusive); only
    /// this region (plus a few defined writable header bytes) may be
    /// mutated.
    pub fn is_dynamic(&self, addr: u32) -> bool {
        (addr as usize) < self.header.base_static_mem as usize
    }

    pub fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), String> {
        if !self.is_dynamic(addr) {
            return Err(format!("write to non-dynamic memory at {addr:#06x}"));
        }
        if (addr as usize) >= self.bytes.len() {
            return Err(format!("memory address out of bounds: {addr:#06x}"));
        }
        self.bytes[addr as usize] = value;
        Ok(())
    }

    pub fn write_word(&mut self, addr: u32, value: u16) -> Result<(), String> {
        self.write_byte(addr, (value >> 8) as u8)?;
        self.write_byte(addr + 1, (value & 0xFF) as u8)
    }

    /// Writes within the object/property region bypass the dynamic-memory
    /// check's upper bound only in that they're always below static memory
    /// by construction; exposed separately so the object store doesn't need
    /// to special-case header bytes.
    pub fn write_byte_raw(&mut self, addr: usize, value: u8) {
        if addr < self.bytes.len() {
            self.bytes[addr] = value;
        }
    }

    pub fn read_byte_raw(&self, addr: usize) -> u8 {
        self.bytes.get(addr).copied().unwrap_or(0)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn dynamic_memory(&self) -> &[u8] {
        &self.bytes[..self.header.base_static_mem as usize]
    }

    /// Overwrite dynamic memory with `data`, used when restoring a save
    ///.
    pub fn set_dynamic_memory(&mut self, data: &[u8]) -> Result<(), String> {
        let limit = self.header.base_static_mem as usize;
        if data.len() != limit {
            return Err(format!(
                "save data has {} dynamic-memory bytes, expected {limit}",
                data.len()
            ));
        }
        self.bytes[..limit].copy_from_slice(data);
        Ok(())
    }

    /// Expand a packed address to a byte address.
    pub fn unpack_address(&self, packed: u16, is_routine: bool) -> u32 {
        match self.header.version {
            1..=3 => packed as u32 * 2,
            4..=5 => packed as u32 * 4,
            6 | 7 => {
                let offset = if is_routine {
                    self.header.routines_offset
                } else {
                    self.header.strings_offset
                };
                packed as u32 * 4 + offset as u32 * 8
            }
            _ => packed as u32 * 8,
        }
    }

    /// Sum of bytes [0x40, file_length) modulo 65536.
    pub fn compute_checksum(&self) -> u16 {
        let length = self.header.declared_file_length().min(self.bytes.len());
        if length <= 0x40 {
            return 0;
        }
        self.bytes[0x40..length]
            .iter()
            .fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
    }

    /// Whether the stored checksum matches the computed one. `verify` always
    /// reports success regardless of this — refusing to run a story over a
    /// checksum mismatch would do more harm than good.
    pub fn checksum_matches(&self) -> bool {
        self.compute_checksum() == self.header.checksum_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(version: u8, static_base: u16) -> Vec<u8> {
        let mut b = vec![0u8; 256];
        b[0x00] = version;
        b[0x0E] = (static_base >> 8) as u8;
        b[0x0F] = (static_base & 0xFF) as u8;
        b[0x1A] = 0x00;
        b[0x1B] = 0x80; // declared length = 128 * divisor
        b
    }

    #[test]
    fn dynamic_boundary_enforced() {
        let mut mem = Memory::load(image(3, 0x10)).unwrap();
        assert!(mem.write_byte(0x0F, 1).is_ok());
        assert!(mem.write_byte(0x10, 1).is_err());
    }

    #[test]
    fn packed_address_v3() {
        let mem = Memory::load(image(3, 0x10)).unwrap();
        assert_eq!(mem.unpack_address(0x1234, true), 0x2468);
    }

    #[test]
    fn packed_address_v5() {
        let mem = Memory::load(image(5, 0x10)).unwrap();
        assert_eq!(mem.unpack_address(0x1234, true), 0x1234 * 4);
    }

    #[test]
    fn packed_address_v6_routine_offset() {
        let mut bytes = image(6, 0x10);
        bytes[0x28] = 0x00;
        bytes[0x29] = 0x02; // routines_offset = 2
        let mem = Memory::load(bytes).unwrap();
        assert_eq!(mem.unpack_address(0x10, true), 0x10 * 4 + 2 * 8);
    }

    #[test]
    fn packed_address_v8() {
        let mem = Memory::load(image(8, 0x10)).unwrap();
        assert_eq!(mem.unpack_address(0x10, true), 0x10 * 8);
    }

    #[test]
    fn restart_restores_dynamic_memory() {
        let mut mem = Memory::load(image(3, 0x10)).unwrap();
        mem.write_byte(0x05, 0xFF).unwrap();
        mem.restart();
        assert_eq!(mem.read_byte(0x05), 0);
    }

    #[test]
    fn checksum_sums_declared_range() {
        let mut bytes = image(3, 0x10);
        bytes[0x1B] = 0x82; // declared length = 0x82 * 2 = 0x104 > buffer; clamp
        let mem = Memory::load(bytes).unwrap();
        let _ = mem.compute_checksum(); // must not panic even when length exceeds buffer
    }
}
