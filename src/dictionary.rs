//! Dictionary header parsing and word lookup.

use crate::memory::Memory;
use crate::zstring;

pub struct Dictionary {
    pub separators: Vec<u8>,
    pub entry_length: u8,
    pub entry_count: i16,
    pub entries_addr: u32,
}

impl Dictionary {
    pub fn parse(memory: &Memory, dict_addr: u32) -> Dictionary {
        let sep_count = memory.read_byte(dict_addr);
        let mut separators = Vec::with_capacity(sep_count as usize);
        for i in 0..sep_count {
            separators.push(memory.read_byte(dict_addr + 1 + i as u32));
        }
        let header_addr = dict_addr + 1 + sep_count as u32;
        let entry_length = memory.read_byte(header_addr);
        let entry_count = memory.read_word(header_addr + 1) as i16;
        Dictionary {
            separators,
            entry_length,
            entry_count,
            entries_addr: header_addr + 3,
        }
    }

    fn encoded_bytes(&self, word: &str, version: u8) -> Vec<u8> {
        let words = zstring::encode(word, version, None);
        let mut bytes = Vec::with_capacity(words.len() * 2);
        for w in words {
            bytes.push((w >> 8) as u8);
            bytes.push((w & 0xFF) as u8);
        }
        bytes
    }

    /// Look up `word`, returning its entry address or 0 if absent.
    ///
    /// A sorted (non-negative `entry_count`) dictionary is searched with
    /// binary search; a custom, unsorted dictionary (negative count, used
    /// by `tokenise` with an explicit dictionary operand) is searched
    /// linearly, since a custom dictionary's entries aren't guaranteed sorted.
    pub fn lookup(&self, memory: &Memory, word: &str, version: u8) -> u16 {
        let key = self.encoded_bytes(word, version);
        let key_len = key.len();
        let count = self.entry_count.unsigned_abs() as u32;
        if self.entry_count >= 0 {
            let mut low = 0i64;
            let mut high = count as i64 - 1;
            while low <= high {
                let mid = (low + high) / 2;
                let addr = self.entries_addr + mid as u32 * self.entry_length as u32;
                let entry = memory.read_slice(addr, key_len);
                match entry.cmp(key.as_slice()) {
                    std::cmp::Ordering::Less => low = mid + 1,
                    std::cmp::Ordering::Greater => high = mid - 1,
                    std::cmp::Ordering::Equal => return addr as u16,
                }
            }
            0
        } else {
            for i in 0..count {
                let addr = self.entries_addr + i * self.entry_length as u32;
                if memory.read_slice(addr, key_len) == key.as_slice() {
                    return addr as u16;
                }
            }
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_with_dict() -> (Memory, u32) {
        let mut bytes = vec![0u8; 512];
        bytes[0x00] = 3;
        bytes[0x0E] = 0x01;
        bytes[0x0F] = 0x00;
        let dict_addr = 0x40u32;
        bytes[dict_addr as usize] = 1; // 1 separator
        bytes[dict_addr as usize + 1] = b',';
        let header_addr = dict_addr + 2;
        bytes[header_addr as usize] = 7; // entry length
        bytes[header_addr as usize + 1] = 0;
        bytes[header_addr as usize + 2] = 2; // 2 entries
        let entries = header_addr + 3;
        let words = zstring::encode("hello", 3, None);
        bytes[entries as usize] = (words[0] >> 8) as u8;
        bytes[entries as usize + 1] = (words[0] & 0xFF) as u8;
        bytes[entries as usize + 2] = (words[1] >> 8) as u8;
        bytes[entries as usize + 3] = (words[1] & 0xFF) as u8;
        let words2 = zstring::encode("world", 3, None);
        let addr2 = entries + 7;
        bytes[addr2 as usize] = (words2[0] >> 8) as u8;
        bytes[addr2 as usize + 1] = (words2[0] & 0xFF) as u8;
        bytes[addr2 as usize + 2] = (words2[1] >> 8) as u8;
        bytes[addr2 as usize + 3] = (words2[1] & 0xFF) as u8;
        (Memory::load(bytes).unwrap(), dict_addr)
    }

    #[test]
    fn finds_existing_word() {
        let (mem, dict_addr) = story_with_dict();
        let dict = Dictionary::parse(&mem, dict_addr);
        assert_ne!(dict.lookup(&mem, "hello", 3), 0);
    }

    #[test]
    fn reports_missing_word_as_zero() {
        let (mem, dict_addr) = story_with_dict();
        let dict = Dictionary::parse(&mem, dict_addr);
        assert_eq!(dict.lookup(&mem, "goodbye", 3), 0);
    }
}
