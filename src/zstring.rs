//! Z-character text codec.
//!
//! Z-strings pack five-bit Z-characters three to a 16-bit word, terminated
//! by a high bit set on the last word. Three alphabets plus an abbreviation
//! escape and a 10-bit ZSCII escape cover the full character repertoire.

use crate::memory::Memory;
use bitreader::BitReader;
use lazy_static::lazy_static;

const ALPHABET_A0: &str = "abcdefghijklmnopqrstuvwxyz";
const ALPHABET_A1: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// A2 position 0 is the escape-to-ZSCII marker; position 1 is newline (v1
/// only uses position 1 as newline too); positions 2.. are the usual
/// punctuation/digit row.
const ALPHABET_A2_V1: &str = " 0123456789.,!?_#'\"/\\<-:()";
const ALPHABET_A2_V2PLUS: &str = " \n0123456789.,!?_#'\"/\\-:()";

lazy_static! {
    /// Default ZSCII->Unicode accent table for codes 155-223.
    static ref DEFAULT_UNICODE_TABLE: [char; 69] = [
        'ä', 'ö', 'ü', 'Ä', 'Ö', 'Ü', 'ß', '»', '«', 'ë', 'ï', 'ÿ', 'Ë', 'Ï',
        'á', 'é', 'í', 'ó', 'ú', 'ý', 'Á', 'É', 'Í', 'Ó', 'Ú', 'Ý',
        'à', 'è', 'ì', 'ò', 'ù', 'À', 'È', 'Ì', 'Ò', 'Ù',
        'â', 'ê', 'î', 'ô', 'û', 'Â', 'Ê', 'Î', 'Ô', 'Û',
        'å', 'Å', 'ø', 'Ø', 'ã', 'ñ', 'õ', 'Ã', 'Ñ', 'Õ',
        'æ', 'Æ', 'ç', 'Ç', 'þ', 'ð', 'Þ', 'Ð', '£', 'œ', 'Œ', '¡', '¿',
    ];
}

/// Selects which of the three alphabets a Z-character index is read from.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Alphabet {
    A0,
    A1,
    A2,
}

fn alphabet_char(alpha: Alphabet, version: u8, index: u8) -> Option<char> {
    let table = match alpha {
        Alphabet::A0 => ALPHABET_A0,
        Alphabet::A1 => ALPHABET_A1,
        Alphabet::A2 if version == 1 => ALPHABET_A2_V1,
        Alphabet::A2 => ALPHABET_A2_V2PLUS,
    };
    if index < 2 {
        return None; // positions 0/1 in A2 are escapes, handled by the caller
    }
    table.chars().nth((index - 2) as usize)
}

fn zscii_to_char(code: u16, unicode_table: Option<&[u16]>) -> char {
    match code {
        0x20..=0x7E => code as u8 as char,
        0x0A | 0x0D => '\n',
        155..=223 => {
            if let Some(table) = unicode_table {
                let idx = (code - 155) as usize;
                if idx < table.len() {
                    return char::from_u32(table[idx] as u32).unwrap_or('?');
                }
            }
            let idx = (code - 155) as usize;
            DEFAULT_UNICODE_TABLE.get(idx).copied().unwrap_or('?')
        }
        _ => '?',
    }
}

fn char_to_zscii(ch: char, unicode_table: Option<&[u16]>) -> Option<u16> {
    if (0x20..=0x7E).contains(&(ch as u32)) {
        return Some(ch as u16);
    }
    if ch == '\n' {
        return Some(13);
    }
    if let Some(table) = unicode_table {
        for (i, &code) in table.iter().enumerate() {
            if code == ch as u16 {
                return Some(155 + i as u16);
            }
        }
    }
    for (i, &c) in DEFAULT_UNICODE_TABLE.iter().enumerate() {
        if c == ch {
            return Some(155 + i as u16);
        }
    }
    None
}

/// Translate a single ZSCII code to a displayable `char`, using `unicode_table`
/// in place of the default accent table when given. Used by `print_char`,
/// which prints one ZSCII code at a time rather than a packed Z-string.
pub fn code_to_char(code: u16, unicode_table: Option<&[u16]>) -> char {
    zscii_to_char(code, unicode_table)
}

/// Decode a Z-string starting at `addr`, returning the decoded text and the
/// address one past the terminating word. Stops at `bound` even without a
/// terminator bit, so a truncated or malformed string can't spin forever
/// appending zero Z-chars (out-of-range reads clamp to 0 rather than error).
pub fn decode(
    memory: &Memory,
    addr: u32,
    bound: u32,
    abbrev_table_addr: u16,
    unicode_table: Option<&[u16]>,
) -> (String, u32) {
    let mut zchars = Vec::new();
    let mut cursor = addr;
    loop {
        if cursor >= bound {
            break;
        }
        let word = memory.read_word(cursor);
        let bytes = word.to_be_bytes();
        let mut reader = BitReader::new(&bytes);
        for _ in 0..3 {
            if let Ok(v) = reader.read_u8(5) {
                zchars.push(v);
            }
        }
        cursor += 2;
        if word & 0x8000 != 0 {
            break;
        }
    }

    let mut out = String::new();
    decode_zchars(memory, &zchars, bound, abbrev_table_addr, false, unicode_table, &mut out);
    (out, cursor)
}

fn decode_zchars(
    memory: &Memory,
    zchars: &[u8],
    bound: u32,
    abbrev_table_addr: u16,
    inside_abbrev: bool,
    unicode_table: Option<&[u16]>,
    out: &mut String,
) {
    let version = memory.version();
    let mut alpha = Alphabet::A0;
    let mut shift_lock = Alphabet::A0;
    let mut i = 0;
    while i < zchars.len() {
        let z = zchars[i];
        match z {
            0 => {
                out.push(' ');
                alpha = shift_lock;
            }
            1 if version == 1 => {
                out.push('\n');
                alpha = shift_lock;
            }
            1..=3 if !inside_abbrev && (version >= 3 || (version == 2 && z == 1)) => {
                // Abbreviation escape: next Z-char selects the table entry.
                // v2 only treats Z-char 1 this way; 2/3 are shift characters
                // there, same as 4/5 in later versions.
                if i + 1 < zchars.len() {
                    let idx = (32 * (z as u16 - 1)) + zchars[i + 1] as u16;
                    let entry_addr = abbrev_table_addr as u32 + idx * 2;
                    let str_addr = memory.read_word(entry_addr) as u32 * 2;
                    let (text, _) = decode(memory, str_addr, bound, abbrev_table_addr, unicode_table);
                    out.push_str(&text);
                    i += 1;
                }
                alpha = shift_lock;
            }
            1..=3 => {
                // v1 abbreviations don't exist; v1 treats 1 specially above.
                // v2's Z-chars 2/3 and any version's remaining cases fall
                // through to shift characters.
                apply_shift(version, z, &mut alpha, &mut shift_lock);
            }
            4 | 5 if version <= 2 => {
                apply_shift(version, z, &mut alpha, &mut shift_lock);
            }
            4 => {
                alpha = Alphabet::A1;
            }
            5 => {
                alpha = Alphabet::A2;
            }
            6 if alpha == Alphabet::A2 => {
                if i + 2 < zchars.len() {
                    let top = zchars[i + 1] as u16;
                    let bottom = zchars[i + 2] as u16;
                    let code = (top << 5) | bottom;
                    out.push(zscii_to_char(code, unicode_table));
                    i += 2;
                }
                alpha = shift_lock;
            }
            _ => {
                if let Some(c) = alphabet_char(alpha, version, z) {
                    out.push(c);
                }
                alpha = shift_lock;
            }
        }
        i += 1;
    }
    let _ = inside_abbrev;
}

fn apply_shift(version: u8, z: u8, alpha: &mut Alphabet, shift_lock: &mut Alphabet) {
    if version <= 2 {
        // v1-2: 2/3 shift once, 4/5 shift-lock.
        let target = if z == 2 || z == 4 {
            Alphabet::A1
        } else {
            Alphabet::A2
        };
        if z == 4 || z == 5 {
            *shift_lock = target;
        }
        *alpha = target;
    } else {
        let target = if z == 2 { Alphabet::A1 } else { Alphabet::A2 };
        *alpha = target;
    }
}

/// Encode `text` into Z-characters padded to the version's fixed word count
/// (6 Z-chars / 2 words for v1-3, 9 Z-chars / 3 words for v4+).
pub fn encode(text: &str, version: u8, unicode_table: Option<&[u16]>) -> Vec<u16> {
    let zchar_count = if version <= 3 { 6 } else { 9 };
    let mut zchars = Vec::new();
    for ch in text.chars() {
        if zchars.len() >= zchar_count {
            break;
        }
        if let Some(pos) = ALPHABET_A0.find(ch.to_ascii_lowercase()) {
            if ch.is_ascii_uppercase() {
                push_shift_to_a1(version, &mut zchars);
                zchars.push(pos as u8 + 6);
            } else {
                zchars.push(pos as u8 + 6);
            }
            continue;
        }
        let a2 = if version == 1 {
            ALPHABET_A2_V1
        } else {
            ALPHABET_A2_V2PLUS
        };
        if let Some(pos) = a2.find(ch) {
            push_shift_to_a2(version, &mut zchars);
            zchars.push(pos as u8 + 2);
            continue;
        }
        if let Some(code) = char_to_zscii(ch, unicode_table) {
            push_shift_to_a2(version, &mut zchars);
            zchars.push(6);
            zchars.push((code >> 5) as u8);
            zchars.push((code & 0x1F) as u8);
        }
    }
    zchars.truncate(zchar_count);
    while zchars.len() < zchar_count {
        zchars.push(5);
    }

    let words_needed = zchar_count / 3;
    let mut words = Vec::with_capacity(words_needed);
    for chunk in zchars.chunks(3) {
        let w = ((chunk[0] as u16) << 10) | ((chunk[1] as u16) << 5) | chunk[2] as u16;
        words.push(w);
    }
    if let Some(last) = words.last_mut() {
        *last |= 0x8000;
    }
    words
}

fn push_shift_to_a1(version: u8, zchars: &mut Vec<u8>) {
    zchars.push(if version <= 2 { 2 } else { 4 });
}

fn push_shift_to_a2(version: u8, zchars: &mut Vec<u8>) {
    zchars.push(if version <= 2 { 3 } else { 5 });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v3_memory() -> Memory {
        let mut bytes = vec![0u8; 256];
        bytes[0x00] = 3;
        bytes[0x0E] = 0x00;
        bytes[0x0F] = 0x40;
        Memory::load(bytes).unwrap()
    }

    #[test]
    fn encode_then_decode_lowercase_word() {
        let mem = v3_memory();
        let words = encode("hello", 3, None);
        assert_eq!(words.len(), 2);
        let mut buf = mem.bytes().to_vec();
        let addr = 0x60u32;
        buf[addr as usize] = (words[0] >> 8) as u8;
        buf[addr as usize + 1] = (words[0] & 0xFF) as u8;
        buf[addr as usize + 2] = (words[1] >> 8) as u8;
        buf[addr as usize + 3] = (words[1] & 0xFF) as u8;
        let mem2 = Memory::load(buf).unwrap();
        let (text, next) = decode(&mem2, addr, mem2.len() as u32, 0, None);
        assert_eq!(text, "hello");
        assert_eq!(next, addr + 4);
    }

    #[test]
    fn decode_stops_at_bound_without_terminator() {
        // A truncated string with no terminator bit set on any word must not
        // spin forever; it stops once the cursor reaches `bound`.
        let mut bytes = vec![0u8; 256];
        bytes[0x00] = 3;
        bytes[0x0E] = 0x00;
        bytes[0x0F] = 0x40;
        let words = encode("hi", 3, None);
        let addr = 0x60u32;
        bytes[addr as usize] = (words[0] >> 8) as u8;
        bytes[addr as usize + 1] = (words[0] & 0xFF) as u8 & 0x7F; // clear terminator bit
        bytes[addr as usize + 2] = (words[1] >> 8) as u8 & 0x7F;
        bytes[addr as usize + 3] = (words[1] & 0xFF) as u8 & 0x7F;
        let mem = Memory::load(bytes).unwrap();
        let (_, next) = decode(&mem, addr, addr + 4, 0, None);
        assert_eq!(next, addr + 4);
    }

    #[test]
    fn v2_zchars_two_and_three_are_shifts_not_abbreviations() {
        let mut bytes = vec![0u8; 256];
        bytes[0x00] = 2;
        bytes[0x0E] = 0x00;
        bytes[0x0F] = 0x40;
        let mem = Memory::load(bytes).unwrap();
        let mut out = String::new();
        // Z-char 2 shifts to A1 in v1/v2 (not an abbreviation escape); the
        // next Z-char, 6, is then A1 index 4 = 'E'.
        decode_zchars(&mem, &[2, 6], 256, 0, false, None, &mut out);
        assert_eq!(out, "E");
    }

    #[test]
    fn terminator_bit_set_on_last_word() {
        let words = encode("x", 3, None);
        assert_ne!(words[1] & 0x8000, 0);
        assert_eq!(words[0] & 0x8000, 0);
    }

    #[test]
    fn uppercase_uses_shift_to_a1() {
        let words = encode("Ab", 3, None);
        // 'A' -> shift(4) then 'a'(6); 'b'(7); pad 5 5
        let w0 = words[0];
        let c0 = (w0 >> 10) & 0x1F;
        assert_eq!(c0, 4);
    }
}
