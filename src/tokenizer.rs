//! `sread`/`tokenise` word splitting and parse-buffer layout.

use crate::dictionary::Dictionary;
use crate::memory::Memory;

pub struct Token {
    pub word: String,
    pub text_offset: usize,
}

/// Split `text` into words, treating every dictionary separator byte as a
/// standalone one-character word in addition to whitespace breaks.
fn split_words(text: &str, separators: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut word_start: Option<usize> = None;
    let is_separator = |c: char| separators.iter().any(|&s| s as char == c);

    let mut flush = |tokens: &mut Vec<Token>, start: Option<usize>, end: usize| {
        if let Some(start) = start {
            if end > start {
                let word: String = chars[start..end].iter().collect();
                tokens.push(Token {
                    word,
                    text_offset: start,
                });
            }
        }
    };

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            flush(&mut tokens, word_start, i);
            word_start = None;
        } else if is_separator(c) {
            flush(&mut tokens, word_start, i);
            word_start = None;
            tokens.push(Token {
                word: c.to_string(),
                text_offset: i,
            });
        } else if word_start.is_none() {
            word_start = Some(i);
        }
        i += 1;
    }
    flush(&mut tokens, word_start, i);
    tokens
}

/// Implements `tokenise`: reads the text buffer, splits it into words, looks
/// each one up in `dict`, and writes the parse buffer. When
/// `preserve_unmatched` is set, entries for words not found in the
/// dictionary are left untouched instead of zeroed (used when the story
/// re-parses a buffer across multiple dictionaries).
pub fn tokenise(
    memory: &mut Memory,
    text_buffer: u32,
    parse_buffer: u32,
    dict: &Dictionary,
    preserve_unmatched: bool,
) -> Result<(), String> {
    let version = memory.version();
    let (text, text_start) = if version >= 5 {
        let len = memory.read_byte(text_buffer + 1) as usize;
        (read_text(memory, text_buffer + 2, len), 2u32)
    } else {
        (read_nul_terminated(memory, text_buffer + 1), 1u32)
    };

    let max_words = memory.read_byte(parse_buffer) as usize;
    let tokens = split_words(&text, &dict.separators);
    let word_count = tokens.len().min(max_words);
    memory.write_byte(parse_buffer + 1, word_count as u8)?;

    for (i, token) in tokens.iter().take(word_count).enumerate() {
        let dict_addr = dict.lookup(memory, &token.word, version);
        let entry_offset = parse_buffer + 2 + (i as u32 * 4);
        if dict_addr == 0 && preserve_unmatched {
            continue;
        }
        memory.write_word(entry_offset, dict_addr)?;
        memory.write_byte(entry_offset + 2, token.word.chars().count() as u8)?;
        memory.write_byte(entry_offset + 3, (token.text_offset as u32 + text_start) as u8)?;
    }
    Ok(())
}

fn read_text(memory: &Memory, addr: u32, len: usize) -> String {
    (0..len)
        .map(|i| memory.read_byte(addr + i as u32) as char)
        .collect()
}

/// Pre-v5 text buffers carry no length prefix; the typed text runs from
/// `addr` up to the NUL `finish_read_line` writes after it.
fn read_nul_terminated(memory: &Memory, addr: u32) -> String {
    let mut out = String::new();
    let mut cursor = addr;
    loop {
        let b = memory.read_byte(cursor);
        if b == 0 {
            break;
        }
        out.push(b as char);
        cursor += 1;
    }
    out
}
