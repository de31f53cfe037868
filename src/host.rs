//! The typed boundary between the execution engine and whatever presents
//! its output and gathers its input. The engine only ever emits
//! [`HostEvent`] values and blocks waiting for a [`HostResponse`]; it never
//! touches a terminal, file, or socket directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputStream {
    Screen,
    Transcript,
    MemoryTable,
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBar {
    pub location: String,
    /// Score/moves for score games, or hours/minutes for time games.
    pub right: StatusRight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusRight {
    Score { score: i16, moves: u16 },
    Time { hours: u8, minutes: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenModel {
    pub upper_window_lines: u16,
    pub split_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextStyle {
    Roman,
    Reverse,
    Bold,
    Italic,
    FixedPitch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub dynamic_memory: Vec<u8>,
    pub stack_snapshot: Vec<u8>,
    pub pc: u32,
    pub release: u16,
    pub serial: [u8; 6],
    pub checksum: u16,
}

/// Events the engine emits toward the host. Only `InputRequest`,
/// `WaitForCharacter`, `SaveRequest`, `RestoreRequest`, `ExtSaveRequest`, and
/// `ExtRestoreRequest` block the engine thread waiting on a response; every
/// other variant is fire-and-forget.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Text { stream: OutputStream, text: String },
    StatusBar(StatusBar),
    ScreenModel(ScreenModel),
    SetStyle(Vec<TextStyle>),
    SetColour { foreground: u8, background: u8 },
    InputRequest { max_len: u8, time_limit_tenths: u16 },
    WaitForCharacter { time_limit_tenths: u16 },
    EraseWindowRequest { window: i16 },
    EraseLineRequest,
    SaveRequest(SaveRecord),
    RestoreRequest,
    /// v5+ `save`/`restore` with an explicit table and name (extended form).
    ExtSaveRequest { record: SaveRecord, name: String },
    ExtRestoreRequest { name: String },
    SoundEffectRequest { number: u16, effect: u16, volume: u8 },
    Warning(String),
    RuntimeError(String),
    Quit,
    Restart,
}

/// Responses the host sends back in answer to a blocking `HostEvent`.
#[derive(Debug, Clone, PartialEq)]
pub enum HostResponse {
    InputResponse { text: String, terminator: u16 },
    CharacterResponse { zscii: u16 },
    SaveResponse { accepted: bool, data: Option<SaveRecord> },
    RestoreResponse { data: Option<SaveRecord> },
}

/// ZSCII codes for function/cursor/keypad keys the host may report from an
/// `InputResponse` terminator or a `WaitForCharacter` answer.
pub const ZSCII_CURSOR_UP: u16 = 129;
pub const ZSCII_CURSOR_DOWN: u16 = 130;
pub const ZSCII_CURSOR_LEFT: u16 = 131;
pub const ZSCII_CURSOR_RIGHT: u16 = 132;
pub const ZSCII_FUNCTION_KEY_BASE: u16 = 133; // F1..F12 = 133..144
pub const ZSCII_KEYPAD_BASE: u16 = 145; // keypad 0..9 = 145..154
pub const ZSCII_MENU_CLICK: u16 = 254;
pub const ZSCII_DOUBLE_CLICK: u16 = 253;
pub const ZSCII_SINGLE_CLICK: u16 = 252;

/// Scan a terminating-characters table (a byte list ending in 0, with 255
/// meaning "any function key") for whether `zscii` should end input early.
pub fn is_terminator(table: &[u8], zscii: u16) -> bool {
    for &b in table {
        if b == 0 {
            break;
        }
        if b == 255 && (ZSCII_FUNCTION_KEY_BASE..ZSCII_FUNCTION_KEY_BASE + 12).contains(&zscii) {
            return true;
        }
        if b as u16 == zscii {
            return true;
        }
    }
    zscii == 13 // newline always terminates, even with an empty/absent table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_always_terminates() {
        assert!(is_terminator(&[], 13));
    }

    #[test]
    fn function_key_wildcard_matches_any_f_key() {
        let table = [255, 0];
        assert!(is_terminator(&table, ZSCII_FUNCTION_KEY_BASE + 3));
        assert!(!is_terminator(&table, ZSCII_CURSOR_UP));
    }

    #[test]
    fn explicit_byte_matches_only_itself() {
        let table = [b',' as u8, 0];
        assert!(is_terminator(&table, b',' as u16));
        assert!(!is_terminator(&table, b'.' as u16));
    }
}
