//! Story-file header parsing.
//!
//! The header occupies the first 64 bytes of every story file. All
//! multi-byte fields are big-endian.

use std::fmt;

/// Flags1 bit meanings differ between v1-3 and v4+; we only decode the bits
/// the engine actually consults.
pub const FLAGS1_STATUS_LINE_NOT_AVAILABLE: u8 = 0x10; // v3, bit 4
pub const FLAGS1_SCREEN_SPLIT_AVAILABLE: u8 = 0x20; // v3, bit 5
pub const FLAGS1_COLOURS_AVAILABLE: u8 = 0x01; // v4+, bit 0
pub const FLAGS1_BOLD_AVAILABLE: u8 = 0x04; // v4+, bit 2
pub const FLAGS1_ITALIC_AVAILABLE: u8 = 0x08; // v4+, bit 3
pub const FLAGS1_TIMED_INPUT_AVAILABLE: u8 = 0x80; // v4+, bit 7

/// Parsed story-file header.
#[derive(Debug, Clone)]
pub struct Header {
    pub version: u8,
    pub flags1: u8,
    pub release: u16,
    pub base_high_mem: u16,
    pub initial_pc: u16,
    pub dictionary: u16,
    pub object_table_addr: u16,
    pub globals_addr: u16,
    pub base_static_mem: u16,
    pub flags2: u16,
    pub serial: [u8; 6],
    pub abbrev_table: u16,
    pub file_length_word: u16,
    pub checksum_file: u16,
    pub interpreter_number_and_version: u16,
    pub screen_height_units: u16,
    pub screen_width_units: u16,
    pub routines_offset: u16,
    pub strings_offset: u16,
    pub default_background: u8,
    pub default_foreground: u8,
    pub terminating_chars_table: u16,
    pub standard_revision: u16,
    pub alphabet_table: u16,
    pub extension_table: u16,
}

impl Header {
    /// Parse a header from the first bytes of a story file.
    ///
    /// Returns an error if `bytes` is shorter than the fixed 64-byte header.
    pub fn parse(bytes: &[u8]) -> Result<Header, String> {
        if bytes.len() < 64 {
            return Err("story file too small for a header".to_string());
        }
        let word = |off: usize| -> u16 { ((bytes[off] as u16) << 8) | bytes[off + 1] as u16 };

        let mut serial = [0u8; 6];
        serial.copy_from_slice(&bytes[0x12..0x18]);

        Ok(Header {
            version: bytes[0x00],
            flags1: bytes[0x01],
            release: word(0x02),
            base_high_mem: word(0x04),
            initial_pc: word(0x06),
            dictionary: word(0x08),
            object_table_addr: word(0x0A),
            globals_addr: word(0x0C),
            base_static_mem: word(0x0E),
            flags2: word(0x10),
            serial,
            abbrev_table: word(0x18),
            file_length_word: word(0x1A),
            checksum_file: word(0x1C),
            interpreter_number_and_version: word(0x1E),
            screen_height_units: word(0x20),
            screen_width_units: word(0x22),
            routines_offset: word(0x28),
            strings_offset: word(0x2A),
            default_background: bytes[0x2C],
            default_foreground: bytes[0x2D],
            terminating_chars_table: word(0x2E),
            standard_revision: word(0x32),
            alphabet_table: word(0x34),
            extension_table: word(0x36),
        })
    }

    /// File length divisor by version.
    pub fn file_length_divisor(&self) -> usize {
        match self.version {
            1..=3 => 2,
            4..=5 => 4,
            _ => 8,
        }
    }

    /// Declared file length in bytes, per `file_length_word * divisor`.
    pub fn declared_file_length(&self) -> usize {
        self.file_length_word as usize * self.file_length_divisor()
    }

    /// Maximum number of objects addressable by this version's object table.
    pub fn max_objects(&self) -> u16 {
        if self.version <= 3 {
            255
        } else {
            65535
        }
    }

    /// Maximum valid attribute number.
    pub fn max_attribute(&self) -> u8 {
        if self.version <= 3 {
            31
        } else {
            47
        }
    }

    /// Number of property-default words at the head of the object table.
    pub fn property_defaults_count(&self) -> usize {
        if self.version <= 3 {
            31
        } else {
            63
        }
    }

    /// Size in bytes of one object record.
    pub fn object_entry_size(&self) -> usize {
        if self.version <= 3 {
            9
        } else {
            14
        }
    }

    pub fn supports_split_window(&self) -> bool {
        self.version >= 3
    }

    pub fn supports_colours(&self) -> bool {
        self.version >= 5
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Z-code version:           {}\n\
             Release number:           {}\n\
             Serial number:            {}\n\
             High memory base:         {:#06x}\n\
             Initial PC:               {:#06x}\n\
             Dictionary address:       {:#06x}\n\
             Object table address:     {:#06x}\n\
             Global variables address: {:#06x}\n\
             Static memory base:       {:#06x}\n\
             Abbreviations address:    {:#06x}\n\
             Declared file length:     {:#06x}\n\
             Checksum:                 {:#06x}\n",
            self.version,
            self.release,
            String::from_utf8_lossy(&self.serial),
            self.base_high_mem,
            self.initial_pc,
            self.dictionary,
            self.object_table_addr,
            self.globals_addr,
            self.base_static_mem,
            self.abbrev_table,
            self.declared_file_length(),
            self.checksum_file,
        )
    }
}
