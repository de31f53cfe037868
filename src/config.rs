//! Engine configuration, loaded from TOML or built programmatically.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub screen_width: u8,
    pub screen_height: u8,
    pub interpreter_number: u8,
    pub interpreter_version: u8,
    /// Maximum number of undo snapshots retained; oldest is dropped once
    /// exceeded.
    pub undo_depth: usize,
    /// When false, an unrecognized opcode is treated as a warning (no-op)
    /// instead of a fatal error — useful for fuzzing partially-assembled
    /// story files.
    pub unknown_opcode_is_fatal: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            screen_width: 80,
            screen_height: 25,
            interpreter_number: 6, // IBM PC
            interpreter_version: b'C',
            undo_depth: 8,
            unknown_opcode_is_fatal: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<EngineConfig, String> {
        toml::from_str(s).map_err(|e| format!("invalid engine config: {e}"))
    }
}
