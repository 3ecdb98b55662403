//! Serializable execution snapshots.
//!
//! A save state captures the full observable machine: registers, status,
//! cycle count, and the 64KiB memory image. Hosts use it to checkpoint a
//! session to disk and resume it later.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    // CPU state
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub status: u8,
    pub cycles: u64,

    // Full 64KiB memory image
    pub ram: Vec<u8>,

    // Metadata
    pub timestamp: u64,
}

impl SaveState {
    pub(crate) fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    pub fn save_to_file(&self, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
        let data = bincode::serialize(self)?;
        std::fs::write(filename, data)?;
        log::info!("save state written to {}", filename);
        Ok(())
    }

    pub fn load_from_file(filename: &str) -> Result<SaveState, Box<dyn std::error::Error>> {
        let data = std::fs::read(filename)?;
        let save_state = bincode::deserialize(&data)?;
        log::info!("save state loaded from {}", filename);
        Ok(save_state)
    }
}
