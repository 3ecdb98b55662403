//! Flat 64KiB CPU address space.
//!
//! The core models memory as a single linearly addressable byte store with
//! no mirroring and no device mapping. Every `u16` is a valid address, so
//! reads and writes are total and never fail.

/// Program images are loaded verbatim starting here.
pub const PRG_ROM_START: u16 = 0x8000;

/// Little-endian address the program counter is set to on reset.
pub const RESET_VECTOR: u16 = 0xFFFC;

/// High byte of the hardware stack page (0x0100..=0x01FF).
pub const STACK_BASE: u16 = 0x0100;

/// Stack pointer value after reset.
pub const STACK_RESET: u8 = 0xFD;

pub struct Memory {
    bytes: [u8; 0x10000],
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            bytes: [0; 0x10000],
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        self.bytes[addr as usize] = value;
    }

    /// Little-endian 16-bit read. `addr + 1` wraps modulo 65536.
    pub fn read_u16(&self, addr: u16) -> u16 {
        let lo = self.read(addr);
        let hi = self.read(addr.wrapping_add(1));
        u16::from(hi) << 8 | u16::from(lo)
    }

    /// Little-endian 16-bit write: low byte at `addr`, high byte at `addr + 1`.
    pub fn write_u16(&mut self, addr: u16, value: u16) {
        self.write(addr, value as u8);
        self.write(addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// Copies `program` into memory at the fixed load origin and wires the
    /// reset vector to it. The emulator only supports images placed at
    /// `PRG_ROM_START`; a program longer than the remaining 32KiB is a
    /// caller error and is not validated here.
    pub fn load(&mut self, program: &[u8]) {
        let base = PRG_ROM_START as usize;
        self.bytes[base..base + program.len()].copy_from_slice(program);
        self.write_u16(RESET_VECTOR, PRG_ROM_START);
    }

    // Save state methods
    pub fn get_ram(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn set_ram(&mut self, ram: &[u8]) {
        let len = ram.len().min(self.bytes.len());
        self.bytes[..len].copy_from_slice(&ram[..len]);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}
