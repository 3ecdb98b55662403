use thiserror::Error;

use crate::opcode::AddressingMode;

/// Fatal faults raised by the execution engine.
///
/// Both variants indicate a malformed instruction stream or an internal
/// table/resolver mismatch. Neither is recoverable: the run loop halts and
/// reports the fault to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    /// The fetched opcode byte has no entry in the instruction table.
    #[error("unknown opcode 0x{opcode:02X} at PC 0x{pc:04X}")]
    UnknownOpcode { opcode: u8, pc: u16 },

    /// An addressing mode with no effective-address computation reached the
    /// resolver. Points at a bug in the instruction table, not at the
    /// program being executed.
    #[error("no effective address for addressing mode {0:?}")]
    UnsupportedAddressingMode(AddressingMode),
}
