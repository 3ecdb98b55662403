//! Instruction metadata for the official 6502 instruction set.
//!
//! One immutable record per legal opcode byte: mnemonic, encoded length,
//! nominal cycle count, and addressing mode. The 256-slot dispatch array is
//! built once behind a `OnceLock`; lookups after that are pure and
//! thread-safe. Opcode bytes with no record are an error condition handled
//! at dispatch time.

use std::fmt;
use std::sync::OnceLock;

/// How an instruction's effective operand address is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    IndirectX,
    IndirectY,
    /// JMP only. Reproduces the hardware page-boundary bug on dereference.
    AbsoluteIndirect,
    Relative,
}

/// The 56 official instruction names, used as the dispatch key.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    ADC,
    AND,
    ASL,
    BCC,
    BCS,
    BEQ,
    BIT,
    BMI,
    BNE,
    BPL,
    BRK,
    BVC,
    BVS,
    CLC,
    CLD,
    CLI,
    CLV,
    CMP,
    CPX,
    CPY,
    DEC,
    DEX,
    DEY,
    EOR,
    INC,
    INX,
    INY,
    JMP,
    JSR,
    LDA,
    LDX,
    LDY,
    LSR,
    NOP,
    ORA,
    PHA,
    PHP,
    PLA,
    PLP,
    ROL,
    ROR,
    RTI,
    RTS,
    SBC,
    SEC,
    SED,
    SEI,
    STA,
    STX,
    STY,
    TAX,
    TAY,
    TSX,
    TXA,
    TXS,
    TYA,
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Static metadata for one legal opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub code: u8,
    pub mnemonic: Mnemonic,
    /// Encoded length in bytes, opcode included (1-3).
    pub len: u8,
    /// Nominal cycle count. Page-crossing penalties are not modeled.
    pub cycles: u8,
    pub mode: AddressingMode,
}

const fn op(code: u8, mnemonic: Mnemonic, len: u8, cycles: u8, mode: AddressingMode) -> Opcode {
    Opcode {
        code,
        mnemonic,
        len,
        cycles,
        mode,
    }
}

/// All 151 official opcodes, grouped by mnemonic.
static OPCODES: [Opcode; 151] = {
    use AddressingMode::*;
    use Mnemonic::*;
    [
        op(0x69, ADC, 2, 2, Immediate),
        op(0x65, ADC, 2, 3, ZeroPage),
        op(0x75, ADC, 2, 4, ZeroPageX),
        op(0x6D, ADC, 3, 4, Absolute),
        op(0x7D, ADC, 3, 4, AbsoluteX),
        op(0x79, ADC, 3, 4, AbsoluteY),
        op(0x61, ADC, 2, 6, IndirectX),
        op(0x71, ADC, 2, 5, IndirectY),
        op(0x29, AND, 2, 2, Immediate),
        op(0x25, AND, 2, 3, ZeroPage),
        op(0x35, AND, 2, 4, ZeroPageX),
        op(0x2D, AND, 3, 4, Absolute),
        op(0x3D, AND, 3, 4, AbsoluteX),
        op(0x39, AND, 3, 4, AbsoluteY),
        op(0x21, AND, 2, 6, IndirectX),
        op(0x31, AND, 2, 5, IndirectY),
        op(0x0A, ASL, 1, 2, Accumulator),
        op(0x06, ASL, 2, 5, ZeroPage),
        op(0x16, ASL, 2, 6, ZeroPageX),
        op(0x0E, ASL, 3, 6, Absolute),
        op(0x1E, ASL, 3, 7, AbsoluteX),
        op(0x90, BCC, 2, 2, Relative),
        op(0xB0, BCS, 2, 2, Relative),
        op(0xF0, BEQ, 2, 2, Relative),
        op(0x24, BIT, 2, 3, ZeroPage),
        op(0x2C, BIT, 3, 4, Absolute),
        op(0x30, BMI, 2, 2, Relative),
        op(0xD0, BNE, 2, 2, Relative),
        op(0x10, BPL, 2, 2, Relative),
        op(0x00, BRK, 1, 7, Implied),
        op(0x50, BVC, 2, 2, Relative),
        op(0x70, BVS, 2, 2, Relative),
        op(0x18, CLC, 1, 2, Implied),
        op(0xD8, CLD, 1, 2, Implied),
        op(0x58, CLI, 1, 2, Implied),
        op(0xB8, CLV, 1, 2, Implied),
        op(0xC9, CMP, 2, 2, Immediate),
        op(0xC5, CMP, 2, 3, ZeroPage),
        op(0xD5, CMP, 2, 4, ZeroPageX),
        op(0xCD, CMP, 3, 4, Absolute),
        op(0xDD, CMP, 3, 4, AbsoluteX),
        op(0xD9, CMP, 3, 4, AbsoluteY),
        op(0xC1, CMP, 2, 6, IndirectX),
        op(0xD1, CMP, 2, 5, IndirectY),
        op(0xE0, CPX, 2, 2, Immediate),
        op(0xE4, CPX, 2, 3, ZeroPage),
        op(0xEC, CPX, 3, 4, Absolute),
        op(0xC0, CPY, 2, 2, Immediate),
        op(0xC4, CPY, 2, 3, ZeroPage),
        op(0xCC, CPY, 3, 4, Absolute),
        op(0xC6, DEC, 2, 5, ZeroPage),
        op(0xD6, DEC, 2, 6, ZeroPageX),
        op(0xCE, DEC, 3, 6, Absolute),
        op(0xDE, DEC, 3, 7, AbsoluteX),
        op(0xCA, DEX, 1, 2, Implied),
        op(0x88, DEY, 1, 2, Implied),
        op(0x49, EOR, 2, 2, Immediate),
        op(0x45, EOR, 2, 3, ZeroPage),
        op(0x55, EOR, 2, 4, ZeroPageX),
        op(0x4D, EOR, 3, 4, Absolute),
        op(0x5D, EOR, 3, 4, AbsoluteX),
        op(0x59, EOR, 3, 4, AbsoluteY),
        op(0x41, EOR, 2, 6, IndirectX),
        op(0x51, EOR, 2, 5, IndirectY),
        op(0xE6, INC, 2, 5, ZeroPage),
        op(0xF6, INC, 2, 6, ZeroPageX),
        op(0xEE, INC, 3, 6, Absolute),
        op(0xFE, INC, 3, 7, AbsoluteX),
        op(0xE8, INX, 1, 2, Implied),
        op(0xC8, INY, 1, 2, Implied),
        op(0x4C, JMP, 3, 3, Absolute),
        op(0x6C, JMP, 3, 5, AbsoluteIndirect),
        op(0x20, JSR, 3, 6, Absolute),
        op(0xA9, LDA, 2, 2, Immediate),
        op(0xA5, LDA, 2, 3, ZeroPage),
        op(0xB5, LDA, 2, 4, ZeroPageX),
        op(0xAD, LDA, 3, 4, Absolute),
        op(0xBD, LDA, 3, 4, AbsoluteX),
        op(0xB9, LDA, 3, 4, AbsoluteY),
        op(0xA1, LDA, 2, 6, IndirectX),
        op(0xB1, LDA, 2, 5, IndirectY),
        op(0xA2, LDX, 2, 2, Immediate),
        op(0xA6, LDX, 2, 3, ZeroPage),
        op(0xB6, LDX, 2, 4, ZeroPageY),
        op(0xAE, LDX, 3, 4, Absolute),
        op(0xBE, LDX, 3, 4, AbsoluteY),
        op(0xA0, LDY, 2, 2, Immediate),
        op(0xA4, LDY, 2, 3, ZeroPage),
        op(0xB4, LDY, 2, 4, ZeroPageX),
        op(0xAC, LDY, 3, 4, Absolute),
        op(0xBC, LDY, 3, 4, AbsoluteX),
        op(0x4A, LSR, 1, 2, Accumulator),
        op(0x46, LSR, 2, 5, ZeroPage),
        op(0x56, LSR, 2, 6, ZeroPageX),
        op(0x4E, LSR, 3, 6, Absolute),
        op(0x5E, LSR, 3, 7, AbsoluteX),
        op(0xEA, NOP, 1, 2, Implied),
        op(0x09, ORA, 2, 2, Immediate),
        op(0x05, ORA, 2, 3, ZeroPage),
        op(0x15, ORA, 2, 4, ZeroPageX),
        op(0x0D, ORA, 3, 4, Absolute),
        op(0x1D, ORA, 3, 4, AbsoluteX),
        op(0x19, ORA, 3, 4, AbsoluteY),
        op(0x01, ORA, 2, 6, IndirectX),
        op(0x11, ORA, 2, 5, IndirectY),
        op(0x48, PHA, 1, 3, Implied),
        op(0x08, PHP, 1, 3, Implied),
        op(0x68, PLA, 1, 4, Implied),
        op(0x28, PLP, 1, 4, Implied),
        op(0x2A, ROL, 1, 2, Accumulator),
        op(0x26, ROL, 2, 5, ZeroPage),
        op(0x36, ROL, 2, 6, ZeroPageX),
        op(0x2E, ROL, 3, 6, Absolute),
        op(0x3E, ROL, 3, 7, AbsoluteX),
        op(0x6A, ROR, 1, 2, Accumulator),
        op(0x66, ROR, 2, 5, ZeroPage),
        op(0x76, ROR, 2, 6, ZeroPageX),
        op(0x6E, ROR, 3, 6, Absolute),
        op(0x7E, ROR, 3, 7, AbsoluteX),
        op(0x40, RTI, 1, 6, Implied),
        op(0x60, RTS, 1, 6, Implied),
        op(0xE9, SBC, 2, 2, Immediate),
        op(0xE5, SBC, 2, 3, ZeroPage),
        op(0xF5, SBC, 2, 4, ZeroPageX),
        op(0xED, SBC, 3, 4, Absolute),
        op(0xFD, SBC, 3, 4, AbsoluteX),
        op(0xF9, SBC, 3, 4, AbsoluteY),
        op(0xE1, SBC, 2, 6, IndirectX),
        op(0xF1, SBC, 2, 5, IndirectY),
        op(0x38, SEC, 1, 2, Implied),
        op(0xF8, SED, 1, 2, Implied),
        op(0x78, SEI, 1, 2, Implied),
        op(0x85, STA, 2, 3, ZeroPage),
        op(0x95, STA, 2, 4, ZeroPageX),
        op(0x8D, STA, 3, 4, Absolute),
        op(0x9D, STA, 3, 5, AbsoluteX),
        op(0x99, STA, 3, 5, AbsoluteY),
        op(0x81, STA, 2, 6, IndirectX),
        op(0x91, STA, 2, 6, IndirectY),
        op(0x86, STX, 2, 3, ZeroPage),
        op(0x96, STX, 2, 4, ZeroPageY),
        op(0x8E, STX, 3, 4, Absolute),
        op(0x84, STY, 2, 3, ZeroPage),
        op(0x94, STY, 2, 4, ZeroPageX),
        op(0x8C, STY, 3, 4, Absolute),
        op(0xAA, TAX, 1, 2, Implied),
        op(0xA8, TAY, 1, 2, Implied),
        op(0xBA, TSX, 1, 2, Implied),
        op(0x8A, TXA, 1, 2, Implied),
        op(0x9A, TXS, 1, 2, Implied),
        op(0x98, TYA, 1, 2, Implied),
    ]
};

static TABLE: OnceLock<[Option<&'static Opcode>; 256]> = OnceLock::new();

fn table() -> &'static [Option<&'static Opcode>; 256] {
    TABLE.get_or_init(|| {
        let mut entries: [Option<&'static Opcode>; 256] = [None; 256];
        for opcode in OPCODES.iter() {
            entries[opcode.code as usize] = Some(opcode);
        }
        entries
    })
}

/// Looks up the record for an opcode byte. `None` for bytes outside the
/// official instruction set.
pub fn lookup(code: u8) -> Option<&'static Opcode> {
    table()[code as usize]
}
