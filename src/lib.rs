//! Cycle-approximate MOS 6502 CPU emulation core.
//!
//! Runs unmodified 6502 machine code against a flat 64KiB address space and
//! reproduces the observable register, flag, and memory state after every
//! instruction. The core is a library: it performs no I/O of its own, and a
//! presentation shell embedding it only needs register and memory snapshots
//! between steps.
//!
//! ```
//! use mos6502::{Cpu, Memory};
//!
//! // LDA #$C0; TAX; INX; BRK
//! let mut cpu = Cpu::new(Memory::new());
//! cpu.load_and_run(&[0xA9, 0xC0, 0xAA, 0xE8, 0x00]).unwrap();
//! assert_eq!(cpu.x, 0xC1);
//! ```

pub mod cpu;
pub mod error;
pub mod memory;
pub mod opcode;
pub mod save_state;

pub use cpu::{Cpu, RunState, StatusFlags, StepResult};
pub use error::CpuError;
pub use memory::Memory;
pub use opcode::{AddressingMode, Mnemonic, Opcode};
pub use save_state::SaveState;
