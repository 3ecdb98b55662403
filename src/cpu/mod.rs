//! Fetch-decode-execute engine for the MOS 6502.
//!
//! The `Cpu` owns its register file and a flat 64KiB `Memory`. Each step
//! fetches one opcode, looks it up in the instruction table, dispatches on
//! the mnemonic, and advances the program counter past any operand bytes
//! unless the handler redirected control flow itself (branches, jumps,
//! calls, returns, interrupt entry/exit).

use bitflags::bitflags;

use crate::error::CpuError;
use crate::memory::{Memory, RESET_VECTOR, STACK_BASE, STACK_RESET};
use crate::opcode::{self, AddressingMode, Mnemonic, Opcode};
use crate::save_state::SaveState;

#[cfg(test)]
mod tests;

bitflags! {
    /// Processor status register, NV-BDIZC.
    ///
    /// Several instructions (BIT, PLP, RTI) move multiple bits at once from
    /// a single computed byte, so the flags stay packed in one `u8` rather
    /// than being split into booleans.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const CARRY = 0b0000_0001;
        const ZERO = 0b0000_0010;
        const INTERRUPT_DISABLE = 0b0000_0100;
        const DECIMAL = 0b0000_1000;
        const BREAK = 0b0001_0000;
        const UNUSED = 0b0010_0000;
        const OVERFLOW = 0b0100_0000;
        const NEGATIVE = 0b1000_0000;
    }
}

/// Status register baseline applied on reset.
const STATUS_RESET: u8 = 0x24; // INTERRUPT_DISABLE | UNUSED

/// Execution phase of a CPU session. `Halted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Ready,
    Running,
    Halted,
}

/// Outcome of a single successfully dispatched instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    /// A BRK was executed; the session is done.
    Halt,
}

pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: StatusFlags,
    memory: Memory,
    state: RunState,
    cycles: u64,
}

impl Cpu {
    pub fn new(memory: Memory) -> Self {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: STACK_RESET,
            pc: 0,
            status: StatusFlags::from_bits_truncate(STATUS_RESET),
            memory,
            state: RunState::Ready,
            cycles: 0,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Accumulated nominal cycle count since reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Copies a raw program image to the fixed load origin and wires the
    /// reset vector to it.
    pub fn load(&mut self, program: &[u8]) {
        self.memory.load(program);
    }

    pub fn reset(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = STACK_RESET;
        self.status = StatusFlags::from_bits_truncate(STATUS_RESET);
        self.pc = self.memory.read_u16(RESET_VECTOR);
        self.state = RunState::Ready;
        self.cycles = 0;
        log::debug!("reset: PC=0x{:04X}", self.pc);
    }

    pub fn load_and_run(&mut self, program: &[u8]) -> Result<(), CpuError> {
        self.load(program);
        self.reset();
        self.run()
    }

    /// Executes until a BRK or a fatal fault. Either way the session ends
    /// `Halted`; a faulting instruction stream is reported, never resumed.
    ///
    /// `run` is unbounded. Hosts that need to interleave emulation with
    /// other work should call [`Cpu::step`] a bounded number of times
    /// instead.
    pub fn run(&mut self) -> Result<(), CpuError> {
        loop {
            match self.step()? {
                StepResult::Continue => {}
                StepResult::Halt => return Ok(()),
            }
        }
    }

    /// One fetch-decode-execute iteration.
    ///
    /// After the handler returns, the program counter is advanced past the
    /// remaining operand bytes only if the handler left it untouched; a
    /// handler that redirected control flow is solely responsible for the
    /// next fetch address.
    pub fn step(&mut self) -> Result<StepResult, CpuError> {
        if self.state == RunState::Halted {
            return Ok(StepResult::Halt);
        }
        self.state = RunState::Running;

        let pc_before = self.pc;
        let code = self.memory.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let Some(opcode) = opcode::lookup(code) else {
            self.state = RunState::Halted;
            log::error!(
                "halting on unknown opcode 0x{:02X} at PC 0x{:04X}",
                code,
                pc_before
            );
            return Err(CpuError::UnknownOpcode {
                opcode: code,
                pc: pc_before,
            });
        };

        let pc_after_fetch = self.pc;
        let result = match self.execute(opcode) {
            Ok(result) => result,
            Err(err) => {
                self.state = RunState::Halted;
                log::error!("halting at PC 0x{:04X}: {}", pc_before, err);
                return Err(err);
            }
        };

        if self.pc == pc_after_fetch {
            self.pc = self.pc.wrapping_add(u16::from(opcode.len) - 1);
        }
        self.cycles += u64::from(opcode.cycles);

        if result == StepResult::Halt {
            self.state = RunState::Halted;
        }
        Ok(result)
    }

    fn execute(&mut self, opcode: &Opcode) -> Result<StepResult, CpuError> {
        log::trace!(
            "{} 0x{:02X} at PC 0x{:04X}",
            opcode.mnemonic,
            opcode.code,
            self.pc.wrapping_sub(1)
        );
        match opcode.mnemonic {
            Mnemonic::ADC => self.adc(opcode.mode)?,
            Mnemonic::AND => self.and(opcode.mode)?,
            Mnemonic::ASL => self.asl(opcode.mode)?,
            Mnemonic::BCC => self.branch(opcode.mode, !self.status.contains(StatusFlags::CARRY))?,
            Mnemonic::BCS => self.branch(opcode.mode, self.status.contains(StatusFlags::CARRY))?,
            Mnemonic::BEQ => self.branch(opcode.mode, self.status.contains(StatusFlags::ZERO))?,
            Mnemonic::BIT => self.bit(opcode.mode)?,
            Mnemonic::BMI => {
                self.branch(opcode.mode, self.status.contains(StatusFlags::NEGATIVE))?
            }
            Mnemonic::BNE => self.branch(opcode.mode, !self.status.contains(StatusFlags::ZERO))?,
            Mnemonic::BPL => {
                self.branch(opcode.mode, !self.status.contains(StatusFlags::NEGATIVE))?
            }
            Mnemonic::BRK => {
                self.brk();
                return Ok(StepResult::Halt);
            }
            Mnemonic::BVC => {
                self.branch(opcode.mode, !self.status.contains(StatusFlags::OVERFLOW))?
            }
            Mnemonic::BVS => {
                self.branch(opcode.mode, self.status.contains(StatusFlags::OVERFLOW))?
            }
            Mnemonic::CLC => self.status.remove(StatusFlags::CARRY),
            Mnemonic::CLD => self.status.remove(StatusFlags::DECIMAL),
            Mnemonic::CLI => self.status.remove(StatusFlags::INTERRUPT_DISABLE),
            Mnemonic::CLV => self.status.remove(StatusFlags::OVERFLOW),
            Mnemonic::CMP => self.compare(opcode.mode, self.a)?,
            Mnemonic::CPX => self.compare(opcode.mode, self.x)?,
            Mnemonic::CPY => self.compare(opcode.mode, self.y)?,
            Mnemonic::DEC => self.dec(opcode.mode)?,
            Mnemonic::DEX => {
                self.x = self.x.wrapping_sub(1);
                self.set_zero_negative_flags(self.x);
            }
            Mnemonic::DEY => {
                self.y = self.y.wrapping_sub(1);
                self.set_zero_negative_flags(self.y);
            }
            Mnemonic::EOR => self.eor(opcode.mode)?,
            Mnemonic::INC => self.inc(opcode.mode)?,
            Mnemonic::INX => {
                self.x = self.x.wrapping_add(1);
                self.set_zero_negative_flags(self.x);
            }
            Mnemonic::INY => {
                self.y = self.y.wrapping_add(1);
                self.set_zero_negative_flags(self.y);
            }
            Mnemonic::JMP => self.pc = self.operand_address(opcode.mode)?,
            Mnemonic::JSR => self.jsr(opcode.mode)?,
            Mnemonic::LDA => self.lda(opcode.mode)?,
            Mnemonic::LDX => self.ldx(opcode.mode)?,
            Mnemonic::LDY => self.ldy(opcode.mode)?,
            Mnemonic::LSR => self.lsr(opcode.mode)?,
            Mnemonic::NOP => {}
            Mnemonic::ORA => self.ora(opcode.mode)?,
            Mnemonic::PHA => self.push(self.a),
            Mnemonic::PHP => self.php(),
            Mnemonic::PLA => {
                self.a = self.pull();
                self.set_zero_negative_flags(self.a);
            }
            Mnemonic::PLP => self.status = StatusFlags::from_bits_truncate(self.pull()),
            Mnemonic::ROL => self.rol(opcode.mode)?,
            Mnemonic::ROR => self.ror(opcode.mode)?,
            Mnemonic::RTI => self.rti(),
            Mnemonic::RTS => {
                let addr = self.pull_u16();
                self.pc = addr.wrapping_add(1);
            }
            Mnemonic::SBC => self.sbc(opcode.mode)?,
            Mnemonic::SEC => self.status.insert(StatusFlags::CARRY),
            Mnemonic::SED => self.status.insert(StatusFlags::DECIMAL),
            Mnemonic::SEI => self.status.insert(StatusFlags::INTERRUPT_DISABLE),
            Mnemonic::STA => self.store(opcode.mode, self.a)?,
            Mnemonic::STX => self.store(opcode.mode, self.x)?,
            Mnemonic::STY => self.store(opcode.mode, self.y)?,
            Mnemonic::TAX => {
                self.x = self.a;
                self.set_zero_negative_flags(self.x);
            }
            Mnemonic::TAY => {
                self.y = self.a;
                self.set_zero_negative_flags(self.y);
            }
            Mnemonic::TSX => {
                self.x = self.sp;
                self.set_zero_negative_flags(self.x);
            }
            Mnemonic::TXA => {
                self.a = self.x;
                self.set_zero_negative_flags(self.a);
            }
            Mnemonic::TXS => self.sp = self.x,
            Mnemonic::TYA => {
                self.a = self.y;
                self.set_zero_negative_flags(self.a);
            }
        }
        Ok(StepResult::Continue)
    }

    // --- Addressing-mode resolution ---

    /// Computes the effective address for an operand-bearing instruction.
    /// `self.pc` points at the first operand byte when this is called.
    fn operand_address(&self, mode: AddressingMode) -> Result<u16, CpuError> {
        match mode {
            // The operand byte itself is the value (or branch displacement).
            AddressingMode::Immediate | AddressingMode::Relative => Ok(self.pc),
            AddressingMode::ZeroPage => Ok(u16::from(self.memory.read(self.pc))),
            // Index arithmetic stays within page zero: 8-bit wrap, never
            // a modulo-0xFF reduction.
            AddressingMode::ZeroPageX => {
                Ok(u16::from(self.memory.read(self.pc).wrapping_add(self.x)))
            }
            AddressingMode::ZeroPageY => {
                Ok(u16::from(self.memory.read(self.pc).wrapping_add(self.y)))
            }
            AddressingMode::Absolute => Ok(self.memory.read_u16(self.pc)),
            AddressingMode::AbsoluteX => Ok(self
                .memory
                .read_u16(self.pc)
                .wrapping_add(u16::from(self.x))),
            AddressingMode::AbsoluteY => Ok(self
                .memory
                .read_u16(self.pc)
                .wrapping_add(u16::from(self.y))),
            AddressingMode::IndirectX => {
                let ptr = self.memory.read(self.pc).wrapping_add(self.x);
                Ok(self.read_zero_page_u16(ptr))
            }
            AddressingMode::IndirectY => {
                let ptr = self.memory.read(self.pc);
                Ok(self.read_zero_page_u16(ptr).wrapping_add(u16::from(self.y)))
            }
            AddressingMode::AbsoluteIndirect => {
                let ptr = self.memory.read_u16(self.pc);
                let lo = self.memory.read(ptr);
                // Hardware bug: a pointer ending in 0xFF fetches its high
                // byte from the start of the same page, not the next one.
                let hi = if ptr & 0x00FF == 0x00FF {
                    self.memory.read(ptr & 0xFF00)
                } else {
                    self.memory.read(ptr.wrapping_add(1))
                };
                Ok(u16::from(hi) << 8 | u16::from(lo))
            }
            AddressingMode::Implied | AddressingMode::Accumulator => {
                Err(CpuError::UnsupportedAddressingMode(mode))
            }
        }
    }

    /// 16-bit read from page zero with 8-bit wrap on the high-byte fetch.
    fn read_zero_page_u16(&self, ptr: u8) -> u16 {
        let lo = self.memory.read(u16::from(ptr));
        let hi = self.memory.read(u16::from(ptr.wrapping_add(1)));
        u16::from(hi) << 8 | u16::from(lo)
    }

    fn operand(&self, mode: AddressingMode) -> Result<u8, CpuError> {
        let addr = self.operand_address(mode)?;
        Ok(self.memory.read(addr))
    }

    // --- Loads, stores, transfers ---

    fn lda(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        self.a = self.operand(mode)?;
        self.set_zero_negative_flags(self.a);
        Ok(())
    }

    fn ldx(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        self.x = self.operand(mode)?;
        self.set_zero_negative_flags(self.x);
        Ok(())
    }

    fn ldy(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        self.y = self.operand(mode)?;
        self.set_zero_negative_flags(self.y);
        Ok(())
    }

    fn store(&mut self, mode: AddressingMode, value: u8) -> Result<(), CpuError> {
        let addr = self.operand_address(mode)?;
        self.memory.write(addr, value);
        Ok(())
    }

    // --- Arithmetic and logic ---

    fn adc(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        let value = self.operand(mode)?;
        self.add_to_accumulator(value);
        Ok(())
    }

    /// Subtraction reuses the adder with the operand's one's complement;
    /// carry doubles as not-borrow.
    fn sbc(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        let value = self.operand(mode)?;
        self.add_to_accumulator(!value);
        Ok(())
    }

    fn add_to_accumulator(&mut self, value: u8) {
        let carry_in = u16::from(self.status.contains(StatusFlags::CARRY));
        let sum = u16::from(self.a) + u16::from(value) + carry_in;
        let result = sum as u8;
        self.status.set(StatusFlags::CARRY, sum > 0xFF);
        // Overflow when both operands share a sign the result does not.
        self.status.set(
            StatusFlags::OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result)) & 0x80 != 0,
        );
        self.a = result;
        self.set_zero_negative_flags(result);
    }

    fn and(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        self.a &= self.operand(mode)?;
        self.set_zero_negative_flags(self.a);
        Ok(())
    }

    fn eor(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        self.a ^= self.operand(mode)?;
        self.set_zero_negative_flags(self.a);
        Ok(())
    }

    fn ora(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        self.a |= self.operand(mode)?;
        self.set_zero_negative_flags(self.a);
        Ok(())
    }

    fn compare(&mut self, mode: AddressingMode, register: u8) -> Result<(), CpuError> {
        let value = self.operand(mode)?;
        self.status.set(StatusFlags::CARRY, value <= register);
        self.set_zero_negative_flags(register.wrapping_sub(value));
        Ok(())
    }

    fn bit(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        let value = self.operand(mode)?;
        self.status.set(StatusFlags::ZERO, self.a & value == 0);
        self.status.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
        self.status.set(StatusFlags::OVERFLOW, value & 0x40 != 0);
        Ok(())
    }

    fn inc(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        let addr = self.operand_address(mode)?;
        let result = self.memory.read(addr).wrapping_add(1);
        self.memory.write(addr, result);
        self.set_zero_negative_flags(result);
        Ok(())
    }

    fn dec(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        let addr = self.operand_address(mode)?;
        let result = self.memory.read(addr).wrapping_sub(1);
        self.memory.write(addr, result);
        self.set_zero_negative_flags(result);
        Ok(())
    }

    // --- Shifts and rotates ---
    //
    // Carry out is the bit shifted out of the value before the shift; ROL
    // and ROR shift the old carry into the vacated bit.

    fn asl(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        if mode == AddressingMode::Accumulator {
            let value = self.a;
            self.status.set(StatusFlags::CARRY, value & 0x80 != 0);
            self.a = value << 1;
            self.set_zero_negative_flags(self.a);
        } else {
            let addr = self.operand_address(mode)?;
            let value = self.memory.read(addr);
            self.status.set(StatusFlags::CARRY, value & 0x80 != 0);
            let result = value << 1;
            self.memory.write(addr, result);
            self.set_zero_negative_flags(result);
        }
        Ok(())
    }

    fn lsr(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        if mode == AddressingMode::Accumulator {
            let value = self.a;
            self.status.set(StatusFlags::CARRY, value & 0x01 != 0);
            self.a = value >> 1;
            self.set_zero_negative_flags(self.a);
        } else {
            let addr = self.operand_address(mode)?;
            let value = self.memory.read(addr);
            self.status.set(StatusFlags::CARRY, value & 0x01 != 0);
            let result = value >> 1;
            self.memory.write(addr, result);
            self.set_zero_negative_flags(result);
        }
        Ok(())
    }

    fn rol(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        let carry_in = u8::from(self.status.contains(StatusFlags::CARRY));
        if mode == AddressingMode::Accumulator {
            let value = self.a;
            self.status.set(StatusFlags::CARRY, value & 0x80 != 0);
            self.a = value << 1 | carry_in;
            self.set_zero_negative_flags(self.a);
        } else {
            let addr = self.operand_address(mode)?;
            let value = self.memory.read(addr);
            self.status.set(StatusFlags::CARRY, value & 0x80 != 0);
            let result = value << 1 | carry_in;
            self.memory.write(addr, result);
            self.set_zero_negative_flags(result);
        }
        Ok(())
    }

    fn ror(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        let carry_in = u8::from(self.status.contains(StatusFlags::CARRY)) << 7;
        if mode == AddressingMode::Accumulator {
            let value = self.a;
            self.status.set(StatusFlags::CARRY, value & 0x01 != 0);
            self.a = value >> 1 | carry_in;
            self.set_zero_negative_flags(self.a);
        } else {
            let addr = self.operand_address(mode)?;
            let value = self.memory.read(addr);
            self.status.set(StatusFlags::CARRY, value & 0x01 != 0);
            let result = value >> 1 | carry_in;
            self.memory.write(addr, result);
            self.set_zero_negative_flags(result);
        }
        Ok(())
    }

    // --- Control flow ---

    /// The displacement is relative to the address immediately following
    /// the displacement byte. A branch not taken leaves the program counter
    /// for the normal operand-skip advance.
    fn branch(&mut self, mode: AddressingMode, condition: bool) -> Result<(), CpuError> {
        let addr = self.operand_address(mode)?;
        if condition {
            let offset = self.memory.read(addr) as i8;
            self.pc = self.pc.wrapping_add(1).wrapping_add(offset as u16);
        }
        Ok(())
    }

    fn jsr(&mut self, mode: AddressingMode) -> Result<(), CpuError> {
        let target = self.operand_address(mode)?;
        // Address of the JSR's last byte; RTS adds one to land after it.
        let return_addr = self.pc.wrapping_add(1);
        self.push_u16(return_addr);
        self.pc = target;
        Ok(())
    }

    /// Pushes status then the return program counter, sets the Break flag,
    /// and terminates the session. No interrupt vector dispatch.
    fn brk(&mut self) {
        self.push(self.status.bits());
        self.push_u16(self.pc);
        self.status.insert(StatusFlags::BREAK);
    }

    fn rti(&mut self) {
        let bits = self.pull();
        self.status = StatusFlags::from_bits_truncate(bits);
        self.pc = self.pull_u16();
    }

    fn php(&mut self) {
        // The B and unused bits read as set in the pushed copy.
        self.push((self.status | StatusFlags::BREAK | StatusFlags::UNUSED).bits());
    }

    // --- Stack and flags ---

    fn push(&mut self, value: u8) {
        self.memory.write(STACK_BASE + u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.memory.read(STACK_BASE + u16::from(self.sp))
    }

    /// High byte first, then low; `pull_u16` mirrors the order so JSR/RTS
    /// and interrupt frames round-trip.
    fn push_u16(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }

    fn pull_u16(&mut self) -> u16 {
        let lo = u16::from(self.pull());
        let hi = u16::from(self.pull());
        hi << 8 | lo
    }

    fn set_zero_negative_flags(&mut self, result: u8) {
        self.status.set(StatusFlags::ZERO, result == 0);
        self.status.set(StatusFlags::NEGATIVE, result & 0x80 != 0);
    }

    // --- Save states ---

    pub fn save_state(&self) -> SaveState {
        SaveState {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            status: self.status.bits(),
            cycles: self.cycles,
            ram: self.memory.get_ram(),
            timestamp: SaveState::now(),
        }
    }

    /// Restores registers and the full memory image. The session comes back
    /// `Ready`; the host resumes it explicitly.
    pub fn load_save_state(&mut self, state: &SaveState) {
        self.a = state.a;
        self.x = state.x;
        self.y = state.y;
        self.pc = state.pc;
        self.sp = state.sp;
        self.status = StatusFlags::from_bits_truncate(state.status);
        self.cycles = state.cycles;
        self.memory.set_ram(&state.ram);
        self.state = RunState::Ready;
    }
}
