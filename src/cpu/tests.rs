use super::*;

#[path = "addressing_tests.rs"]
mod addressing_mode_tests;

fn setup(program: &[u8]) -> Cpu {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut cpu = Cpu::new(Memory::new());
    cpu.load(program);
    cpu.reset();
    cpu
}

#[test]
fn lda_immediate_loads_value() {
    let mut cpu = setup(&[0xA9, 0x42, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.pc, 0x8003);
    assert!(!cpu.status.contains(StatusFlags::ZERO));
    assert!(!cpu.status.contains(StatusFlags::NEGATIVE));
}

#[test]
fn lda_sets_zero_flag() {
    let mut cpu = setup(&[0xA9, 0x00, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0x00);
    assert!(cpu.status.contains(StatusFlags::ZERO));
    assert!(!cpu.status.contains(StatusFlags::NEGATIVE));
}

#[test]
fn lda_sets_negative_flag() {
    let mut cpu = setup(&[0xA9, 0x80, 0x00]);
    cpu.run().unwrap();

    assert!(cpu.status.contains(StatusFlags::NEGATIVE));
    assert!(!cpu.status.contains(StatusFlags::ZERO));
}

#[test]
fn lda_flag_law_holds_for_every_value() {
    for value in 0..=255u8 {
        let mut cpu = setup(&[0xA9, value, 0x00]);
        cpu.run().unwrap();

        assert_eq!(cpu.a, value);
        assert_eq!(cpu.status.contains(StatusFlags::ZERO), value == 0);
        assert_eq!(cpu.status.contains(StatusFlags::NEGATIVE), value & 0x80 != 0);
    }
}

#[test]
fn lda_from_zero_page() {
    let mut cpu = setup(&[0xA5, 0x10, 0x00]);
    cpu.memory_mut().write(0x10, 0x55);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0x55);
}

#[test]
fn tax_moves_a_to_x() {
    let mut cpu = setup(&[0xAA, 0x00]);
    cpu.a = 10;
    cpu.run().unwrap();

    assert_eq!(cpu.x, 10);
}

#[test]
fn lda_tax_inx_program() {
    // LDA #$C0; TAX; INX; BRK
    let mut cpu = setup(&[0xA9, 0xC0, 0xAA, 0xE8, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.x, 0xC1);
}

#[test]
fn inx_wraps_at_8_bits() {
    let mut cpu = setup(&[0xE8, 0xE8, 0x00]);
    cpu.x = 0xFF;
    cpu.run().unwrap();

    assert_eq!(cpu.x, 0x01);
}

fn run_adc(a: u8, carry: bool, operand: u8) -> (u8, bool) {
    let mut cpu = setup(&[0x69, operand, 0x00]);
    cpu.a = a;
    cpu.status.set(StatusFlags::CARRY, carry);
    cpu.run().unwrap();
    (cpu.a, cpu.status.contains(StatusFlags::CARRY))
}

#[test]
fn adc_carry_table() {
    assert_eq!(run_adc(0xFE, false, 0x01), (0xFF, false));
    assert_eq!(run_adc(0xFE, true, 0x00), (0xFF, false));
    assert_eq!(run_adc(0xFE, true, 0x01), (0x00, true));
    assert_eq!(run_adc(0xFE, false, 0x10), (0x0E, true));
}

#[test]
fn adc_sets_overflow_on_signed_wrap() {
    // 0x50 + 0x50 = 0xA0: two positives producing a negative
    let mut cpu = setup(&[0xA9, 0x50, 0x69, 0x50, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0xA0);
    assert!(cpu.status.contains(StatusFlags::OVERFLOW));
    assert!(cpu.status.contains(StatusFlags::NEGATIVE));
    assert!(!cpu.status.contains(StatusFlags::CARRY));
}

#[test]
fn sbc_without_borrow() {
    // LDA #$10; SEC; SBC #$05
    let mut cpu = setup(&[0xA9, 0x10, 0x38, 0xE9, 0x05, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0x0B);
    assert!(cpu.status.contains(StatusFlags::CARRY));
}

#[test]
fn sbc_with_borrow() {
    // Clear carry borrows one extra
    let mut cpu = setup(&[0xA9, 0x10, 0x18, 0xE9, 0x05, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0x0A);
}

#[test]
fn jsr_rts_returns_to_instruction_after_call() {
    // 0x8000 JSR $8005; 0x8003 INX; 0x8004 BRK; 0x8005 RTS
    let mut cpu = setup(&[0x20, 0x05, 0x80, 0xE8, 0x00, 0x60]);
    cpu.run().unwrap();

    assert_eq!(cpu.x, 1);
    assert_eq!(cpu.pc, 0x8005);
}

#[test]
fn brk_halts_with_pc_past_the_opcode() {
    let mut cpu = setup(&[0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.pc, 0x8001);
    assert_eq!(cpu.state(), RunState::Halted);
    assert!(cpu.status.contains(StatusFlags::BREAK));
}

#[test]
fn brk_pushes_status_then_pc() {
    let mut cpu = setup(&[0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.sp, 0xFA);
    assert_eq!(cpu.memory().read(0x01FD), STATUS_RESET);
    assert_eq!(cpu.memory().read(0x01FC), 0x80); // PC high
    assert_eq!(cpu.memory().read(0x01FB), 0x01); // PC low
}

#[test]
fn unknown_opcode_is_a_fatal_fault() {
    let mut cpu = setup(&[0x02]);

    assert_eq!(
        cpu.run(),
        Err(CpuError::UnknownOpcode {
            opcode: 0x02,
            pc: 0x8000
        })
    );
    assert_eq!(cpu.state(), RunState::Halted);

    // Halted is terminal: further steps do nothing
    let pc = cpu.pc;
    assert_eq!(cpu.step(), Ok(StepResult::Halt));
    assert_eq!(cpu.pc, pc);
}

#[test]
fn status_flag_operations_are_idempotent() {
    let mut cpu = setup(&[0x00]);
    let baseline = cpu.status;

    cpu.status.insert(StatusFlags::CARRY | StatusFlags::ZERO);
    let once = cpu.status;
    cpu.status.insert(StatusFlags::CARRY | StatusFlags::ZERO);
    assert_eq!(cpu.status, once);

    cpu.status.remove(StatusFlags::CARRY | StatusFlags::ZERO);
    assert_eq!(cpu.status, baseline);
}

#[test]
fn pha_pla_round_trips_accumulator() {
    // LDA #$42; PHA; LDA #$00; PLA
    let mut cpu = setup(&[0xA9, 0x42, 0x48, 0xA9, 0x00, 0x68, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0x42);
    assert!(!cpu.status.contains(StatusFlags::ZERO));
}

#[test]
fn php_pushes_break_and_unused_set() {
    // SEC; PHP; BRK
    let mut cpu = setup(&[0x38, 0x08, 0x00]);
    cpu.run().unwrap();

    let pushed = cpu.memory().read(0x01FD);
    assert_eq!(
        pushed,
        (StatusFlags::from_bits_truncate(STATUS_RESET)
            | StatusFlags::CARRY
            | StatusFlags::BREAK
            | StatusFlags::UNUSED)
            .bits()
    );
}

#[test]
fn cmp_equal_sets_zero_and_carry() {
    let mut cpu = setup(&[0xA9, 0x10, 0xC9, 0x10, 0x00]);
    cpu.run().unwrap();

    assert!(cpu.status.contains(StatusFlags::ZERO));
    assert!(cpu.status.contains(StatusFlags::CARRY));
}

#[test]
fn cmp_smaller_register_clears_carry() {
    let mut cpu = setup(&[0xA9, 0x10, 0xC9, 0x20, 0x00]);
    cpu.run().unwrap();

    assert!(!cpu.status.contains(StatusFlags::CARRY));
    assert!(!cpu.status.contains(StatusFlags::ZERO));
    assert!(cpu.status.contains(StatusFlags::NEGATIVE)); // 0x10 - 0x20 = 0xF0
}

#[test]
fn asl_accumulator_shifts_bit7_into_carry() {
    let mut cpu = setup(&[0xA9, 0x81, 0x0A, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0x02);
    assert!(cpu.status.contains(StatusFlags::CARRY));
}

#[test]
fn ror_shifts_old_carry_into_bit7() {
    // SEC; LDA #$02; ROR A
    let mut cpu = setup(&[0x38, 0xA9, 0x02, 0x6A, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0x81);
    assert!(!cpu.status.contains(StatusFlags::CARRY));
    assert!(cpu.status.contains(StatusFlags::NEGATIVE));
}

#[test]
fn lsr_on_memory_operand() {
    let mut cpu = setup(&[0x46, 0x10, 0x00]);
    cpu.memory_mut().write(0x10, 0x03);
    cpu.run().unwrap();

    assert_eq!(cpu.memory().read(0x10), 0x01);
    assert!(cpu.status.contains(StatusFlags::CARRY));
}

#[test]
fn inc_and_dec_memory() {
    let mut cpu = setup(&[0xE6, 0x10, 0xC6, 0x11, 0x00]);
    cpu.memory_mut().write(0x10, 0xFF);
    cpu.memory_mut().write(0x11, 0x01);
    cpu.run().unwrap();

    assert_eq!(cpu.memory().read(0x10), 0x00);
    assert_eq!(cpu.memory().read(0x11), 0x00);
    assert!(cpu.status.contains(StatusFlags::ZERO));
}

#[test]
fn bit_copies_operand_bits_into_flags() {
    // LDA #$0F; BIT $10 with $C0 in memory
    let mut cpu = setup(&[0xA9, 0x0F, 0x24, 0x10, 0x00]);
    cpu.memory_mut().write(0x10, 0xC0);
    cpu.run().unwrap();

    assert_eq!(cpu.a, 0x0F);
    assert!(cpu.status.contains(StatusFlags::ZERO));
    assert!(cpu.status.contains(StatusFlags::NEGATIVE));
    assert!(cpu.status.contains(StatusFlags::OVERFLOW));
}

#[test]
fn branch_taken_skips_forward() {
    // LDA #$00; BEQ +1 skips the first INX
    let mut cpu = setup(&[0xA9, 0x00, 0xF0, 0x01, 0xE8, 0xE8, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.x, 1);
}

#[test]
fn branch_not_taken_falls_through() {
    let mut cpu = setup(&[0xA9, 0x01, 0xF0, 0x01, 0xE8, 0xE8, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.x, 2);
}

#[test]
fn branch_backward_forms_a_loop() {
    // LDX #$03; DEX; BNE -3
    let mut cpu = setup(&[0xA2, 0x03, 0xCA, 0xD0, 0xFD, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.x, 0);
}

#[test]
fn jmp_absolute_redirects_execution() {
    // JMP $8005 over an INX and a BRK, into two INX
    let mut cpu = setup(&[0x4C, 0x05, 0x80, 0xE8, 0x00, 0xE8, 0xE8, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.x, 2);
    assert_eq!(cpu.pc, 0x8008);
}

#[test]
fn jmp_indirect_reproduces_page_boundary_bug() {
    // Pointer at $80FF/$8100; the high byte must come from $8000 (0x6C),
    // not $8100, so execution lands at $6C05.
    let mut cpu = setup(&[0x6C, 0xFF, 0x80]);
    cpu.memory_mut().write(0x80FF, 0x05);
    cpu.memory_mut().write(0x8100, 0x90);
    cpu.run().unwrap();

    assert_eq!(cpu.pc, 0x6C06); // BRK at the buggy target
}

#[test]
fn rti_restores_status_and_pc() {
    let mut cpu = setup(&[0x40]);
    cpu.sp = 0xFA;
    cpu.memory_mut().write(0x01FB, 0x03); // CARRY | ZERO
    cpu.memory_mut().write(0x01FC, 0x00); // PC low
    cpu.memory_mut().write(0x01FD, 0x90); // PC high
    cpu.run().unwrap();

    assert!(cpu.status.contains(StatusFlags::CARRY));
    assert!(cpu.status.contains(StatusFlags::ZERO));
    assert_eq!(cpu.pc, 0x9001); // BRK at $9000
}

#[test]
fn txs_and_tsx_move_the_stack_pointer() {
    let mut cpu = setup(&[0xA2, 0x42, 0x9A, 0xBA, 0x00]);
    cpu.step().unwrap(); // LDX
    cpu.step().unwrap(); // TXS
    assert_eq!(cpu.sp, 0x42);

    cpu.x = 0;
    cpu.step().unwrap(); // TSX
    assert_eq!(cpu.x, 0x42);
    assert!(!cpu.status.contains(StatusFlags::ZERO));
}

#[test]
fn sta_writes_accumulator_to_memory() {
    let mut cpu = setup(&[0xA9, 0x55, 0x85, 0x10, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.memory().read(0x10), 0x55);
}

#[test]
fn stack_pointer_wraps_on_underflow() {
    let mut cpu = setup(&[0x48, 0x00]); // PHA
    cpu.a = 0x99;
    cpu.sp = 0x00;
    cpu.step().unwrap();

    assert_eq!(cpu.memory().read(0x0100), 0x99);
    assert_eq!(cpu.sp, 0xFF);
}

#[test]
fn run_state_transitions() {
    let mut cpu = setup(&[0xEA, 0x00]); // NOP; BRK
    assert_eq!(cpu.state(), RunState::Ready);

    assert_eq!(cpu.step(), Ok(StepResult::Continue));
    assert_eq!(cpu.state(), RunState::Running);

    assert_eq!(cpu.step(), Ok(StepResult::Halt));
    assert_eq!(cpu.state(), RunState::Halted);
}

#[test]
fn cycles_accumulate_nominal_counts() {
    // LDA #$01 (2) + NOP (2) + BRK (7)
    let mut cpu = setup(&[0xA9, 0x01, 0xEA, 0x00]);
    cpu.run().unwrap();

    assert_eq!(cpu.cycles(), 11);
}

#[test]
fn save_state_round_trips_in_memory() {
    let mut cpu = setup(&[0xA9, 0xC0, 0xAA, 0xE8, 0x00]);
    cpu.step().unwrap(); // LDA
    cpu.step().unwrap(); // TAX
    let state = cpu.save_state();

    cpu.run().unwrap();
    assert_eq!(cpu.x, 0xC1);

    cpu.load_save_state(&state);
    assert_eq!(cpu.a, 0xC0);
    assert_eq!(cpu.x, 0xC0);
    assert_eq!(cpu.pc, 0x8003);
    assert_eq!(cpu.state(), RunState::Ready);

    // Resuming the restored session reaches the same end state
    cpu.run().unwrap();
    assert_eq!(cpu.x, 0xC1);
}

#[test]
fn save_state_round_trips_through_a_file() {
    let mut cpu = setup(&[0xA9, 0x7F, 0x00]);
    cpu.run().unwrap();

    let path = std::env::temp_dir().join("mos6502_save_state_test.bin");
    let path = path.to_str().unwrap();
    cpu.save_state().save_to_file(path).unwrap();

    let restored = SaveState::load_from_file(path).unwrap();
    assert_eq!(restored.a, 0x7F);
    assert_eq!(restored.pc, cpu.pc);
    assert_eq!(restored.ram.len(), 0x10000);
    assert_eq!(restored.ram[0x8000], 0xA9);

    let _ = std::fs::remove_file(path);
}
