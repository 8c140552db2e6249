use dmg::memory::Memory;
use dmg::register::Flag::{C, H, N, Z};
mod common;
use common::{board, load_program, step};

#[test]
fn test_add_half_and_full_carry() {
    // ADD A,B with 0x3a + 0xc6 wraps to zero and carries out of both
    // nibbles.
    let mut mb = board();
    load_program(&mut mb, &[0x80]);
    mb.cpu.reg.a = 0x3a;
    mb.cpu.reg.b = 0xc6;
    step(&mut mb);
    assert_eq!(mb.cpu.reg.a, 0x00);
    assert!(mb.cpu.reg.get_flag(Z));
    assert!(!mb.cpu.reg.get_flag(N));
    assert!(mb.cpu.reg.get_flag(H));
    assert!(mb.cpu.reg.get_flag(C));
}

#[test]
fn test_inc_wraps_to_zero_and_keeps_carry() {
    let mut mb = board();
    load_program(&mut mb, &[0x3c]);
    mb.cpu.reg.a = 0xff;
    mb.cpu.reg.f = 0x00;
    step(&mut mb);
    assert_eq!(mb.cpu.reg.a, 0x00);
    assert!(mb.cpu.reg.get_flag(Z));
    assert!(!mb.cpu.reg.get_flag(N));
    assert!(mb.cpu.reg.get_flag(H));
    assert!(!mb.cpu.reg.get_flag(C));
}

#[test]
fn test_inc_dec_round_trip_preserves_carry() {
    // SCF, INC A, DEC A: A restored, C untouched by both.
    let mut mb = board();
    load_program(&mut mb, &[0x37, 0x3c, 0x3d]);
    mb.cpu.reg.a = 0x42;
    step(&mut mb);
    step(&mut mb);
    step(&mut mb);
    assert_eq!(mb.cpu.reg.a, 0x42);
    assert!(mb.cpu.reg.get_flag(C));
    assert!(!mb.cpu.reg.get_flag(Z));
}

#[test]
fn test_cp_is_sub_with_result_discarded() {
    let mut mb = board();
    load_program(&mut mb, &[0xb8]); // CP B
    mb.cpu.reg.a = 0x3c;
    mb.cpu.reg.b = 0x2f;
    step(&mut mb);
    let cp_flags = mb.cpu.reg.f;
    assert_eq!(mb.cpu.reg.a, 0x3c);

    let mut mb = board();
    load_program(&mut mb, &[0x90]); // SUB B
    mb.cpu.reg.a = 0x3c;
    mb.cpu.reg.b = 0x2f;
    step(&mut mb);
    assert_eq!(mb.cpu.reg.a, 0x0d);
    assert_eq!(mb.cpu.reg.f, cp_flags);
}

#[test]
fn test_and_ff_is_identity() {
    for a in [0x00u8, 0x01, 0x5a, 0xff] {
        let mut mb = board();
        load_program(&mut mb, &[0xe6, 0xff]); // AND d8
        mb.cpu.reg.a = a;
        step(&mut mb);
        assert_eq!(mb.cpu.reg.a, a);
        assert_eq!(mb.cpu.reg.get_flag(Z), a == 0x00);
        assert!(!mb.cpu.reg.get_flag(N));
        assert!(mb.cpu.reg.get_flag(H));
        assert!(!mb.cpu.reg.get_flag(C));
    }
}

#[test]
fn test_swap_twice_is_identity() {
    for a in [0x00u8, 0xab, 0xf0] {
        let mut mb = board();
        load_program(&mut mb, &[0xcb, 0x37, 0xcb, 0x37]); // SWAP A twice
        mb.cpu.reg.a = a;
        mb.cpu.reg.f = 0xf0;
        step(&mut mb);
        step(&mut mb);
        assert_eq!(mb.cpu.reg.a, a);
        // Everything but Z ends up cleared.
        assert_eq!(mb.cpu.reg.f, if a == 0x00 { 0x80 } else { 0x00 });
    }
}

#[test]
fn test_set_then_bit() {
    for n in 0..8u8 {
        let mut mb = board();
        // SET n,B then BIT n,B
        load_program(&mut mb, &[0xcb, 0xc0 | (n << 3), 0xcb, 0x40 | (n << 3)]);
        mb.cpu.reg.b = 0x00;
        step(&mut mb);
        step(&mut mb);
        assert_eq!(mb.cpu.reg.b, 1 << n);
        assert!(!mb.cpu.reg.get_flag(Z));
        assert!(!mb.cpu.reg.get_flag(N));
        assert!(mb.cpu.reg.get_flag(H));
    }
}

#[test]
fn test_accumulator_rotate_forces_z_clear() {
    // RLCA on zero would set Z in the CB bank; the accumulator form never
    // reports it.
    let mut mb = board();
    load_program(&mut mb, &[0x07]);
    mb.cpu.reg.a = 0x00;
    mb.cpu.reg.f = 0x80;
    step(&mut mb);
    assert!(!mb.cpu.reg.get_flag(Z));

    let mut mb = board();
    load_program(&mut mb, &[0x07]);
    mb.cpu.reg.a = 0x80;
    step(&mut mb);
    assert_eq!(mb.cpu.reg.a, 0x01);
    assert!(mb.cpu.reg.get_flag(C));
}

#[test]
fn test_daa_after_add() {
    // 0x3b has a low nibble above 9, so the add fixup applies 0x06 and must
    // leave C alone.
    let mut mb = board();
    load_program(&mut mb, &[0x27]);
    mb.cpu.reg.a = 0x3b;
    mb.cpu.reg.f = 0x00;
    step(&mut mb);
    assert_eq!(mb.cpu.reg.a, 0x41);
    assert!(!mb.cpu.reg.get_flag(H));
    assert!(!mb.cpu.reg.get_flag(C));
}

#[test]
fn test_daa_makes_bcd_sums() {
    for &a in &[0x00u8, 0x05, 0x09, 0x23, 0x55, 0x99] {
        for &b in &[0x00u8, 0x01, 0x07, 0x18, 0x46, 0x99] {
            let mut mb = board();
            load_program(&mut mb, &[0x80, 0x27]); // ADD A,B then DAA
            mb.cpu.reg.a = a;
            mb.cpu.reg.b = b;
            step(&mut mb);
            step(&mut mb);
            let dec = (a >> 4) as u32 * 10 + (a & 0x0f) as u32 + (b >> 4) as u32 * 10 + (b & 0x0f) as u32;
            let expect = ((dec % 100 / 10) << 4) as u8 | (dec % 10) as u8;
            assert_eq!(mb.cpu.reg.a, expect, "daa of {:02x} + {:02x}", a, b);
            assert_eq!(mb.cpu.reg.get_flag(C), dec > 99);
        }
    }
}

#[test]
fn test_ld_hl_sp_plus_offset() {
    let mut mb = board();
    load_program(&mut mb, &[0xf8, 0x02]); // LD HL,SP+2
    mb.cpu.reg.sp = 0xfff8;
    step(&mut mb);
    assert_eq!(mb.cpu.reg.get_hl(), 0xfffa);
    assert_eq!(mb.cpu.reg.sp, 0xfff8);
    assert_eq!(mb.cpu.reg.f, 0x00);
}

#[test]
fn test_push_pop_round_trip() {
    let mut mb = board();
    load_program(&mut mb, &[0xc5, 0xd1]); // PUSH BC, POP DE
    mb.cpu.reg.set_bc(0x1234);
    let sp = mb.cpu.reg.sp;
    step(&mut mb);
    step(&mut mb);
    assert_eq!(mb.cpu.reg.get_de(), 0x1234);
    assert_eq!(mb.cpu.reg.sp, sp);
}

#[test]
fn test_pop_af_zeroes_low_nibble() {
    let mut mb = board();
    load_program(&mut mb, &[0xc5, 0xf1]); // PUSH BC, POP AF
    mb.cpu.reg.set_bc(0x34ff);
    step(&mut mb);
    step(&mut mb);
    assert_eq!(mb.cpu.reg.get_af(), 0x34f0);
}

#[test]
fn test_call_ret_round_trip() {
    let mut mb = board();
    // CALL 0xc010; the target holds a RET.
    load_program(&mut mb, &[0xcd, 0x10, 0xc0]);
    mb.mmu.set(0xc010, 0xc9);
    let sp = mb.cpu.reg.sp;
    step(&mut mb);
    assert_eq!(mb.cpu.reg.pc, 0xc010);
    assert_eq!(mb.cpu.reg.sp, sp - 2);
    step(&mut mb);
    assert_eq!(mb.cpu.reg.pc, 0xc003);
    assert_eq!(mb.cpu.reg.sp, sp);
}

#[test]
fn test_taken_branches_cost_more() {
    // JR NZ taken is 3 machine cycles, not taken 2.
    let mut mb = board();
    load_program(&mut mb, &[0x20, 0x02]);
    mb.cpu.reg.set_flag(Z, false);
    assert_eq!(step(&mut mb), 3);

    let mut mb = board();
    load_program(&mut mb, &[0x20, 0x02]);
    mb.cpu.reg.set_flag(Z, true);
    assert_eq!(step(&mut mb), 2);
    assert_eq!(mb.cpu.reg.pc, 0xc002);
}

#[test]
fn test_interrupt_dispatch_order() {
    // V-Blank and Timer both pending: the lower bit is serviced, its flag
    // cleared, IME dropped and PC pushed.
    let mut mb = board();
    load_program(&mut mb, &[0x00]);
    mb.cpu.ime = true;
    mb.mmu.set(0xff0f, 0x05);
    mb.mmu.set(0xffff, 0x05);
    let pc = mb.cpu.reg.pc;
    let cycles = step(&mut mb);
    assert_eq!(cycles, 4);
    assert_eq!(mb.cpu.reg.pc, 0x0040);
    assert_eq!(mb.mmu.get(0xff0f), 0x04);
    assert!(!mb.cpu.ime);
    assert_eq!(mb.mmu.get_word(mb.cpu.reg.sp), pc);
}

#[test]
fn test_ei_takes_effect_one_instruction_late() {
    // EI, INC A with an interrupt already pending: the INC still runs before
    // the handler is entered.
    let mut mb = board();
    load_program(&mut mb, &[0xfb, 0x3c]);
    mb.cpu.reg.a = 0x00;
    mb.mmu.set(0xff0f, 0x01);
    mb.mmu.set(0xffff, 0x01);
    step(&mut mb); // EI
    assert!(!mb.cpu.ime);
    step(&mut mb); // INC A
    assert_eq!(mb.cpu.reg.a, 0x01);
    assert!(mb.cpu.ime);
    step(&mut mb); // dispatch
    assert_eq!(mb.cpu.reg.pc, 0x0040);
    assert_eq!(mb.cpu.reg.a, 0x01);
}

#[test]
fn test_di_cancels_armed_ei() {
    let mut mb = board();
    load_program(&mut mb, &[0xfb, 0xf3, 0x00]);
    mb.mmu.set(0xff0f, 0x01);
    mb.mmu.set(0xffff, 0x01);
    step(&mut mb); // EI
    step(&mut mb); // DI
    step(&mut mb); // NOP
    assert!(!mb.cpu.ime);
    assert_eq!(mb.cpu.reg.pc, 0xc003);
}

#[test]
fn test_halt_released_without_ime() {
    // A pending enabled interrupt wakes the CPU even with IME clear; no
    // handler runs and execution continues after the HALT.
    let mut mb = board();
    load_program(&mut mb, &[0x76, 0x3c]);
    step(&mut mb);
    assert!(mb.cpu.halted);
    assert_eq!(step(&mut mb), 1);
    assert_eq!(mb.cpu.reg.pc, 0xc001);
    mb.mmu.set(0xff0f, 0x04);
    mb.mmu.set(0xffff, 0x04);
    step(&mut mb);
    assert!(!mb.cpu.halted);
    assert_eq!(mb.cpu.reg.a, 0x02); // power-on A=0x01, plus the INC
    assert_eq!(mb.mmu.get(0xff0f), 0x04); // flag survives, nothing serviced
}

#[test]
fn test_rst_vectors() {
    let mut mb = board();
    load_program(&mut mb, &[0xef]); // RST 0x28
    let sp = mb.cpu.reg.sp;
    step(&mut mb);
    assert_eq!(mb.cpu.reg.pc, 0x0028);
    assert_eq!(mb.mmu.get_word(mb.cpu.reg.sp), 0xc001);
    assert_eq!(mb.cpu.reg.sp, sp - 2);
}

#[test]
fn test_hl_postincrement_loads() {
    // LD (HL+),A then LD A,(HL-)
    let mut mb = board();
    load_program(&mut mb, &[0x22, 0x3a]);
    mb.cpu.reg.a = 0x99;
    mb.cpu.reg.set_hl(0xc100);
    step(&mut mb);
    assert_eq!(mb.cpu.reg.get_hl(), 0xc101);
    assert_eq!(mb.mmu.get(0xc100), 0x99);
    step(&mut mb);
    assert_eq!(mb.cpu.reg.get_hl(), 0xc100);
}

#[test]
fn test_add_hl_flags() {
    // ADD HL,BC carries out of bit 11 but Z is untouched.
    let mut mb = board();
    load_program(&mut mb, &[0x09]);
    mb.cpu.reg.set_hl(0x0fff);
    mb.cpu.reg.set_bc(0x0001);
    mb.cpu.reg.f = 0x80;
    step(&mut mb);
    assert_eq!(mb.cpu.reg.get_hl(), 0x1000);
    assert!(mb.cpu.reg.get_flag(Z));
    assert!(mb.cpu.reg.get_flag(H));
    assert!(!mb.cpu.reg.get_flag(C));
}
