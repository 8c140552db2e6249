// The chip behind the handheld: the sharp LR35902, a Z80 cousin with a
// reworked flag register and a 0xCB-prefixed second opcode bank.
//
// Opcodes decode by their upper two bits into four blocks, with the operand
// packed into bits 5-3 (y) and 2-0 (z):
//   block 0 (00yyyzzz)  loads, 16 bit arithmetic, rotates on A, JR
//   block 1 (01yyyzzz)  LD r8,r8 with 0x76 reinterpreted as HALT
//   block 2 (10yyyzzz)  8 bit ALU against A, operation selected by y
//   block 3 (11yyyzzz)  control flow, stack, immediates, DI/EI, prefix
use super::memory::Memory;
use super::register::Flag::{C, H, N, Z};
use super::register::Register;

// Machine cycles per opcode, not counting taken-branch penalties. The
// motherboard multiplies by 4 to reach dots.
//  0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f
const OP_CYCLES: [u32; 256] = [
    1, 3, 2, 2, 1, 1, 2, 1, 5, 2, 2, 2, 1, 1, 2, 1, // 0
    1, 3, 2, 2, 1, 1, 2, 1, 3, 2, 2, 2, 1, 1, 2, 1, // 1
    2, 3, 2, 2, 1, 1, 2, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 2
    2, 3, 2, 2, 3, 3, 3, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 3
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 4
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 5
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 6
    2, 2, 2, 2, 2, 2, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1, // 7
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 8
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 9
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // a
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // b
    2, 3, 3, 4, 3, 4, 2, 4, 2, 4, 3, 0, 3, 6, 2, 4, // c
    2, 3, 3, 0, 3, 4, 2, 4, 2, 4, 3, 0, 3, 0, 2, 4, // d
    3, 3, 2, 0, 0, 4, 2, 4, 4, 1, 4, 0, 0, 0, 2, 4, // e
    3, 3, 2, 1, 0, 4, 2, 4, 3, 2, 4, 1, 0, 0, 2, 4, // f
];

//  0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f
const CB_CYCLES: [u32; 256] = [
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 0
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 1
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 2
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 3
    2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 3, 2, // 4
    2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 3, 2, // 5
    2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 3, 2, // 6
    2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 3, 2, // 7
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 8
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // 9
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // a
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // b
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // c
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // d
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // e
    2, 2, 2, 2, 2, 2, 4, 2, 2, 2, 2, 2, 2, 2, 4, 2, // f
];

// r8 operand, from the three bit encoding shared by every block. Index 6 is
// the byte behind HL on the bus.
#[derive(Clone, Copy)]
enum Reg8 {
    B,
    C,
    D,
    E,
    H,
    L,
    HlMem,
    A,
}

impl Reg8 {
    fn decode(bits: u8) -> Self {
        match bits & 0x07 {
            0x00 => Reg8::B,
            0x01 => Reg8::C,
            0x02 => Reg8::D,
            0x03 => Reg8::E,
            0x04 => Reg8::H,
            0x05 => Reg8::L,
            0x06 => Reg8::HlMem,
            _ => Reg8::A,
        }
    }
}

#[derive(Clone, Copy)]
enum Reg16 {
    Bc,
    De,
    Hl,
    Sp,
}

impl Reg16 {
    fn decode(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => Reg16::Bc,
            0x01 => Reg16::De,
            0x02 => Reg16::Hl,
            _ => Reg16::Sp,
        }
    }
}

// The stack variant swaps SP for AF.
#[derive(Clone, Copy)]
enum Reg16Stk {
    Bc,
    De,
    Hl,
    Af,
}

impl Reg16Stk {
    fn decode(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => Reg16Stk::Bc,
            0x01 => Reg16Stk::De,
            0x02 => Reg16Stk::Hl,
            _ => Reg16Stk::Af,
        }
    }
}

// The memory-addressing variant: HL+ and HL- reference memory through HL and
// post-increment or post-decrement it.
#[derive(Clone, Copy)]
enum Reg16Mem {
    Bc,
    De,
    HlInc,
    HlDec,
}

impl Reg16Mem {
    fn decode(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => Reg16Mem::Bc,
            0x01 => Reg16Mem::De,
            0x02 => Reg16Mem::HlInc,
            _ => Reg16Mem::HlDec,
        }
    }
}

#[derive(Clone, Copy)]
enum Cond {
    Nz,
    Z,
    Nc,
    C,
}

impl Cond {
    fn decode(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => Cond::Nz,
            0x01 => Cond::Z,
            0x02 => Cond::Nc,
            _ => Cond::C,
        }
    }
}

pub struct Cpu {
    pub reg: Register,
    pub halted: bool,
    // The master enable latch. EI does not set it directly; it arms ei_delay
    // and the latch commits at the end of the following instruction.
    pub ime: bool,
    ei_delay: u8,
}

impl Cpu {
    pub fn power_up() -> Self {
        Self { reg: Register::power_up(), halted: false, ime: false, ei_delay: 0 }
    }

    fn imm(&mut self, mem: &mut dyn Memory) -> u8 {
        let v = mem.get(self.reg.pc);
        self.reg.pc = self.reg.pc.wrapping_add(1);
        v
    }

    fn imm_word(&mut self, mem: &mut dyn Memory) -> u16 {
        let v = mem.get_word(self.reg.pc);
        self.reg.pc = self.reg.pc.wrapping_add(2);
        v
    }

    // PUSH order is high byte first, each at a pre-decremented SP. POP reads
    // low then high.
    fn stack_add(&mut self, mem: &mut dyn Memory, v: u16) {
        self.reg.sp = self.reg.sp.wrapping_sub(2);
        mem.set_word(self.reg.sp, v);
    }

    fn stack_pop(&mut self, mem: &mut dyn Memory) -> u16 {
        let r = mem.get_word(self.reg.sp);
        self.reg.sp = self.reg.sp.wrapping_add(2);
        r
    }

    fn get_r8(&mut self, mem: &mut dyn Memory, r: Reg8) -> u8 {
        match r {
            Reg8::B => self.reg.b,
            Reg8::C => self.reg.c,
            Reg8::D => self.reg.d,
            Reg8::E => self.reg.e,
            Reg8::H => self.reg.h,
            Reg8::L => self.reg.l,
            Reg8::HlMem => mem.get(self.reg.get_hl()),
            Reg8::A => self.reg.a,
        }
    }

    fn set_r8(&mut self, mem: &mut dyn Memory, r: Reg8, v: u8) {
        match r {
            Reg8::B => self.reg.b = v,
            Reg8::C => self.reg.c = v,
            Reg8::D => self.reg.d = v,
            Reg8::E => self.reg.e = v,
            Reg8::H => self.reg.h = v,
            Reg8::L => self.reg.l = v,
            Reg8::HlMem => mem.set(self.reg.get_hl(), v),
            Reg8::A => self.reg.a = v,
        }
    }

    fn get_r16(&self, r: Reg16) -> u16 {
        match r {
            Reg16::Bc => self.reg.get_bc(),
            Reg16::De => self.reg.get_de(),
            Reg16::Hl => self.reg.get_hl(),
            Reg16::Sp => self.reg.sp,
        }
    }

    fn set_r16(&mut self, r: Reg16, v: u16) {
        match r {
            Reg16::Bc => self.reg.set_bc(v),
            Reg16::De => self.reg.set_de(v),
            Reg16::Hl => self.reg.set_hl(v),
            Reg16::Sp => self.reg.sp = v,
        }
    }

    fn get_r16stk(&self, r: Reg16Stk) -> u16 {
        match r {
            Reg16Stk::Bc => self.reg.get_bc(),
            Reg16Stk::De => self.reg.get_de(),
            Reg16Stk::Hl => self.reg.get_hl(),
            Reg16Stk::Af => self.reg.get_af(),
        }
    }

    fn set_r16stk(&mut self, r: Reg16Stk, v: u16) {
        match r {
            Reg16Stk::Bc => self.reg.set_bc(v),
            Reg16Stk::De => self.reg.set_de(v),
            Reg16Stk::Hl => self.reg.set_hl(v),
            // The low nibble of F is discarded by the register file.
            Reg16Stk::Af => self.reg.set_af(v),
        }
    }

    // Resolve a memory-addressing operand, post-stepping HL for the HL+ and
    // HL- variants.
    fn r16mem_addr(&mut self, r: Reg16Mem) -> u16 {
        match r {
            Reg16Mem::Bc => self.reg.get_bc(),
            Reg16Mem::De => self.reg.get_de(),
            Reg16Mem::HlInc => {
                let v = self.reg.get_hl();
                self.reg.set_hl(v.wrapping_add(1));
                v
            }
            Reg16Mem::HlDec => {
                let v = self.reg.get_hl();
                self.reg.set_hl(v.wrapping_sub(1));
                v
            }
        }
    }

    fn cond(&self, c: Cond) -> bool {
        match c {
            Cond::Nz => !self.reg.get_flag(Z),
            Cond::Z => self.reg.get_flag(Z),
            Cond::Nc => !self.reg.get_flag(C),
            Cond::C => self.reg.get_flag(C),
        }
    }
}

// The 8 bit ALU. Every helper leaves its flag contract in the register file;
// helpers that produce a value return it for the caller to store.
impl Cpu {
    // ADD n to A. Z from result, N reset, H on carry out of bit 3, C on
    // carry out of bit 7.
    fn alu_add(&mut self, n: u8) {
        let a = self.reg.a;
        let r = a.wrapping_add(n);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, (a & 0x0f) + (n & 0x0f) > 0x0f);
        self.reg.set_flag(C, u16::from(a) + u16::from(n) > 0xff);
        self.reg.a = r;
    }

    // ADD n plus the carry flag to A. H and C include the carry.
    fn alu_adc(&mut self, n: u8) {
        let a = self.reg.a;
        let c = u8::from(self.reg.get_flag(C));
        let r = a.wrapping_add(n).wrapping_add(c);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, (a & 0x0f) + (n & 0x0f) + c > 0x0f);
        self.reg.set_flag(C, u16::from(a) + u16::from(n) + u16::from(c) > 0xff);
        self.reg.a = r;
    }

    // SUB n from A. Z from result, N set, H on borrow from bit 4, C on
    // borrow.
    fn alu_sub(&mut self, n: u8) {
        let a = self.reg.a;
        let r = a.wrapping_sub(n);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, true);
        self.reg.set_flag(H, (a & 0x0f) < (n & 0x0f));
        self.reg.set_flag(C, u16::from(a) < u16::from(n));
        self.reg.a = r;
    }

    // SUB n plus the carry flag from A. H and C include the carry.
    fn alu_sbc(&mut self, n: u8) {
        let a = self.reg.a;
        let c = u8::from(self.reg.get_flag(C));
        let r = a.wrapping_sub(n).wrapping_sub(c);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, true);
        self.reg.set_flag(H, (a & 0x0f) < (n & 0x0f) + c);
        self.reg.set_flag(C, u16::from(a) < u16::from(n) + u16::from(c));
        self.reg.a = r;
    }

    // AND n with A. H is always set, N and C cleared.
    fn alu_and(&mut self, n: u8) {
        let r = self.reg.a & n;
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, true);
        self.reg.set_flag(C, false);
        self.reg.a = r;
    }

    // XOR n with A. Only Z can end up set.
    fn alu_xor(&mut self, n: u8) {
        let r = self.reg.a ^ n;
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, false);
        self.reg.a = r;
    }

    // OR n with A. Only Z can end up set.
    fn alu_or(&mut self, n: u8) {
        let r = self.reg.a | n;
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, false);
        self.reg.a = r;
    }

    // CP is a subtraction with the result thrown away.
    fn alu_cp(&mut self, n: u8) {
        let a = self.reg.a;
        self.alu_sub(n);
        self.reg.a = a;
    }

    // INC leaves C untouched; H is set on carry out of the low nibble.
    fn alu_inc(&mut self, a: u8) -> u8 {
        let r = a.wrapping_add(1);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, (a & 0x0f) + 0x01 > 0x0f);
        r
    }

    // DEC leaves C untouched; H is set on borrow from bit 4.
    fn alu_dec(&mut self, a: u8) -> u8 {
        let r = a.wrapping_sub(1);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, true);
        self.reg.set_flag(H, a & 0x0f == 0x00);
        r
    }

    // 16 bit add into HL. Z is untouched; H is the carry out of bit 11 and C
    // the carry out of bit 15.
    fn alu_add_hl(&mut self, n: u16) {
        let a = self.reg.get_hl();
        let r = a.wrapping_add(n);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, (a & 0x0fff) + (n & 0x0fff) > 0x0fff);
        self.reg.set_flag(C, a > 0xffff - n);
        self.reg.set_hl(r);
    }

    // SP plus a signed byte, shared by ADD SP,e8 and LD HL,SP+e8. Z and N are
    // always cleared; H and C come from the unsigned low-byte addition.
    fn alu_sp_e8(&mut self, mem: &mut dyn Memory) -> u16 {
        let a = self.reg.sp;
        let b = i16::from(self.imm(mem) as i8) as u16;
        self.reg.set_flag(Z, false);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, (a & 0x000f) + (b & 0x000f) > 0x000f);
        self.reg.set_flag(C, (a & 0x00ff) + (b & 0x00ff) > 0x00ff);
        a.wrapping_add(b)
    }

    // Rotate left, bit 7 into the carry and into bit 0.
    fn alu_rlc(&mut self, a: u8) -> u8 {
        let c = a & 0x80 != 0x00;
        let r = (a << 1) | u8::from(c);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, c);
        r
    }

    // Rotate left through the carry flag.
    fn alu_rl(&mut self, a: u8) -> u8 {
        let c = a & 0x80 != 0x00;
        let r = (a << 1) | u8::from(self.reg.get_flag(C));
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, c);
        r
    }

    // Rotate right, bit 0 into the carry and into bit 7.
    fn alu_rrc(&mut self, a: u8) -> u8 {
        let c = a & 0x01 != 0x00;
        let r = (a >> 1) | (u8::from(c) << 7);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, c);
        r
    }

    // Rotate right through the carry flag.
    fn alu_rr(&mut self, a: u8) -> u8 {
        let c = a & 0x01 != 0x00;
        let r = (a >> 1) | (u8::from(self.reg.get_flag(C)) << 7);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, c);
        r
    }

    // Shift left, bit 7 into the carry, bit 0 cleared.
    fn alu_sla(&mut self, a: u8) -> u8 {
        let c = a & 0x80 != 0x00;
        let r = a << 1;
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, c);
        r
    }

    // Arithmetic shift right, bit 0 into the carry, bit 7 kept.
    fn alu_sra(&mut self, a: u8) -> u8 {
        let c = a & 0x01 != 0x00;
        let r = (a >> 1) | (a & 0x80);
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, c);
        r
    }

    // Logical shift right, bit 0 into the carry, bit 7 cleared.
    fn alu_srl(&mut self, a: u8) -> u8 {
        let c = a & 0x01 != 0x00;
        let r = a >> 1;
        self.reg.set_flag(Z, r == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, c);
        r
    }

    // Swap the nibbles. All flags but Z end up cleared.
    fn alu_swap(&mut self, a: u8) -> u8 {
        self.reg.set_flag(Z, a == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, false);
        (a >> 4) | (a << 4)
    }

    // Test bit b. Z mirrors the complement of the bit, H is set, C untouched.
    fn alu_bit(&mut self, a: u8, b: u8) {
        self.reg.set_flag(Z, a & (1 << b) == 0x00);
        self.reg.set_flag(N, false);
        self.reg.set_flag(H, true);
    }

    fn alu_set(&mut self, a: u8, b: u8) -> u8 {
        a | (1 << b)
    }

    fn alu_res(&mut self, a: u8, b: u8) -> u8 {
        a & !(1 << b)
    }

    // Decimal adjust after a BCD add or subtract. After an add: plus 0x06
    // when H or the low nibble exceeds 9, plus 0x60 when C or A exceeds
    // 0x99. After a subtract the same corrections apply downward, driven by
    // H and C alone. C is set exactly when a 0x60 correction applied, so an
    // incoming carry survives the add branch.
    fn alu_daa(&mut self) {
        let mut a = self.reg.a;
        let mut adjust = if self.reg.get_flag(C) { 0x60 } else { 0x00 };
        if self.reg.get_flag(H) {
            adjust |= 0x06;
        }
        if !self.reg.get_flag(N) {
            if a & 0x0f > 0x09 {
                adjust |= 0x06;
            }
            if a > 0x99 {
                adjust |= 0x60;
            }
            a = a.wrapping_add(adjust);
        } else {
            a = a.wrapping_sub(adjust);
        }
        self.reg.set_flag(Z, a == 0x00);
        self.reg.set_flag(H, false);
        self.reg.set_flag(C, adjust >= 0x60);
        self.reg.a = a;
    }

    // Relative jump by the signed byte at PC.
    fn jr(&mut self, mem: &mut dyn Memory) {
        let n = self.imm(mem) as i8;
        self.reg.pc = (i32::from(self.reg.pc) + i32::from(n)) as u16;
    }
}

impl Cpu {
    // One fetch-execute step: service a pending interrupt, or burn a cycle
    // while halted, or execute the instruction at PC. Returns machine cycles
    // consumed.
    pub fn next(&mut self, mem: &mut dyn Memory) -> u32 {
        let c = self.handle_interrupts(mem);
        let cycles = if c != 0 {
            c
        } else if self.halted {
            1
        } else {
            self.ex(mem)
        };
        // An armed EI commits at the end of the instruction after it.
        if self.ei_delay > 0 {
            self.ei_delay -= 1;
            if self.ei_delay == 0 {
                self.ime = true;
            }
        }
        cycles
    }

    fn handle_interrupts(&mut self, mem: &mut dyn Memory) -> u32 {
        if !self.ime && !self.halted {
            return 0;
        }
        let intf = mem.get(0xff0f);
        let inte = mem.get(0xffff);
        let pending = intf & inte;
        if pending == 0x00 {
            return 0;
        }
        // Any pending enabled interrupt wakes a halted CPU, with or without
        // the master enable; the handler only runs when it is set.
        self.halted = false;
        if !self.ime {
            return 0;
        }
        self.ime = false;
        // Lowest bit index wins: V-Blank, STAT, Timer, Serial, Joypad.
        let n = pending.trailing_zeros();
        mem.set(0xff0f, intf & !(1 << n));
        self.stack_add(mem, self.reg.pc);
        self.reg.pc = 0x0040 | ((n as u16) << 3);
        4
    }

    fn ex(&mut self, mem: &mut dyn Memory) -> u32 {
        let opcode = self.imm(mem);
        if opcode == 0xcb {
            let cbcode = self.imm(mem);
            self.ex_cb(mem, cbcode);
            return CB_CYCLES[cbcode as usize];
        }
        let extra = match opcode >> 6 {
            0b00 => self.ex_misc(mem, opcode),
            0b01 => {
                // LD r8,r8, except that LD (HL),(HL) is HALT.
                if opcode == 0x76 {
                    self.halted = true;
                } else {
                    let v = self.get_r8(mem, Reg8::decode(opcode));
                    self.set_r8(mem, Reg8::decode(opcode >> 3), v);
                }
                0
            }
            0b10 => {
                let v = self.get_r8(mem, Reg8::decode(opcode));
                self.alu(opcode >> 3, v);
                0
            }
            _ => self.ex_ctrl(mem, opcode),
        };
        OP_CYCLES[opcode as usize] + extra
    }

    // The eight A-register operations of block 2, also reused for the
    // immediate forms in block 3.
    fn alu(&mut self, op: u8, v: u8) {
        match op & 0x07 {
            0x00 => self.alu_add(v),
            0x01 => self.alu_adc(v),
            0x02 => self.alu_sub(v),
            0x03 => self.alu_sbc(v),
            0x04 => self.alu_and(v),
            0x05 => self.alu_xor(v),
            0x06 => self.alu_or(v),
            _ => self.alu_cp(v),
        }
    }

    // Block 0: the assorted load/arithmetic/rotate/jump opcodes below 0x40.
    // Returns the extra machine cycle of a taken JR.
    fn ex_misc(&mut self, mem: &mut dyn Memory, opcode: u8) -> u32 {
        let y = (opcode >> 3) & 0x07;
        match opcode & 0x07 {
            0x00 => match y {
                0x00 => {} // NOP
                0x01 => {
                    // LD (a16),SP
                    let a = self.imm_word(mem);
                    mem.set_word(a, self.reg.sp);
                }
                0x02 => {} // STOP: no low power mode to enter here
                0x03 => self.jr(mem),
                _ => {
                    // JR cond,e8
                    if self.cond(Cond::decode(y - 4)) {
                        self.jr(mem);
                        return 1;
                    }
                    self.reg.pc = self.reg.pc.wrapping_add(1);
                }
            },
            0x01 => {
                let r = Reg16::decode(opcode >> 4);
                if opcode & 0x08 == 0x00 {
                    // LD r16,d16
                    let v = self.imm_word(mem);
                    self.set_r16(r, v);
                } else {
                    self.alu_add_hl(self.get_r16(r));
                }
            }
            0x02 => {
                let a = self.r16mem_addr(Reg16Mem::decode(opcode >> 4));
                if opcode & 0x08 == 0x00 {
                    mem.set(a, self.reg.a);
                } else {
                    self.reg.a = mem.get(a);
                }
            }
            0x03 => {
                // INC/DEC r16, no flags
                let r = Reg16::decode(opcode >> 4);
                let v = self.get_r16(r);
                if opcode & 0x08 == 0x00 {
                    self.set_r16(r, v.wrapping_add(1));
                } else {
                    self.set_r16(r, v.wrapping_sub(1));
                }
            }
            0x04 => {
                let r = Reg8::decode(y);
                let v = self.get_r8(mem, r);
                let v = self.alu_inc(v);
                self.set_r8(mem, r, v);
            }
            0x05 => {
                let r = Reg8::decode(y);
                let v = self.get_r8(mem, r);
                let v = self.alu_dec(v);
                self.set_r8(mem, r, v);
            }
            0x06 => {
                let v = self.imm(mem);
                self.set_r8(mem, Reg8::decode(y), v);
            }
            _ => match y {
                // The accumulator rotates always report Z clear, unlike
                // their CB-bank twins.
                0x00 => {
                    self.reg.a = self.alu_rlc(self.reg.a);
                    self.reg.set_flag(Z, false);
                }
                0x01 => {
                    self.reg.a = self.alu_rrc(self.reg.a);
                    self.reg.set_flag(Z, false);
                }
                0x02 => {
                    self.reg.a = self.alu_rl(self.reg.a);
                    self.reg.set_flag(Z, false);
                }
                0x03 => {
                    self.reg.a = self.alu_rr(self.reg.a);
                    self.reg.set_flag(Z, false);
                }
                0x04 => self.alu_daa(),
                0x05 => {
                    // CPL
                    self.reg.a = !self.reg.a;
                    self.reg.set_flag(N, true);
                    self.reg.set_flag(H, true);
                }
                0x06 => {
                    // SCF
                    self.reg.set_flag(N, false);
                    self.reg.set_flag(H, false);
                    self.reg.set_flag(C, true);
                }
                _ => {
                    // CCF
                    let v = !self.reg.get_flag(C);
                    self.reg.set_flag(N, false);
                    self.reg.set_flag(H, false);
                    self.reg.set_flag(C, v);
                }
            },
        }
        0
    }

    // Block 3: returns, stack traffic, absolute jumps and calls, restarts,
    // immediate ALU forms, the 0xFF00 page loads, DI/EI. Returns the extra
    // machine cycles of a taken conditional branch.
    fn ex_ctrl(&mut self, mem: &mut dyn Memory, opcode: u8) -> u32 {
        let y = (opcode >> 3) & 0x07;
        match opcode & 0x07 {
            0x00 => match y {
                0x00..=0x03 => {
                    // RET cond
                    if self.cond(Cond::decode(y)) {
                        self.reg.pc = self.stack_pop(mem);
                        return 3;
                    }
                }
                0x04 => {
                    // LDH (a8),A
                    let a = 0xff00 | u16::from(self.imm(mem));
                    mem.set(a, self.reg.a);
                }
                0x05 => {
                    // ADD SP,e8
                    let v = self.alu_sp_e8(mem);
                    self.reg.sp = v;
                }
                0x06 => {
                    // LDH A,(a8)
                    let a = 0xff00 | u16::from(self.imm(mem));
                    self.reg.a = mem.get(a);
                }
                _ => {
                    // LD HL,SP+e8
                    let v = self.alu_sp_e8(mem);
                    self.reg.set_hl(v);
                }
            },
            0x01 => {
                if opcode & 0x08 == 0x00 {
                    let v = self.stack_pop(mem);
                    self.set_r16stk(Reg16Stk::decode(opcode >> 4), v);
                } else {
                    match (opcode >> 4) & 0x03 {
                        0x00 => self.reg.pc = self.stack_pop(mem),
                        0x01 => {
                            // RETI enables interrupts with no delay.
                            self.reg.pc = self.stack_pop(mem);
                            self.ime = true;
                        }
                        0x02 => self.reg.pc = self.reg.get_hl(),
                        _ => self.reg.sp = self.reg.get_hl(),
                    }
                }
            }
            0x02 => match y {
                0x00..=0x03 => {
                    // JP cond,a16
                    let pc = self.imm_word(mem);
                    if self.cond(Cond::decode(y)) {
                        self.reg.pc = pc;
                        return 1;
                    }
                }
                0x04 => mem.set(0xff00 | u16::from(self.reg.c), self.reg.a),
                0x05 => {
                    let a = self.imm_word(mem);
                    mem.set(a, self.reg.a);
                }
                0x06 => self.reg.a = mem.get(0xff00 | u16::from(self.reg.c)),
                _ => {
                    let a = self.imm_word(mem);
                    self.reg.a = mem.get(a);
                }
            },
            0x03 => match y {
                0x00 => self.reg.pc = self.imm_word(mem),
                0x06 => {
                    self.ime = false;
                    self.ei_delay = 0;
                }
                0x07 => self.ei_delay = 2,
                _ => panic!("Opcode 0x{:02x} is not assigned", opcode),
            },
            0x04 => match y {
                0x00..=0x03 => {
                    // CALL cond,a16
                    let a = self.imm_word(mem);
                    if self.cond(Cond::decode(y)) {
                        self.stack_add(mem, self.reg.pc);
                        self.reg.pc = a;
                        return 3;
                    }
                }
                _ => panic!("Opcode 0x{:02x} is not assigned", opcode),
            },
            0x05 => {
                if opcode & 0x08 == 0x00 {
                    let v = self.get_r16stk(Reg16Stk::decode(opcode >> 4));
                    self.stack_add(mem, v);
                } else if opcode == 0xcd {
                    // CALL pushes the address of the next instruction.
                    let a = self.imm_word(mem);
                    self.stack_add(mem, self.reg.pc);
                    self.reg.pc = a;
                } else {
                    panic!("Opcode 0x{:02x} is not assigned", opcode);
                }
            }
            0x06 => {
                let v = self.imm(mem);
                self.alu(y, v);
            }
            _ => {
                // RST: call to one of the eight fixed vectors.
                self.stack_add(mem, self.reg.pc);
                self.reg.pc = u16::from(y) * 0x08;
            }
        }
        0
    }

    // The prefixed bank: rotates and shifts on any r8, then BIT/RES/SET with
    // the bit index in y.
    fn ex_cb(&mut self, mem: &mut dyn Memory, cbcode: u8) {
        let r = Reg8::decode(cbcode);
        let y = (cbcode >> 3) & 0x07;
        match cbcode >> 6 {
            0b00 => {
                let v = self.get_r8(mem, r);
                let v = match y {
                    0x00 => self.alu_rlc(v),
                    0x01 => self.alu_rrc(v),
                    0x02 => self.alu_rl(v),
                    0x03 => self.alu_rr(v),
                    0x04 => self.alu_sla(v),
                    0x05 => self.alu_sra(v),
                    0x06 => self.alu_swap(v),
                    _ => self.alu_srl(v),
                };
                self.set_r8(mem, r, v);
            }
            0b01 => {
                let v = self.get_r8(mem, r);
                self.alu_bit(v, y);
            }
            0b10 => {
                let v = self.get_r8(mem, r);
                let v = self.alu_res(v, y);
                self.set_r8(mem, r, v);
            }
            _ => {
                let v = self.get_r8(mem, r);
                let v = self.alu_set(v, y);
                self.set_r8(mem, r, v);
            }
        }
    }
}
