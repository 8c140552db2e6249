// The timer has a selectable frequency of 4096, 16384, 65536 or 262144 Hz.
// That frequency increments the Timer Counter (TIMA); when it overflows it
// reloads from the Timer Modulo (TMA) and requests an interrupt.
//
// See: http://gbdev.gg8.se/wiki/articles/Timer_and_Divider_Registers
use super::intf::{Flag, Intf};
use std::cell::RefCell;
use std::rc::Rc;

pub struct Timer {
    intf: Rc<RefCell<Intf>>,

    // FF04 - DIV. Incremented at 16384Hz, which is once every 256 cycles of
    // the 4194304Hz master clock. Writing any value resets it to 0x00.
    div: u8,
    // FF05 - TIMA. Incremented at the frequency selected by TAC. When it
    // overflows it is reloaded with TMA and a timer interrupt is requested.
    tima: u8,
    // FF06 - TMA.
    tma: u8,
    // FF07 - TAC.
    //   Bit  2   - Timer Enable
    //   Bits 1-0 - Input Clock Select
    //              00: CPU Clock / 1024    10: CPU Clock / 64
    //              01: CPU Clock / 16      11: CPU Clock / 256
    tac: u8,

    div_counter: u32,
    tima_counter: u32,
}

impl Timer {
    pub fn power_up(intf: Rc<RefCell<Intf>>) -> Self {
        Self { intf, div: 0x00, tima: 0x00, tma: 0x00, tac: 0x00, div_counter: 0, tima_counter: 0 }
    }

    fn threshold(&self) -> u32 {
        match self.tac & 0x03 {
            0x00 => 1024,
            0x01 => 16,
            0x02 => 64,
            _ => 256,
        }
    }

    pub fn get(&self, a: u16) -> u8 {
        match a {
            0xff04 => self.div,
            0xff05 => self.tima,
            0xff06 => self.tma,
            0xff07 => self.tac,
            _ => panic!("Unsupported timer register 0x{:04x}", a),
        }
    }

    pub fn set(&mut self, a: u16, v: u8) {
        match a {
            0xff04 => self.div = 0x00,
            0xff05 => self.tima = v,
            0xff06 => self.tma = v,
            0xff07 => self.tac = v,
            _ => panic!("Unsupported timer register 0x{:04x}", a),
        }
    }

    pub fn next(&mut self, cycles: u32) {
        self.div_counter += cycles;
        while self.div_counter >= 256 {
            self.div = self.div.wrapping_add(1);
            self.div_counter -= 256;
        }

        if self.tac & 0x04 != 0x00 {
            self.tima_counter += cycles;
            let threshold = self.threshold();
            while self.tima_counter >= threshold {
                self.tima = self.tima.wrapping_add(1);
                if self.tima == 0x00 {
                    self.tima = self.tma;
                    self.intf.borrow_mut().hi(Flag::Timer);
                }
                self.tima_counter -= threshold;
            }
        }
    }
}
