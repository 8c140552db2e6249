// The eight buttons are arranged as a 2x4 matrix. A program selects either
// the button or the direction row by writing to FF00, then reads the state of
// the selected row out of the low nibble.
//
// FF00 - P1/JOYP - Joypad (R/W)
//
// Bit 7 - Not used
// Bit 6 - Not used
// Bit 5 - P15 Select Button Keys      (0=Select)
// Bit 4 - P14 Select Direction Keys   (0=Select)
// Bit 3 - P13 Input Down  or Start    (0=Pressed) (Read Only)
// Bit 2 - P12 Input Up    or Select   (0=Pressed) (Read Only)
// Bit 1 - P11 Input Left  or Button B (0=Pressed) (Read Only)
// Bit 0 - P10 Input Right or Button A (0=Pressed) (Read Only)
use super::intf::{Flag, Intf};
use super::memory::Memory;
use std::cell::RefCell;
use std::rc::Rc;

#[rustfmt::skip]
#[derive(Clone, Copy)]
pub enum JoypadKey {
    Right  = 0,
    Left   = 1,
    Up     = 2,
    Down   = 3,
    A      = 4,
    B      = 5,
    Select = 6,
    Start  = 7,
}

pub struct Joypad {
    intf: Rc<RefCell<Intf>>,
    // Bits 5-4 of FF00, the only writable ones.
    select: u8,
    // One latch per matrix row, 1 = released.
    direction: u8,
    action: u8,
}

impl Joypad {
    pub fn power_up(intf: Rc<RefCell<Intf>>) -> Self {
        Self { intf, select: 0x30, direction: 0x0f, action: 0x0f }
    }

    pub fn keydown(&mut self, key: JoypadKey) {
        let k = key as u8;
        let bit = 1 << (k & 0x03);
        if k < 4 {
            self.direction &= !bit;
        } else {
            self.action &= !bit;
        }
        self.intf.borrow_mut().hi(Flag::Joypad);
    }

    pub fn keyup(&mut self, key: JoypadKey) {
        let k = key as u8;
        let bit = 1 << (k & 0x03);
        if k < 4 {
            self.direction |= bit;
        } else {
            self.action |= bit;
        }
    }
}

impl Memory for Joypad {
    fn get(&self, a: u16) -> u8 {
        assert_eq!(a, 0xff00);
        // A selected row pulls its latch onto the low nibble; selecting both
        // rows reads them wired-AND.
        let mut row = 0x0f;
        if self.select & 0x10 == 0x00 {
            row &= self.direction;
        }
        if self.select & 0x20 == 0x00 {
            row &= self.action;
        }
        self.select | row
    }

    fn set(&mut self, a: u16, v: u8) {
        assert_eq!(a, 0xff00);
        self.select = v & 0x30;
    }
}
