// Every memory reference in the machine passes through here: the address
// decoder routes each of the 65536 addresses to the cartridge, the PPU, work
// ram, high ram, an I/O register or the interrupt enable byte. The decode is
// total; there is no unmapped hole in the 16 bit space.
use super::cartridge::Cartridge;
use super::gpu::Gpu;
use super::intf::Intf;
use super::joypad::Joypad;
use super::memory::Memory;
use super::timer::Timer;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

pub struct Mmu {
    pub cartridge: Cartridge,
    pub gpu: Gpu,
    pub joypad: Joypad,
    pub timer: Timer,
    inte: u8,
    intf: Rc<RefCell<Intf>>,
    hram: [u8; 0x7f],
    wram: [u8; 0x2000],
    // Backing bytes for the I/O registers nothing below claims (serial,
    // sound, ...). Reads and writes pass through untouched.
    io: [u8; 0x80],
}

impl Mmu {
    pub fn power_up(rom: Vec<u8>, sav: impl AsRef<Path>) -> Self {
        let intf = Rc::new(RefCell::new(Intf::power_up()));
        let mut r = Self {
            cartridge: Cartridge::power_up(rom, sav),
            gpu: Gpu::power_up(intf.clone()),
            joypad: Joypad::power_up(intf.clone()),
            timer: Timer::power_up(intf.clone()),
            inte: 0x00,
            intf,
            hram: [0x00; 0x7f],
            wram: [0x00; 0x2000],
            io: [0x00; 0x80],
        };
        // Register state the boot rom leaves behind.
        r.set(0xff05, 0x00);
        r.set(0xff06, 0x00);
        r.set(0xff07, 0x00);
        r.set(0xff40, 0x91);
        r.set(0xff42, 0x00);
        r.set(0xff43, 0x00);
        r.set(0xff45, 0x00);
        r.set(0xff47, 0xfc);
        r.set(0xff48, 0xff);
        r.set(0xff49, 0xff);
        r.set(0xff4a, 0x00);
        r.set(0xff4b, 0x00);
        r
    }

    // Advance the clocked peripherals by the cycles the last instruction
    // consumed.
    pub fn next(&mut self, cycles: u32) {
        self.timer.next(cycles);
        self.gpu.next(cycles);
    }
}

impl Memory for Mmu {
    fn get(&self, a: u16) -> u8 {
        match a {
            0x0000..=0x7fff => self.cartridge.get(a),
            0x8000..=0x9fff => self.gpu.get(a),
            0xa000..=0xbfff => self.cartridge.get(a),
            0xc000..=0xdfff => self.wram[a as usize - 0xc000],
            // Echo ram reads back the work ram byte.
            0xe000..=0xfdff => self.wram[a as usize - 0xe000],
            0xfe00..=0xfe9f => self.gpu.get(a),
            0xfea0..=0xfeff => 0xff,
            0xff00 => self.joypad.get(a),
            0xff04..=0xff07 => self.timer.get(a),
            0xff0f => self.intf.borrow().data,
            0xff40..=0xff45 | 0xff47..=0xff4b => self.gpu.get(a),
            0xff00..=0xff7f => self.io[a as usize - 0xff00],
            0xff80..=0xfffe => self.hram[a as usize - 0xff80],
            0xffff => self.inte,
        }
    }

    fn set(&mut self, a: u16, v: u8) {
        match a {
            0x0000..=0x7fff => self.cartridge.set(a, v),
            0x8000..=0x9fff => self.gpu.set(a, v),
            0xa000..=0xbfff => self.cartridge.set(a, v),
            0xc000..=0xdfff => self.wram[a as usize - 0xc000] = v,
            // Echo ram writes mirror into work ram.
            0xe000..=0xfdff => self.wram[a as usize - 0xe000] = v,
            0xfe00..=0xfe9f => self.gpu.set(a, v),
            0xfea0..=0xfeff => {}
            0xff00 => self.joypad.set(a, v),
            0xff04..=0xff07 => self.timer.set(a, v),
            0xff0f => self.intf.borrow_mut().data = v,
            0xff46 => {
                // DMA transfer of 160 bytes from XX00-XX9F into OAM.
                self.io[a as usize - 0xff00] = v;
                let base = u16::from(v) << 8;
                for i in 0..0xa0 {
                    let b = self.get(base + i);
                    self.set(0xfe00 + i, b);
                }
            }
            0xff40..=0xff45 | 0xff47..=0xff4b => self.gpu.set(a, v),
            0xff00..=0xff7f => self.io[a as usize - 0xff00] = v,
            0xff80..=0xfffe => self.hram[a as usize - 0xff80] = v,
            0xffff => self.inte = v,
        }
    }
}
