use super::cpu::Cpu;
use super::joypad::JoypadKey;
use super::mmu::Mmu;
use std::path::Path;

// The single owner of the machine. A driver repeatedly calls do_cycle, which
// runs one instruction and then feeds the elapsed time to the clocked
// peripherals; everything in between is a plain sequential call chain.
pub struct MotherBoard {
    pub mmu: Mmu,
    pub cpu: Cpu,
}

impl MotherBoard {
    pub fn power_up(rom: Vec<u8>, sav: impl AsRef<Path>) -> Self {
        Self { mmu: Mmu::power_up(rom, sav), cpu: Cpu::power_up() }
    }

    pub fn do_cycle(&mut self) -> u32 {
        // The cycle tables count machine cycles; the peripherals count dots,
        // four per machine cycle.
        let cycles = self.cpu.next(&mut self.mmu) * 4;
        self.mmu.next(cycles);
        cycles
    }

    pub fn check_and_reset_gpu_updated(&mut self) -> bool {
        let result = self.mmu.gpu.updated;
        self.mmu.gpu.updated = false;
        result
    }

    pub fn keydown(&mut self, key: JoypadKey) {
        self.mmu.joypad.keydown(key);
    }

    pub fn keyup(&mut self, key: JoypadKey) {
        self.mmu.joypad.keyup(key);
    }
}
