//! CPU architectural state: register file, program counter, and the
//! halted flag (spec.md §3's PC/register-file lifecycle).
//!
//! Deliberately holds no memory of its own — [`crate::memory::Memory`]
//! is owned separately by [`crate::simulator::Simulator`] and threaded
//! through [`crate::exec::execute`], matching spec.md §3's description
//! of memory and registers as independently-lifecycled pieces of state
//! that the driver wires together.

use crate::registers::RegisterFile;

#[derive(Debug, Clone)]
pub struct Cpu {
    pub registers: RegisterFile,
    pub pc: u32,
    pub halted: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            registers: RegisterFile::new(),
            pc: 0,
            halted: false,
        }
    }

    pub fn reset(&mut self) {
        self.registers.reset();
        self.pc = 0;
        self.halted = false;
    }
}
