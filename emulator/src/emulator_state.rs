use crate::interrupt::Interrupter;
use crate::memory::Memory;

use common::asm::{NUM_REGS, Reg};

use log::trace;

// This is separate so a mutable borrow can be passed to device interrupt handlers.
#[derive(Debug)]
pub struct EmulatorState {
    num_ins: usize,
    mem: Memory,
    regs: [u16; NUM_REGS],
    sp: u16,
    pc: u16,
    ex: u16,
    ia: u16,

    // Address of the instruction currently executing.
    last_pc: u16,

    // While set, interrupts stay queued instead of being delivered.
    queueing: bool,
    skip: bool,

    interrupts: Interrupter,
}

impl EmulatorState {
    pub fn new() -> Self {
        EmulatorState {
            num_ins: 0usize,
            mem: Memory::new(),
            regs: [0; NUM_REGS],
            sp: 0,
            pc: 0,
            ex: 0,
            ia: 0,
            last_pc: 0,
            queueing: false,
            skip: false,
            interrupts: Interrupter::default(),
        }
    }

    // Registers, flags and pending interrupts. Memory is left alone.
    pub fn reset(&mut self) {
        self.num_ins = 0;
        self.regs = [0; NUM_REGS];
        self.sp = 0;
        self.pc = 0;
        self.ex = 0;
        self.ia = 0;
        self.last_pc = 0;
        self.queueing = false;
        self.skip = false;
        self.interrupts.clear();
    }

    pub fn reset_memory(&mut self) {
        self.mem.clear();
    }

    pub fn inc_ins(&mut self) {
        self.num_ins += 1;
    }

    pub fn num_ins(&self) -> usize {
        self.num_ins
    }

    pub fn mem_read(&self, addr: u16) -> u16 {
        self.mem.load(addr)
    }

    pub fn mem_write(&mut self, addr: u16, val: u16) {
        self.mem.store(addr, val);
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    pub fn reg(&self, reg: Reg) -> u16 {
        self.regs[reg.index()]
    }

    pub fn set_reg(&mut self, reg: Reg, val: u16) {
        trace!("Reg: writing {val:#06x} to {reg}");
        self.regs[reg.index()] = val;
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn set_sp(&mut self, val: u16) {
        trace!("Reg: writing {val:#06x} to SP");
        self.sp = val;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, val: u16) {
        trace!("Reg: writing {val:#06x} to PC");
        self.pc = val;
    }

    pub fn ex(&self) -> u16 {
        self.ex
    }

    pub fn set_ex(&mut self, val: u16) {
        trace!("Reg: writing {val:#06x} to EX");
        self.ex = val;
    }

    pub fn ia(&self) -> u16 {
        self.ia
    }

    pub fn set_ia(&mut self, val: u16) {
        trace!("Reg: writing {val:#06x} to IA");
        self.ia = val;
    }

    pub fn last_pc(&self) -> u16 {
        self.last_pc
    }

    pub(crate) fn set_last_pc(&mut self, val: u16) {
        self.last_pc = val;
    }

    pub fn queueing(&self) -> bool {
        self.queueing
    }

    pub fn set_queueing(&mut self, val: bool) {
        self.queueing = val;
    }

    pub fn skip(&self) -> bool {
        self.skip
    }

    pub fn set_skip(&mut self, val: bool) {
        self.skip = val;
    }

    // The next word of the instruction stream. This is the only thing that
    // advances PC while an instruction is decoded.
    pub fn fetch_word(&mut self) -> u16 {
        let word = self.mem.load(self.pc);
        self.pc = self.pc.wrapping_add(1);
        word
    }

    pub fn push(&mut self, val: u16) {
        self.sp = self.sp.wrapping_sub(1);
        self.mem.store(self.sp, val);
    }

    pub fn pop(&mut self) -> u16 {
        let val = self.mem.load(self.sp);
        self.sp = self.sp.wrapping_add(1);
        val
    }

    // Safe to call from a device's interrupt handler.
    pub fn interrupt(&self, message: u16) {
        self.interrupts.interrupt(message);
    }

    pub fn interrupter(&self) -> &Interrupter {
        &self.interrupts
    }
}

impl Default for EmulatorState {
    fn default() -> Self {
        Self::new()
    }
}
