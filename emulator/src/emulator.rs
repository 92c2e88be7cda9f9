use crate::handlers::{BASIC_HANDLERS, SPECIAL_HANDLERS};
use crate::interrupt::Interrupter;
use crate::io::{Device, DeviceBus};
use crate::{EmulatorState, ExecError};

use common::asm::{BasicOpcode, InsWord, Reg, SpecialOpcode};
use common::mem::{Endian, words_from_bytes};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use delegate::delegate;
use derive_more::IsVariant;
use log::{debug, info, trace, warn};


#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum ExecRet {
    Ok,
    // Decoded but not executed, because a conditional failed.
    Skipped,
    Halt,
}


// Lets another thread stop run() between instructions.
#[derive(Debug, Clone, Default)]
pub struct HaltHandle(Arc<AtomicBool>);

impl HaltHandle {
    pub fn halt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}


pub struct Emulator {
    pub(crate) state: EmulatorState,
    pub(crate) devices: DeviceBus,
    halt: HaltHandle,
}

impl Emulator {
    pub fn new() -> Emulator {
        let state = EmulatorState::new();
        let devices = DeviceBus::new(state.interrupter().clone());
        Emulator {
            state,
            devices,
            halt: HaltHandle::default(),
        }
    }

    // Run until a halt.
    pub fn run(&mut self) -> Result<(), ExecError> {
        info!("Running from {:#06x}", self.state.pc());
        loop {
            if self.halt.take() {
                info!("Halt requested");
                break;
            }
            if self.run_ins()?.is_halt() {
                break;
            }
        }
        info!("Halted at {:#06x} after {} instructions", self.state.pc(), self.state.num_ins());
        Ok(())
    }

    pub fn run_at(&mut self, pc: u16) -> Result<(), ExecError> {
        self.state.set_pc(pc);
        self.run()
    }

    // Run a single instruction, delivering at most one pending interrupt first.
    pub fn run_ins(&mut self) -> Result<ExecRet, ExecError> {
        self.service_interrupt()?;
        self.state.inc_ins();

        let pc = self.state.pc();
        self.state.set_last_pc(pc);
        let ins = InsWord::split(self.state.fetch_word());

        // "a" first, since its extra word comes first.
        let a = self.state.decode_operand(ins.a, true)?;
        let b = match ins.is_special() {
            true => None,
            false => Some(self.state.decode_operand(ins.b, false)?),
        };

        if self.state.skip() {
            // A chain of conditionals is skipped as a unit.
            if !ins.is_conditional() {
                self.state.set_skip(false);
            }
            debug!("PC: {pc:#06x}: skipped");
            return Ok(ExecRet::Skipped);
        }

        match b {
            Some(b) => {
                let Some(handler) = BasicOpcode::decode(ins.op).and_then(|op| {
                    debug!("PC: {pc:#06x}: {op} {b}, {a}");
                    BASIC_HANDLERS[op.code() as usize]
                }) else {
                    return Err(ExecError::InvalidBasicOpcode(ins.op));
                };
                handler(self, &b, &a)
            }
            None => {
                let Some(handler) = SpecialOpcode::decode(ins.b).and_then(|op| {
                    debug!("PC: {pc:#06x}: {op} {a}");
                    SPECIAL_HANDLERS[op.code() as usize]
                }) else {
                    return Err(ExecError::InvalidSpecialOpcode(ins.b));
                };
                handler(self, &a)
            }
        }
    }

    fn service_interrupt(&mut self) -> Result<(), ExecError> {
        let interrupter = self.state.interrupter();
        interrupter.check_overflow()?;
        if self.state.queueing() {
            return Ok(());
        }
        let Some(message) = interrupter.pop()? else {
            return Ok(());
        };

        let ia = self.state.ia();
        if ia == 0 {
            warn!("Dropping interrupt {message:#06x}; IA is 0");
            return Ok(());
        }

        debug!("Delivering interrupt {message:#06x} to {ia:#06x}");
        let pc = self.state.pc();
        self.state.push(pc);
        let a = self.state.reg(Reg::A);
        self.state.push(a);
        self.state.set_pc(ia);
        self.state.set_reg(Reg::A, message);
        self.state.set_queueing(true);
        Ok(())
    }

    // Queue an interrupt as if from software.
    pub fn interrupt(&self, message: u16) {
        self.state.interrupt(message);
    }

    pub fn interrupter(&self) -> Interrupter {
        self.state.interrupter().clone()
    }

    pub fn halt_handle(&self) -> HaltHandle {
        self.halt.clone()
    }

    pub fn set_interrupt_queue_limit(&mut self, limit: Option<usize>) {
        self.state.interrupter().set_limit(limit);
    }


    ///////////////////////////////////////////////////////////////////////////


    // Returns the device's index on the bus, which is what HWQ and HWI take.
    pub fn attach_device(&mut self, device: impl Device + 'static) -> usize {
        self.devices.attach(Box::new(device))
    }

    pub fn detach_device(&mut self, index: usize) -> Option<Box<dyn Device>> {
        self.devices.detach(index)
    }

    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    pub fn load_program(&mut self, words: &[u16], base: u16) -> Result<(), ExecError> {
        self.state.memory_mut().write_words(base, words)?;
        trace!("Loaded {} words at {base:#06x}", words.len());
        Ok(())
    }

    // A trailing odd byte is ignored.
    pub fn load_program_bytes(&mut self, bytes: &[u8], base: u16, endian: Endian) -> Result<(), ExecError> {
        self.load_program(&words_from_bytes(bytes, endian), base)
    }

    // Clears registers, flags and pending interrupts; devices stay attached.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn reset_memory(&mut self) {
        self.state.reset_memory();
    }

    pub fn get_state(&self) -> &EmulatorState {
        &self.state
    }

    pub fn get_state_mut(&mut self) -> &mut EmulatorState {
        &mut self.state
    }

    delegate! {
        to self.state {
            pub fn reg(&self, reg: Reg) -> u16;
            pub fn set_reg(&mut self, reg: Reg, val: u16);
            pub fn pc(&self) -> u16;
            pub fn sp(&self) -> u16;
            pub fn ex(&self) -> u16;
            pub fn ia(&self) -> u16;
            pub fn mem_read(&self, addr: u16) -> u16;
            pub fn mem_write(&mut self, addr: u16, val: u16);
            pub fn num_ins(&self) -> usize;
        }
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}
