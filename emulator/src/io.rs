use crate::EmulatorState;
use crate::interrupt::Interrupter;

use log::{info, debug};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: u32,
    pub version: u16,
    pub manufacturer: u32,
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Invalid command {0:#06x}")]
    InvalidCommand(u16),

    #[error("{0}")]
    Other(String),
}

// A peripheral on the hardware bus.
//
// `handle_interrupt` runs on the CPU's thread, in the middle of an HWI
// instruction, and must return promptly. `start` and `stop` bracket the time
// the device is attached and are each called once. A device that runs its
// own thread may only talk to the CPU through the Interrupter it is given in
// `start`, and `stop` must not return until that thread has finished, so
// nothing arrives from a device after it is detached.
pub trait Device: Send {
    fn identify(&self) -> DeviceInfo;

    fn handle_interrupt(&mut self, state: &mut EmulatorState) -> Result<(), DeviceError>;

    fn start(&mut self, _interrupter: Interrupter) {}

    // Must be idempotent.
    fn stop(&mut self) {}
}

////////////////////////////////////////////////////////////////////////////////

// Attached devices, addressed by the order they were attached in.
pub struct DeviceBus {
    devices: Vec<Box<dyn Device>>,
    interrupter: Interrupter,
}

impl DeviceBus {
    pub fn new(interrupter: Interrupter) -> Self {
        DeviceBus {
            devices: Vec::new(),
            interrupter,
        }
    }

    pub fn attach(&mut self, mut device: Box<dyn Device>) -> usize {
        let info = device.identify();
        device.start(self.interrupter.clone());
        self.devices.push(device);
        let index = self.devices.len() - 1;
        info!(
            "Attached device {index}: id {:#010x}, version {:#06x}, manufacturer {:#010x}",
            info.id, info.version, info.manufacturer
        );
        index
    }

    // Later devices shift down to fill the gap.
    pub fn detach(&mut self, index: usize) -> Option<Box<dyn Device>> {
        if index >= self.devices.len() {
            return None;
        }
        let mut device = self.devices.remove(index);
        device.stop();
        info!("Detached device {index}");
        Some(device)
    }

    pub fn detach_all(&mut self) {
        while !self.devices.is_empty() {
            self.detach(self.devices.len() - 1);
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    // Callers check `index` against `len()` first.
    pub(crate) fn identify(&self, index: usize) -> DeviceInfo {
        self.devices[index].identify()
    }

    pub(crate) fn interrupt_device(
        &mut self,
        index: usize,
        state: &mut EmulatorState,
    ) -> Result<(), DeviceError> {
        let device = &mut self.devices[index];
        debug!("Device {index} interrupt handling beginning");
        let ret = device.handle_interrupt(state);
        debug!("Device {index} interrupt handling finished: {ret:?}");
        ret
    }
}

impl Drop for DeviceBus {
    fn drop(&mut self) {
        self.detach_all();
    }
}
