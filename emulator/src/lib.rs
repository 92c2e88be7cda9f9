pub mod emulator;
pub mod emulator_state;
pub mod error;
mod handlers;
pub mod interrupt;
pub mod io;
pub mod memory;
pub mod operand;

pub use emulator::{Emulator, ExecRet, HaltHandle};
pub use emulator_state::EmulatorState;
pub use error::ExecError;
pub use interrupt::Interrupter;
pub use io::{Device, DeviceBus, DeviceError, DeviceInfo};
pub use memory::Memory;
pub use operand::{Location, Operand};
