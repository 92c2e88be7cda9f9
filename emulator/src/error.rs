use crate::io::DeviceError;

use thiserror::Error;

// Conditions that stop the run loop with an error. CPU state is not rolled
// back, so it is only meaningful up to the instruction that failed.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Invalid operand code {code:#04x} in {} position", position(.is_a))]
    InvalidOperand { code: u16, is_a: bool },

    #[error("Invalid basic opcode {0:#04x}")]
    InvalidBasicOpcode(u16),

    #[error("Invalid special opcode {0:#04x}")]
    InvalidSpecialOpcode(u16),

    #[error("Memory would need to grow to {end:#x} words, past the end of the address space")]
    AddressSpaceExhausted { end: usize },

    #[error("Hardware index out of range: {0:#06x}")]
    InvalidHardwareIndex(u16),

    #[error("Device {index} failed to handle interrupt")]
    Device {
        index: u16,
        #[source]
        source: DeviceError,
    },

    #[error("Interrupt queue overflowed ({depth} pending)")]
    InterruptQueueOverflow { depth: usize },
}

fn position(is_a: &bool) -> &'static str {
    if *is_a { "a" } else { "b" }
}
