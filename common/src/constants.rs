// The address space is 0..=0xffff, in words.
pub const MEM_WORDS: usize = 0x10000;

// Contiguous block of IFx opcodes; a pending skip survives these.
pub const IF_FIRST: u16 = 0x10;
pub const IF_LAST: u16 = 0x17;

// Default cap on pending interrupts. Going past it is fatal.
pub const INTERRUPT_QUEUE_DEPTH: usize = 256;
