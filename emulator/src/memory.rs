use crate::ExecError;

use common::constants::MEM_WORDS;

use log::trace;

// Word-addressed RAM that only allocates as far as it has been written.
// Capacity is always a power of two, up to the full address space.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    words: Vec<u16>,
}

impl Memory {
    pub fn new() -> Memory {
        Default::default()
    }

    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    // Unbacked addresses read as zero and don't allocate.
    pub fn load(&self, addr: u16) -> u16 {
        self.words.get(addr as usize).copied().unwrap_or(0)
    }

    pub fn store(&mut self, addr: u16, val: u16) {
        trace!("Mem: writing {val:#06x} to {addr:#06x}");
        let idx = addr as usize;
        if idx >= self.words.len() {
            // A u16 address is always inside the address space.
            self.grow_to(idx + 1);
        }
        self.words[idx] = val;
    }

    // Make sure `end` words are backed.
    pub fn reserve(&mut self, end: usize) -> Result<(), ExecError> {
        if end > MEM_WORDS {
            return Err(ExecError::AddressSpaceExhausted { end });
        }
        if end > self.words.len() {
            self.grow_to(end);
        }
        Ok(())
    }

    // Bulk write, used for program images. Nothing is written if the block
    // doesn't fit.
    pub fn write_words(&mut self, base: u16, data: &[u16]) -> Result<(), ExecError> {
        let start = base as usize;
        let end = start + data.len();
        self.reserve(end)?;
        self.words[start..end].copy_from_slice(data);
        trace!("Mem: wrote {} words at {base:#06x}", data.len());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.words = Vec::new();
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.words
    }

    fn grow_to(&mut self, end: usize) {
        debug_assert!(end <= MEM_WORDS);
        let new_len = end.next_power_of_two().min(MEM_WORDS);
        trace!("Mem: growing from {:#x} to {new_len:#x} words", self.words.len());
        self.words.resize(new_len, 0);
    }
}
