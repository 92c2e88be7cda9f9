use crate::ExecError;

use common::constants::INTERRUPT_QUEUE_DEPTH;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{trace, warn};

#[derive(Debug)]
struct Queue {
    messages: VecDeque<u16>,
    limit: Option<usize>,
    overflowed: bool,
}

// Handle to the pending interrupt queue. This is the only part of the CPU a
// device's background thread may touch; everything else is reached through
// the synchronous HWI callback.
#[derive(Debug, Clone)]
pub struct Interrupter {
    queue: Arc<Mutex<Queue>>,
}

impl Default for Interrupter {
    fn default() -> Self {
        Interrupter::new(Some(INTERRUPT_QUEUE_DEPTH))
    }
}

impl Interrupter {
    pub fn new(limit: Option<usize>) -> Self {
        Interrupter {
            queue: Arc::new(Mutex::new(Queue {
                messages: VecDeque::new(),
                limit,
                overflowed: false,
            })),
        }
    }

    // Queue an interrupt. Messages are delivered in the order this is called,
    // whichever thread calls it.
    pub fn interrupt(&self, message: u16) {
        let mut queue = self.lock();
        if queue.limit.is_some_and(|limit| queue.messages.len() >= limit) {
            warn!("Interrupt queue full; dropping message {message:#06x}");
            queue.overflowed = true;
            return;
        }
        trace!("Queueing interrupt {message:#06x}");
        queue.messages.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }

    pub fn pending(&self) -> Vec<u16> {
        self.lock().messages.iter().copied().collect()
    }

    pub(crate) fn pop(&self) -> Result<Option<u16>, ExecError> {
        let mut queue = self.lock();
        if queue.overflowed {
            return Err(ExecError::InterruptQueueOverflow { depth: queue.messages.len() });
        }
        Ok(queue.messages.pop_front())
    }

    pub(crate) fn check_overflow(&self) -> Result<(), ExecError> {
        let queue = self.lock();
        if queue.overflowed {
            return Err(ExecError::InterruptQueueOverflow { depth: queue.messages.len() });
        }
        Ok(())
    }

    pub(crate) fn set_limit(&self, limit: Option<usize>) {
        self.lock().limit = limit;
    }

    pub(crate) fn clear(&self) {
        let mut queue = self.lock();
        queue.messages.clear();
        queue.overflowed = false;
    }

    // The queue is a plain VecDeque, so a panic while it was held can't leave
    // it half-updated.
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
