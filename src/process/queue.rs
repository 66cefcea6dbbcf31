// Per-priority FIFO ready queues
use crossbeam_queue::ArrayQueue;
use log::{trace, warn};

use crate::error::QueueError;
use crate::process::pcb::{Priority, ProcessControlBlock, Slot};

/// FIFO of ready process slots that all share one priority
pub struct ReadyQueue {
    priority: Priority,
    entries: ArrayQueue<Slot>,
}

impl ReadyQueue {
    pub fn new(priority: Priority, capacity: usize) -> Self {
        Self {
            priority,
            entries: ArrayQueue::new(capacity.max(1)),
        }
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `process` (living at `slot`) at the tail. Returns the new length.
    pub fn push(&mut self, slot: Slot, process: &ProcessControlBlock) -> Result<usize, QueueError> {
        if process.priority != self.priority {
            warn!(
                "Could not add process '{}' to queue {}, process and queue priorities do not match",
                process.name, self.priority
            );
            return Err(QueueError::PriorityMismatch);
        }
        if self.entries.push(slot).is_err() {
            warn!("Could not add process '{}' to queue {}, the queue is full", process.name, self.priority);
            return Err(QueueError::Full);
        }
        Ok(self.entries.len())
    }

    /// Remove the head. `None` on an empty queue is an ordinary outcome.
    pub fn pop(&mut self) -> Option<Slot> {
        let slot = self.entries.pop();
        if slot.is_none() {
            trace!("pop from empty queue {}", self.priority);
        }
        slot
    }
}
