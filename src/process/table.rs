// Fixed-capacity process table used as a slot allocator
use alloc::vec::Vec;

use crate::config::{KernelConfig, HIGHEST_PRIORITY, LOWEST_PRIORITY, MAX_ARG, MAX_NAME};
use crate::error::SpawnError;
use crate::process::pcb::{EntryPoint, Priority, ProcessControlBlock, ProcessId, ProcessState, Slot};

/// Owns every process record. A slot is free exactly when it holds `None`.
pub struct ProcessTable {
    slots: Vec<Option<ProcessControlBlock>>,
    next_pid: ProcessId,
    min_stack_size: usize,
}

impl ProcessTable {
    pub fn new(config: &KernelConfig) -> Self {
        let mut slots = Vec::with_capacity(config.max_processes);
        slots.resize_with(config.max_processes, || None);
        Self {
            slots,
            next_pid: 1,
            min_stack_size: config.min_stack_size,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Pid the next successful allocation will receive.
    pub fn next_pid(&self) -> ProcessId {
        self.next_pid
    }

    /// Check spawn parameters without touching the table.
    pub fn validate(
        &self,
        name: &str,
        args: &str,
        priority: Priority,
        stack_size: usize,
    ) -> Result<(), SpawnError> {
        if name.is_empty() {
            return Err(SpawnError::NullName);
        }
        if name.len() >= MAX_NAME - 1 {
            return Err(SpawnError::NameTooLong);
        }
        if args.len() >= MAX_ARG {
            return Err(SpawnError::ArgsTooLong);
        }
        if stack_size < self.min_stack_size {
            return Err(SpawnError::StackTooSmall);
        }
        if !(LOWEST_PRIORITY..=HIGHEST_PRIORITY).contains(&priority) {
            return Err(SpawnError::InvalidPriority);
        }
        Ok(())
    }

    /// Validate and place a new READY record in the first free slot.
    pub fn allocate(
        &mut self,
        name: &str,
        args: &str,
        priority: Priority,
        stack_size: usize,
        entry: EntryPoint,
    ) -> Result<Slot, SpawnError> {
        self.validate(name, args, priority, stack_size)?;

        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(SpawnError::TableFull)?;

        let pid = self.next_pid;
        self.next_pid += 1;
        self.slots[slot] = Some(ProcessControlBlock::new(pid, name, args, priority, stack_size, entry));
        Ok(slot)
    }

    /// Return a slot to the free pool, handing back the record it held.
    pub fn free(&mut self, slot: Slot) -> Option<ProcessControlBlock> {
        let record = self.slots.get_mut(slot)?.take();
        debug_assert!(record
            .as_ref()
            .map_or(true, |p| p.state == ProcessState::Quit && p.parent.is_none()));
        record
    }

    pub fn get(&self, slot: Slot) -> Option<&ProcessControlBlock> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut ProcessControlBlock> {
        self.slots.get_mut(slot).and_then(|s| s.as_mut())
    }

    pub fn pid_of(&self, slot: Slot) -> ProcessId {
        self.get(slot).map_or(0, |p| p.pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &ProcessControlBlock)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, s)| s.as_ref().map(|p| (slot, p)))
    }
}
