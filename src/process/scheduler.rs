// Dispatcher: strict-priority selection with round-robin inside a level
use alloc::vec::Vec;

use crate::config::{KernelConfig, HIGHEST_PRIORITY, LOWEST_PRIORITY};
use crate::error::{FatalError, QueueError};
use crate::process::pcb::{Priority, ProcessId, ProcessState, Slot};
use crate::process::queue::ReadyQueue;
use crate::process::table::ProcessTable;

/// Outcome of one dispatcher pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The running process keeps the processor.
    Continue,
    /// Control must pass to the process in this slot.
    Switch(Slot),
}

/// Ready queues plus the currently running record
pub struct Dispatcher {
    ready: Vec<ReadyQueue>,
    running: Option<Slot>,
    context_switches: u64,
}

impl Dispatcher {
    pub fn new(config: &KernelConfig) -> Self {
        let ready = (LOWEST_PRIORITY..=HIGHEST_PRIORITY)
            .map(|priority| ReadyQueue::new(priority, config.max_processes))
            .collect();
        Self {
            ready,
            running: None,
            context_switches: 0,
        }
    }

    pub fn running(&self) -> Option<Slot> {
        self.running
    }

    pub fn context_switches(&self) -> u64 {
        self.context_switches
    }

    /// Number of READY records at `priority`.
    pub fn ready_len(&self, priority: Priority) -> usize {
        if !(LOWEST_PRIORITY..=HIGHEST_PRIORITY).contains(&priority) {
            return 0;
        }
        self.ready[KernelConfig::queue_index(priority)].len()
    }

    /// Put the record in `slot` on the queue matching its own priority.
    pub fn enqueue(&mut self, slot: Slot, table: &ProcessTable) -> Result<usize, QueueError> {
        let process = table.get(slot).ok_or(QueueError::PriorityMismatch)?;
        if !(LOWEST_PRIORITY..=HIGHEST_PRIORITY).contains(&process.priority) {
            return Err(QueueError::PriorityMismatch);
        }
        self.ready[KernelConfig::queue_index(process.priority)].push(slot, process)
    }

    /// True when some READY record has priority `>= priority`.
    fn ready_at_or_above(&self, priority: Priority) -> bool {
        let floor = KernelConfig::queue_index(priority.max(LOWEST_PRIORITY));
        self.ready.iter().skip(floor).any(|q| !q.is_empty())
    }

    /// Pop the head of the highest non-empty queue.
    fn pop_highest(&mut self) -> Option<Slot> {
        self.ready.iter_mut().rev().find(|q| !q.is_empty())?.pop()
    }

    /// Any READY record at all. Only asked while the watchdog is running,
    /// so the watchdog itself is never on a queue here.
    pub fn has_pending_work(&self) -> bool {
        self.ready.iter().any(|q| !q.is_empty())
    }

    /// Decide who runs next.
    ///
    /// A running record that is still RUNNING keeps the processor unless a
    /// READY record of equal or higher priority exists, in which case it is
    /// requeued at the tail of its level before selection.
    pub fn dispatch(&mut self, table: &mut ProcessTable) -> Result<Dispatch, FatalError> {
        if let Some(slot) = self.running {
            let (state, priority, pid) = match table.get(slot) {
                Some(p) => (p.state, p.priority, p.pid),
                None => (ProcessState::Quit, LOWEST_PRIORITY, 0),
            };

            if !matches!(state, ProcessState::Blocked | ProcessState::Quit) {
                if !self.ready_at_or_above(priority) {
                    return Ok(Dispatch::Continue);
                }
                self.requeue(slot, pid, table)?;
            }
        }

        let next = self.pop_highest().ok_or(FatalError::NoRunnableProcess)?;
        let process = table.get_mut(next).ok_or(FatalError::NoRunnableProcess)?;
        process.state = ProcessState::Running;
        self.running = Some(next);
        self.context_switches += 1;
        Ok(Dispatch::Switch(next))
    }

    fn requeue(&mut self, slot: Slot, pid: ProcessId, table: &mut ProcessTable) -> Result<(), FatalError> {
        self.running = None;
        if let Some(p) = table.get_mut(slot) {
            p.state = ProcessState::Ready;
        }
        self.enqueue(slot, table)
            .map(|_| ())
            .map_err(|_| FatalError::RequeueFailed(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_STACK_SIZE;
    use alloc::boxed::Box;
    use futures_util::future::FutureExt;

    struct Fixture {
        table: ProcessTable,
        dispatcher: Dispatcher,
    }

    impl Fixture {
        fn new() -> Self {
            let config = KernelConfig::default().with_max_processes(8);
            Self {
                table: ProcessTable::new(&config),
                dispatcher: Dispatcher::new(&config),
            }
        }

        fn ready(&mut self, priority: Priority) -> Slot {
            let slot = self
                .table
                .allocate("p", "", priority, MIN_STACK_SIZE, Box::new(|_, _| async { 0 }.boxed()))
                .unwrap();
            self.dispatcher.enqueue(slot, &self.table).unwrap();
            slot
        }

        fn dispatch(&mut self) -> Result<Dispatch, FatalError> {
            self.dispatcher.dispatch(&mut self.table)
        }

        fn state(&self, slot: Slot) -> ProcessState {
            self.table.get(slot).unwrap().state
        }
    }

    #[test]
    fn selects_highest_priority_first() {
        let mut f = Fixture::new();
        let low = f.ready(1);
        let high = f.ready(4);
        let mid = f.ready(2);

        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(high)));
        assert_eq!(f.state(high), ProcessState::Running);

        f.table.get_mut(high).unwrap().state = ProcessState::Quit;
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(mid)));
        f.table.get_mut(mid).unwrap().state = ProcessState::Blocked;
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(low)));
        assert_eq!(f.dispatcher.context_switches(), 3);
    }

    #[test]
    fn running_keeps_cpu_over_lower_priority() {
        let mut f = Fixture::new();
        let high = f.ready(3);
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(high)));
        let low = f.ready(2);

        assert_eq!(f.dispatch(), Ok(Dispatch::Continue));
        assert_eq!(f.dispatcher.running(), Some(high));
        assert_eq!(f.state(low), ProcessState::Ready);
        assert_eq!(f.dispatcher.ready_len(2), 1);
    }

    #[test]
    fn equal_priority_round_robin() {
        let mut f = Fixture::new();
        let a = f.ready(3);
        let b = f.ready(3);
        let c = f.ready(3);

        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(a)));
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(b)));
        assert_eq!(f.state(a), ProcessState::Ready);
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(c)));
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(a)));
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(b)));
    }

    #[test]
    fn higher_priority_arrival_preempts() {
        let mut f = Fixture::new();
        let low = f.ready(1);
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(low)));
        let high = f.ready(5);
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(high)));
        assert_eq!(f.state(low), ProcessState::Ready);
        assert_eq!(f.dispatcher.ready_len(1), 1);
    }

    #[test]
    fn nothing_to_run_is_fatal() {
        let mut f = Fixture::new();
        assert_eq!(f.dispatch(), Err(FatalError::NoRunnableProcess));

        let only = f.ready(2);
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(only)));
        f.table.get_mut(only).unwrap().state = ProcessState::Blocked;
        assert_eq!(f.dispatch(), Err(FatalError::NoRunnableProcess));
    }

    #[test]
    fn single_lowest_entry_is_pending_work() {
        let mut f = Fixture::new();
        let watchdog = f.ready(LOWEST_PRIORITY);
        assert!(f.dispatcher.has_pending_work());

        // running, the watchdog is off its queue
        assert_eq!(f.dispatch(), Ok(Dispatch::Switch(watchdog)));
        assert!(!f.dispatcher.has_pending_work());

        f.ready(LOWEST_PRIORITY);
        assert!(f.dispatcher.has_pending_work());
        assert_eq!(f.dispatcher.ready_len(LOWEST_PRIORITY), 1);

        let mut g = Fixture::new();
        g.ready(1);
        assert!(g.dispatcher.has_pending_work());
        assert_eq!(g.dispatcher.ready_len(HIGHEST_PRIORITY + 1), 0);
    }
}
