// Process lifecycle: spawn, exit, wait and zombie reaping
//
// Everything here runs with the kernel state locked and never suspends. The
// returned `Resume` tells the calling process what to do once the lock is
// released.
use alloc::vec::Vec;
use log::{error, info, warn};

use crate::config::{KernelConfig, LOWEST_PRIORITY, NUM_PRIORITIES};
use crate::error::{FatalError, Halt, SpawnError, WaitError};
use crate::kernel::{launch, Kernel};
use crate::process::context::{Continuation, ExecutionContext};
use crate::process::pcb::{EntryPoint, Priority, ProcessId, ProcessInfo, ProcessState, Slot};
use crate::process::scheduler::{Dispatch, Dispatcher};
use crate::process::table::ProcessTable;

/// How the calling process continues after a lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Keep running.
    Now,
    /// Another process was selected; suspend until rescheduled.
    AfterSwitch,
    /// The system halted; never continue.
    Never,
}

/// Result of one pass of `wait`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStep {
    Reaped { pid: ProcessId, exit_code: i32 },
    Suspend(Resume),
}

/// Scheduler counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub context_switches: u64,
    pub spawned: u64,
    pub reaped: u64,
    pub live: usize,
    pub running: Option<ProcessId>,
    /// READY records per priority, lowest first.
    pub ready: [usize; NUM_PRIORITIES],
}

/// All mutable scheduler state, owned by one `Kernel`
pub struct KernelState {
    pub config: KernelConfig,
    pub table: ProcessTable,
    pub dispatcher: Dispatcher,
    halted: Option<Halt>,
    spawned: u64,
    reaped: u64,
}

impl KernelState {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            table: ProcessTable::new(&config),
            dispatcher: Dispatcher::new(&config),
            config,
            halted: None,
            spawned: 0,
            reaped: 0,
        }
    }

    pub fn halted(&self) -> Option<Halt> {
        self.halted
    }

    /// Record the reason the system stops. The first reason wins.
    pub fn halt(&mut self, halt: Halt) {
        if self.halted.is_some() {
            return;
        }
        match halt {
            Halt::Completed => info!("{}", halt),
            Halt::Deadlock | Halt::Fatal(_) => error!("{}", halt),
        }
        self.halted = Some(halt);
    }

    pub fn running_pid(&self) -> Option<ProcessId> {
        self.dispatcher.running().map(|slot| self.table.pid_of(slot))
    }

    /// Allocate, link and enqueue a new process without dispatching.
    pub fn create_process(
        &mut self,
        kernel: &Kernel,
        name: &str,
        args: &str,
        priority: Priority,
        stack_size: usize,
        entry: EntryPoint,
    ) -> Result<ProcessId, SpawnError> {
        kdebug!(self.config, "spawn(): creating process {}", name);

        let slot = match self.table.allocate(name, args, priority, stack_size, entry) {
            Ok(slot) => slot,
            Err(err) => {
                warn!("spawn(): {} ({})", err, name);
                return Err(err);
            }
        };

        let parent = self.dispatcher.running();
        if let Some(parent) = parent {
            if let Some(p) = self.table.get_mut(parent) {
                p.children.push(slot);
            }
            if let Some(child) = self.table.get_mut(slot) {
                child.parent = Some(parent);
            }
        }

        if self.dispatcher.enqueue(slot, &self.table).is_err() {
            self.discard(slot);
            return Err(SpawnError::EnqueueFailed);
        }

        let mut pid = 0;
        if let Some(child) = self.table.get_mut(slot) {
            child.context = ExecutionContext::initialize(launch(kernel.clone(), slot), stack_size);
            pid = child.pid;
        }
        self.spawned += 1;
        Ok(pid)
    }

    /// Undo a half-finished spawn.
    fn discard(&mut self, slot: Slot) {
        if let Some(child) = self.table.get_mut(slot) {
            child.state = ProcessState::Quit;
        }
        self.detach(slot);
        self.table.free(slot);
    }

    /// Run the dispatcher, converting a failure into a halt.
    pub fn reschedule(&mut self) -> Resume {
        match self.dispatcher.dispatch(&mut self.table) {
            Ok(Dispatch::Continue) => Resume::Now,
            Ok(Dispatch::Switch(slot)) => {
                kdebug!(self.config, "dispatcher(): switching to process {}", self.table.pid_of(slot));
                Resume::AfterSwitch
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn fail(&mut self, err: FatalError) -> Resume {
        self.halt(Halt::Fatal(err));
        Resume::Never
    }

    /// Turn the running process into a zombie and pick a successor.
    pub fn exit_process(&mut self, code: i32) -> Resume {
        let slot = match self.dispatcher.running() {
            Some(slot) => slot,
            None => return self.fail(FatalError::NotInProcess),
        };
        let (pid, parent, has_children) = match self.table.get(slot) {
            Some(p) => (p.pid, p.parent, !p.children.is_empty()),
            None => return self.fail(FatalError::NotInProcess),
        };

        if has_children {
            error!("exit(): process {} has active children", pid);
            return self.fail(FatalError::ExitWithChildren(pid));
        }

        if let Some(parent) = parent {
            let blocked = self
                .table
                .get(parent)
                .map_or(false, |p| p.state == ProcessState::Blocked);
            if blocked {
                let ppid = self.table.pid_of(parent);
                if let Some(p) = self.table.get_mut(parent) {
                    p.state = ProcessState::Ready;
                }
                if self.dispatcher.enqueue(parent, &self.table).is_err() {
                    return self.fail(FatalError::RequeueFailed(ppid));
                }
                kdebug!(self.config, "exit(): unblocked parent {}", ppid);
            }
        }

        if let Some(p) = self.table.get_mut(slot) {
            p.state = ProcessState::Quit;
            p.exit_code = code;
        }
        kdebug!(self.config, "exit(): process {} quit with code {}", pid, code);

        self.reschedule()
    }

    /// One pass of `wait` for the running process: reap a zombie child if
    /// there is one, otherwise block.
    pub fn wait_step(&mut self) -> Result<WaitStep, WaitError> {
        let slot = self.dispatcher.running().ok_or(WaitError::NoCurrentProcess)?;
        let children = match self.table.get(slot) {
            Some(p) => p.children.len(),
            None => return Err(WaitError::NoCurrentProcess),
        };
        if children == 0 {
            return Err(WaitError::NoChildren);
        }

        if let Some((pid, exit_code)) = self.reap_zombie(slot) {
            return Ok(WaitStep::Reaped { pid, exit_code });
        }

        if let Some(p) = self.table.get_mut(slot) {
            p.state = ProcessState::Blocked;
            kdebug!(self.config, "wait(): process {} blocked on {} children", p.pid, children);
        }
        Ok(WaitStep::Suspend(self.reschedule()))
    }

    /// Reap the first exited child of `parent`, in spawn order.
    fn reap_zombie(&mut self, parent: Slot) -> Option<(ProcessId, i32)> {
        let zombie = self.table.get(parent)?.children.iter().copied().find(|&child| {
            self.table
                .get(child)
                .map_or(false, |c| c.state == ProcessState::Quit)
        })?;

        self.detach(zombie);
        let record = self.table.free(zombie)?;
        self.reaped += 1;
        kdebug!(self.config, "wait(): reaped process {} ({})", record.pid, record.exit_code);
        Some((record.pid, record.exit_code))
    }

    /// Unlink `child` from its parent's children list.
    fn detach(&mut self, child: Slot) {
        let parent = match self.table.get_mut(child).and_then(|c| c.parent.take()) {
            Some(parent) => parent,
            None => return,
        };
        if let Some(p) = self.table.get_mut(parent) {
            if let Some(pos) = p.children.iter().position(|&c| c == child) {
                p.children.remove(pos);
            }
        }
    }

    /// Detach every continuation and pending entry so nothing keeps the
    /// kernel alive after a halt. The caller drops them with the lock released.
    pub fn release_contexts(&mut self) -> (Vec<Continuation>, Vec<EntryPoint>) {
        let slots: Vec<Slot> = self.table.iter().map(|(slot, _)| slot).collect();
        let mut continuations = Vec::new();
        let mut entries = Vec::new();
        for slot in slots {
            if let Some(p) = self.table.get_mut(slot) {
                continuations.extend(p.context.take());
                entries.extend(p.entry.take());
            }
        }
        (continuations, entries)
    }

    pub fn snapshot(&self) -> Vec<ProcessInfo> {
        self.table
            .iter()
            .map(|(_, p)| ProcessInfo {
                pid: p.pid,
                name: p.name.clone(),
                priority: p.priority,
                state: p.state,
                parent: p.parent.map(|slot| self.table.pid_of(slot)),
                children: p.children.len(),
                exit_code: p.is_zombie().then(|| p.exit_code),
                stack_size: p.context.stack_size(),
            })
            .collect()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            context_switches: self.dispatcher.context_switches(),
            spawned: self.spawned,
            reaped: self.reaped,
            live: self.table.live_count(),
            running: self.running_pid(),
            ready: core::array::from_fn(|i| self.dispatcher.ready_len(LOWEST_PRIORITY + i as Priority)),
        }
    }
}
